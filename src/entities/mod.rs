pub mod prelude;

pub mod attachments;
pub mod notes;
pub mod profiles;
pub mod project_users;
pub mod projects;
pub mod users;
