pub use super::attachments::Entity as Attachments;
pub use super::notes::Entity as Notes;
pub use super::profiles::Entity as Profiles;
pub use super::project_users::Entity as ProjectUsers;
pub use super::projects::Entity as Projects;
pub use super::users::Entity as Users;
