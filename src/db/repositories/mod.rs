pub mod membership;
pub mod note;
pub mod project;
pub mod user;
