pub mod auth_service;
pub mod auth_service_impl;
pub mod note_service;
pub mod note_service_impl;
pub mod project_service;
pub mod project_service_impl;
pub mod upload;

pub use auth_service::{AuthError, AuthService, ProfileInfo, UserInfo};
pub use auth_service_impl::AuthServiceImpl;
pub use note_service::{NoteError, NoteService, UploadedFile};
pub use note_service_impl::NoteServiceImpl;
pub use project_service::{
    MemberInfo, NoteInfo, ProjectDetail, ProjectError, ProjectService, ProjectSummary,
};
pub use project_service_impl::ProjectServiceImpl;
pub use upload::{UploadKind, UploadService};
