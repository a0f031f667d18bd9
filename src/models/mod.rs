pub mod project;
pub mod task;
pub mod user;

pub use project::{NewProject, Project};
pub use task::{NewTask, Task};
pub use user::{NewUser, PublicUser, User, DEFAULT_PROFILE};
