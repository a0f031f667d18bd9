//! Resource store abstraction.
//!
//! Every request that touches persistent state opens exactly one [`StoreTx`] via
//! [`Store::begin`], runs its gate check, ownership check and mutation through it,
//! and calls [`StoreTx::commit`] at the end. A transaction that is dropped without
//! being committed (an early `?` return, a panic, or actix dropping the handler
//! future when the client disconnects) is rolled back.
//!
//! Two implementations exist: [`postgres::PgStore`] backed by `sqlx`, and
//! [`memory::MemoryStore`], which serialises transactions behind a single lock and
//! is used by the test suites.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::auth::ownership::OwnerScope;
use crate::auth::token::SessionTokens;
use crate::error::AppError;
use crate::models::{NewProject, NewTask, NewUser, Project, Task, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Opens a new transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError>;

    /// Verifies the backend is reachable.
    async fn health_check(&self) -> Result<(), AppError>;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}

/// One unit of work against the store.
///
/// Methods taking an owner id (`project_owned_by`, `task_owned_by`) lock the rows
/// they match until the transaction ends, so a later update or delete of the same
/// rows in this transaction cannot race a concurrent request. Locks are always
/// taken project before task, the order `delete_project` needs them in.
#[async_trait]
pub trait StoreTx: Send {
    // Principals

    /// Inserts a user. A username or email collision is `NotAcceptable`.
    async fn insert_user(&mut self, user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, AppError>;

    async fn username_taken(&mut self, username: &str) -> Result<bool, AppError>;

    async fn email_taken(&mut self, email: &str) -> Result<bool, AppError>;

    /// Writes both session tokens in a single statement; `None` clears both.
    async fn set_session_tokens(
        &mut self,
        user_id: i32,
        tokens: Option<&SessionTokens>,
    ) -> Result<(), AppError>;

    async fn list_users(&mut self) -> Result<Vec<User>, AppError>;

    // Projects

    async fn insert_project(&mut self, project: NewProject) -> Result<Project, AppError>;

    /// True iff the project exists and belongs to `owner_id`. Locks the row.
    async fn project_owned_by(&mut self, project_id: i32, owner_id: i32) -> Result<bool, AppError>;

    async fn find_project(&mut self, project_id: i32) -> Result<Option<Project>, AppError>;

    async fn list_projects(&mut self, scope: &OwnerScope) -> Result<Vec<Project>, AppError>;

    /// Returns false when no such project exists.
    async fn update_project(
        &mut self,
        project_id: i32,
        name: &str,
        description: &str,
    ) -> Result<bool, AppError>;

    /// Deletes the project and every task in it. Returns false when no such project exists.
    async fn delete_project(&mut self, project_id: i32) -> Result<bool, AppError>;

    // Tasks

    async fn insert_task(&mut self, task: NewTask) -> Result<Task, AppError>;

    /// True iff the task exists and its project belongs to `owner_id`. Locks the row.
    async fn task_owned_by(&mut self, task_id: i32, owner_id: i32) -> Result<bool, AppError>;

    async fn find_task(&mut self, task_id: i32) -> Result<Option<Task>, AppError>;

    /// Tasks of `project_id`, restricted to projects inside `scope`.
    async fn list_tasks(
        &mut self,
        scope: &OwnerScope,
        project_id: i32,
    ) -> Result<Vec<Task>, AppError>;

    async fn update_task(
        &mut self,
        task_id: i32,
        title: &str,
        description: &str,
    ) -> Result<bool, AppError>;

    async fn delete_task(&mut self, task_id: i32) -> Result<bool, AppError>;

    /// Makes every write of this transaction visible. Any call after a commit fails.
    async fn commit(&mut self) -> Result<(), AppError>;
}

fn finished_transaction() -> AppError {
    AppError::InternalServerError("transaction already finished".into())
}
