//! PostgreSQL store backed by an `sqlx` connection pool.

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, Postgres};
use sqlx::{PgConnection, PgPool, Transaction};

use super::{finished_transaction, Store, StoreTx};
use crate::auth::ownership::OwnerScope;
use crate::auth::token::SessionTokens;
use crate::config::Config;
use crate::error::AppError;
use crate::models::{NewProject, NewTask, NewUser, Project, Task, User};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool sized from the configuration.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx: Some(tx) }))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Rolls back on drop unless committed (the `sqlx::Transaction` drop behaviour).
struct PgTx {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgTx {
    fn conn(&mut self) -> Result<&mut PgConnection, AppError> {
        self.tx.as_deref_mut().ok_or_else(finished_transaction)
    }
}

fn map_unique_violation(error: sqlx::Error) -> AppError {
    match error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::NotAcceptable("Username or email already registered".into())
        }
        other => other.into(),
    }
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_user(&mut self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, profile)
             VALUES ($1, $2, $3, $4)
             RETURNING id, username, email, password_hash, profile, session_token, csrf_token, created_at, updated_at",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.profile)
        .fetch_one(self.conn()?)
        .await
        .map_err(map_unique_violation)
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, profile, session_token, csrf_token, created_at, updated_at
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(user)
    }

    async fn username_taken(&mut self, username: &str) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(self.conn()?)
        .await?;
        Ok(taken)
    }

    async fn email_taken(&mut self, email: &str) -> Result<bool, AppError> {
        let taken =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(self.conn()?)
                .await?;
        Ok(taken)
    }

    async fn set_session_tokens(
        &mut self,
        user_id: i32,
        tokens: Option<&SessionTokens>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET session_token = $1, csrf_token = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(tokens.map(|t| t.session.as_str()))
        .bind(tokens.map(|t| t.csrf.as_str()))
        .bind(user_id)
        .execute(self.conn()?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }

    async fn list_users(&mut self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, profile, session_token, csrf_token, created_at, updated_at
             FROM users ORDER BY id",
        )
        .fetch_all(self.conn()?)
        .await?;
        Ok(users)
    }

    async fn insert_project(&mut self, project: NewProject) -> Result<Project, AppError> {
        let created = sqlx::query_as::<_, Project>(
            "INSERT INTO projects (name, description, user_id)
             VALUES ($1, $2, $3)
             RETURNING id, name, description, user_id, created_at, updated_at",
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.user_id)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn project_owned_by(&mut self, project_id: i32, owner_id: i32) -> Result<bool, AppError> {
        let row = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM projects WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(project_id)
        .bind(owner_id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(row.is_some())
    }

    async fn find_project(&mut self, project_id: i32) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            "SELECT id, name, description, user_id, created_at, updated_at
             FROM projects WHERE id = $1",
        )
        .bind(project_id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(project)
    }

    async fn list_projects(&mut self, scope: &OwnerScope) -> Result<Vec<Project>, AppError> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT id, name, description, user_id, created_at, updated_at
             FROM projects WHERE user_id = $1 ORDER BY id",
        )
        .bind(scope.owner_id())
        .fetch_all(self.conn()?)
        .await?;
        Ok(projects)
    }

    async fn update_project(
        &mut self,
        project_id: i32,
        name: &str,
        description: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE projects SET name = $1, description = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(name)
        .bind(description)
        .bind(project_id)
        .execute(self.conn()?)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_project(&mut self, project_id: i32) -> Result<bool, AppError> {
        // tasks go with their project, whatever the foreign key says
        sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .execute(self.conn()?)
            .await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(project_id)
            .execute(self.conn()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_task(&mut self, task: NewTask) -> Result<Task, AppError> {
        let created = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (title, description, project_id, assigned_to)
             VALUES ($1, $2, $3, $4)
             RETURNING id, title, description, project_id, assigned_to, created_at, updated_at",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.project_id)
        .bind(task.assigned_to)
        .fetch_one(self.conn()?)
        .await?;
        Ok(created)
    }

    async fn task_owned_by(&mut self, task_id: i32, owner_id: i32) -> Result<bool, AppError> {
        let project_id = sqlx::query_scalar::<_, i32>("SELECT project_id FROM tasks WHERE id = $1")
            .bind(task_id)
            .fetch_optional(self.conn()?)
            .await?;
        let Some(project_id) = project_id else {
            return Ok(false);
        };

        // project row first, then the task: the same order a project delete takes them
        if !self.project_owned_by(project_id, owner_id).await? {
            return Ok(false);
        }

        // gone or moved while we waited for the project lock
        let row = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM tasks WHERE id = $1 AND project_id = $2 FOR UPDATE",
        )
        .bind(task_id)
        .bind(project_id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(row.is_some())
    }

    async fn find_task(&mut self, task_id: i32) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(
            "SELECT id, title, description, project_id, assigned_to, created_at, updated_at
             FROM tasks WHERE id = $1",
        )
        .bind(task_id)
        .fetch_optional(self.conn()?)
        .await?;
        Ok(task)
    }

    async fn list_tasks(
        &mut self,
        scope: &OwnerScope,
        project_id: i32,
    ) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT t.id, t.title, t.description, t.project_id, t.assigned_to, t.created_at, t.updated_at
             FROM tasks t
             JOIN projects p ON p.id = t.project_id
             WHERE t.project_id = $1 AND p.user_id = $2
             ORDER BY t.id",
        )
        .bind(project_id)
        .bind(scope.owner_id())
        .fetch_all(self.conn()?)
        .await?;
        Ok(tasks)
    }

    async fn update_task(
        &mut self,
        task_id: i32,
        title: &str,
        description: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE tasks SET title = $1, description = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(title)
        .bind(description)
        .bind(task_id)
        .execute(self.conn()?)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_task(&mut self, task_id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(self.conn()?)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        let tx = self.tx.take().ok_or_else(finished_transaction)?;
        tx.commit().await?;
        Ok(())
    }
}
