//! In-memory store.
//!
//! Transactions are fully serialised: `begin` takes the one lock over all tables
//! and works on a copy, which `commit` writes back. Dropping an uncommitted
//! transaction releases the lock and discards the copy.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{finished_transaction, Store, StoreTx};
use crate::auth::ownership::OwnerScope;
use crate::auth::token::SessionTokens;
use crate::error::AppError;
use crate::models::{NewProject, NewTask, NewUser, Project, Task, User};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    projects: BTreeMap<i32, Project>,
    tasks: BTreeMap<i32, Task>,
    last_user_id: i32,
    last_project_id: i32,
    last_task_id: i32,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard: Some(guard),
            working,
        }))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

struct MemoryTx {
    guard: Option<OwnedMutexGuard<Tables>>,
    working: Tables,
}

impl MemoryTx {
    fn tables(&mut self) -> Result<&mut Tables, AppError> {
        if self.guard.is_none() {
            return Err(finished_transaction());
        }
        Ok(&mut self.working)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_user(&mut self, user: NewUser) -> Result<User, AppError> {
        let tables = self.tables()?;
        if tables
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::NotAcceptable(
                "Username or email already registered".into(),
            ));
        }

        tables.last_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: tables.last_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            profile: user.profile,
            session_token: None,
            csrf_token: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn username_taken(&mut self, username: &str) -> Result<bool, AppError> {
        Ok(self.tables()?.users.values().any(|u| u.username == username))
    }

    async fn email_taken(&mut self, email: &str) -> Result<bool, AppError> {
        Ok(self.tables()?.users.values().any(|u| u.email == email))
    }

    async fn set_session_tokens(
        &mut self,
        user_id: i32,
        tokens: Option<&SessionTokens>,
    ) -> Result<(), AppError> {
        let user = self
            .tables()?
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        user.session_token = tokens.map(|t| t.session.clone());
        user.csrf_token = tokens.map(|t| t.csrf.clone());
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn list_users(&mut self) -> Result<Vec<User>, AppError> {
        Ok(self.tables()?.users.values().cloned().collect())
    }

    async fn insert_project(&mut self, project: NewProject) -> Result<Project, AppError> {
        let tables = self.tables()?;
        if !tables.users.contains_key(&project.user_id) {
            return Err(AppError::DatabaseError(
                "projects.user_id references a missing user".into(),
            ));
        }

        tables.last_project_id += 1;
        let now = Utc::now();
        let created = Project {
            id: tables.last_project_id,
            name: project.name,
            description: project.description,
            user_id: project.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.projects.insert(created.id, created.clone());
        Ok(created)
    }

    async fn project_owned_by(&mut self, project_id: i32, owner_id: i32) -> Result<bool, AppError> {
        Ok(self
            .tables()?
            .projects
            .get(&project_id)
            .is_some_and(|p| p.user_id == owner_id))
    }

    async fn find_project(&mut self, project_id: i32) -> Result<Option<Project>, AppError> {
        Ok(self.tables()?.projects.get(&project_id).cloned())
    }

    async fn list_projects(&mut self, scope: &OwnerScope) -> Result<Vec<Project>, AppError> {
        let owner_id = scope.owner_id();
        Ok(self
            .tables()?
            .projects
            .values()
            .filter(|p| p.user_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update_project(
        &mut self,
        project_id: i32,
        name: &str,
        description: &str,
    ) -> Result<bool, AppError> {
        match self.tables()?.projects.get_mut(&project_id) {
            Some(project) => {
                project.name = name.to_string();
                project.description = description.to_string();
                project.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_project(&mut self, project_id: i32) -> Result<bool, AppError> {
        let tables = self.tables()?;
        if tables.projects.remove(&project_id).is_none() {
            return Ok(false);
        }
        tables.tasks.retain(|_, t| t.project_id != project_id);
        Ok(true)
    }

    async fn insert_task(&mut self, task: NewTask) -> Result<Task, AppError> {
        let tables = self.tables()?;
        if !tables.projects.contains_key(&task.project_id) {
            return Err(AppError::DatabaseError(
                "tasks.project_id references a missing project".into(),
            ));
        }

        tables.last_task_id += 1;
        let now = Utc::now();
        let created = Task {
            id: tables.last_task_id,
            title: task.title,
            description: task.description,
            project_id: task.project_id,
            assigned_to: task.assigned_to,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.insert(created.id, created.clone());
        Ok(created)
    }

    async fn task_owned_by(&mut self, task_id: i32, owner_id: i32) -> Result<bool, AppError> {
        let tables = self.tables()?;
        Ok(tables
            .tasks
            .get(&task_id)
            .and_then(|t| tables.projects.get(&t.project_id))
            .is_some_and(|p| p.user_id == owner_id))
    }

    async fn find_task(&mut self, task_id: i32) -> Result<Option<Task>, AppError> {
        Ok(self.tables()?.tasks.get(&task_id).cloned())
    }

    async fn list_tasks(
        &mut self,
        scope: &OwnerScope,
        project_id: i32,
    ) -> Result<Vec<Task>, AppError> {
        let owner_id = scope.owner_id();
        let tables = self.tables()?;
        let in_scope = tables
            .projects
            .get(&project_id)
            .is_some_and(|p| p.user_id == owner_id);
        if !in_scope {
            return Ok(Vec::new());
        }
        Ok(tables
            .tasks
            .values()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_task(
        &mut self,
        task_id: i32,
        title: &str,
        description: &str,
    ) -> Result<bool, AppError> {
        match self.tables()?.tasks.get_mut(&task_id) {
            Some(task) => {
                task.title = title.to_string();
                task.description = description.to_string();
                task.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_task(&mut self, task_id: i32) -> Result<bool, AppError> {
        Ok(self.tables()?.tasks.remove(&task_id).is_some())
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        let mut guard = self.guard.take().ok_or_else(finished_transaction)?;
        *guard = std::mem::take(&mut self.working);
        Ok(())
    }
}
