use async_trait::async_trait;

use crate::error::AppError;
use crate::store::StoreTx;

/// Restricts a list query to the resources of one principal.
///
/// Can only be obtained from an [`OwnershipGuard`], and every list method of the
/// store takes one, so an unscoped listing cannot be written by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerScope {
    owner_id: i32,
}

impl OwnerScope {
    pub fn owner_id(&self) -> i32 {
        self.owner_id
    }
}

/// Ownership rules for one resource kind.
#[async_trait]
pub trait OwnershipGuard: Send + Sync {
    /// Name used in the "not found for this user" error.
    fn resource_kind(&self) -> &'static str;

    /// Checks, and locks until the transaction ends, a single resource of the caller.
    ///
    /// A missing resource and someone else's resource fail the same way.
    async fn authorize_single(
        &self,
        tx: &mut dyn StoreTx,
        resource_id: i32,
        caller_id: i32,
    ) -> Result<(), AppError>;

    fn scope_query(&self, caller_id: i32) -> OwnerScope {
        OwnerScope { owner_id: caller_id }
    }
}

/// A project belongs to the user that created it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectOwnership;

#[async_trait]
impl OwnershipGuard for ProjectOwnership {
    fn resource_kind(&self) -> &'static str {
        "Project"
    }

    async fn authorize_single(
        &self,
        tx: &mut dyn StoreTx,
        resource_id: i32,
        caller_id: i32,
    ) -> Result<(), AppError> {
        if tx.project_owned_by(resource_id, caller_id).await? {
            Ok(())
        } else {
            log::debug!("project {} denied to user {}", resource_id, caller_id);
            Err(AppError::not_found_for_caller(self.resource_kind()))
        }
    }
}

/// A task belongs to whoever owns its project, whatever `assigned_to` says.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskOwnership;

#[async_trait]
impl OwnershipGuard for TaskOwnership {
    fn resource_kind(&self) -> &'static str {
        "Task"
    }

    async fn authorize_single(
        &self,
        tx: &mut dyn StoreTx,
        resource_id: i32,
        caller_id: i32,
    ) -> Result<(), AppError> {
        if tx.task_owned_by(resource_id, caller_id).await? {
            Ok(())
        } else {
            log::debug!("task {} denied to user {}", resource_id, caller_id);
            Err(AppError::not_found_for_caller(self.resource_kind()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProject, NewTask, NewUser, DEFAULT_PROFILE};
    use crate::store::{MemoryStore, Store};

    async fn user(tx: &mut dyn StoreTx, name: &str) -> i32 {
        tx.insert_user(NewUser {
            username: name.into(),
            email: format!("{}@x.com", name),
            password_hash: "unused".into(),
            profile: DEFAULT_PROFILE.into(),
        })
        .await
        .unwrap()
        .id
    }

    fn expect_not_found(result: Result<(), AppError>, kind: &str) {
        match result {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, format!("{} not found for this user", kind)),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_project_ownership() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let alice = user(tx.as_mut(), "alice").await;
        let bob = user(tx.as_mut(), "bob").await;
        let project = tx
            .insert_project(NewProject {
                name: "P1".into(),
                description: String::new(),
                user_id: alice,
            })
            .await
            .unwrap();

        let guard = ProjectOwnership;
        assert!(guard.authorize_single(tx.as_mut(), project.id, alice).await.is_ok());
        expect_not_found(guard.authorize_single(tx.as_mut(), project.id, bob).await, "Project");
        expect_not_found(guard.authorize_single(tx.as_mut(), 9999, alice).await, "Project");
    }

    #[actix_rt::test]
    async fn test_task_ownership_follows_project_owner() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let alice = user(tx.as_mut(), "alice").await;
        let bob = user(tx.as_mut(), "bob").await;
        let project = tx
            .insert_project(NewProject {
                name: "P1".into(),
                description: String::new(),
                user_id: alice,
            })
            .await
            .unwrap();
        // assigned to bob, but the project is alice's
        let task = tx
            .insert_task(NewTask {
                title: "T1".into(),
                description: String::new(),
                project_id: project.id,
                assigned_to: Some(bob),
            })
            .await
            .unwrap();

        let guard = TaskOwnership;
        assert!(guard.authorize_single(tx.as_mut(), task.id, alice).await.is_ok());
        expect_not_found(guard.authorize_single(tx.as_mut(), task.id, bob).await, "Task");
    }

    #[test]
    fn test_scope_carries_caller() {
        assert_eq!(ProjectOwnership.scope_query(3).owner_id(), 3);
        assert_eq!(TaskOwnership.scope_query(4).owner_id(), 4);
    }
}
