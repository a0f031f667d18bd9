use crate::{
    auth::{OwnershipGuard, ProjectOwnership, SessionCredentials, TaskOwnership},
    context::AppContext,
    error::AppError,
    models::NewTask,
    routes::authorized,
    validation::{parse_id, required_text},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
pub struct TaskParams {
    pub username: Option<String>,
    pub project_id: Option<String>,
    pub task_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Retrieves the tasks of one of the caller's projects.
///
/// ## Query Parameters:
/// - `username`: the claimed caller.
/// - `project_id`: the project whose tasks are listed.
///
/// ## Responses:
/// - `200 OK`: a JSON array of `Task` objects.
/// - `400 Bad Request`: `project_id` missing or not a positive integer.
/// - `401 Unauthorized`: the tokens do not belong to `username`.
/// - `404 Not Found`: no such project, or it belongs to someone else.
#[get("/tasks")]
pub async fn list_tasks(
    ctx: web::Data<AppContext>,
    session: SessionCredentials,
    query: web::Query<TaskParams>,
) -> Result<impl Responder, AppError> {
    let project_id = parse_id(query.project_id.as_deref(), "project_id")?;

    let credentials = session.claim(query.username.as_deref());
    let (mut tx, principal) = authorized(&ctx, &credentials).await?;
    ProjectOwnership
        .authorize_single(tx.as_mut(), project_id, principal.id)
        .await?;

    let scope = TaskOwnership.scope_query(principal.id);
    let tasks = tx.list_tasks(&scope, project_id).await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task in one of the caller's projects, assigned to the caller.
#[post("/add-task")]
pub async fn create_task(
    ctx: web::Data<AppContext>,
    session: SessionCredentials,
    form: web::Form<TaskParams>,
) -> Result<impl Responder, AppError> {
    let project_id = parse_id(form.project_id.as_deref(), "project_id")?;
    let title = required_text(form.title.as_deref(), "title")?;
    let description = required_text(form.description.as_deref(), "description")?;

    let credentials = session.claim(form.username.as_deref());
    let (mut tx, principal) = authorized(&ctx, &credentials).await?;
    ProjectOwnership
        .authorize_single(tx.as_mut(), project_id, principal.id)
        .await?;
    let task = tx
        .insert_task(NewTask {
            title,
            description,
            project_id,
            assigned_to: Some(principal.id),
        })
        .await?;
    tx.commit().await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Task added successfully",
        "task": task.title,
        "id": task.id,
    })))
}

/// Retrieves a task by `task_id`.
///
/// The task is visible to the owner of its project; being the assignee is not enough.
#[get("/task")]
pub async fn get_task(
    ctx: web::Data<AppContext>,
    session: SessionCredentials,
    query: web::Query<TaskParams>,
) -> Result<impl Responder, AppError> {
    let task_id = parse_id(query.task_id.as_deref(), "task_id")?;

    let credentials = session.claim(query.username.as_deref());
    let (mut tx, principal) = authorized(&ctx, &credentials).await?;
    TaskOwnership
        .authorize_single(tx.as_mut(), task_id, principal.id)
        .await?;
    let task = tx
        .find_task(task_id)
        .await?
        .ok_or_else(|| AppError::not_found_for_caller("Task"))?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(task))
}

#[put("/update-task")]
pub async fn update_task(
    ctx: web::Data<AppContext>,
    session: SessionCredentials,
    form: web::Form<TaskParams>,
) -> Result<impl Responder, AppError> {
    let task_id = parse_id(form.task_id.as_deref(), "task_id")?;
    let title = required_text(form.title.as_deref(), "title")?;
    let description = required_text(form.description.as_deref(), "description")?;

    let credentials = session.claim(form.username.as_deref());
    let (mut tx, principal) = authorized(&ctx, &credentials).await?;
    TaskOwnership
        .authorize_single(tx.as_mut(), task_id, principal.id)
        .await?;
    if !tx.update_task(task_id, &title, &description).await? {
        return Err(AppError::not_found_for_caller("Task"));
    }
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Task updated successfully" })))
}

#[delete("/delete-task")]
pub async fn delete_task(
    ctx: web::Data<AppContext>,
    session: SessionCredentials,
    query: web::Query<TaskParams>,
) -> Result<impl Responder, AppError> {
    let task_id = parse_id(query.task_id.as_deref(), "task_id")?;

    let credentials = session.claim(query.username.as_deref());
    let (mut tx, principal) = authorized(&ctx, &credentials).await?;
    TaskOwnership
        .authorize_single(tx.as_mut(), task_id, principal.id)
        .await?;
    if !tx.delete_task(task_id).await? {
        return Err(AppError::not_found_for_caller("Task"));
    }
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted successfully" })))
}
