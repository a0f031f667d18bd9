use crate::{
    auth::{OwnershipGuard, ProjectOwnership, SessionCredentials},
    context::AppContext,
    error::AppError,
    models::NewProject,
    routes::authorized,
    validation::{parse_id, required_text},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

/// Form or query fields accepted by the project endpoints. Which ones are required
/// depends on the endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectParams {
    pub username: Option<String>,
    pub project_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Lists the caller's projects.
#[get("/projects")]
pub async fn list_projects(
    ctx: web::Data<AppContext>,
    session: SessionCredentials,
    query: web::Query<ProjectParams>,
) -> Result<impl Responder, AppError> {
    let credentials = session.claim(query.username.as_deref());
    let (mut tx, principal) = authorized(&ctx, &credentials).await?;

    let scope = ProjectOwnership.scope_query(principal.id);
    let projects = tx.list_projects(&scope).await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(projects))
}

/// Creates a project owned by the caller.
///
/// ## Responses:
/// - `201 Created`: `{"message", "project", "id"}` where `project` is the name.
/// - `400 Bad Request`: `name` or `description` missing.
/// - `401 Unauthorized`: the tokens do not belong to `username`.
#[post("/add-project")]
pub async fn create_project(
    ctx: web::Data<AppContext>,
    session: SessionCredentials,
    form: web::Form<ProjectParams>,
) -> Result<impl Responder, AppError> {
    let name = required_text(form.name.as_deref(), "name")?;
    let description = required_text(form.description.as_deref(), "description")?;

    let credentials = session.claim(form.username.as_deref());
    let (mut tx, principal) = authorized(&ctx, &credentials).await?;
    let project = tx
        .insert_project(NewProject {
            name,
            description,
            user_id: principal.id,
        })
        .await?;
    tx.commit().await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Project added successfully",
        "project": project.name,
        "id": project.id,
    })))
}

/// Retrieves one of the caller's projects by `project_id`.
///
/// A project owned by someone else is reported exactly like a missing one (404).
#[get("/project")]
pub async fn get_project(
    ctx: web::Data<AppContext>,
    session: SessionCredentials,
    query: web::Query<ProjectParams>,
) -> Result<impl Responder, AppError> {
    let project_id = parse_id(query.project_id.as_deref(), "project_id")?;

    let credentials = session.claim(query.username.as_deref());
    let (mut tx, principal) = authorized(&ctx, &credentials).await?;
    ProjectOwnership
        .authorize_single(tx.as_mut(), project_id, principal.id)
        .await?;
    let project = tx
        .find_project(project_id)
        .await?
        .ok_or_else(|| AppError::not_found_for_caller("Project"))?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(project))
}

#[put("/update-project")]
pub async fn update_project(
    ctx: web::Data<AppContext>,
    session: SessionCredentials,
    form: web::Form<ProjectParams>,
) -> Result<impl Responder, AppError> {
    let project_id = parse_id(form.project_id.as_deref(), "project_id")?;
    let name = required_text(form.name.as_deref(), "name")?;
    let description = required_text(form.description.as_deref(), "description")?;

    let credentials = session.claim(form.username.as_deref());
    let (mut tx, principal) = authorized(&ctx, &credentials).await?;
    ProjectOwnership
        .authorize_single(tx.as_mut(), project_id, principal.id)
        .await?;
    if !tx.update_project(project_id, &name, &description).await? {
        return Err(AppError::not_found_for_caller("Project"));
    }
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Project updated successfully" })))
}

/// Deletes a project together with all of its tasks.
#[delete("/delete-project")]
pub async fn delete_project(
    ctx: web::Data<AppContext>,
    session: SessionCredentials,
    query: web::Query<ProjectParams>,
) -> Result<impl Responder, AppError> {
    let project_id = parse_id(query.project_id.as_deref(), "project_id")?;

    let credentials = session.claim(query.username.as_deref());
    let (mut tx, principal) = authorized(&ctx, &credentials).await?;
    ProjectOwnership
        .authorize_single(tx.as_mut(), project_id, principal.id)
        .await?;
    if !tx.delete_project(project_id).await? {
        return Err(AppError::not_found_for_caller("Project"));
    }
    tx.commit().await?;

    log::info!("user {} deleted project {}", principal.id, project_id);
    Ok(HttpResponse::Ok().json(json!({ "message": "Project deleted successfully" })))
}
