pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;

use actix_web::web;
use serde::Deserialize;

use crate::auth::{Credentials, Principal};
use crate::context::AppContext;
use crate::error::AppError;
use crate::store::StoreTx;

/// Requests that only need to say who they act for.
#[derive(Debug, Default, Deserialize)]
pub struct ClaimParams {
    pub username: Option<String>,
}

impl ClaimParams {
    /// Username from the form body, else from the query string.
    pub fn from_form_or_query(
        form: Option<web::Form<ClaimParams>>,
        query: web::Query<ClaimParams>,
    ) -> Option<String> {
        form.and_then(|f| f.into_inner().username)
            .or_else(|| query.into_inner().username)
    }
}

/// Opens the request's transaction and passes it through the auth gate.
///
/// The returned transaction must be committed by the caller; dropping it rolls back.
pub(crate) async fn authorized(
    ctx: &AppContext,
    credentials: &Credentials,
) -> Result<(Box<dyn StoreTx>, Principal), AppError> {
    let mut tx = ctx.begin().await?;
    let principal = ctx.authorize(tx.as_mut(), credentials).await?;
    Ok((tx, principal))
}

/// Mounts every `/api` route.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(auth::register)
            .service(auth::login)
            .service(web::resource("/logout").to(auth::logout))
            .service(auth::validate)
            .service(users::list_users)
            .service(projects::list_projects)
            .service(projects::create_project)
            .service(projects::get_project)
            .service(projects::update_project)
            .service(projects::delete_project)
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}
