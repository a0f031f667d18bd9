use crate::{
    auth::SessionCredentials,
    context::AppContext,
    error::AppError,
    routes::{authorized, ClaimParams},
};
use actix_web::{get, web, HttpResponse, Responder};

/// Lists every user, without credentials or tokens.
#[get("/users")]
pub async fn list_users(
    ctx: web::Data<AppContext>,
    session: SessionCredentials,
    query: web::Query<ClaimParams>,
) -> Result<impl Responder, AppError> {
    let credentials = session.claim(query.username.as_deref());
    let (mut tx, _) = authorized(&ctx, &credentials).await?;
    let users = ctx.directory().list(tx.as_mut()).await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(users))
}
