use crate::{
    auth::{
        extractors::{CSRF_COOKIE, SESSION_COOKIE},
        LoginRequest, LoginResponse, RegisterRequest, SessionCredentials,
    },
    context::AppContext,
    error::AppError,
    routes::{authorized, ClaimParams},
};
use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;

/// Lifetime advertised on the token cookies. The server does not enforce it.
const COOKIE_MAX_AGE_DAYS: i64 = 7;

fn token_cookie(name: &'static str, value: String, http_only: bool, secure: bool) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(http_only)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(COOKIE_MAX_AGE_DAYS))
        .finish()
}

fn removal_cookie(name: &'static str, http_only: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build(name, "")
        .path("/")
        .http_only(http_only)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}

/// Register a new user
///
/// Form fields `username`, `email`, `password`. Answers 201 with the public view of
/// the new user, or 406 naming the first field that was rejected.
#[post("/register")]
pub async fn register(
    ctx: web::Data<AppContext>,
    form: web::Form<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let mut tx = ctx.begin().await?;
    let user = ctx.directory().register(tx.as_mut(), form.into_inner()).await?;
    tx.commit().await?;

    Ok(HttpResponse::Created().json(user.public()))
}

/// Login user
///
/// Binds a fresh session/CSRF pair to the user. The session token is only sent as
/// an HttpOnly cookie; the CSRF token is in the body (and a readable cookie) for the
/// client to echo in the `X-CSRF-Token` header.
#[post("/login")]
pub async fn login(
    ctx: web::Data<AppContext>,
    form: web::Form<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let mut tx = ctx.begin().await?;
    let (_, tokens) = ctx
        .sessions()
        .login(tx.as_mut(), &form.username, &form.password)
        .await?;
    tx.commit().await?;

    let secure = ctx.cookie_secure();
    Ok(HttpResponse::Accepted()
        .cookie(token_cookie(SESSION_COOKIE, tokens.session, true, secure))
        .cookie(token_cookie(CSRF_COOKIE, tokens.csrf.clone(), false, secure))
        .json(LoginResponse {
            csrf_token: tokens.csrf,
        }))
}

/// Logout user
///
/// Clears the session pair and expires both cookies. Answers every method; mounted
/// as a resource in `routes::config`. The claimed username is read from the form
/// body, falling back to the query string. Repeating a logout is a no-op that still
/// answers 202.
pub async fn logout(
    ctx: web::Data<AppContext>,
    session: SessionCredentials,
    form: Option<web::Form<ClaimParams>>,
    query: web::Query<ClaimParams>,
) -> Result<impl Responder, AppError> {
    let username = ClaimParams::from_form_or_query(form, query);
    let credentials = session.claim(username.as_deref());

    let mut tx = ctx.begin().await?;
    match ctx.authorize(tx.as_mut(), &credentials).await {
        Ok(principal) => ctx.sessions().logout(tx.as_mut(), principal.id).await?,
        Err(AppError::Unauthorized(msg)) => {
            if !ctx
                .sessions()
                .already_logged_out(tx.as_mut(), &credentials.username)
                .await?
            {
                return Err(AppError::Unauthorized(msg));
            }
            log::debug!("repeated logout for {}", credentials.username);
        }
        Err(e) => return Err(e),
    }
    tx.commit().await?;

    Ok(HttpResponse::Accepted()
        .cookie(removal_cookie(SESSION_COOKIE, true))
        .cookie(removal_cookie(CSRF_COOKIE, false))
        .json(json!({ "message": "Logged out successfully" })))
}

/// Validate session
///
/// 200 `{"status": "valid"}` when the presented tokens belong to the claimed user.
#[post("/validate")]
pub async fn validate(
    ctx: web::Data<AppContext>,
    session: SessionCredentials,
    form: Option<web::Form<ClaimParams>>,
    query: web::Query<ClaimParams>,
) -> Result<impl Responder, AppError> {
    let username = ClaimParams::from_form_or_query(form, query);
    let credentials = session.claim(username.as_deref());
    let (mut tx, _) = authorized(&ctx, &credentials).await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(json!({ "status": "valid" })))
}
