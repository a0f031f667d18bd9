#![allow(dead_code)]

use std::sync::Arc;

use actix_http::Request;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::Value;

use devtasks::auth::extractors::{CSRF_HEADER, SESSION_COOKIE};
use devtasks::auth::password::MIN_COST;
use devtasks::routes::{self, health};
use devtasks::store::MemoryStore;
use devtasks::{AppContext, ContextSettings};

/// A context over a fresh in-memory store, with the cheapest bcrypt cost.
pub fn test_context() -> AppContext {
    AppContext::new(
        Arc::new(MemoryStore::new()),
        ContextSettings {
            bcrypt_cost: MIN_COST,
            ..ContextSettings::default()
        },
    )
}

pub async fn init_app(
    ctx: AppContext,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(ctx))
            .service(health::health)
            .configure(routes::config),
    )
    .await
}

/// Status, parsed body (`Null` when not JSON) and cookies of a response.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub cookies: Vec<Cookie<'static>>,
}

impl Reply {
    pub fn cookie(&self, name: &str) -> Option<&Cookie<'static>> {
        self.cookies.iter().find(|c| c.name() == name)
    }
}

pub async fn send<S>(app: &S, req: Request) -> Reply
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let cookies = resp
        .response()
        .cookies()
        .map(|c| c.into_owned())
        .collect();
    let bytes = test::read_body(resp).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        body,
        cookies,
    }
}

fn query_string(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

pub async fn register<S>(app: &S, username: &str, email: &str, password: &str) -> Reply
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/register")
        .set_form([("username", username), ("email", email), ("password", password)])
        .to_request();
    send(app, req).await
}

pub async fn login_reply<S>(app: &S, username: &str, password: &str) -> Reply
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/login")
        .set_form([("username", username), ("password", password)])
        .to_request();
    send(app, req).await
}

/// Logs in and returns the issued credentials. Panics unless the login succeeds.
pub async fn login<S>(app: &S, username: &str, password: &str) -> Session
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let reply = login_reply(app, username, password).await;
    assert_eq!(reply.status, StatusCode::ACCEPTED, "login failed: {:?}", reply.body);
    Session::from_login(username, &reply)
}

/// Registers `username` with a derived e-mail and logs in.
pub async fn signed_up<S>(app: &S, username: &str) -> Session
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let email = format!("{}@example.com", username);
    let reply = register(app, username, &email, "password1").await;
    assert_eq!(reply.status, StatusCode::CREATED, "register failed: {:?}", reply.body);
    login(app, username, "password1").await
}

/// The credentials a client holds after logging in, plus the username it claims.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub session_token: String,
    pub csrf_token: String,
}

impl Session {
    pub fn from_login(username: &str, reply: &Reply) -> Self {
        let session_token = reply
            .cookie(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .unwrap_or_default();
        let csrf_token = reply.body["csrfToken"].as_str().unwrap_or_default().to_string();
        Session {
            username: username.to_string(),
            session_token,
            csrf_token,
        }
    }

    /// Same tokens, claiming a different username.
    pub fn claiming(&self, username: &str) -> Self {
        Session {
            username: username.to_string(),
            ..self.clone()
        }
    }

    fn sign(&self, req: test::TestRequest) -> test::TestRequest {
        req.cookie(Cookie::new(SESSION_COOKIE, self.session_token.clone()))
            .insert_header((CSRF_HEADER, self.csrf_token.clone()))
    }

    /// GET or DELETE with `username` and `params` in the query string.
    pub fn query(&self, req: test::TestRequest, path: &str, params: &[(&str, &str)]) -> Request {
        let mut all = vec![("username", self.username.as_str())];
        all.extend_from_slice(params);
        self.sign(req.uri(&format!("{}?{}", path, query_string(&all))))
            .to_request()
    }

    /// POST or PUT with `username` and `params` in a form body.
    pub fn form(&self, req: test::TestRequest, path: &str, params: &[(&str, &str)]) -> Request {
        let mut all = vec![("username", self.username.as_str())];
        all.extend_from_slice(params);
        self.sign(req.uri(path)).set_form(all).to_request()
    }

    pub fn get(&self, path: &str, params: &[(&str, &str)]) -> Request {
        self.query(test::TestRequest::get(), path, params)
    }

    pub fn delete(&self, path: &str, params: &[(&str, &str)]) -> Request {
        self.query(test::TestRequest::delete(), path, params)
    }

    pub fn post(&self, path: &str, params: &[(&str, &str)]) -> Request {
        self.form(test::TestRequest::post(), path, params)
    }

    pub fn put(&self, path: &str, params: &[(&str, &str)]) -> Request {
        self.form(test::TestRequest::put(), path, params)
    }
}

/// Creates a project for `session` and returns its id.
pub async fn create_project<S>(app: &S, session: &Session, name: &str) -> i32
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let reply = send(
        app,
        session.post("/api/add-project", &[("name", name), ("description", "d")]),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "add-project failed: {:?}", reply.body);
    reply.body["id"].as_i64().unwrap_or_default() as i32
}

/// Creates a task in `project_id` and returns its id.
pub async fn create_task<S>(app: &S, session: &Session, project_id: i32, title: &str) -> i32
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let project_id = project_id.to_string();
    let reply = send(
        app,
        session.post(
            "/api/add-task",
            &[("project_id", project_id.as_str()), ("title", title), ("description", "d")],
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "add-task failed: {:?}", reply.body);
    reply.body["id"].as_i64().unwrap_or_default() as i32
}
