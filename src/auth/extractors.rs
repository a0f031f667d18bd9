use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use super::gate::Credentials;

/// Cookie carrying the session token. HttpOnly.
pub const SESSION_COOKIE: &str = "session_token";
/// Cookie carrying a script-readable copy of the CSRF token.
pub const CSRF_COOKIE: &str = "csrf_token";
/// Header the client must echo the CSRF token in.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// The two token channels of a request: the session cookie and the CSRF header.
///
/// Extraction never fails. Missing values come out empty and are rejected later by
/// the gate, together with the claimed username, which lives in the form body or
/// the query string and so is only known to the handler.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    pub session_token: String,
    pub csrf_token: String,
}

impl SessionCredentials {
    /// Pairs the tokens with the username the request claims to act for.
    pub fn claim(self, username: Option<&str>) -> Credentials {
        Credentials {
            username: username.unwrap_or_default().trim().to_string(),
            session_token: self.session_token,
            csrf_token: self.csrf_token,
        }
    }
}

impl FromRequest for SessionCredentials {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let session_token = req
            .cookie(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .unwrap_or_default();
        let csrf_token = req
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        ready(Ok(SessionCredentials {
            session_token,
            csrf_token,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_extracts_cookie_and_header() {
        let req = test::TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "sess"))
            .insert_header((CSRF_HEADER, "csrf"))
            .to_http_request();

        let mut payload = Payload::None;
        let extracted = SessionCredentials::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert_eq!(extracted.session_token, "sess");
        assert_eq!(extracted.csrf_token, "csrf");
    }

    #[actix_rt::test]
    async fn test_missing_channels_extract_empty() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let extracted = SessionCredentials::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert!(extracted.session_token.is_empty());
        assert!(extracted.csrf_token.is_empty());
    }

    #[actix_rt::test]
    async fn test_csrf_cookie_is_not_a_substitute_for_header() {
        let req = test::TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "sess"))
            .cookie(Cookie::new(CSRF_COOKIE, "csrf"))
            .to_http_request();

        let mut payload = Payload::None;
        let extracted = SessionCredentials::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert!(extracted.csrf_token.is_empty());
    }

    #[::core::prelude::v1::test]
    fn test_claim_trims_username() {
        let creds = SessionCredentials {
            session_token: "s".into(),
            csrf_token: "c".into(),
        }
        .claim(Some("  alice "));
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.session_token, "s");

        let creds = SessionCredentials::default().claim(None);
        assert!(creds.username.is_empty());
    }
}
