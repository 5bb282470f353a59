use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest};

use crate::errors::AppError;

/// The raw session token from `Authorization: Bearer <token>`. It is resolved
/// to a caller inside the blocking section of each handler.
#[derive(Debug, Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl FromRequest for BearerToken {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(bearer_token(req).map(BearerToken).ok_or_else(|| {
            log::warn!("missing bearer token on {}", req.path());
            AppError::Unauthorized
        }))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn extracts_token_after_scheme() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc123"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc123"));
    }

    #[test]
    fn rejects_other_schemes_and_blank_tokens() {
        let basic = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic dXNlcg=="))
            .to_http_request();
        let blank = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer   "))
            .to_http_request();
        assert!(bearer_token(&basic).is_none());
        assert!(bearer_token(&blank).is_none());
        assert!(bearer_token(&TestRequest::default().to_http_request()).is_none());
    }
}
