use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// The shared secret expected as `Authorization: Bearer <key>`.
#[derive(Clone)]
pub struct ApiKey(Arc<str>);

impl From<&str> for ApiKey {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl ApiKey {
    /// Compares in constant time with respect to the token contents.
    pub fn matches(&self, token: &str) -> bool {
        token.as_bytes().ct_eq(self.0.as_bytes()).into()
    }
}

// keep the secret out of logs
impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(..)")
    }
}

pub async fn require_api_key(
    State(api_key): State<ApiKey>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized("missing or invalid token"))?;
    if !api_key.matches(token) {
        log::info!("rejected request to {} with mismatched API key", request.uri());
        return Err(AppError::Unauthorized("invalid API key"));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn matches() {
        let key = ApiKey::from("hunter2");
        assert!(key.matches("hunter2"));
        assert!(!key.matches("hunter"));
        assert!(!key.matches("hunter22"));
        assert!(!key.matches("Hunter2"));
        assert!(!key.matches(""));
        assert_eq!(format!("{key:?}"), "ApiKey(..)");
    }
}
