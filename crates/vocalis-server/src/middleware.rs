use axum::{
    body::Body,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use vocalis_identity::{authenticate, User};

use crate::api::ApiError;
use crate::AppState;

/// The authenticated user, stored in request extensions by
/// [`auth_middleware`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Extracts the token from an `Authorization: Bearer <token>` value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Middleware to authenticate requests via `Authorization: Bearer`.
///
/// Every failure, whatever its cause, is the same 401 with
/// `WWW-Authenticate: Bearer`.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or_else(|| ApiError::InternalServerError("application state missing".to_string()))?
        .clone();

    // Directory lookups hit SQLite.
    let user = tokio::task::spawn_blocking(move || {
        authenticate(&token, &state.tokens, state.directory.as_ref())
    })
    .await
    .map_err(ApiError::join)??;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer  abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
