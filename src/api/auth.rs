//! Bearer-token authorization middleware for the REST API
//!
//! When `ApiConfig::auth_tokens` is non-empty, every `/api/*` request must carry
//! `Authorization: Bearer <token>` with a token from that list. An empty list
//! disables the check.

use crate::error::{AuthError, Error};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Middleware that enforces bearer-token authorization
///
/// # Returns
///
/// - 401 when the header is missing, uses another scheme, or has no token
/// - 403 when the token is not in the configured list
/// - The response from the next handler otherwise
///
/// # Examples
///
/// ```no_run
/// use axum::{Router, middleware};
/// use std::sync::Arc;
/// use video_relay::api::auth::require_bearer_token;
///
/// let tokens = Arc::new(vec!["secret-token".to_string()]);
/// let router: Router = Router::new()
///     .route_layer(middleware::from_fn_with_state(tokens, require_bearer_token));
/// ```
pub async fn require_bearer_token(
    State(tokens): State<Arc<Vec<String>>>,
    request: Request,
    next: Next,
) -> Response {
    if tokens.is_empty() {
        return next.run(request).await;
    }

    match check_bearer(request.headers(), &tokens) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::debug!(reason = %e, path = %request.uri().path(), "Rejected API request");
            Error::Auth(e).into_response()
        }
    }
}

/// Validate the Authorization header against the accepted tokens
pub fn check_bearer(headers: &HeaderMap, tokens: &[String]) -> Result<(), AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingHeader)?;

    let (scheme, token) = header.split_once(' ').unwrap_or((header, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidScheme);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    if tokens.iter().any(|accepted| accepted == token) {
        Ok(())
    } else {
        Err(AuthError::InvalidToken)
    }
}
