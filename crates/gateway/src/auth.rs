//! Bearer-token authentication middleware.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use parlor_core::error::AuthError;
use tracing::debug;

use crate::SharedState;
use crate::error::ApiError;

/// Verify `Authorization: Bearer <token>` and attach the caller's
/// [`VerifiedUser`](parlor_core::identity::VerifiedUser) to the request.
///
/// Every failure produces the same 401 response.
pub async fn auth_middleware(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req).ok_or(AuthError::MissingToken);

    let user = match token {
        Ok(token) => state.verifier.verify(&token).await,
        Err(e) => Err(e),
    };

    match user {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            debug!(verifier = state.verifier.name(), "Unauthorized request: {e}");
            Err(ApiError::Unauthorized)
        }
    }
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}
