/// Authentication gate
///
/// Applied with `axum::middleware::from_fn_with_state` to every protected
/// router. On success the [`CurrentUser`] is inserted into the request
/// extensions, where handlers pick it up with `Extension<CurrentUser>`.
///
/// Runs before body extraction, so an unauthenticated request with an invalid
/// body is answered 401, not 400.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use taskmaster_shared::auth::middleware::{authenticate, AuthError, CurrentUser};
use tracing::debug;

use crate::{app::AppState, error::ApiError};

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user: CurrentUser = authenticate(&state.db, state.config.jwt_secret(), req.headers())
        .await
        .map_err(|err| {
            if !matches!(err, AuthError::Database(_)) {
                debug!(reason = %err, path = %req.uri().path(), "Authentication failed");
            }
            ApiError::from(err)
        })?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
