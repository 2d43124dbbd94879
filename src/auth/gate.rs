use super::token::{Claims, TokenSigner, extract_bearer};
use crate::core::CmsError;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use tracing::{debug, warn};

/// Rejects requests without a valid bearer token.
///
/// Verified [`Claims`] are inserted into the request extensions for handlers
/// that want to know who is editing.
pub async fn require_auth(
    State(tokens): State<Arc<TokenSigner>>,
    mut request: Request,
    next: Next,
) -> Result<Response, CmsError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let claims = match extract_bearer(header).and_then(|token| tokens.verify(token)) {
        Ok(claims) => claims,
        Err(err) => {
            warn!(
                method = %request.method(),
                path = request.uri().path(),
                code = err.code(),
                "request rejected by auth gate"
            );
            return Err(err);
        }
    };

    debug!(username = %claims.username, "request authenticated");
    request.extensions_mut().insert::<Claims>(claims);
    Ok(next.run(request).await)
}
