use crate::core::CmsError;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, async_trait};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl CmsError {
    pub fn status(&self) -> StatusCode {
        match self {
            CmsError::Validation(_) => StatusCode::BAD_REQUEST,
            CmsError::Unauthorized(_) | CmsError::TokenExpired => StatusCode::UNAUTHORIZED,
            CmsError::Forbidden(_) => StatusCode::FORBIDDEN,
            CmsError::NotFound(_) => StatusCode::NOT_FOUND,
            CmsError::Conflict(_) => StatusCode::CONFLICT,
            CmsError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            CmsError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            CmsError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CmsError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code(),
        });

        (status, body).into_response()
    }
}

/// JSON body extractor whose rejections use the common error shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CmsError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(CmsError::validation(rejection.body_text())),
        }
    }
}
