use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pipegen_core::PipegenError;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit 404 Not Found errors
// ---------------------------------------------------------------------------

/// Private sentinel error type used to carry an explicit HTTP 404 through
/// the `anyhow::Error` chain without touching the `PipegenError` enum.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

/// An extractor rejection (bad path segment, malformed or mistyped JSON
/// body) carried with the status axum chose for it.
#[derive(Debug)]
struct RejectedError {
    status: StatusCode,
    message: String,
}

impl std::fmt::Display for RejectedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RejectedError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 404 Not Found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }

    pub fn session_not_found(id: impl std::fmt::Display) -> Self {
        Self::not_found(format!("session not found: {id}"))
    }

    /// Wrap an axum extractor rejection so it renders as a JSON error body
    /// with the rejection's own status.
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        Self(
            RejectedError {
                status,
                message: message.into(),
            }
            .into(),
        )
    }
}

fn status_for(err: &PipegenError) -> StatusCode {
    match err {
        PipegenError::NoArtifact => StatusCode::CONFLICT,
        PipegenError::EmptyFeedback
        | PipegenError::InvalidCiTool(_)
        | PipegenError::InvalidLanguage(_)
        | PipegenError::InvalidBuildTool(_)
        | PipegenError::InvalidDeploymentTarget(_) => StatusCode::BAD_REQUEST,
        PipegenError::Backend(_) | PipegenError::EmptyResponse => StatusCode::BAD_GATEWAY,
        PipegenError::MissingCredential(_)
        | PipegenError::ConfigNotFound(_)
        | PipegenError::Io(_)
        | PipegenError::Yaml(_)
        | PipegenError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(n) = self.0.downcast_ref::<NotFoundError>() {
            let body = serde_json::json!({ "error": n.0.clone() });
            return (StatusCode::NOT_FOUND, axum::Json(body)).into_response();
        }
        if let Some(r) = self.0.downcast_ref::<RejectedError>() {
            tracing::debug!(status = %r.status, "request rejected: {}", r.message);
            let body = serde_json::json!({ "error": r.message.clone() });
            return (r.status, axum::Json(body)).into_response();
        }

        let status = match self.0.downcast_ref::<PipegenError>() {
            Some(e) => status_for(e),
            None => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("request failed: {:#}", self.0);
        } else if status == StatusCode::BAD_GATEWAY {
            tracing::warn!("generation backend failed: {:#}", self.0);
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
