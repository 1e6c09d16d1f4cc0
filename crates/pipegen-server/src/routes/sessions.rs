use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pipegen_core::artifact::CONTENT_TYPE;
use pipegen_core::types::CiTool;
use pipegen_core::{GenerationRequest, PipegenError, PipelineArtifact, RefinementRequest};

use crate::error::AppError;
use crate::state::{lock, AppState, SessionEntry, SharedSession};

/// What clients see of a session.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub artifact: Option<PipelineArtifact>,
    pub iteration_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl SessionView {
    fn of(id: Uuid, entry: &SessionEntry) -> Self {
        SessionView {
            id,
            artifact: entry.session.artifact().cloned(),
            iteration_count: entry.session.iteration_count(),
            created_at: entry.created_at,
            last_active: entry.last_active,
        }
    }
}

fn session_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id)
        .map_err(|r| AppError::rejected(r.status(), r.body_text()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(b)| b)
        .map_err(|r| AppError::rejected(r.status(), r.body_text()))
}

fn find(app: &AppState, id: Uuid) -> Result<SharedSession, AppError> {
    app.sessions
        .get(&id)
        .ok_or_else(|| AppError::session_not_found(id))
}

/// POST /api/sessions: start an empty session.
pub async fn create_session(State(app): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let id = app.sessions.insert(app.new_session());
    tracing::info!(%id, "session created");
    (StatusCode::CREATED, Json(serde_json::json!({ "id": id })))
}

/// GET /api/sessions/{id}: current artifact and iteration count.
pub async fn get_session(
    State(app): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SessionView>, AppError> {
    let id = session_id(id)?;
    let shared = find(&app, id)?;
    // Waits behind any in-flight generate/refine on this session.
    let view = tokio::task::spawn_blocking(move || SessionView::of(id, &lock(&shared)))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?;
    Ok(Json(view))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    State(app): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = session_id(id)?;
    if !app.sessions.remove(&id) {
        return Err(AppError::session_not_found(id));
    }
    tracing::info!(%id, "session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/sessions/{id}/generate: generate a fresh pipeline from the
/// selected options, replacing any current artifact.
pub async fn generate(
    State(app): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<SessionView>, AppError> {
    let id = session_id(id)?;
    let body = json_body(body)?;
    let shared = find(&app, id)?;
    let view = tokio::task::spawn_blocking(move || {
        let mut entry = lock(&shared);
        entry.touch();
        entry.session.generate(&body)?;
        Ok::<_, PipegenError>(SessionView::of(id, &entry))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
pub struct RefineBody {
    pub feedback: String,
    /// Defaults to the tool the current artifact was generated for.
    #[serde(default)]
    pub ci_tool: Option<CiTool>,
}

/// POST /api/sessions/{id}/refine: revise the current artifact per feedback.
pub async fn refine(
    State(app): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<RefineBody>, JsonRejection>,
) -> Result<Json<SessionView>, AppError> {
    let id = session_id(id)?;
    let body = json_body(body)?;
    let shared = find(&app, id)?;
    let view = tokio::task::spawn_blocking(move || {
        let mut entry = lock(&shared);
        entry.touch();
        let ci_tool = body
            .ci_tool
            .or_else(|| entry.session.artifact().map(|a| a.ci_tool))
            .ok_or(PipegenError::NoArtifact)?;
        entry.session.refine(&RefinementRequest {
            feedback: body.feedback,
            ci_tool,
        })?;
        Ok::<_, PipegenError>(SessionView::of(id, &entry))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(view))
}

/// GET /api/sessions/{id}/download: the current artifact as a plain-text
/// attachment named `pipeline{extension}`.
pub async fn download(
    State(app): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Response, AppError> {
    let id = session_id(id)?;
    let shared = find(&app, id)?;
    let artifact = tokio::task::spawn_blocking(move || {
        let mut entry = lock(&shared);
        entry.touch();
        entry.session.artifact().cloned()
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?
    .ok_or(PipegenError::NoArtifact)?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.download_filename());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.to_bytes(),
    )
        .into_response())
}
