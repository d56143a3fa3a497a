//! Axum route handlers for the interview session API.

use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::documents::{read_document, DocumentRole};
use crate::errors::AppError;
use crate::prompts::{StructuredRequest, TaskKind, TaskTemplate, TEMPLATE_VERSION};
use crate::session::{run_task, DocumentView, SessionView, SlotView};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    /// Candidate's answer; only read by the feedback task.
    pub answer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskInfo {
    pub task: TaskKind,
    pub template_version: u32,
    #[serde(flatten)]
    pub template: &'static TaskTemplate,
}

#[derive(Debug, Serialize)]
pub struct GreetingResponse {
    pub model: String,
    pub reply: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let view = state.sessions.create().await;
    info!("Created session {}", view.id);
    (StatusCode::CREATED, Json(view))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.sessions.view(id).await?))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/documents/:role
///
/// Multipart upload with a single `file` field. The previous document for the
/// role is replaced whether or not the new one reads successfully.
pub async fn handle_upload_document(
    State(state): State<AppState>,
    Path((id, role)): Path<(Uuid, String)>,
    mut multipart: Multipart,
) -> Result<Json<DocumentView>, AppError> {
    let role: DocumentRole = role.parse().map_err(AppError::Validation)?;
    // fail fast on an unknown session before reading the body
    state.sessions.view(id).await?;

    let (file_name, bytes) = next_file_field(&mut multipart).await?;
    info!(
        "Session {id}: received {role} '{file_name}' ({} bytes)",
        bytes.len()
    );

    let read = {
        let file_name = file_name.clone();
        tokio::task::spawn_blocking(move || read_document(role, &file_name, &bytes))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
    };

    if let Ok(doc) = &read {
        info!(
            "Session {id}: stored {role} '{file_name}' as {:?} ({} bytes, {} chars)",
            doc.format,
            doc.byte_len,
            doc.text.chars().count()
        );
    }
    let failure = read.as_ref().err().cloned();
    let view = state
        .sessions
        .update(id, |session| {
            session.store_document(role, read);
            session.document_view(role)
        })
        .await?;

    match failure {
        Some(e) => {
            warn!("Session {id}: could not read {role} '{file_name}': {e}");
            Err(e.into())
        }
        None => Ok(Json(view)),
    }
}

/// POST /api/v1/sessions/:id/tasks/:task
///
/// Runs one task slot. The body is optional; the feedback task reads `answer`.
/// A request with no JSON content type counts as no body. A JSON body that
/// does not parse is rejected.
pub async fn handle_run_task(
    State(state): State<AppState>,
    Path((id, task)): Path<(Uuid, String)>,
    body: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<Json<SlotView>, AppError> {
    let task: TaskKind = task.parse().map_err(AppError::Validation)?;
    let answer = match body {
        Ok(Json(request)) => request.answer,
        Err(JsonRejection::MissingJsonContentType(_)) => None,
        Err(rejection) => {
            return Err(AppError::Validation(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )))
        }
    };

    let view = run_task(&state.sessions, state.llm.clone(), id, task, answer).await?;
    Ok(Json(view))
}

/// GET /api/v1/tasks
pub async fn handle_list_tasks() -> Json<Vec<TaskInfo>> {
    Json(
        TaskKind::ALL
            .into_iter()
            .map(|task| TaskInfo {
                task,
                template_version: TEMPLATE_VERSION,
                template: task.template(),
            })
            .collect(),
    )
}

/// GET /api/v1/greeting
///
/// The opening "hello" exchange shown at the top of the page.
pub async fn handle_greeting(
    State(state): State<AppState>,
) -> Result<Json<GreetingResponse>, AppError> {
    let reply = state.llm.complete(&StructuredRequest::greeting()).await?;
    Ok(Json(GreetingResponse {
        model: state.llm.model().to_string(),
        reply,
    }))
}

/// Pulls the `file` field out of the upload. Other fields are ignored.
async fn next_file_field(multipart: &mut Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Upload has no file name".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?;
        return Ok((file_name, bytes));
    }
    Err(AppError::Validation(
        "Upload must contain a 'file' field".to_string(),
    ))
}
