//! Session Orchestrator: per-browser state holding the two uploaded documents
//! and the four task slots, plus the single generic `run_task` operation.

pub mod handlers;
pub mod store;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::documents::{DocumentRole, SourceDocument};
use crate::errors::{AppError, ErrorView, TaskError};
use crate::llm_client::CompletionBackend;
use crate::prompts::{assemble, InputSlot, PromptInputs, StructuredRequest, TaskKind};

pub use store::SessionStore;

/// Lifecycle of one task slot. `Done` and `Failed` are both re-armed: the
/// user may trigger the task again. Only `Running` rejects a trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotState {
    Idle,
    Running,
    Done { output: String },
    Failed { error: TaskError },
}

#[derive(Debug, Clone)]
pub struct TaskSlot {
    pub state: SlotState,
    pub runs: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for TaskSlot {
    fn default() -> Self {
        Self {
            state: SlotState::Idle,
            runs: 0,
            updated_at: None,
        }
    }
}

/// Explicit session state, passed to every operation.
///
/// A document entry is absent (never uploaded), `Ok` (read succeeded) or
/// `Err` (the last upload for that role failed to read).
#[derive(Debug)]
pub struct SessionContext {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    documents: HashMap<DocumentRole, Result<SourceDocument, TaskError>>,
    slots: HashMap<TaskKind, TaskSlot>,
}

impl SessionContext {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            last_active: now,
            documents: HashMap::new(),
            slots: TaskKind::ALL
                .into_iter()
                .map(|task| (task, TaskSlot::default()))
                .collect(),
        }
    }

    /// Replaces whatever was previously held for `role`, success or failure.
    pub fn store_document(&mut self, role: DocumentRole, read: Result<SourceDocument, TaskError>) {
        self.touch();
        self.documents.insert(role, read);
    }

    pub fn slot(&self, task: TaskKind) -> &TaskSlot {
        // every TaskKind is inserted in new()
        &self.slots[&task]
    }

    fn slot_mut(&mut self, task: TaskKind) -> &mut TaskSlot {
        self.slots.entry(task).or_default()
    }

    /// Moves `task` to `Running` and returns the request to send.
    ///
    /// A slot already running yields `TaskInFlight` and is left untouched.
    /// Input or assembly failures move the slot straight to `Failed`.
    pub fn begin(&mut self, task: TaskKind, answer: Option<&str>) -> Result<StructuredRequest, AppError> {
        self.touch();
        if self.slot(task).state == SlotState::Running {
            return Err(AppError::TaskInFlight { task });
        }

        match self.prepare(task, answer) {
            Ok(request) => {
                let slot = self.slot_mut(task);
                slot.state = SlotState::Running;
                slot.runs += 1;
                slot.updated_at = Some(Utc::now());
                Ok(request)
            }
            Err(e) => {
                self.finish(task, Err(e.clone()));
                Err(e.into())
            }
        }
    }

    /// Records the outcome of the backend call for `task`.
    pub fn finish(&mut self, task: TaskKind, outcome: Result<String, TaskError>) {
        self.touch();
        let slot = self.slot_mut(task);
        slot.state = match outcome {
            Ok(output) => SlotState::Done { output },
            Err(error) => SlotState::Failed { error },
        };
        slot.updated_at = Some(Utc::now());
    }

    fn prepare(&self, task: TaskKind, answer: Option<&str>) -> Result<StructuredRequest, TaskError> {
        let needs = |slot: InputSlot| task.template().slots.contains(&slot);

        let resume = if needs(InputSlot::Resume) {
            self.document_input(DocumentRole::Resume)?
        } else {
            None
        };
        let job_description = if needs(InputSlot::JobDescription) {
            self.document_input(DocumentRole::JobDescription)?
        } else {
            None
        };

        assemble(
            task,
            &PromptInputs {
                resume,
                job_description,
                answer,
            },
        )
    }

    /// A failed read is reported as that failure, not as a missing input.
    fn document_input(&self, role: DocumentRole) -> Result<Option<&str>, TaskError> {
        match self.documents.get(&role) {
            None => Ok(None),
            Some(Ok(doc)) => Ok(Some(doc.text.as_str())),
            Some(Err(e)) => Err(e.clone()),
        }
    }

    fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            created_at: self.created_at,
            documents: DocumentRole::ALL
                .into_iter()
                .map(|role| self.document_view(role))
                .collect(),
            slots: TaskKind::ALL
                .into_iter()
                .map(|task| self.slot_view(task))
                .collect(),
        }
    }

    pub fn document_view(&self, role: DocumentRole) -> DocumentView {
        match self.documents.get(&role) {
            None => DocumentView {
                role,
                status: "absent",
                document: None,
                text_chars: None,
                error: None,
            },
            Some(Ok(doc)) => DocumentView {
                role,
                status: "ready",
                document: Some(doc.clone()),
                text_chars: Some(doc.text.chars().count()),
                error: None,
            },
            Some(Err(e)) => DocumentView {
                role,
                status: "failed",
                document: None,
                text_chars: None,
                error: Some(e.view()),
            },
        }
    }

    pub fn slot_view(&self, task: TaskKind) -> SlotView {
        let slot = self.slot(task);
        let (state, output, error) = match &slot.state {
            SlotState::Idle => ("idle", None, None),
            SlotState::Running => ("running", None, None),
            SlotState::Done { output } => ("done", Some(output.clone()), None),
            SlotState::Failed { error } => ("failed", None, Some(error.view())),
        };
        SlotView {
            task,
            title: task.template().title,
            state,
            output,
            error,
            runs: slot.runs,
            updated_at: slot.updated_at,
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub documents: Vec<DocumentView>,
    pub slots: Vec<SlotView>,
}

#[derive(Debug, Serialize)]
pub struct DocumentView {
    pub role: DocumentRole,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<SourceDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_chars: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorView>,
}

#[derive(Debug, Serialize)]
pub struct SlotView {
    pub task: TaskKind,
    pub title: &'static str,
    pub state: &'static str,
    pub output: Option<String>,
    pub error: Option<ErrorView>,
    pub runs: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Runs one task slot end to end: begin, one backend call, record the outcome.
///
/// The session lock is released while the backend call is outstanding, so
/// other slots and uploads stay usable. The slot's `Running` state is what
/// keeps a second trigger of the same task out.
///
/// The backend call and the outcome write run on their own spawned task. If
/// the caller is dropped mid-call the outcome is still recorded and the slot
/// leaves `Running`.
pub async fn run_task(
    store: &SessionStore,
    backend: Arc<dyn CompletionBackend>,
    session_id: Uuid,
    task: TaskKind,
    answer: Option<String>,
) -> Result<SlotView, AppError> {
    let request = store
        .update(session_id, |session| session.begin(task, answer.as_deref()))
        .await??;

    info!("Running {task} for session {session_id} (model {})", backend.model());
    let store = store.clone();
    let call = tokio::spawn(async move {
        let started = Instant::now();
        let outcome = backend.complete(&request).await;
        let elapsed_ms = started.elapsed().as_millis();

        match &outcome {
            Ok(reply) => info!(
                "{task} for session {session_id} done in {elapsed_ms}ms ({} chars)",
                reply.len()
            ),
            Err(e) => warn!("{task} for session {session_id} failed after {elapsed_ms}ms: {e}"),
        }

        let view = store
            .update(session_id, |session| {
                session.finish(task, outcome.clone());
                session.slot_view(task)
            })
            .await;
        (outcome, view)
    });

    let (outcome, view) = call.await.map_err(|e| AppError::Internal(e.into()))?;
    let view = view?;
    match outcome {
        Ok(_) => Ok(view),
        Err(e) => Err(e.into()),
    }
}
