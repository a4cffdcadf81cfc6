//! In-process session registry and the turn loop around the Dialogue Engine.
//!
//! Each session sits behind its own mutex. The lock is held for the synchronous
//! engine transitions only, never across a generation call, so an exit keyword
//! sent while questions are being generated is handled immediately.
//!
//! Once a finished session's record is persisted the live session is dropped.
//! Its `ExportRecord` stays readable until `finished_capacity` newer sessions
//! have finished.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error};
use uuid::Uuid;

use crate::screening::engine::{DialogueEngine, DisplayMessage, GenerationTask, Step};
use crate::screening::messages;
use crate::screening::models::{DialogueState, Lifecycle, SessionState, Turn, TurnRole};
use crate::screening::report::{self, ExportRecord};
use crate::screening::store::JsonlStore;

/// Finished sessions whose records stay available to the view and report endpoints.
const FINISHED_SESSIONS_RETAINED: usize = 1000;

struct SessionHandle {
    session: Mutex<SessionState>,
    /// Set once the export record has been handed to the store.
    persisted: AtomicBool,
}

/// Records of retired sessions, oldest evicted first.
#[derive(Default)]
struct FinishedReports {
    order: VecDeque<Uuid>,
    records: HashMap<Uuid, ExportRecord>,
}

impl FinishedReports {
    fn insert(&mut self, record: ExportRecord, capacity: usize) {
        let id = record.session_id;
        if self.records.insert(id, record).is_none() {
            self.order.push_back(id);
        }
        while self.order.len() > capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.records.remove(&oldest);
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub state: DialogueState,
    pub lifecycle: Lifecycle,
    pub prompt: String,
    pub transcript: Vec<Turn>,
}

impl SessionView {
    fn from_record(record: &ExportRecord) -> Self {
        let prompt = record
            .transcript
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::System)
            .map(|t| t.text.clone())
            .unwrap_or_else(|| messages::SESSION_CLOSED.to_string());
        Self {
            session_id: record.session_id,
            state: record.final_state,
            lifecycle: record.lifecycle,
            prompt,
            transcript: record.transcript.clone(),
        }
    }
}

pub struct ScreeningService {
    engine: DialogueEngine,
    store: JsonlStore,
    sessions: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
    finished: RwLock<FinishedReports>,
    finished_capacity: usize,
}

impl ScreeningService {
    pub fn new(engine: DialogueEngine, store: JsonlStore) -> Self {
        Self {
            engine,
            store,
            sessions: RwLock::new(HashMap::new()),
            finished: RwLock::new(FinishedReports::default()),
            finished_capacity: FINISHED_SESSIONS_RETAINED,
        }
    }

    /// Opens a session and returns its id with the greeting.
    pub async fn start_session(&self) -> (Uuid, DisplayMessage) {
        let mut session = SessionState::new();
        let greeting = self.engine.start(&mut session);
        let id = session.id;

        let handle = Arc::new(SessionHandle {
            session: Mutex::new(session),
            persisted: AtomicBool::new(false),
        });
        self.sessions.write().await.insert(id, handle);
        (id, greeting)
    }

    /// Feeds one candidate utterance to the session. `None` for an unknown id.
    pub async fn submit_turn(self: &Arc<Self>, id: Uuid, text: &str) -> Option<DisplayMessage> {
        let Some(handle) = self.handle(id).await else {
            return self.finished_reply(id).await;
        };

        let step = {
            let mut session = handle.session.lock().await;
            self.engine.transition(&mut session, text)
        };
        match step {
            Step::Reply(message) => {
                if message.lifecycle.is_terminal() {
                    self.persist_once(&handle).await;
                }
                Some(message)
            }
            Step::Generate(task) => {
                // Detached from the request: dropping the caller must not cancel
                // the call or leave the session in a GENERATE_* state.
                let service = Arc::clone(self);
                let owned = Arc::clone(&handle);
                let generation =
                    tokio::spawn(async move { service.complete_generation(&owned, task).await });
                match generation.await {
                    Ok(message) => Some(message),
                    Err(e) => {
                        error!(session_id = %id, "Generation task failed: {e}");
                        let session = handle.session.lock().await;
                        Some(self.engine.next_prompt(&session))
                    }
                }
            }
        }
    }

    pub async fn view(&self, id: Uuid) -> Option<SessionView> {
        let Some(handle) = self.handle(id).await else {
            return self.finished.read().await.records.get(&id).map(SessionView::from_record);
        };
        let session = handle.session.lock().await;
        Some(SessionView {
            session_id: session.id,
            state: session.state(),
            lifecycle: session.lifecycle(),
            prompt: self.engine.next_prompt(&session).text,
            transcript: session.transcript().to_vec(),
        })
    }

    /// The record as it stands now; contact fields are never hashed here.
    pub async fn report(&self, id: Uuid) -> Option<ExportRecord> {
        let Some(handle) = self.handle(id).await else {
            return self.finished.read().await.records.get(&id).cloned();
        };
        let record = report::assemble(&*handle.session.lock().await);
        if record.lifecycle.is_terminal() {
            self.persist_once(&handle).await;
        }
        Some(record)
    }

    async fn handle(&self, id: Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.read().await.get(&id).cloned()
    }

    async fn complete_generation(&self, handle: &SessionHandle, task: GenerationTask) -> DisplayMessage {
        let outcome = self.engine.run_generation(task).await;
        let message = {
            let mut session = handle.session.lock().await;
            self.engine.apply_generation(&mut session, outcome)
        };
        if message.lifecycle.is_terminal() {
            self.persist_once(handle).await;
        }
        message
    }

    /// Reply for input sent to a session that has already been retired.
    async fn finished_reply(&self, id: Uuid) -> Option<DisplayMessage> {
        let finished = self.finished.read().await;
        let record = finished.records.get(&id)?;
        Some(DisplayMessage {
            text: messages::SESSION_CLOSED.to_string(),
            state: record.final_state,
            lifecycle: record.lifecycle,
        })
    }

    /// Appends the terminal record unless it was already written, then retires
    /// the live session. A failed append clears the flag so the next turn or
    /// report read retries it.
    async fn persist_once(&self, handle: &SessionHandle) {
        if handle.persisted.swap(true, Ordering::SeqCst) {
            return;
        }
        let record = report::assemble(&*handle.session.lock().await);
        let session_id = record.session_id;
        match self.store.append(record.clone()).await {
            Ok(()) => {
                self.finished
                    .write()
                    .await
                    .insert(record, self.finished_capacity);
                self.sessions.write().await.remove(&session_id);
                debug!(%session_id, "Session retired from the live registry");
            }
            Err(e) => {
                error!(%session_id, "Failed to persist export record: {e}");
                handle.persisted.store(false, Ordering::SeqCst);
            }
        }
    }
}
