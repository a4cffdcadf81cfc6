//! Dialogue Engine: the screening state machine.
//!
//! `transition` is the synchronous core: `(session, input) -> Step`. It never
//! awaits. When a transition needs the generation backend it returns
//! `Step::Generate`; the caller runs the task (`run_generation`) without holding
//! the session and feeds the outcome back through `apply_generation`. If the
//! session was abandoned meanwhile, the outcome is discarded.
//!
//! `handle_input` chains the three for callers that own the session outright.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::generation::{GenerationError, ScreeningGenerator};
use crate::screening::limits::ScreeningLimits;
use crate::screening::messages;
use crate::screening::models::{
    DialogueState, Lifecycle, ProfileField, ProfileSummary, RoleSuggestions, SessionState,
    TechnicalQuestionSet, Turn,
};
use crate::screening::sentiment::classify;

/// What the host surface renders after a turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayMessage {
    pub text: String,
    pub state: DialogueState,
    pub lifecycle: Lifecycle,
}

impl DisplayMessage {
    fn new(session: &SessionState, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            state: session.state(),
            lifecycle: session.lifecycle(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationTask {
    Questions(Vec<String>),
    RoleSuggestions(ProfileSummary),
}

#[derive(Debug)]
pub enum GenerationOutcome {
    Questions(Result<TechnicalQuestionSet, GenerationError>),
    RoleSuggestions(Result<RoleSuggestions, GenerationError>),
}

#[derive(Debug)]
pub enum Step {
    Reply(DisplayMessage),
    Generate(GenerationTask),
}

pub struct DialogueEngine {
    limits: Arc<ScreeningLimits>,
    generator: Arc<dyn ScreeningGenerator>,
    /// Caller-side bound on one generation call, retries included.
    deadline: Duration,
}

impl DialogueEngine {
    pub fn new(
        limits: Arc<ScreeningLimits>,
        generator: Arc<dyn ScreeningGenerator>,
        deadline: Duration,
    ) -> Self {
        Self {
            limits,
            generator,
            deadline,
        }
    }

    /// Leaves `GREETING`: emits the greeting and starts collecting the name.
    pub fn start(&self, session: &mut SessionState) -> DisplayMessage {
        if session.state() != DialogueState::Greeting {
            return self.next_prompt(session);
        }
        info!(session_id = %session.id, "Screening session started");
        self.advance(session, DialogueState::CollectName);
        self.say(session, messages::GREETING)
    }

    /// The prompt for the current state. Pure: the session is not modified.
    pub fn next_prompt(&self, session: &SessionState) -> DisplayMessage {
        let name = session.profile.full_name.accepted().map(String::as_str);
        let text = match session.state() {
            DialogueState::Greeting => messages::GREETING.to_string(),
            DialogueState::AskTechQuestions => match (session.current_question(), session.questions()) {
                (Some((technology, question)), Some(set)) => {
                    messages::question(session.answers().len(), set.total(), technology, question)
                }
                _ => messages::STILL_PREPARING.to_string(),
            },
            DialogueState::GenerateQuestions | DialogueState::GenerateRoleSuggestions => {
                messages::STILL_PREPARING.to_string()
            }
            DialogueState::Closing | DialogueState::Completed => messages::closing(name),
            DialogueState::Abandoned => messages::FAREWELL.to_string(),
            DialogueState::ErrorTerminated if session.questions().is_none() => {
                messages::QUESTIONS_UNAVAILABLE.to_string()
            }
            DialogueState::ErrorTerminated => messages::ROLES_UNAVAILABLE.to_string(),
            state => match state.collecting() {
                Some(field) => messages::prompt_for(field).to_string(),
                None => messages::STILL_PREPARING.to_string(),
            },
        };
        DisplayMessage::new(session, text)
    }

    /// Consumes one candidate utterance.
    ///
    /// Order of checks: terminal sessions refuse input; the exit keyword wins
    /// over everything else; while a generation call is outstanding other input
    /// is refused without being recorded.
    pub fn transition(&self, session: &mut SessionState, raw_text: &str) -> Step {
        if session.state().is_terminal() || session.state() == DialogueState::Closing {
            return Step::Reply(DisplayMessage::new(session, messages::SESSION_CLOSED));
        }
        if session.state() == DialogueState::Greeting {
            self.start(session);
        }

        let text = raw_text.trim();
        if self.limits.is_exit_keyword(text) {
            session.push_turn(Turn::candidate(text, classify(text)));
            return Step::Reply(self.abandon(session));
        }
        if session.state().is_generating() {
            return Step::Reply(DisplayMessage::new(session, messages::STILL_PREPARING));
        }

        session.push_turn(Turn::candidate(text, classify(text)));

        match session.state().collecting() {
            Some(field) => self.collect(session, field, text),
            None => self.record_answer(session, text),
        }
    }

    /// Runs a generation task under the engine's deadline.
    pub async fn run_generation(&self, task: GenerationTask) -> GenerationOutcome {
        match task {
            GenerationTask::Questions(stack) => GenerationOutcome::Questions(
                self.with_deadline(self.generator.generate_questions(&stack))
                    .await,
            ),
            GenerationTask::RoleSuggestions(summary) => GenerationOutcome::RoleSuggestions(
                self.with_deadline(self.generator.generate_role_suggestions(&summary))
                    .await,
            ),
        }
    }

    /// Applies a finished generation call. Outcomes for a session that is no
    /// longer waiting on them are discarded.
    pub fn apply_generation(
        &self,
        session: &mut SessionState,
        outcome: GenerationOutcome,
    ) -> DisplayMessage {
        match outcome {
            GenerationOutcome::Questions(result) => {
                if session.state() != DialogueState::GenerateQuestions {
                    debug!(session_id = %session.id, state = ?session.state(), "Discarding question generation result");
                    return self.next_prompt(session);
                }
                match result {
                    Ok(set) => {
                        let total = set.total();
                        info!(session_id = %session.id, total, "Technical questions generated");
                        session.install_questions(set);
                        self.advance(session, DialogueState::AskTechQuestions);
                        let first = self.next_prompt(session).text;
                        self.say(
                            session,
                            format!("{}\n\n{first}", messages::questions_intro(total)),
                        )
                    }
                    Err(e) => self.terminate(session, &e, messages::QUESTIONS_UNAVAILABLE),
                }
            }
            GenerationOutcome::RoleSuggestions(result) => {
                if session.state() != DialogueState::GenerateRoleSuggestions {
                    debug!(session_id = %session.id, state = ?session.state(), "Discarding role suggestion result");
                    return self.next_prompt(session);
                }
                match result {
                    Ok(roles) => {
                        let suggestions = messages::role_suggestions(&roles);
                        session.install_role_suggestions(roles);
                        self.advance(session, DialogueState::Closing);
                        session.push_turn(Turn::system(suggestions.clone()));

                        let closing = messages::closing(
                            session.profile.full_name.accepted().map(String::as_str),
                        );
                        self.advance(session, DialogueState::Completed);
                        let done = self.say(session, closing);
                        DisplayMessage {
                            text: format!("{suggestions}\n\n{}", done.text),
                            ..done
                        }
                    }
                    Err(e) => self.terminate(session, &e, messages::ROLES_UNAVAILABLE),
                }
            }
        }
    }

    /// Full turn: transition, generation if needed, and its application.
    pub async fn handle_input(&self, session: &mut SessionState, raw_text: &str) -> DisplayMessage {
        match self.transition(session, raw_text) {
            Step::Reply(message) => message,
            Step::Generate(task) => {
                let outcome = self.run_generation(task).await;
                self.apply_generation(session, outcome)
            }
        }
    }

    fn collect(&self, session: &mut SessionState, field: ProfileField, text: &str) -> Step {
        match session.profile.submit(field, text, &self.limits) {
            Ok(_) => {
                let next = session.state().next();
                self.advance(session, next);
                match next.collecting() {
                    Some(next_field) => {
                        let reply = messages::accepted_then(
                            next_field,
                            session.profile.full_name.accepted().map(String::as_str),
                        );
                        Step::Reply(self.say(session, reply))
                    }
                    None => Step::Generate(GenerationTask::Questions(
                        session
                            .profile
                            .tech_stack
                            .accepted()
                            .cloned()
                            .unwrap_or_default(),
                    )),
                }
            }
            Err(e) => {
                info!(session_id = %session.id, field = field.as_str(), "Validation rejected: {e}");
                Step::Reply(self.say(session, messages::corrective(&e)))
            }
        }
    }

    fn record_answer(&self, session: &mut SessionState, text: &str) -> Step {
        session.answers.push(text.to_string());
        if session.current_question().is_some() {
            let next = self.next_prompt(session).text;
            return Step::Reply(self.say(session, next));
        }
        self.advance(session, DialogueState::GenerateRoleSuggestions);
        Step::Generate(GenerationTask::RoleSuggestions(session.profile.summary()))
    }

    fn abandon(&self, session: &mut SessionState) -> DisplayMessage {
        info!(session_id = %session.id, state = ?session.state(), "Candidate ended the screening");
        self.advance(session, DialogueState::Abandoned);
        self.say(session, messages::FAREWELL)
    }

    fn terminate(
        &self,
        session: &mut SessionState,
        e: &GenerationError,
        apology: &str,
    ) -> DisplayMessage {
        error!(session_id = %session.id, "Generation failed, terminating session: {e}");
        session.failure = Some(e.to_string());
        self.advance(session, DialogueState::ErrorTerminated);
        self.say(session, apology)
    }

    fn advance(&self, session: &mut SessionState, to: DialogueState) {
        info!(session_id = %session.id, from = ?session.state(), to = ?to, "Dialogue state transition");
        session.state = to;
        if to.is_terminal() && session.ended_at.is_none() {
            session.ended_at = Some(Utc::now());
        }
    }

    /// Records a system turn and wraps it for display.
    fn say(&self, session: &mut SessionState, text: impl Into<String>) -> DisplayMessage {
        let text = text.into();
        session.push_turn(Turn::system(text.clone()));
        DisplayMessage::new(session, text)
    }

    async fn with_deadline<T>(
        &self,
        call: impl Future<Output = Result<T, GenerationError>>,
    ) -> Result<T, GenerationError> {
        tokio::time::timeout(self.deadline, call)
            .await
            .unwrap_or(Err(GenerationError::DeadlineExceeded(self.deadline)))
    }
}
