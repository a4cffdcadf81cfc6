//! Generation Client: turns an accepted tech stack into interview questions and
//! a profile summary into role suggestions.
//!
//! Retry policy: a transient backend failure (timeout, connection error, 429, 5xx)
//! is retried once with the same request after a short backoff. A second failure,
//! a non-transient failure, or a reply that fails schema validation is returned
//! as `GenerationError`, which the Dialogue Engine treats as fatal for the session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::generation::prompts::{
    fill_template, questions_system, roles_system, QUESTIONS_PROMPT_TEMPLATE,
    ROLES_PROMPT_TEMPLATE,
};
use crate::generation::schema::{parse_question_set, parse_role_suggestions, SchemaError};
use crate::llm_client::{CompletionBackend, LlmClient, LlmError};
use crate::screening::limits::ScreeningLimits;
use crate::screening::models::{ProfileSummary, RoleSuggestions, TechnicalQuestionSet};

/// One initial attempt plus one retry.
const MAX_ATTEMPTS: u32 = 2;
const RETRY_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation backend still failing after {attempts} attempts: {source}")]
    RetriesExhausted { attempts: u32, source: LlmError },

    #[error("generation backend rejected the request: {0}")]
    Backend(#[source] LlmError),

    #[error("generation reply rejected: {0}")]
    InvalidReply(#[from] SchemaError),

    #[error("generation did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

/// The generation seam used by the Dialogue Engine.
///
/// Carried by the engine as `Arc<dyn ScreeningGenerator>`; the production
/// implementation is `GenerationClient<LlmClient>`.
#[async_trait]
pub trait ScreeningGenerator: Send + Sync {
    async fn generate_questions(
        &self,
        tech_stack: &[String],
    ) -> Result<TechnicalQuestionSet, GenerationError>;

    async fn generate_role_suggestions(
        &self,
        profile: &ProfileSummary,
    ) -> Result<RoleSuggestions, GenerationError>;
}

pub struct GenerationClient<B = LlmClient> {
    backend: B,
    limits: Arc<ScreeningLimits>,
    backoff: Duration,
}

impl<B: CompletionBackend> GenerationClient<B> {
    pub fn new(backend: B, limits: Arc<ScreeningLimits>) -> Self {
        Self {
            backend,
            limits,
            backoff: RETRY_BACKOFF,
        }
    }

    /// Sends the request, retrying once on a transient failure.
    async fn complete_with_retry(&self, prompt: &str, system: &str) -> Result<String, GenerationError> {
        let mut attempt = 1;
        loop {
            match self.backend.complete(prompt, system).await {
                Ok(text) => {
                    debug!("Generation attempt {attempt} succeeded");
                    return Ok(text);
                }
                Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                    warn!(
                        "Generation attempt {attempt} failed ({e}), retrying after {}ms...",
                        self.backoff.as_millis()
                    );
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    return Err(GenerationError::RetriesExhausted {
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => return Err(GenerationError::Backend(e)),
            }
        }
    }
}

#[async_trait]
impl<B: CompletionBackend> ScreeningGenerator for GenerationClient<B> {
    async fn generate_questions(
        &self,
        tech_stack: &[String],
    ) -> Result<TechnicalQuestionSet, GenerationError> {
        let requested: Vec<&str> = tech_stack
            .iter()
            .take(self.limits.question_technology_budget())
            .map(String::as_str)
            .collect();

        let prompt = fill_template(
            QUESTIONS_PROMPT_TEMPLATE,
            &[
                ("tech_stack", requested.join(", ").as_str()),
                ("min", self.limits.questions_per_tech.start().to_string().as_str()),
                ("max", self.limits.questions_per_tech.end().to_string().as_str()),
                ("total", self.limits.max_questions_total.to_string().as_str()),
            ],
        );

        let text = self.complete_with_retry(&prompt, &questions_system()).await?;
        Ok(parse_question_set(&text, tech_stack, &self.limits)?)
    }

    async fn generate_role_suggestions(
        &self,
        profile: &ProfileSummary,
    ) -> Result<RoleSuggestions, GenerationError> {
        let years = profile
            .years_experience
            .map(|y| y.to_string())
            .unwrap_or_else(|| "not given".to_string());
        let desired_roles = if profile.desired_roles.is_empty() {
            "not given".to_string()
        } else {
            profile.desired_roles.join(", ")
        };

        let prompt = fill_template(
            ROLES_PROMPT_TEMPLATE,
            &[
                ("count", self.limits.max_role_suggestions.to_string().as_str()),
                ("years", years.as_str()),
                ("desired_roles", desired_roles.as_str()),
                ("location", profile.location.as_deref().unwrap_or("not given")),
                ("tech_stack", profile.tech_stack.join(", ").as_str()),
            ],
        );

        let text = self.complete_with_retry(&prompt, &roles_system()).await?;
        Ok(parse_role_suggestions(&text, &self.limits)?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays scripted results and records every prompt it receives.
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }

    fn unavailable() -> LlmError {
        LlmError::Api {
            status: 503,
            message: "overloaded".to_string(),
        }
    }

    fn client(replies: Vec<Result<String, LlmError>>) -> GenerationClient<ScriptedBackend> {
        GenerationClient::new(
            ScriptedBackend::new(replies),
            Arc::new(ScreeningLimits::default()),
        )
    }

    const GO_QUESTIONS: &str = r#"{"technologies": [{"technology": "Go", "questions": ["a?", "b?", "c?"]}]}"#;

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_retried_once() {
        let client = client(vec![Err(unavailable()), Ok(GO_QUESTIONS.to_string())]);

        let set = client
            .generate_questions(&["Go".to_string()])
            .await
            .unwrap();

        assert_eq!(set.total(), 3);
        assert_eq!(client.backend.calls(), 2);
        let prompts = client.backend.prompts.lock().unwrap();
        assert_eq!(prompts[0], prompts[1], "retry must resend the same request");
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_transient_failures_exhaust_retries() {
        let client = client(vec![Err(unavailable()), Err(unavailable())]);

        let err = client
            .generate_questions(&["Go".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::RetriesExhausted { attempts: 2, .. }
        ));
        assert_eq!(client.backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_failure_not_retried() {
        let client = client(vec![
            Err(LlmError::Api {
                status: 401,
                message: "invalid x-api-key".to_string(),
            }),
            Ok(GO_QUESTIONS.to_string()),
        ]);

        let err = client
            .generate_questions(&["Go".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Backend(_)));
        assert_eq!(client.backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_reply_not_retried() {
        let client = client(vec![
            Ok(r#"{"technologies": [{"technology": "Java", "questions": ["a?", "b?", "c?"]}]}"#
                .to_string()),
        ]);

        let err = client
            .generate_questions(&["Go".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::InvalidReply(SchemaError::UnknownTechnology(_))
        ));
        assert_eq!(client.backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_questions_prompt_limits_technologies_and_carries_caps() {
        let client = client(vec![Ok(GO_QUESTIONS.to_string())]);
        let stack: Vec<String> = ["Go", "Rust", "SQL", "Kafka"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        client.generate_questions(&stack).await.unwrap();

        let prompts = client.backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("Go, Rust, SQL\n"));
        assert!(!prompts[0].contains("Kafka"));
        assert!(prompts[0].contains("between 3 and 5 questions"));
        assert!(prompts[0].contains("No more than 10 questions"));
    }

    #[tokio::test]
    async fn test_role_suggestions_prompt_uses_profile_summary() {
        let client = client(vec![Ok(
            r#"{"roles": [{"role": "Backend Developer", "companies": ["Stripe"]}]}"#.to_string(),
        )]);
        let summary = ProfileSummary {
            years_experience: Some(4.0),
            desired_roles: vec!["Backend Engineer".to_string()],
            location: Some("Berlin".to_string()),
            tech_stack: vec!["Go".to_string(), "Rust".to_string()],
        };

        let roles = client.generate_role_suggestions(&summary).await.unwrap();

        assert_eq!(roles.as_slice()[0].role_title, "Backend Developer");
        let prompts = client.backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("Years of experience: 4"));
        assert!(prompts[0].contains("Location: Berlin"));
        assert!(prompts[0].contains("Tech stack: Go, Rust"));
    }

    #[tokio::test]
    async fn test_candidate_text_with_placeholders_sent_verbatim() {
        let client = client(vec![Ok(
            r#"{"roles": [{"role": "Backend Developer", "companies": ["Stripe"]}]}"#.to_string(),
        )]);
        let summary = ProfileSummary {
            years_experience: Some(2.0),
            desired_roles: vec!["{location}".to_string()],
            location: Some("Berlin".to_string()),
            tech_stack: vec!["{total}".to_string(), "Go".to_string()],
        };

        client.generate_role_suggestions(&summary).await.unwrap();

        let prompts = client.backend.prompts.lock().unwrap();
        assert!(prompts[0].contains("Desired position(s): {location}"));
        assert!(prompts[0].contains("Tech stack: {total}, Go"));
    }
}
