//! Test doubles shared by the screening, service and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::generation::{GenerationError, ScreeningGenerator};
use crate::llm_client::LlmError;
use crate::screening::models::{
    ProfileSummary, RoleSuggestion, RoleSuggestions, TechQuestions, TechnicalQuestionSet,
};

/// Answers every profile collection prompt with a valid value.
pub const VALID_PROFILE_INPUTS: &[&str] = &[
    "Ada Lovelace",
    "ada@example.com",
    "+44 20 7946 0958",
    "5",
    "Backend Engineer",
    "London",
    "Python, python, Go",
];

/// Deterministic in-process generator: three questions for each of the first
/// two technologies and a single role suggestion.
#[derive(Default)]
pub struct FakeGenerator {
    pub fail_questions: bool,
    pub fail_roles: bool,
    /// When set, every call waits for a notification before answering.
    pub gate: Option<Arc<Notify>>,
    pub question_calls: AtomicUsize,
    pub role_calls: AtomicUsize,
    pub last_stack: std::sync::Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_questions() -> Self {
        Self {
            fail_questions: true,
            ..Self::default()
        }
    }

    pub fn failing_roles() -> Self {
        Self {
            fail_roles: true,
            ..Self::default()
        }
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

pub fn rejected() -> GenerationError {
    GenerationError::Backend(LlmError::Api {
        status: 400,
        message: "bad request".to_string(),
    })
}

pub fn question_set(stack: &[String]) -> TechnicalQuestionSet {
    TechnicalQuestionSet::new(
        stack
            .iter()
            .take(2)
            .map(|tech| TechQuestions {
                technology: tech.clone(),
                questions: (1..=3).map(|i| format!("{tech} question {i}?")).collect(),
            })
            .collect(),
    )
}

#[async_trait]
impl ScreeningGenerator for FakeGenerator {
    async fn generate_questions(
        &self,
        tech_stack: &[String],
    ) -> Result<TechnicalQuestionSet, GenerationError> {
        self.question_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_stack.lock().unwrap() = tech_stack.to_vec();
        self.wait_for_gate().await;
        if self.fail_questions {
            return Err(rejected());
        }
        Ok(question_set(tech_stack))
    }

    async fn generate_role_suggestions(
        &self,
        _profile: &ProfileSummary,
    ) -> Result<RoleSuggestions, GenerationError> {
        self.role_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        if self.fail_roles {
            return Err(rejected());
        }
        Ok(RoleSuggestions::new(vec![RoleSuggestion {
            role_title: "Backend Developer".to_string(),
            example_companies: vec!["Stripe".to_string(), "Shopify".to_string()],
        }]))
    }
}
