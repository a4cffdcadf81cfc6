//! Report Assembler: builds the exportable record of one session.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::screening::models::{
    DialogueState, Lifecycle, RoleSuggestions, Sentiment, SessionState, Turn, TurnRole,
};

/// Accepted profile values. Fields that were never accepted are `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub years_experience: Option<f64>,
    pub desired_roles: Option<Vec<String>>,
    pub location: Option<String>,
    pub tech_stack: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question: String,
    /// `None` for questions the session never reached.
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredTechnology {
    pub technology: String,
    pub questions: Vec<AnsweredQuestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    /// Labels of the candidate turns in transcript order.
    pub sequence: Vec<Sentiment>,
}

impl SentimentSummary {
    fn from_transcript(transcript: &[Turn]) -> Self {
        let mut summary = Self::default();
        for sentiment in transcript.iter().filter_map(|t| t.sentiment) {
            match sentiment {
                Sentiment::Positive => summary.positive += 1,
                Sentiment::Neutral => summary.neutral += 1,
                Sentiment::Negative => summary.negative += 1,
            }
            summary.sequence.push(sentiment);
        }
        summary
    }
}

/// One interview, as handed to the session store and served by the report endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub session_id: Uuid,
    pub lifecycle: Lifecycle,
    pub final_state: DialogueState,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub profile: ProfileRecord,
    /// True when `email` and `phone` hold salted hashes instead of the raw values.
    pub contact_fields_hashed: bool,
    pub transcript: Vec<Turn>,
    pub technical_questions: Option<Vec<AnsweredTechnology>>,
    pub role_suggestions: Option<RoleSuggestions>,
    pub sentiment: SentimentSummary,
    pub failure: Option<String>,
}

/// Builds the record for any session, whatever state it is in.
pub fn assemble(session: &SessionState) -> ExportRecord {
    let profile = &session.profile;
    let mut answers = session.answers().iter();

    let technical_questions = session.questions().map(|set| {
        set.entries()
            .iter()
            .map(|entry| AnsweredTechnology {
                technology: entry.technology.clone(),
                questions: entry
                    .questions
                    .iter()
                    .map(|q| AnsweredQuestion {
                        question: q.clone(),
                        answer: answers.next().cloned(),
                    })
                    .collect(),
            })
            .collect()
    });

    ExportRecord {
        session_id: session.id,
        lifecycle: session.lifecycle(),
        final_state: session.state(),
        started_at: session.started_at(),
        ended_at: session.ended_at(),
        profile: ProfileRecord {
            full_name: profile.full_name.accepted().cloned(),
            email: profile.email.accepted().cloned(),
            phone: profile.phone.accepted().cloned(),
            years_experience: profile.years_experience.accepted().copied(),
            desired_roles: profile.desired_roles.accepted().cloned(),
            location: profile.location.accepted().cloned(),
            tech_stack: profile.tech_stack.accepted().cloned(),
        },
        contact_fields_hashed: false,
        transcript: session.transcript().to_vec(),
        technical_questions,
        role_suggestions: session.role_suggestions().cloned(),
        sentiment: SentimentSummary::from_transcript(session.transcript()),
        failure: session.failure().map(str::to_string),
    }
}

impl ExportRecord {
    /// Replaces email and phone with salted SHA-256 digests.
    ///
    /// The candidate turns that supplied them are redacted to the same digests.
    pub fn with_hashed_contacts(mut self, salt: &SecretString) -> Self {
        if self.contact_fields_hashed {
            return self;
        }
        let email = self.profile.email.take();
        let phone = self.profile.phone.take();

        for turn in self
            .transcript
            .iter_mut()
            .filter(|t| t.role == TurnRole::Candidate)
        {
            let text = turn.text.trim();
            let supplied = match (&email, &phone) {
                (Some(email), _) if text.eq_ignore_ascii_case(email) => Some(email),
                (_, Some(phone)) if is_same_phone(text, phone) => Some(phone),
                _ => None,
            };
            if let Some(value) = supplied {
                turn.text = salted_sha256(salt, value);
            }
        }

        self.profile.email = email.map(|e| salted_sha256(salt, &e));
        self.profile.phone = phone.map(|p| salted_sha256(salt, &p));
        self.contact_fields_hashed = true;
        self
    }
}

fn is_same_phone(text: &str, digits: &str) -> bool {
    !text.chars().any(char::is_alphabetic)
        && text.chars().filter(char::is_ascii_digit).eq(digits.chars())
}

/// Lowercase hex SHA-256 of `salt + value`.
pub fn salted_sha256(salt: &SecretString, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.expose_secret().as_bytes());
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}
