use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::screening::limits::ScreeningLimits;
use crate::screening::validation::{self, ValidationError};

// ────────────────────────────────────────────────────────────────────────────
// Slot model
// ────────────────────────────────────────────────────────────────────────────

/// One required field of the candidate profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    FullName,
    Email,
    Phone,
    YearsExperience,
    DesiredRoles,
    Location,
    TechStack,
}

impl ProfileField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileField::FullName => "full_name",
            ProfileField::Email => "email",
            ProfileField::Phone => "phone",
            ProfileField::YearsExperience => "years_experience",
            ProfileField::DesiredRoles => "desired_roles",
            ProfileField::Location => "location",
            ProfileField::TechStack => "tech_stack",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProfileField::FullName => "full name",
            ProfileField::Email => "email address",
            ProfileField::Phone => "phone number",
            ProfileField::YearsExperience => "years of experience",
            ProfileField::DesiredRoles => "desired position",
            ProfileField::Location => "location",
            ProfileField::TechStack => "tech stack",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStatus {
    #[default]
    Unset,
    PendingValidation,
    Accepted,
}

/// A profile value plus its fill status. The value is only ever populated
/// together with `FillStatus::Accepted`.
///
/// `PendingValidation` only exists for the duration of `submit`: the slot
/// leaves it before the call returns, so readers observe `Unset` or `Accepted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot<T> {
    value: Option<T>,
    status: FillStatus,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            status: FillStatus::Unset,
        }
    }
}

impl<T> Slot<T> {
    pub fn status(&self) -> FillStatus {
        self.status
    }

    pub fn accepted(&self) -> Option<&T> {
        match self.status {
            FillStatus::Accepted => self.value.as_ref(),
            _ => None,
        }
    }

    fn mark_pending(&mut self) {
        if self.status != FillStatus::Accepted {
            self.status = FillStatus::PendingValidation;
        }
    }

    fn accept(&mut self, value: T) {
        self.value = Some(value);
        self.status = FillStatus::Accepted;
    }

    fn reset(&mut self) {
        if self.status != FillStatus::Accepted {
            self.value = None;
            self.status = FillStatus::Unset;
        }
    }

    /// Runs `validate` with the slot held in `PendingValidation`, then either
    /// accepts the value or returns the slot to `Unset`.
    fn submit<F>(&mut self, validate: F) -> Result<T, ValidationError>
    where
        T: Clone,
        F: FnOnce() -> Result<T, ValidationError>,
    {
        self.mark_pending();
        match validate() {
            Ok(value) => {
                self.accept(value.clone());
                Ok(value)
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }
}

/// A value that passed its validator, as stored in the profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AcceptedValue {
    Text(String),
    Number(f64),
    List(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub full_name: Slot<String>,
    pub email: Slot<String>,
    pub phone: Slot<String>,
    pub years_experience: Slot<f64>,
    pub desired_roles: Slot<Vec<String>>,
    pub location: Slot<String>,
    pub tech_stack: Slot<Vec<String>>,
}

impl CandidateProfile {
    /// Validates `raw_text` for `field` and stores it on success.
    ///
    /// A rejected submission leaves the field unset; an already accepted field keeps its value.
    pub fn submit(
        &mut self,
        field: ProfileField,
        raw_text: &str,
        limits: &ScreeningLimits,
    ) -> Result<AcceptedValue, ValidationError> {
        match field {
            ProfileField::FullName => self
                .full_name
                .submit(|| validation::validate_name(raw_text))
                .map(AcceptedValue::Text),
            ProfileField::Email => self
                .email
                .submit(|| validation::validate_email(raw_text))
                .map(AcceptedValue::Text),
            ProfileField::Phone => self
                .phone
                .submit(|| validation::validate_phone(raw_text, &limits.phone_digits))
                .map(AcceptedValue::Text),
            ProfileField::YearsExperience => self
                .years_experience
                .submit(|| validation::validate_experience(raw_text))
                .map(AcceptedValue::Number),
            ProfileField::DesiredRoles => self
                .desired_roles
                .submit(|| validation::validate_desired_roles(raw_text))
                .map(AcceptedValue::List),
            ProfileField::Location => self
                .location
                .submit(|| validation::validate_location(raw_text))
                .map(AcceptedValue::Text),
            ProfileField::TechStack => self
                .tech_stack
                .submit(|| validation::validate_tech_stack(raw_text, limits.max_tech_stack_size))
                .map(AcceptedValue::List),
        }
    }

    pub fn status(&self, field: ProfileField) -> FillStatus {
        match field {
            ProfileField::FullName => self.full_name.status(),
            ProfileField::Email => self.email.status(),
            ProfileField::Phone => self.phone.status(),
            ProfileField::YearsExperience => self.years_experience.status(),
            ProfileField::DesiredRoles => self.desired_roles.status(),
            ProfileField::Location => self.location.status(),
            ProfileField::TechStack => self.tech_stack.status(),
        }
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            years_experience: self.years_experience.accepted().copied(),
            desired_roles: self.desired_roles.accepted().cloned().unwrap_or_default(),
            location: self.location.accepted().cloned(),
            tech_stack: self.tech_stack.accepted().cloned().unwrap_or_default(),
        }
    }
}

/// The slice of the profile sent to the backend for role suggestions.
/// Contact details never leave the process.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub years_experience: Option<f64>,
    pub desired_roles: Vec<String>,
    pub location: Option<String>,
    pub tech_stack: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Transcript
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    System,
    Candidate,
}

/// One message of the conversation. `sentiment` is only set on candidate turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

impl Turn {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::System,
            text: text.into(),
            timestamp: Utc::now(),
            sentiment: None,
        }
    }

    pub fn candidate(text: impl Into<String>, sentiment: Sentiment) -> Self {
        Self {
            role: TurnRole::Candidate,
            text: text.into(),
            timestamp: Utc::now(),
            sentiment: Some(sentiment),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generated artifacts
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechQuestions {
    pub technology: String,
    pub questions: Vec<String>,
}

/// Questions per technology, in presentation order.
///
/// Only constructed by the reply schema validator, so every instance already
/// satisfies the per-technology range, the global cap and stack membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechnicalQuestionSet {
    entries: Vec<TechQuestions>,
}

impl TechnicalQuestionSet {
    pub(crate) fn new(entries: Vec<TechQuestions>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[TechQuestions] {
        &self.entries
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.questions.len()).sum()
    }

    /// `(technology, question)` pairs flattened in presentation order.
    pub fn flattened(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|e| {
            e.questions
                .iter()
                .map(move |q| (e.technology.as_str(), q.as_str()))
        })
    }

    pub fn question(&self, index: usize) -> Option<(&str, &str)> {
        self.flattened().nth(index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSuggestion {
    pub role_title: String,
    pub example_companies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSuggestions(Vec<RoleSuggestion>);

impl RoleSuggestions {
    pub(crate) fn new(roles: Vec<RoleSuggestion>) -> Self {
        Self(roles)
    }

    pub fn as_slice(&self) -> &[RoleSuggestion] {
        &self.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

/// Dialogue Engine states, in the order a successful interview visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DialogueState {
    Greeting,
    CollectName,
    CollectEmail,
    CollectPhone,
    CollectExperience,
    CollectRoles,
    CollectLocation,
    CollectTechStack,
    GenerateQuestions,
    AskTechQuestions,
    GenerateRoleSuggestions,
    Closing,
    Completed,
    Abandoned,
    ErrorTerminated,
}

impl DialogueState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DialogueState::Completed | DialogueState::Abandoned | DialogueState::ErrorTerminated
        )
    }

    /// True while a generation call owns the next transition.
    pub fn is_generating(&self) -> bool {
        matches!(
            self,
            DialogueState::GenerateQuestions | DialogueState::GenerateRoleSuggestions
        )
    }

    /// The profile field a `COLLECT_*` state is waiting for.
    pub fn collecting(&self) -> Option<ProfileField> {
        match self {
            DialogueState::CollectName => Some(ProfileField::FullName),
            DialogueState::CollectEmail => Some(ProfileField::Email),
            DialogueState::CollectPhone => Some(ProfileField::Phone),
            DialogueState::CollectExperience => Some(ProfileField::YearsExperience),
            DialogueState::CollectRoles => Some(ProfileField::DesiredRoles),
            DialogueState::CollectLocation => Some(ProfileField::Location),
            DialogueState::CollectTechStack => Some(ProfileField::TechStack),
            _ => None,
        }
    }

    /// Successor on the happy path. Terminal states map to themselves.
    pub fn next(&self) -> DialogueState {
        match self {
            DialogueState::Greeting => DialogueState::CollectName,
            DialogueState::CollectName => DialogueState::CollectEmail,
            DialogueState::CollectEmail => DialogueState::CollectPhone,
            DialogueState::CollectPhone => DialogueState::CollectExperience,
            DialogueState::CollectExperience => DialogueState::CollectRoles,
            DialogueState::CollectRoles => DialogueState::CollectLocation,
            DialogueState::CollectLocation => DialogueState::CollectTechStack,
            DialogueState::CollectTechStack => DialogueState::GenerateQuestions,
            DialogueState::GenerateQuestions => DialogueState::AskTechQuestions,
            DialogueState::AskTechQuestions => DialogueState::GenerateRoleSuggestions,
            DialogueState::GenerateRoleSuggestions => DialogueState::Closing,
            DialogueState::Closing => DialogueState::Completed,
            terminal => *terminal,
        }
    }
}

/// Terminal classification of a session, or `InProgress` before it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    InProgress,
    Completed,
    Abandoned,
    Error,
}

impl Lifecycle {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Lifecycle::InProgress)
    }
}

impl From<DialogueState> for Lifecycle {
    fn from(state: DialogueState) -> Self {
        match state {
            DialogueState::Completed => Lifecycle::Completed,
            DialogueState::Abandoned => Lifecycle::Abandoned,
            DialogueState::ErrorTerminated => Lifecycle::Error,
            _ => Lifecycle::InProgress,
        }
    }
}

/// Everything known about one candidate's interview.
///
/// Owned by exactly one engine call at a time; the transcript is append-only.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub id: Uuid,
    pub profile: CandidateProfile,
    pub(crate) transcript: Vec<Turn>,
    pub(crate) questions: Option<TechnicalQuestionSet>,
    /// Answers in flattened question order; its length is the question cursor.
    pub(crate) answers: Vec<String>,
    pub(crate) role_suggestions: Option<RoleSuggestions>,
    pub(crate) state: DialogueState,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) ended_at: Option<DateTime<Utc>>,
    pub(crate) failure: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            profile: CandidateProfile::default(),
            transcript: Vec::new(),
            questions: None,
            answers: Vec::new(),
            role_suggestions: None,
            state: DialogueState::Greeting,
            started_at: Utc::now(),
            ended_at: None,
            failure: None,
        }
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.into()
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn questions(&self) -> Option<&TechnicalQuestionSet> {
        self.questions.as_ref()
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn role_suggestions(&self) -> Option<&RoleSuggestions> {
        self.role_suggestions.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// The question awaiting an answer, if any.
    pub fn current_question(&self) -> Option<(&str, &str)> {
        self.questions.as_ref()?.question(self.answers.len())
    }

    pub(crate) fn push_turn(&mut self, turn: Turn) {
        self.transcript.push(turn);
    }

    /// Installs the question set once; later calls are ignored.
    pub(crate) fn install_questions(&mut self, questions: TechnicalQuestionSet) -> bool {
        if self.questions.is_some() {
            return false;
        }
        self.questions = Some(questions);
        true
    }

    /// Installs the role suggestions once; later calls are ignored.
    pub(crate) fn install_role_suggestions(&mut self, roles: RoleSuggestions) -> bool {
        if self.role_suggestions.is_some() {
            return false;
        }
        self.role_suggestions = Some(roles);
        true
    }
}
