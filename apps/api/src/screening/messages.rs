// Candidate-facing message texts for the screening dialogue.

use crate::screening::models::{ProfileField, RoleSuggestions};
use crate::screening::validation::ValidationError;

pub const GREETING: &str = "Hello! I'm TalentScout, your professional hiring assistant. \
    I'll guide you through our initial screening by gathering a few details and asking \
    some technical questions tailored to your skills. You can type 'exit' at any time to leave. \
    Let's begin: what's your full name?";

pub const QUESTIONS_UNAVAILABLE: &str = "I'm sorry, I wasn't able to prepare your technical \
    questions right now, so we'll have to stop here. Everything you've shared so far has been \
    saved and our team will be in touch.";

pub const ROLES_UNAVAILABLE: &str = "I'm sorry, I ran into a problem while wrapping up your \
    screening. Your answers have been saved and our team will be in touch.";

pub const FAREWELL: &str = "Thanks for your time! The screening has ended. \
    Whatever you've shared so far has been saved. Goodbye!";

pub const STILL_PREPARING: &str = "I'm still preparing the next step, one moment please. \
    (You can type 'exit' to leave.)";

pub const SESSION_CLOSED: &str = "This screening session has already ended. \
    Please start a new session to continue.";

/// The question asked when entering a `COLLECT_*` state.
pub fn prompt_for(field: ProfileField) -> &'static str {
    match field {
        ProfileField::FullName => "What's your full name?",
        ProfileField::Email => "What's your email address?",
        ProfileField::Phone => "What's your phone number?",
        ProfileField::YearsExperience => "How many years of professional experience do you have?",
        ProfileField::DesiredRoles => "What position(s) are you interested in? Separate several with commas.",
        ProfileField::Location => "Where are you currently located?",
        ProfileField::TechStack => {
            "Please list your tech stack: languages, frameworks, databases and tools, separated by commas."
        }
    }
}

/// Acknowledges an accepted field and asks for the next one.
pub fn accepted_then(next: ProfileField, name: Option<&str>) -> String {
    match (next, name) {
        (ProfileField::Email, Some(name)) => format!("Nice to meet you, {name}! {}", prompt_for(next)),
        _ => format!("Thank you! {}", prompt_for(next)),
    }
}

/// Re-prompt after a rejected value, echoing the violated constraint.
pub fn corrective(error: &ValidationError) -> String {
    format!("{error} {}", prompt_for(error.field()))
}

pub fn questions_intro(total: usize) -> String {
    format!(
        "Excellent! I've prepared {total} technical question{} based on your tech stack. \
        Please answer each one in your own words.",
        if total == 1 { "" } else { "s" }
    )
}

pub fn question(index: usize, total: usize, technology: &str, text: &str) -> String {
    format!("Question {} of {total} ({technology}): {text}", index + 1)
}

pub fn role_suggestions(roles: &RoleSuggestions) -> String {
    let mut message = String::from(
        "Based on your background, here are some positions and companies that might interest you:",
    );
    for role in roles.as_slice() {
        message.push_str(&format!(
            "\n• {}: {}",
            role.role_title,
            role.example_companies.join(", ")
        ));
    }
    message
}

pub fn closing(name: Option<&str>) -> String {
    let who = name.map(|n| format!(", {n}")).unwrap_or_default();
    format!(
        "Thank you{who}! Your screening is complete. Our team will review your responses \
        and get back to you shortly. We appreciate your time and interest!"
    )
}
