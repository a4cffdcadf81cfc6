//! Strict reply schemas for the generation backend.
//!
//! A reply is parsed into a private wire shape, checked against the
//! `TechnicalQuestionSet` / `RoleSuggestions` invariants, and only then turned
//! into the domain type. Anything that does not conform is a `SchemaError`.
//!
//! Two deterministic repairs are applied instead of rejection:
//! - questions beyond the global cap are truncated, keeping technology order and
//!   per-technology order; a technology left with fewer than the per-technology
//!   minimum is dropped entirely.
//! - role suggestions beyond the configured count are truncated.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::llm_client::strip_json_fences;
use crate::screening::limits::ScreeningLimits;
use crate::screening::models::{
    RoleSuggestion, RoleSuggestions, TechQuestions, TechnicalQuestionSet,
};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("reply is not valid JSON for the expected schema: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("reply contains no questions")]
    NoQuestions,

    #[error("reply contains technology '{0}' which is not in the candidate's tech stack")]
    UnknownTechnology(String),

    #[error("reply lists technology '{0}' more than once")]
    DuplicateTechnology(String),

    #[error("technology '{technology}' has {found} questions, expected {min} to {max}")]
    QuestionCount {
        technology: String,
        found: usize,
        min: usize,
        max: usize,
    },

    #[error("technology '{0}' has a blank question")]
    BlankQuestion(String),

    #[error("reply contains no role suggestions")]
    NoRoles,

    #[error("reply contains a role suggestion without a title")]
    BlankRoleTitle,

    #[error("role '{0}' has no example companies")]
    NoCompanies(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuestionsReply {
    technologies: Vec<TechnologyReply>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TechnologyReply {
    technology: String,
    questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RolesReply {
    roles: Vec<RoleReply>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RoleReply {
    role: String,
    companies: Vec<String>,
}

/// Parses and validates a question reply against the accepted `tech_stack`.
///
/// Technology names are matched case-insensitively and stored with the
/// candidate's spelling.
pub fn parse_question_set(
    text: &str,
    tech_stack: &[String],
    limits: &ScreeningLimits,
) -> Result<TechnicalQuestionSet, SchemaError> {
    let reply: QuestionsReply = serde_json::from_str(strip_json_fences(text))?;

    let min = *limits.questions_per_tech.start();
    let max = *limits.questions_per_tech.end();
    let mut seen = HashSet::new();
    let mut validated = Vec::with_capacity(reply.technologies.len());

    for entry in reply.technologies {
        let name = entry.technology.trim();
        let lowered = name.to_lowercase();
        let canonical = tech_stack
            .iter()
            .find(|t| t.to_lowercase() == lowered)
            .ok_or_else(|| SchemaError::UnknownTechnology(name.to_string()))?;

        if !seen.insert(canonical.to_lowercase()) {
            return Err(SchemaError::DuplicateTechnology(canonical.clone()));
        }

        let questions: Vec<String> = entry
            .questions
            .iter()
            .map(|q| q.trim().to_string())
            .collect();
        if questions.iter().any(String::is_empty) {
            return Err(SchemaError::BlankQuestion(canonical.clone()));
        }
        if !limits.questions_per_tech.contains(&questions.len()) {
            return Err(SchemaError::QuestionCount {
                technology: canonical.clone(),
                found: questions.len(),
                min,
                max,
            });
        }

        validated.push(TechQuestions {
            technology: canonical.clone(),
            questions,
        });
    }

    let entries = truncate_to_cap(validated, limits.max_questions_total, min);
    if entries.is_empty() {
        return Err(SchemaError::NoQuestions);
    }
    Ok(TechnicalQuestionSet::new(entries))
}

/// Parses and validates a role suggestion reply.
pub fn parse_role_suggestions(
    text: &str,
    limits: &ScreeningLimits,
) -> Result<RoleSuggestions, SchemaError> {
    let reply: RolesReply = serde_json::from_str(strip_json_fences(text))?;
    if reply.roles.is_empty() {
        return Err(SchemaError::NoRoles);
    }

    let mut roles = Vec::with_capacity(reply.roles.len());
    for role in reply.roles.into_iter().take(limits.max_role_suggestions) {
        let title = role.role.trim();
        if title.is_empty() {
            return Err(SchemaError::BlankRoleTitle);
        }
        let companies: Vec<String> = role
            .companies
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        if companies.is_empty() {
            return Err(SchemaError::NoCompanies(title.to_string()));
        }
        roles.push(RoleSuggestion {
            role_title: title.to_string(),
            example_companies: companies,
        });
    }

    Ok(RoleSuggestions::new(roles))
}

fn truncate_to_cap(entries: Vec<TechQuestions>, cap: usize, min: usize) -> Vec<TechQuestions> {
    let mut budget = cap;
    let mut kept = Vec::with_capacity(entries.len());
    for mut entry in entries {
        if budget < min {
            break;
        }
        entry.questions.truncate(budget);
        budget -= entry.questions.len();
        kept.push(entry);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn questions_json(entries: &[(&str, usize)]) -> String {
        let technologies: Vec<serde_json::Value> = entries
            .iter()
            .map(|(tech, n)| {
                let qs: Vec<String> = (1..=*n).map(|i| format!("{tech} question {i}?")).collect();
                serde_json::json!({ "technology": tech, "questions": qs })
            })
            .collect();
        serde_json::json!({ "technologies": technologies }).to_string()
    }

    #[test]
    fn test_four_and_four_accepted_as_is() {
        let text = questions_json(&[("Python", 4), ("Go", 4)]);
        let set = parse_question_set(&text, &stack(&["Python", "Go"]), &ScreeningLimits::default())
            .unwrap();
        assert_eq!(set.total(), 8);
        assert_eq!(set.entries()[0].technology, "Python");
        assert_eq!(set.entries()[0].questions.len(), 4);
        assert_eq!(set.entries()[1].technology, "Go");
        assert_eq!(set.entries()[1].questions.len(), 4);
    }

    #[test]
    fn test_fenced_reply_accepted() {
        let text = format!("```json\n{}\n```", questions_json(&[("Rust", 3)]));
        let set = parse_question_set(&text, &stack(&["Rust"]), &ScreeningLimits::default()).unwrap();
        assert_eq!(set.total(), 3);
    }

    #[test]
    fn test_technology_spelling_follows_stack() {
        let text = questions_json(&[("python", 3)]);
        let set = parse_question_set(&text, &stack(&["Python"]), &ScreeningLimits::default())
            .unwrap();
        assert_eq!(set.entries()[0].technology, "Python");
    }

    #[test]
    fn test_unknown_technology_rejected() {
        let text = questions_json(&[("Python", 3), ("Java", 3)]);
        let err = parse_question_set(&text, &stack(&["Python"]), &ScreeningLimits::default())
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTechnology(t) if t == "Java"));
    }

    #[test]
    fn test_duplicate_technology_rejected() {
        let text = questions_json(&[("Go", 3), ("go", 3)]);
        let err =
            parse_question_set(&text, &stack(&["Go"]), &ScreeningLimits::default()).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateTechnology(_)));
    }

    #[test]
    fn test_per_technology_range_enforced() {
        let limits = ScreeningLimits::default();
        let too_few = questions_json(&[("Go", 2)]);
        let too_many = questions_json(&[("Go", 6)]);
        let empty = questions_json(&[("Go", 0)]);

        for text in [too_few, too_many, empty] {
            let err = parse_question_set(&text, &stack(&["Go"]), &limits).unwrap_err();
            assert!(matches!(err, SchemaError::QuestionCount { .. }));
        }
    }

    #[test]
    fn test_blank_question_rejected() {
        let text = r#"{"technologies": [{"technology": "Go", "questions": ["a?", "  ", "c?"]}]}"#;
        let err =
            parse_question_set(text, &stack(&["Go"]), &ScreeningLimits::default()).unwrap_err();
        assert!(matches!(err, SchemaError::BlankQuestion(_)));
    }

    #[test]
    fn test_empty_reply_rejected() {
        let err = parse_question_set(
            r#"{"technologies": []}"#,
            &stack(&["Go"]),
            &ScreeningLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::NoQuestions));
    }

    #[test]
    fn test_unexpected_shape_rejected() {
        let limits = ScreeningLimits::default();
        let stack = stack(&["Go"]);
        assert!(matches!(
            parse_question_set(r#"{"questions": ["a", "b"]}"#, &stack, &limits),
            Err(SchemaError::Malformed(_))
        ));
        assert!(matches!(
            parse_question_set("Sure! Here are some questions:", &stack, &limits),
            Err(SchemaError::Malformed(_))
        ));
    }

    #[test]
    fn test_total_over_cap_truncated_in_order() {
        let text = questions_json(&[("Python", 5), ("Go", 4), ("Rust", 3)]);
        let set = parse_question_set(
            &text,
            &stack(&["Python", "Go", "Rust"]),
            &ScreeningLimits::default(),
        )
        .unwrap();

        // 5 + 4 fit, leaving 1 which is below the per-technology minimum
        assert_eq!(set.total(), 9);
        assert_eq!(set.entries().len(), 2);
        assert_eq!(set.entries()[1].questions[3], "Go question 4?");
    }

    #[test]
    fn test_truncation_shortens_last_technology_when_budget_allows() {
        let text = questions_json(&[("Python", 5), ("Go", 5), ("Rust", 5)]);
        let limits = ScreeningLimits {
            max_questions_total: 13,
            ..ScreeningLimits::default()
        };
        let set =
            parse_question_set(&text, &stack(&["Python", "Go", "Rust"]), &limits).unwrap();
        assert_eq!(set.total(), 13);
        assert_eq!(set.entries()[2].questions.len(), 3);
        assert_eq!(set.entries()[2].questions[2], "Rust question 3?");
    }

    #[test]
    fn test_invariants_hold_for_accepted_sets() {
        let limits = ScreeningLimits::default();
        let stack = stack(&["Python", "Go", "Rust", "SQL"]);
        let text = questions_json(&[("Python", 3), ("Go", 5), ("SQL", 4), ("Rust", 3)]);
        let set = parse_question_set(&text, &stack, &limits).unwrap();

        assert!(set.total() <= limits.max_questions_total);
        for entry in set.entries() {
            assert!(stack.contains(&entry.technology));
            assert!(limits.questions_per_tech.contains(&entry.questions.len()));
        }
    }

    #[test]
    fn test_roles_parsed_and_trimmed() {
        let text = r#"{"roles": [
            {"role": " Backend Developer ", "companies": ["Google", " ", "Amazon"]},
            {"role": "SRE", "companies": ["Netflix"]}
        ]}"#;
        let roles = parse_role_suggestions(text, &ScreeningLimits::default()).unwrap();
        assert_eq!(roles.as_slice().len(), 2);
        assert_eq!(roles.as_slice()[0].role_title, "Backend Developer");
        assert_eq!(roles.as_slice()[0].example_companies, vec!["Google", "Amazon"]);
    }

    #[test]
    fn test_roles_truncated_to_limit() {
        let roles: Vec<serde_json::Value> = (0..8)
            .map(|i| serde_json::json!({"role": format!("Role {i}"), "companies": ["Acme"]}))
            .collect();
        let text = serde_json::json!({ "roles": roles }).to_string();
        let parsed = parse_role_suggestions(&text, &ScreeningLimits::default()).unwrap();
        assert_eq!(parsed.as_slice().len(), 5);
        assert_eq!(parsed.as_slice()[4].role_title, "Role 4");
    }

    #[test]
    fn test_roles_invalid_replies_rejected() {
        let limits = ScreeningLimits::default();
        assert!(matches!(
            parse_role_suggestions(r#"{"roles": []}"#, &limits),
            Err(SchemaError::NoRoles)
        ));
        assert!(matches!(
            parse_role_suggestions(r#"{"roles": [{"role": "", "companies": ["A"]}]}"#, &limits),
            Err(SchemaError::BlankRoleTitle)
        ));
        assert!(matches!(
            parse_role_suggestions(r#"{"roles": [{"role": "SRE", "companies": []}]}"#, &limits),
            Err(SchemaError::NoCompanies(_))
        ));
    }
}
