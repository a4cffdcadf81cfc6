// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, RECRUITER_PERSONA};

/// System prompt for technical question generation.
pub fn questions_system() -> String {
    format!(
        "{RECRUITER_PERSONA} You write concise technical screening questions \
        that probe practical, hands-on experience. {JSON_ONLY_SYSTEM}"
    )
}

/// System prompt for role and company suggestions.
pub fn roles_system() -> String {
    format!(
        "{RECRUITER_PERSONA} You match candidate backgrounds to realistic job roles \
        and well-known companies that hire for them. {JSON_ONLY_SYSTEM}"
    )
}

/// Substitutes `{key}` placeholders in one pass over `template`.
///
/// Inserted values are never scanned again, so candidate text containing
/// `{total}` or `{location}` is sent verbatim. Unknown placeholders are kept.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let value = tail.find('}').and_then(|close| {
            let key = &tail[1..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Question prompt template. Fill `{tech_stack}`, `{min}`, `{max}` and `{total}` before sending.
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Generate technical interview questions for a candidate whose tech stack is:
{tech_stack}

Return a JSON object with this EXACT schema (no extra fields):
{
  "technologies": [
    {
      "technology": "Python",
      "questions": [
        "Explain the difference between a list and a tuple.",
        "How does the GIL affect multithreaded code?",
        "When would you reach for a generator instead of a list?"
      ]
    }
  ]
}

Rules:
- Use ONLY technologies from the list above, spelled exactly as listed.
- Each technology gets between {min} and {max} questions.
- No more than {total} questions in total across all technologies.
- Keep technologies in the order they are listed.
- Each question is a single sentence; no numbering, no answers."#;

/// Role suggestion prompt template.
/// Fill `{years}`, `{desired_roles}`, `{location}`, `{tech_stack}` and `{count}` before sending.
pub const ROLES_PROMPT_TEMPLATE: &str = r#"Suggest up to {count} job roles for this candidate:
- Years of experience: {years}
- Desired position(s): {desired_roles}
- Location: {location}
- Tech stack: {tech_stack}

Return a JSON object with this EXACT schema (no extra fields):
{
  "roles": [
    {
      "role": "Backend Developer",
      "companies": ["Google", "Amazon", "Netflix"]
    }
  ]
}

Rules:
- Each role has a short title and two to four example companies that typically hire for it.
- Prefer roles that fit the candidate's desired positions and tech stack."#;
