//! Field validators: pure functions returning the normalized value to store.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::screening::models::ProfileField;

/// Conservative `local@domain.tld` shape. Whitespace and extra `@` never match.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern is valid")
});

/// Characters tolerated between phone digits.
const PHONE_SEPARATORS: &[char] = &[' ', '-', '(', ')', '.', '+'];

/// Separators for list-valued fields (tech stack, desired roles).
const LIST_SEPARATORS: &[char] = &[',', ';', '\n'];

/// Unit words tolerated after the years-of-experience number.
const EXPERIENCE_UNITS: &[&str] = &["years", "year", "yrs", "yr"];

/// A rejected field value. The message names the violated constraint and is
/// echoed back to the candidate in the re-prompt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Your {field} cannot be empty.")]
    Empty { field: ProfileField },

    #[error("An email address must contain exactly one '@'.")]
    MultipleAt,

    #[error("An email address must look like name@domain.tld.")]
    MalformedEmail,

    #[error("A phone number may only contain digits, spaces, dashes, dots, parentheses and a leading '+'.")]
    PhoneCharacters,

    #[error("A phone number must have between {min} and {max} digits; I counted {found}.")]
    PhoneLength { min: usize, max: usize, found: usize },

    #[error("Years of experience must be a number, for example 3 or 4.5.")]
    NotANumber,

    #[error("Years of experience cannot be negative.")]
    NegativeExperience,

    #[error("Please list at least one technology.")]
    EmptyTechStack,

    #[error("Please list at most {max} distinct technologies; you listed {found}.")]
    TechStackTooLarge { max: usize, found: usize },
}

impl ValidationError {
    pub fn field(&self) -> ProfileField {
        match self {
            ValidationError::Empty { field } => *field,
            ValidationError::MultipleAt | ValidationError::MalformedEmail => ProfileField::Email,
            ValidationError::PhoneCharacters | ValidationError::PhoneLength { .. } => {
                ProfileField::Phone
            }
            ValidationError::NotANumber | ValidationError::NegativeExperience => {
                ProfileField::YearsExperience
            }
            ValidationError::EmptyTechStack | ValidationError::TechStackTooLarge { .. } => {
                ProfileField::TechStack
            }
        }
    }
}

pub fn validate_name(raw: &str) -> Result<String, ValidationError> {
    non_empty(ProfileField::FullName, raw)
}

pub fn validate_location(raw: &str) -> Result<String, ValidationError> {
    non_empty(ProfileField::Location, raw)
}

/// Accepts `local@domain.tld`; the stored value is trimmed and lowercased.
pub fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(ValidationError::Empty {
            field: ProfileField::Email,
        });
    }
    if email.matches('@').count() > 1 {
        return Err(ValidationError::MultipleAt);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::MalformedEmail);
    }
    Ok(email.to_lowercase())
}

/// Strips separators and checks the digit count; the stored value is digits only.
pub fn validate_phone(raw: &str, digits: &RangeInclusive<usize>) -> Result<String, ValidationError> {
    let phone = raw.trim();
    if phone.is_empty() {
        return Err(ValidationError::Empty {
            field: ProfileField::Phone,
        });
    }

    let mut normalized = String::with_capacity(phone.len());
    for (i, c) in phone.char_indices() {
        if c.is_ascii_digit() {
            normalized.push(c);
        } else if c == '+' && i != 0 {
            return Err(ValidationError::PhoneCharacters);
        } else if !PHONE_SEPARATORS.contains(&c) {
            return Err(ValidationError::PhoneCharacters);
        }
    }

    if !digits.contains(&normalized.len()) {
        return Err(ValidationError::PhoneLength {
            min: *digits.start(),
            max: *digits.end(),
            found: normalized.len(),
        });
    }
    Ok(normalized)
}

/// Non-negative integer or decimal, optionally followed by a unit word ("5 years").
pub fn validate_experience(raw: &str) -> Result<f64, ValidationError> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return Err(ValidationError::Empty {
            field: ProfileField::YearsExperience,
        });
    }

    let number = EXPERIENCE_UNITS
        .iter()
        .find_map(|unit| lowered.strip_suffix(unit))
        .unwrap_or(&lowered)
        .trim();

    // `f64::from_str` also accepts "inf" and "NaN"; only plain numerals count.
    if number.is_empty()
        || !number
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
    {
        return Err(ValidationError::NotANumber);
    }
    let years: f64 = number.parse().map_err(|_| ValidationError::NotANumber)?;
    // a long enough digit run parses to infinity
    if !years.is_finite() {
        return Err(ValidationError::NotANumber);
    }
    if years < 0.0 {
        return Err(ValidationError::NegativeExperience);
    }
    // normalizes -0.0
    Ok(years + 0.0)
}

/// Free-text positions, split on the list separators, order preserved.
pub fn validate_desired_roles(raw: &str) -> Result<Vec<String>, ValidationError> {
    let roles: Vec<String> = split_list(raw).map(str::to_string).collect();
    if roles.is_empty() {
        return Err(ValidationError::Empty {
            field: ProfileField::DesiredRoles,
        });
    }
    Ok(roles)
}

/// Splits, trims and dedupes case-insensitively, keeping the first spelling
/// and the candidate's order.
pub fn validate_tech_stack(raw: &str, max: usize) -> Result<Vec<String>, ValidationError> {
    let mut seen = HashSet::new();
    let stack: Vec<String> = split_list(raw)
        .filter(|tech| seen.insert(tech.to_lowercase()))
        .map(str::to_string)
        .collect();

    if stack.is_empty() {
        return Err(ValidationError::EmptyTechStack);
    }
    if stack.len() > max {
        return Err(ValidationError::TechStackTooLarge {
            max,
            found: stack.len(),
        });
    }
    Ok(stack)
}

fn non_empty(field: ProfileField, raw: &str) -> Result<String, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(value.to_string())
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(LIST_SEPARATORS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHONE_RANGE: RangeInclusive<usize> = 7..=15;

    #[test]
    fn test_email_accepts_simple_address() {
        assert_eq!(validate_email("a@b.com").unwrap(), "a@b.com");
        assert_eq!(
            validate_email("  Jane.Doe@Example.ORG ").unwrap(),
            "jane.doe@example.org"
        );
    }

    #[test]
    fn test_email_rejects_missing_at() {
        assert_eq!(
            validate_email("not-an-email"),
            Err(ValidationError::MalformedEmail)
        );
    }

    #[test]
    fn test_email_rejects_multiple_at() {
        assert_eq!(validate_email("a@b@c.com"), Err(ValidationError::MultipleAt));
    }

    #[test]
    fn test_email_rejects_missing_tld_and_whitespace() {
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a@b.").is_err());
        assert!(validate_email("a b@c.com").is_err());
    }

    #[test]
    fn test_email_rejects_empty() {
        assert_eq!(
            validate_email("   "),
            Err(ValidationError::Empty {
                field: ProfileField::Email
            })
        );
    }

    #[test]
    fn test_phone_strips_separators() {
        assert_eq!(
            validate_phone("+1 (555) 123-4567", &PHONE_RANGE).unwrap(),
            "15551234567"
        );
        assert_eq!(validate_phone("555.123.4567", &PHONE_RANGE).unwrap(), "5551234567");
    }

    #[test]
    fn test_phone_rejects_letters() {
        assert_eq!(
            validate_phone("555-CALL-NOW", &PHONE_RANGE),
            Err(ValidationError::PhoneCharacters)
        );
    }

    #[test]
    fn test_phone_rejects_inner_plus() {
        assert_eq!(
            validate_phone("555+1234567", &PHONE_RANGE),
            Err(ValidationError::PhoneCharacters)
        );
    }

    #[test]
    fn test_phone_length_bounds_inclusive() {
        assert!(validate_phone("1234567", &PHONE_RANGE).is_ok());
        assert!(validate_phone("123456789012345", &PHONE_RANGE).is_ok());
        assert_eq!(
            validate_phone("123456", &PHONE_RANGE),
            Err(ValidationError::PhoneLength {
                min: 7,
                max: 15,
                found: 6
            })
        );
        assert!(validate_phone("1234567890123456", &PHONE_RANGE).is_err());
    }

    #[test]
    fn test_experience_parses_integer_and_decimal() {
        assert_eq!(validate_experience("5").unwrap(), 5.0);
        assert_eq!(validate_experience("2.5").unwrap(), 2.5);
        assert_eq!(validate_experience("0").unwrap(), 0.0);
    }

    #[test]
    fn test_experience_accepts_unit_suffix() {
        assert_eq!(validate_experience("7 years").unwrap(), 7.0);
        assert_eq!(validate_experience("1 Year").unwrap(), 1.0);
        assert_eq!(validate_experience("3yrs").unwrap(), 3.0);
    }

    #[test]
    fn test_experience_rejects_negative() {
        assert_eq!(
            validate_experience("-2"),
            Err(ValidationError::NegativeExperience)
        );
    }

    #[test]
    fn test_experience_rejects_non_numeric() {
        assert_eq!(validate_experience("lots"), Err(ValidationError::NotANumber));
        assert_eq!(validate_experience("inf"), Err(ValidationError::NotANumber));
        assert_eq!(validate_experience("NaN"), Err(ValidationError::NotANumber));
        assert_eq!(validate_experience("years"), Err(ValidationError::NotANumber));
    }

    #[test]
    fn test_experience_rejects_overflowing_digit_run() {
        let huge = "9".repeat(400);
        assert_eq!(validate_experience(&huge), Err(ValidationError::NotANumber));
        assert_eq!(
            validate_experience(&format!("{huge} years")),
            Err(ValidationError::NotANumber)
        );
    }

    #[test]
    fn test_name_and_location_trimmed() {
        assert_eq!(validate_name("  Ada Lovelace ").unwrap(), "Ada Lovelace");
        assert!(validate_name("\t\n").is_err());
        assert_eq!(validate_location(" Lisbon, Portugal ").unwrap(), "Lisbon, Portugal");
    }

    #[test]
    fn test_desired_roles_split_in_order() {
        assert_eq!(
            validate_desired_roles("Backend Engineer; SRE").unwrap(),
            vec!["Backend Engineer", "SRE"]
        );
        assert!(validate_desired_roles(" , ; ").is_err());
    }

    #[test]
    fn test_tech_stack_dedupes_case_insensitively() {
        let stack = validate_tech_stack("Python, python, Go", 10).unwrap();
        assert_eq!(stack, vec!["Python", "Go"]);
    }

    #[test]
    fn test_tech_stack_mixed_separators() {
        let stack = validate_tech_stack("Rust;Tokio\nPostgreSQL, ", 10).unwrap();
        assert_eq!(stack, vec!["Rust", "Tokio", "PostgreSQL"]);
    }

    #[test]
    fn test_tech_stack_rejects_empty() {
        assert_eq!(
            validate_tech_stack(" ,, ;", 10),
            Err(ValidationError::EmptyTechStack)
        );
    }

    #[test]
    fn test_tech_stack_rejects_over_limit() {
        assert_eq!(
            validate_tech_stack("a, b, c", 2),
            Err(ValidationError::TechStackTooLarge { max: 2, found: 3 })
        );
        // duplicates do not count towards the limit
        assert!(validate_tech_stack("a, A, b", 2).is_ok());
    }

    #[test]
    fn test_error_message_names_constraint() {
        let e = validate_phone("12", &PHONE_RANGE).unwrap_err();
        assert!(e.to_string().contains("between 7 and 15 digits"));
        assert_eq!(e.field(), ProfileField::Phone);
    }

    /// Accepted values re-validate to themselves.
    #[test]
    fn test_accepted_values_revalidate() {
        let email = validate_email(" Someone@Example.com ").unwrap();
        assert_eq!(validate_email(&email).unwrap(), email);

        let phone = validate_phone("+44 (20) 7946-0958", &PHONE_RANGE).unwrap();
        assert_eq!(validate_phone(&phone, &PHONE_RANGE).unwrap(), phone);

        let years = validate_experience("4.5 years").unwrap();
        assert_eq!(validate_experience(&years.to_string()).unwrap(), years);

        let stack = validate_tech_stack("Go; go; Rust", 10).unwrap();
        assert_eq!(validate_tech_stack(&stack.join(", "), 10).unwrap(), stack);

        let roles = validate_desired_roles("SRE, Platform Engineer").unwrap();
        assert_eq!(validate_desired_roles(&roles.join(", ")).unwrap(), roles);
    }
}
