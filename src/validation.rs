//! Input validation for problem data.

use crate::error::{NexusError, Result};
use crate::model::{MAX_ESTIMATED_EFFORT, Problem};

/// Maximum allowed length for a problem title.
pub const MAX_TITLE_LENGTH: usize = 300;

/// Maximum allowed length for a problem ID.
pub const MAX_ID_LENGTH: usize = 80;

/// Maximum allowed length for a session note or chat message.
pub const MAX_ENTRY_LENGTH: usize = 10_000;

/// Characters forbidden in IDs.
const FORBIDDEN_ID_CHARS: &[char] = &['/', '\\', '\0'];

pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(NexusError::Validation("Title cannot be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(NexusError::Validation(format!(
            "Title exceeds maximum length of {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(NexusError::Validation("ID cannot be empty".to_string()));
    }
    if id.len() > MAX_ID_LENGTH {
        return Err(NexusError::Validation(format!(
            "ID exceeds maximum length of {} characters",
            MAX_ID_LENGTH
        )));
    }
    if id.contains("..") {
        return Err(NexusError::Validation(
            "ID cannot contain '..'".to_string(),
        ));
    }
    for c in FORBIDDEN_ID_CHARS {
        if id.contains(*c) {
            return Err(NexusError::Validation(format!("ID cannot contain '{}'", c)));
        }
    }
    Ok(())
}

/// Validates a note, progress update or chat message.
pub fn validate_entry(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(NexusError::Validation("Entry text cannot be empty".to_string()));
    }
    if text.len() > MAX_ENTRY_LENGTH {
        return Err(NexusError::Validation(format!(
            "Entry exceeds maximum length of {} characters",
            MAX_ENTRY_LENGTH
        )));
    }
    Ok(())
}

/// Checks the invariants a problem must hold before it is persisted.
pub fn validate_problem(problem: &Problem) -> Result<()> {
    validate_id(&problem.id)?;
    validate_title(&problem.title)?;
    if problem.estimated_effort > MAX_ESTIMATED_EFFORT {
        return Err(NexusError::Validation(format!(
            "Estimated effort {} exceeds {} hours",
            problem.estimated_effort, MAX_ESTIMATED_EFFORT
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn problem(id: &str, title: &str) -> Problem {
        Problem::new(id.to_string(), title.to_string(), "github".to_string(), Utc::now())
    }

    #[test]
    fn test_validate_title_empty() {
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
    }

    #[test]
    fn test_validate_title_too_long() {
        let long_title = "a".repeat(MAX_TITLE_LENGTH + 1);
        assert!(validate_title(&long_title).is_err());
        assert!(validate_title("A valid title").is_ok());
    }

    #[test]
    fn test_validate_id_forbidden() {
        assert!(validate_id("").is_err());
        assert!(validate_id("../etc").is_err());
        assert!(validate_id("github/1234").is_err());
        assert!(validate_id("github-1a2b3c4d5e6f").is_ok());
    }

    #[test]
    fn test_validate_problem() {
        assert!(validate_problem(&problem("github-1", "Fix it")).is_ok());
        assert!(matches!(
            validate_problem(&problem("", "Fix it")),
            Err(NexusError::Validation(_))
        ));
        assert!(matches!(
            validate_problem(&problem("github-1", "")),
            Err(NexusError::Validation(_))
        ));

        let mut too_big = problem("github-1", "Fix it");
        too_big.estimated_effort = 41;
        assert!(validate_problem(&too_big).is_err());
    }

    #[test]
    fn test_validate_entry() {
        assert!(validate_entry("looked at the stack trace").is_ok());
        assert!(validate_entry("  ").is_err());
    }
}
