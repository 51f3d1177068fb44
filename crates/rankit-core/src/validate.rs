//! Input validation helpers.
//!
//! The HTTP layer is expected to pass length-bounded, sanitized strings,
//! but the engine re-validates semantic constraints as the last line of
//! defense before any mutation.

use crate::error::{RankError, RankResult};

/// Trim whitespace and truncate to `max_len` characters.
pub fn sanitize(text: &str, max_len: usize) -> String {
    let trimmed = text.trim();
    trimmed.chars().take(max_len).collect()
}

/// Simplified RFC 5322 email check: local part, `@`, domain with a dot
/// and a 2+ character TLD.
pub fn validate_email(email: &str) -> RankResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && local
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c))
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || ".-".contains(c))
                && domain.rsplit('.').next().is_some_and(|tld| {
                    tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
                })
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(RankError::Validation {
            message: "Invalid email address".into(),
        })
    }
}

/// Usernames are 3–30 characters of letters, digits, underscore, hyphen.
pub fn validate_username(username: &str) -> RankResult<()> {
    let username = username.trim();

    if username.len() < 3 {
        return Err(RankError::Validation {
            message: "Username must be at least 3 characters".into(),
        });
    }
    if username.len() > 30 {
        return Err(RankError::Validation {
            message: "Username must be at most 30 characters".into(),
        });
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(RankError::Validation {
            message: "Username can only contain letters, numbers, underscore, and hyphen".into(),
        });
    }

    Ok(())
}

pub fn validate_password(password: &str, min_length: usize) -> RankResult<()> {
    if password.len() < min_length {
        return Err(RankError::Validation {
            message: format!("Password must be at least {min_length} characters"),
        });
    }
    Ok(())
}

/// Scores are integers in [1, 5]. Checked before any mutation.
pub fn validate_score(score: i64) -> RankResult<u8> {
    if (1..=5).contains(&score) {
        Ok(score as u8)
    } else {
        Err(RankError::InvalidScore { score })
    }
}
