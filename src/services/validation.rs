//! Input rules shared by the services. Each helper returns the normalised
//! value or a message suitable for a 400 response.

use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"))
}

/// Trims `text` and checks it is non-empty and at most `max_chars` characters.
pub fn bounded_text(field: &str, text: &str, max_chars: usize) -> Result<String, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(format!("Please add {field}"));
    }

    let len = trimmed.chars().count();
    if len > max_chars {
        return Err(format!(
            "{} must be {max_chars} characters or less (got {len})",
            capitalize(field)
        ));
    }

    Ok(trimmed.to_string())
}

pub fn email(email: &str) -> Result<String, String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err("Please add an email".to_string());
    }
    if !email_regex().is_match(trimmed) {
        return Err(format!("'{trimmed}' is not a valid email address"));
    }
    Ok(trimmed.to_lowercase())
}

pub fn password(password: &str, min_len: usize) -> Result<(), String> {
    if password.is_empty() {
        return Err("Please add a password".to_string());
    }
    if password.chars().count() < min_len {
        return Err(format!("Password must be at least {min_len} characters"));
    }
    Ok(())
}

fn capitalize(field: &str) -> String {
    let field = field
        .strip_prefix("a ")
        .or_else(|| field.strip_prefix("an "))
        .unwrap_or(field);
    let mut chars = field.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
