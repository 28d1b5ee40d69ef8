use super::ApiError;
use crate::domain::TicketId;

/// Parses the `{ticket_id}` path segment and tags the request span with it.
pub fn validate_ticket_id(raw: &str) -> Result<TicketId, ApiError> {
    let id = raw
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ApiError::validation(format!(
                "Invalid ticket ID: {raw}. ID must be a positive integer"
            ))
        })?;

    tracing::Span::current().record("ticket_id", id);
    Ok(TicketId::new(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ticket_id() {
        assert_eq!(validate_ticket_id("1").unwrap(), TicketId::new(1));
        assert!(validate_ticket_id("12345").is_ok());
        assert!(validate_ticket_id("0").is_err());
        assert!(validate_ticket_id("-1").is_err());
    }

    #[test]
    fn non_numeric_ids_are_validation_errors() {
        for raw in ["abc", "1.5", "", "99999999999"] {
            assert!(
                matches!(validate_ticket_id(raw), Err(ApiError::ValidationError(_))),
                "{raw:?} should be rejected"
            );
        }
    }
}
