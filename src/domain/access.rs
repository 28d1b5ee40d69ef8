//! Ownership-based access decisions for tickets and their notes.

use std::fmt;

use crate::models::{Ticket, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Caller is neither the ticket owner nor an administrator.
    NotOwner,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOwner => f.write_str("Not authorized"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allow,
    Deny(DenyReason),
}

/// Decides whether `caller` may read, annotate, edit or close `ticket`.
#[must_use]
pub fn authorize(caller: &User, ticket: &Ticket) -> AuthDecision {
    if caller.id == ticket.user_id || caller.is_admin {
        AuthDecision::Allow
    } else {
        AuthDecision::Deny(DenyReason::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Product, TicketId, TicketStatus, UserId};

    fn user(id: i32, is_admin: bool) -> User {
        User {
            id: UserId::new(id),
            name: format!("user{id}"),
            email: format!("user{id}@example.com"),
            is_admin,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn ticket_owned_by(owner: i32) -> Ticket {
        Ticket {
            id: TicketId::new(1),
            user_id: UserId::new(owner),
            product: Product::Hsia,
            description: "No sync light".to_string(),
            status: TicketStatus::New,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn owner_is_allowed() {
        let decision = authorize(&user(5, false), &ticket_owned_by(5));
        assert_eq!(decision, AuthDecision::Allow);
    }

    #[test]
    fn other_users_are_denied() {
        let decision = authorize(&user(6, false), &ticket_owned_by(5));
        assert_eq!(decision, AuthDecision::Deny(DenyReason::NotOwner));
    }

    #[test]
    fn admin_overrides_ownership() {
        assert_eq!(
            authorize(&user(1, true), &ticket_owned_by(5)),
            AuthDecision::Allow
        );
    }
}
