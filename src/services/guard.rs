//! Caller and ticket resolution shared by the ticket and note services.

use crate::db::SupportStore;
use crate::domain::access::{AuthDecision, DenyReason, authorize};
use crate::domain::{TicketId, UserId};
use crate::models::{Ticket, User};

#[derive(Debug)]
pub enum GuardError {
    /// The authenticated id no longer resolves to a user.
    UnknownCaller(UserId),
    TicketNotFound(TicketId),
    Denied(DenyReason),
    Store(anyhow::Error),
}

impl From<anyhow::Error> for GuardError {
    fn from(err: anyhow::Error) -> Self {
        Self::Store(err)
    }
}

pub async fn load_caller(store: &dyn SupportStore, caller: UserId) -> Result<User, GuardError> {
    store
        .get_user(caller)
        .await?
        .ok_or(GuardError::UnknownCaller(caller))
}

/// Resolves the caller, then the ticket, then applies the ownership rule.
///
/// A missing ticket is reported before any access decision is taken.
pub async fn ticket_for_caller(
    store: &dyn SupportStore,
    caller: UserId,
    ticket_id: TicketId,
) -> Result<(User, Ticket), GuardError> {
    let user = load_caller(store, caller).await?;

    let ticket = store
        .get_ticket(ticket_id)
        .await?
        .ok_or(GuardError::TicketNotFound(ticket_id))?;

    match authorize(&user, &ticket) {
        AuthDecision::Allow => Ok((user, ticket)),
        AuthDecision::Deny(reason) => {
            tracing::warn!(
                user_id = %user.id,
                ticket_id = %ticket.id,
                "Denied access to ticket: {reason}"
            );
            Err(GuardError::Denied(reason))
        }
    }
}
