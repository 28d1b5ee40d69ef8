use serde::{Deserialize, Serialize};

use crate::domain::{Product, TicketId, TicketStatus, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    /// Owner of the ticket.
    pub user_id: UserId,
    pub product: Product,
    pub description: String,
    pub status: TicketStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub user_id: UserId,
    pub product: Product,
    pub description: String,
}

/// Edits applied to an existing ticket in one guarded write.
#[derive(Debug, Clone, Default)]
pub struct TicketChanges {
    pub product: Option<Product>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
}

impl TicketChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.product.is_none() && self.description.is_none() && self.status.is_none()
    }
}

/// Outcome of a compare-and-set ticket write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusWrite {
    Applied(Ticket),
    /// The ticket was no longer in the expected status; carries what it is now.
    Stale(Ticket),
    Missing,
}
