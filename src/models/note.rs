use serde::{Deserialize, Serialize};

use crate::domain::{NoteId, TicketId, TicketStatus, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub ticket_id: TicketId,
    /// Author of the note.
    pub user_id: UserId,
    pub text: String,
    pub created_at: String,
}

/// A note to append, optionally moving its ticket to `transition` in the
/// same write. The store refuses the whole intent if the ticket is closed.
#[derive(Debug, Clone)]
pub struct NoteIntent {
    pub ticket_id: TicketId,
    pub user_id: UserId,
    pub text: String,
    pub transition: Option<TicketStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteWrite {
    Created(Note),
    TicketClosed,
    TicketMissing,
}
