//! Domain service for ticket notes.

use thiserror::Error;

use crate::domain::{TicketId, UserId};
use crate::models::Note;
use crate::services::guard::GuardError;

/// Errors specific to note operations.
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for NoteError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for NoteError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<GuardError> for NoteError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::UnknownCaller(_) => Self::Unauthorized("User not found".to_string()),
            GuardError::TicketNotFound(id) => Self::NotFound(format!("Ticket {id} not found")),
            GuardError::Denied(reason) => Self::Unauthorized(reason.to_string()),
            GuardError::Store(err) => err.into(),
        }
    }
}

/// Domain service trait for notes.
#[async_trait::async_trait]
pub trait NoteService: Send + Sync {
    /// Lists the notes of a ticket in the order they were written.
    ///
    /// # Errors
    ///
    /// Returns [`NoteError::NotFound`] for an unknown ticket and
    /// [`NoteError::Unauthorized`] when the caller is neither owner nor admin.
    async fn get_notes(&self, caller: UserId, ticket_id: TicketId) -> Result<Vec<Note>, NoteError>;

    /// Appends a note, moving a `new` ticket to `open` in the same write.
    ///
    /// # Errors
    ///
    /// Returns [`NoteError::Conflict`] when the ticket is closed.
    async fn create_note(
        &self,
        caller: UserId,
        ticket_id: TicketId,
        text: &str,
    ) -> Result<Note, NoteError>;
}
