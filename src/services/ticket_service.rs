//! Domain service for support tickets.
//!
//! Owns the ticket lifecycle: creation, edits, status transitions and
//! deletion, each gated by the ownership rule in [`crate::domain::access`].

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{TicketId, UserId};
use crate::models::Ticket;
use crate::services::guard::GuardError;

/// Errors specific to ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
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

impl From<sea_orm::DbErr> for TicketError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for TicketError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<GuardError> for TicketError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::UnknownCaller(_) => Self::Unauthorized("User not found".to_string()),
            GuardError::TicketNotFound(id) => Self::NotFound(format!("Ticket {id} not found")),
            GuardError::Denied(reason) => Self::Unauthorized(reason.to_string()),
            GuardError::Store(err) => err.into(),
        }
    }
}

/// Body of `POST /api/tickets`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicketRequest {
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub description: String,
}

/// Body of `PUT /api/tickets/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTicketRequest {
    pub product: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// Domain service trait for tickets.
#[async_trait::async_trait]
pub trait TicketService: Send + Sync {
    /// Lists the caller's own tickets, newest first.
    async fn list_tickets(&self, caller: UserId) -> Result<Vec<Ticket>, TicketError>;

    /// Gets a single ticket.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::NotFound`] if the ticket does not exist and
    /// [`TicketError::Unauthorized`] if the caller may not see it.
    async fn get_ticket(&self, caller: UserId, id: TicketId) -> Result<Ticket, TicketError>;

    /// Files a new ticket in status `new`.
    async fn create_ticket(
        &self,
        caller: UserId,
        request: CreateTicketRequest,
    ) -> Result<Ticket, TicketError>;

    /// Edits product/description and optionally moves the status.
    ///
    /// # Errors
    ///
    /// Returns [`TicketError::Conflict`] for a transition the lifecycle does
    /// not allow or one that raced with another status change.
    async fn update_ticket(
        &self,
        caller: UserId,
        id: TicketId,
        request: UpdateTicketRequest,
    ) -> Result<Ticket, TicketError>;

    /// Closes the ticket.
    async fn close_ticket(&self, caller: UserId, id: TicketId) -> Result<Ticket, TicketError>;

    /// Deletes the ticket and its notes.
    async fn delete_ticket(&self, caller: UserId, id: TicketId) -> Result<(), TicketError>;
}
