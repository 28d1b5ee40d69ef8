//! Store-backed implementation of the `TicketService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::TicketConfig;
use crate::db::SupportStore;
use crate::domain::{Product, TicketId, TicketStatus, UserId};
use crate::models::{NewTicket, StatusWrite, Ticket, TicketChanges};
use crate::services::guard::{load_caller, ticket_for_caller};
use crate::services::ticket_service::{
    CreateTicketRequest, TicketError, TicketService, UpdateTicketRequest,
};
use crate::services::validation;

pub struct DefaultTicketService {
    store: Arc<dyn SupportStore>,
    config: TicketConfig,
}

impl DefaultTicketService {
    #[must_use]
    pub fn new(store: Arc<dyn SupportStore>, config: TicketConfig) -> Self {
        Self { store, config }
    }

    fn parse_product(raw: &str) -> Result<Product, TicketError> {
        if raw.trim().is_empty() {
            return Err(TicketError::Validation("Please add a product".to_string()));
        }
        raw.parse()
            .map_err(|e: crate::domain::ParseEnumError| TicketError::Validation(e.to_string()))
    }

    fn parse_description(&self, raw: &str) -> Result<String, TicketError> {
        validation::bounded_text("a description", raw, self.config.max_description_length)
            .map_err(TicketError::Validation)
    }

    /// Writes `changes` only if the ticket still has the status it was
    /// loaded with. A lost race leaves the ticket untouched.
    async fn apply(&self, ticket: Ticket, changes: TicketChanges) -> Result<Ticket, TicketError> {
        let closing = changes.status == Some(TicketStatus::Closed);

        match self
            .store
            .update_ticket(ticket.id, ticket.status, changes)
            .await?
        {
            StatusWrite::Applied(updated) => {
                if closing && ticket.status != TicketStatus::Closed {
                    metrics::counter!("tickets_closed_total").increment(1);
                }
                Ok(updated)
            }
            StatusWrite::Stale(current) => Err(TicketError::Conflict(format!(
                "Ticket {} changed status concurrently and is now '{}'",
                current.id, current.status
            ))),
            StatusWrite::Missing => Err(TicketError::NotFound(format!(
                "Ticket {} not found",
                ticket.id
            ))),
        }
    }
}

#[async_trait]
impl TicketService for DefaultTicketService {
    async fn list_tickets(&self, caller: UserId) -> Result<Vec<Ticket>, TicketError> {
        let user = load_caller(self.store.as_ref(), caller).await?;
        Ok(self.store.list_tickets(user.id).await?)
    }

    async fn get_ticket(&self, caller: UserId, id: TicketId) -> Result<Ticket, TicketError> {
        let (_, ticket) = ticket_for_caller(self.store.as_ref(), caller, id).await?;
        Ok(ticket)
    }

    async fn create_ticket(
        &self,
        caller: UserId,
        request: CreateTicketRequest,
    ) -> Result<Ticket, TicketError> {
        let user = load_caller(self.store.as_ref(), caller).await?;

        let product = Self::parse_product(&request.product)?;
        let description = self.parse_description(&request.description)?;

        let ticket = self
            .store
            .create_ticket(NewTicket {
                user_id: user.id,
                product,
                description,
            })
            .await?;

        metrics::counter!("tickets_created_total", "product" => product.as_str()).increment(1);
        Ok(ticket)
    }

    async fn update_ticket(
        &self,
        caller: UserId,
        id: TicketId,
        request: UpdateTicketRequest,
    ) -> Result<Ticket, TicketError> {
        let (_, ticket) = ticket_for_caller(self.store.as_ref(), caller, id).await?;

        let changes = TicketChanges {
            product: request
                .product
                .as_deref()
                .map(Self::parse_product)
                .transpose()?,
            description: request
                .description
                .as_deref()
                .map(|d| self.parse_description(d))
                .transpose()?,
            status: request
                .status
                .as_deref()
                .map(|s| {
                    s.parse::<TicketStatus>()
                        .map_err(|e| TicketError::Validation(e.to_string()))
                })
                .transpose()?,
        };

        if changes.is_empty() {
            return Err(TicketError::Validation("No changes supplied".to_string()));
        }

        if let Some(next) = changes.status {
            ticket
                .status
                .transition(next)
                .map_err(|e| TicketError::Conflict(e.to_string()))?;
        } else if ticket.status.is_terminal() {
            return Err(TicketError::Conflict(
                "Closed tickets cannot be edited".to_string(),
            ));
        }

        self.apply(ticket, changes).await
    }

    async fn close_ticket(&self, caller: UserId, id: TicketId) -> Result<Ticket, TicketError> {
        let (_, ticket) = ticket_for_caller(self.store.as_ref(), caller, id).await?;

        if ticket.status.is_terminal() {
            return Err(TicketError::Conflict(format!(
                "Ticket {id} is already closed"
            )));
        }

        let changes = TicketChanges {
            status: Some(TicketStatus::Closed),
            ..TicketChanges::default()
        };
        let closed = self.apply(ticket, changes).await?;
        info!("Ticket {} closed by user {}", id, caller);
        Ok(closed)
    }

    async fn delete_ticket(&self, caller: UserId, id: TicketId) -> Result<(), TicketError> {
        ticket_for_caller(self.store.as_ref(), caller, id).await?;

        if self.store.delete_ticket(id).await? {
            Ok(())
        } else {
            Err(TicketError::NotFound(format!("Ticket {id} not found")))
        }
    }
}
