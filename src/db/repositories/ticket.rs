use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

use crate::domain::{TicketId, TicketStatus, UserId};
use crate::entities::{notes, prelude::*, tickets};
use crate::models::{NewTicket, StatusWrite, Ticket, TicketChanges};

/// Repository for ticket operations
pub struct TicketRepository {
    conn: DatabaseConnection,
}

impl TicketRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub(crate) fn map_model(model: tickets::Model) -> Result<Ticket> {
        Ok(Ticket {
            id: TicketId::new(model.id),
            user_id: UserId::new(model.user_id),
            product: model
                .product
                .parse()
                .with_context(|| format!("Ticket {} has a corrupt product", model.id))?,
            description: model.description,
            status: model
                .status
                .parse()
                .with_context(|| format!("Ticket {} has a corrupt status", model.id))?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    pub async fn create(&self, ticket: NewTicket) -> Result<Ticket> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = tickets::ActiveModel {
            user_id: Set(ticket.user_id.value()),
            product: Set(ticket.product.as_str().to_string()),
            description: Set(ticket.description),
            status: Set(TicketStatus::New.as_str().to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert ticket")?;

        info!("Created ticket {} for user {}", model.id, model.user_id);
        Self::map_model(model)
    }

    pub async fn get(&self, id: TicketId) -> Result<Option<Ticket>> {
        Tickets::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query ticket")?
            .map(Self::map_model)
            .transpose()
    }

    /// Tickets owned by `user_id`, newest first.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Ticket>> {
        let rows = Tickets::find()
            .filter(tickets::Column::UserId.eq(user_id.value()))
            .order_by_desc(tickets::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list tickets")?;

        rows.into_iter().map(Self::map_model).collect()
    }

    /// Applies `changes` in a single UPDATE guarded on `status = expected`.
    pub async fn update(
        &self,
        id: TicketId,
        expected: TicketStatus,
        changes: TicketChanges,
    ) -> Result<StatusWrite> {
        let mut update = Tickets::update_many()
            .col_expr(
                tickets::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(tickets::Column::Id.eq(id.value()))
            .filter(tickets::Column::Status.eq(expected.as_str()));

        if let Some(product) = changes.product {
            update = update.col_expr(tickets::Column::Product, Expr::value(product.as_str()));
        }
        if let Some(description) = changes.description {
            update = update.col_expr(tickets::Column::Description, Expr::value(description));
        }
        if let Some(next) = changes.status {
            update = update.col_expr(tickets::Column::Status, Expr::value(next.as_str()));
        }

        let result = update
            .exec(&self.conn)
            .await
            .context("Failed to update ticket")?;

        let current = self.get(id).await?;

        Ok(match current {
            None => StatusWrite::Missing,
            Some(ticket) if result.rows_affected > 0 => {
                if ticket.status != expected {
                    info!("Ticket {} moved {} -> {}", id, expected, ticket.status);
                }
                StatusWrite::Applied(ticket)
            }
            Some(ticket) => StatusWrite::Stale(ticket),
        })
    }

    /// Deletes the ticket and its notes in one transaction.
    pub async fn delete(&self, id: TicketId) -> Result<bool> {
        let txn = self.conn.begin().await?;

        notes::Entity::delete_many()
            .filter(notes::Column::TicketId.eq(id.value()))
            .exec(&txn)
            .await?;

        let result = Tickets::delete_by_id(id.value()).exec(&txn).await?;

        txn.commit().await?;

        let removed = result.rows_affected > 0;
        if removed {
            info!("Deleted ticket {}", id);
        }
        Ok(removed)
    }
}
