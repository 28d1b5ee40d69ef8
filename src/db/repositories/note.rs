use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{debug, info};

use crate::domain::{NoteId, TicketId, TicketStatus, UserId};
use crate::entities::{notes, prelude::*, tickets};
use crate::models::{Note, NoteIntent, NoteWrite};

impl From<notes::Model> for Note {
    fn from(model: notes::Model) -> Self {
        Self {
            id: NoteId::new(model.id),
            ticket_id: TicketId::new(model.ticket_id),
            user_id: UserId::new(model.user_id),
            text: model.text,
            created_at: model.created_at,
        }
    }
}

/// Repository for ticket notes
pub struct NoteRepository {
    conn: DatabaseConnection,
}

impl NoteRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Notes of one ticket in insertion order.
    pub async fn list_for_ticket(&self, ticket_id: TicketId) -> Result<Vec<Note>> {
        let rows = Notes::find()
            .filter(notes::Column::TicketId.eq(ticket_id.value()))
            .order_by_asc(notes::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list notes")?;

        Ok(rows.into_iter().map(Note::from).collect())
    }

    /// Applies a [`NoteIntent`] in a single transaction.
    ///
    /// The ticket row is updated first, guarded on `status != closed`. That
    /// write takes the database write lock, so a concurrent close either
    /// lands before (and the guard fails) or after the note is committed.
    pub async fn add(&self, intent: NoteIntent) -> Result<NoteWrite> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let mut guard = Tickets::update_many()
            .col_expr(tickets::Column::UpdatedAt, Expr::value(now.clone()))
            .filter(tickets::Column::Id.eq(intent.ticket_id.value()))
            .filter(tickets::Column::Status.ne(TicketStatus::Closed.as_str()));

        if let Some(status) = intent.transition {
            guard = guard.col_expr(tickets::Column::Status, Expr::value(status.as_str()));
        }

        let touched = guard.exec(&txn).await?.rows_affected;

        if touched == 0 {
            let exists = Tickets::find_by_id(intent.ticket_id.value())
                .one(&txn)
                .await?
                .is_some();
            txn.rollback().await?;

            debug!(
                "Refused note for ticket {} (exists: {})",
                intent.ticket_id, exists
            );
            return Ok(if exists {
                NoteWrite::TicketClosed
            } else {
                NoteWrite::TicketMissing
            });
        }

        let model = notes::ActiveModel {
            ticket_id: Set(intent.ticket_id.value()),
            user_id: Set(intent.user_id.value()),
            text: Set(intent.text),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert note")?;

        txn.commit().await?;

        info!("Added note {} to ticket {}", model.id, model.ticket_id);
        Ok(NoteWrite::Created(Note::from(model)))
    }
}
