//! Process-local [`SupportStore`] used by tests and throwaway instances.
//!
//! All state lives behind one `RwLock`, so every trait method is atomic with
//! respect to the others.

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::SupportStore;
use crate::domain::{NoteId, TicketId, TicketStatus, UserId};
use crate::models::{
    NewTicket, NewUser, Note, NoteIntent, NoteWrite, StatusWrite, Ticket, TicketChanges, User,
    UserCredentials,
};

#[derive(Default)]
struct Inner {
    users: BTreeMap<UserId, UserCredentials>,
    tickets: BTreeMap<TicketId, Ticket>,
    notes: Vec<Note>,
    next_id: i32,
}

impl Inner {
    const fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[async_trait]
impl SupportStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut inner = self.inner.write().await;
        let email = user.email.to_lowercase();

        if inner.users.values().any(|c| c.user.email == email) {
            bail!("UNIQUE constraint failed: users.email");
        }

        let id = UserId::new(inner.allocate_id());
        let stamp = now();
        let record = User {
            id,
            name: user.name,
            email,
            is_admin: user.is_admin,
            created_at: stamp.clone(),
            updated_at: stamp,
        };

        inner.users.insert(
            id,
            UserCredentials {
                user: record.clone(),
                password_hash: user.password_hash,
                api_key: user.api_key,
            },
        );
        Ok(record)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).map(|c| c.user.clone()))
    }

    async fn get_user_credentials(&self, email: &str) -> Result<Option<UserCredentials>> {
        let email = email.to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|c| c.user.email == email)
            .cloned())
    }

    async fn get_user_by_api_key(&self, api_key: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|c| c.api_key == api_key)
            .map(|c| c.user.clone()))
    }

    async fn update_user_password(&self, id: UserId, password_hash: String) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(credentials) = inner.users.get_mut(&id) else {
            return Ok(false);
        };
        credentials.password_hash = password_hash;
        credentials.user.updated_at = now();
        Ok(true)
    }

    async fn update_user_api_key(&self, id: UserId, api_key: String) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(credentials) = inner.users.get_mut(&id) else {
            return Ok(false);
        };
        credentials.api_key = api_key;
        credentials.user.updated_at = now();
        Ok(true)
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket> {
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&ticket.user_id) {
            bail!("FOREIGN KEY constraint failed: tickets.user_id");
        }

        let id = TicketId::new(inner.allocate_id());
        let stamp = now();
        let record = Ticket {
            id,
            user_id: ticket.user_id,
            product: ticket.product,
            description: ticket.description,
            status: TicketStatus::New,
            created_at: stamp.clone(),
            updated_at: stamp,
        };
        inner.tickets.insert(id, record.clone());
        Ok(record)
    }

    async fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>> {
        let inner = self.inner.read().await;
        Ok(inner.tickets.get(&id).cloned())
    }

    async fn list_tickets(&self, user_id: UserId) -> Result<Vec<Ticket>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tickets
            .values()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_ticket(
        &self,
        id: TicketId,
        expected: TicketStatus,
        changes: TicketChanges,
    ) -> Result<StatusWrite> {
        let mut inner = self.inner.write().await;
        let Some(ticket) = inner.tickets.get_mut(&id) else {
            return Ok(StatusWrite::Missing);
        };

        if ticket.status != expected {
            return Ok(StatusWrite::Stale(ticket.clone()));
        }

        if let Some(product) = changes.product {
            ticket.product = product;
        }
        if let Some(description) = changes.description {
            ticket.description = description;
        }
        if let Some(status) = changes.status {
            ticket.status = status;
        }
        ticket.updated_at = now();
        Ok(StatusWrite::Applied(ticket.clone()))
    }

    async fn delete_ticket(&self, id: TicketId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let removed = inner.tickets.remove(&id).is_some();
        if removed {
            inner.notes.retain(|n| n.ticket_id != id);
        }
        Ok(removed)
    }

    async fn list_notes(&self, ticket_id: TicketId) -> Result<Vec<Note>> {
        let inner = self.inner.read().await;
        Ok(inner
            .notes
            .iter()
            .filter(|n| n.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn add_note(&self, intent: NoteIntent) -> Result<NoteWrite> {
        let mut inner = self.inner.write().await;
        let stamp = now();

        let Some(ticket) = inner.tickets.get_mut(&intent.ticket_id) else {
            return Ok(NoteWrite::TicketMissing);
        };
        if !ticket.status.accepts_notes() {
            return Ok(NoteWrite::TicketClosed);
        }
        if let Some(status) = intent.transition {
            ticket.status = status;
        }
        ticket.updated_at.clone_from(&stamp);

        let note = Note {
            id: NoteId::new(inner.allocate_id()),
            ticket_id: intent.ticket_id,
            user_id: intent.user_id,
            text: intent.text,
            created_at: stamp,
        };
        inner.notes.push(note.clone());
        Ok(NoteWrite::Created(note))
    }
}
