use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::NoteConfig;
use crate::db::SupportStore;
use crate::domain::{TicketId, TicketStatus, UserId};
use crate::models::{Note, NoteIntent, NoteWrite};
use crate::services::guard::ticket_for_caller;
use crate::services::note_service::{NoteError, NoteService};
use crate::services::validation;

pub struct DefaultNoteService {
    store: Arc<dyn SupportStore>,
    config: NoteConfig,
}

impl DefaultNoteService {
    #[must_use]
    pub fn new(store: Arc<dyn SupportStore>, config: NoteConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl NoteService for DefaultNoteService {
    async fn get_notes(&self, caller: UserId, ticket_id: TicketId) -> Result<Vec<Note>, NoteError> {
        ticket_for_caller(self.store.as_ref(), caller, ticket_id).await?;
        Ok(self.store.list_notes(ticket_id).await?)
    }

    async fn create_note(
        &self,
        caller: UserId,
        ticket_id: TicketId,
        text: &str,
    ) -> Result<Note, NoteError> {
        let (user, ticket) = ticket_for_caller(self.store.as_ref(), caller, ticket_id).await?;

        let text = validation::bounded_text("a note", text, self.config.max_length)
            .map_err(NoteError::Validation)?;

        if !ticket.status.accepts_notes() {
            return Err(closed(ticket_id));
        }

        let transition = (self.config.reopen_on_note && ticket.status == TicketStatus::New)
            .then_some(TicketStatus::Open);

        let intent = NoteIntent {
            ticket_id,
            user_id: user.id,
            text,
            transition,
        };

        match self.store.add_note(intent).await? {
            NoteWrite::Created(note) => {
                metrics::counter!("notes_created_total").increment(1);
                if transition.is_some() {
                    info!("Ticket {} moved to open by note {}", ticket_id, note.id);
                } else {
                    debug!("Note {} added to ticket {}", note.id, ticket_id);
                }
                Ok(note)
            }
            NoteWrite::TicketClosed => Err(closed(ticket_id)),
            NoteWrite::TicketMissing => {
                Err(NoteError::NotFound(format!("Ticket {ticket_id} not found")))
            }
        }
    }
}

fn closed(ticket_id: TicketId) -> NoteError {
    debug!("Refused note on closed ticket {}", ticket_id);
    NoteError::Conflict("Cannot add a note to a closed ticket".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::domain::Product;
    use crate::models::{NewTicket, NewUser, StatusWrite, Ticket, User};

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: DefaultNoteService,
        owner: User,
        other: User,
        admin: User,
        ticket: Ticket,
    }

    async fn add_user(store: &InMemoryStore, email: &str, is_admin: bool) -> User {
        store
            .create_user(NewUser {
                name: email.to_string(),
                email: email.to_string(),
                password_hash: String::new(),
                api_key: format!("key-{email}"),
                is_admin,
            })
            .await
            .unwrap()
    }

    async fn fixture_with(config: NoteConfig) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let owner = add_user(&store, "owner@example.com", false).await;
        let other = add_user(&store, "other@example.com", false).await;
        let admin = add_user(&store, "admin@example.com", true).await;
        let ticket = store
            .create_ticket(NewTicket {
                user_id: owner.id,
                product: Product::Hsia,
                description: "Modem keeps rebooting".to_string(),
            })
            .await
            .unwrap();

        let service = DefaultNoteService::new(store.clone(), config);
        Fixture {
            store,
            service,
            owner,
            other,
            admin,
            ticket,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(NoteConfig::default()).await
    }

    async fn status_of(f: &Fixture) -> TicketStatus {
        f.store.get_ticket(f.ticket.id).await.unwrap().unwrap().status
    }

    async fn close(f: &Fixture) {
        let write = f
            .store
            .set_ticket_status(f.ticket.id, status_of(f).await, TicketStatus::Closed)
            .await
            .unwrap();
        assert!(matches!(write, StatusWrite::Applied(_)));
    }

    #[tokio::test]
    async fn owner_adds_note_and_reads_it_back() {
        let f = fixture().await;

        let note = f
            .service
            .create_note(f.owner.id, f.ticket.id, "  Tried a factory reset ")
            .await
            .unwrap();
        assert_eq!(note.text, "Tried a factory reset");
        assert_eq!(note.ticket_id, f.ticket.id);
        assert_eq!(note.user_id, f.owner.id);

        let notes = f.service.get_notes(f.owner.id, f.ticket.id).await.unwrap();
        assert_eq!(notes, vec![note]);
    }

    #[tokio::test]
    async fn listing_is_idempotent_and_ordered() {
        let f = fixture().await;
        for text in ["first", "second", "third"] {
            f.service
                .create_note(f.owner.id, f.ticket.id, text)
                .await
                .unwrap();
        }

        let a = f.service.get_notes(f.owner.id, f.ticket.id).await.unwrap();
        let b = f.service.get_notes(f.owner.id, f.ticket.id).await.unwrap();
        assert_eq!(a, b);

        let texts: Vec<&str> = a.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn first_note_opens_a_new_ticket() {
        let f = fixture().await;
        assert_eq!(status_of(&f).await, TicketStatus::New);

        f.service
            .create_note(f.owner.id, f.ticket.id, "any update?")
            .await
            .unwrap();
        assert_eq!(status_of(&f).await, TicketStatus::Open);

        f.service
            .create_note(f.owner.id, f.ticket.id, "still waiting")
            .await
            .unwrap();
        assert_eq!(status_of(&f).await, TicketStatus::Open);
    }

    #[tokio::test]
    async fn reopen_can_be_disabled() {
        let f = fixture_with(NoteConfig {
            reopen_on_note: false,
            ..NoteConfig::default()
        })
        .await;

        f.service
            .create_note(f.owner.id, f.ticket.id, "quiet note")
            .await
            .unwrap();
        assert_eq!(status_of(&f).await, TicketStatus::New);
    }

    #[tokio::test]
    async fn non_owner_is_rejected_for_both_operations() {
        let f = fixture().await;

        assert!(matches!(
            f.service.get_notes(f.other.id, f.ticket.id).await,
            Err(NoteError::Unauthorized(_))
        ));
        assert!(matches!(
            f.service.create_note(f.other.id, f.ticket.id, "hi").await,
            Err(NoteError::Unauthorized(_))
        ));
        assert!(f.store.list_notes(f.ticket.id).await.unwrap().is_empty());
        assert_eq!(status_of(&f).await, TicketStatus::New);
    }

    #[tokio::test]
    async fn admin_may_read_and_write_any_ticket() {
        let f = fixture().await;

        let note = f
            .service
            .create_note(f.admin.id, f.ticket.id, "Escalated to tier 2")
            .await
            .unwrap();
        assert_eq!(note.user_id, f.admin.id);

        let notes = f.service.get_notes(f.admin.id, f.ticket.id).await.unwrap();
        assert_eq!(notes.len(), 1);
    }

    #[tokio::test]
    async fn missing_ticket_and_unknown_caller() {
        let f = fixture().await;

        assert!(matches!(
            f.service.get_notes(f.owner.id, TicketId::new(9_999)).await,
            Err(NoteError::NotFound(_))
        ));
        assert!(matches!(
            f.service
                .create_note(f.owner.id, TicketId::new(9_999), "hello")
                .await,
            Err(NoteError::NotFound(_))
        ));
        assert!(matches!(
            f.service.get_notes(UserId::new(9_999), f.ticket.id).await,
            Err(NoteError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn blank_and_oversized_notes_are_rejected() {
        let f = fixture_with(NoteConfig {
            max_length: 10,
            ..NoteConfig::default()
        })
        .await;

        let err = f
            .service
            .create_note(f.owner.id, f.ticket.id, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, NoteError::Validation(_)));

        let err = f
            .service
            .create_note(f.owner.id, f.ticket.id, "this is far too long")
            .await
            .unwrap_err();
        assert!(matches!(err, NoteError::Validation(_)));

        assert!(f.store.list_notes(f.ticket.id).await.unwrap().is_empty());
        assert_eq!(status_of(&f).await, TicketStatus::New);
    }

    #[tokio::test]
    async fn closed_ticket_refuses_notes() {
        let f = fixture().await;
        close(&f).await;

        let err = f
            .service
            .create_note(f.owner.id, f.ticket.id, "please reopen")
            .await
            .unwrap_err();
        assert!(matches!(err, NoteError::Conflict(_)));
        assert_eq!(status_of(&f).await, TicketStatus::Closed);
        assert!(f.store.list_notes(f.ticket.id).await.unwrap().is_empty());

        // Reading the history of a closed ticket is still allowed
        assert!(f.service.get_notes(f.owner.id, f.ticket.id).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_close_never_leaves_note_on_reopened_ticket() {
        for _ in 0..50 {
            let f = fixture().await;

            let (note, closed) = tokio::join!(
                f.service.create_note(f.owner.id, f.ticket.id, "racing"),
                f.store
                    .set_ticket_status(f.ticket.id, TicketStatus::New, TicketStatus::Closed),
            );
            let closed = closed.unwrap();
            let status = status_of(&f).await;
            let notes = f.store.list_notes(f.ticket.id).await.unwrap();

            match (note, closed) {
                // Note landed first, so the close saw `open` and lost its CAS
                (Ok(_), StatusWrite::Stale(_)) => {
                    assert_eq!(status, TicketStatus::Open);
                    assert_eq!(notes.len(), 1);
                }
                // Close landed first, so the note was refused
                (Err(NoteError::Conflict(_)), StatusWrite::Applied(_)) => {
                    assert_eq!(status, TicketStatus::Closed);
                    assert!(notes.is_empty());
                }
                (note, closed) => panic!("unexpected interleaving: {note:?} / {closed:?}"),
            }
        }
    }
}
