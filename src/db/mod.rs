use crate::domain::{TicketId, TicketStatus, UserId};
use crate::models::{
    NewTicket, NewUser, Note, NoteIntent, NoteWrite, StatusWrite, Ticket, TicketChanges, User,
    UserCredentials,
};
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod memory;
pub mod migrator;
pub mod repositories;

pub use memory::InMemoryStore;

/// Persistence seam for users, tickets and notes.
///
/// Services receive an `Arc<dyn SupportStore>`, so the SQLite-backed
/// [`Store`] can be swapped for [`InMemoryStore`] in tests.
#[async_trait]
pub trait SupportStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    async fn get_user_credentials(&self, email: &str) -> Result<Option<UserCredentials>>;

    async fn get_user_by_api_key(&self, api_key: &str) -> Result<Option<User>>;

    /// Returns false when the user does not exist.
    async fn update_user_password(&self, id: UserId, password_hash: String) -> Result<bool>;

    /// Returns false when the user does not exist.
    async fn update_user_api_key(&self, id: UserId, api_key: String) -> Result<bool>;

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket>;

    async fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>>;

    /// Tickets owned by `user_id`, newest first.
    async fn list_tickets(&self, user_id: UserId) -> Result<Vec<Ticket>>;

    /// Compare-and-set: applies every field of `changes` only while the
    /// ticket is still in `expected`, otherwise nothing is written.
    async fn update_ticket(
        &self,
        id: TicketId,
        expected: TicketStatus,
        changes: TicketChanges,
    ) -> Result<StatusWrite>;

    async fn set_ticket_status(
        &self,
        id: TicketId,
        expected: TicketStatus,
        next: TicketStatus,
    ) -> Result<StatusWrite> {
        let changes = TicketChanges {
            status: Some(next),
            ..TicketChanges::default()
        };
        self.update_ticket(id, expected, changes).await
    }

    /// Removes the ticket and every note attached to it.
    async fn delete_ticket(&self, id: TicketId) -> Result<bool>;

    /// Notes of a ticket in insertion order.
    async fn list_notes(&self, ticket_id: TicketId) -> Result<Vec<Note>>;

    /// Stores the note and applies the optional status transition atomically.
    /// Nothing is written when the ticket is closed or missing.
    async fn add_note(&self, intent: NoteIntent) -> Result<NoteWrite>;

    /// Cheap liveness check used by `/health`.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every connection to an in-memory database sees its own schema
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        // The single in-memory connection must never be recycled
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn ticket_repo(&self) -> repositories::ticket::TicketRepository {
        repositories::ticket::TicketRepository::new(self.conn.clone())
    }

    fn note_repo(&self) -> repositories::note::NoteRepository {
        repositories::note::NoteRepository::new(self.conn.clone())
    }
}

#[async_trait]
impl SupportStore for Store {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.user_repo().create(user).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    async fn get_user_credentials(&self, email: &str) -> Result<Option<UserCredentials>> {
        self.user_repo().get_credentials_by_email(email).await
    }

    async fn get_user_by_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().get_by_api_key(api_key).await
    }

    async fn update_user_password(&self, id: UserId, password_hash: String) -> Result<bool> {
        self.user_repo().update_password(id, password_hash).await
    }

    async fn update_user_api_key(&self, id: UserId, api_key: String) -> Result<bool> {
        self.user_repo().update_api_key(id, api_key).await
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<Ticket> {
        self.ticket_repo().create(ticket).await
    }

    async fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>> {
        self.ticket_repo().get(id).await
    }

    async fn list_tickets(&self, user_id: UserId) -> Result<Vec<Ticket>> {
        self.ticket_repo().list_for_user(user_id).await
    }

    async fn update_ticket(
        &self,
        id: TicketId,
        expected: TicketStatus,
        changes: TicketChanges,
    ) -> Result<StatusWrite> {
        self.ticket_repo().update(id, expected, changes).await
    }

    async fn delete_ticket(&self, id: TicketId) -> Result<bool> {
        self.ticket_repo().delete(id).await
    }

    async fn list_notes(&self, ticket_id: TicketId) -> Result<Vec<Note>> {
        self.note_repo().list_for_ticket(ticket_id).await
    }

    async fn add_note(&self, intent: NoteIntent) -> Result<NoteWrite> {
        self.note_repo().add(intent).await
    }

    async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Product;

    async fn memory_store() -> Store {
        Store::new("sqlite::memory:").await.unwrap()
    }

    async fn seed_ticket(store: &Store) -> (User, Ticket) {
        let user = store
            .create_user(NewUser {
                name: "Jo".to_string(),
                email: "Jo@Example.com".to_string(),
                password_hash: "unused".to_string(),
                api_key: repositories::user::generate_api_key(),
                is_admin: false,
            })
            .await
            .unwrap();
        let ticket = store
            .create_ticket(NewTicket {
                user_id: user.id,
                product: Product::SmartHub,
                description: "Wi-Fi drops every evening".to_string(),
            })
            .await
            .unwrap();
        (user, ticket)
    }

    /// Multi-connection pool over a fresh database file.
    async fn file_store() -> (Store, std::path::PathBuf) {
        let db_path =
            std::env::temp_dir().join(format!("helpdesk-store-test-{}.db", uuid::Uuid::new_v4()));
        let store = Store::with_pool_options(&format!("sqlite:{}", db_path.display()), 5, 2)
            .await
            .unwrap();
        (store, db_path)
    }

    #[tokio::test]
    async fn migrations_seed_an_admin_with_random_secrets() {
        let first = memory_store().await;
        let second = memory_store().await;
        first.ping().await.unwrap();

        let a = first
            .get_user_credentials(migrator::DEFAULT_ADMIN_EMAIL)
            .await
            .unwrap()
            .expect("admin seeded");
        let b = second
            .get_user_credentials(migrator::DEFAULT_ADMIN_EMAIL)
            .await
            .unwrap()
            .expect("admin seeded");

        assert!(a.user.is_admin);
        assert_eq!(a.api_key.len(), 64);
        assert_ne!(a.api_key, b.api_key);
        assert_ne!(a.password_hash, b.password_hash);
        assert!(!repositories::user::verify_password("password", &a.password_hash).unwrap());
    }

    #[tokio::test]
    async fn credentials_can_be_rotated() {
        let store = memory_store().await;
        let admin = store
            .get_user_credentials(migrator::DEFAULT_ADMIN_EMAIL)
            .await
            .unwrap()
            .unwrap();

        let fresh = repositories::user::generate_api_key();
        assert!(
            store
                .update_user_api_key(admin.user.id, fresh.clone())
                .await
                .unwrap()
        );
        assert!(store.get_user_by_api_key(&admin.api_key).await.unwrap().is_none());
        assert_eq!(
            store.get_user_by_api_key(&fresh).await.unwrap().map(|u| u.id),
            Some(admin.user.id)
        );

        assert!(
            store
                .update_user_password(admin.user.id, "new-hash".to_string())
                .await
                .unwrap()
        );
        let reloaded = store
            .get_user_credentials(migrator::DEFAULT_ADMIN_EMAIL)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.password_hash, "new-hash");

        assert!(
            !store
                .update_user_api_key(UserId::new(999), fresh)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn emails_are_stored_lowercase() {
        let store = memory_store().await;
        let (user, _) = seed_ticket(&store).await;
        assert_eq!(user.email, "jo@example.com");

        let creds = store
            .get_user_credentials("JO@example.COM")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(creds.user.id, user.id);
    }

    #[tokio::test]
    async fn note_intent_reopens_new_ticket() {
        let store = memory_store().await;
        let (user, ticket) = seed_ticket(&store).await;
        assert_eq!(ticket.status, TicketStatus::New);

        let write = store
            .add_note(NoteIntent {
                ticket_id: ticket.id,
                user_id: user.id,
                text: "Rebooted, still failing".to_string(),
                transition: Some(TicketStatus::Open),
            })
            .await
            .unwrap();
        assert!(matches!(write, NoteWrite::Created(_)));

        let reloaded = store.get_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn note_intent_refused_on_closed_ticket() {
        let store = memory_store().await;
        let (user, ticket) = seed_ticket(&store).await;

        let write = store
            .set_ticket_status(ticket.id, TicketStatus::New, TicketStatus::Closed)
            .await
            .unwrap();
        assert!(matches!(write, StatusWrite::Applied(_)));

        let write = store
            .add_note(NoteIntent {
                ticket_id: ticket.id,
                user_id: user.id,
                text: "hello?".to_string(),
                transition: Some(TicketStatus::Open),
            })
            .await
            .unwrap();
        assert_eq!(write, NoteWrite::TicketClosed);
        assert!(store.list_notes(ticket.id).await.unwrap().is_empty());

        let reloaded = store.get_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, TicketStatus::Closed);
    }

    #[tokio::test]
    async fn note_intent_for_missing_ticket() {
        let store = memory_store().await;
        let (user, _) = seed_ticket(&store).await;

        let write = store
            .add_note(NoteIntent {
                ticket_id: TicketId::new(999),
                user_id: user.id,
                text: "lost".to_string(),
                transition: None,
            })
            .await
            .unwrap();
        assert_eq!(write, NoteWrite::TicketMissing);
    }

    #[tokio::test]
    async fn stale_status_write_is_reported() {
        let store = memory_store().await;
        let (_, ticket) = seed_ticket(&store).await;

        let write = store
            .set_ticket_status(ticket.id, TicketStatus::Open, TicketStatus::Closed)
            .await
            .unwrap();
        match write {
            StatusWrite::Stale(current) => assert_eq!(current.status, TicketStatus::New),
            other => panic!("expected stale write, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_ticket_update_writes_nothing() {
        let store = memory_store().await;
        let (_, ticket) = seed_ticket(&store).await;

        store
            .set_ticket_status(ticket.id, TicketStatus::New, TicketStatus::Closed)
            .await
            .unwrap();

        let write = store
            .update_ticket(
                ticket.id,
                TicketStatus::New,
                TicketChanges {
                    product: Some(Product::PikTv),
                    description: Some("edited after close".to_string()),
                    status: Some(TicketStatus::Open),
                },
            )
            .await
            .unwrap();
        assert!(matches!(write, StatusWrite::Stale(_)));

        let reloaded = store.get_ticket(ticket.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, TicketStatus::Closed);
        assert_eq!(reloaded.product, Product::SmartHub);
        assert_eq!(reloaded.description, "Wi-Fi drops every evening");
    }

    #[tokio::test]
    async fn ticket_update_applies_fields_and_status_together() {
        let store = memory_store().await;
        let (_, ticket) = seed_ticket(&store).await;

        let write = store
            .update_ticket(
                ticket.id,
                TicketStatus::New,
                TicketChanges {
                    description: Some("Only on 5 GHz".to_string()),
                    status: Some(TicketStatus::Open),
                    ..TicketChanges::default()
                },
            )
            .await
            .unwrap();

        let StatusWrite::Applied(updated) = write else {
            panic!("expected applied write, got {write:?}");
        };
        assert_eq!(updated.status, TicketStatus::Open);
        assert_eq!(updated.description, "Only on 5 GHz");
        assert_eq!(updated.product, Product::SmartHub);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn note_and_close_race_on_a_pooled_file_database() {
        let (store, db_path) = file_store().await;
        let store = std::sync::Arc::new(store);
        let (user, _) = seed_ticket(&store).await;

        for round in 0..25 {
            let ticket = store
                .create_ticket(NewTicket {
                    user_id: user.id,
                    product: Product::Hsia,
                    description: format!("race {round}"),
                })
                .await
                .unwrap();

            let noting = {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .add_note(NoteIntent {
                            ticket_id: ticket.id,
                            user_id: user.id,
                            text: "still broken".to_string(),
                            transition: Some(TicketStatus::Open),
                        })
                        .await
                })
            };
            let closing = {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .set_ticket_status(ticket.id, TicketStatus::New, TicketStatus::Closed)
                        .await
                })
            };

            let note = noting.await.unwrap().unwrap();
            let close = closing.await.unwrap().unwrap();
            let notes = store.list_notes(ticket.id).await.unwrap();
            let status = store.get_ticket(ticket.id).await.unwrap().unwrap().status;

            match (note, close) {
                (NoteWrite::Created(_), StatusWrite::Stale(_)) => {
                    assert_eq!(status, TicketStatus::Open);
                    assert_eq!(notes.len(), 1);
                }
                (NoteWrite::TicketClosed, StatusWrite::Applied(_)) => {
                    assert_eq!(status, TicketStatus::Closed);
                    assert!(notes.is_empty());
                }
                other => panic!("round {round}: inconsistent outcome {other:?}"),
            }
        }

        drop(store);
        let _ = std::fs::remove_file(db_path);
    }

    #[tokio::test]
    async fn delete_cascades_notes() {
        let store = memory_store().await;
        let (user, ticket) = seed_ticket(&store).await;

        store
            .add_note(NoteIntent {
                ticket_id: ticket.id,
                user_id: user.id,
                text: "first".to_string(),
                transition: None,
            })
            .await
            .unwrap();

        assert!(store.delete_ticket(ticket.id).await.unwrap());
        assert!(store.get_ticket(ticket.id).await.unwrap().is_none());
        assert!(store.list_notes(ticket.id).await.unwrap().is_empty());
        assert!(!store.delete_ticket(ticket.id).await.unwrap());
    }
}
