use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::{Store, SupportStore};
use crate::services::{
    AuthService, DefaultAuthService, DefaultNoteService, DefaultTicketService, NoteService,
    TicketService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Arc<dyn SupportStore>,

    pub auth_service: Arc<dyn AuthService>,

    pub ticket_service: Arc<dyn TicketService>,

    pub note_service: Arc<dyn NoteService>,
}

impl SharedState {
    /// Opens the configured database, runs migrations and wires the services.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Wires the services over an already constructed store.
    #[must_use]
    pub fn with_store(config: Config, store: Arc<dyn SupportStore>) -> Self {
        let auth_service = Arc::new(DefaultAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let ticket_service = Arc::new(DefaultTicketService::new(
            store.clone(),
            config.tickets.clone(),
        )) as Arc<dyn TicketService>;

        let note_service = Arc::new(DefaultNoteService::new(
            store.clone(),
            config.notes.clone(),
        )) as Arc<dyn NoteService>;

        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            auth_service,
            ticket_service,
            note_service,
        }
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
