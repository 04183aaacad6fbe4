use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::accounts::AccountService;
use crate::blogs::BlogService;
use crate::comments::CommentService;
use crate::connection::{ConnectionConfig, ConnectionManager};
use crate::engagement::EngagementService;
use crate::error::Result;
use crate::mailer::{LogMailer, Mailer};
use crate::settings::{Settings, StoreBackend};
use crate::store::{MemoryStore, MongoStore, Store};
use crate::sweeper::Sweeper;

/// The portal: every service wired to one store and one mailer.
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct Portal {
    settings: Arc<Settings>,
    store: Arc<dyn Store>,
    pub accounts: AccountService,
    pub blogs: BlogService,
    pub comments: CommentService,
    pub engagement: EngagementService,
}

impl Portal {
    /// Wire the services to an existing store and mailer
    pub fn new(settings: Settings, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Self {
        let settings = Arc::new(settings);
        Self {
            accounts: AccountService::new(store.clone(), mailer, settings.clone()),
            blogs: BlogService::new(store.clone()),
            comments: CommentService::new(store.clone()),
            engagement: EngagementService::new(store.clone()),
            settings,
            store,
        }
    }

    /// Open the configured store backend and wire the services to it, with
    /// a mailer that writes to the log
    pub async fn connect(settings: Settings) -> Result<Self> {
        info!("🚀 Starting Academix portal");
        if settings.uses_default_jwt_secret() {
            warn!("⚠️ jwt.secret is the built-in default; set ACADEMIX__JWT__SECRET before deploying");
        }

        let store: Arc<dyn Store> = match settings.database.backend {
            StoreBackend::Mongo => {
                let manager = ConnectionManager::new(ConnectionConfig::from(&settings.database));
                let store = MongoStore::new(manager.connect().await?);
                store.ensure_indexes().await?;
                Arc::new(store)
            }
            StoreBackend::Memory => {
                info!("Using the in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };
        let mailer = Arc::new(LogMailer::new(settings.mail.sender.clone()));

        Ok(Self::new(settings, store, mailer))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Start the daily unverified-account sweep if enabled
    pub fn start_sweeper(&self) -> Option<JoinHandle<()>> {
        if !self.settings.sweep.enabled {
            info!("Unverified-account sweep disabled");
            return None;
        }
        Some(Sweeper::new(self.store.clone(), self.settings.sweep.hour_utc).spawn())
    }
}

impl std::fmt::Debug for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Portal")
            .field("backend", &self.settings.database.backend)
            .finish_non_exhaustive()
    }
}
