use std::sync::Arc;

use tracing::debug;

use crate::accounts::Session;
use crate::error::{PortalError, Result};
use crate::models::{LikeOutcome, LikeTarget};
use crate::store::Store;

/// Likes on blogs and comments
#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn Store>,
}

impl EngagementService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Like the document if the caller has not liked it yet, otherwise
    /// withdraw the like
    pub async fn like_unlike(&self, session: &Session, target: LikeTarget, id: &str) -> Result<LikeOutcome> {
        let outcome = self
            .store
            .toggle_like(target, id, session.user_id())
            .await?
            .ok_or_else(|| PortalError::not_found(target.not_found_message()))?;

        debug!(
            "{} {} {} by {} ({} likes)",
            target.label(),
            id,
            if outcome.user_liked { "liked" } else { "unliked" },
            session.user_id(),
            outcome.likes_count
        );
        Ok(outcome)
    }
}
