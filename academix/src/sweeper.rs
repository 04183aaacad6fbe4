use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::Result;
use crate::store::Store;

/// Daily removal of accounts that never confirmed their email
#[derive(Clone)]
pub struct Sweeper {
    store: Arc<dyn Store>,
    hour_utc: u32,
}

impl Sweeper {
    pub fn new(store: Arc<dyn Store>, hour_utc: u32) -> Self {
        Self {
            store,
            hour_utc: hour_utc % 24,
        }
    }

    /// Delete pending accounts whose OTP expired before `now`
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<u64> {
        let removed = self.store.purge_unverified(now).await?;
        info!("🧹 Removed {} unverified accounts", removed);
        Ok(removed)
    }

    /// The first scheduled run strictly after `now`
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now
            .date_naive()
            .and_hms_opt(self.hour_utc, 0, 0)
            .map(|t| t.and_utc())
            .unwrap_or(now);
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }

    /// Run forever on the daily schedule. Failures are logged and the next
    /// run proceeds as planned.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("🧹 Unverified-account sweep scheduled daily at {:02}:00 UTC", self.hour_utc);

            loop {
                let now = Utc::now();
                let next = self.next_run_after(now);
                let wait = (next - now).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                if let Err(e) = self.sweep_once(Utc::now()).await {
                    error!("Unverified-account sweep failed: {}", e);
                }
            }
        })
    }
}
