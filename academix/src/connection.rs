use std::time::Duration;

use mongodb::bson::doc;
use mongodb::{Client, Database};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::settings::DatabaseSettings;

/// Configuration for the MongoDB connection
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// MongoDB URL (e.g., "mongodb://localhost:27017")
    pub url: String,
    /// Database holding the portal collections
    pub database: String,
    /// Number of connection attempts before giving up
    pub max_retries: u32,
    /// Delay between attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl From<&DatabaseSettings> for ConnectionConfig {
    fn from(settings: &DatabaseSettings) -> Self {
        Self {
            url: settings.url.clone(),
            database: settings.name.clone(),
            max_retries: settings.max_retries.max(1),
            retry_delay_ms: settings.retry_delay_ms,
        }
    }
}

/// Opens the MongoDB connection, retrying until the server answers a ping
pub struct ConnectionManager {
    config: ConnectionConfig,
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Connect with retry logic and return the portal database handle
    pub async fn connect(&self) -> Result<Database> {
        let mut attempts = 0;

        loop {
            match self.try_connect().await {
                Ok(database) => {
                    info!(
                        "Connected to MongoDB at {} (database: {})",
                        self.config.url, self.config.database
                    );
                    return Ok(database);
                }
                Err(e) => {
                    attempts += 1;
                    if attempts >= self.config.max_retries {
                        error!("Failed to connect to MongoDB after {} attempts: {}", attempts, e);
                        return Err(e);
                    }

                    warn!(
                        "Connection attempt {} failed, retrying in {}ms: {}",
                        attempts, self.config.retry_delay_ms, e
                    );

                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
            }
        }
    }

    async fn try_connect(&self) -> Result<Database> {
        debug!("Attempting to connect to {}", self.config.url);

        // the driver connects lazily; the ping forces a round trip
        let client = Client::with_uri_str(&self.config.url).await?;
        let database = client.database(&self.config.database);
        database.run_command(doc! { "ping": 1 }).await?;

        Ok(database)
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("database", &self.config.database)
            .field("max_retries", &self.config.max_retries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn test_config_from_settings() {
        let mut settings = Settings::from_defaults().unwrap();
        settings.database.max_retries = 0;

        let config = ConnectionConfig::from(&settings.database);
        assert_eq!(config.database, "academix");
        assert_eq!(config.max_retries, 1);
    }
}
