use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Runtime settings, layered from defaults, `config.toml` and
/// `ACADEMIX__SECTION__KEY` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub auth: AuthSettings,
    pub sweep: SweepSettings,
    pub mail: MailSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub bind_address: String,
    /// Origin of the single-page client; used for CORS and reset links
    pub frontend_url: String,
}

/// Which store implementation backs the services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub backend: StoreBackend,
    pub url: String,
    pub name: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    pub secret: String,
    pub expiration_hours: i64,
    pub cookie_max_age_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub otp_ttl_minutes: i64,
    pub reset_ttl_minutes: i64,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepSettings {
    pub enabled: bool,
    /// Hour of the day (UTC) at which unverified accounts are purged
    pub hour_utc: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailSettings {
    pub sender: String,
}

/// Signing secret used when none is configured; fine for local runs only
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

impl Settings {
    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt.secret == DEFAULT_JWT_SECRET
    }

    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Self::defaults()?;

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("ACADEMIX")
                .prefix_separator("__")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }

    /// Settings built from defaults only, ignoring files and environment
    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults() -> Result<config::builder::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.bind_address", "0.0.0.0:8001")?
            .set_default("server.frontend_url", "http://localhost:5173")?
            .set_default("database.backend", "mongo")?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "academix")?
            .set_default("database.max_retries", 5)?
            .set_default("database.retry_delay_ms", 1_000)?
            .set_default("jwt.secret", DEFAULT_JWT_SECRET)?
            .set_default("jwt.expiration_hours", 24)?
            .set_default("jwt.cookie_max_age_seconds", 9_000)?
            .set_default("auth.otp_ttl_minutes", 10)?
            .set_default("auth.reset_ttl_minutes", 10)?
            .set_default("auth.bcrypt_cost", bcrypt::DEFAULT_COST)?
            .set_default("sweep.enabled", true)?
            .set_default("sweep.hour_utc", 1)?
            .set_default("mail.sender", "Academix <no-reply@academix.local>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize() {
        let settings = Settings::from_defaults().unwrap();
        assert_eq!(settings.database.backend, StoreBackend::Mongo);
        assert_eq!(settings.auth.otp_ttl_minutes, 10);
        assert_eq!(settings.sweep.hour_utc, 1);
        assert_eq!(settings.jwt.cookie_max_age_seconds, 9_000);
        assert!(settings.uses_default_jwt_secret());

        let mut configured = settings.clone();
        configured.jwt.secret = "a-real-secret".to_string();
        assert!(!configured.uses_default_jwt_secret());
    }
}
