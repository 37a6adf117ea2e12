//! Engine configuration read from the environment.
//!
//! Only the CLI reads it directly; library entry points receive what they
//! need (repository, timezone) from the caller.

use anyhow::anyhow;
use chrono_tz::Tz;
use envconfig::Envconfig;
use std::sync::LazyLock;

#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// Database host value
    /// Example: "sqlite:data/app.db"
    pub db_host: String,

    /// 🔒 SENSITIVE: Database password to encrypt SQLite data
    #[envconfig(default = "")]
    pub db_pass_encrypt: String,

    /// IANA timezone of the shop, weekdays for scheduling rules and pricing
    /// are taken from this calendar.
    #[envconfig(default = "America/Sao_Paulo")]
    pub shop_timezone: String,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    pub fn timezone(&self) -> anyhow::Result<Tz> {
        self.shop_timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid shop_timezone {}: {}", self.shop_timezone, e))
    }
}

pub static APP_CONFIG: LazyLock<AppConfig> = LazyLock::new(|| {
    AppConfig::init_from_env()
        .expect("Failed to load application configuration. Check environment variables.")
});
