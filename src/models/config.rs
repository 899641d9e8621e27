//! Configuration model loaded from external sources.

use serde::Deserialize;

fn default_avito_api_url() -> String {
    "https://api.avito.ru".to_string()
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_sync_interval_secs() -> u64 {
    300
}

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers and workers.
pub struct ServerConfig {
    pub domain: String,
    pub address: String,
    pub port: u16,
    pub database_url: String,
    /// HS256 key used to verify bearer tokens.
    pub secret: String,
    #[serde(default = "default_avito_api_url")]
    pub avito_api_url: String,
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Pause between polling rounds of the `sync_leads` worker.
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
}

impl ServerConfig {
    /// Loads `config/default.yaml`, the optional `config/{APP_ENV}.yaml`
    /// profile and `APP_*` environment overrides.
    pub fn load() -> Result<Self, config::ConfigError> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "local".into());

        config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{app_env}")).required(false))
            .add_source(config::Environment::with_prefix("APP"))
            .build()?
            .try_deserialize::<ServerConfig>()
    }
}
