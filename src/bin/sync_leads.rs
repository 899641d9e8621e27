//! Background worker polling advertising integrations for new leads.

use std::thread;
use std::time::Duration;

use chrono::Utc;
use dotenvy::dotenv;

use tenant_crm::db::{establish_connection_pool, run_migrations};
use tenant_crm::integrations::avito::AvitoClient;
use tenant_crm::integrations::{HttpDispatcher, HttpSettings};
use tenant_crm::models::config::ServerConfig;
use tenant_crm::repository::DieselRepository;
use tenant_crm::services::avito_sync::sync_all_active;

fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let server_config = match ServerConfig::load() {
        Ok(server_config) => server_config,
        Err(err) => {
            log::error!("Error loading server config: {err}");
            std::process::exit(1);
        }
    };

    let pool = match establish_connection_pool(&server_config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = run_migrations(&pool) {
        log::error!("{e}");
        std::process::exit(1);
    }
    let repo = DieselRepository::new(pool);

    let settings = HttpSettings::from(&server_config);
    let client = match settings.build_client() {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to build HTTP client: {e}");
            std::process::exit(1);
        }
    };
    let api = AvitoClient::new(client, settings.avito_api_url.as_str());
    let dispatcher = match HttpDispatcher::new(&settings) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            log::error!("Failed to build automation dispatcher: {e}");
            std::process::exit(1);
        }
    };

    let interval = Duration::from_secs(server_config.sync_interval_secs.max(1));
    log::info!(
        "Polling advertising integrations every {}s",
        interval.as_secs()
    );

    loop {
        let synced = sync_all_active(&repo, &api, &dispatcher, Utc::now().naive_utc());
        log::info!("Sync round finished, {synced} integrations synced");
        thread::sleep(interval);
    }
}
