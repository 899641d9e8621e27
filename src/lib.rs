//! Multi-tenant CRM backend: contacts, deals, tasks, analytics and
//! advertising lead ingestion behind a JSON API.

pub mod db;
pub mod domain;
pub mod models;
pub mod repository;
pub mod schema;

#[cfg(feature = "server")]
pub mod dto;
#[cfg(feature = "server")]
pub mod forms;
#[cfg(feature = "server")]
pub mod integrations;
#[cfg(feature = "server")]
pub mod pagination;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "server")]
pub mod services;

pub const SERVICE_ACCESS_ROLE: &str = "crm";
pub const SERVICE_ADMIN_ROLE: &str = "crm_admin";

#[cfg(feature = "server")]
pub use server::run;

#[cfg(feature = "server")]
mod server {
    use actix_cors::Cors;
    use actix_web::{App, HttpServer, middleware, web};

    use crate::db::{establish_connection_pool, run_migrations};
    use crate::integrations::HttpSettings;
    use crate::models::auth::AuthConfig;
    use crate::models::config::ServerConfig;
    use crate::repository::DieselRepository;
    use crate::routes;

    /// Builds and runs the Actix-Web HTTP server using the provided configuration.
    pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
        // Establish Diesel connection pool for the SQLite database.
        let pool = establish_connection_pool(&server_config.database_url).map_err(|e| {
            std::io::Error::other(format!("Failed to establish database connection: {e}"))
        })?;
        run_migrations(&pool).map_err(std::io::Error::other)?;

        let repo = DieselRepository::new(pool);
        let auth_config = AuthConfig {
            secret: server_config.secret.clone(),
        };
        let http_settings = HttpSettings::from(&server_config);

        let bind_address = (server_config.address.clone(), server_config.port);
        log::info!(
            "Serving {} on {}:{}",
            server_config.domain,
            bind_address.0,
            bind_address.1
        );

        HttpServer::new(move || {
            App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Logger::default())
                .app_data(web::Data::new(repo.clone()))
                .app_data(web::Data::new(auth_config.clone()))
                .app_data(web::Data::new(http_settings.clone()))
                .service(web::scope("/api/v1").configure(routes::configure))
        })
        .bind(bind_address)?
        .run()
        .await
    }
}
