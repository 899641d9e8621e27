//! JSON API handlers mounted under `/api/v1`.
//!
//! Handlers authenticate through the [`AuthenticatedUser`] extractor and run
//! the synchronous services on the blocking thread pool.
//!
//! [`AuthenticatedUser`]: crate::models::auth::AuthenticatedUser

use actix_web::web;

use crate::integrations::HttpDispatcher;
use crate::integrations::HttpSettings;
use crate::services::{ServiceError, ServiceResult};

pub mod automations;
pub mod contacts;
pub mod dashboard;
pub mod deals;
pub mod errors;
pub mod integrations;
pub mod tasks;

/// Runs a service call on the blocking pool.
pub(crate) async fn blocking<T, F>(call: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(call).await.map_err(|err| {
        log::error!("Blocking task failed: {err}");
        ServiceError::Internal(err.to_string())
    })?
}

/// Builds the automation dispatcher; call it from inside [`blocking`].
pub(crate) fn dispatcher(settings: &HttpSettings) -> ServiceResult<HttpDispatcher> {
    Ok(HttpDispatcher::new(settings)?)
}

/// Registers every API endpoint.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(dashboard::show_dashboard)
        .service(contacts::list_contacts)
        .service(contacts::create_contact)
        .service(contacts::import_contacts)
        .service(contacts::show_contact)
        .service(contacts::update_contact)
        .service(contacts::delete_contact)
        .service(contacts::list_contact_events)
        .service(contacts::add_contact_event)
        .service(deals::list_deals)
        .service(deals::create_deal)
        .service(deals::show_deal)
        .service(deals::update_deal)
        .service(deals::change_stage)
        .service(deals::delete_deal)
        .service(tasks::list_tasks)
        .service(tasks::create_task)
        .service(tasks::complete_task)
        .service(tasks::delete_task)
        .service(integrations::list_integrations)
        .service(integrations::create_integration)
        .service(integrations::update_integration)
        .service(integrations::delete_integration)
        .service(integrations::list_logs)
        .service(integrations::sync_integration)
        .service(automations::list_automations)
        .service(automations::create_automation)
        .service(automations::delete_automation);
}
