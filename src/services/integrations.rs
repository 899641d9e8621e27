//! Management of advertising platform connections.

use chrono::Utc;

use crate::SERVICE_ADMIN_ROLE;
use crate::domain::integration::{AdvertisingIntegration, AdvertisingLog, SyncReport};
use crate::domain::types::{HubId, IntegrationId};
use crate::forms::integrations::{AddIntegrationForm, AddIntegrationPayload, IntegrationSettingsForm};
use crate::integrations::AutomationDispatcher;
use crate::integrations::avito::AvitoApi;
use crate::models::auth::AuthenticatedUser;
use crate::pagination::{PageQuery, Paginated};
use crate::repository::errors::RepositoryError;
use crate::repository::{AdvertisingLogListQuery, IntegrationReader, IntegrationWriter};
use crate::services::avito_sync::{SyncRepository, sync_integration};
use crate::services::{ServiceError, ServiceResult, ensure_role};

fn require_integration<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
) -> ServiceResult<AdvertisingIntegration>
where
    R: IntegrationReader + ?Sized,
{
    repo.get_integration_by_id(IntegrationId::new(id)?, HubId::new(user.hub_id)?)?
        .ok_or(ServiceError::NotFound)
}

pub fn list_integrations<R>(
    repo: &R,
    user: &AuthenticatedUser,
) -> ServiceResult<Vec<AdvertisingIntegration>>
where
    R: IntegrationReader + ?Sized,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;
    Ok(repo.list_integrations(HubId::new(user.hub_id)?)?)
}

pub fn create_integration<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: AddIntegrationForm,
) -> ServiceResult<AdvertisingIntegration>
where
    R: IntegrationWriter + ?Sized,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;

    let payload = AddIntegrationPayload::try_from(form)?;
    let integration = repo
        .create_integration(&payload.into_domain(HubId::new(user.hub_id)?))
        .map_err(|err| match err {
            RepositoryError::Duplicate(_) => {
                ServiceError::Conflict("these credentials are already connected".to_string())
            }
            other => other.into(),
        })?;

    log::info!(
        "Hub {} connected {} integration #{}",
        integration.hub_id,
        integration.platform,
        integration.id
    );
    Ok(integration)
}

pub fn update_settings<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: IntegrationSettingsForm,
) -> ServiceResult<AdvertisingIntegration>
where
    R: IntegrationWriter + ?Sized,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;
    Ok(repo.update_integration_settings(
        IntegrationId::new(id)?,
        HubId::new(user.hub_id)?,
        form.into(),
    )?)
}

pub fn delete_integration<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: IntegrationWriter + ?Sized,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;
    repo.delete_integration(IntegrationId::new(id)?, HubId::new(user.hub_id)?)?;
    Ok(())
}

/// Ingestion log of an integration, newest first.
pub fn list_logs<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    page: PageQuery,
) -> ServiceResult<Paginated<AdvertisingLog>>
where
    R: IntegrationReader + ?Sized,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;

    let integration = require_integration(repo, user, id)?;
    let query =
        AdvertisingLogListQuery::new(integration.id).paginate(page.page(), page.per_page());
    let (total, logs) = repo.list_advertising_logs(query)?;
    Ok(Paginated::new(logs, total, page.page(), page.per_page()))
}

/// Runs an ingestion pass right away instead of waiting for the worker.
pub fn sync_now<R, A, D>(
    repo: &R,
    api: &A,
    dispatcher: &D,
    user: &AuthenticatedUser,
    id: i32,
) -> ServiceResult<SyncReport>
where
    R: SyncRepository + ?Sized,
    A: AvitoApi + ?Sized,
    D: AutomationDispatcher + ?Sized,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;

    let integration = require_integration(repo, user, id)?;
    if !integration.is_active {
        return Err(ServiceError::Form("integration is disabled".to_string()));
    }

    sync_integration(repo, api, dispatcher, &integration, Utc::now().naive_utc())
}
