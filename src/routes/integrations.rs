use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::forms::integrations::{AddIntegrationForm, IntegrationSettingsForm};
use crate::integrations::HttpSettings;
use crate::integrations::avito::AvitoClient;
use crate::models::auth::AuthenticatedUser;
use crate::pagination::PageQuery;
use crate::repository::DieselRepository;
use crate::routes::{blocking, dispatcher};
use crate::services::{ServiceError, integrations};

#[get("/integrations")]
pub async fn list_integrations(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let integrations =
        blocking(move || integrations::list_integrations(repo.get_ref(), &user)).await?;
    Ok(HttpResponse::Ok().json(integrations))
}

#[post("/integrations")]
pub async fn create_integration(
    form: web::Json<AddIntegrationForm>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let integration = blocking(move || {
        integrations::create_integration(repo.get_ref(), &user, form.into_inner())
    })
    .await?;
    Ok(HttpResponse::Created().json(integration))
}

#[put("/integrations/{integration_id}")]
pub async fn update_integration(
    integration_id: web::Path<i32>,
    form: web::Json<IntegrationSettingsForm>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let integration_id = integration_id.into_inner();
    let integration = blocking(move || {
        integrations::update_settings(repo.get_ref(), &user, integration_id, form.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(integration))
}

#[delete("/integrations/{integration_id}")]
pub async fn delete_integration(
    integration_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let integration_id = integration_id.into_inner();
    blocking(move || integrations::delete_integration(repo.get_ref(), &user, integration_id))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/integrations/{integration_id}/logs")]
pub async fn list_logs(
    integration_id: web::Path<i32>,
    params: web::Query<PageQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let integration_id = integration_id.into_inner();
    let logs = blocking(move || {
        integrations::list_logs(repo.get_ref(), &user, integration_id, params.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(logs))
}

/// Runs an Avito sync immediately and returns its report.
#[post("/integrations/{integration_id}/sync")]
pub async fn sync_integration(
    integration_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    settings: web::Data<HttpSettings>,
) -> Result<HttpResponse, ServiceError> {
    let integration_id = integration_id.into_inner();
    let report = blocking(move || {
        let api = AvitoClient::new(settings.build_client()?, settings.avito_api_url.as_str());
        let dispatcher = dispatcher(&settings)?;
        integrations::sync_now(repo.get_ref(), &api, &dispatcher, &user, integration_id)
    })
    .await?;
    Ok(HttpResponse::Ok().json(report))
}
