use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::dto::deals::DealsQuery;
use crate::forms::deals::{AddDealForm, ChangeStageForm, UpdateDealForm};
use crate::integrations::HttpSettings;
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::{blocking, dispatcher};
use crate::services::{ServiceError, deals};

#[get("/deals")]
pub async fn list_deals(
    params: web::Query<DealsQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let deals =
        blocking(move || deals::list_deals(repo.get_ref(), &user, params.into_inner())).await?;
    Ok(HttpResponse::Ok().json(deals))
}

#[post("/deals")]
pub async fn create_deal(
    form: web::Json<AddDealForm>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let deal =
        blocking(move || deals::create_deal(repo.get_ref(), &user, form.into_inner())).await?;
    Ok(HttpResponse::Created().json(deal))
}

#[get("/deals/{deal_id}")]
pub async fn show_deal(
    deal_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let deal_id = deal_id.into_inner();
    let deal = blocking(move || deals::get_deal(repo.get_ref(), &user, deal_id)).await?;
    Ok(HttpResponse::Ok().json(deal))
}

#[put("/deals/{deal_id}")]
pub async fn update_deal(
    deal_id: web::Path<i32>,
    form: web::Json<UpdateDealForm>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let deal_id = deal_id.into_inner();
    let deal =
        blocking(move || deals::update_deal(repo.get_ref(), &user, deal_id, form.into_inner()))
            .await?;
    Ok(HttpResponse::Ok().json(deal))
}

#[post("/deals/{deal_id}/stage")]
pub async fn change_stage(
    deal_id: web::Path<i32>,
    form: web::Json<ChangeStageForm>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    settings: web::Data<HttpSettings>,
) -> Result<HttpResponse, ServiceError> {
    let deal_id = deal_id.into_inner();
    let deal = blocking(move || {
        let dispatcher = dispatcher(&settings)?;
        deals::change_stage(
            repo.get_ref(),
            &dispatcher,
            &user,
            deal_id,
            form.into_inner(),
        )
    })
    .await?;
    Ok(HttpResponse::Ok().json(deal))
}

#[delete("/deals/{deal_id}")]
pub async fn delete_deal(
    deal_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let deal_id = deal_id.into_inner();
    blocking(move || deals::delete_deal(repo.get_ref(), &user, deal_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}
