use actix_web::{HttpResponse, delete, get, post, web};

use crate::forms::automations::AddAutomationForm;
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::blocking;
use crate::services::{ServiceError, automations};

#[get("/automations")]
pub async fn list_automations(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let automations =
        blocking(move || automations::list_automations(repo.get_ref(), &user)).await?;
    Ok(HttpResponse::Ok().json(automations))
}

#[post("/automations")]
pub async fn create_automation(
    form: web::Json<AddAutomationForm>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let automation = blocking(move || {
        automations::create_automation(repo.get_ref(), &user, form.into_inner())
    })
    .await?;
    Ok(HttpResponse::Created().json(automation))
}

#[delete("/automations/{automation_id}")]
pub async fn delete_automation(
    automation_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let automation_id = automation_id.into_inner();
    blocking(move || automations::delete_automation(repo.get_ref(), &user, automation_id))
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
