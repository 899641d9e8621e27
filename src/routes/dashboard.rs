use actix_web::{HttpResponse, get, web};

use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::blocking;
use crate::services::{ServiceError, dashboard};

#[get("/dashboard")]
pub async fn show_dashboard(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let summary = blocking(move || dashboard::summary(repo.get_ref(), &user)).await?;
    Ok(HttpResponse::Ok().json(summary))
}
