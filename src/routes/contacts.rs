use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::dto::contacts::ContactsQuery;
use crate::forms::contacts::{ContactEventForm, ContactForm, UploadContactsForm};
use crate::integrations::HttpSettings;
use crate::models::auth::AuthenticatedUser;
use crate::pagination::PageQuery;
use crate::repository::DieselRepository;
use crate::routes::{blocking, dispatcher};
use crate::services::{ServiceError, contacts};

#[get("/contacts")]
pub async fn list_contacts(
    params: web::Query<ContactsQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let contacts =
        blocking(move || contacts::list_contacts(repo.get_ref(), &user, params.into_inner()))
            .await?;
    Ok(HttpResponse::Ok().json(contacts))
}

#[post("/contacts")]
pub async fn create_contact(
    form: web::Json<ContactForm>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    settings: web::Data<HttpSettings>,
) -> Result<HttpResponse, ServiceError> {
    let contact = blocking(move || {
        let dispatcher = dispatcher(&settings)?;
        contacts::create_contact(repo.get_ref(), &dispatcher, &user, form.into_inner())
    })
    .await?;
    Ok(HttpResponse::Created().json(contact))
}

/// Bulk import from a multipart `csv` file.
#[post("/contacts/import")]
pub async fn import_contacts(
    MultipartForm(form): MultipartForm<UploadContactsForm>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let summary = blocking(move || {
        let file = form.open()?;
        contacts::import_contacts(repo.get_ref(), &user, file)
    })
    .await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[get("/contacts/{contact_id}")]
pub async fn show_contact(
    contact_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let contact_id = contact_id.into_inner();
    let contact = blocking(move || contacts::get_contact(repo.get_ref(), &user, contact_id)).await?;
    Ok(HttpResponse::Ok().json(contact))
}

#[put("/contacts/{contact_id}")]
pub async fn update_contact(
    contact_id: web::Path<i32>,
    form: web::Json<ContactForm>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let contact_id = contact_id.into_inner();
    let contact = blocking(move || {
        contacts::update_contact(repo.get_ref(), &user, contact_id, form.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(contact))
}

#[delete("/contacts/{contact_id}")]
pub async fn delete_contact(
    contact_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let contact_id = contact_id.into_inner();
    blocking(move || contacts::delete_contact(repo.get_ref(), &user, contact_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/contacts/{contact_id}/events")]
pub async fn list_contact_events(
    contact_id: web::Path<i32>,
    params: web::Query<PageQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let contact_id = contact_id.into_inner();
    let events = blocking(move || {
        contacts::list_contact_events(repo.get_ref(), &user, contact_id, params.into_inner())
    })
    .await?;
    Ok(HttpResponse::Ok().json(events))
}

#[post("/contacts/{contact_id}/events")]
pub async fn add_contact_event(
    contact_id: web::Path<i32>,
    form: web::Json<ContactEventForm>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let contact_id = contact_id.into_inner();
    let event = blocking(move || {
        contacts::add_contact_event(repo.get_ref(), &user, contact_id, form.into_inner())
    })
    .await?;
    Ok(HttpResponse::Created().json(event))
}
