//! Contact management and activity timeline.

use std::io::Read;

use serde_json::json;

use crate::domain::automation::AutomationEvent;
use crate::domain::contact::Contact;
use crate::domain::contact_event::ContactEvent;
use crate::domain::manager::{Manager, NewManager};
use crate::domain::types::{ContactId, HubId};
use crate::dto::contacts::{ContactEventView, ContactsQuery, ImportSummary};
use crate::forms::contacts::{
    ContactEventForm, ContactEventPayload, ContactForm, ContactPayload, MANUAL_SOURCE,
    parse_contacts_csv,
};
use crate::integrations::AutomationDispatcher;
use crate::models::auth::AuthenticatedUser;
use crate::pagination::{PageQuery, Paginated};
use crate::repository::errors::RepositoryError;
use crate::repository::{
    AutomationReader, ContactEventListQuery, ContactEventReader, ContactEventWriter,
    ContactListQuery, ContactReader, ContactWriter, ManagerWriter,
};
use crate::services::automations::fire_event;
use crate::services::{ServiceError, ServiceResult, ensure_role};
use crate::{SERVICE_ACCESS_ROLE, SERVICE_ADMIN_ROLE};

fn duplicate_email(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Duplicate(_) => {
            ServiceError::Conflict("a contact with this email already exists".to_string())
        }
        other => other.into(),
    }
}

/// Upserts the manager row of the acting user, used as event author.
pub(crate) fn current_manager<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Manager>
where
    R: ManagerWriter + ?Sized,
{
    let new_manager = NewManager::try_from(user)?;
    repo.create_or_update_manager(&new_manager).map_err(|err| {
        log::error!("Failed to update manager {}: {err}", user.email);
        ServiceError::from(err)
    })
}

/// Loads a contact of the user's hub or fails with `NotFound`.
pub(crate) fn require_contact<R>(repo: &R, hub_id: HubId, id: ContactId) -> ServiceResult<Contact>
where
    R: ContactReader + ?Sized,
{
    repo.get_contact_by_id(id, hub_id)?
        .ok_or(ServiceError::NotFound)
}

pub fn list_contacts<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: ContactsQuery,
) -> ServiceResult<Paginated<Contact>>
where
    R: ContactReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;

    let page = query.page_query();
    let mut list_query =
        ContactListQuery::new(HubId::new(user.hub_id)?).paginate(page.page(), page.per_page());
    if let Some(term) = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    {
        list_query = list_query.search(term);
    }

    let (total, contacts) = repo.list_contacts(list_query)?;
    Ok(Paginated::new(contacts, total, page.page(), page.per_page()))
}

pub fn get_contact<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<Contact>
where
    R: ContactReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    require_contact(repo, HubId::new(user.hub_id)?, ContactId::new(id)?)
}

/// Creates a contact and fires `contact.created`.
pub fn create_contact<R, D>(
    repo: &R,
    dispatcher: &D,
    user: &AuthenticatedUser,
    form: ContactForm,
) -> ServiceResult<Contact>
where
    R: ContactWriter + AutomationReader + ?Sized,
    D: AutomationDispatcher + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;

    let hub_id = HubId::new(user.hub_id)?;
    let new_contact = ContactPayload::try_from(form)?.into_new_contact(hub_id, MANUAL_SOURCE);

    let contact = repo.create_contact(&new_contact).map_err(duplicate_email)?;

    fire_event(
        repo,
        dispatcher,
        hub_id,
        AutomationEvent::ContactCreated,
        json!({
            "contact_id": contact.id,
            "name": contact.name,
            "email": contact.email,
            "phone": contact.phone,
            "source": contact.source,
        }),
    );

    Ok(contact)
}

pub fn update_contact<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: ContactForm,
) -> ServiceResult<Contact>
where
    R: ContactWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;

    let updates = ContactPayload::try_from(form)?.into_update();
    repo.update_contact(ContactId::new(id)?, HubId::new(user.hub_id)?, &updates)
        .map_err(duplicate_email)
}

pub fn delete_contact<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: ContactWriter + ?Sized,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;
    repo.delete_contact(ContactId::new(id)?, HubId::new(user.hub_id)?)?;
    Ok(())
}

/// Bulk-creates contacts from CSV; rows with emails already known to the hub
/// are skipped.
pub fn import_contacts<R, S>(
    repo: &R,
    user: &AuthenticatedUser,
    source: S,
) -> ServiceResult<ImportSummary>
where
    R: ContactWriter + ?Sized,
    S: Read,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;

    let contacts = parse_contacts_csv(source, HubId::new(user.hub_id)?).map_err(|err| {
        log::warn!("Rejected contacts upload: {err}");
        ServiceError::from(err)
    })?;

    let imported = repo.create_contacts(&contacts).map_err(|err| {
        log::error!("Failed to import contacts: {err}");
        ServiceError::from(err)
    })?;

    log::info!(
        "Hub {} imported {imported} of {} contacts",
        user.hub_id,
        contacts.len()
    );

    Ok(ImportSummary {
        parsed: contacts.len(),
        imported,
    })
}

/// Timeline of a contact, newest first.
pub fn list_contact_events<R>(
    repo: &R,
    user: &AuthenticatedUser,
    contact_id: i32,
    page: PageQuery,
) -> ServiceResult<Paginated<ContactEventView>>
where
    R: ContactReader + ContactEventReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;

    let contact = require_contact(repo, HubId::new(user.hub_id)?, ContactId::new(contact_id)?)?;

    let (total, events) = repo.list_contact_events(
        ContactEventListQuery::new(contact.id).paginate(page.page(), page.per_page()),
    )?;

    Ok(Paginated::new(events, total, page.page(), page.per_page()).map(ContactEventView::from))
}

/// Records a comment, call or other manual activity authored by the user.
pub fn add_contact_event<R>(
    repo: &R,
    user: &AuthenticatedUser,
    contact_id: i32,
    form: ContactEventForm,
) -> ServiceResult<ContactEvent>
where
    R: ContactReader + ContactEventWriter + ManagerWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;

    let payload = ContactEventPayload::try_from(form)?;
    let contact = require_contact(repo, HubId::new(user.hub_id)?, ContactId::new(contact_id)?)?;
    let manager = current_manager(repo, user)?;

    Ok(repo.create_contact_event(&payload.into_domain(contact.id, manager.id))?)
}
