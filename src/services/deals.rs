//! Deal pipeline operations.

use serde_json::json;

use crate::domain::automation::AutomationEvent;
use crate::domain::contact_event::{ContactEventType, NewContactEvent};
use crate::domain::deal::{Deal, DealStage, UpdateDeal};
use crate::domain::types::{ContactId, DealId, HubId};
use crate::dto::deals::DealsQuery;
use crate::forms::deals::{AddDealForm, AddDealPayload, ChangeStageForm, UpdateDealForm};
use crate::integrations::AutomationDispatcher;
use crate::models::auth::AuthenticatedUser;
use crate::pagination::Paginated;
use crate::repository::{
    AutomationReader, ContactEventWriter, ContactReader, DealListQuery, DealReader, DealWriter,
    ManagerWriter,
};
use crate::services::automations::fire_event;
use crate::services::contacts::{current_manager, require_contact};
use crate::services::{ServiceError, ServiceResult, ensure_role};
use crate::{SERVICE_ACCESS_ROLE, SERVICE_ADMIN_ROLE};

pub fn list_deals<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: DealsQuery,
) -> ServiceResult<Paginated<Deal>>
where
    R: DealReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;

    let page = query.page_query();
    let mut list_query =
        DealListQuery::new(HubId::new(user.hub_id)?).paginate(page.page(), page.per_page());
    if let Some(stage) = query.stage.as_deref().filter(|s| !s.trim().is_empty()) {
        list_query = list_query.stage(stage.parse::<DealStage>()?);
    }
    if let Some(contact_id) = query.contact_id {
        list_query = list_query.contact(ContactId::new(contact_id)?);
    }

    let (total, deals) = repo.list_deals(list_query)?;
    Ok(Paginated::new(deals, total, page.page(), page.per_page()))
}

pub fn get_deal<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<Deal>
where
    R: DealReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    repo.get_deal_by_id(DealId::new(id)?, HubId::new(user.hub_id)?)?
        .ok_or(ServiceError::NotFound)
}

/// Opens a deal for a contact of the user's hub.
pub fn create_deal<R>(repo: &R, user: &AuthenticatedUser, form: AddDealForm) -> ServiceResult<Deal>
where
    R: ContactReader + DealWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;

    let hub_id = HubId::new(user.hub_id)?;
    let payload = AddDealPayload::try_from(form)?;
    // Contacts of other hubs must look absent.
    require_contact(repo, hub_id, payload.contact_id)?;

    Ok(repo.create_deal(&payload.into_domain(hub_id))?)
}

pub fn update_deal<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    form: UpdateDealForm,
) -> ServiceResult<Deal>
where
    R: DealWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;

    let updates = UpdateDeal::try_from(form)?;
    Ok(repo.update_deal(DealId::new(id)?, HubId::new(user.hub_id)?, &updates)?)
}

/// Moves a deal to another stage.
///
/// A real transition records a `StageChange` event on the contact and fires
/// `deal.stage_changed`; setting the current stage again is a no-op.
pub fn change_stage<R, D>(
    repo: &R,
    dispatcher: &D,
    user: &AuthenticatedUser,
    id: i32,
    form: ChangeStageForm,
) -> ServiceResult<Deal>
where
    R: DealReader + DealWriter + ContactEventWriter + ManagerWriter + AutomationReader + ?Sized,
    D: AutomationDispatcher + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;

    let hub_id = HubId::new(user.hub_id)?;
    let stage = DealStage::try_from(form)?;
    let deal = repo
        .get_deal_by_id(DealId::new(id)?, hub_id)?
        .ok_or(ServiceError::NotFound)?;

    if deal.stage == stage {
        return Ok(deal);
    }

    let previous = deal.stage;
    let updated = repo.update_deal_stage(deal.id, hub_id, stage)?;

    let manager = current_manager(repo, user)?;
    repo.create_contact_event(&NewContactEvent::new(
        updated.contact_id,
        Some(manager.id),
        ContactEventType::StageChange,
        json!({
            "deal_id": updated.id,
            "title": updated.title,
            "from": previous,
            "to": updated.stage,
        }),
    ))?;

    log::info!(
        "Deal #{} of hub {hub_id} moved from {previous} to {}",
        updated.id,
        updated.stage
    );

    fire_event(
        repo,
        dispatcher,
        hub_id,
        AutomationEvent::DealStageChanged,
        json!({
            "deal_id": updated.id,
            "contact_id": updated.contact_id,
            "title": updated.title,
            "amount": updated.amount,
            "from": previous,
            "to": updated.stage,
        }),
    );

    Ok(updated)
}

pub fn delete_deal<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: DealWriter + ?Sized,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;
    repo.delete_deal(DealId::new(id)?, HubId::new(user.hub_id)?)?;
    Ok(())
}
