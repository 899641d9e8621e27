//! Automation rules and their delivery.

use serde_json::Value;

use crate::SERVICE_ADMIN_ROLE;
use crate::domain::automation::{Automation, AutomationEvent, AutomationMessage};
use crate::domain::types::{AutomationId, HubId};
use crate::forms::automations::{AddAutomationForm, AddAutomationPayload};
use crate::integrations::AutomationDispatcher;
use crate::models::auth::AuthenticatedUser;
use crate::repository::{AutomationReader, AutomationWriter};
use crate::services::{ServiceResult, ensure_role};

pub fn list_automations<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<Automation>>
where
    R: AutomationReader + ?Sized,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;
    Ok(repo.list_automations(HubId::new(user.hub_id)?)?)
}

pub fn create_automation<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: AddAutomationForm,
) -> ServiceResult<Automation>
where
    R: AutomationWriter + ?Sized,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;

    let payload = AddAutomationPayload::try_from(form)?;
    let automation = repo.create_automation(&payload.into_domain(HubId::new(user.hub_id)?))?;

    log::info!(
        "Hub {} added {} automation #{} for {}",
        automation.hub_id,
        automation.channel,
        automation.id,
        automation.event
    );
    Ok(automation)
}

pub fn delete_automation<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: AutomationWriter + ?Sized,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;
    repo.delete_automation(AutomationId::new(id)?, HubId::new(user.hub_id)?)?;
    Ok(())
}

/// Delivers `event` to every active automation of the hub.
///
/// Failures are logged and never propagated; returns the number of
/// successful deliveries.
pub fn fire_event<R, D>(
    repo: &R,
    dispatcher: &D,
    hub_id: HubId,
    event: AutomationEvent,
    payload: Value,
) -> usize
where
    R: AutomationReader + ?Sized,
    D: AutomationDispatcher + ?Sized,
{
    let automations = match repo.list_active_automations(hub_id, event) {
        Ok(automations) => automations,
        Err(err) => {
            log::error!("Failed to load automations for hub {hub_id} and {event}: {err}");
            return 0;
        }
    };

    let message = AutomationMessage::new(event, hub_id, payload);
    let mut delivered = 0;
    for automation in &automations {
        match dispatcher.deliver(automation, &message) {
            Ok(()) => delivered += 1,
            Err(err) => log::warn!(
                "Automation #{} ({} to {}) failed: {err}",
                automation.id,
                automation.channel,
                automation.target
            ),
        }
    }
    delivered
}
