use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::automation::{
    Automation as DomainAutomation, AutomationChannel, AutomationEvent,
    NewAutomation as DomainNewAutomation,
};
use crate::domain::types::{AutomationId, HubId, NonEmptyString, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::automations)]
pub struct Automation {
    pub id: i32,
    pub hub_id: i32,
    pub event: String,
    pub channel: String,
    pub target: String,
    pub secret: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::automations)]
pub struct NewAutomation<'a> {
    pub hub_id: i32,
    pub event: &'static str,
    pub channel: &'static str,
    pub target: &'a str,
    pub secret: Option<&'a str>,
}

impl TryFrom<Automation> for DomainAutomation {
    type Error = TypeConstraintError;

    fn try_from(row: Automation) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AutomationId::new(row.id)?,
            hub_id: HubId::new(row.hub_id)?,
            event: row.event.parse::<AutomationEvent>()?,
            channel: row.channel.parse::<AutomationChannel>()?,
            target: NonEmptyString::new(row.target)?,
            secret: row.secret.map(NonEmptyString::new).transpose()?,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewAutomation> for NewAutomation<'a> {
    fn from(automation: &'a DomainNewAutomation) -> Self {
        Self {
            hub_id: automation.hub_id.get(),
            event: automation.event.as_str(),
            channel: automation.channel.as_str(),
            target: automation.target.as_str(),
            secret: automation.secret.as_ref().map(NonEmptyString::as_str),
        }
    }
}
