//! Diesel models for storing contact activity events.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::contact_event::{
    ContactEvent as DomainContactEvent, NewContactEvent as DomainNewContactEvent,
};
use crate::domain::types::{ContactEventId, ContactId, ManagerId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::contact_events)]
pub struct ContactEvent {
    pub id: i32,
    pub contact_id: i32,
    pub manager_id: Option<i32>,
    pub event_type: String,
    pub event_data: String, // JSON text
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::contact_events)]
pub struct NewContactEvent {
    pub contact_id: i32,
    pub manager_id: Option<i32>,
    pub event_type: String,
    pub event_data: String,
}

impl TryFrom<ContactEvent> for DomainContactEvent {
    type Error = TypeConstraintError;

    fn try_from(event: ContactEvent) -> Result<Self, Self::Error> {
        let event_data = serde_json::from_str(&event.event_data).unwrap_or_default();

        Ok(Self {
            id: ContactEventId::new(event.id)?,
            contact_id: ContactId::new(event.contact_id)?,
            manager_id: event.manager_id.map(ManagerId::new).transpose()?,
            event_type: event.event_type.into(),
            event_data,
            created_at: event.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewContactEvent> for NewContactEvent {
    fn from(event: &'a DomainNewContactEvent) -> Self {
        Self {
            contact_id: event.contact_id.get(),
            manager_id: event.manager_id.map(ManagerId::get),
            event_type: event.event_type.to_string(),
            event_data: event.event_data.to_string(),
        }
    }
}
