use std::collections::{HashMap, HashSet};

use diesel::prelude::*;

use crate::domain::contact_event::{ContactEvent, NewContactEvent};
use crate::domain::manager::Manager;
use crate::models::contact_event::{
    ContactEvent as DbContactEvent, NewContactEvent as DbNewContactEvent,
};
use crate::models::manager::Manager as DbManager;
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    ContactEventListQuery, ContactEventReader, ContactEventWriter, DieselRepository,
};

impl ContactEventReader for DieselRepository {
    fn list_contact_events(
        &self,
        query: ContactEventListQuery,
    ) -> RepositoryResult<(usize, Vec<(ContactEvent, Option<Manager>)>)> {
        use crate::schema::{contact_events, managers};

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = contact_events::table
                .filter(contact_events::contact_id.eq(query.contact_id.get()))
                .into_boxed::<diesel::sqlite::Sqlite>();

            if let Some(event_type) = &query.event_type {
                items = items.filter(contact_events::event_type.eq(event_type.to_string()));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order((
            contact_events::created_at.desc(),
            contact_events::id.desc(),
        ));
        if let Some(pagination) = &query.pagination {
            items = items
                .offset(pagination.offset())
                .limit(pagination.limit());
        }

        let db_events = items.load::<DbContactEvent>(&mut conn)?;

        // Authors are loaded in one query instead of per event.
        let manager_ids: Vec<i32> = db_events
            .iter()
            .filter_map(|event| event.manager_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let manager_map = managers::table
            .filter(managers::id.eq_any(manager_ids))
            .load::<DbManager>(&mut conn)?
            .into_iter()
            .map(|manager| Ok((manager.id, Manager::try_from(manager)?)))
            .collect::<RepositoryResult<HashMap<i32, Manager>>>()?;

        let combined = db_events
            .into_iter()
            .map(|event| {
                let manager = event
                    .manager_id
                    .and_then(|id| manager_map.get(&id))
                    .cloned();
                Ok((ContactEvent::try_from(event)?, manager))
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, combined))
    }
}

impl ContactEventWriter for DieselRepository {
    fn create_contact_event(&self, event: &NewContactEvent) -> RepositoryResult<ContactEvent> {
        use crate::schema::contact_events;

        let mut conn = self.conn()?;
        let insertable: DbNewContactEvent = event.into();

        let event = diesel::insert_into(contact_events::table)
            .values(&insertable)
            .get_result::<DbContactEvent>(&mut conn)?;

        Ok(ContactEvent::try_from(event)?)
    }
}
