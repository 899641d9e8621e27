use chrono::Utc;
use diesel::prelude::*;

use crate::domain::contact::{Contact, NewContact, UpdateContact};
use crate::domain::types::{ContactId, Email, ExternalRef, HubId};
use crate::models::contact::{
    Contact as DbContact, NewContact as DbNewContact, UpdateContact as DbUpdateContact,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{ContactListQuery, ContactReader, ContactWriter, DieselRepository};

impl ContactReader for DieselRepository {
    fn get_contact_by_id(&self, id: ContactId, hub_id: HubId) -> RepositoryResult<Option<Contact>> {
        use crate::schema::contacts;

        let mut conn = self.conn()?;
        let contact = contacts::table
            .filter(contacts::id.eq(id.get()))
            .filter(contacts::hub_id.eq(hub_id.get()))
            .first::<DbContact>(&mut conn)
            .optional()?;

        contact
            .map(Contact::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn get_contact_by_email(
        &self,
        email: &Email,
        hub_id: HubId,
    ) -> RepositoryResult<Option<Contact>> {
        use crate::schema::contacts;

        let mut conn = self.conn()?;
        let contact = contacts::table
            .filter(contacts::email.eq(email.as_str()))
            .filter(contacts::hub_id.eq(hub_id.get()))
            .first::<DbContact>(&mut conn)
            .optional()?;

        contact
            .map(Contact::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn get_contact_by_external_ref(
        &self,
        external_ref: &ExternalRef,
        hub_id: HubId,
    ) -> RepositoryResult<Option<Contact>> {
        use crate::schema::contacts;

        let mut conn = self.conn()?;
        let contact = contacts::table
            .filter(contacts::external_ref.eq(external_ref.as_str()))
            .filter(contacts::hub_id.eq(hub_id.get()))
            .first::<DbContact>(&mut conn)
            .optional()?;

        contact
            .map(Contact::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn list_contacts(&self, query: ContactListQuery) -> RepositoryResult<(usize, Vec<Contact>)> {
        use crate::schema::contacts;

        let mut conn = self.conn()?;

        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| format!("%{term}%"));

        let query_builder = || {
            let mut items = contacts::table
                .filter(contacts::hub_id.eq(query.hub_id.get()))
                .into_boxed::<diesel::sqlite::Sqlite>();

            if let Some(pattern) = &pattern {
                items = items.filter(
                    contacts::name
                        .like(pattern.clone())
                        .or(contacts::email.like(pattern.clone()))
                        .or(contacts::phone.like(pattern.clone()))
                        .or(contacts::company.like(pattern.clone())),
                );
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order((contacts::name.asc(), contacts::id.asc()));
        if let Some(pagination) = &query.pagination {
            items = items
                .offset(pagination.offset())
                .limit(pagination.limit());
        }

        let contacts = items
            .load::<DbContact>(&mut conn)?
            .into_iter()
            .map(Contact::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, contacts))
    }
}

impl ContactWriter for DieselRepository {
    fn create_contact(&self, new_contact: &NewContact) -> RepositoryResult<Contact> {
        use crate::schema::contacts;

        let mut conn = self.conn()?;
        let insertable: DbNewContact = new_contact.into();

        let contact = diesel::insert_into(contacts::table)
            .values(&insertable)
            .get_result::<DbContact>(&mut conn)?;

        Ok(Contact::try_from(contact)?)
    }

    fn create_contacts(&self, new_contacts: &[NewContact]) -> RepositoryResult<usize> {
        use crate::schema::contacts;

        let mut conn = self.conn()?;
        let insertables: Vec<DbNewContact> = new_contacts.iter().map(Into::into).collect();

        conn.transaction::<usize, diesel::result::Error, _>(|conn| {
            let mut inserted = 0;
            for insertable in &insertables {
                inserted += diesel::insert_or_ignore_into(contacts::table)
                    .values(insertable)
                    .execute(conn)?;
            }
            Ok(inserted)
        })
        .map_err(RepositoryError::from)
    }

    fn update_contact(
        &self,
        id: ContactId,
        hub_id: HubId,
        updates: &UpdateContact,
    ) -> RepositoryResult<Contact> {
        use crate::schema::contacts;

        let mut conn = self.conn()?;
        let changes = DbUpdateContact::from_domain(updates, Utc::now().naive_utc());

        let contact = diesel::update(
            contacts::table
                .filter(contacts::id.eq(id.get()))
                .filter(contacts::hub_id.eq(hub_id.get())),
        )
        .set(&changes)
        .get_result::<DbContact>(&mut conn)?;

        Ok(Contact::try_from(contact)?)
    }

    fn delete_contact(&self, id: ContactId, hub_id: HubId) -> RepositoryResult<()> {
        use crate::schema::contacts;

        let mut conn = self.conn()?;
        // Deals, tasks and events go with the contact through cascading keys.
        let deleted = diesel::delete(
            contacts::table
                .filter(contacts::id.eq(id.get()))
                .filter(contacts::hub_id.eq(hub_id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
