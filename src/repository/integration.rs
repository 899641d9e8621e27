//! Storage of advertising integrations and their ingestion log.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::domain::contact::Contact;
use crate::domain::contact_event::{ContactEventType, NewContactEvent};
use crate::domain::deal::{Deal, NewDeal};
use crate::domain::integration::{
    AccessToken, AdvertisingIntegration, AdvertisingLog, IngestedLead, IntegrationSettings,
    LogStatus, NewAdvertisingIntegration, NewAdvertisingLog, NewLead,
};
use crate::domain::types::{HubId, IntegrationId};
use crate::models::contact::{Contact as DbContact, NewContact as DbNewContact};
use crate::models::contact_event::NewContactEvent as DbNewContactEvent;
use crate::models::deal::{Deal as DbDeal, NewDeal as DbNewDeal};
use crate::models::integration::{
    AdvertisingIntegration as DbIntegration, AdvertisingLog as DbLog,
    NewAdvertisingIntegration as DbNewIntegration, NewAdvertisingLog as DbNewLog,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    AdvertisingLogListQuery, DieselRepository, IntegrationReader, IntegrationWriter,
};

fn into_domain(rows: Vec<DbIntegration>) -> RepositoryResult<Vec<AdvertisingIntegration>> {
    rows.into_iter()
        .map(AdvertisingIntegration::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(RepositoryError::from)
}

impl IntegrationReader for DieselRepository {
    fn get_integration_by_id(
        &self,
        id: IntegrationId,
        hub_id: HubId,
    ) -> RepositoryResult<Option<AdvertisingIntegration>> {
        use crate::schema::advertising_integrations as integrations;

        let mut conn = self.conn()?;
        let integration = integrations::table
            .filter(integrations::id.eq(id.get()))
            .filter(integrations::hub_id.eq(hub_id.get()))
            .first::<DbIntegration>(&mut conn)
            .optional()?;

        integration
            .map(AdvertisingIntegration::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn list_integrations(&self, hub_id: HubId) -> RepositoryResult<Vec<AdvertisingIntegration>> {
        use crate::schema::advertising_integrations as integrations;

        let mut conn = self.conn()?;
        let rows = integrations::table
            .filter(integrations::hub_id.eq(hub_id.get()))
            .order(integrations::id.asc())
            .load::<DbIntegration>(&mut conn)?;

        into_domain(rows)
    }

    fn list_active_integrations(&self) -> RepositoryResult<Vec<AdvertisingIntegration>> {
        use crate::schema::advertising_integrations as integrations;

        let mut conn = self.conn()?;
        let rows = integrations::table
            .filter(integrations::is_active.eq(true))
            .order(integrations::id.asc())
            .load::<DbIntegration>(&mut conn)?;

        into_domain(rows)
    }

    fn get_advertising_log(
        &self,
        integration_id: IntegrationId,
        external_id: &str,
    ) -> RepositoryResult<Option<AdvertisingLog>> {
        use crate::schema::advertising_logs as logs;

        let mut conn = self.conn()?;
        let log = logs::table
            .filter(logs::integration_id.eq(integration_id.get()))
            .filter(logs::external_id.eq(external_id))
            .first::<DbLog>(&mut conn)
            .optional()?;

        log.map(AdvertisingLog::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn list_advertising_logs(
        &self,
        query: AdvertisingLogListQuery,
    ) -> RepositoryResult<(usize, Vec<AdvertisingLog>)> {
        use crate::schema::advertising_logs as logs;

        let mut conn = self.conn()?;

        let total = logs::table
            .filter(logs::integration_id.eq(query.integration_id.get()))
            .count()
            .get_result::<i64>(&mut conn)? as usize;

        let mut items = logs::table
            .filter(logs::integration_id.eq(query.integration_id.get()))
            .order((logs::created_at.desc(), logs::id.desc()))
            .into_boxed::<diesel::sqlite::Sqlite>();
        if let Some(pagination) = &query.pagination {
            items = items
                .offset(pagination.offset())
                .limit(pagination.limit());
        }

        let logs = items
            .load::<DbLog>(&mut conn)?
            .into_iter()
            .map(AdvertisingLog::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, logs))
    }
}

impl IntegrationWriter for DieselRepository {
    fn create_integration(
        &self,
        new_integration: &NewAdvertisingIntegration,
    ) -> RepositoryResult<AdvertisingIntegration> {
        use crate::schema::advertising_integrations as integrations;

        let mut conn = self.conn()?;
        let insertable: DbNewIntegration = new_integration.into();

        let integration = diesel::insert_into(integrations::table)
            .values(&insertable)
            .get_result::<DbIntegration>(&mut conn)?;

        Ok(AdvertisingIntegration::try_from(integration)?)
    }

    fn update_integration_settings(
        &self,
        id: IntegrationId,
        hub_id: HubId,
        settings: IntegrationSettings,
    ) -> RepositoryResult<AdvertisingIntegration> {
        use crate::schema::advertising_integrations as integrations;

        let mut conn = self.conn()?;
        let integration = diesel::update(
            integrations::table
                .filter(integrations::id.eq(id.get()))
                .filter(integrations::hub_id.eq(hub_id.get())),
        )
        .set((
            integrations::is_active.eq(settings.is_active),
            integrations::create_deals.eq(settings.create_deals),
        ))
        .get_result::<DbIntegration>(&mut conn)?;

        Ok(AdvertisingIntegration::try_from(integration)?)
    }

    fn delete_integration(&self, id: IntegrationId, hub_id: HubId) -> RepositoryResult<()> {
        use crate::schema::advertising_integrations as integrations;

        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            integrations::table
                .filter(integrations::id.eq(id.get()))
                .filter(integrations::hub_id.eq(hub_id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn store_access_token(&self, id: IntegrationId, token: &AccessToken) -> RepositoryResult<()> {
        use crate::schema::advertising_integrations as integrations;

        let mut conn = self.conn()?;
        diesel::update(integrations::table.find(id.get()))
            .set((
                integrations::access_token.eq(Some(token.token.as_str())),
                integrations::token_expires_at.eq(Some(token.expires_at)),
            ))
            .execute(&mut conn)?;
        Ok(())
    }

    fn store_account_id(&self, id: IntegrationId, account_id: i64) -> RepositoryResult<()> {
        use crate::schema::advertising_integrations as integrations;

        let mut conn = self.conn()?;
        diesel::update(integrations::table.find(id.get()))
            .set(integrations::account_id.eq(Some(account_id)))
            .execute(&mut conn)?;
        Ok(())
    }

    fn mark_integration_synced(
        &self,
        id: IntegrationId,
        synced_at: NaiveDateTime,
    ) -> RepositoryResult<()> {
        use crate::schema::advertising_integrations as integrations;

        let mut conn = self.conn()?;
        diesel::update(integrations::table.find(id.get()))
            .set(integrations::last_synced_at.eq(Some(synced_at)))
            .execute(&mut conn)?;
        Ok(())
    }

    fn record_advertising_log(&self, log: &NewAdvertisingLog) -> RepositoryResult<AdvertisingLog> {
        use crate::schema::advertising_logs as logs;

        let mut conn = self.conn()?;
        let row = DbNewLog::from_domain(log, Utc::now().naive_utc());

        let log = diesel::insert_into(logs::table)
            .values(&row)
            .on_conflict((logs::integration_id, logs::external_id))
            .do_update()
            .set(&row)
            .get_result::<DbLog>(&mut conn)?;

        Ok(AdvertisingLog::try_from(log)?)
    }

    fn ingest_lead(&self, lead: &NewLead) -> RepositoryResult<IngestedLead> {
        use crate::schema::{advertising_logs as logs, contact_events, contacts, deals};

        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();

        conn.transaction::<IngestedLead, RepositoryError, _>(|conn| {
            let existing = match &lead.contact.external_ref {
                Some(external_ref) => contacts::table
                    .filter(contacts::hub_id.eq(lead.contact.hub_id.get()))
                    .filter(contacts::external_ref.eq(external_ref.as_str()))
                    .first::<DbContact>(conn)
                    .optional()?,
                None => None,
            };
            let contact_created = existing.is_none();
            let contact = match existing {
                Some(contact) => contact,
                None => {
                    let insertable: DbNewContact = (&lead.contact).into();
                    diesel::insert_into(contacts::table)
                        .values(&insertable)
                        .get_result::<DbContact>(conn)?
                }
            };
            let contact = Contact::try_from(contact)?;

            let deal = match &lead.deal {
                Some(deal) => {
                    let new_deal =
                        NewDeal::new(contact.hub_id, contact.id, deal.title.clone(), deal.amount);
                    let insertable: DbNewDeal = (&new_deal).into();
                    let deal = diesel::insert_into(deals::table)
                        .values(&insertable)
                        .get_result::<DbDeal>(conn)?;
                    Some(Deal::try_from(deal)?)
                }
                None => None,
            };

            let event = NewContactEvent::new(
                contact.id,
                None,
                ContactEventType::Lead,
                lead.event_data.clone(),
            );
            let insertable: DbNewContactEvent = (&event).into();
            diesel::insert_into(contact_events::table)
                .values(&insertable)
                .execute(conn)?;

            let log = NewAdvertisingLog::new(
                lead.integration_id,
                lead.external_id.clone(),
                LogStatus::Processed,
            )
            .with_records(Some(contact.id), deal.as_ref().map(|deal| deal.id));
            let row = DbNewLog::from_domain(&log, now);
            diesel::insert_into(logs::table)
                .values(&row)
                .on_conflict((logs::integration_id, logs::external_id))
                .do_update()
                .set(&row)
                .execute(conn)?;

            Ok(IngestedLead {
                contact,
                contact_created,
                deal,
            })
        })
    }
}
