//! Diesel models for advertising integrations and the ingestion log.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::integration::{
    AccessToken, AdvertisingIntegration as DomainIntegration, AdvertisingLog as DomainLog,
    AdvertisingPlatform, LogStatus, NewAdvertisingIntegration as DomainNewIntegration,
    NewAdvertisingLog as DomainNewLog,
};
use crate::domain::types::{
    AdvertisingLogId, ContactId, DealId, HubId, IntegrationId, NonEmptyString, TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::advertising_integrations)]
pub struct AdvertisingIntegration {
    pub id: i32,
    pub hub_id: i32,
    pub platform: String,
    pub client_id: String,
    pub client_secret: String,
    pub access_token: Option<String>,
    pub token_expires_at: Option<NaiveDateTime>,
    pub account_id: Option<i64>,
    pub is_active: bool,
    pub create_deals: bool,
    pub last_synced_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::advertising_integrations)]
pub struct NewAdvertisingIntegration<'a> {
    pub hub_id: i32,
    pub platform: &'static str,
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub create_deals: bool,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::advertising_logs)]
pub struct AdvertisingLog {
    pub id: i32,
    pub integration_id: i32,
    pub external_id: String,
    pub status: String,
    pub contact_id: Option<i32>,
    pub deal_id: Option<i32>,
    pub message: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::advertising_logs)]
#[diesel(treat_none_as_null = true)]
pub struct NewAdvertisingLog<'a> {
    pub integration_id: i32,
    pub external_id: &'a str,
    pub status: &'static str,
    pub contact_id: Option<i32>,
    pub deal_id: Option<i32>,
    pub message: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<AdvertisingIntegration> for DomainIntegration {
    type Error = TypeConstraintError;

    fn try_from(row: AdvertisingIntegration) -> Result<Self, Self::Error> {
        let access_token = match (row.access_token, row.token_expires_at) {
            (Some(token), Some(expires_at)) => Some(AccessToken { token, expires_at }),
            _ => None,
        };

        Ok(Self {
            id: IntegrationId::new(row.id)?,
            hub_id: HubId::new(row.hub_id)?,
            platform: row.platform.parse::<AdvertisingPlatform>()?,
            client_id: NonEmptyString::new(row.client_id)?,
            client_secret: NonEmptyString::new(row.client_secret)?,
            access_token,
            account_id: row.account_id,
            is_active: row.is_active,
            create_deals: row.create_deals,
            last_synced_at: row.last_synced_at,
            created_at: row.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewIntegration> for NewAdvertisingIntegration<'a> {
    fn from(integration: &'a DomainNewIntegration) -> Self {
        Self {
            hub_id: integration.hub_id.get(),
            platform: integration.platform.as_str(),
            client_id: integration.client_id.as_str(),
            client_secret: integration.client_secret.as_str(),
            create_deals: integration.create_deals,
        }
    }
}

impl TryFrom<AdvertisingLog> for DomainLog {
    type Error = TypeConstraintError;

    fn try_from(row: AdvertisingLog) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AdvertisingLogId::new(row.id)?,
            integration_id: IntegrationId::new(row.integration_id)?,
            external_id: row.external_id,
            status: row.status.parse::<LogStatus>()?,
            contact_id: row.contact_id.map(ContactId::new).transpose()?,
            deal_id: row.deal_id.map(DealId::new).transpose()?,
            message: row.message,
            created_at: row.created_at,
        })
    }
}

impl<'a> NewAdvertisingLog<'a> {
    pub fn from_domain(log: &'a DomainNewLog, created_at: NaiveDateTime) -> Self {
        Self {
            integration_id: log.integration_id.get(),
            external_id: log.external_id.as_str(),
            status: log.status.as_str(),
            contact_id: log.contact_id.map(ContactId::get),
            deal_id: log.deal_id.map(DealId::get),
            message: log.message.as_deref(),
            created_at,
        }
    }
}
