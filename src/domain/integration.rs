//! Advertising platform integrations and their ingestion log.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::contact::{Contact, NewContact};
use crate::domain::deal::Deal;
use crate::domain::types::{
    AdvertisingLogId, Amount, ContactId, DealId, DealTitle, HubId, IntegrationId, NonEmptyString,
    TypeConstraintError,
};

/// Tokens this close to expiry are refreshed before use.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AdvertisingPlatform {
    Avito,
}

impl AdvertisingPlatform {
    pub const fn as_str(self) -> &'static str {
        match self {
            AdvertisingPlatform::Avito => "avito",
        }
    }
}

impl Display for AdvertisingPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdvertisingPlatform {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avito" => Ok(AdvertisingPlatform::Avito),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unsupported advertising platform `{other}`"
            ))),
        }
    }
}

/// Bearer token obtained through the client-credentials grant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: NaiveDateTime,
}

impl AccessToken {
    /// Whether the token can still be used at `now` without a refresh.
    pub fn is_fresh(&self, now: NaiveDateTime) -> bool {
        self.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) > now
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AdvertisingIntegration {
    pub id: IntegrationId,
    pub hub_id: HubId,
    pub platform: AdvertisingPlatform,
    pub client_id: NonEmptyString,
    #[serde(skip_serializing)]
    pub client_secret: NonEmptyString,
    #[serde(skip)]
    pub access_token: Option<AccessToken>,
    /// Platform account the credentials belong to, resolved on first sync.
    pub account_id: Option<i64>,
    pub is_active: bool,
    /// Whether ingested leads also open a deal.
    pub create_deals: bool,
    pub last_synced_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl AdvertisingIntegration {
    /// Returns the stored token when it is still usable at `now`.
    pub fn fresh_token(&self, now: NaiveDateTime) -> Option<&AccessToken> {
        self.access_token.as_ref().filter(|token| token.is_fresh(now))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewAdvertisingIntegration {
    pub hub_id: HubId,
    pub platform: AdvertisingPlatform,
    pub client_id: NonEmptyString,
    pub client_secret: NonEmptyString,
    pub create_deals: bool,
}

/// Toggleable integration settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntegrationSettings {
    pub is_active: bool,
    pub create_deals: bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Processed,
    Skipped,
    Failed,
}

impl LogStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            LogStatus::Processed => "processed",
            LogStatus::Skipped => "skipped",
            LogStatus::Failed => "failed",
        }
    }

    /// Failed items are retried on the next sync, everything else is final.
    pub const fn is_final(self) -> bool {
        !matches!(self, LogStatus::Failed)
    }
}

impl Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogStatus {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processed" => Ok(LogStatus::Processed),
            "skipped" => Ok(LogStatus::Skipped),
            "failed" => Ok(LogStatus::Failed),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown log status `{other}`"
            ))),
        }
    }
}

/// One ingested (or attempted) external item, keyed by `external_id`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AdvertisingLog {
    pub id: AdvertisingLogId,
    pub integration_id: IntegrationId,
    pub external_id: String,
    pub status: LogStatus,
    pub contact_id: Option<ContactId>,
    pub deal_id: Option<DealId>,
    pub message: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewAdvertisingLog {
    pub integration_id: IntegrationId,
    pub external_id: String,
    pub status: LogStatus,
    pub contact_id: Option<ContactId>,
    pub deal_id: Option<DealId>,
    pub message: Option<String>,
}

impl NewAdvertisingLog {
    #[must_use]
    pub fn new(integration_id: IntegrationId, external_id: String, status: LogStatus) -> Self {
        Self {
            integration_id,
            external_id,
            status,
            contact_id: None,
            deal_id: None,
            message: None,
        }
    }

    #[must_use]
    pub fn with_records(mut self, contact_id: Option<ContactId>, deal_id: Option<DealId>) -> Self {
        self.contact_id = contact_id;
        self.deal_id = deal_id;
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Records written for one ingested chat. They are stored together or not at all.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLead {
    pub integration_id: IntegrationId,
    pub external_id: String,
    /// Reused instead when the hub already has a contact with the same
    /// `external_ref`.
    pub contact: NewContact,
    pub deal: Option<LeadDeal>,
    /// Payload of the `Lead` contact event.
    pub event_data: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeadDeal {
    pub title: DealTitle,
    pub amount: Option<Amount>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IngestedLead {
    pub contact: Contact,
    pub contact_created: bool,
    pub deal: Option<Deal>,
}

/// Outcome counters of a single ingestion run.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct SyncReport {
    pub chats_seen: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub contacts_created: usize,
    pub deals_created: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn token_needs_refresh_inside_margin() {
        let now = Utc::now().naive_utc();
        let fresh = AccessToken {
            token: "t".to_string(),
            expires_at: now + Duration::seconds(3600),
        };
        let expiring = AccessToken {
            token: "t".to_string(),
            expires_at: now + Duration::seconds(30),
        };
        assert!(fresh.is_fresh(now));
        assert!(!expiring.is_fresh(now));
    }

    #[test]
    fn only_failed_logs_are_retried() {
        assert!(LogStatus::Processed.is_final());
        assert!(LogStatus::Skipped.is_final());
        assert!(!LogStatus::Failed.is_final());
    }
}
