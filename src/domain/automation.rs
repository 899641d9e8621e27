//! Automation rules fired on CRM events.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::types::{AutomationId, HubId, NonEmptyString, TypeConstraintError};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AutomationEvent {
    #[serde(rename = "contact.created")]
    ContactCreated,
    #[serde(rename = "lead.created")]
    LeadCreated,
    #[serde(rename = "deal.stage_changed")]
    DealStageChanged,
}

impl AutomationEvent {
    pub const fn as_str(self) -> &'static str {
        match self {
            AutomationEvent::ContactCreated => "contact.created",
            AutomationEvent::LeadCreated => "lead.created",
            AutomationEvent::DealStageChanged => "deal.stage_changed",
        }
    }
}

impl Display for AutomationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutomationEvent {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "contact.created" => Ok(AutomationEvent::ContactCreated),
            "lead.created" => Ok(AutomationEvent::LeadCreated),
            "deal.stage_changed" => Ok(AutomationEvent::DealStageChanged),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown automation event `{other}`"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AutomationChannel {
    /// JSON POST to `target` URL.
    Webhook,
    /// Bot API message to chat `target`; `secret` holds the bot token.
    Telegram,
}

impl AutomationChannel {
    pub const fn as_str(self) -> &'static str {
        match self {
            AutomationChannel::Webhook => "webhook",
            AutomationChannel::Telegram => "telegram",
        }
    }
}

impl Display for AutomationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutomationChannel {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webhook" => Ok(AutomationChannel::Webhook),
            "telegram" => Ok(AutomationChannel::Telegram),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown automation channel `{other}`"
            ))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Automation {
    pub id: AutomationId,
    pub hub_id: HubId,
    pub event: AutomationEvent,
    pub channel: AutomationChannel,
    pub target: NonEmptyString,
    #[serde(skip_serializing)]
    pub secret: Option<NonEmptyString>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewAutomation {
    pub hub_id: HubId,
    pub event: AutomationEvent,
    pub channel: AutomationChannel,
    pub target: NonEmptyString,
    pub secret: Option<NonEmptyString>,
}

/// Event emitted by a service and fanned out to matching automations.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AutomationMessage {
    pub event: AutomationEvent,
    pub hub_id: HubId,
    pub payload: Value,
}

impl AutomationMessage {
    #[must_use]
    pub fn new(event: AutomationEvent, hub_id: HubId, payload: Value) -> Self {
        Self {
            event,
            hub_id,
            payload,
        }
    }
}
