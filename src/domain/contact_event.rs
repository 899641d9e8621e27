use std::fmt::Display;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::types::{ContactEventId, ContactId, ManagerId};

/// Entry of a contact's activity timeline.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ContactEvent {
    pub id: ContactEventId,
    pub contact_id: ContactId,
    /// Author of the event; `None` for events produced by integrations.
    pub manager_id: Option<ManagerId>,
    pub event_type: ContactEventType,
    pub event_data: Value,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum ContactEventType {
    Comment,
    Call,
    Email,
    Lead,
    StageChange,
    Task,
    Other(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewContactEvent {
    pub contact_id: ContactId,
    pub manager_id: Option<ManagerId>,
    pub event_type: ContactEventType,
    pub event_data: Value,
}

impl NewContactEvent {
    #[must_use]
    pub fn new(
        contact_id: ContactId,
        manager_id: Option<ManagerId>,
        event_type: ContactEventType,
        event_data: Value,
    ) -> Self {
        Self {
            contact_id,
            manager_id,
            event_type,
            event_data,
        }
    }
}

impl Display for ContactEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactEventType::Comment => write!(f, "Comment"),
            ContactEventType::Call => write!(f, "Call"),
            ContactEventType::Email => write!(f, "Email"),
            ContactEventType::Lead => write!(f, "Lead"),
            ContactEventType::StageChange => write!(f, "StageChange"),
            ContactEventType::Task => write!(f, "Task"),
            ContactEventType::Other(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for ContactEventType {
    fn from(s: &str) -> Self {
        match s {
            "Comment" => ContactEventType::Comment,
            "Call" => ContactEventType::Call,
            "Email" => ContactEventType::Email,
            "Lead" => ContactEventType::Lead,
            "StageChange" => ContactEventType::StageChange,
            "Task" => ContactEventType::Task,
            _ => ContactEventType::Other(s.to_string()),
        }
    }
}

impl From<String> for ContactEventType {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

impl From<ContactEventType> for String {
    fn from(value: ContactEventType) -> Self {
        value.to_string()
    }
}
