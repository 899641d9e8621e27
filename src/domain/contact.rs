use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    CompanyName, ContactId, ContactName, Email, ExternalRef, HubId, NonEmptyString, PhoneNumber,
};

/// A person the hub communicates with.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub id: ContactId,
    pub hub_id: HubId,
    pub name: ContactName,
    pub email: Option<Email>,
    pub phone: Option<PhoneNumber>,
    pub company: Option<CompanyName>,
    /// Channel the contact came from (`avito`, `csv`, ...).
    pub source: Option<NonEmptyString>,
    pub external_ref: Option<ExternalRef>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NewContact {
    pub hub_id: HubId,
    pub name: ContactName,
    pub email: Option<Email>,
    pub phone: Option<PhoneNumber>,
    pub company: Option<CompanyName>,
    pub source: Option<NonEmptyString>,
    pub external_ref: Option<ExternalRef>,
}

impl NewContact {
    #[must_use]
    pub fn new(hub_id: HubId, name: ContactName) -> Self {
        Self {
            hub_id,
            name,
            email: None,
            phone: None,
            company: None,
            source: None,
            external_ref: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: Option<Email>) -> Self {
        self.email = email;
        self
    }

    #[must_use]
    pub fn with_phone(mut self, phone: Option<PhoneNumber>) -> Self {
        self.phone = phone;
        self
    }

    #[must_use]
    pub fn with_company(mut self, company: Option<CompanyName>) -> Self {
        self.company = company;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: Option<NonEmptyString>) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_external_ref(mut self, external_ref: Option<ExternalRef>) -> Self {
        self.external_ref = external_ref;
        self
    }
}

/// Full replacement of the editable contact attributes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UpdateContact {
    pub name: ContactName,
    pub email: Option<Email>,
    pub phone: Option<PhoneNumber>,
    pub company: Option<CompanyName>,
}
