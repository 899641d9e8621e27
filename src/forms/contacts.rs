use std::io::Read;

use actix_multipart::form::{MultipartForm, tempfile::TempFile};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::domain::contact::{NewContact, UpdateContact};
use crate::domain::contact_event::{ContactEventType, NewContactEvent};
use crate::domain::types::{
    CompanyName, ContactId, ContactName, Email, HubId, ManagerId, NonEmptyString, PhoneNumber,
    SanitizedText,
};
use crate::forms::{FormError, non_blank};

/// Source recorded for contacts created by hand.
pub const MANUAL_SOURCE: &str = "manual";
/// Source recorded for contacts imported from CSV.
pub const CSV_SOURCE: &str = "csv";

#[derive(Debug, Deserialize, Validate)]
/// JSON body for creating or replacing a contact.
pub struct ContactForm {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub company: Option<String>,
}

/// Validated contact attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactPayload {
    pub name: ContactName,
    pub email: Option<Email>,
    pub phone: Option<PhoneNumber>,
    pub company: Option<CompanyName>,
}

impl TryFrom<ContactForm> for ContactPayload {
    type Error = FormError;

    fn try_from(form: ContactForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            name: ContactName::new(form.name).map_err(|_| FormError::InvalidName)?,
            email: non_blank(form.email)
                .map(Email::new)
                .transpose()
                .map_err(|_| FormError::InvalidEmail)?,
            phone: non_blank(form.phone)
                .map(PhoneNumber::new)
                .transpose()
                .map_err(|_| FormError::InvalidPhoneNumber)?,
            company: non_blank(form.company)
                .map(CompanyName::new)
                .transpose()?,
        })
    }
}

impl ContactPayload {
    pub fn into_new_contact(self, hub_id: HubId, source: &str) -> NewContact {
        NewContact::new(hub_id, self.name)
            .with_email(self.email)
            .with_phone(self.phone)
            .with_company(self.company)
            .with_source(NonEmptyString::new(source).ok())
    }

    pub fn into_update(self) -> UpdateContact {
        UpdateContact {
            name: self.name,
            email: self.email,
            phone: self.phone,
            company: self.company,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
/// JSON body for logging activity on a contact.
pub struct ContactEventForm {
    /// `Comment`, `Call`, `Email` or a custom label.
    #[serde(default = "default_event_type")]
    #[validate(length(min = 1, max = 64))]
    pub event_type: String,
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
}

fn default_event_type() -> String {
    ContactEventType::Comment.to_string()
}

pub struct ContactEventPayload {
    pub event_type: ContactEventType,
    pub text: SanitizedText,
}

impl TryFrom<ContactEventForm> for ContactEventPayload {
    type Error = FormError;

    fn try_from(form: ContactEventForm) -> Result<Self, Self::Error> {
        form.validate()?;
        let event_type = ContactEventType::from(form.event_type.trim());
        // Lead and stage events are produced by the system only.
        if matches!(
            event_type,
            ContactEventType::Lead | ContactEventType::StageChange
        ) {
            return Err(FormError::InvalidValue(format!(
                "event type `{event_type}` is reserved"
            )));
        }
        Ok(Self {
            event_type,
            text: SanitizedText::new(form.text)?,
        })
    }
}

impl ContactEventPayload {
    pub fn into_domain(self, contact_id: ContactId, manager_id: ManagerId) -> NewContactEvent {
        NewContactEvent::new(
            contact_id,
            Some(manager_id),
            self.event_type,
            json!({ "text": self.text.as_str() }),
        )
    }
}

#[derive(MultipartForm)]
/// Multipart upload with a `csv` file of contacts.
pub struct UploadContactsForm {
    #[multipart(limit = "10MB")]
    pub csv: TempFile,
}

impl UploadContactsForm {
    /// Fresh handle to the uploaded file positioned at its start.
    pub fn open(&self) -> Result<std::fs::File, FormError> {
        self.csv
            .file
            .reopen()
            .map_err(|err| FormError::Csv(err.to_string()))
    }
}

/// Reads contacts from CSV with a header row.
///
/// `name` is required; `email`, `phone` and `company` are optional. Rows
/// repeating an earlier email are dropped.
pub fn parse_contacts_csv<R: Read>(reader: R, hub_id: HubId) -> Result<Vec<NewContact>, FormError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|err| FormError::Csv(err.to_string()))?
        .iter()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>();

    let column = |name: &str| headers.iter().position(|header| header == name);
    let name_idx = column("name").ok_or(FormError::Missing("name column"))?;
    let email_idx = column("email");
    let phone_idx = column("phone");
    let company_idx = column("company");

    let mut seen_emails = std::collections::HashSet::new();
    let mut contacts = Vec::new();

    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(|err| FormError::Csv(err.to_string()))?;
        let field = |idx: Option<usize>| {
            idx.and_then(|idx| record.get(idx))
                .map(str::to_string)
                .filter(|value| !value.is_empty())
        };

        let row = line + 2;
        let name = field(Some(name_idx))
            .map(ContactName::new)
            .transpose()?
            .ok_or_else(|| FormError::Csv(format!("row {row}: name is required")))?;
        let email = field(email_idx)
            .map(Email::new)
            .transpose()
            .map_err(|_| FormError::Csv(format!("row {row}: invalid email")))?;
        let phone = field(phone_idx)
            .map(PhoneNumber::new)
            .transpose()
            .map_err(|_| FormError::Csv(format!("row {row}: invalid phone number")))?;
        let company = field(company_idx).map(CompanyName::new).transpose()?;

        if let Some(email) = &email {
            if !seen_emails.insert(email.clone()) {
                continue;
            }
        }

        contacts.push(
            NewContact::new(hub_id, name)
                .with_email(email)
                .with_phone(phone)
                .with_company(company)
                .with_source(NonEmptyString::new(CSV_SOURCE).ok()),
        );
    }

    Ok(contacts)
}
