use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::contact::{
    Contact as DomainContact, NewContact as DomainNewContact, UpdateContact as DomainUpdateContact,
};
use crate::domain::types::{
    CompanyName, ContactId, ContactName, Email, ExternalRef, HubId, NonEmptyString, PhoneNumber,
    TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::contacts)]
/// Diesel model for [`crate::domain::contact::Contact`].
pub struct Contact {
    pub id: i32,
    pub hub_id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub external_ref: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::contacts)]
/// Insertable form of [`Contact`].
pub struct NewContact<'a> {
    pub hub_id: i32,
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub company: Option<&'a str>,
    pub source: Option<&'a str>,
    pub external_ref: Option<&'a str>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::contacts)]
#[diesel(treat_none_as_null = true)]
/// Data used when updating a [`Contact`] record.
pub struct UpdateContact<'a> {
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub company: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Contact> for DomainContact {
    type Error = TypeConstraintError;

    fn try_from(contact: Contact) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ContactId::new(contact.id)?,
            hub_id: HubId::new(contact.hub_id)?,
            name: ContactName::new(contact.name)?,
            email: contact.email.map(Email::new).transpose()?,
            phone: contact.phone.map(PhoneNumber::new).transpose()?,
            company: contact.company.map(CompanyName::new).transpose()?,
            source: contact.source.map(NonEmptyString::new).transpose()?,
            external_ref: contact.external_ref.map(ExternalRef::new).transpose()?,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewContact> for NewContact<'a> {
    fn from(contact: &'a DomainNewContact) -> Self {
        Self {
            hub_id: contact.hub_id.get(),
            name: contact.name.as_str(),
            email: contact.email.as_ref().map(Email::as_str),
            phone: contact.phone.as_ref().map(PhoneNumber::as_str),
            company: contact.company.as_ref().map(CompanyName::as_str),
            source: contact.source.as_ref().map(NonEmptyString::as_str),
            external_ref: contact.external_ref.as_ref().map(ExternalRef::as_str),
        }
    }
}

impl<'a> UpdateContact<'a> {
    pub fn from_domain(contact: &'a DomainUpdateContact, updated_at: NaiveDateTime) -> Self {
        Self {
            name: contact.name.as_str(),
            email: contact.email.as_ref().map(Email::as_str),
            phone: contact.phone.as_ref().map(PhoneNumber::as_str),
            company: contact.company.as_ref().map(CompanyName::as_str),
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_domain_new() -> DomainNewContact {
        DomainNewContact::new(HubId::new(1).unwrap(), ContactName::new("John").unwrap())
            .with_email(Some(Email::new("john@example.com").unwrap()))
            .with_external_ref(Some(ExternalRef::new("avito:7").unwrap()))
    }

    #[test]
    fn from_domain_new_creates_newcontact() {
        let domain = sample_domain_new();
        let new: NewContact = (&domain).into();
        assert_eq!(new.hub_id, 1);
        assert_eq!(new.name, "John");
        assert_eq!(new.email, Some("john@example.com"));
        assert_eq!(new.phone, None);
        assert_eq!(new.external_ref, Some("avito:7"));
    }

    #[test]
    fn contact_into_domain() {
        let now: NaiveDateTime = Utc::now().naive_utc();
        let db_contact = Contact {
            id: 1,
            hub_id: 2,
            name: "n".to_string(),
            email: Some("E@x.io".to_string()),
            phone: None,
            company: Some("Acme".to_string()),
            source: None,
            external_ref: None,
            created_at: now,
            updated_at: now,
        };
        let domain = DomainContact::try_from(db_contact).unwrap();
        assert_eq!(domain.id.get(), 1);
        assert_eq!(domain.hub_id.get(), 2);
        assert_eq!(domain.email.unwrap().as_str(), "e@x.io");
        assert_eq!(domain.company.unwrap().as_str(), "Acme");
    }

    #[test]
    fn invalid_rows_are_rejected() {
        let now: NaiveDateTime = Utc::now().naive_utc();
        let db_contact = Contact {
            id: 0,
            hub_id: 2,
            name: "n".to_string(),
            email: None,
            phone: None,
            company: None,
            source: None,
            external_ref: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            DomainContact::try_from(db_contact),
            Err(TypeConstraintError::NonPositiveId)
        );
    }
}
