//! Strongly-typed value objects used by domain entities.
//!
//! These wrappers enforce basic invariants (positive identifiers, normalized
//! emails, E.164 phone numbers, sanitized free text) so that once a value
//! reaches the domain layer it can be treated as trusted.
use std::fmt::{Display, Formatter};
use std::ops::Deref;

use phonenumber::{Mode, parse};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{ValidateEmail, ValidateUrl};

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided identifier is zero or negative.
    #[error("id must be greater than zero")]
    NonPositiveId,
    /// Provided email failed format validation.
    #[error("invalid email address")]
    InvalidEmail,
    /// Provided string contained no non-whitespace characters.
    #[error("value cannot be empty")]
    EmptyString,
    /// Provided value failed custom validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// Phone number did not meet expected format.
    #[error("invalid phone number")]
    InvalidPhone,
    /// Provided url failed format validation.
    #[error("invalid url address")]
    InvalidUrl,
    /// Monetary amounts cannot be negative.
    #[error("amount cannot be negative")]
    NegativeAmount,
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(try_from = "i32", into = "i32")]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId)
                }
            }

            /// Returns the raw `i32` backing this identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_newtype!(HubId, "Tenant identifier; every record belongs to exactly one hub.");
id_newtype!(ContactId, "Unique identifier for a contact.");
id_newtype!(DealId, "Unique identifier for a deal.");
id_newtype!(TaskId, "Unique identifier for a task.");
id_newtype!(ManagerId, "Unique identifier for a manager.");
id_newtype!(ContactEventId, "Unique identifier for a contact activity event.");
id_newtype!(IntegrationId, "Unique identifier for an advertising integration.");
id_newtype!(AdvertisingLogId, "Unique identifier for an ingestion log row.");
id_newtype!(AutomationId, "Unique identifier for an automation rule.");

/// Shared conversions for validated string wrappers.
macro_rules! string_wrapper_impls {
    ($name:ident) => {
        impl $name {
            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

/// Lower-cased and validated email address.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validates and normalizes an email string.
    pub fn new<S: Into<String>>(email: S) -> Result<Self, TypeConstraintError> {
        let normalized = email.into().trim().to_lowercase();
        if normalized.validate_email() {
            Ok(Self(normalized))
        } else {
            Err(TypeConstraintError::InvalidEmail)
        }
    }
}

string_wrapper_impls!(Email);

/// Wrapper for non-empty, trimmed strings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Trims whitespace and rejects empty inputs.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let trimmed = value.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(TypeConstraintError::EmptyString);
        }
        Ok(Self(trimmed))
    }
}

string_wrapper_impls!(NonEmptyString);

macro_rules! non_empty_string_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Constructs a trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                let inner = NonEmptyString::new(value)?;
                Ok(Self(inner.into_inner()))
            }
        }

        string_wrapper_impls!($name);
    };
}

non_empty_string_newtype!(ContactName, "Contact display name.");
non_empty_string_newtype!(ManagerName, "Manager display name.");
non_empty_string_newtype!(CompanyName, "Company a contact works for.");
non_empty_string_newtype!(DealTitle, "Short deal description.");
non_empty_string_newtype!(TaskTitle, "Task summary line.");
non_empty_string_newtype!(
    ExternalRef,
    "Reference to the contact in an external system, e.g. `avito:42`."
);

/// Free text coming from users or third parties, HTML-sanitized and trimmed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct SanitizedText(String);

impl SanitizedText {
    /// Constructs a sanitized, trimmed, non-empty value.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let sanitized = ammonia::clean(&value.into());
        let inner = NonEmptyString::new(sanitized)?;
        Ok(Self(inner.into_inner()))
    }
}

string_wrapper_impls!(SanitizedText);

/// Normalizes a phone number string to E.164 format.
pub fn normalize_phone_to_e164(value: &str) -> Result<String, TypeConstraintError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TypeConstraintError::EmptyString);
    }
    let parsed = parse(None, trimmed).map_err(|_| TypeConstraintError::InvalidPhone)?;
    Ok(parsed.format().mode(Mode::E164).to_string())
}

/// Normalized phone number wrapper (E.164).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Constructs a phone number ensuring it is valid and normalizes to E.164 format.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let normalized = normalize_phone_to_e164(&value.into())?;
        Ok(Self(normalized))
    }
}

string_wrapper_impls!(PhoneNumber);

/// Absolute http(s) URL, e.g. a webhook endpoint.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Url(String);

impl Url {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let url = NonEmptyString::new(value)?;
        let lower = url.as_str().to_ascii_lowercase();
        if !url.as_str().validate_url()
            || !(lower.starts_with("http://") || lower.starts_with("https://"))
        {
            return Err(TypeConstraintError::InvalidUrl);
        }
        Ok(Self(url.into_inner()))
    }
}

string_wrapper_impls!(Url);

/// Monetary amount in minor units (kopecks, cents).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> Result<Self, TypeConstraintError> {
        if value < 0 {
            return Err(TypeConstraintError::NegativeAmount);
        }
        Ok(Self(value))
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = TypeConstraintError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_reject_non_positive_values() {
        assert_eq!(HubId::new(0), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(ContactId::new(-3), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(DealId::new(7).map(DealId::get), Ok(7));
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let email = Email::new("  John.Doe@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "john.doe@example.com");
        assert_eq!(Email::new("nope"), Err(TypeConstraintError::InvalidEmail));
    }

    #[test]
    fn phone_is_normalized_to_e164() {
        let phone = PhoneNumber::new("+1 (415) 555-2671").unwrap();
        assert_eq!(phone.as_str(), "+14155552671");
        assert_eq!(
            PhoneNumber::new("   "),
            Err(TypeConstraintError::EmptyString)
        );
        assert_eq!(
            PhoneNumber::new("not a phone"),
            Err(TypeConstraintError::InvalidPhone)
        );
    }

    #[test]
    fn sanitized_text_strips_markup() {
        let text = SanitizedText::new("<script>alert(1)</script>Hello").unwrap();
        assert_eq!(text.as_str(), "Hello");
        assert_eq!(
            SanitizedText::new("<script></script>"),
            Err(TypeConstraintError::EmptyString)
        );
    }

    #[test]
    fn url_requires_http_scheme() {
        assert!(Url::new("https://hooks.example.com/crm").is_ok());
        assert_eq!(
            Url::new("ftp://example.com"),
            Err(TypeConstraintError::InvalidUrl)
        );
        assert_eq!(Url::new("garbage"), Err(TypeConstraintError::InvalidUrl));
    }

    #[test]
    fn amount_rejects_negative_values() {
        assert_eq!(Amount::new(-1), Err(TypeConstraintError::NegativeAmount));
        assert_eq!(Amount::new(0).map(Amount::get), Ok(0));
    }

    #[test]
    fn deserializing_validates() {
        let parsed: Result<ContactName, _> = serde_json::from_str("\"  \"");
        assert!(parsed.is_err());
        let parsed: HubId = serde_json::from_str("5").unwrap();
        assert_eq!(parsed.get(), 5);
    }
}
