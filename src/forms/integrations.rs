use serde::Deserialize;
use validator::Validate;

use crate::domain::integration::{
    AdvertisingPlatform, IntegrationSettings, NewAdvertisingIntegration,
};
use crate::domain::types::{HubId, NonEmptyString};
use crate::forms::FormError;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
/// Credentials of a new advertising platform connection.
pub struct AddIntegrationForm {
    #[serde(default)]
    pub platform: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub client_id: String,
    #[validate(length(min = 1, max = 255))]
    pub client_secret: String,
    #[serde(default = "default_true")]
    pub create_deals: bool,
}

pub struct AddIntegrationPayload {
    pub platform: AdvertisingPlatform,
    pub client_id: NonEmptyString,
    pub client_secret: NonEmptyString,
    pub create_deals: bool,
}

impl TryFrom<AddIntegrationForm> for AddIntegrationPayload {
    type Error = FormError;

    fn try_from(form: AddIntegrationForm) -> Result<Self, Self::Error> {
        form.validate()?;
        let platform = match form.platform.as_deref() {
            Some(platform) => platform.parse::<AdvertisingPlatform>()?,
            None => AdvertisingPlatform::Avito,
        };
        Ok(Self {
            platform,
            client_id: NonEmptyString::new(form.client_id)?,
            client_secret: NonEmptyString::new(form.client_secret)?,
            create_deals: form.create_deals,
        })
    }
}

impl AddIntegrationPayload {
    pub fn into_domain(self, hub_id: HubId) -> NewAdvertisingIntegration {
        NewAdvertisingIntegration {
            hub_id,
            platform: self.platform,
            client_id: self.client_id,
            client_secret: self.client_secret,
            create_deals: self.create_deals,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IntegrationSettingsForm {
    pub is_active: bool,
    pub create_deals: bool,
}

impl From<IntegrationSettingsForm> for IntegrationSettings {
    fn from(form: IntegrationSettingsForm) -> Self {
        Self {
            is_active: form.is_active,
            create_deals: form.create_deals,
        }
    }
}
