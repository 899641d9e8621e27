use serde::Deserialize;
use validator::Validate;

use crate::domain::automation::{AutomationChannel, AutomationEvent, NewAutomation};
use crate::domain::types::{HubId, NonEmptyString, Url};
use crate::forms::{FormError, non_blank};

#[derive(Debug, Deserialize, Validate)]
pub struct AddAutomationForm {
    pub event: String,
    pub channel: String,
    /// Webhook URL or Telegram chat id.
    #[validate(length(min = 1, max = 2048))]
    pub target: String,
    /// Webhook signature or Telegram bot token.
    #[serde(default)]
    pub secret: Option<String>,
}

pub struct AddAutomationPayload {
    pub event: AutomationEvent,
    pub channel: AutomationChannel,
    pub target: NonEmptyString,
    pub secret: Option<NonEmptyString>,
}

impl TryFrom<AddAutomationForm> for AddAutomationPayload {
    type Error = FormError;

    fn try_from(form: AddAutomationForm) -> Result<Self, Self::Error> {
        form.validate()?;
        let event = form.event.parse::<AutomationEvent>()?;
        let channel = form.channel.parse::<AutomationChannel>()?;
        let secret = non_blank(form.secret).map(NonEmptyString::new).transpose()?;

        let target = match channel {
            AutomationChannel::Webhook => {
                let url = Url::new(form.target).map_err(|_| FormError::InvalidUrl)?;
                NonEmptyString::new(url.into_inner())?
            }
            AutomationChannel::Telegram => {
                if secret.is_none() {
                    return Err(FormError::Missing("bot token"));
                }
                NonEmptyString::new(form.target)?
            }
        };

        Ok(Self {
            event,
            channel,
            target,
            secret,
        })
    }
}

impl AddAutomationPayload {
    pub fn into_domain(self, hub_id: HubId) -> NewAutomation {
        NewAutomation {
            hub_id,
            event: self.event,
            channel: self.channel,
            target: self.target,
            secret: self.secret,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(channel: &str, target: &str, secret: Option<&str>) -> AddAutomationForm {
        AddAutomationForm {
            event: "lead.created".into(),
            channel: channel.into(),
            target: target.into(),
            secret: secret.map(str::to_string),
        }
    }

    #[test]
    fn webhook_requires_http_url() {
        assert!(AddAutomationPayload::try_from(form("webhook", "https://hooks.io/x", None)).is_ok());
        assert!(matches!(
            AddAutomationPayload::try_from(form("webhook", "ftp://hooks.io/x", None)),
            Err(FormError::InvalidUrl)
        ));
    }

    #[test]
    fn telegram_requires_bot_token() {
        assert!(matches!(
            AddAutomationPayload::try_from(form("telegram", "-100", Some(" "))),
            Err(FormError::Missing(_))
        ));
        let payload =
            AddAutomationPayload::try_from(form("telegram", "-100", Some("123:abc"))).unwrap();
        assert_eq!(payload.channel, AutomationChannel::Telegram);
        assert_eq!(payload.secret.unwrap().as_str(), "123:abc");
    }

    #[test]
    fn unknown_event_is_rejected() {
        let mut bad = form("webhook", "https://hooks.io/x", None);
        bad.event = "deal.deleted".into();
        assert!(AddAutomationPayload::try_from(bad).is_err());
    }
}
