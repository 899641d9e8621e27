use reqwest::blocking::Client;

use crate::domain::automation::AutomationMessage;
use crate::integrations::{IntegrationResult, check_status};

/// Header carrying the shared secret of a webhook automation.
pub const SIGNATURE_HEADER: &str = "X-CRM-Signature";

/// POSTs `{event, hub_id, payload}` to `url`.
pub fn send(
    client: &Client,
    url: &str,
    secret: Option<&str>,
    message: &AutomationMessage,
) -> IntegrationResult<()> {
    let mut request = client.post(url).json(message);
    if let Some(secret) = secret {
        request = request.header(SIGNATURE_HEADER, secret);
    }

    check_status(request.send()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::domain::automation::AutomationEvent;
    use crate::domain::types::HubId;
    use crate::integrations::IntegrationError;

    fn message() -> AutomationMessage {
        AutomationMessage::new(
            AutomationEvent::LeadCreated,
            HubId::new(4).unwrap(),
            json!({"contact_id": 9}),
        )
    }

    #[test]
    fn posts_signed_json() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/hook")
            .match_header(SIGNATURE_HEADER, "s3cret")
            .match_body(Matcher::Json(json!({
                "event": "lead.created",
                "hub_id": 4,
                "payload": {"contact_id": 9}
            })))
            .with_status(204)
            .create();

        let url = format!("{}/hook", server.url());
        send(&Client::new(), &url, Some("s3cret"), &message()).unwrap();
        mock.assert();
    }

    #[test]
    fn server_errors_are_reported() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/hook")
            .with_status(500)
            .with_body("down")
            .create();

        let url = format!("{}/hook", server.url());
        let err = send(&Client::new(), &url, None, &message()).unwrap_err();
        assert!(matches!(err, IntegrationError::Status { status: 500, .. }));
    }
}
