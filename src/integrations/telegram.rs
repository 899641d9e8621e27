use reqwest::blocking::Client;
use serde::Serialize;

use crate::domain::automation::AutomationMessage;
use crate::integrations::{IntegrationResult, check_status};

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Calls `sendMessage` of the Bot API for `bot_token`.
pub fn send_message(
    client: &Client,
    api_url: &str,
    bot_token: &str,
    chat_id: &str,
    text: &str,
) -> IntegrationResult<()> {
    let url = format!(
        "{}/bot{}/sendMessage",
        api_url.trim_end_matches('/'),
        bot_token
    );

    let response = client
        .post(url)
        .json(&SendMessage { chat_id, text })
        .send()?;
    check_status(response)?;
    Ok(())
}

/// Human-readable summary of an automation message.
pub fn render_text(message: &AutomationMessage) -> String {
    let mut text = format!("CRM event {} (hub {})", message.event, message.hub_id);
    if let Some(fields) = message.payload.as_object() {
        for (key, value) in fields {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::String(s) => text.push_str(&format!("\n{key}: {s}")),
                other => text.push_str(&format!("\n{key}: {other}")),
            }
        }
    }
    text
}
