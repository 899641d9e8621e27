//! Client for the subset of the Avito API used by lead ingestion.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::integrations::{IntegrationError, IntegrationResult, check_status};

/// Page size used when listing chats.
pub const CHATS_PAGE_LIMIT: usize = 100;
/// Chats beyond this offset are not fetched in a single sync.
pub const CHATS_MAX_OFFSET: usize = 1000;
/// Number of messages requested per chat.
pub const MESSAGES_LIMIT: usize = 100;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AvitoAccount {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AvitoChat {
    pub id: String,
    #[serde(default)]
    pub context: Option<ChatContext>,
    #[serde(default)]
    pub users: Vec<ChatUser>,
}

impl AvitoChat {
    /// First participant that is not the integration's own account.
    pub fn counterpart(&self, account_id: i64) -> Option<&ChatUser> {
        self.users.iter().find(|user| user.id != account_id)
    }

    /// Listing the chat is about, when the chat is attached to one.
    pub fn item(&self) -> Option<&ChatItem> {
        self.context.as_ref().and_then(|context| context.value.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatContext {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<ChatItem>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price_string: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatUser {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AvitoMessage {
    pub id: String,
    pub author_id: i64,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub content: Option<MessageContent>,
    #[serde(default)]
    pub created: Option<i64>,
}

impl AvitoMessage {
    /// Non-blank text of a text message.
    pub fn text(&self) -> Option<&str> {
        if self.kind.as_deref().is_some_and(|kind| kind != "text") {
            return None;
        }
        self.content
            .as_ref()
            .and_then(|content| content.text.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MessageContent {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize)]
struct ChatsPage {
    #[serde(default)]
    chats: Vec<AvitoChat>,
}

/// The messages endpoint answers with either a bare list or a wrapped one.
#[derive(Deserialize)]
#[serde(untagged)]
enum MessagesPage {
    Wrapped { messages: Vec<AvitoMessage> },
    Bare(Vec<AvitoMessage>),
}

/// Operations of the Avito API needed to ingest chat leads.
#[cfg_attr(feature = "test-mocks", mockall::automock)]
pub trait AvitoApi {
    fn request_token(&self, client_id: &str, client_secret: &str)
    -> IntegrationResult<TokenResponse>;
    fn get_self_account(&self, token: &str) -> IntegrationResult<AvitoAccount>;
    fn list_chats(
        &self,
        token: &str,
        account_id: i64,
        limit: usize,
        offset: usize,
    ) -> IntegrationResult<Vec<AvitoChat>>;
    fn list_messages(
        &self,
        token: &str,
        account_id: i64,
        chat_id: &str,
    ) -> IntegrationResult<Vec<AvitoMessage>>;
}

/// Blocking HTTP implementation of [`AvitoApi`].
pub struct AvitoClient {
    client: Client,
    base_url: String,
}

impl AvitoClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn get_json<T: DeserializeOwned>(&self, token: &str, path: &str) -> IntegrationResult<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .send()?;
        decode(check_status(response)?)
    }
}

fn decode<T: DeserializeOwned>(response: reqwest::blocking::Response) -> IntegrationResult<T> {
    let body = response.text()?;
    serde_json::from_str(&body).map_err(|err| IntegrationError::Decode(err.to_string()))
}

impl AvitoApi for AvitoClient {
    fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> IntegrationResult<TokenResponse> {
        let response = self
            .client
            .post(format!("{}/token", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()?;
        decode(check_status(response)?)
    }

    fn get_self_account(&self, token: &str) -> IntegrationResult<AvitoAccount> {
        self.get_json(token, "/core/v1/accounts/self")
    }

    fn list_chats(
        &self,
        token: &str,
        account_id: i64,
        limit: usize,
        offset: usize,
    ) -> IntegrationResult<Vec<AvitoChat>> {
        let page: ChatsPage = self.get_json(
            token,
            &format!("/messenger/v2/accounts/{account_id}/chats?limit={limit}&offset={offset}"),
        )?;
        Ok(page.chats)
    }

    fn list_messages(
        &self,
        token: &str,
        account_id: i64,
        chat_id: &str,
    ) -> IntegrationResult<Vec<AvitoMessage>> {
        let page: MessagesPage = self.get_json(
            token,
            &format!(
                "/messenger/v3/accounts/{account_id}/chats/{chat_id}/messages/?limit={MESSAGES_LIMIT}"
            ),
        )?;
        Ok(match page {
            MessagesPage::Wrapped { messages } => messages,
            MessagesPage::Bare(messages) => messages,
        })
    }
}

/// Parses a listing price such as `"15 000 ₽"` into kopecks.
pub fn parse_price(price: &str) -> Option<i64> {
    let digits: String = price.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok()?.checked_mul(100)
}
