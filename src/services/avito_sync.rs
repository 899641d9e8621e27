//! Avito chat lead ingestion.
//!
//! A sync walks the chats of the integration's Avito account, turns every
//! chat with an incoming text message into a contact (and optionally a deal)
//! and records the outcome in `advertising_logs`, keyed by `chat:{id}`, so
//! that a chat is only processed once. Failed chats are retried on the next
//! run. The records of one chat are committed in a single transaction, so a
//! retry never finds half of them already stored.

use chrono::{Duration, NaiveDateTime};
use serde_json::json;

use crate::domain::automation::AutomationEvent;
use crate::domain::contact::NewContact;
use crate::domain::integration::{
    AccessToken, AdvertisingIntegration, LeadDeal, LogStatus, NewAdvertisingLog, NewLead,
    SyncReport,
};
use crate::domain::types::{
    Amount, ContactName, DealTitle, ExternalRef, NonEmptyString, SanitizedText,
};
use crate::integrations::AutomationDispatcher;
use crate::integrations::avito::{
    AvitoApi, AvitoChat, AvitoMessage, CHATS_MAX_OFFSET, CHATS_PAGE_LIMIT, ChatUser, parse_price,
};
use crate::repository::{AutomationReader, IntegrationReader, IntegrationWriter};
use crate::services::automations::fire_event;
use crate::services::{ServiceError, ServiceResult};

/// `source` of contacts created from Avito chats.
pub const AVITO_SOURCE: &str = "avito";

/// Everything a sync reads and writes.
pub trait SyncRepository: IntegrationReader + IntegrationWriter + AutomationReader {}

impl<T> SyncRepository for T where
    T: IntegrationReader + IntegrationWriter + AutomationReader + ?Sized
{
}

enum ChatOutcome {
    Processed {
        contact_created: bool,
        deal_created: bool,
    },
    Skipped(&'static str),
}

/// Dedup key of a chat in the ingestion log.
pub fn chat_external_id(chat_id: &str) -> String {
    format!("chat:{chat_id}")
}

/// Contact reference of an Avito user.
pub fn avito_external_ref(user_id: i64) -> String {
    format!("avito:{user_id}")
}

/// Runs one ingestion pass over `integration`.
///
/// Per-chat failures are logged and recorded as `failed`; only errors that
/// make further progress impossible (credentials, chat listing) abort.
pub fn sync_integration<R, A, D>(
    repo: &R,
    api: &A,
    dispatcher: &D,
    integration: &AdvertisingIntegration,
    now: NaiveDateTime,
) -> ServiceResult<SyncReport>
where
    R: SyncRepository + ?Sized,
    A: AvitoApi + ?Sized,
    D: AutomationDispatcher + ?Sized,
{
    let token = access_token(repo, api, integration, now)?;
    let account_id = match integration.account_id {
        Some(account_id) => account_id,
        None => {
            let account = api.get_self_account(&token)?;
            repo.store_account_id(integration.id, account.id)?;
            account.id
        }
    };

    let chats = fetch_chats(api, &token, account_id)?;
    let mut report = SyncReport {
        chats_seen: chats.len(),
        ..SyncReport::default()
    };

    for chat in &chats {
        let external_id = chat_external_id(&chat.id);
        let existing = repo.get_advertising_log(integration.id, &external_id)?;
        if existing.is_some_and(|log| log.status.is_final()) {
            continue;
        }

        match process_chat(repo, api, dispatcher, integration, &token, account_id, chat) {
            Ok(ChatOutcome::Processed {
                contact_created,
                deal_created,
            }) => {
                report.processed += 1;
                report.contacts_created += usize::from(contact_created);
                report.deals_created += usize::from(deal_created);
            }
            Ok(ChatOutcome::Skipped(reason)) => {
                repo.record_advertising_log(
                    &NewAdvertisingLog::new(integration.id, external_id, LogStatus::Skipped)
                        .with_message(reason),
                )?;
                report.skipped += 1;
            }
            Err(ServiceError::UpstreamUnauthorized) => {
                log::error!(
                    "Avito rejected the credentials of integration #{} mid-sync",
                    integration.id
                );
                return Err(ServiceError::UpstreamUnauthorized);
            }
            Err(err) => {
                log::warn!(
                    "Failed to ingest Avito chat {} for integration #{}: {err}",
                    chat.id,
                    integration.id
                );
                report.failed += 1;
                let failed =
                    NewAdvertisingLog::new(integration.id, external_id, LogStatus::Failed)
                        .with_message(err.to_string());
                if let Err(err) = repo.record_advertising_log(&failed) {
                    log::error!("Failed to record failure of chat {}: {err}", chat.id);
                }
            }
        }
    }

    repo.mark_integration_synced(integration.id, now)?;

    log::info!(
        "Avito integration #{} of hub {}: {} chats, {} processed, {} skipped, {} failed",
        integration.id,
        integration.hub_id,
        report.chats_seen,
        report.processed,
        report.skipped,
        report.failed
    );

    Ok(report)
}

/// Syncs every active integration of every hub, one after another.
///
/// Returns the number of integrations that synced successfully.
pub fn sync_all_active<R, A, D>(repo: &R, api: &A, dispatcher: &D, now: NaiveDateTime) -> usize
where
    R: SyncRepository + ?Sized,
    A: AvitoApi + ?Sized,
    D: AutomationDispatcher + ?Sized,
{
    let integrations = match repo.list_active_integrations() {
        Ok(integrations) => integrations,
        Err(err) => {
            log::error!("Failed to load active integrations: {err}");
            return 0;
        }
    };

    let mut synced = 0;
    for integration in &integrations {
        match sync_integration(repo, api, dispatcher, integration, now) {
            Ok(_) => synced += 1,
            Err(err) => log::error!(
                "Sync of integration #{} (hub {}) failed: {err}",
                integration.id,
                integration.hub_id
            ),
        }
    }
    synced
}

fn access_token<R, A>(
    repo: &R,
    api: &A,
    integration: &AdvertisingIntegration,
    now: NaiveDateTime,
) -> ServiceResult<String>
where
    R: IntegrationWriter + ?Sized,
    A: AvitoApi + ?Sized,
{
    if let Some(token) = integration.fresh_token(now) {
        return Ok(token.token.clone());
    }

    let response = api.request_token(
        integration.client_id.as_str(),
        integration.client_secret.as_str(),
    )?;
    // Negative lifetimes are treated as already expired.
    let expires_at = Duration::try_seconds(response.expires_in.max(0))
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            ServiceError::Upstream(format!(
                "token lifetime of {}s is out of range",
                response.expires_in
            ))
        })?;
    let token = AccessToken {
        token: response.access_token,
        expires_at,
    };
    repo.store_access_token(integration.id, &token)?;

    log::debug!("Refreshed Avito token of integration #{}", integration.id);
    Ok(token.token)
}

fn fetch_chats<A>(api: &A, token: &str, account_id: i64) -> ServiceResult<Vec<AvitoChat>>
where
    A: AvitoApi + ?Sized,
{
    let mut chats = Vec::new();
    let mut offset = 0;
    loop {
        let page = api.list_chats(token, account_id, CHATS_PAGE_LIMIT, offset)?;
        let fetched = page.len();
        chats.extend(page);

        offset += CHATS_PAGE_LIMIT;
        if fetched < CHATS_PAGE_LIMIT || offset >= CHATS_MAX_OFFSET {
            break;
        }
    }
    Ok(chats)
}

/// Earliest non-blank text written by someone other than the account.
fn first_incoming_text(messages: &[AvitoMessage], account_id: i64) -> Option<&str> {
    messages
        .iter()
        .filter(|message| message.author_id != account_id)
        .filter_map(|message| message.text().map(|text| (message.created, text)))
        .min_by_key(|(created, _)| created.unwrap_or(i64::MAX))
        .map(|(_, text)| text)
}

fn process_chat<R, A, D>(
    repo: &R,
    api: &A,
    dispatcher: &D,
    integration: &AdvertisingIntegration,
    token: &str,
    account_id: i64,
    chat: &AvitoChat,
) -> ServiceResult<ChatOutcome>
where
    R: SyncRepository + ?Sized,
    A: AvitoApi + ?Sized,
    D: AutomationDispatcher + ?Sized,
{
    let messages = api.list_messages(token, account_id, &chat.id)?;
    let Some(text) = first_incoming_text(&messages, account_id) else {
        return Ok(ChatOutcome::Skipped("no incoming text messages"));
    };
    let text = SanitizedText::new(text)?;

    let user = chat
        .counterpart(account_id)
        .ok_or_else(|| ServiceError::Upstream(format!("chat {} has no counterpart", chat.id)))?;

    let item = chat.item();
    let item_title = item
        .and_then(|item| item.title.as_deref())
        .map(str::trim)
        .filter(|title| !title.is_empty());
    let item_url = item.and_then(|item| item.url.as_deref());

    let deal = if integration.create_deals {
        Some(lead_deal(chat, item_title)?)
    } else {
        None
    };

    let lead = NewLead {
        integration_id: integration.id,
        external_id: chat_external_id(&chat.id),
        contact: lead_contact(integration, user)?,
        deal,
        event_data: json!({
            "text": text,
            "chat_id": chat.id,
            "item_title": item_title,
            "item_url": item_url,
        }),
    };
    let ingested = repo.ingest_lead(&lead)?;
    let contact = &ingested.contact;
    let deal_id = ingested.deal.as_ref().map(|deal| deal.id);

    if ingested.contact_created {
        fire_event(
            repo,
            dispatcher,
            integration.hub_id,
            AutomationEvent::ContactCreated,
            json!({
                "contact_id": contact.id,
                "name": contact.name,
                "email": contact.email,
                "phone": contact.phone,
                "source": contact.source,
            }),
        );
    }

    fire_event(
        repo,
        dispatcher,
        integration.hub_id,
        AutomationEvent::LeadCreated,
        json!({
            "integration_id": integration.id,
            "platform": integration.platform,
            "chat_id": chat.id,
            "contact_id": contact.id,
            "contact_name": contact.name,
            "deal_id": deal_id,
            "item_title": item_title,
            "item_url": item_url,
            "text": text,
        }),
    );

    Ok(ChatOutcome::Processed {
        contact_created: ingested.contact_created,
        deal_created: ingested.deal.is_some(),
    })
}

/// Contact created for a chat counterpart unless one with the same
/// `external_ref` already exists.
fn lead_contact(integration: &AdvertisingIntegration, user: &ChatUser) -> ServiceResult<NewContact> {
    let name = user
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Avito {}", user.id));

    Ok(NewContact::new(integration.hub_id, ContactName::new(name)?)
        .with_source(Some(NonEmptyString::new(AVITO_SOURCE)?))
        .with_external_ref(Some(ExternalRef::new(avito_external_ref(user.id))?)))
}

fn lead_deal(chat: &AvitoChat, item_title: Option<&str>) -> ServiceResult<LeadDeal> {
    let title = match item_title {
        Some(title) => title.to_string(),
        None => format!("Avito chat {}", chat.id),
    };
    let amount = chat
        .item()
        .and_then(|item| item.price_string.as_deref())
        .and_then(parse_price)
        .map(Amount::new)
        .transpose()?;

    Ok(LeadDeal {
        title: DealTitle::new(title)?,
        amount,
    })
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use mockall::Sequence;

    use super::*;
    use crate::domain::contact::Contact;
    use crate::domain::deal::{Deal, DealStage, NewDeal};
    use crate::domain::integration::{AdvertisingLog, AdvertisingPlatform, IngestedLead};
    use crate::domain::types::{AdvertisingLogId, ContactId, DealId, HubId, IntegrationId};
    use crate::repository::errors::RepositoryError;
    use crate::integrations::avito::{
        AvitoAccount, ChatContext, ChatItem, ChatUser, MessageContent, MockAvitoApi, TokenResponse,
    };
    use crate::integrations::{IntegrationError, MockAutomationDispatcher};
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::now;

    const ACCOUNT: i64 = 42;

    fn integration(token: Option<AccessToken>, account_id: Option<i64>) -> AdvertisingIntegration {
        AdvertisingIntegration {
            id: IntegrationId::new(5).unwrap(),
            hub_id: HubId::new(1).unwrap(),
            platform: AdvertisingPlatform::Avito,
            client_id: NonEmptyString::new("client").unwrap(),
            client_secret: NonEmptyString::new("secret").unwrap(),
            access_token: token,
            account_id,
            is_active: true,
            create_deals: true,
            last_synced_at: None,
            created_at: now(),
        }
    }

    fn chat(id: &str, user_id: i64, title: Option<&str>, price: Option<&str>) -> AvitoChat {
        AvitoChat {
            id: id.to_string(),
            context: Some(ChatContext {
                kind: Some("item".to_string()),
                value: Some(ChatItem {
                    id: Some(1),
                    title: title.map(str::to_string),
                    price_string: price.map(str::to_string),
                    url: Some("https://avito.ru/items/1".to_string()),
                }),
            }),
            users: vec![
                ChatUser {
                    id: ACCOUNT,
                    name: Some("Shop".to_string()),
                },
                ChatUser {
                    id: user_id,
                    name: Some("Buyer".to_string()),
                },
            ],
        }
    }

    fn message(author_id: i64, text: &str, created: i64) -> AvitoMessage {
        AvitoMessage {
            id: format!("m{created}"),
            author_id,
            kind: Some("text".to_string()),
            content: Some(MessageContent {
                text: Some(text.to_string()),
            }),
            created: Some(created),
        }
    }

    fn log(status: LogStatus) -> AdvertisingLog {
        AdvertisingLog {
            id: AdvertisingLogId::new(1).unwrap(),
            integration_id: IntegrationId::new(5).unwrap(),
            external_id: "chat:a".to_string(),
            status,
            contact_id: None,
            deal_id: None,
            message: None,
            created_at: now(),
        }
    }

    fn echo_log(new: &NewAdvertisingLog) -> AdvertisingLog {
        AdvertisingLog {
            id: AdvertisingLogId::new(1).unwrap(),
            integration_id: new.integration_id,
            external_id: new.external_id.clone(),
            status: new.status,
            contact_id: new.contact_id,
            deal_id: new.deal_id,
            message: new.message.clone(),
            created_at: now(),
        }
    }

    fn echo_contact(new: &NewContact) -> Contact {
        Contact {
            id: ContactId::new(11).unwrap(),
            hub_id: new.hub_id,
            name: new.name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            company: new.company.clone(),
            source: new.source.clone(),
            external_ref: new.external_ref.clone(),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn echo_deal(new: &NewDeal) -> Deal {
        Deal {
            id: DealId::new(21).unwrap(),
            hub_id: new.hub_id,
            contact_id: new.contact_id,
            title: new.title.clone(),
            amount: new.amount,
            stage: new.stage,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn ingested(lead: &NewLead, contact_created: bool) -> IngestedLead {
        let contact = echo_contact(&lead.contact);
        let deal = lead.deal.as_ref().map(|deal| {
            echo_deal(&NewDeal::new(
                contact.hub_id,
                contact.id,
                deal.title.clone(),
                deal.amount,
            ))
        });
        IngestedLead {
            contact,
            contact_created,
            deal,
        }
    }

    /// Chat without an item whose counterpart has no display name.
    fn bare_chat(id: &str, user_id: i64) -> AvitoChat {
        AvitoChat {
            id: id.to_string(),
            context: None,
            users: vec![
                ChatUser {
                    id: ACCOUNT,
                    name: Some("Shop".to_string()),
                },
                ChatUser {
                    id: user_id,
                    name: None,
                },
            ],
        }
    }

    fn fresh_token() -> AccessToken {
        AccessToken {
            token: "stored".to_string(),
            expires_at: now() + Duration::hours(1),
        }
    }

    #[test]
    fn first_sync_creates_contact_deal_and_logs() {
        let mut api = MockAvitoApi::new();
        api.expect_request_token().times(1).returning(|_, _| {
            Ok(TokenResponse {
                access_token: "new-token".to_string(),
                expires_in: 86_400,
            })
        });
        api.expect_get_self_account().times(1).returning(|_| {
            Ok(AvitoAccount {
                id: ACCOUNT,
                name: None,
            })
        });
        api.expect_list_chats()
            .withf(|_, account, limit, offset| {
                *account == ACCOUNT && *limit == CHATS_PAGE_LIMIT && *offset == 0
            })
            .times(1)
            .returning(|_, _, _, _| {
                Ok(vec![
                    chat("a", 7, Some("Sofa"), Some("15 000 ₽")),
                    chat("b", 8, None, None),
                ])
            });
        api.expect_list_messages().times(2).returning(|_, _, chat_id| {
            if chat_id == "a" {
                Ok(vec![
                    message(ACCOUNT, "Hello, how can I help?", 2),
                    message(7, "Is the sofa available?", 1),
                ])
            } else {
                Ok(vec![message(ACCOUNT, "Anyone there?", 1)])
            }
        });

        let mut repo = MockRepository::new();
        repo.expect_store_access_token()
            .withf(|id, token| id.get() == 5 && token.token == "new-token")
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_store_account_id()
            .withf(|_, account| *account == ACCOUNT)
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_get_advertising_log().returning(|_, _| Ok(None));
        repo.expect_ingest_lead()
            .withf(|lead| {
                lead.external_id == "chat:a"
                    && lead.contact.name.as_str() == "Buyer"
                    && lead.contact.external_ref.as_ref().map(|r| r.as_str()) == Some("avito:7")
                    && lead.contact.source.as_ref().map(|s| s.as_str()) == Some(AVITO_SOURCE)
                    && lead.deal.as_ref().is_some_and(|deal| {
                        deal.title.as_str() == "Sofa"
                            && deal.amount.map(Amount::get) == Some(1_500_000)
                    })
                    && lead.event_data["text"] == "Is the sofa available?"
                    && lead.event_data["item_url"] == "https://avito.ru/items/1"
            })
            .times(1)
            .returning(|lead| {
                let ingested = ingested(lead, true);
                assert_eq!(ingested.deal.as_ref().unwrap().stage, DealStage::New);
                Ok(ingested)
            });
        repo.expect_record_advertising_log()
            .withf(|log| log.external_id == "chat:b" && log.status == LogStatus::Skipped)
            .times(1)
            .returning(|log| Ok(echo_log(log)));
        repo.expect_list_active_automations()
            .returning(|_, _| Ok(vec![]));
        repo.expect_mark_integration_synced()
            .times(1)
            .returning(|_, _| Ok(()));
        let dispatcher = MockAutomationDispatcher::new();

        let report =
            sync_integration(&repo, &api, &dispatcher, &integration(None, None), now()).unwrap();
        assert_eq!(
            report,
            SyncReport {
                chats_seen: 2,
                processed: 1,
                skipped: 1,
                failed: 0,
                contacts_created: 1,
                deals_created: 1,
            }
        );
    }

    #[test]
    fn final_logs_are_not_reprocessed() {
        let mut api = MockAvitoApi::new();
        api.expect_request_token().never();
        api.expect_get_self_account().never();
        api.expect_list_chats()
            .returning(|_, _, _, _| Ok(vec![chat("a", 7, None, None)]));
        api.expect_list_messages().never();

        let mut repo = MockRepository::new();
        repo.expect_get_advertising_log()
            .returning(|_, _| Ok(Some(log(LogStatus::Processed))));
        repo.expect_mark_integration_synced()
            .times(1)
            .returning(|_, _| Ok(()));
        let dispatcher = MockAutomationDispatcher::new();

        let report = sync_integration(
            &repo,
            &api,
            &dispatcher,
            &integration(Some(fresh_token()), Some(ACCOUNT)),
            now(),
        )
        .unwrap();
        assert_eq!(report.chats_seen, 1);
        assert_eq!(report.processed + report.skipped + report.failed, 0);
    }

    #[test]
    fn failed_chat_is_logged_and_sync_continues() {
        let mut api = MockAvitoApi::new();
        api.expect_list_chats().returning(|_, _, _, _| {
            Ok(vec![chat("a", 7, None, None), chat("b", 8, None, None)])
        });
        api.expect_list_messages().returning(|_, _, chat_id| {
            if chat_id == "a" {
                Err(IntegrationError::Status {
                    status: 500,
                    body: "boom".to_string(),
                })
            } else {
                Ok(vec![])
            }
        });

        let mut repo = MockRepository::new();
        // A failed log is retried.
        repo.expect_get_advertising_log()
            .returning(|_, _| Ok(Some(log(LogStatus::Failed))));
        repo.expect_record_advertising_log()
            .withf(|log| {
                (log.external_id == "chat:a"
                    && log.status == LogStatus::Failed
                    && log.message.as_deref().is_some_and(|m| m.contains("500")))
                    || (log.external_id == "chat:b" && log.status == LogStatus::Skipped)
            })
            .times(2)
            .returning(|log| Ok(echo_log(log)));
        repo.expect_mark_integration_synced()
            .times(1)
            .returning(|_, _| Ok(()));
        let dispatcher = MockAutomationDispatcher::new();

        let report = sync_integration(
            &repo,
            &api,
            &dispatcher,
            &integration(Some(fresh_token()), Some(ACCOUNT)),
            now(),
        )
        .unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn unauthorized_aborts_sync() {
        let mut api = MockAvitoApi::new();
        api.expect_list_chats()
            .returning(|_, _, _, _| Err(IntegrationError::Unauthorized));

        let mut repo = MockRepository::new();
        repo.expect_mark_integration_synced().never();
        let dispatcher = MockAutomationDispatcher::new();

        let result = sync_integration(
            &repo,
            &api,
            &dispatcher,
            &integration(Some(fresh_token()), Some(ACCOUNT)),
            now(),
        );
        assert!(matches!(result, Err(ServiceError::UpstreamUnauthorized)));
    }

    #[test]
    fn chats_are_paged_until_short_page() {
        let mut api = MockAvitoApi::new();
        api.expect_list_chats()
            .times(2)
            .returning(|_, _, limit, offset| {
                let count = if offset == 0 { limit } else { 3 };
                Ok((0..count)
                    .map(|i| chat(&format!("{offset}-{i}"), 7, None, None))
                    .collect())
            });

        let mut repo = MockRepository::new();
        repo.expect_get_advertising_log()
            .returning(|_, _| Ok(Some(log(LogStatus::Skipped))));
        repo.expect_mark_integration_synced()
            .returning(|_, _| Ok(()));
        let dispatcher = MockAutomationDispatcher::new();

        let report = sync_integration(
            &repo,
            &api,
            &dispatcher,
            &integration(Some(fresh_token()), Some(ACCOUNT)),
            now(),
        )
        .unwrap();
        assert_eq!(report.chats_seen, CHATS_PAGE_LIMIT + 3);
    }

    #[test]
    fn paging_stops_at_max_offset() {
        let mut api = MockAvitoApi::new();
        api.expect_list_chats()
            .times(CHATS_MAX_OFFSET / CHATS_PAGE_LIMIT)
            .returning(|_, _, limit, _| Ok(vec![chat("same", 7, None, None); limit]));

        let mut repo = MockRepository::new();
        repo.expect_get_advertising_log()
            .returning(|_, _| Ok(Some(log(LogStatus::Processed))));
        repo.expect_mark_integration_synced()
            .returning(|_, _| Ok(()));
        let dispatcher = MockAutomationDispatcher::new();

        let report = sync_integration(
            &repo,
            &api,
            &dispatcher,
            &integration(Some(fresh_token()), Some(ACCOUNT)),
            now(),
        )
        .unwrap();
        assert_eq!(report.chats_seen, CHATS_MAX_OFFSET);
    }

    fn single_chat_api(runs: usize, chat: fn() -> AvitoChat) -> MockAvitoApi {
        let mut api = MockAvitoApi::new();
        api.expect_list_chats()
            .times(runs)
            .returning(move |_, _, _, _| Ok(vec![chat()]));
        api.expect_list_messages()
            .times(runs)
            .returning(|_, _, _| Ok(vec![message(9, "Still for sale?", 1)]));
        api
    }

    #[test]
    fn failed_chat_is_retried_without_duplicate_records() {
        let api = single_chat_api(2, || chat("a", 9, Some("Sofa"), None));

        let mut repo = MockRepository::new();
        repo.expect_get_advertising_log()
            .returning(|_, _| Ok(Some(log(LogStatus::Failed))));
        let mut seq = Sequence::new();
        repo.expect_ingest_lead()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(RepositoryError::ConnectionError("database is locked".into())));
        repo.expect_ingest_lead()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|lead| Ok(ingested(lead, true)));
        repo.expect_record_advertising_log()
            .withf(|log| log.external_id == "chat:a" && log.status == LogStatus::Failed)
            .times(1)
            .returning(|log| Ok(echo_log(log)));
        // Automations fire only once the records are committed.
        repo.expect_list_active_automations()
            .times(2)
            .returning(|_, _| Ok(vec![]));
        repo.expect_mark_integration_synced()
            .times(2)
            .returning(|_, _| Ok(()));
        let dispatcher = MockAutomationDispatcher::new();
        let integration = integration(Some(fresh_token()), Some(ACCOUNT));

        let first = sync_integration(&repo, &api, &dispatcher, &integration, now()).unwrap();
        assert_eq!(first.failed, 1);
        assert_eq!(first.deals_created, 0);

        let second = sync_integration(&repo, &api, &dispatcher, &integration, now()).unwrap();
        assert_eq!(second.processed, 1);
        assert_eq!(first.deals_created + second.deals_created, 1);
        assert_eq!(first.contacts_created + second.contacts_created, 1);
    }

    #[test]
    fn deals_are_not_created_when_disabled() {
        let api = single_chat_api(1, || chat("a", 9, Some("Sofa"), Some("100 ₽")));

        let mut repo = MockRepository::new();
        repo.expect_get_advertising_log().returning(|_, _| Ok(None));
        repo.expect_ingest_lead()
            .withf(|lead| lead.deal.is_none())
            .times(1)
            .returning(|lead| Ok(ingested(lead, true)));
        repo.expect_list_active_automations()
            .returning(|_, _| Ok(vec![]));
        repo.expect_mark_integration_synced()
            .returning(|_, _| Ok(()));
        let dispatcher = MockAutomationDispatcher::new();
        let mut integration = integration(Some(fresh_token()), Some(ACCOUNT));
        integration.create_deals = false;

        let report = sync_integration(&repo, &api, &dispatcher, &integration, now()).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.contacts_created, 1);
        assert_eq!(report.deals_created, 0);
    }

    #[test]
    fn known_contact_is_reused_without_contact_created_event() {
        let api = single_chat_api(1, || chat("a", 9, Some("Sofa"), None));

        let mut repo = MockRepository::new();
        repo.expect_get_advertising_log().returning(|_, _| Ok(None));
        repo.expect_ingest_lead()
            .withf(|lead| lead.contact.external_ref.as_ref().map(|r| r.as_str()) == Some("avito:9"))
            .times(1)
            .returning(|lead| Ok(ingested(lead, false)));
        repo.expect_list_active_automations()
            .withf(|_, event| *event == AutomationEvent::LeadCreated)
            .times(1)
            .returning(|_, _| Ok(vec![]));
        repo.expect_mark_integration_synced()
            .returning(|_, _| Ok(()));
        let dispatcher = MockAutomationDispatcher::new();

        let report = sync_integration(
            &repo,
            &api,
            &dispatcher,
            &integration(Some(fresh_token()), Some(ACCOUNT)),
            now(),
        )
        .unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.contacts_created, 0);
        assert_eq!(report.deals_created, 1);
    }

    #[test]
    fn nameless_user_and_untitled_chat_get_fallback_names() {
        let api = single_chat_api(1, || bare_chat("u2i-5", 9));

        let mut repo = MockRepository::new();
        repo.expect_get_advertising_log().returning(|_, _| Ok(None));
        repo.expect_ingest_lead()
            .withf(|lead| {
                lead.contact.name.as_str() == "Avito 9"
                    && lead.deal.as_ref().is_some_and(|deal| {
                        deal.title.as_str() == "Avito chat u2i-5" && deal.amount.is_none()
                    })
                    && lead.event_data["item_title"].is_null()
            })
            .times(1)
            .returning(|lead| Ok(ingested(lead, true)));
        repo.expect_list_active_automations()
            .returning(|_, _| Ok(vec![]));
        repo.expect_mark_integration_synced()
            .returning(|_, _| Ok(()));
        let dispatcher = MockAutomationDispatcher::new();

        let report = sync_integration(
            &repo,
            &api,
            &dispatcher,
            &integration(Some(fresh_token()), Some(ACCOUNT)),
            now(),
        )
        .unwrap();
        assert_eq!(report.processed, 1);
    }

    #[test]
    fn out_of_range_token_lifetime_is_rejected() {
        let mut api = MockAvitoApi::new();
        api.expect_request_token().returning(|_, _| {
            Ok(TokenResponse {
                access_token: "tok".to_string(),
                expires_in: i64::MAX,
            })
        });
        api.expect_list_chats().never();

        let mut repo = MockRepository::new();
        repo.expect_store_access_token().never();
        repo.expect_mark_integration_synced().never();
        let dispatcher = MockAutomationDispatcher::new();

        let result = sync_integration(
            &repo,
            &api,
            &dispatcher,
            &integration(None, Some(ACCOUNT)),
            now(),
        );
        assert!(matches!(result, Err(ServiceError::Upstream(_))));
    }

    #[test]
    fn negative_token_lifetime_expires_immediately() {
        let at = now();
        let mut api = MockAvitoApi::new();
        api.expect_request_token().returning(|_, _| {
            Ok(TokenResponse {
                access_token: "tok".to_string(),
                expires_in: -30,
            })
        });
        api.expect_list_chats().returning(|_, _, _, _| Ok(vec![]));

        let mut repo = MockRepository::new();
        repo.expect_store_access_token()
            .withf(move |_, token| token.token == "tok" && token.expires_at == at)
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_mark_integration_synced()
            .returning(|_, _| Ok(()));
        let dispatcher = MockAutomationDispatcher::new();

        let report = sync_integration(
            &repo,
            &api,
            &dispatcher,
            &integration(None, Some(ACCOUNT)),
            at,
        )
        .unwrap();
        assert_eq!(report.chats_seen, 0);
    }

    #[test]
    fn earliest_incoming_text_wins() {
        let messages = vec![
            message(ACCOUNT, "Reply", 3),
            message(7, "Second", 2),
            message(7, "First", 1),
        ];
        assert_eq!(first_incoming_text(&messages, ACCOUNT), Some("First"));
        assert_eq!(first_incoming_text(&messages[..1], ACCOUNT), None);
    }

    #[test]
    fn keys_and_refs() {
        assert_eq!(chat_external_id("u2i-1"), "chat:u2i-1");
        assert_eq!(avito_external_ref(7), "avito:7");
    }
}
