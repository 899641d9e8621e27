use chrono::{Duration, Utc};
use serde_json::json;
use tenant_crm::domain::automation::{AutomationChannel, AutomationEvent, NewAutomation};
use tenant_crm::domain::contact::{NewContact, UpdateContact};
use tenant_crm::domain::contact_event::{ContactEventType, NewContactEvent};
use tenant_crm::domain::deal::{DealStage, NewDeal};
use tenant_crm::domain::integration::{
    AccessToken, AdvertisingPlatform, IntegrationSettings, LeadDeal, LogStatus,
    NewAdvertisingIntegration, NewAdvertisingLog, NewLead,
};
use tenant_crm::domain::manager::NewManager;
use tenant_crm::domain::task::NewTask;
use tenant_crm::domain::types::{
    Amount, ContactId, ContactName, DealTitle, Email, ExternalRef, HubId, IntegrationId,
    ManagerName, NonEmptyString, TaskTitle,
};
use tenant_crm::repository::errors::RepositoryError;
use tenant_crm::repository::{
    AdvertisingLogListQuery, AutomationReader, AutomationWriter, ContactEventListQuery,
    ContactEventReader, ContactEventWriter, ContactListQuery, ContactReader, ContactWriter,
    DashboardReader, DealListQuery, DealReader, DealWriter, DieselRepository, IntegrationReader,
    IntegrationWriter, ManagerWriter, TaskListQuery, TaskReader, TaskWriter,
};

mod common;

fn hub(id: i32) -> HubId {
    HubId::new(id).unwrap()
}

fn new_contact(hub_id: i32, name: &str, email: Option<&str>) -> NewContact {
    NewContact::new(hub(hub_id), ContactName::new(name).unwrap())
        .with_email(email.map(|email| Email::new(email).unwrap()))
}

fn seed_contact(repo: &DieselRepository, name: &str, email: &str) -> ContactId {
    repo.create_contact(&new_contact(1, name, Some(email)))
        .unwrap()
        .id
}

#[test]
fn test_contact_repository_crud() {
    let test_db = common::TestDb::new("test_contact_repository_crud.db");
    let repo = test_db.repo();

    let inserted = repo
        .create_contacts(&[
            new_contact(1, "Alice", Some("alice@example.com")),
            new_contact(1, "Bob", Some("bob@example.com")),
            new_contact(2, "Carol", Some("alice@example.com")),
        ])
        .unwrap();
    assert_eq!(inserted, 3);

    let (total, items) = repo.list_contacts(ContactListQuery::new(hub(1))).unwrap();
    assert_eq!(total, 2);
    assert_eq!(items[0].name.as_str(), "Alice");
    assert_eq!(items[1].name.as_str(), "Bob");

    let (found, items) = repo
        .list_contacts(ContactListQuery::new(hub(1)).search("bob@"))
        .unwrap();
    assert_eq!(found, 1);
    let bob = items[0].clone();

    let updated = repo
        .update_contact(
            bob.id,
            hub(1),
            &UpdateContact {
                name: ContactName::new("Bobby").unwrap(),
                email: bob.email.clone(),
                phone: None,
                company: None,
            },
        )
        .unwrap();
    assert_eq!(updated.name.as_str(), "Bobby");

    // Other hubs cannot see or touch the contact.
    assert!(repo.get_contact_by_id(bob.id, hub(2)).unwrap().is_none());
    assert!(matches!(
        repo.delete_contact(bob.id, hub(2)),
        Err(RepositoryError::NotFound)
    ));

    repo.delete_contact(bob.id, hub(1)).unwrap();
    assert!(repo.get_contact_by_id(bob.id, hub(1)).unwrap().is_none());
}

#[test]
fn test_duplicate_contacts_are_rejected_or_skipped() {
    let test_db = common::TestDb::new("test_duplicate_contacts.db");
    let repo = test_db.repo();

    seed_contact(&repo, "Alice", "alice@example.com");
    assert!(matches!(
        repo.create_contact(&new_contact(1, "Alice 2", Some("alice@example.com"))),
        Err(RepositoryError::Duplicate(_))
    ));

    let inserted = repo
        .create_contacts(&[
            new_contact(1, "Alice again", Some("alice@example.com")),
            new_contact(1, "Dave", Some("dave@example.com")),
            new_contact(1, "No email", None),
            new_contact(1, "No email either", None),
        ])
        .unwrap();
    assert_eq!(inserted, 3);

    let avito = NewContact::new(hub(1), ContactName::new("Buyer").unwrap())
        .with_external_ref(Some(ExternalRef::new("avito:7").unwrap()));
    let created = repo.create_contact(&avito).unwrap();
    let found = repo
        .get_contact_by_external_ref(&ExternalRef::new("avito:7").unwrap(), hub(1))
        .unwrap()
        .unwrap();
    assert_eq!(found.id, created.id);
    assert!(matches!(
        repo.create_contact(&avito),
        Err(RepositoryError::Duplicate(_))
    ));
}

#[test]
fn test_deal_repository_and_cascade() {
    let test_db = common::TestDb::new("test_deal_repository.db");
    let repo = test_db.repo();
    let alice = seed_contact(&repo, "Alice", "alice@example.com");

    let sofa = repo
        .create_deal(&NewDeal::new(
            hub(1),
            alice,
            DealTitle::new("Sofa").unwrap(),
            Some(Amount::new(1_500_000).unwrap()),
        ))
        .unwrap();
    repo.create_deal(&NewDeal::new(
        hub(1),
        alice,
        DealTitle::new("Chair").unwrap(),
        None,
    ))
    .unwrap();
    assert_eq!(sofa.stage, DealStage::New);

    let won = repo.update_deal_stage(sofa.id, hub(1), DealStage::Won).unwrap();
    assert_eq!(won.stage, DealStage::Won);

    let (total, deals) = repo
        .list_deals(DealListQuery::new(hub(1)).stage(DealStage::Won))
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(deals[0].id, sofa.id);

    let (total, _) = repo
        .list_deals(DealListQuery::new(hub(1)).contact(alice).paginate(1, 1))
        .unwrap();
    assert_eq!(total, 2);

    // Deleting the contact removes its deals.
    repo.delete_contact(alice, hub(1)).unwrap();
    assert!(repo.get_deal_by_id(sofa.id, hub(1)).unwrap().is_none());
}

#[test]
fn test_task_completion_is_idempotent() {
    let test_db = common::TestDb::new("test_task_completion.db");
    let repo = test_db.repo();
    let now = Utc::now().naive_utc();

    let task = repo
        .create_task(&NewTask {
            hub_id: hub(1),
            contact_id: None,
            deal_id: None,
            title: TaskTitle::new("Call back").unwrap(),
            due_at: Some(now - Duration::days(1)),
        })
        .unwrap();

    let first = repo.complete_task(task.id, hub(1), now).unwrap();
    let second = repo
        .complete_task(task.id, hub(1), now + Duration::hours(2))
        .unwrap();
    assert_eq!(first.completed_at, Some(now));
    assert_eq!(second.completed_at, Some(now));

    let (open, _) = repo
        .list_tasks(TaskListQuery::new(hub(1)).open_only())
        .unwrap();
    assert_eq!(open, 0);
    let (all, _) = repo.list_tasks(TaskListQuery::new(hub(1))).unwrap();
    assert_eq!(all, 1);
}

#[test]
fn test_contact_events_with_managers() {
    let test_db = common::TestDb::new("test_contact_events.db");
    let repo = test_db.repo();
    let alice = seed_contact(&repo, "Alice", "alice@example.com");

    let manager = repo
        .create_or_update_manager(&NewManager::new(
            hub(1),
            ManagerName::new("Manager").unwrap(),
            Email::new("manager@example.com").unwrap(),
        ))
        .unwrap();
    let renamed = repo
        .create_or_update_manager(&NewManager::new(
            hub(1),
            ManagerName::new("Renamed").unwrap(),
            Email::new("manager@example.com").unwrap(),
        ))
        .unwrap();
    assert_eq!(manager.id, renamed.id);
    assert_eq!(renamed.name.as_str(), "Renamed");

    repo.create_contact_event(&NewContactEvent::new(
        alice,
        None,
        ContactEventType::Lead,
        json!({"text": "Is it available?"}),
    ))
    .unwrap();
    repo.create_contact_event(&NewContactEvent::new(
        alice,
        Some(manager.id),
        ContactEventType::Comment,
        json!({"text": "Called back"}),
    ))
    .unwrap();

    let (total, events) = repo
        .list_contact_events(ContactEventListQuery::new(alice))
        .unwrap();
    assert_eq!(total, 2);
    // Newest first.
    assert_eq!(events[0].0.event_type, ContactEventType::Comment);
    assert_eq!(events[0].1.as_ref().unwrap().name.as_str(), "Renamed");
    assert!(events[1].1.is_none());

    let (leads, _) = repo
        .list_contact_events(ContactEventListQuery::new(alice).event_type(ContactEventType::Lead))
        .unwrap();
    assert_eq!(leads, 1);
}

#[test]
fn test_integration_and_log_upsert() {
    let test_db = common::TestDb::new("test_integration_logs.db");
    let repo = test_db.repo();
    let now = Utc::now().naive_utc();

    let new_integration = NewAdvertisingIntegration {
        hub_id: hub(1),
        platform: AdvertisingPlatform::Avito,
        client_id: NonEmptyString::new("client").unwrap(),
        client_secret: NonEmptyString::new("secret").unwrap(),
        create_deals: true,
    };
    let integration = repo.create_integration(&new_integration).unwrap();
    assert!(integration.is_active);
    assert!(integration.access_token.is_none());
    assert!(matches!(
        repo.create_integration(&new_integration),
        Err(RepositoryError::Duplicate(_))
    ));

    let token = AccessToken {
        token: "token".to_string(),
        expires_at: now + Duration::hours(24),
    };
    repo.store_access_token(integration.id, &token).unwrap();
    repo.store_account_id(integration.id, 42).unwrap();
    repo.mark_integration_synced(integration.id, now).unwrap();

    let stored = repo
        .get_integration_by_id(integration.id, hub(1))
        .unwrap()
        .unwrap();
    assert_eq!(stored.fresh_token(now).map(|t| t.token.as_str()), Some("token"));
    assert_eq!(stored.account_id, Some(42));
    assert_eq!(stored.last_synced_at, Some(now));

    repo.record_advertising_log(
        &NewAdvertisingLog::new(integration.id, "chat:a".to_string(), LogStatus::Failed)
            .with_message("timeout"),
    )
    .unwrap();
    let retried = repo
        .record_advertising_log(&NewAdvertisingLog::new(
            integration.id,
            "chat:a".to_string(),
            LogStatus::Processed,
        ))
        .unwrap();
    assert_eq!(retried.status, LogStatus::Processed);
    assert!(retried.message.is_none());

    let (total, logs) = repo
        .list_advertising_logs(AdvertisingLogListQuery::new(integration.id))
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(logs[0].external_id, "chat:a");

    let disabled = repo
        .update_integration_settings(
            integration.id,
            hub(1),
            IntegrationSettings {
                is_active: false,
                create_deals: false,
            },
        )
        .unwrap();
    assert!(!disabled.is_active);
    assert!(repo.list_active_integrations().unwrap().is_empty());

    repo.delete_integration(integration.id, hub(1)).unwrap();
    assert!(
        repo.get_advertising_log(integration.id, "chat:a")
            .unwrap()
            .is_none()
    );
}

fn avito_lead(integration_id: IntegrationId, chat_id: &str, deal: Option<LeadDeal>) -> NewLead {
    NewLead {
        integration_id,
        external_id: format!("chat:{chat_id}"),
        contact: NewContact::new(hub(1), ContactName::new("Buyer").unwrap())
            .with_source(Some(NonEmptyString::new("avito").unwrap()))
            .with_external_ref(Some(ExternalRef::new("avito:9").unwrap())),
        deal,
        event_data: json!({"text": "Is it available?", "chat_id": chat_id}),
    }
}

fn avito_integration(repo: &DieselRepository) -> IntegrationId {
    repo.create_integration(&NewAdvertisingIntegration {
        hub_id: hub(1),
        platform: AdvertisingPlatform::Avito,
        client_id: NonEmptyString::new("client").unwrap(),
        client_secret: NonEmptyString::new("secret").unwrap(),
        create_deals: true,
    })
    .unwrap()
    .id
}

#[test]
fn test_ingest_lead_stores_records_and_reuses_contact() {
    let test_db = common::TestDb::new("test_ingest_lead.db");
    let repo = test_db.repo();
    let integration_id = avito_integration(&repo);

    let first = repo
        .ingest_lead(&avito_lead(
            integration_id,
            "c1",
            Some(LeadDeal {
                title: DealTitle::new("Sofa").unwrap(),
                amount: Some(Amount::new(1_500_000).unwrap()),
            }),
        ))
        .unwrap();
    assert!(first.contact_created);
    let deal = first.deal.unwrap();
    assert_eq!(deal.title.as_str(), "Sofa");
    assert_eq!(deal.stage, DealStage::New);
    assert_eq!(deal.contact_id, first.contact.id);

    let log = repo
        .get_advertising_log(integration_id, "chat:c1")
        .unwrap()
        .unwrap();
    assert_eq!(log.status, LogStatus::Processed);
    assert_eq!(log.contact_id, Some(first.contact.id));
    assert_eq!(log.deal_id, Some(deal.id));

    let second = repo
        .ingest_lead(&avito_lead(integration_id, "c2", None))
        .unwrap();
    assert!(!second.contact_created);
    assert_eq!(second.contact.id, first.contact.id);
    assert!(second.deal.is_none());

    let log = repo
        .get_advertising_log(integration_id, "chat:c2")
        .unwrap()
        .unwrap();
    assert_eq!(log.contact_id, Some(first.contact.id));
    assert!(log.deal_id.is_none());

    let (contacts, _) = repo.list_contacts(ContactListQuery::new(hub(1))).unwrap();
    assert_eq!(contacts, 1);
    let (deals, _) = repo.list_deals(DealListQuery::new(hub(1))).unwrap();
    assert_eq!(deals, 1);
    let (_, events) = repo
        .list_contact_events(ContactEventListQuery::new(first.contact.id))
        .unwrap();
    assert_eq!(events.len(), 2);
    assert!(
        events
            .iter()
            .all(|(event, _)| event.event_type == ContactEventType::Lead)
    );
}

#[test]
fn test_failed_ingest_lead_leaves_no_records() {
    let test_db = common::TestDb::new("test_ingest_lead_rollback.db");
    let repo = test_db.repo();
    let missing_integration = IntegrationId::new(999).unwrap();

    let result = repo.ingest_lead(&avito_lead(
        missing_integration,
        "c1",
        Some(LeadDeal {
            title: DealTitle::new("Sofa").unwrap(),
            amount: None,
        }),
    ));
    assert!(result.is_err());

    let (contacts, _) = repo.list_contacts(ContactListQuery::new(hub(1))).unwrap();
    assert_eq!(contacts, 0);
    let (deals, _) = repo.list_deals(DealListQuery::new(hub(1))).unwrap();
    assert_eq!(deals, 0);
    assert!(
        repo.get_contact_by_external_ref(&ExternalRef::new("avito:9").unwrap(), hub(1))
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_active_automations_by_event() {
    let test_db = common::TestDb::new("test_automations.db");
    let repo = test_db.repo();

    let webhook = repo
        .create_automation(&NewAutomation {
            hub_id: hub(1),
            event: AutomationEvent::LeadCreated,
            channel: AutomationChannel::Webhook,
            target: NonEmptyString::new("https://hooks.example.com").unwrap(),
            secret: None,
        })
        .unwrap();
    repo.create_automation(&NewAutomation {
        hub_id: hub(1),
        event: AutomationEvent::DealStageChanged,
        channel: AutomationChannel::Telegram,
        target: NonEmptyString::new("-100").unwrap(),
        secret: Some(NonEmptyString::new("123:abc").unwrap()),
    })
    .unwrap();

    let active = repo
        .list_active_automations(hub(1), AutomationEvent::LeadCreated)
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, webhook.id);
    assert_eq!(repo.list_automations(hub(1)).unwrap().len(), 2);
    assert!(repo.list_automations(hub(2)).unwrap().is_empty());

    repo.delete_automation(webhook.id, hub(1)).unwrap();
    assert!(
        repo.list_active_automations(hub(1), AutomationEvent::LeadCreated)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_dashboard_summary() {
    let test_db = common::TestDb::new("test_dashboard.db");
    let repo = test_db.repo();
    let now = Utc::now().naive_utc();
    let alice = seed_contact(&repo, "Alice", "alice@example.com");
    seed_contact(&repo, "Bob", "bob@example.com");

    let won = repo
        .create_deal(&NewDeal::new(
            hub(1),
            alice,
            DealTitle::new("Sofa").unwrap(),
            Some(Amount::new(1_000).unwrap()),
        ))
        .unwrap();
    repo.update_deal_stage(won.id, hub(1), DealStage::Won).unwrap();
    repo.create_deal(&NewDeal::new(
        hub(1),
        alice,
        DealTitle::new("Chair").unwrap(),
        Some(Amount::new(250).unwrap()),
    ))
    .unwrap();

    for due in [Some(now - Duration::days(1)), Some(now + Duration::days(1)), None] {
        repo.create_task(&NewTask {
            hub_id: hub(1),
            contact_id: Some(alice),
            deal_id: None,
            title: TaskTitle::new("Follow up").unwrap(),
            due_at: due,
        })
        .unwrap();
    }

    repo.create_contact_event(&NewContactEvent::new(
        alice,
        None,
        ContactEventType::Lead,
        json!({"text": "Hi"}),
    ))
    .unwrap();

    let summary = repo.dashboard_summary(hub(1), now).unwrap();
    assert_eq!(summary.contacts, 2);
    assert_eq!(summary.stages.len(), DealStage::ALL.len());
    let new = summary
        .stages
        .iter()
        .find(|stage| stage.stage == DealStage::New)
        .unwrap();
    assert_eq!((new.count, new.amount), (1, 250));
    assert_eq!(summary.won_amount, 1_000);
    assert_eq!(summary.open_tasks, 3);
    assert_eq!(summary.overdue_tasks, 1);
    assert_eq!(summary.recent_leads, 1);

    let other = repo.dashboard_summary(hub(2), now).unwrap();
    assert_eq!(other.contacts, 0);
    assert_eq!(other.recent_leads, 0);
}
