//! Persistence traits and their Diesel implementation.
//!
//! Services depend on the reader/writer traits only, so they can be exercised
//! against mocks; [`DieselRepository`] implements all of them over SQLite.

use chrono::NaiveDateTime;

use crate::db::{DbConnection, DbPool};
use crate::domain::automation::{Automation, AutomationEvent, NewAutomation};
use crate::domain::contact::{Contact, NewContact, UpdateContact};
use crate::domain::contact_event::{ContactEvent, ContactEventType, NewContactEvent};
use crate::domain::dashboard::DashboardSummary;
use crate::domain::deal::{Deal, DealStage, NewDeal, UpdateDeal};
use crate::domain::integration::{
    AccessToken, AdvertisingIntegration, AdvertisingLog, IngestedLead, IntegrationSettings,
    NewAdvertisingIntegration, NewAdvertisingLog, NewLead,
};
use crate::domain::manager::{Manager, NewManager};
use crate::domain::task::{NewTask, Task};
use crate::domain::types::{
    AutomationId, ContactId, DealId, Email, ExternalRef, HubId, IntegrationId, TaskId,
};
use crate::repository::errors::RepositoryResult;

pub mod automation;
pub mod contact;
pub mod contact_event;
pub mod dashboard;
pub mod deal;
pub mod errors;
pub mod integration;
pub mod manager;
pub mod task;

#[cfg(feature = "test-mocks")]
pub mod mock;

/// Diesel-backed repository shared by all handlers.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Saturates at `i64::MAX`, which selects an empty page.
    pub(crate) fn offset(&self) -> i64 {
        let offset = (self.page.max(1) - 1).saturating_mul(self.per_page);
        i64::try_from(offset).unwrap_or(i64::MAX)
    }

    pub(crate) fn limit(&self) -> i64 {
        i64::try_from(self.per_page).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactListQuery {
    pub hub_id: HubId,
    pub search: Option<String>,
    pub pagination: Option<Pagination>,
}

impl ContactListQuery {
    pub fn new(hub_id: HubId) -> Self {
        Self {
            hub_id,
            search: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealListQuery {
    pub hub_id: HubId,
    pub stage: Option<DealStage>,
    pub contact_id: Option<ContactId>,
    pub pagination: Option<Pagination>,
}

impl DealListQuery {
    pub fn new(hub_id: HubId) -> Self {
        Self {
            hub_id,
            stage: None,
            contact_id: None,
            pagination: None,
        }
    }

    pub fn stage(mut self, stage: DealStage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn contact(mut self, contact_id: ContactId) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListQuery {
    pub hub_id: HubId,
    pub open_only: bool,
    pub pagination: Option<Pagination>,
}

impl TaskListQuery {
    pub fn new(hub_id: HubId) -> Self {
        Self {
            hub_id,
            open_only: false,
            pagination: None,
        }
    }

    pub fn open_only(mut self) -> Self {
        self.open_only = true;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactEventListQuery {
    pub contact_id: ContactId,
    pub event_type: Option<ContactEventType>,
    pub pagination: Option<Pagination>,
}

impl ContactEventListQuery {
    pub fn new(contact_id: ContactId) -> Self {
        Self {
            contact_id,
            event_type: None,
            pagination: None,
        }
    }

    pub fn event_type(mut self, event_type: ContactEventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingLogListQuery {
    pub integration_id: IntegrationId,
    pub pagination: Option<Pagination>,
}

impl AdvertisingLogListQuery {
    pub fn new(integration_id: IntegrationId) -> Self {
        Self {
            integration_id,
            pagination: None,
        }
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

pub trait ContactReader {
    fn get_contact_by_id(&self, id: ContactId, hub_id: HubId) -> RepositoryResult<Option<Contact>>;
    fn get_contact_by_email(&self, email: &Email, hub_id: HubId)
    -> RepositoryResult<Option<Contact>>;
    fn get_contact_by_external_ref(
        &self,
        external_ref: &ExternalRef,
        hub_id: HubId,
    ) -> RepositoryResult<Option<Contact>>;
    fn list_contacts(&self, query: ContactListQuery) -> RepositoryResult<(usize, Vec<Contact>)>;
}

pub trait ContactWriter {
    fn create_contact(&self, new_contact: &NewContact) -> RepositoryResult<Contact>;
    /// Bulk insert that silently skips rows clashing with existing emails.
    fn create_contacts(&self, new_contacts: &[NewContact]) -> RepositoryResult<usize>;
    fn update_contact(
        &self,
        id: ContactId,
        hub_id: HubId,
        updates: &UpdateContact,
    ) -> RepositoryResult<Contact>;
    fn delete_contact(&self, id: ContactId, hub_id: HubId) -> RepositoryResult<()>;
}

pub trait DealReader {
    fn get_deal_by_id(&self, id: DealId, hub_id: HubId) -> RepositoryResult<Option<Deal>>;
    fn list_deals(&self, query: DealListQuery) -> RepositoryResult<(usize, Vec<Deal>)>;
}

pub trait DealWriter {
    fn create_deal(&self, new_deal: &NewDeal) -> RepositoryResult<Deal>;
    fn update_deal(&self, id: DealId, hub_id: HubId, updates: &UpdateDeal)
    -> RepositoryResult<Deal>;
    fn update_deal_stage(
        &self,
        id: DealId,
        hub_id: HubId,
        stage: DealStage,
    ) -> RepositoryResult<Deal>;
    fn delete_deal(&self, id: DealId, hub_id: HubId) -> RepositoryResult<()>;
}

pub trait TaskReader {
    fn get_task_by_id(&self, id: TaskId, hub_id: HubId) -> RepositoryResult<Option<Task>>;
    fn list_tasks(&self, query: TaskListQuery) -> RepositoryResult<(usize, Vec<Task>)>;
}

pub trait TaskWriter {
    fn create_task(&self, new_task: &NewTask) -> RepositoryResult<Task>;
    /// Sets `completed_at` unless the task is already completed.
    fn complete_task(
        &self,
        id: TaskId,
        hub_id: HubId,
        completed_at: NaiveDateTime,
    ) -> RepositoryResult<Task>;
    fn delete_task(&self, id: TaskId, hub_id: HubId) -> RepositoryResult<()>;
}

pub trait ManagerWriter {
    fn create_or_update_manager(&self, new_manager: &NewManager) -> RepositoryResult<Manager>;
}

pub trait ContactEventReader {
    fn list_contact_events(
        &self,
        query: ContactEventListQuery,
    ) -> RepositoryResult<(usize, Vec<(ContactEvent, Option<Manager>)>)>;
}

pub trait ContactEventWriter {
    fn create_contact_event(&self, event: &NewContactEvent) -> RepositoryResult<ContactEvent>;
}

pub trait IntegrationReader {
    fn get_integration_by_id(
        &self,
        id: IntegrationId,
        hub_id: HubId,
    ) -> RepositoryResult<Option<AdvertisingIntegration>>;
    fn list_integrations(&self, hub_id: HubId) -> RepositoryResult<Vec<AdvertisingIntegration>>;
    /// Active integrations of every hub, for the polling worker.
    fn list_active_integrations(&self) -> RepositoryResult<Vec<AdvertisingIntegration>>;
    fn get_advertising_log(
        &self,
        integration_id: IntegrationId,
        external_id: &str,
    ) -> RepositoryResult<Option<AdvertisingLog>>;
    fn list_advertising_logs(
        &self,
        query: AdvertisingLogListQuery,
    ) -> RepositoryResult<(usize, Vec<AdvertisingLog>)>;
}

pub trait IntegrationWriter {
    fn create_integration(
        &self,
        new_integration: &NewAdvertisingIntegration,
    ) -> RepositoryResult<AdvertisingIntegration>;
    fn update_integration_settings(
        &self,
        id: IntegrationId,
        hub_id: HubId,
        settings: IntegrationSettings,
    ) -> RepositoryResult<AdvertisingIntegration>;
    fn delete_integration(&self, id: IntegrationId, hub_id: HubId) -> RepositoryResult<()>;
    fn store_access_token(&self, id: IntegrationId, token: &AccessToken) -> RepositoryResult<()>;
    fn store_account_id(&self, id: IntegrationId, account_id: i64) -> RepositoryResult<()>;
    fn mark_integration_synced(
        &self,
        id: IntegrationId,
        synced_at: NaiveDateTime,
    ) -> RepositoryResult<()>;
    /// Inserts the log row, replacing an earlier row with the same external id.
    fn record_advertising_log(&self, log: &NewAdvertisingLog) -> RepositoryResult<AdvertisingLog>;
    /// Stores the contact, deal, `Lead` event and `processed` log of a chat
    /// in one transaction.
    fn ingest_lead(&self, lead: &NewLead) -> RepositoryResult<IngestedLead>;
}

pub trait AutomationReader {
    fn list_automations(&self, hub_id: HubId) -> RepositoryResult<Vec<Automation>>;
    fn list_active_automations(
        &self,
        hub_id: HubId,
        event: AutomationEvent,
    ) -> RepositoryResult<Vec<Automation>>;
}

pub trait AutomationWriter {
    fn create_automation(&self, new_automation: &NewAutomation) -> RepositoryResult<Automation>;
    fn delete_automation(&self, id: AutomationId, hub_id: HubId) -> RepositoryResult<()>;
}

pub trait DashboardReader {
    fn dashboard_summary(
        &self,
        hub_id: HubId,
        now: NaiveDateTime,
    ) -> RepositoryResult<DashboardSummary>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_offset_skips_previous_pages() {
        let pagination = Pagination {
            page: 3,
            per_page: 20,
        };
        assert_eq!(pagination.offset(), 40);
        assert_eq!(pagination.limit(), 20);

        let first = Pagination {
            page: 0,
            per_page: 20,
        };
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn pagination_offset_saturates_on_huge_pages() {
        let pagination = Pagination {
            page: usize::MAX,
            per_page: 100,
        };
        assert_eq!(pagination.offset(), i64::MAX);

        let pagination = Pagination {
            page: usize::MAX / 2,
            per_page: 1,
        };
        assert_eq!(pagination.offset(), i64::MAX);
    }
}
