//! Mock repository implementations for isolating services in tests.

use chrono::NaiveDateTime;
use mockall::mock;

use crate::domain::automation::{Automation, AutomationEvent, NewAutomation};
use crate::domain::contact::{Contact, NewContact, UpdateContact};
use crate::domain::contact_event::{ContactEvent, NewContactEvent};
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
use crate::repository::{
    AdvertisingLogListQuery, AutomationReader, AutomationWriter, ContactEventListQuery,
    ContactEventReader, ContactEventWriter, ContactListQuery, ContactReader, ContactWriter,
    DashboardReader, DealListQuery, DealReader, DealWriter, IntegrationReader, IntegrationWriter,
    ManagerWriter, TaskListQuery, TaskReader, TaskWriter,
};

mock! {
    pub Repository {}

    impl ContactReader for Repository {
        fn get_contact_by_id(&self, id: ContactId, hub_id: HubId) -> RepositoryResult<Option<Contact>>;
        fn get_contact_by_email(
            &self,
            email: &Email,
            hub_id: HubId,
        ) -> RepositoryResult<Option<Contact>>;
        fn get_contact_by_external_ref(
            &self,
            external_ref: &ExternalRef,
            hub_id: HubId,
        ) -> RepositoryResult<Option<Contact>>;
        fn list_contacts(&self, query: ContactListQuery) -> RepositoryResult<(usize, Vec<Contact>)>;
    }

    impl ContactWriter for Repository {
        fn create_contact(&self, new_contact: &NewContact) -> RepositoryResult<Contact>;
        fn create_contacts(&self, new_contacts: &[NewContact]) -> RepositoryResult<usize>;
        fn update_contact(
            &self,
            id: ContactId,
            hub_id: HubId,
            updates: &UpdateContact,
        ) -> RepositoryResult<Contact>;
        fn delete_contact(&self, id: ContactId, hub_id: HubId) -> RepositoryResult<()>;
    }

    impl DealReader for Repository {
        fn get_deal_by_id(&self, id: DealId, hub_id: HubId) -> RepositoryResult<Option<Deal>>;
        fn list_deals(&self, query: DealListQuery) -> RepositoryResult<(usize, Vec<Deal>)>;
    }

    impl DealWriter for Repository {
        fn create_deal(&self, new_deal: &NewDeal) -> RepositoryResult<Deal>;
        fn update_deal(&self, id: DealId, hub_id: HubId, updates: &UpdateDeal) -> RepositoryResult<Deal>;
        fn update_deal_stage(
            &self,
            id: DealId,
            hub_id: HubId,
            stage: DealStage,
        ) -> RepositoryResult<Deal>;
        fn delete_deal(&self, id: DealId, hub_id: HubId) -> RepositoryResult<()>;
    }

    impl TaskReader for Repository {
        fn get_task_by_id(&self, id: TaskId, hub_id: HubId) -> RepositoryResult<Option<Task>>;
        fn list_tasks(&self, query: TaskListQuery) -> RepositoryResult<(usize, Vec<Task>)>;
    }

    impl TaskWriter for Repository {
        fn create_task(&self, new_task: &NewTask) -> RepositoryResult<Task>;
        fn complete_task(
            &self,
            id: TaskId,
            hub_id: HubId,
            completed_at: NaiveDateTime,
        ) -> RepositoryResult<Task>;
        fn delete_task(&self, id: TaskId, hub_id: HubId) -> RepositoryResult<()>;
    }

    impl ManagerWriter for Repository {
        fn create_or_update_manager(&self, new_manager: &NewManager) -> RepositoryResult<Manager>;
    }

    impl ContactEventReader for Repository {
        fn list_contact_events(
            &self,
            query: ContactEventListQuery,
        ) -> RepositoryResult<(usize, Vec<(ContactEvent, Option<Manager>)>)>;
    }

    impl ContactEventWriter for Repository {
        fn create_contact_event(&self, event: &NewContactEvent) -> RepositoryResult<ContactEvent>;
    }

    impl IntegrationReader for Repository {
        fn get_integration_by_id(
            &self,
            id: IntegrationId,
            hub_id: HubId,
        ) -> RepositoryResult<Option<AdvertisingIntegration>>;
        fn list_integrations(&self, hub_id: HubId) -> RepositoryResult<Vec<AdvertisingIntegration>>;
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

    impl IntegrationWriter for Repository {
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
        fn record_advertising_log(&self, log: &NewAdvertisingLog) -> RepositoryResult<AdvertisingLog>;
        fn ingest_lead(&self, lead: &NewLead) -> RepositoryResult<IngestedLead>;
    }

    impl AutomationReader for Repository {
        fn list_automations(&self, hub_id: HubId) -> RepositoryResult<Vec<Automation>>;
        fn list_active_automations(
            &self,
            hub_id: HubId,
            event: AutomationEvent,
        ) -> RepositoryResult<Vec<Automation>>;
    }

    impl AutomationWriter for Repository {
        fn create_automation(&self, new_automation: &NewAutomation) -> RepositoryResult<Automation>;
        fn delete_automation(&self, id: AutomationId, hub_id: HubId) -> RepositoryResult<()>;
    }

    impl DashboardReader for Repository {
        fn dashboard_summary(
            &self,
            hub_id: HubId,
            now: NaiveDateTime,
        ) -> RepositoryResult<DashboardSummary>;
    }
}
