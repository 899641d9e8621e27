use chrono::{Duration, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::contact_event::ContactEventType;
use crate::domain::dashboard::{DashboardSummary, RECENT_LEADS_DAYS, StageSummary};
use crate::domain::deal::DealStage;
use crate::domain::types::HubId;
use crate::repository::errors::RepositoryResult;
use crate::repository::{DashboardReader, DieselRepository};

impl DashboardReader for DieselRepository {
    fn dashboard_summary(
        &self,
        hub_id: HubId,
        now: NaiveDateTime,
    ) -> RepositoryResult<DashboardSummary> {
        use crate::schema::{contact_events, contacts, deals, tasks};

        let mut conn = self.conn()?;
        let hub = hub_id.get();

        let contact_count = contacts::table
            .filter(contacts::hub_id.eq(hub))
            .count()
            .get_result::<i64>(&mut conn)?;

        let deal_rows = deals::table
            .filter(deals::hub_id.eq(hub))
            .select((deals::stage, deals::amount))
            .load::<(String, Option<i64>)>(&mut conn)?;

        let mut stages: Vec<StageSummary> = DealStage::ALL
            .iter()
            .map(|stage| StageSummary {
                stage: *stage,
                count: 0,
                amount: 0,
            })
            .collect();

        for (stage, amount) in deal_rows {
            let stage = stage.parse::<DealStage>()?;
            if let Some(summary) = stages.iter_mut().find(|summary| summary.stage == stage) {
                summary.count += 1;
                summary.amount += amount.unwrap_or(0);
            }
        }

        let won_amount = stages
            .iter()
            .find(|summary| summary.stage == DealStage::Won)
            .map_or(0, |summary| summary.amount);

        let open_tasks = tasks::table
            .filter(tasks::hub_id.eq(hub))
            .filter(tasks::completed_at.is_null())
            .count()
            .get_result::<i64>(&mut conn)?;

        let overdue_tasks = tasks::table
            .filter(tasks::hub_id.eq(hub))
            .filter(tasks::completed_at.is_null())
            .filter(tasks::due_at.lt(now))
            .count()
            .get_result::<i64>(&mut conn)?;

        let recent_leads = contact_events::table
            .inner_join(contacts::table)
            .filter(contacts::hub_id.eq(hub))
            .filter(contact_events::event_type.eq(ContactEventType::Lead.to_string()))
            .filter(contact_events::created_at.ge(now - Duration::days(RECENT_LEADS_DAYS)))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(DashboardSummary {
            contacts: contact_count,
            stages,
            won_amount,
            open_tasks,
            overdue_tasks,
            recent_leads,
        })
    }
}
