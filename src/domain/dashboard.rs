use serde::Serialize;

use crate::domain::deal::DealStage;

/// Per-stage deal aggregate.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: DealStage,
    pub count: i64,
    /// Sum of known amounts in minor units.
    pub amount: i64,
}

/// Hub-level analytics shown on the dashboard.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DashboardSummary {
    pub contacts: i64,
    pub stages: Vec<StageSummary>,
    pub won_amount: i64,
    pub open_tasks: i64,
    pub overdue_tasks: i64,
    pub recent_leads: i64,
}

/// Window over which ingested leads are counted.
pub const RECENT_LEADS_DAYS: i64 = 30;
