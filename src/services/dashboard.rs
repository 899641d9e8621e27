use chrono::Utc;

use crate::SERVICE_ACCESS_ROLE;
use crate::domain::dashboard::DashboardSummary;
use crate::domain::types::HubId;
use crate::models::auth::AuthenticatedUser;
use crate::repository::DashboardReader;
use crate::services::{ServiceResult, ensure_role};

/// Pipeline, task and lead counters of the user's hub.
pub fn summary<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<DashboardSummary>
where
    R: DashboardReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    Ok(repo.dashboard_summary(HubId::new(user.hub_id)?, Utc::now().naive_utc())?)
}
