use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{ContactId, DealId, HubId, TaskId, TaskTitle};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub hub_id: HubId,
    pub contact_id: Option<ContactId>,
    pub deal_id: Option<DealId>,
    pub title: TaskTitle,
    pub due_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Open task whose due date has already passed.
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        !self.is_completed() && self.due_at.is_some_and(|due| due < now)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewTask {
    pub hub_id: HubId,
    pub contact_id: Option<ContactId>,
    pub deal_id: Option<DealId>,
    pub title: TaskTitle,
    pub due_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn task(due_at: Option<NaiveDateTime>, completed_at: Option<NaiveDateTime>) -> Task {
        let now = Utc::now().naive_utc();
        Task {
            id: TaskId::new(1).unwrap(),
            hub_id: HubId::new(1).unwrap(),
            contact_id: None,
            deal_id: None,
            title: TaskTitle::new("Call back").unwrap(),
            due_at,
            completed_at,
            created_at: now,
        }
    }

    #[test]
    fn overdue_only_when_open_and_past_due() {
        let now = Utc::now().naive_utc();
        let yesterday = now - Duration::days(1);
        let tomorrow = now + Duration::days(1);

        assert!(task(Some(yesterday), None).is_overdue(now));
        assert!(!task(Some(tomorrow), None).is_overdue(now));
        assert!(!task(Some(yesterday), Some(now)).is_overdue(now));
        assert!(!task(None, None).is_overdue(now));
    }
}
