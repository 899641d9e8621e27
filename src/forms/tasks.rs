use chrono::NaiveDateTime;
use serde::Deserialize;
use validator::Validate;

use crate::domain::task::NewTask;
use crate::domain::types::{ContactId, DealId, HubId, TaskTitle};
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
pub struct AddTaskForm {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub contact_id: Option<i32>,
    #[serde(default)]
    pub deal_id: Option<i32>,
    /// UTC, `YYYY-MM-DDTHH:MM:SS`.
    #[serde(default)]
    pub due_at: Option<NaiveDateTime>,
}

pub struct AddTaskPayload {
    pub title: TaskTitle,
    pub contact_id: Option<ContactId>,
    pub deal_id: Option<DealId>,
    pub due_at: Option<NaiveDateTime>,
}

impl TryFrom<AddTaskForm> for AddTaskPayload {
    type Error = FormError;

    fn try_from(form: AddTaskForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            title: TaskTitle::new(form.title)?,
            contact_id: form.contact_id.map(ContactId::new).transpose()?,
            deal_id: form.deal_id.map(DealId::new).transpose()?,
            due_at: form.due_at,
        })
    }
}

impl AddTaskPayload {
    pub fn into_domain(self, hub_id: HubId) -> NewTask {
        NewTask {
            hub_id,
            contact_id: self.contact_id,
            deal_id: self.deal_id,
            title: self.title,
            due_at: self.due_at,
        }
    }
}
