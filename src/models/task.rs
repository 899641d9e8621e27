use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::task::{NewTask as DomainNewTask, Task as DomainTask};
use crate::domain::types::{ContactId, DealId, HubId, TaskId, TaskTitle, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::tasks)]
pub struct Task {
    pub id: i32,
    pub hub_id: i32,
    pub contact_id: Option<i32>,
    pub deal_id: Option<i32>,
    pub title: String,
    pub due_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::tasks)]
pub struct NewTask<'a> {
    pub hub_id: i32,
    pub contact_id: Option<i32>,
    pub deal_id: Option<i32>,
    pub title: &'a str,
    pub due_at: Option<NaiveDateTime>,
}

impl TryFrom<Task> for DomainTask {
    type Error = TypeConstraintError;

    fn try_from(task: Task) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TaskId::new(task.id)?,
            hub_id: HubId::new(task.hub_id)?,
            contact_id: task.contact_id.map(ContactId::new).transpose()?,
            deal_id: task.deal_id.map(DealId::new).transpose()?,
            title: TaskTitle::new(task.title)?,
            due_at: task.due_at,
            completed_at: task.completed_at,
            created_at: task.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewTask> for NewTask<'a> {
    fn from(task: &'a DomainNewTask) -> Self {
        Self {
            hub_id: task.hub_id.get(),
            contact_id: task.contact_id.map(ContactId::get),
            deal_id: task.deal_id.map(DealId::get),
            title: task.title.as_str(),
            due_at: task.due_at,
        }
    }
}
