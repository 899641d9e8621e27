use chrono::{NaiveDateTime, Utc};

use crate::SERVICE_ACCESS_ROLE;
use crate::domain::task::Task;
use crate::domain::types::{HubId, TaskId};
use crate::dto::tasks::TasksQuery;
use crate::forms::tasks::{AddTaskForm, AddTaskPayload};
use crate::models::auth::AuthenticatedUser;
use crate::pagination::Paginated;
use crate::repository::{ContactReader, DealReader, TaskListQuery, TaskReader, TaskWriter};
use crate::services::contacts::require_contact;
use crate::services::{ServiceError, ServiceResult, ensure_role};

pub fn list_tasks<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: TasksQuery,
) -> ServiceResult<Paginated<Task>>
where
    R: TaskReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;

    let page = query.page_query();
    let mut list_query =
        TaskListQuery::new(HubId::new(user.hub_id)?).paginate(page.page(), page.per_page());
    if query.open_only {
        list_query = list_query.open_only();
    }

    let (total, tasks) = repo.list_tasks(list_query)?;
    Ok(Paginated::new(tasks, total, page.page(), page.per_page()))
}

/// Creates a task, optionally linked to a contact and/or a deal of the hub.
pub fn create_task<R>(repo: &R, user: &AuthenticatedUser, form: AddTaskForm) -> ServiceResult<Task>
where
    R: ContactReader + DealReader + TaskWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;

    let hub_id = HubId::new(user.hub_id)?;
    let payload = AddTaskPayload::try_from(form)?;

    if let Some(contact_id) = payload.contact_id {
        require_contact(repo, hub_id, contact_id)?;
    }
    if let Some(deal_id) = payload.deal_id {
        let deal = repo
            .get_deal_by_id(deal_id, hub_id)?
            .ok_or(ServiceError::NotFound)?;
        if payload.contact_id.is_some_and(|contact_id| contact_id != deal.contact_id) {
            return Err(ServiceError::Form(
                "deal belongs to another contact".to_string(),
            ));
        }
    }

    Ok(repo.create_task(&payload.into_domain(hub_id))?)
}

/// Marks the task completed; completing it again keeps the first timestamp.
pub fn complete_task<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<Task>
where
    R: TaskWriter + ?Sized,
{
    complete_task_at(repo, user, id, Utc::now().naive_utc())
}

fn complete_task_at<R>(
    repo: &R,
    user: &AuthenticatedUser,
    id: i32,
    now: NaiveDateTime,
) -> ServiceResult<Task>
where
    R: TaskWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    Ok(repo.complete_task(TaskId::new(id)?, HubId::new(user.hub_id)?, now)?)
}

pub fn delete_task<R>(repo: &R, user: &AuthenticatedUser, id: i32) -> ServiceResult<()>
where
    R: TaskWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    repo.delete_task(TaskId::new(id)?, HubId::new(user.hub_id)?)?;
    Ok(())
}
