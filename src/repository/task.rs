use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::task::{NewTask, Task};
use crate::domain::types::{HubId, TaskId};
use crate::models::task::{NewTask as DbNewTask, Task as DbTask};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, TaskListQuery, TaskReader, TaskWriter};

impl TaskReader for DieselRepository {
    fn get_task_by_id(&self, id: TaskId, hub_id: HubId) -> RepositoryResult<Option<Task>> {
        use crate::schema::tasks;

        let mut conn = self.conn()?;
        let task = tasks::table
            .filter(tasks::id.eq(id.get()))
            .filter(tasks::hub_id.eq(hub_id.get()))
            .first::<DbTask>(&mut conn)
            .optional()?;

        task.map(Task::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn list_tasks(&self, query: TaskListQuery) -> RepositoryResult<(usize, Vec<Task>)> {
        use crate::schema::tasks;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = tasks::table
                .filter(tasks::hub_id.eq(query.hub_id.get()))
                .into_boxed::<diesel::sqlite::Sqlite>();

            if query.open_only {
                items = items.filter(tasks::completed_at.is_null());
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        // Tasks without a due date sort last.
        let mut items = query_builder().order((
            tasks::due_at.is_null().asc(),
            tasks::due_at.asc(),
            tasks::id.asc(),
        ));
        if let Some(pagination) = &query.pagination {
            items = items
                .offset(pagination.offset())
                .limit(pagination.limit());
        }

        let tasks = items
            .load::<DbTask>(&mut conn)?
            .into_iter()
            .map(Task::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, tasks))
    }
}

impl TaskWriter for DieselRepository {
    fn create_task(&self, new_task: &NewTask) -> RepositoryResult<Task> {
        use crate::schema::tasks;

        let mut conn = self.conn()?;
        let insertable: DbNewTask = new_task.into();

        let task = diesel::insert_into(tasks::table)
            .values(&insertable)
            .get_result::<DbTask>(&mut conn)?;

        Ok(Task::try_from(task)?)
    }

    fn complete_task(
        &self,
        id: TaskId,
        hub_id: HubId,
        completed_at: NaiveDateTime,
    ) -> RepositoryResult<Task> {
        use crate::schema::tasks;

        let mut conn = self.conn()?;

        conn.transaction::<Task, RepositoryError, _>(|conn| {
            let task = tasks::table
                .filter(tasks::id.eq(id.get()))
                .filter(tasks::hub_id.eq(hub_id.get()))
                .first::<DbTask>(conn)?;

            if task.completed_at.is_some() {
                return Ok(Task::try_from(task)?);
            }

            let task = diesel::update(tasks::table.find(task.id))
                .set(tasks::completed_at.eq(Some(completed_at)))
                .get_result::<DbTask>(conn)?;

            Ok(Task::try_from(task)?)
        })
    }

    fn delete_task(&self, id: TaskId, hub_id: HubId) -> RepositoryResult<()> {
        use crate::schema::tasks;

        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            tasks::table
                .filter(tasks::id.eq(id.get()))
                .filter(tasks::hub_id.eq(hub_id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
