use serde::Deserialize;

use crate::pagination::PageQuery;

/// Query parameters accepted by `GET /api/v1/tasks`.
#[derive(Debug, Default, Deserialize)]
pub struct TasksQuery {
    /// Hide completed tasks.
    #[serde(default)]
    pub open_only: bool,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl TasksQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery::new(self.page, self.per_page)
    }
}
