use serde::Deserialize;

use crate::pagination::PageQuery;

/// Query parameters accepted by `GET /api/v1/deals`.
#[derive(Debug, Default, Deserialize)]
pub struct DealsQuery {
    pub stage: Option<String>,
    pub contact_id: Option<i32>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl DealsQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery::new(self.page, self.per_page)
    }
}
