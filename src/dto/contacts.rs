use serde::{Deserialize, Serialize};

use crate::domain::contact_event::ContactEvent;
use crate::domain::manager::Manager;
use crate::pagination::PageQuery;

/// Query parameters accepted by `GET /api/v1/contacts`.
#[derive(Debug, Default, Deserialize)]
pub struct ContactsQuery {
    /// Free-form text matched against name, email, phone and company.
    pub search: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl ContactsQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery::new(self.page, self.per_page)
    }
}

/// Timeline entry together with its author, if any.
#[derive(Debug, Serialize)]
pub struct ContactEventView {
    #[serde(flatten)]
    pub event: ContactEvent,
    pub manager: Option<Manager>,
}

impl From<(ContactEvent, Option<Manager>)> for ContactEventView {
    fn from((event, manager): (ContactEvent, Option<Manager>)) -> Self {
        Self { event, manager }
    }
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    /// Rows read from the file.
    pub parsed: usize,
    /// Rows actually inserted; the rest clashed with existing emails.
    pub imported: usize,
}
