use serde::{Deserialize, Serialize};

use crate::domain::types::{Email, HubId, ManagerId, ManagerName};

/// Hub user recorded as the author of activity events.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Manager {
    pub id: ManagerId,
    pub hub_id: HubId,
    pub name: ManagerName,
    pub email: Email,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewManager {
    pub hub_id: HubId,
    pub name: ManagerName,
    pub email: Email,
}

impl NewManager {
    #[must_use]
    pub fn new(hub_id: HubId, name: ManagerName, email: Email) -> Self {
        Self {
            hub_id,
            name,
            email,
        }
    }
}
