use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{Amount, ContactId, DealId, DealTitle, HubId, TypeConstraintError};

/// Sales pipeline stage of a deal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DealStage {
    New,
    Qualified,
    Proposal,
    Won,
    Lost,
}

impl DealStage {
    pub const ALL: [DealStage; 5] = [
        DealStage::New,
        DealStage::Qualified,
        DealStage::Proposal,
        DealStage::Won,
        DealStage::Lost,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            DealStage::New => "new",
            DealStage::Qualified => "qualified",
            DealStage::Proposal => "proposal",
            DealStage::Won => "won",
            DealStage::Lost => "lost",
        }
    }

    /// Won and lost deals no longer move through the pipeline.
    pub const fn is_closed(self) -> bool {
        matches!(self, DealStage::Won | DealStage::Lost)
    }
}

impl Display for DealStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealStage {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DealStage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TypeConstraintError::InvalidValue(format!("unknown deal stage `{s}`")))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Deal {
    pub id: DealId,
    pub hub_id: HubId,
    pub contact_id: ContactId,
    pub title: DealTitle,
    pub amount: Option<Amount>,
    pub stage: DealStage,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewDeal {
    pub hub_id: HubId,
    pub contact_id: ContactId,
    pub title: DealTitle,
    pub amount: Option<Amount>,
    pub stage: DealStage,
}

impl NewDeal {
    #[must_use]
    pub fn new(
        hub_id: HubId,
        contact_id: ContactId,
        title: DealTitle,
        amount: Option<Amount>,
    ) -> Self {
        Self {
            hub_id,
            contact_id,
            title,
            amount,
            stage: DealStage::New,
        }
    }
}

/// Editable deal attributes; stage changes go through a dedicated operation.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateDeal {
    pub title: DealTitle,
    pub amount: Option<Amount>,
}
