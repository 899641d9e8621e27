use serde::Deserialize;
use validator::Validate;

use crate::domain::deal::{DealStage, NewDeal, UpdateDeal};
use crate::domain::types::{Amount, ContactId, DealTitle, HubId};
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
pub struct AddDealForm {
    pub contact_id: i32,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// Minor currency units.
    #[serde(default)]
    #[validate(range(min = 0))]
    pub amount: Option<i64>,
}

pub struct AddDealPayload {
    pub contact_id: ContactId,
    pub title: DealTitle,
    pub amount: Option<Amount>,
}

impl TryFrom<AddDealForm> for AddDealPayload {
    type Error = FormError;

    fn try_from(form: AddDealForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            contact_id: ContactId::new(form.contact_id)?,
            title: DealTitle::new(form.title)?,
            amount: form.amount.map(Amount::new).transpose()?,
        })
    }
}

impl AddDealPayload {
    pub fn into_domain(self, hub_id: HubId) -> NewDeal {
        NewDeal::new(hub_id, self.contact_id, self.title, self.amount)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDealForm {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub amount: Option<i64>,
}

impl TryFrom<UpdateDealForm> for UpdateDeal {
    type Error = FormError;

    fn try_from(form: UpdateDealForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            title: DealTitle::new(form.title)?,
            amount: form.amount.map(Amount::new).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangeStageForm {
    pub stage: String,
}

impl TryFrom<ChangeStageForm> for DealStage {
    type Error = FormError;

    fn try_from(form: ChangeStageForm) -> Result<Self, Self::Error> {
        Ok(form.stage.parse::<DealStage>()?)
    }
}
