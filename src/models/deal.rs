use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::deal::{
    Deal as DomainDeal, DealStage, NewDeal as DomainNewDeal, UpdateDeal as DomainUpdateDeal,
};
use crate::domain::types::{Amount, ContactId, DealId, DealTitle, HubId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::deals)]
/// Diesel model for [`crate::domain::deal::Deal`].
pub struct Deal {
    pub id: i32,
    pub hub_id: i32,
    pub contact_id: i32,
    pub title: String,
    pub amount: Option<i64>,
    pub stage: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::deals)]
pub struct NewDeal<'a> {
    pub hub_id: i32,
    pub contact_id: i32,
    pub title: &'a str,
    pub amount: Option<i64>,
    pub stage: &'static str,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::deals)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateDeal<'a> {
    pub title: &'a str,
    pub amount: Option<i64>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Deal> for DomainDeal {
    type Error = TypeConstraintError;

    fn try_from(deal: Deal) -> Result<Self, Self::Error> {
        Ok(Self {
            id: DealId::new(deal.id)?,
            hub_id: HubId::new(deal.hub_id)?,
            contact_id: ContactId::new(deal.contact_id)?,
            title: DealTitle::new(deal.title)?,
            amount: deal.amount.map(Amount::new).transpose()?,
            stage: deal.stage.parse::<DealStage>()?,
            created_at: deal.created_at,
            updated_at: deal.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewDeal> for NewDeal<'a> {
    fn from(deal: &'a DomainNewDeal) -> Self {
        Self {
            hub_id: deal.hub_id.get(),
            contact_id: deal.contact_id.get(),
            title: deal.title.as_str(),
            amount: deal.amount.map(Amount::get),
            stage: deal.stage.as_str(),
        }
    }
}

impl<'a> UpdateDeal<'a> {
    pub fn from_domain(deal: &'a DomainUpdateDeal, updated_at: NaiveDateTime) -> Self {
        Self {
            title: deal.title.as_str(),
            amount: deal.amount.map(Amount::get),
            updated_at,
        }
    }
}
