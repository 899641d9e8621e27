use chrono::Utc;
use diesel::prelude::*;

use crate::domain::deal::{Deal, DealStage, NewDeal, UpdateDeal};
use crate::domain::types::{DealId, HubId};
use crate::models::deal::{Deal as DbDeal, NewDeal as DbNewDeal, UpdateDeal as DbUpdateDeal};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DealListQuery, DealReader, DealWriter, DieselRepository};

impl DealReader for DieselRepository {
    fn get_deal_by_id(&self, id: DealId, hub_id: HubId) -> RepositoryResult<Option<Deal>> {
        use crate::schema::deals;

        let mut conn = self.conn()?;
        let deal = deals::table
            .filter(deals::id.eq(id.get()))
            .filter(deals::hub_id.eq(hub_id.get()))
            .first::<DbDeal>(&mut conn)
            .optional()?;

        deal.map(Deal::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn list_deals(&self, query: DealListQuery) -> RepositoryResult<(usize, Vec<Deal>)> {
        use crate::schema::deals;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = deals::table
                .filter(deals::hub_id.eq(query.hub_id.get()))
                .into_boxed::<diesel::sqlite::Sqlite>();

            if let Some(stage) = query.stage {
                items = items.filter(deals::stage.eq(stage.as_str()));
            }
            if let Some(contact_id) = query.contact_id {
                items = items.filter(deals::contact_id.eq(contact_id.get()));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order((deals::updated_at.desc(), deals::id.desc()));
        if let Some(pagination) = &query.pagination {
            items = items
                .offset(pagination.offset())
                .limit(pagination.limit());
        }

        let deals = items
            .load::<DbDeal>(&mut conn)?
            .into_iter()
            .map(Deal::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, deals))
    }
}

impl DealWriter for DieselRepository {
    fn create_deal(&self, new_deal: &NewDeal) -> RepositoryResult<Deal> {
        use crate::schema::deals;

        let mut conn = self.conn()?;
        let insertable: DbNewDeal = new_deal.into();

        let deal = diesel::insert_into(deals::table)
            .values(&insertable)
            .get_result::<DbDeal>(&mut conn)?;

        Ok(Deal::try_from(deal)?)
    }

    fn update_deal(
        &self,
        id: DealId,
        hub_id: HubId,
        updates: &UpdateDeal,
    ) -> RepositoryResult<Deal> {
        use crate::schema::deals;

        let mut conn = self.conn()?;
        let changes = DbUpdateDeal::from_domain(updates, Utc::now().naive_utc());

        let deal = diesel::update(
            deals::table
                .filter(deals::id.eq(id.get()))
                .filter(deals::hub_id.eq(hub_id.get())),
        )
        .set(&changes)
        .get_result::<DbDeal>(&mut conn)?;

        Ok(Deal::try_from(deal)?)
    }

    fn update_deal_stage(
        &self,
        id: DealId,
        hub_id: HubId,
        stage: DealStage,
    ) -> RepositoryResult<Deal> {
        use crate::schema::deals;

        let mut conn = self.conn()?;

        let deal = diesel::update(
            deals::table
                .filter(deals::id.eq(id.get()))
                .filter(deals::hub_id.eq(hub_id.get())),
        )
        .set((
            deals::stage.eq(stage.as_str()),
            deals::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result::<DbDeal>(&mut conn)?;

        Ok(Deal::try_from(deal)?)
    }

    fn delete_deal(&self, id: DealId, hub_id: HubId) -> RepositoryResult<()> {
        use crate::schema::deals;

        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            deals::table
                .filter(deals::id.eq(id.get()))
                .filter(deals::hub_id.eq(hub_id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
