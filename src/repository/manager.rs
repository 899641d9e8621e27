//! Repository implementation for CRM managers.

use diesel::{prelude::*, upsert::excluded};

use crate::domain::manager::{Manager, NewManager};
use crate::models::manager::{Manager as DbManager, NewManager as DbNewManager};
use crate::repository::errors::RepositoryResult;
use crate::repository::{DieselRepository, ManagerWriter};

impl ManagerWriter for DieselRepository {
    fn create_or_update_manager(&self, new_manager: &NewManager) -> RepositoryResult<Manager> {
        use crate::schema::managers;

        let mut conn = self.conn()?;

        let db_new_manager: DbNewManager = new_manager.into();

        let db_manager = diesel::insert_into(managers::table)
            .values(&db_new_manager)
            .on_conflict((managers::hub_id, managers::email))
            .do_update()
            .set(managers::name.eq(excluded(managers::name)))
            .get_result::<DbManager>(&mut conn)?;

        Ok(Manager::try_from(db_manager)?)
    }
}
