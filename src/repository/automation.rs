use diesel::prelude::*;

use crate::domain::automation::{Automation, AutomationEvent, NewAutomation};
use crate::domain::types::{AutomationId, HubId};
use crate::models::automation::{Automation as DbAutomation, NewAutomation as DbNewAutomation};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{AutomationReader, AutomationWriter, DieselRepository};

impl AutomationReader for DieselRepository {
    fn list_automations(&self, hub_id: HubId) -> RepositoryResult<Vec<Automation>> {
        use crate::schema::automations;

        let mut conn = self.conn()?;
        let automations = automations::table
            .filter(automations::hub_id.eq(hub_id.get()))
            .order(automations::id.asc())
            .load::<DbAutomation>(&mut conn)?
            .into_iter()
            .map(Automation::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(automations)
    }

    fn list_active_automations(
        &self,
        hub_id: HubId,
        event: AutomationEvent,
    ) -> RepositoryResult<Vec<Automation>> {
        use crate::schema::automations;

        let mut conn = self.conn()?;
        let automations = automations::table
            .filter(automations::hub_id.eq(hub_id.get()))
            .filter(automations::event.eq(event.as_str()))
            .filter(automations::is_active.eq(true))
            .order(automations::id.asc())
            .load::<DbAutomation>(&mut conn)?
            .into_iter()
            .map(Automation::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(automations)
    }
}

impl AutomationWriter for DieselRepository {
    fn create_automation(&self, new_automation: &NewAutomation) -> RepositoryResult<Automation> {
        use crate::schema::automations;

        let mut conn = self.conn()?;
        let insertable: DbNewAutomation = new_automation.into();

        let automation = diesel::insert_into(automations::table)
            .values(&insertable)
            .get_result::<DbAutomation>(&mut conn)?;

        Ok(Automation::try_from(automation)?)
    }

    fn delete_automation(&self, id: AutomationId, hub_id: HubId) -> RepositoryResult<()> {
        use crate::schema::automations;

        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            automations::table
                .filter(automations::id.eq(id.get()))
                .filter(automations::hub_id.eq(hub_id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
