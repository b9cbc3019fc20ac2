//! Role-based visibility rules for equipment and requests

use crate::{
    error::AppResult,
    models::{EquipmentFilter, EquipmentScope, Principal, RequestScope, Role},
    repository::Repository,
};

/// Equipment a principal may see: owners see what they own, technicians what
/// they are the default technician for, managers everything.
pub fn equipment_scope(principal: &Principal) -> EquipmentScope {
    match principal.role {
        Role::Manager => EquipmentScope::All,
        Role::Technician => EquipmentScope::DefaultTechnician(principal.user_id),
        Role::Employee => EquipmentScope::OwnedBy(principal.user_id),
    }
}

/// Requests a principal may see.
///
/// Employees get the union of requests they authored and requests against
/// equipment they own. Technicians only see requests against equipment they
/// are the default technician for; with no such equipment the scope is empty.
pub async fn request_scope(repository: &Repository, principal: &Principal) -> AppResult<RequestScope> {
    match principal.role {
        Role::Manager => Ok(RequestScope::All),
        Role::Employee => {
            let owned = equipment_ids(repository, principal).await?;
            Ok(RequestScope::CreatedByOrEquipment {
                user_id: principal.user_id,
                equipment_ids: owned,
            })
        }
        Role::Technician => {
            let assigned = equipment_ids(repository, principal).await?;
            if assigned.is_empty() {
                Ok(RequestScope::Nothing)
            } else {
                Ok(RequestScope::Equipment(assigned))
            }
        }
    }
}

async fn equipment_ids(repository: &Repository, principal: &Principal) -> AppResult<Vec<i32>> {
    let filter = EquipmentFilter::new(equipment_scope(principal));
    Ok(repository
        .equipment
        .find_where(&filter)
        .await?
        .into_iter()
        .map(|e| e.id)
        .collect())
}
