//! Query filters shared by the store implementations.
//!
//! The PostgreSQL store translates these into SQL; the in-memory store
//! evaluates `matches` directly. Both must agree on semantics.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::{
    enums::{RequestStatus, RequestType},
    equipment::Equipment,
    request::MaintenanceRequest,
};

/// Role-derived base restriction on equipment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquipmentScope {
    All,
    OwnedBy(i32),
    DefaultTechnician(i32),
}

#[derive(Debug, Clone)]
pub struct EquipmentFilter {
    pub scope: EquipmentScope,
    pub id: Option<i32>,
    /// Lowercased substring matched against name, category and department
    pub search: Option<String>,
}

impl EquipmentFilter {
    pub fn new(scope: EquipmentScope) -> Self {
        Self {
            scope,
            id: None,
            search: None,
        }
    }

    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        self
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn matches(&self, equipment: &Equipment) -> bool {
        let in_scope = match self.scope {
            EquipmentScope::All => true,
            EquipmentScope::OwnedBy(user) => equipment.employee_id == Some(user),
            EquipmentScope::DefaultTechnician(user) => {
                equipment.default_technician_id == Some(user)
            }
        };
        if !in_scope || self.id.map_or(false, |id| id != equipment.id) {
            return false;
        }

        match &self.search {
            None => true,
            Some(needle) => {
                equipment.name.to_lowercase().contains(needle)
                    || equipment.category.to_lowercase().contains(needle)
                    || equipment
                        .department
                        .as_deref()
                        .map_or(false, |d| d.to_lowercase().contains(needle))
            }
        }
    }
}

/// Role-derived base restriction on requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestScope {
    All,
    /// Requests against any of these equipment ids
    Equipment(Vec<i32>),
    /// Requests authored by the user, plus requests against equipment they own
    CreatedByOrEquipment { user_id: i32, equipment_ids: Vec<i32> },
    /// Matches nothing
    Nothing,
}

#[derive(Debug, Clone)]
pub struct RequestFilter {
    pub scope: RequestScope,
    pub equipment_id: Option<i32>,
    pub status: Option<RequestStatus>,
    pub request_type: Option<RequestType>,
    /// Half-open interval `[start, end)` on scheduled_date
    pub scheduled_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl RequestFilter {
    pub fn new(scope: RequestScope) -> Self {
        Self {
            scope,
            equipment_id: None,
            status: None,
            request_type: None,
            scheduled_between: None,
        }
    }

    /// Restrict to requests scheduled within the given UTC calendar day
    pub fn scheduled_on(mut self, day: NaiveDate) -> Self {
        let start = day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
        self.scheduled_between = Some((start, start + Duration::days(1)));
        self
    }

    pub fn is_empty_scope(&self) -> bool {
        match &self.scope {
            RequestScope::Nothing => true,
            RequestScope::Equipment(ids) => ids.is_empty(),
            _ => false,
        }
    }

    pub fn matches(&self, request: &MaintenanceRequest) -> bool {
        if request.deleted_at.is_some() {
            return false;
        }

        let in_scope = match &self.scope {
            RequestScope::All => true,
            RequestScope::Nothing => false,
            RequestScope::Equipment(ids) => ids.contains(&request.equipment_id),
            RequestScope::CreatedByOrEquipment {
                user_id,
                equipment_ids,
            } => {
                request.created_by_id == *user_id || equipment_ids.contains(&request.equipment_id)
            }
        };

        in_scope
            && self.equipment_id.map_or(true, |id| request.equipment_id == id)
            && self.status.map_or(true, |s| request.status == s)
            && self.request_type.map_or(true, |t| request.request_type == t)
            && self.scheduled_between.map_or(true, |(start, end)| {
                request
                    .scheduled_date
                    .map_or(false, |d| d >= start && d < end)
            })
    }
}
