//! Maintenance request lifecycle
//!
//! The rule checks are plain functions over loaded values (`plan_creation`,
//! `plan_update`); `RequestsService` does the fetching and persisting around
//! them. Every rule is evaluated before anything is written.

use std::sync::Arc;

use chrono::NaiveDate;
use validator::Validate;

use super::{email, email::Notifier, visibility};
use crate::{
    error::{AppError, AppResult},
    models::{
        request::{CreateRequest, NewRequest, RequestQuery, UpdateRequest},
        Equipment, MaintenanceRequest, Principal, RequestFilter, RequestStatus, RequestType, Role,
    },
    repository::Repository,
};

/// Only the owner of a piece of equipment may report a breakdown on it.
/// Unowned equipment can be reported by anyone.
pub fn check_reporter(request_type: RequestType, equipment: &Equipment, principal: &Principal) -> AppResult<()> {
    match (request_type, equipment.employee_id) {
        (RequestType::Corrective, Some(owner)) if owner != principal.user_id => Err(AppError::Authorization(
            "Only the assigned employee (owner) can report breakdowns for this equipment".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Resolve the derived fields of a new request
pub fn plan_creation(data: &CreateRequest, equipment: &Equipment, principal: &Principal) -> AppResult<NewRequest> {
    check_reporter(data.request_type, equipment, principal)?;

    let subject = data.subject.trim();
    if subject.is_empty() {
        return Err(AppError::Validation("Subject is required".to_string()));
    }

    let duration_hours = data.duration_hours.unwrap_or(0.0);
    if duration_hours < 0.0 {
        return Err(AppError::Validation("Duration cannot be negative".to_string()));
    }

    Ok(NewRequest {
        subject: subject.to_string(),
        request_type: data.request_type,
        status: RequestStatus::New,
        equipment_id: equipment.id,
        team_id: equipment.maintenance_team_id,
        technician_id: equipment.default_technician_id,
        scheduled_date: data.scheduled_date,
        duration_hours,
        created_by_id: principal.user_id,
    })
}

/// Outcome of applying a patch to a stored request
#[derive(Debug, Clone)]
pub struct UpdatePlan {
    pub request: MaintenanceRequest,
    /// The equipment must be marked unusable together with the request write
    pub retire_equipment: bool,
}

/// Apply a partial update under the lifecycle rules.
///
/// The technician scoping check looks at the assignment as stored, before a
/// technician picking up an unassigned New request is recorded as its
/// technician.
pub fn plan_update(
    current: &MaintenanceRequest,
    equipment: &Equipment,
    patch: &UpdateRequest,
    principal: &Principal,
) -> AppResult<UpdatePlan> {
    if principal.role == Role::Technician {
        if let Some(assigned) = current.technician_id {
            if assigned != principal.user_id {
                return Err(AppError::Authorization(
                    "You can only update requests assigned to you".to_string(),
                ));
            }
        }
    }

    let mut next = current.clone();

    if current.status == RequestStatus::New
        && patch.status == Some(RequestStatus::InProgress)
        && current.technician_id.is_none()
        && principal.role == Role::Technician
    {
        next.technician_id = Some(principal.user_id);
    }

    if let Some(status) = patch.status {
        next.status = status;
    }
    if let Some(technician_id) = patch.technician_id {
        next.technician_id = Some(technician_id);
    }
    match patch.duration_hours {
        Some(d) if d < 0.0 => {
            return Err(AppError::Validation("Duration cannot be negative".to_string()));
        }
        Some(d) if d != 0.0 => next.duration_hours = d,
        _ => {}
    }
    if let Some(scheduled_date) = patch.scheduled_date {
        next.scheduled_date = Some(scheduled_date);
    }

    let retire_equipment = next.status == RequestStatus::Scrap && equipment.is_usable;

    Ok(UpdatePlan {
        request: next,
        retire_equipment,
    })
}

/// Narrow a filter with the optional list query parameters. Blank values are ignored.
pub fn apply_query(mut filter: RequestFilter, query: &RequestQuery) -> AppResult<RequestFilter> {
    fn present(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    if let Some(status) = present(&query.status) {
        filter.status = Some(status.parse().map_err(AppError::Validation)?);
    }
    if let Some(request_type) = present(&query.request_type) {
        filter.request_type = Some(request_type.parse().map_err(AppError::Validation)?);
    }
    if let Some(date) = present(&query.date) {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AppError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", date)))?;
        filter = filter.scheduled_on(day);
    }

    Ok(filter)
}

#[derive(Clone)]
pub struct RequestsService {
    repository: Repository,
    notifier: Arc<dyn Notifier>,
}

impl RequestsService {
    pub fn new(repository: Repository, notifier: Arc<dyn Notifier>) -> Self {
        Self { repository, notifier }
    }

    async fn load_equipment(&self, id: i32) -> AppResult<Option<Equipment>> {
        self.repository.equipment.find_by_id(id).await
    }

    /// Create a request against existing equipment
    #[tracing::instrument(skip(self, data), fields(user_id = principal.user_id, equipment_id = data.equipment_id))]
    pub async fn create(&self, data: CreateRequest, principal: &Principal) -> AppResult<MaintenanceRequest> {
        data.validate()?;

        let equipment = self
            .load_equipment(data.equipment_id)
            .await?
            .ok_or_else(|| AppError::InvalidReference(format!("Equipment {} does not exist", data.equipment_id)))?;

        let new_request = plan_creation(&data, &equipment, principal)?;
        let created = self.repository.requests.create(&new_request).await?;

        tracing::info!(
            request_id = created.id,
            team_id = created.team_id,
            technician_id = ?created.technician_id,
            "Maintenance request created"
        );

        self.notify_created(&created, &equipment).await;
        Ok(created)
    }

    /// Best effort: lookup failures are logged and the message is skipped
    async fn notify_created(&self, request: &MaintenanceRequest, equipment: &Equipment) {
        let creator_email = match self.repository.users.find_by_id(request.created_by_id).await {
            Ok(user) => user.map(|u| u.email),
            Err(e) => {
                tracing::warn!(error = %e, "Could not load request creator for notification");
                None
            }
        };

        let technician_email = match request.technician_id {
            Some(id) => match self.repository.users.find_by_id(id).await {
                Ok(user) => user.map(|u| u.email),
                Err(e) => {
                    tracing::warn!(error = %e, "Could not load technician for notification");
                    None
                }
            },
            None => None,
        };

        for (to, subject, body) in email::request_created_messages(
            technician_email.as_deref(),
            creator_email.as_deref(),
            &request.subject,
            &equipment.name,
        ) {
            self.notifier.notify(vec![to], subject, body);
        }
    }

    /// Apply a partial update. Scrapping a request retires its equipment.
    #[tracing::instrument(skip(self, patch), fields(user_id = principal.user_id))]
    pub async fn update(&self, id: i32, patch: UpdateRequest, principal: &Principal) -> AppResult<MaintenanceRequest> {
        patch.validate()?;

        let current = self
            .repository
            .requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;

        let equipment = self
            .load_equipment(current.equipment_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Equipment {} missing for request {}", current.equipment_id, id)))?;

        let plan = plan_update(&current, &equipment, &patch, principal)?;

        if let Some(technician_id) = patch.technician_id {
            let technician = self
                .repository
                .users
                .find_by_id(technician_id)
                .await?
                .ok_or_else(|| AppError::InvalidReference(format!("User {} does not exist", technician_id)))?;
            if technician.role != Role::Technician {
                return Err(AppError::Validation(format!("User {} is not a technician", technician_id)));
            }
        }

        let updated = self
            .repository
            .requests
            .update(&plan.request, plan.retire_equipment)
            .await?;

        if current.status != updated.status {
            tracing::info!(
                request_id = id,
                from = %current.status,
                to = %updated.status,
                "Request status changed"
            );
        }
        if plan.retire_equipment {
            tracing::info!(equipment_id = equipment.id, "Equipment marked unusable after scrap");
        }

        Ok(updated)
    }

    /// Soft-delete a request (managers only)
    pub async fn delete(&self, id: i32, principal: &Principal) -> AppResult<()> {
        principal.require_manager()?;
        if !self.repository.requests.soft_delete(id).await? {
            return Err(AppError::NotFound(format!("Request {} not found", id)));
        }
        tracing::info!(request_id = id, "Request deleted");
        Ok(())
    }

    /// Requests visible to the principal, narrowed by the query parameters
    pub async fn list(&self, principal: &Principal, query: &RequestQuery) -> AppResult<Vec<MaintenanceRequest>> {
        let scope = visibility::request_scope(&self.repository, principal).await?;
        let filter = apply_query(RequestFilter::new(scope), query)?;
        if filter.is_empty_scope() {
            return Ok(Vec::new());
        }
        self.repository.requests.find_where(&filter).await
    }

    /// Requests against one piece of equipment, within the principal's visibility
    pub async fn list_for_equipment(&self, equipment_id: i32, principal: &Principal) -> AppResult<Vec<MaintenanceRequest>> {
        if self.load_equipment(equipment_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Equipment {} not found", equipment_id)));
        }

        let scope = visibility::request_scope(&self.repository, principal).await?;
        let mut filter = RequestFilter::new(scope);
        if filter.is_empty_scope() {
            return Ok(Vec::new());
        }
        filter.equipment_id = Some(equipment_id);
        self.repository.requests.find_where(&filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{email::MockNotifier, testing::Fixture};
    use chrono::{TimeZone, Utc};

    fn corrective(equipment_id: i32) -> CreateRequest {
        CreateRequest {
            subject: "Oil leak".to_string(),
            request_type: RequestType::Corrective,
            equipment_id,
            scheduled_date: None,
            duration_hours: None,
        }
    }

    fn preventive(equipment_id: i32) -> CreateRequest {
        CreateRequest {
            request_type: RequestType::Preventive,
            ..corrective(equipment_id)
        }
    }

    fn status(status: RequestStatus) -> UpdateRequest {
        UpdateRequest {
            status: Some(status),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_owner_reports_breakdown() {
        let fx = Fixture::new().await;
        let owner = fx.employee("owner@example.com").await;
        let eq = fx.equipment("Forklift", Some(owner.user_id), None).await;

        let created = fx.requests().create(corrective(eq.id), &owner).await.unwrap();
        assert_eq!(created.team_id, fx.team.id);
        assert_eq!(created.status, RequestStatus::New);
        assert_eq!(created.created_by_id, owner.user_id);
        assert_eq!(created.technician_id, None);
    }

    #[tokio::test]
    async fn test_non_owner_breakdown_is_forbidden() {
        let fx = Fixture::new().await;
        let owner = fx.employee("owner@example.com").await;
        let other = fx.employee("other@example.com").await;
        let manager = fx.manager("boss@example.com").await;
        let eq = fx.equipment("Forklift", Some(owner.user_id), None).await;

        let err = fx.requests().create(corrective(eq.id), &other).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
        let err = fx.requests().create(corrective(eq.id), &manager).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        let all = fx.requests().list(&manager, &RequestQuery::default()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_unowned_equipment_accepts_any_reporter() {
        let fx = Fixture::new().await;
        let tech = fx.technician("tech@example.com").await;
        let eq = fx.equipment("Compressor", None, None).await;

        assert!(fx.requests().create(corrective(eq.id), &tech).await.is_ok());
    }

    #[tokio::test]
    async fn test_preventive_request_skips_owner_guard() {
        let fx = Fixture::new().await;
        let owner = fx.employee("owner@example.com").await;
        let manager = fx.manager("boss@example.com").await;
        let eq = fx.equipment("Forklift", Some(owner.user_id), None).await;

        assert!(fx.requests().create(preventive(eq.id), &manager).await.is_ok());
    }

    #[tokio::test]
    async fn test_default_technician_is_prefilled() {
        let fx = Fixture::new().await;
        let tech = fx.technician("tech@example.com").await;
        let emp = fx.employee("emp@example.com").await;
        let eq = fx.equipment("Printer", None, Some(tech.user_id)).await;

        let created = fx.requests().create(corrective(eq.id), &emp).await.unwrap();
        assert_eq!(created.technician_id, Some(tech.user_id));
    }

    #[tokio::test]
    async fn test_unknown_equipment_is_invalid_reference() {
        let fx = Fixture::new().await;
        let emp = fx.employee("emp@example.com").await;

        let err = fx.requests().create(corrective(404), &emp).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_client_supplied_team_is_ignored() {
        let fx = Fixture::new().await;
        let emp = fx.employee("emp@example.com").await;
        let eq = fx.equipment("Printer", None, None).await;

        let payload: CreateRequest = serde_json::from_value(serde_json::json!({
            "subject": "Paper jam",
            "type": "Corrective",
            "equipment_id": eq.id,
            "team_id": 999,
            "status": "Repaired"
        }))
        .unwrap();

        let created = fx.requests().create(payload, &emp).await.unwrap();
        assert_eq!(created.team_id, eq.maintenance_team_id);
        assert_eq!(created.status, RequestStatus::New);
    }

    #[tokio::test]
    async fn test_negative_duration_is_rejected() {
        let fx = Fixture::new().await;
        let emp = fx.employee("emp@example.com").await;
        let eq = fx.equipment("Printer", None, None).await;

        let mut payload = preventive(eq.id);
        payload.duration_hours = Some(-1.0);
        let err = fx.requests().create(payload, &emp).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_blank_subject_is_rejected() {
        let fx = Fixture::new().await;
        let manager = fx.manager("boss@example.com").await;
        let emp = fx.employee("emp@example.com").await;
        let eq = fx.equipment("Printer", None, None).await;

        let mut payload = corrective(eq.id);
        payload.subject = "   ".to_string();
        let err = fx.requests().create(payload, &emp).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut padded = corrective(eq.id);
        padded.subject = "  Paper jam \t".to_string();
        let created = fx.requests().create(padded, &emp).await.unwrap();
        assert_eq!(created.subject, "Paper jam");

        let all = fx.requests().list(&manager, &RequestQuery::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_creation_notifies_technician_and_creator() {
        let fx = Fixture::new().await;
        let tech = fx.technician("tech@example.com").await;
        let emp = fx.employee("emp@example.com").await;
        let eq = fx.equipment("Printer", None, Some(tech.user_id)).await;

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|to, subject, _| {
                to == &vec!["tech@example.com".to_string()] && subject == "New Maintenance Task: Oil leak"
            })
            .times(1)
            .return_const(());
        notifier
            .expect_notify()
            .withf(|to, subject, _| {
                to == &vec!["emp@example.com".to_string()] && subject == "Request Confirmation: Oil leak"
            })
            .times(1)
            .return_const(());

        fx.requests_with(notifier)
            .create(corrective(eq.id), &emp)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_technician_means_single_notification() {
        let fx = Fixture::new().await;
        let emp = fx.employee("emp@example.com").await;
        let eq = fx.equipment("Printer", None, None).await;

        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).return_const(());

        fx.requests_with(notifier)
            .create(corrective(eq.id), &emp)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_technician_self_assigns_on_pickup() {
        let fx = Fixture::new().await;
        let tech = fx.technician("tech@example.com").await;
        let emp = fx.employee("emp@example.com").await;
        let eq = fx.equipment("Boiler", None, None).await;
        let request = fx.request(eq.id, &emp, RequestType::Corrective).await;

        let updated = fx
            .requests()
            .update(request.id, status(RequestStatus::InProgress), &tech)
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::InProgress);
        assert_eq!(updated.technician_id, Some(tech.user_id));
        assert_eq!(updated.version, request.version + 1);
    }

    #[tokio::test]
    async fn test_manager_pickup_does_not_self_assign() {
        let fx = Fixture::new().await;
        let manager = fx.manager("boss@example.com").await;
        let eq = fx.equipment("Boiler", None, None).await;
        let request = fx.request(eq.id, &manager, RequestType::Corrective).await;

        let updated = fx
            .requests()
            .update(request.id, status(RequestStatus::InProgress), &manager)
            .await
            .unwrap();
        assert_eq!(updated.technician_id, None);
    }

    #[tokio::test]
    async fn test_technician_cannot_touch_foreign_assignment() {
        let fx = Fixture::new().await;
        let assigned = fx.technician("a@example.com").await;
        let intruder = fx.technician("b@example.com").await;
        let eq = fx.equipment("Boiler", None, Some(assigned.user_id)).await;
        let emp = fx.employee("emp@example.com").await;
        let request = fx.requests().create(corrective(eq.id), &emp).await.unwrap();

        let err = fx
            .requests()
            .update(request.id, status(RequestStatus::InProgress), &intruder)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        let ok = fx
            .requests()
            .update(request.id, status(RequestStatus::Repaired), &assigned)
            .await
            .unwrap();
        assert_eq!(ok.status, RequestStatus::Repaired);
    }

    #[tokio::test]
    async fn test_scrap_retires_equipment_for_good() {
        let fx = Fixture::new().await;
        let manager = fx.manager("boss@example.com").await;
        let eq = fx.equipment("Generator", None, None).await;
        let request = fx.request(eq.id, &manager, RequestType::Corrective).await;

        // New -> Scrap directly is allowed
        let scrapped = fx
            .requests()
            .update(request.id, status(RequestStatus::Scrap), &manager)
            .await
            .unwrap();
        assert_eq!(scrapped.status, RequestStatus::Scrap);
        let stored = fx.repository.equipment.find_by_id(eq.id).await.unwrap().unwrap();
        assert!(!stored.is_usable);

        fx.requests()
            .update(request.id, status(RequestStatus::Repaired), &manager)
            .await
            .unwrap();
        let stored = fx.repository.equipment.find_by_id(eq.id).await.unwrap().unwrap();
        assert!(!stored.is_usable);
    }

    #[tokio::test]
    async fn test_zero_duration_keeps_stored_value() {
        let fx = Fixture::new().await;
        let manager = fx.manager("boss@example.com").await;
        let eq = fx.equipment("Generator", None, None).await;
        let request = fx.request(eq.id, &manager, RequestType::Preventive).await;

        let patch = UpdateRequest {
            duration_hours: Some(2.5),
            ..Default::default()
        };
        let updated = fx.requests().update(request.id, patch, &manager).await.unwrap();
        assert_eq!(updated.duration_hours, 2.5);

        let patch = UpdateRequest {
            duration_hours: Some(0.0),
            ..Default::default()
        };
        let updated = fx.requests().update(request.id, patch, &manager).await.unwrap();
        assert_eq!(updated.duration_hours, 2.5);
        assert_eq!(updated.status, RequestStatus::New);
    }

    #[tokio::test]
    async fn test_assigned_technician_must_be_a_technician() {
        let fx = Fixture::new().await;
        let manager = fx.manager("boss@example.com").await;
        let emp = fx.employee("emp@example.com").await;
        let eq = fx.equipment("Generator", None, None).await;
        let request = fx.request(eq.id, &manager, RequestType::Preventive).await;

        let patch = UpdateRequest {
            technician_id: Some(emp.user_id),
            ..Default::default()
        };
        let err = fx.requests().update(request.id, patch, &manager).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let patch = UpdateRequest {
            technician_id: Some(999),
            ..Default::default()
        };
        let err = fx.requests().update(request.id, patch, &manager).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_update_missing_request() {
        let fx = Fixture::new().await;
        let manager = fx.manager("boss@example.com").await;
        let err = fx
            .requests()
            .update(42, status(RequestStatus::Repaired), &manager)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_soft_delete_is_manager_only() {
        let fx = Fixture::new().await;
        let manager = fx.manager("boss@example.com").await;
        let tech = fx.technician("tech@example.com").await;
        let eq = fx.equipment("Generator", None, None).await;
        let request = fx.request(eq.id, &manager, RequestType::Preventive).await;

        let err = fx.requests().delete(request.id, &tech).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        fx.requests().delete(request.id, &manager).await.unwrap();
        let err = fx
            .requests()
            .update(request.id, status(RequestStatus::Repaired), &manager)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = fx.requests().delete(request.id, &manager).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_idle_technician_lists_nothing() {
        let fx = Fixture::new().await;
        let manager = fx.manager("boss@example.com").await;
        let idle = fx.technician("idle@example.com").await;
        let eq = fx.equipment("Generator", None, None).await;
        for _ in 0..10 {
            fx.request(eq.id, &manager, RequestType::Corrective).await;
        }

        let visible = fx.requests().list(&idle, &RequestQuery::default()).await.unwrap();
        assert!(visible.is_empty());
        let all = fx.requests().list(&manager, &RequestQuery::default()).await.unwrap();
        assert_eq!(all.len(), 10);
    }

    #[tokio::test]
    async fn test_employee_lists_authored_and_owned() {
        let fx = Fixture::new().await;
        let emp = fx.employee("emp@example.com").await;
        let manager = fx.manager("boss@example.com").await;
        let owned = fx.equipment("Laptop", Some(emp.user_id), None).await;
        let shared = fx.equipment("Copier", None, None).await;

        let mine = fx.request(shared.id, &emp, RequestType::Corrective).await;
        let on_owned = fx.request(owned.id, &manager, RequestType::Preventive).await;
        fx.request(shared.id, &manager, RequestType::Preventive).await;

        let visible = fx.requests().list(&emp, &RequestQuery::default()).await.unwrap();
        let mut ids: Vec<i32> = visible.iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec![mine.id, on_owned.id]);
    }

    #[tokio::test]
    async fn test_list_secondary_filters() {
        let fx = Fixture::new().await;
        let manager = fx.manager("boss@example.com").await;
        let eq = fx.equipment("Chiller", None, None).await;

        let mut payload = preventive(eq.id);
        payload.scheduled_date = Some(Utc.with_ymd_and_hms(2024, 6, 3, 9, 30, 0).unwrap());
        let planned = fx.requests().create(payload, &manager).await.unwrap();
        fx.request(eq.id, &manager, RequestType::Corrective).await;

        let query = RequestQuery {
            request_type: Some("Preventive".to_string()),
            date: Some("2024-06-03".to_string()),
            ..Default::default()
        };
        let found = fx.requests().list(&manager, &query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, planned.id);

        let query = RequestQuery {
            date: Some("2024-06-04".to_string()),
            ..Default::default()
        };
        assert!(fx.requests().list(&manager, &query).await.unwrap().is_empty());

        let query = RequestQuery {
            status: Some("In Progress".to_string()),
            ..Default::default()
        };
        assert!(fx.requests().list(&manager, &query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_query_values_are_rejected() {
        let fx = Fixture::new().await;
        let manager = fx.manager("boss@example.com").await;

        for query in [
            RequestQuery {
                date: Some("03/06/2024".to_string()),
                ..Default::default()
            },
            RequestQuery {
                status: Some("Done".to_string()),
                ..Default::default()
            },
            RequestQuery {
                request_type: Some("Urgent".to_string()),
                ..Default::default()
            },
        ] {
            let err = fx.requests().list(&manager, &query).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_equipment_history_respects_visibility() {
        let fx = Fixture::new().await;
        let manager = fx.manager("boss@example.com").await;
        let tech = fx.technician("tech@example.com").await;
        let mine = fx.equipment("Pump", None, Some(tech.user_id)).await;
        let other = fx.equipment("Valve", None, None).await;
        fx.request(mine.id, &manager, RequestType::Corrective).await;
        fx.request(other.id, &manager, RequestType::Corrective).await;

        assert_eq!(fx.requests().list_for_equipment(mine.id, &tech).await.unwrap().len(), 1);
        assert!(fx.requests().list_for_equipment(other.id, &tech).await.unwrap().is_empty());
        assert_eq!(fx.requests().list_for_equipment(other.id, &manager).await.unwrap().len(), 1);
        assert!(matches!(
            fx.requests().list_for_equipment(77, &manager).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn test_plan_update_scoping_uses_stored_assignment() {
        let equipment = Fixture::equipment_value(1, None, None);
        let current = Fixture::request_value(1, 1, 10, None);
        let tech = Principal::new(20, Role::Technician);

        // Unassigned: the pickup claims it, and explicit reassignment in the same patch wins
        let patch = UpdateRequest {
            status: Some(RequestStatus::InProgress),
            technician_id: Some(30),
            ..Default::default()
        };
        let plan = plan_update(&current, &equipment, &patch, &tech).unwrap();
        assert_eq!(plan.request.technician_id, Some(30));
        assert!(!plan.retire_equipment);
    }

    #[test]
    fn test_plan_update_skips_cascade_for_retired_equipment() {
        let mut equipment = Fixture::equipment_value(1, None, None);
        equipment.is_usable = false;
        let current = Fixture::request_value(1, 1, 10, None);
        let manager = Principal::new(1, Role::Manager);

        let plan = plan_update(&current, &equipment, &status(RequestStatus::Scrap), &manager).unwrap();
        assert_eq!(plan.request.status, RequestStatus::Scrap);
        assert!(!plan.retire_equipment);
    }
}
