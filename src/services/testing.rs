//! Shared fixtures for service tests, backed by the in-memory store

use std::sync::Arc;

use chrono::Utc;

use super::{
    email::{MockNotifier, Notifier},
    requests::RequestsService,
};
use crate::{
    models::{
        equipment::CreateEquipment,
        request::NewRequest,
        user::NewUser,
        Equipment, MaintenanceRequest, MaintenanceTeam, Principal, RequestStatus, RequestType, Role,
    },
    repository::Repository,
};

pub struct Fixture {
    pub repository: Repository,
    pub team: MaintenanceTeam,
}

impl Fixture {
    pub async fn new() -> Self {
        let repository = Repository::in_memory();
        let team = repository.teams.create("Mechanical Team").await.unwrap();
        Self { repository, team }
    }

    pub async fn user(&self, email: &str, role: Role) -> Principal {
        let user = self
            .repository
            .users
            .create(&NewUser {
                name: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password_hash: "not-a-hash".to_string(),
                role,
                team_id: Some(self.team.id),
            })
            .await
            .unwrap();
        Principal::new(user.id, user.role)
    }

    pub async fn manager(&self, email: &str) -> Principal {
        self.user(email, Role::Manager).await
    }

    pub async fn technician(&self, email: &str) -> Principal {
        self.user(email, Role::Technician).await
    }

    pub async fn employee(&self, email: &str) -> Principal {
        self.user(email, Role::Employee).await
    }

    pub async fn equipment(&self, name: &str, owner: Option<i32>, technician: Option<i32>) -> Equipment {
        self.repository
            .equipment
            .create(&CreateEquipment {
                name: name.to_string(),
                category: "Machinery".to_string(),
                department: Some("Production".to_string()),
                serial_number: String::new(),
                purchase_date: None,
                warranty_info: String::new(),
                location: String::new(),
                maintenance_team_id: self.team.id,
                employee_id: owner,
                default_technician_id: technician,
            })
            .await
            .unwrap()
    }

    /// Insert a request straight into the store, skipping the reporter guard
    pub async fn request(&self, equipment_id: i32, creator: &Principal, request_type: RequestType) -> MaintenanceRequest {
        let equipment = self
            .repository
            .equipment
            .find_by_id(equipment_id)
            .await
            .unwrap()
            .unwrap();
        self.repository
            .requests
            .create(&NewRequest {
                subject: "Routine check".to_string(),
                request_type,
                status: RequestStatus::New,
                equipment_id,
                team_id: equipment.maintenance_team_id,
                technician_id: equipment.default_technician_id,
                scheduled_date: None,
                duration_hours: 0.0,
                created_by_id: creator.user_id,
            })
            .await
            .unwrap()
    }

    pub fn silent_notifier() -> Arc<dyn Notifier> {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().return_const(());
        Arc::new(notifier)
    }

    pub fn requests(&self) -> RequestsService {
        RequestsService::new(self.repository.clone(), Self::silent_notifier())
    }

    pub fn requests_with(&self, notifier: MockNotifier) -> RequestsService {
        RequestsService::new(self.repository.clone(), Arc::new(notifier))
    }

    pub fn equipment_value(id: i32, owner: Option<i32>, technician: Option<i32>) -> Equipment {
        Equipment {
            id,
            name: format!("Unit {}", id),
            category: "Machinery".to_string(),
            department: None,
            serial_number: String::new(),
            purchase_date: None,
            warranty_info: String::new(),
            location: String::new(),
            maintenance_team_id: 1,
            employee_id: owner,
            default_technician_id: technician,
            is_usable: true,
            created_at: Utc::now(),
        }
    }

    pub fn request_value(id: i32, equipment_id: i32, created_by: i32, technician: Option<i32>) -> MaintenanceRequest {
        let now = Utc::now();
        MaintenanceRequest {
            id,
            subject: "Routine check".to_string(),
            request_type: RequestType::Corrective,
            status: RequestStatus::New,
            equipment_id,
            team_id: 1,
            technician_id: technician,
            scheduled_date: None,
            duration_hours: 0.0,
            created_by_id: created_by,
            version: 1,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}
