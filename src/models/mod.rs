//! Data models for GearGuard

pub mod enums;
pub mod equipment;
pub mod filters;
pub mod request;
pub mod team;
pub mod user;

// Re-export commonly used types
pub use enums::{RequestStatus, RequestType, Role};
pub use equipment::Equipment;
pub use filters::{EquipmentFilter, EquipmentScope, RequestFilter, RequestScope};
pub use request::MaintenanceRequest;
pub use team::MaintenanceTeam;
pub use user::{Principal, User, UserShort};
