//! Data models for the lending server

pub mod enums;
pub mod equipment;
pub mod request;
pub mod user;

// Re-export commonly used types
pub use enums::{RequestStatus, UserRole};
pub use equipment::Equipment;
pub use request::{LendingAction, LendingOutcome, Request};
pub use user::User;
