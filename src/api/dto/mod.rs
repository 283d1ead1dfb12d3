//! Data Transfer Objects for REST request/response serialization.
//!
//! Money is serialized as JSON strings to keep decimal precision.

pub mod auth_dto;
pub mod common_dto;
pub mod event_dto;
pub mod notification_dto;
pub mod purchase_dto;

pub use auth_dto::*;
pub use common_dto::*;
pub use event_dto::*;
pub use notification_dto::*;
pub use purchase_dto::*;
