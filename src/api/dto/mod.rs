//! Data Transfer Objects for REST request/response serialization.
//!
//! Status and admin payloads keep camelCase field names so existing
//! dashboards and robot clients keep working.

pub mod action_dto;
pub mod admin_dto;

pub use action_dto::*;
pub use admin_dto::*;
