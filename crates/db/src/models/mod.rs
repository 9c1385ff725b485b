//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches
//!
//! Tenant and actor ids are never part of a DTO; repositories take them as
//! separate arguments so a request body cannot smuggle in another tenant.

pub mod analytics;
pub mod audit;
pub mod content;
pub mod customer;
pub mod deal;
pub mod employee;
pub mod event;
pub mod lead;
pub mod notification;
pub mod permission;
pub mod project;
pub mod session;
pub mod task;
pub mod tenant;
pub mod user;
