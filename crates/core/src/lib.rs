//! Domain types, validation rules, and pure logic shared by every Atrium crate.
//!
//! Nothing in here touches the database or the network, so the rules can be
//! unit-tested in isolation and reused by the repository and API layers.

pub mod audit;
pub mod channels;
pub mod content;
pub mod crm;
pub mod error;
pub mod events;
pub mod fields;
pub mod hashing;
pub mod hr;
pub mod permissions;
pub mod projects;
pub mod roles;
pub mod search;
pub mod tenants;
pub mod types;
pub mod users;
