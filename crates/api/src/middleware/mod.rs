//! Request extractors that run before a handler body.
//!
//! - [`auth::AuthUser`] -- Decodes the JWT Bearer token.
//! - [`principal::Principal`] -- `AuthUser` plus the caller's live access profile.
//! - [`tenant::TenantScope`] -- Resolves the tenant a request acts on.
//! - [`rbac::RequireSuperAdmin`] -- Platform-administrator-only routes.
//! - [`request_meta::RequestMeta`] -- Request id, client IP, and user agent for auditing.

pub mod auth;
pub mod principal;
pub mod rbac;
pub mod request_meta;
pub mod tenant;
