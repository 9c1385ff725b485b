//! Fixtures shared by the repository integration tests.

#![allow(dead_code)]

use atrium_core::roles::ROLE_ID_SUPER_ADMIN;
use atrium_core::types::DbId;
use atrium_db::models::tenant::{CreateTenant, Tenant};
use atrium_db::models::user::{CreateUser, User};
use atrium_db::repositories::{TenantRepo, UserRepo};
use sqlx::PgPool;

pub async fn tenant(pool: &PgPool, slug: &str) -> Tenant {
    TenantRepo::create(
        pool,
        &CreateTenant {
            name: format!("Tenant {slug}"),
            slug: slug.to_string(),
            plan: None,
            settings: None,
        },
    )
    .await
    .unwrap()
}

pub async fn user(pool: &PgPool, tenant_id: Option<DbId>, name: &str, role_id: DbId) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            tenant_id,
            username: name.to_string(),
            email: format!("{name}@example.com"),
            display_name: None,
            password_hash: "not-a-real-hash".to_string(),
            role_id,
        },
    )
    .await
    .unwrap()
}

pub async fn super_admin(pool: &PgPool) -> User {
    user(pool, None, "root", ROLE_ID_SUPER_ADMIN).await
}
