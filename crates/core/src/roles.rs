//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000001_create_roles_tenants_users.sql`.

pub const ROLE_SUPER_ADMIN: &str = "super_admin";
pub const ROLE_TENANT_ADMIN: &str = "tenant_admin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_MEMBER: &str = "member";

/// Seeded role ids, in the same order as the migration inserts them.
pub const ROLE_ID_SUPER_ADMIN: i64 = 1;
pub const ROLE_ID_TENANT_ADMIN: i64 = 2;
pub const ROLE_ID_MANAGER: i64 = 3;
pub const ROLE_ID_MEMBER: i64 = 4;

/// Seeded id for a role name.
pub fn role_id_by_name(name: &str) -> Option<i64> {
    match name {
        ROLE_SUPER_ADMIN => Some(ROLE_ID_SUPER_ADMIN),
        ROLE_TENANT_ADMIN => Some(ROLE_ID_TENANT_ADMIN),
        ROLE_MANAGER => Some(ROLE_ID_MANAGER),
        ROLE_MEMBER => Some(ROLE_ID_MEMBER),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_map_to_seeded_ids() {
        assert_eq!(role_id_by_name(ROLE_SUPER_ADMIN), Some(1));
        assert_eq!(role_id_by_name(ROLE_MEMBER), Some(4));
        assert_eq!(role_id_by_name("owner"), None);
    }
}
