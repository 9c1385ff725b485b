//! Access and refresh tokens.
//!
//! Access tokens are short-lived HS256 JWTs issued by `atrium`. They carry
//! the user id, home tenant, and role name, but permissions are always
//! re-read from the database, so the role claim is informational only.
//!
//! Refresh tokens are opaque and single-use. The client holds the plaintext;
//! the `user_sessions` table holds only its SHA-256 digest.

use std::fmt;

use atrium_core::hashing::sha256_hex;
use atrium_core::types::{DbId, Timestamp};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value of the `iss` claim on every token this service signs.
pub const TOKEN_ISSUER: &str = "atrium";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: DbId,
    /// Home tenant; `None` for platform administrators.
    pub tenant_id: Option<DbId>,
    pub role: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
    pub refresh_token_expiry_days: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("access_token_expiry_mins", &self.access_token_expiry_mins)
            .field("refresh_token_expiry_days", &self.refresh_token_expiry_days)
            .finish()
    }
}

impl JwtConfig {
    /// Read `JWT_SECRET` (required), `JWT_ACCESS_EXPIRY_MINS` (default 15)
    /// and `JWT_REFRESH_EXPIRY_DAYS` (default 7).
    ///
    /// # Panics
    ///
    /// Panics when the secret is missing or empty, or a lifetime is not a
    /// positive integer.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        Self {
            secret,
            access_token_expiry_mins: positive_env("JWT_ACCESS_EXPIRY_MINS", 15),
            refresh_token_expiry_days: positive_env("JWT_REFRESH_EXPIRY_DAYS", 7),
        }
    }

    /// Access token lifetime, as reported to clients in `expires_in`.
    pub fn access_expires_in_secs(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }

    /// When a session created at `now` stops accepting its refresh token.
    pub fn refresh_expires_at(&self, now: Timestamp) -> Timestamp {
        now + Duration::days(self.refresh_token_expiry_days)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation
    }
}

fn positive_env(name: &str, default: i64) -> i64 {
    let value = match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be an integer")),
        Err(_) => default,
    };
    assert!(value > 0, "{name} must be positive");
    value
}

/// Sign an access token for `user_id`.
pub fn generate_access_token(
    user_id: DbId,
    tenant_id: Option<DbId>,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        tenant_id,
        role: role.to_string(),
        iss: TOKEN_ISSUER.to_string(),
        exp: now + config.access_expires_in_secs(),
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature, issuer, and expiry, and return the claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &config.validation(),
    )
    .map(|data| data.claims)
}

/// A freshly minted refresh token.
pub struct RefreshToken {
    /// Returned to the client once and never stored.
    pub plaintext: String,
    /// What `user_sessions.refresh_token_hash` holds.
    pub hash: String,
}

impl RefreshToken {
    /// Two v4 UUIDs: 244 random bits.
    pub fn generate() -> Self {
        let plaintext = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let hash = hash_refresh_token(&plaintext);
        Self { plaintext, hash }
    }
}

/// Digest used to look a presented refresh token up.
pub fn hash_refresh_token(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        }
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn round_trip_keeps_tenant_and_role() {
        let config = config("unit-test-secret");
        let token = generate_access_token(42, Some(7), "tenant_admin", &config).unwrap();

        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.tenant_id, Some(7));
        assert_eq!(claims.role, "tenant_admin");
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn platform_user_has_no_tenant_claim() {
        let config = config("unit-test-secret");
        let token = generate_access_token(1, None, "super_admin", &config).unwrap();
        assert_eq!(validate_token(&token, &config).unwrap().tenant_id, None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            tenant_id: Some(1),
            role: "member".into(),
            iss: TOKEN_ISSUER.into(),
            // Past the default 60 second leeway.
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = sign(&claims, "unit-test-secret");
        assert!(validate_token(&token, &config("unit-test-secret")).is_err());
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            tenant_id: Some(1),
            role: "member".into(),
            iss: "someone-else".into(),
            exp: now + 300,
            iat: now,
            jti: Uuid::new_v4().to_string(),
        };
        let token = sign(&claims, "unit-test-secret");
        assert!(validate_token(&token, &config("unit-test-secret")).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(1, Some(1), "member", &config("secret-alpha")).unwrap();
        assert!(validate_token(&token, &config("secret-bravo")).is_err());
    }

    #[test]
    fn refresh_tokens_are_unique_and_hashed() {
        let first = RefreshToken::generate();
        assert_eq!(first.hash, hash_refresh_token(&first.plaintext));
        assert_eq!(first.hash.len(), 64);
        assert_ne!(first.plaintext, RefreshToken::generate().plaintext);
    }

    #[test]
    fn refresh_token_is_two_v4_uuids() {
        let token = RefreshToken::generate();
        assert_eq!(token.plaintext.len(), 64);
        let (left, right) = token.plaintext.split_at(32);
        for half in [left, right] {
            let uuid = Uuid::parse_str(half).unwrap();
            assert_eq!(uuid.get_version_num(), 4);
        }
    }

    #[test]
    fn debug_hides_secret() {
        let rendered = format!("{:?}", config("do-not-print"));
        assert!(!rendered.contains("do-not-print"));
    }
}
