//! Audit trail constants, hash chaining, and detail redaction.
//!
//! Lives in `core` so the repository layer can compute chain hashes inside
//! its append transaction and the API layer can verify them afterwards.

use chrono::SubsecRound;

use crate::hashing;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Action type constants
// ---------------------------------------------------------------------------

/// Known action types for audit log entries.
pub mod action_types {
    pub const LOGIN: &str = "login";
    pub const LOGOUT: &str = "logout";
    pub const ENTITY_CREATE: &str = "entity_create";
    pub const ENTITY_UPDATE: &str = "entity_update";
    pub const ENTITY_DELETE: &str = "entity_delete";
    pub const PERMISSION_GRANT: &str = "permission_grant";
    pub const PERMISSION_REVOKE: &str = "permission_revoke";
    pub const PASSWORD_RESET: &str = "password_reset";
    pub const TENANT_CONFIGURE: &str = "tenant_configure";
    pub const LEAD_CONVERT: &str = "lead_convert";
    pub const EVENT_PUBLISH: &str = "event_publish";
}

/// Entity type names recorded in `audit_logs.entity_type`.
pub mod entity_types {
    pub const TENANT: &str = "tenant";
    pub const USER: &str = "user";
    pub const PERMISSION_GRANT: &str = "permission_grant";
    pub const CUSTOMER: &str = "customer";
    pub const LEAD: &str = "lead";
    pub const DEAL: &str = "deal";
    pub const PROJECT: &str = "project";
    pub const TASK: &str = "task";
    pub const EMPLOYEE: &str = "employee";
    pub const CONTENT_ITEM: &str = "content_item";
    pub const EVENT: &str = "event";
}

// ---------------------------------------------------------------------------
// Hash chain
// ---------------------------------------------------------------------------

/// Known seed value for the first entry in the hash chain.
const CHAIN_SEED: &str = "ATRIUM_AUDIT_CHAIN_SEED_V1";

/// PostgreSQL advisory lock id held while appending to the chain.
pub const AUDIT_CHAIN_LOCK_ID: i64 = 604_117_229;

/// Truncate a timestamp to the microsecond precision PostgreSQL stores.
///
/// The chain hash covers the timestamp text, so the value hashed at insert
/// time must be identical to the one read back later.
pub fn chain_timestamp(ts: Timestamp) -> Timestamp {
    ts.trunc_subsecs(6)
}

/// Every stored column of an entry that its integrity hash covers.
#[derive(Debug, Clone, Copy)]
pub struct ChainFields<'a> {
    pub timestamp: Timestamp,
    pub tenant_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub request_id: Option<&'a str>,
    pub action_type: &'a str,
    pub entity_type: Option<&'a str>,
    pub entity_id: Option<DbId>,
    pub details: Option<&'a serde_json::Value>,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

/// Canonical string covered by an entry's integrity hash.
///
/// Ids and the action keep the plain `ts|tenant|user|action|entity_type|entity_id`
/// prefix. Free-form text is JSON-quoted so a `|` inside it cannot shift
/// fields, and details are rendered with sorted keys so the JSONB round trip
/// reproduces them exactly.
pub fn canonical_entry(fields: &ChainFields<'_>) -> String {
    let text = |value: Option<&str>| serde_json::to_string(&value).unwrap_or_default();
    format!(
        "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
        fields.timestamp.to_rfc3339(),
        fields.tenant_id.map_or(String::new(), |id| id.to_string()),
        fields.user_id.map_or(String::new(), |id| id.to_string()),
        fields.action_type,
        fields.entity_type.unwrap_or(""),
        fields.entity_id.map_or(String::new(), |id| id.to_string()),
        text(fields.request_id),
        text(fields.ip_address),
        text(fields.user_agent),
        fields.details.map_or_else(|| "null".to_string(), canonical_json),
    )
}

/// Compact JSON with object keys in sorted order at every depth.
pub fn canonical_json(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let body = keys
                .into_iter()
                .map(|key| {
                    format!(
                        "{}:{}",
                        serde_json::to_string(key).unwrap_or_default(),
                        canonical_json(&map[key.as_str()])
                    )
                })
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{body}}}")
        }
        Value::Array(items) => {
            let body = items.iter().map(canonical_json).collect::<Vec<_>>().join(",");
            format!("[{body}]")
        }
        scalar => scalar.to_string(),
    }
}

/// Compute the SHA-256 integrity hash for an audit log entry.
///
/// `prev_hash` is the hash of the previous entry, or `None` for the first
/// entry in the chain (which uses a known seed value).
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let combined = format!("{prev}|{entry_data}");
    hashing::sha256_hex(combined.as_bytes())
}

/// One stored entry as seen by the chain verifier.
#[derive(Debug, Clone)]
pub struct ChainLink {
    pub id: DbId,
    pub canonical: String,
    pub integrity_hash: Option<String>,
}

/// Outcome of walking the chain in id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerification {
    pub verified_entries: i64,
    /// Id of the first entry whose stored hash does not match.
    pub first_break: Option<DbId>,
}

impl ChainVerification {
    pub fn is_valid(&self) -> bool {
        self.first_break.is_none()
    }
}

/// Recompute every hash in order and report the first mismatch.
///
/// Entries without a stored hash are counted but do not advance the chain.
pub fn verify_chain(links: &[ChainLink]) -> ChainVerification {
    let mut verified = 0;
    let mut prev: Option<&str> = None;

    for link in links {
        if let Some(stored) = link.integrity_hash.as_deref() {
            let expected = compute_integrity_hash(prev, &link.canonical);
            if stored != expected {
                return ChainVerification {
                    verified_entries: verified,
                    first_break: Some(link.id),
                };
            }
            prev = Some(stored);
        }
        verified += 1;
    }

    ChainVerification {
        verified_entries: verified,
        first_break: None,
    }
}

// ---------------------------------------------------------------------------
// Sensitive field redaction
// ---------------------------------------------------------------------------

/// Key fragments whose values are never written to the audit log.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "api_key",
    "private_key",
    "authorization",
    "credential",
];

/// Replace the value of every key containing a [`SENSITIVE_FIELDS`] fragment
/// with `"[REDACTED]"`, recursing into nested objects and arrays.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in map {
                let lower_key = key.to_lowercase();
                if SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f)) {
                    redacted.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    redacted.insert(key.clone(), redact_sensitive_fields(val));
                }
            }
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn chain(entries: &[&str]) -> Vec<ChainLink> {
        let mut prev: Option<String> = None;
        entries
            .iter()
            .enumerate()
            .map(|(i, data)| {
                let hash = compute_integrity_hash(prev.as_deref(), data);
                prev = Some(hash.clone());
                ChainLink {
                    id: i as DbId + 1,
                    canonical: data.to_string(),
                    integrity_hash: Some(hash),
                }
            })
            .collect()
    }

    fn fields<'a>(details: Option<&'a serde_json::Value>) -> ChainFields<'a> {
        ChainFields {
            timestamp: ts(),
            tenant_id: None,
            user_id: Some(3),
            request_id: None,
            action_type: "login",
            entity_type: None,
            entity_id: None,
            details,
            ip_address: None,
            user_agent: None,
        }
    }

    #[test]
    fn canonical_entry_leaves_missing_fields_blank() {
        let s = canonical_entry(&fields(None));
        assert_eq!(s, "2026-03-01T12:00:00+00:00||3|login|||null|null|null|null");
    }

    #[test]
    fn canonical_entry_covers_details_and_client() {
        let details = serde_json::json!({ "stage": "proposal" });
        let mut entry = fields(Some(&details));
        entry.ip_address = Some("10.0.0.1");
        entry.user_agent = Some("curl|8");
        let s = canonical_entry(&entry);
        assert!(s.ends_with(r#"|null|"10.0.0.1"|"curl|8"|{"stage":"proposal"}"#));

        let forged = serde_json::json!({ "stage": "closed_won" });
        let mut tampered = entry;
        tampered.details = Some(&forged);
        assert_ne!(canonical_entry(&tampered), s);
    }

    #[test]
    fn canonical_json_sorts_keys_at_every_depth() {
        let value = serde_json::json!({ "b": 1, "a": { "z": [true, null], "m": "x" } });
        assert_eq!(canonical_json(&value), r#"{"a":{"m":"x","z":[true,null]},"b":1}"#);
    }

    #[test]
    fn chain_timestamp_drops_nanoseconds() {
        let precise = ts() + chrono::Duration::nanoseconds(123_456_789);
        let truncated = chain_timestamp(precise);
        assert_eq!(truncated.timestamp_subsec_nanos(), 123_456_000);
    }

    #[test]
    fn first_entry_uses_seed() {
        let hash = compute_integrity_hash(None, "test_data");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, compute_integrity_hash(Some(CHAIN_SEED), "test_data"));
    }

    #[test]
    fn different_prev_hash_produces_different_result() {
        let a = compute_integrity_hash(Some("hash_a"), "same_data");
        let b = compute_integrity_hash(Some("hash_b"), "same_data");
        assert_ne!(a, b);
    }

    #[test]
    fn intact_chain_verifies() {
        let links = chain(&["a", "b", "c"]);
        let result = verify_chain(&links);
        assert!(result.is_valid());
        assert_eq!(result.verified_entries, 3);
    }

    #[test]
    fn tampered_entry_breaks_chain_at_that_id() {
        let mut links = chain(&["a", "b", "c"]);
        links[1].canonical = "b-edited".into();
        let result = verify_chain(&links);
        assert_eq!(result.first_break, Some(2));
        assert_eq!(result.verified_entries, 1);
    }

    #[test]
    fn unhashed_entries_are_counted_but_skipped() {
        let mut links = chain(&["a", "b"]);
        links.insert(
            1,
            ChainLink {
                id: 99,
                canonical: "legacy".into(),
                integrity_hash: None,
            },
        );
        let result = verify_chain(&links);
        assert!(result.is_valid());
        assert_eq!(result.verified_entries, 3);
    }

    #[test]
    fn redacts_sensitive_keys_recursively() {
        let input = serde_json::json!({
            "email": "a@b.c",
            "password": "s3cret",
            "nested": {"refresh_token": "x", "name": "n"},
            "list": [{"api_key": "k"}]
        });
        let result = redact_sensitive_fields(&input);
        assert_eq!(result["email"], "a@b.c");
        assert_eq!(result["password"], "[REDACTED]");
        assert_eq!(result["nested"]["refresh_token"], "[REDACTED]");
        assert_eq!(result["nested"]["name"], "n");
        assert_eq!(result["list"][0]["api_key"], "[REDACTED]");
    }

    #[test]
    fn non_object_values_unchanged() {
        let input = serde_json::json!("plain_string");
        assert_eq!(redact_sensitive_fields(&input), "plain_string");
    }
}
