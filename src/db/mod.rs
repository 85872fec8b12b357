//! Durable storage layer (key/value).

pub mod storage;

pub use storage::StorageDb;

use crate::models::SCHEMA_VERSION;

/// Storage key names as constants.
pub mod keys {
    /// Prefix shared by every namespaced selection record.
    pub const SELECTION_PREFIX: &str = "coverage-selection:";

    /// Unnamespaced keys written by earlier releases. Always swept.
    pub const LEGACY: &[&str] = &[
        "coverage-selection",
        "user-coverage-storage",
        "coverage-storage",
    ];
}

/// Key holding the current-version selection record for `user_id`.
pub fn selection_key(user_id: &str) -> String {
    format!("{}v{}:{}", keys::SELECTION_PREFIX, SCHEMA_VERSION, user_id)
}

/// Split a namespaced selection key into `(version, user_id)`.
///
/// Returns `None` for keys outside the selection namespace or with an
/// unreadable version tag.
pub fn parse_selection_key(key: &str) -> Option<(u32, &str)> {
    let rest = key.strip_prefix(keys::SELECTION_PREFIX)?;
    let (version, user_id) = rest.split_once(':')?;
    let version = version.strip_prefix('v')?.parse().ok()?;
    Some((version, user_id))
}
