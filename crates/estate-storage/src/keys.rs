//! Storage key construction.
//!
//! Key format: `{category}/{id}/{prefix}_{timestamp}.{ext}`.
//!
//! - `category` is one of the fixed [`AssetCategory`] segments.
//! - `id` is the owning entity's identifier, or `unassigned-{uuid}` when the
//!   entity has not been created yet.
//! - `timestamp` is milliseconds since the Unix epoch, strictly increasing
//!   within the process, so repeated uploads to one entity never overwrite
//!   each other.
//!
//! Keys must not contain `..` or a leading `/`. Every segment is sanitised to
//! `[A-Za-z0-9_-]` before it is joined.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use estate_core::constants::{DEFAULT_EXTENSION, UNASSIGNED_ID_PREFIX};
use estate_core::AssetCategory;
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

const MAX_EXTENSION_LEN: usize = 8;

static LAST_TIMESTAMP_MS: AtomicI64 = AtomicI64::new(0);

/// A storage key produced for a single upload event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePath {
    key: String,
    timestamp_ms: i64,
}

impl StoragePath {
    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    /// Whether the id segment was generated because no entity id was given.
    pub fn is_unassigned(&self) -> bool {
        self.key
            .split('/')
            .nth(1)
            .is_some_and(|id| id.starts_with(UNASSIGNED_ID_PREFIX))
    }

    pub fn into_string(self) -> String {
        self.key
    }
}

impl Display for StoragePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for StoragePath {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

/// Build the storage key for one upload.
///
/// `file_name` is the name of the file actually being uploaded (after the
/// compressor may have renamed it); its extension ends up in the key.
pub fn build_path(
    category: AssetCategory,
    entity_id: Option<&str>,
    prefix: &str,
    file_name: &str,
) -> StoragePath {
    let id = entity_id
        .map(sanitize_segment)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("{}{}", UNASSIGNED_ID_PREFIX, Uuid::new_v4()));

    let prefix = match sanitize_segment(prefix) {
        p if p.is_empty() => "file".to_string(),
        p => p,
    };

    let timestamp_ms = next_timestamp_ms();
    let extension = extension_from_name(file_name);

    StoragePath {
        key: format!(
            "{}/{}/{}_{}.{}",
            category.as_segment(),
            id,
            prefix,
            timestamp_ms,
            extension
        ),
        timestamp_ms,
    }
}

/// Lowercased extension of `file_name`, or `jpg` if none can be extracted.
pub fn extension_from_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);

    match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// Reject keys that could escape a storage root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if storage_key.contains("..") || storage_key.starts_with('/') || storage_key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

fn sanitize_segment(raw: &str) -> String {
    raw.trim()
        .chars()
        .take(128)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn next_timestamp_ms() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_TIMESTAMP_MS.load(Ordering::Relaxed);
    loop {
        let candidate = if now > last { now } else { last + 1 };
        match LAST_TIMESTAMP_MS.compare_exchange_weak(
            last,
            candidate,
            Ordering::SeqCst,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn path_has_expected_shape() {
        let path = build_path(AssetCategory::Buildings, Some("b-42"), "image", "front.PNG");
        let parts: Vec<&str> = path.as_str().split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "buildings");
        assert_eq!(parts[1], "b-42");
        assert_eq!(parts[2], format!("image_{}.png", path.timestamp_ms()));
        assert!(!path.is_unassigned());
    }

    #[test]
    fn successive_paths_for_same_entity_differ() {
        let first = build_path(AssetCategory::Providers, Some("p1"), "logo", "logo.jpg");
        let second = build_path(AssetCategory::Providers, Some("p1"), "logo", "logo.jpg");
        assert_ne!(first, second);
        assert!(second.timestamp_ms() > first.timestamp_ms());
    }

    #[test]
    fn burst_of_paths_is_unique() {
        let keys: HashSet<String> = (0..500)
            .map(|_| build_path(AssetCategory::Units, Some("u"), "image", "a.jpg").into_string())
            .collect();
        assert_eq!(keys.len(), 500);
    }

    #[test]
    fn missing_entity_gets_unassigned_id() {
        let path = build_path(AssetCategory::Requests, None, "photo", "x.webp");
        assert!(path.is_unassigned());
        let id = path.as_str().split('/').nth(1).unwrap();
        let uuid_part = id.strip_prefix(UNASSIGNED_ID_PREFIX).unwrap();
        assert!(Uuid::parse_str(uuid_part).is_ok());

        let blank = build_path(AssetCategory::Requests, Some("  "), "photo", "x.webp");
        assert!(blank.is_unassigned());
    }

    #[test]
    fn extension_defaults_to_jpg() {
        assert_eq!(extension_from_name("noextension"), "jpg");
        assert_eq!(extension_from_name("trailingdot."), "jpg");
        assert_eq!(extension_from_name(".hidden"), "jpg");
        assert_eq!(extension_from_name("weird.p@g"), "jpg");
        assert_eq!(extension_from_name("scan.PDF"), "pdf");
        assert_eq!(extension_from_name("dir.v2/photo.jpeg"), "jpeg");
    }

    #[test]
    fn hostile_segments_are_sanitised() {
        let path = build_path(
            AssetCategory::Components,
            Some("../../etc"),
            "a/b",
            "../../passwd.txt",
        );
        assert!(validate_key(path.as_str()).is_ok());
        assert!(path.as_str().starts_with("components/______etc/a_b_"));
    }

    #[test]
    fn validate_key_rejects_traversal() {
        assert!(validate_key("buildings/1/image_1.jpg").is_ok());
        assert!(matches!(
            validate_key("../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(validate_key("/abs/key").is_err());
        assert!(validate_key("").is_err());
    }
}
