//! Estate Storage Library
//!
//! Storage abstraction and backends for uploaded media, plus the key builder
//! every upload goes through.
//!
//! # Storage key format
//!
//! `{category}/{id}/{prefix}_{timestamp}.{ext}`, built only by
//! [`keys::build_path`] so that all backends and callers agree on the layout.
//! Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod object;
pub mod traits;

// Re-export commonly used types
pub use estate_core::StorageBackend;
pub use factory::create_storage;
pub use keys::{build_path, extension_from_name, StoragePath};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use object::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use object::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
