//! Local previews of a staged file.
//!
//! A preview is a `preview://{uuid}` URL backed by the staged bytes. The
//! registry keeps the bytes alive until the handle is revoked or dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use estate_core::CandidateFile;
use uuid::Uuid;

const PREVIEW_SCHEME: &str = "preview://";

#[derive(Debug, Clone)]
struct PreviewEntry {
    content_type: String,
    data: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    entries: Arc<Mutex<HashMap<Uuid, PreviewEntry>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<Uuid, PreviewEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issue a preview for `file`. The bytes are shared, not copied.
    pub fn create(&self, file: &CandidateFile) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.entries().insert(
            id,
            PreviewEntry {
                content_type: file.content_type.clone(),
                data: file.data.clone(),
            },
        );
        tracing::debug!(preview_id = %id, file_name = %file.name, "Preview created");

        PreviewHandle {
            id,
            url: format!("{}{}", PREVIEW_SCHEME, id),
            registry: self.clone(),
            released: false,
        }
    }

    /// Bytes and content type behind a live preview URL.
    pub fn resolve(&self, url: &str) -> Option<(String, Bytes)> {
        let id = url
            .strip_prefix(PREVIEW_SCHEME)
            .and_then(|raw| Uuid::parse_str(raw).ok())?;
        self.entries()
            .get(&id)
            .map(|entry| (entry.content_type.clone(), entry.data.clone()))
    }

    /// Number of previews not yet released.
    pub fn live_count(&self) -> usize {
        self.entries().len()
    }

    fn release(&self, id: Uuid) {
        if self.entries().remove(&id).is_some() {
            tracing::debug!(preview_id = %id, "Preview released");
        }
    }
}

/// Scoped ownership of one preview URL. Released on [`revoke`](Self::revoke)
/// or drop, whichever comes first.
#[derive(Debug)]
pub struct PreviewHandle {
    id: Uuid,
    url: String,
    registry: PreviewRegistry,
    released: bool,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn revoke(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.registry.release(self.id);
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.release();
    }
}
