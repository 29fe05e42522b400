//! Per-form upload orchestration.
//!
//! One orchestrator backs one upload field of one form. It stages the picked
//! file, owns its preview, runs at most one submit sequence at a time and
//! translates failures into [`UploadErrorKind`]s for display.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`. Every `bind` and `dispose` bumps a generation counter; a submit
//! that finishes under an older generation leaves the state alone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use estate_core::{AppError, CandidateFile, ErrorMetadata, LogLevel, UploadErrorKind};
use estate_processing::{MediaValidator, ValidationError};

use crate::persistence::EntityPersistence;
use crate::pipeline::UploadPipeline;
use crate::preview::{PreviewHandle, PreviewRegistry};
use crate::slot::{MediaOwner, UploadSlot};
use crate::uploader::StoredAsset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    FileSelected,
    Uploading,
}

/// Error shown next to the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub kind: UploadErrorKind,
    pub message: String,
}

/// Read-only view for rendering the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSnapshot {
    pub phase: UploadPhase,
    pub selected_file: Option<String>,
    pub preview_url: Option<String>,
    pub error: Option<FieldError>,
    /// URL currently recorded on the bound entity.
    pub current_url: Option<String>,
    /// Bumped whenever the file input must be cleared.
    pub input_resets: u64,
}

#[derive(Debug)]
pub enum SubmitOutcome<E> {
    /// Entity persisted with `url` as its media URL.
    Saved { entity: E, url: Option<String> },
    /// Another submit is still running; nothing was done.
    Busy,
    Failed {
        kind: UploadErrorKind,
        message: String,
    },
    Disposed,
}

impl<E> SubmitOutcome<E> {
    pub fn is_saved(&self) -> bool {
        matches!(self, SubmitOutcome::Saved { .. })
    }
}

#[derive(Debug, Default)]
struct PendingUpload {
    entity_id: Option<String>,
    current_url: Option<String>,
    /// Set by `remove_file`; the next submit saves the entity without media
    /// whatever URL it carries.
    url_removed: bool,
    selected: Option<CandidateFile>,
    preview: Option<PreviewHandle>,
    error: Option<FieldError>,
    input_resets: u64,
    /// Changes on every select/remove so a finishing submit only clears the
    /// file it actually uploaded.
    selection: u64,
    generation: u64,
    disposed: bool,
}

impl PendingUpload {
    fn clear_selection(&mut self) -> Option<PreviewHandle> {
        self.selected = None;
        self.error = None;
        self.selection += 1;
        self.preview.take()
    }
}

struct SubmitTicket {
    generation: u64,
    selection: u64,
    entity_id: Option<String>,
    staged: Option<CandidateFile>,
    current_url: Option<String>,
}

/// Holds the busy flag for the lifetime of one submit sequence.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct UploadOrchestrator<E: MediaOwner> {
    slot: UploadSlot,
    validator: MediaValidator,
    pipeline: UploadPipeline,
    persistence: Arc<dyn EntityPersistence<E>>,
    previews: PreviewRegistry,
    state: Mutex<PendingUpload>,
    busy: AtomicBool,
}

impl<E: MediaOwner> UploadOrchestrator<E> {
    pub fn new(
        slot: UploadSlot,
        pipeline: UploadPipeline,
        persistence: Arc<dyn EntityPersistence<E>>,
        previews: PreviewRegistry,
    ) -> Self {
        Self {
            slot,
            validator: MediaValidator::for_kind(slot.kind),
            pipeline,
            persistence,
            previews,
            state: Mutex::new(PendingUpload::default()),
            busy: AtomicBool::new(false),
        }
    }

    /// Replace the built-in limits, e.g. with [`MediaValidator::from_config`].
    pub fn with_validator(mut self, validator: MediaValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn slot(&self) -> &UploadSlot {
        &self.slot
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn state(&self) -> MutexGuard<'_, PendingUpload> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> UploadSnapshot {
        let busy = self.is_busy();
        let state = self.state();
        let phase = if busy {
            UploadPhase::Uploading
        } else if state.selected.is_some() {
            UploadPhase::FileSelected
        } else {
            UploadPhase::Idle
        };

        UploadSnapshot {
            phase,
            selected_file: state.selected.as_ref().map(|f| f.name.clone()),
            preview_url: state.preview.as_ref().map(|p| p.url().to_string()),
            error: state.error.clone(),
            current_url: state.current_url.clone(),
            input_resets: state.input_resets,
        }
    }

    /// Re-initialise for another entity. Pending state is dropped and any
    /// submit still running for the previous entity will not touch it.
    pub fn bind(&self, entity_id: Option<String>, current_url: Option<String>) {
        let preview = {
            let mut state = self.state();
            state.generation += 1;
            state.disposed = false;
            state.entity_id = entity_id;
            state.current_url = current_url;
            state.url_removed = false;
            state.input_resets += 1;
            state.clear_selection()
        };
        if let Some(preview) = preview {
            preview.revoke();
        }
        tracing::debug!(category = %self.slot.category, "Upload field bound");
    }

    pub fn bind_entity(&self, entity: &E) {
        self.bind(
            entity.entity_id().map(str::to_owned),
            entity.media_url().map(str::to_owned),
        );
    }

    /// Validate and stage `file`. A rejected file leaves the previously staged
    /// file and its preview in place.
    pub fn select_file(&self, file: CandidateFile) -> Result<(), UploadErrorKind> {
        if let Err(e) = self.validator.check(&file) {
            let kind = e.kind();
            tracing::debug!(
                error = %e,
                category = %self.slot.category,
                file_name = %file.name,
                size_bytes = file.size,
                "Selected file rejected"
            );
            self.state().error = Some(FieldError {
                kind,
                message: kind.to_string(),
            });
            return Err(kind);
        }

        let preview = self.previews.create(&file);
        let superseded = {
            let mut state = self.state();
            if state.disposed {
                tracing::debug!(category = %self.slot.category, "Selection after dispose ignored");
                Some(preview)
            } else {
                state.selected = Some(file);
                state.error = None;
                state.selection += 1;
                state.preview.replace(preview)
            }
        };
        if let Some(old) = superseded {
            old.revoke();
        }
        Ok(())
    }

    /// Drop the staged file and the entity's current URL; the next submit
    /// saves the entity without media unless another file is staged.
    pub fn remove_file(&self) {
        let preview = {
            let mut state = self.state();
            state.current_url = None;
            state.url_removed = true;
            state.input_resets += 1;
            state.clear_selection()
        };
        if let Some(preview) = preview {
            preview.revoke();
        }
    }

    /// Upload the staged file if any, set the resulting URL on `entity` and
    /// persist it. At most one sequence runs at a time.
    pub async fn submit(&self, mut entity: E) -> SubmitOutcome<E> {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!(category = %self.slot.category, "Submit ignored, upload in progress");
            return SubmitOutcome::Busy;
        };

        let Some(ticket) = self.ticket(&entity) else {
            return SubmitOutcome::Disposed;
        };

        let uploaded = match ticket.staged {
            Some(file) => {
                match self
                    .pipeline
                    .store(
                        file,
                        self.slot.category,
                        self.slot.prefix,
                        ticket.entity_id.as_deref(),
                    )
                    .await
                {
                    Ok(asset) => Some(asset),
                    Err(err) => return self.fail(ticket.generation, err),
                }
            }
            None => None,
        };

        let url = uploaded
            .as_ref()
            .map(|asset| asset.url.clone())
            .or(ticket.current_url);
        entity.set_media_url(url.clone());

        if let Err(err) = self.persist(&entity).await {
            if let Some(asset) = &uploaded {
                self.discard_orphan(asset).await;
            }
            return self.fail(ticket.generation, err);
        }

        self.complete(ticket.generation, ticket.selection, url.clone());
        SubmitOutcome::Saved { entity, url }
    }

    /// Teardown. Releases the preview; late completions become no-ops.
    pub fn dispose(&self) {
        let preview = {
            let mut state = self.state();
            state.disposed = true;
            state.generation += 1;
            state.clear_selection()
        };
        if let Some(preview) = preview {
            preview.revoke();
        }
    }

    /// Snapshot what this submit works on. An entity other than the bound one
    /// re-binds the field first: its own URL is retained and anything staged
    /// for the previous entity is dropped.
    fn ticket(&self, entity: &E) -> Option<SubmitTicket> {
        let (ticket, released) = {
            let mut state = self.state();
            if state.disposed {
                return None;
            }

            let mut released = None;
            if let Some(id) = entity.entity_id() {
                let previous = state.entity_id.clone().filter(|bound| bound != id);
                if let Some(bound) = previous {
                    tracing::debug!(
                        category = %self.slot.category,
                        bound_id = %bound,
                        entity_id = %id,
                        "Submitted entity differs from the bound one, rebinding"
                    );
                    state.generation += 1;
                    state.current_url = entity.media_url().map(str::to_owned);
                    state.url_removed = false;
                    state.input_resets += 1;
                    released = state.clear_selection();
                }
                state.entity_id = Some(id.to_owned());
            }

            let current_url = if state.url_removed {
                None
            } else {
                state
                    .current_url
                    .clone()
                    .or_else(|| entity.media_url().map(str::to_owned))
            };

            let ticket = SubmitTicket {
                generation: state.generation,
                selection: state.selection,
                entity_id: state.entity_id.clone(),
                staged: state.selected.clone(),
                current_url,
            };
            (ticket, released)
        };

        if let Some(preview) = released {
            preview.revoke();
        }
        Some(ticket)
    }

    async fn persist(&self, entity: &E) -> Result<(), AppError> {
        match self.persistence.persist(entity).await {
            Ok(response) if response.success => Ok(()),
            Ok(response) => Err(AppError::PersistFailed(response.message)),
            Err(err) => match err.downcast::<ValidationError>() {
                Ok(validation) => Err(validation.into()),
                Err(err) => {
                    tracing::warn!(
                        error = ?err,
                        category = %self.slot.category,
                        "Entity persistence raised an error"
                    );
                    Err(AppError::PersistFailed(String::new()))
                }
            },
        }
    }

    /// The uploaded object is unreferenced once persistence fails.
    async fn discard_orphan(&self, asset: &StoredAsset) {
        if let Err(e) = self.pipeline.uploader().discard(asset).await {
            tracing::warn!(
                error = %e,
                key = %asset.key,
                "Failed to delete orphaned upload"
            );
        }
    }

    fn fail(&self, generation: u64, err: AppError) -> SubmitOutcome<E> {
        let detail = err.detailed_message();
        let code = err.error_code();
        let category = self.slot.category;

        if err.kind() == UploadErrorKind::StorageUnavailable {
            tracing::error!(
                error = %detail,
                error_code = code,
                category = %category,
                "Upload attempted without a configured storage backend"
            );
        } else {
            match err.log_level() {
                LogLevel::Debug => {
                    tracing::debug!(error = %detail, error_code = code, category = %category, "Submit failed")
                }
                LogLevel::Warn => {
                    tracing::warn!(error = %detail, error_code = code, category = %category, "Submit failed")
                }
                LogLevel::Error => {
                    tracing::error!(error = %detail, error_code = code, category = %category, "Submit failed")
                }
            }
        }

        let field_error = FieldError {
            kind: err.kind().for_display(),
            message: err.client_message(),
        };

        let mut state = self.state();
        if state.generation == generation && !state.disposed {
            state.error = Some(field_error.clone());
        } else {
            tracing::debug!(category = %category, "Discarding failure from a previous binding");
        }

        SubmitOutcome::Failed {
            kind: field_error.kind,
            message: field_error.message,
        }
    }

    fn complete(&self, generation: u64, selection: u64, url: Option<String>) {
        let preview = {
            let mut state = self.state();
            if state.generation != generation || state.disposed {
                tracing::debug!(
                    category = %self.slot.category,
                    "Discarding completion from a previous binding"
                );
                return;
            }
            state.current_url = url;
            state.url_removed = false;
            state.error = None;
            if state.selection == selection {
                state.selected = None;
                state.preview.take()
            } else {
                None
            }
        };
        if let Some(preview) = preview {
            preview.revoke();
        }
    }
}

impl<E: MediaOwner> Drop for UploadOrchestrator<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}
