//! Estate Upload Library
//!
//! Everything between "the user picked a file" and "the entity record carries
//! a durable URL": the uploader, the compress→path→store pipeline, preview
//! handles and the per-form orchestrator.

pub mod orchestrator;
pub mod persistence;
pub mod pipeline;
pub mod preview;
pub mod slot;
pub mod uploader;

pub use orchestrator::{FieldError, SubmitOutcome, UploadOrchestrator, UploadPhase, UploadSnapshot};
pub use persistence::EntityPersistence;
pub use pipeline::UploadPipeline;
pub use preview::{PreviewHandle, PreviewRegistry};
pub use slot::{AccountProfile, Building, MediaOwner, ServiceProvider, UploadSlot};
pub use uploader::{StoredAsset, UploadError, Uploader};
