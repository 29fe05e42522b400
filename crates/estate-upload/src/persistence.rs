use async_trait::async_trait;
use estate_core::PersistResponse;

/// Saves an entity record once its media URL is settled.
///
/// The transport is the application's business. Report refusals through
/// `PersistResponse { success: false, .. }` and transport failures as `Err`.
#[async_trait]
pub trait EntityPersistence<E: Sync>: Send + Sync {
    async fn persist(&self, entity: &E) -> anyhow::Result<PersistResponse>;
}
