//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use estate_core::{CandidateFile, PersistResponse};
use estate_processing::Compressor;
use estate_storage::{MemoryStorage, Storage, StorageBackend, StorageError, StorageResult};
use estate_upload::{
    EntityPersistence, MediaOwner, PreviewRegistry, UploadOrchestrator, UploadPipeline,
    UploadSlot, Uploader,
};
use tokio::sync::{Notify, Semaphore};

pub const BASE_URL: &str = "memory://estate";

/// In-memory storage that counts puts and can fail or hold them.
pub struct CountingStorage {
    inner: MemoryStorage,
    puts: AtomicUsize,
    keys: Mutex<Vec<String>>,
    fail_puts: AtomicBool,
    gated: AtomicBool,
    put_started: Notify,
    gate: Semaphore,
}

impl CountingStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStorage::in_memory(BASE_URL),
            puts: AtomicUsize::new(0),
            keys: Mutex::new(Vec::new()),
            fail_puts: AtomicBool::new(false),
            gated: AtomicBool::new(false),
            put_started: Notify::new(),
            gate: Semaphore::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        let storage = Self::new();
        storage.fail_puts.store(true, Ordering::SeqCst);
        storage
    }

    /// Hold every put until [`release`](Self::release) is called.
    pub fn gated() -> Arc<Self> {
        let storage = Self::new();
        storage.gated.store(true, Ordering::SeqCst);
        storage
    }

    pub async fn wait_for_put(&self) {
        self.put_started.notified().await;
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl Storage for CountingStorage {
    async fn put(&self, storage_key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(storage_key.to_string());

        if self.gated.load(Ordering::SeqCst) {
            self.put_started.notify_one();
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            permit.forget();
        }

        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed("503 Service Unavailable".into()));
        }
        self.inner.put(storage_key, data, content_type).await
    }

    async fn durable_url(&self, storage_key: &str) -> StorageResult<String> {
        self.inner.durable_url(storage_key).await
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.inner.download(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.delete(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

/// Wraps a compressor and counts calls.
pub struct CountingCompressor<C> {
    inner: C,
    calls: AtomicUsize,
}

impl<C: Compressor> CountingCompressor<C> {
    pub fn new(inner: C) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<C: Compressor> Compressor for CountingCompressor<C> {
    async fn maybe_compress(&self, file: CandidateFile) -> CandidateFile {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.maybe_compress(file).await
    }
}

enum Reply {
    Accept,
    Refuse(String),
    Raise(String),
}

/// Records every entity it is asked to persist.
pub struct RecordingPersistence<E> {
    saved: Mutex<Vec<E>>,
    reply: Reply,
}

impl<E> RecordingPersistence<E> {
    fn with_reply(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            saved: Mutex::new(Vec::new()),
            reply,
        })
    }

    pub fn accepting() -> Arc<Self> {
        Self::with_reply(Reply::Accept)
    }

    pub fn refusing(message: &str) -> Arc<Self> {
        Self::with_reply(Reply::Refuse(message.to_string()))
    }

    pub fn raising(message: &str) -> Arc<Self> {
        Self::with_reply(Reply::Raise(message.to_string()))
    }
}

impl<E: Clone> RecordingPersistence<E> {
    pub fn saved(&self) -> Vec<E> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl<E: Clone + Send + Sync> EntityPersistence<E> for RecordingPersistence<E> {
    async fn persist(&self, entity: &E) -> anyhow::Result<PersistResponse> {
        self.saved.lock().unwrap().push(entity.clone());
        match &self.reply {
            Reply::Accept => Ok(PersistResponse::ok()),
            Reply::Refuse(message) => Ok(PersistResponse::failed(message.clone())),
            Reply::Raise(message) => Err(anyhow::anyhow!("{}", message)),
        }
    }
}

pub fn orchestrator<E, C>(
    slot: UploadSlot,
    compressor: Arc<C>,
    storage: Arc<CountingStorage>,
    persistence: Arc<RecordingPersistence<E>>,
    previews: &PreviewRegistry,
) -> UploadOrchestrator<E>
where
    E: MediaOwner + Clone + 'static,
    C: Compressor + 'static,
{
    let pipeline = UploadPipeline::new(compressor, Uploader::with_storage(storage));
    UploadOrchestrator::new(slot, pipeline, persistence, previews.clone())
}

pub fn file(name: &str, content_type: &str, size: usize) -> CandidateFile {
    CandidateFile::new(name, content_type, Bytes::from(vec![0xAB; size]))
}
