//! Persistent disk tier
//!
//! A process-local, crash-safe key-value store that absorbs hot tier
//! evictions and serves lookups when the repository is unreachable. All
//! values pass through the binary codec; all engine access is serialized by
//! one process-wide mutex. An optional background worker periodically wipes
//! and rebuilds the store to bound disk growth; staleness is cheap to
//! recover because the repository holds the truth.

mod cleanup;
mod engine;

use std::collections::HashMap;
use std::fs;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rocksdb::WriteBatch;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::config::DiskTierConfig;
use crate::cache::serde::CodecPool;
use crate::cache::types::CacheError;

use self::cleanup::CleanupWorker;
use self::engine::Engine;

/// State shared between the tier handle and its cleanup worker.
pub(crate) struct DiskShared {
    engine: Mutex<Option<Engine>>,
    codec: CodecPool,
    config: DiskTierConfig,
    closed: AtomicBool,
}

impl DiskShared {
    fn ensure_open(&self) -> Result<(), CacheError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::closed("disk tier"));
        }
        Ok(())
    }

    /// Acquire the engine lock. A poisoned lock means a holder panicked
    /// mid-operation; waiters surface that as an interrupted call.
    fn engine(&self) -> Result<MutexGuard<'_, Option<Engine>>, CacheError> {
        self.ensure_open()?;
        self.engine.lock().map_err(|_| CacheError::Cancelled)
    }

    fn engine_ref<'g>(
        &self,
        guard: &'g MutexGuard<'_, Option<Engine>>,
    ) -> Result<&'g Engine, CacheError> {
        match guard.as_ref() {
            Some(engine) => Ok(engine),
            None if self.closed.load(Ordering::Acquire) => {
                Err(CacheError::closed("disk tier"))
            }
            None => Err(CacheError::disk("engine offline after failed cleanup")),
        }
    }

    /// Wipe and rebuild the store under the engine lock: drop the engine,
    /// destroy its files, recreate the directory, reopen. Afterwards the
    /// store is logically empty and immediately usable.
    pub(crate) fn run_cleanup(&self) -> Result<(), CacheError> {
        let mut guard = self.engine()?;
        if let Some(engine) = guard.take() {
            // The engine must be fully closed before its files are destroyed.
            drop(engine);
            engine::destroy(&self.config)
                .map_err(|err| CacheError::disk(format!("failed to destroy store: {}", err)))?;
        }
        fs::create_dir_all(&self.config.path).map_err(|err| {
            CacheError::disk(format!(
                "failed to recreate store directory {}: {}",
                self.config.path.display(),
                err
            ))
        })?;
        let reopened = engine::open(&self.config)
            .map_err(|err| CacheError::disk(format!("failed to reopen store: {}", err)))?;
        *guard = Some(reopened);
        Ok(())
    }
}

/// Persistent key-value store backing the coldest tier
///
/// Single writer, multiple readers, one engine mutex for both. Keys and
/// values are typed at the call sites and serialized through the codec; the
/// same concrete types must be used to store and to load an entry.
pub struct DiskTier {
    shared: Arc<DiskShared>,
    worker: Mutex<Option<CleanupWorker>>,
}

impl DiskTier {
    /// Open (creating if missing) a disk tier at the configured path and
    /// start the cleanup worker when a non-zero interval is configured.
    pub fn open(config: DiskTierConfig) -> Result<Self, CacheError> {
        fs::create_dir_all(&config.path).map_err(|err| {
            CacheError::init(format!(
                "failed to create store directory {}: {}",
                config.path.display(),
                err
            ))
        })?;
        let engine = engine::open(&config).map_err(|err| {
            CacheError::init(format!(
                "failed to open store at {}: {}",
                config.path.display(),
                err
            ))
        })?;

        let codec = CodecPool::new(config.codec_pool_size);
        let cleanup_interval = config.cleanup_interval;
        let shared = Arc::new(DiskShared {
            engine: Mutex::new(Some(engine)),
            codec,
            config,
            closed: AtomicBool::new(false),
        });

        let worker = if cleanup_interval > Duration::ZERO {
            let worker = CleanupWorker::spawn(Arc::clone(&shared), cleanup_interval)
                .map_err(|err| {
                    CacheError::init(format!("failed to spawn cleanup worker: {}", err))
                })?;
            Some(worker)
        } else {
            None
        };

        Ok(Self {
            shared,
            worker: Mutex::new(worker),
        })
    }

    /// Persist one entry. Returns once the engine has acknowledged the write.
    pub fn save<K, V>(&self, key: &K, value: &V) -> Result<(), CacheError>
    where
        K: Serialize,
        V: Serialize,
    {
        let key_bytes = self.shared.codec.encode(key)?;
        let value_bytes = self.shared.codec.encode(value)?;

        let guard = self.shared.engine()?;
        let engine = self.shared.engine_ref(&guard)?;
        engine
            .db
            .put_opt(&*key_bytes, &*value_bytes, &engine.write_opts)?;
        Ok(())
    }

    /// Persist a set of entries in one atomic batch: all or none.
    pub fn save_batch<K, V>(&self, entries: &HashMap<K, V>) -> Result<(), CacheError>
    where
        K: Serialize + Eq + Hash,
        V: Serialize,
    {
        self.shared.ensure_open()?;
        if entries.is_empty() {
            return Ok(());
        }

        let mut encoded = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            encoded.push((self.shared.codec.encode(key)?, self.shared.codec.encode(value)?));
        }

        let mut batch = WriteBatch::default();
        for (key_bytes, value_bytes) in &encoded {
            batch.put(&**key_bytes, &**value_bytes);
        }

        let guard = self.shared.engine()?;
        let engine = self.shared.engine_ref(&guard)?;
        engine.db.write_opt(batch, &engine.write_opts)?;
        Ok(())
    }

    /// Load one entry; `None` for keys the store has never seen (or that a
    /// cleanup has wiped).
    pub fn load<K, V>(&self, key: &K) -> Result<Option<V>, CacheError>
    where
        K: Serialize,
        V: DeserializeOwned,
    {
        let key_bytes = self.shared.codec.encode(key)?;

        let guard = self.shared.engine()?;
        let engine = self.shared.engine_ref(&guard)?;
        let found = engine.db.get(&*key_bytes)?;
        drop(guard);

        match found {
            Some(bytes) => Ok(Some(self.shared.codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load many entries. Absent keys are omitted from the result, never
    /// mapped to a placeholder.
    pub fn load_batch<K, V>(&self, keys: &[K]) -> Result<HashMap<K, V>, CacheError>
    where
        K: Serialize + Eq + Hash + Clone,
        V: DeserializeOwned,
    {
        self.shared.ensure_open()?;
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let mut encoded = Vec::with_capacity(keys.len());
        for key in keys {
            encoded.push(self.shared.codec.encode(key)?);
        }

        let guard = self.shared.engine()?;
        let engine = self.shared.engine_ref(&guard)?;
        let found = engine.db.multi_get(encoded.iter().map(|bytes| &**bytes));
        drop(guard);

        let mut result = HashMap::with_capacity(keys.len());
        for (key, lookup) in keys.iter().zip(found) {
            if let Some(bytes) = lookup? {
                result.insert(key.clone(), self.shared.codec.decode(&bytes)?);
            }
        }
        Ok(result)
    }

    /// Wipe the store: every previously saved entry is gone, and the store
    /// remains open for use.
    pub fn cleanup(&self) -> Result<(), CacheError> {
        self.shared.run_cleanup()
    }

    /// Stop the cleanup worker and release the engine. Idempotent; later
    /// operations report the tier as closed.
    pub fn close(&self) -> Result<(), CacheError> {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let worker = self
            .worker
            .lock()
            .map_err(|_| CacheError::Cancelled)?
            .take();
        if let Some(worker) = worker {
            worker.stop();
        }

        let mut guard = self
            .shared
            .engine
            .lock()
            .map_err(|_| CacheError::Cancelled)?;
        // Dropping the engine releases the write-options handle and the
        // database in that order.
        guard.take();
        Ok(())
    }

    /// Whether `close()` has run.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Directory holding the engine's files.
    pub fn path(&self) -> &std::path::Path {
        &self.shared.config.path
    }
}

impl Drop for DiskTier {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("error closing disk tier on drop: {}", err);
        }
    }
}

impl std::fmt::Debug for DiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskTier")
            .field("path", &self.shared.config.path)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
