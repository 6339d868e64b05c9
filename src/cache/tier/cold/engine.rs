//! Storage engine handle construction for the disk tier
//!
//! The disk tier is backed by RocksDB tuned for cache duty: Zstd
//! compression, a small write buffer, and non-synchronous writes. Losing the
//! tail of writes in a crash is acceptable; the repository holds the truth.

use rocksdb::{DBCompressionType, Options, WriteOptions, DB};

use crate::cache::config::DiskTierConfig;

/// Open engine plus the write options applied to every mutation.
///
/// Field order is drop order: the write-options handle is released before
/// the database it belongs to.
pub(crate) struct Engine {
    pub(crate) write_opts: WriteOptions,
    pub(crate) db: DB,
}

fn tuned_options(config: &DiskTierConfig) -> Options {
    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts.set_compression_type(DBCompressionType::Zstd);
    opts.set_write_buffer_size(config.write_buffer_size);
    opts
}

/// Open (creating if missing) the engine under the configured directory.
pub(crate) fn open(config: &DiskTierConfig) -> Result<Engine, rocksdb::Error> {
    let db = DB::open(&tuned_options(config), &config.path)?;

    // Durability on engine flush, not on every write.
    let mut write_opts = WriteOptions::default();
    write_opts.set_sync(false);

    Ok(Engine { write_opts, db })
}

/// Destroy the on-disk store. The engine must already be dropped.
pub(crate) fn destroy(config: &DiskTierConfig) -> Result<(), rocksdb::Error> {
    DB::destroy(&tuned_options(config), &config.path)
}
