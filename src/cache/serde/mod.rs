//! Binary object codec with pooled encoder buffers
//!
//! All values crossing into the disk tier pass through this codec. Encodings
//! carry a small self-describing envelope (format version plus a tag derived
//! from the value's type name) so heterogeneous encodings can coexist in one
//! engine column and decoding as the wrong type fails cleanly instead of
//! yielding garbage.
//!
//! Encoder scratch buffers are recycled through a bounded lock-free pool:
//! acquisition never blocks (an empty pool allocates fresh), release discards
//! when the pool is full.

use std::any;
use std::ops::Deref;

use crossbeam_queue::ArrayQueue;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::types::CacheError;

/// Default number of retained encoder buffers.
pub const DEFAULT_POOL_CAPACITY: usize = 8;

/// Envelope layout: one version byte, then the 64-bit type tag.
const ENVELOPE_VERSION: u8 = 1;
const ENVELOPE_HEADER_LEN: usize = 9;

/// Buffers that grew beyond this are dropped instead of pooled.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the type name; stable for a given source, cheap to compute.
fn type_tag<T: ?Sized>() -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in any::type_name::<T>().as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Thread-safe pool of reusable encoder buffers with bincode encode/decode
///
/// The same concrete type must be used to encode and later decode a value;
/// the envelope tag rejects mismatches with
/// [`CacheError::Deserialization`].
pub struct CodecPool {
    buffers: ArrayQueue<Vec<u8>>,
}

impl CodecPool {
    /// Create a pool retaining at most `capacity` buffers.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: ArrayQueue::new(capacity.max(1)),
        }
    }

    /// Encode `value` into a pooled buffer.
    ///
    /// The returned bytes borrow the pool; dropping them returns the buffer.
    pub fn encode<'a, T>(&'a self, value: &T) -> Result<EncodedBytes<'a>, CacheError>
    where
        T: Serialize,
    {
        let mut buf = self.buffers.pop().unwrap_or_else(|| Vec::with_capacity(256));
        buf.clear();
        buf.push(ENVELOPE_VERSION);
        buf.extend_from_slice(&type_tag::<T>().to_le_bytes());

        if let Err(err) =
            bincode::serde::encode_into_std_write(value, &mut buf, bincode::config::standard())
        {
            self.release(buf);
            return Err(CacheError::serialization(err.to_string()));
        }

        Ok(EncodedBytes { pool: self, buf })
    }

    /// Decode bytes previously produced by [`CodecPool::encode`].
    pub fn decode<T>(&self, bytes: &[u8]) -> Result<T, CacheError>
    where
        T: DeserializeOwned,
    {
        if bytes.len() < ENVELOPE_HEADER_LEN {
            return Err(CacheError::deserialization("truncated envelope"));
        }
        if bytes[0] != ENVELOPE_VERSION {
            return Err(CacheError::deserialization(format!(
                "unsupported envelope version {}",
                bytes[0]
            )));
        }

        let mut tag_bytes = [0u8; 8];
        tag_bytes.copy_from_slice(&bytes[1..ENVELOPE_HEADER_LEN]);
        if u64::from_le_bytes(tag_bytes) != type_tag::<T>() {
            return Err(CacheError::deserialization(format!(
                "type tag mismatch decoding {}",
                any::type_name::<T>()
            )));
        }

        let payload = &bytes[ENVELOPE_HEADER_LEN..];
        let (value, read) =
            bincode::serde::decode_from_slice(payload, bincode::config::standard())
                .map_err(|err| CacheError::deserialization(err.to_string()))?;
        if read != payload.len() {
            return Err(CacheError::deserialization(
                "trailing bytes after encoded payload",
            ));
        }
        Ok(value)
    }

    /// Number of buffers currently retained.
    pub fn pooled(&self) -> usize {
        self.buffers.len()
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() <= MAX_RETAINED_CAPACITY {
            buf.clear();
            // A full pool rejects the push and the buffer is simply dropped.
            let _ = self.buffers.push(buf);
        }
    }
}

impl std::fmt::Debug for CodecPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecPool")
            .field("pooled", &self.buffers.len())
            .field("capacity", &self.buffers.capacity())
            .finish()
    }
}

/// Encoded bytes backed by a pooled buffer, returned to the pool on drop
pub struct EncodedBytes<'a> {
    pool: &'a CodecPool,
    buf: Vec<u8>,
}

impl Deref for EncodedBytes<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl AsRef<[u8]> for EncodedBytes<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl Drop for EncodedBytes<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        id: u64,
        name: String,
        tags: Vec<String>,
    }

    #[test]
    fn round_trips_scalars_and_collections() {
        let pool = CodecPool::new(4);

        let encoded = pool.encode(&42u64).unwrap();
        assert_eq!(pool.decode::<u64>(&encoded).unwrap(), 42);
        drop(encoded);

        let encoded = pool.encode(&"hello".to_string()).unwrap();
        assert_eq!(pool.decode::<String>(&encoded).unwrap(), "hello");
        drop(encoded);

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 1u32);
        map.insert("b".to_string(), 2u32);
        let encoded = pool.encode(&map).unwrap();
        assert_eq!(pool.decode::<BTreeMap<String, u32>>(&encoded).unwrap(), map);
    }

    #[test]
    fn round_trips_user_records() {
        let pool = CodecPool::new(4);
        let record = Record {
            id: 7,
            name: "seven".to_string(),
            tags: vec!["x".to_string(), "y".to_string()],
        };

        let encoded = pool.encode(&record).unwrap();
        assert_eq!(pool.decode::<Record>(&encoded).unwrap(), record);
    }

    #[test]
    fn rejects_wrong_target_type() {
        let pool = CodecPool::new(4);
        let encoded = pool.encode(&"text".to_string()).unwrap();

        let err = pool.decode::<u64>(&encoded).unwrap_err();
        assert!(matches!(err, CacheError::Deserialization(_)));
    }

    #[test]
    fn rejects_corrupt_envelope() {
        let pool = CodecPool::new(4);

        let err = pool.decode::<u64>(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, CacheError::Deserialization(_)));

        let encoded = pool.encode(&5u8).unwrap();
        let mut bytes = encoded.to_vec();
        bytes[0] = 99;
        let err = pool.decode::<u8>(&bytes).unwrap_err();
        assert!(matches!(err, CacheError::Deserialization(_)));
    }

    #[test]
    fn buffers_return_to_pool_and_overflow_is_discarded() {
        let pool = CodecPool::new(1);
        assert_eq!(pool.pooled(), 0);

        let first = pool.encode(&1u32).unwrap();
        let second = pool.encode(&2u32).unwrap();
        drop(first);
        drop(second);

        // Capacity one: the second release is discarded.
        assert_eq!(pool.pooled(), 1);
    }
}
