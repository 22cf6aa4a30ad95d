//! Shard Router Module
//!
//! Maps keys to their home partition with 64-bit FNV-1a.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a hash of `key`.
#[inline]
pub fn hash(key: &[u8]) -> u64 {
    key.iter().fold(FNV_OFFSET_BASIS, |h, &b| {
        (h ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

// == Shard Router ==
/// Resolves a key to a partition index.
///
/// The shard count is a power of two, so the reduction is a bit mask.
#[derive(Debug, Clone, Copy)]
pub struct ShardRouter {
    mask: u64,
}

impl ShardRouter {
    /// Creates a router over `shard_count` partitions, rounded up to the
    /// next power of two (minimum 1).
    pub fn new(shard_count: usize) -> Self {
        let shards = shard_count.max(1).next_power_of_two();
        Self {
            mask: shards as u64 - 1,
        }
    }

    /// Index of the partition that owns `key`.
    #[inline]
    pub fn shard_index(&self, key: &[u8]) -> usize {
        (hash(key) & self.mask) as usize
    }

    pub fn shard_count(&self) -> usize {
        (self.mask + 1) as usize
    }
}
