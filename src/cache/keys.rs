//! Cache key generation

use std::fmt;

use crate::models::BlockQuery;

/// A structured cache key that can be converted to a string.
///
/// Keys are typed per operation, so the timestamp key for block `100` and a
/// hypothetical range key rendering as `"100"` can never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Key for the current max block number
    MaxBlockNumber,
    /// Key for a block range query
    BlockRange { start_block: i64, end_block: i64 },
    /// Key for the timestamp of a single block
    Timestamp(u64),
}

impl CacheKey {
    pub fn block_range(start_block: i64, end_block: i64) -> Self {
        Self::BlockRange { start_block, end_block }
    }

    pub fn timestamp(block_number: u64) -> Self {
        Self::Timestamp(block_number)
    }
}

impl From<&BlockQuery> for CacheKey {
    fn from(query: &BlockQuery) -> Self {
        match query {
            BlockQuery::MaxBlockNumber => Self::MaxBlockNumber,
            BlockQuery::PointsByRange(range) => {
                Self::block_range(range.start_block, range.end_block)
            }
            BlockQuery::TimestampByBlock(block) => Self::timestamp(*block),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxBlockNumber => write!(f, "maxBlockNumber"),
            Self::BlockRange { start_block, end_block } => {
                write!(f, "{}_{}", start_block, end_block)
            }
            Self::Timestamp(block) => write!(f, "{}", block),
        }
    }
}
