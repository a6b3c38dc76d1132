// Bucket index of a request
//
// The request factory emits every `RequestCreated` event with an indexed
// bucket computed from the window start. Watchers filter on that value, so
// this computation must stay identical to the factory one.

use std::fmt::{self, Display, Formatter};

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TemporalUnit;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BucketError {
    #[error("Window start {} is too large to be bucketed", _0)]
    WindowStartTooLarge(U256),
}

/// Coarse grouping key derived from a window start
/// Block buckets are negative and timestamp buckets positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bucket(i128);

impl Bucket {
    /// `sign * (windowStart - windowStart % bucketSize)`
    pub fn for_window(window_start: U256, unit: TemporalUnit) -> Result<Self, BucketError> {
        if window_start > U256::from(i128::MAX as u128) {
            return Err(BucketError::WindowStartTooLarge(window_start));
        }

        let size = U256::from(unit.bucket_size());
        let floored = window_start - (window_start % size);

        Ok(Self(unit.bucket_sign() * floored.as_u128() as i128))
    }

    pub fn from_id(id: i128) -> Self {
        Self(id)
    }

    pub fn id(&self) -> i128 {
        self.0
    }

    /// Unit of the requests grouped in this bucket
    /// Zero is shared by both units for window starts below a bucket size.
    pub fn temporal_unit(&self) -> Option<TemporalUnit> {
        match self.0 {
            id if id < 0 => Some(TemporalUnit::Block),
            id if id > 0 => Some(TemporalUnit::Time),
            _ => None,
        }
    }
}

impl Display for Bucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_bucket() {
        let bucket = Bucket::for_window(U256::from(7_000_123u64), TemporalUnit::Block).unwrap();
        // 7000123 % 240 = 43
        assert_eq!(bucket.id(), -7_000_080);
        assert_eq!(bucket.temporal_unit(), Some(TemporalUnit::Block));
    }

    #[test]
    fn test_timestamp_bucket() {
        let bucket =
            Bucket::for_window(U256::from(1_700_001_234u64), TemporalUnit::Time).unwrap();
        // 1700001234 % 3600 = 2034
        assert_eq!(bucket.id(), 1_699_999_200);
        assert_eq!(bucket.temporal_unit(), Some(TemporalUnit::Time));
    }

    #[test]
    fn test_bucket_is_stable_across_the_bucket() {
        let first = Bucket::for_window(U256::from(1_699_999_200u64), TemporalUnit::Time).unwrap();
        let last = Bucket::for_window(U256::from(1_700_002_799u64), TemporalUnit::Time).unwrap();
        assert_eq!(first, last);

        let next = Bucket::for_window(U256::from(1_700_002_800u64), TemporalUnit::Time).unwrap();
        assert_ne!(first, next);
    }

    #[test]
    fn test_units_do_not_collide() {
        for window_start in [240u64, 3_600, 1_000_000, 1_700_000_000] {
            let block = Bucket::for_window(U256::from(window_start), TemporalUnit::Block).unwrap();
            let time = Bucket::for_window(U256::from(window_start), TemporalUnit::Time).unwrap();
            assert_ne!(block, time);
        }
    }

    #[test]
    fn test_window_start_too_large() {
        let err = Bucket::for_window(U256::MAX, TemporalUnit::Time).unwrap_err();
        assert_eq!(err, BucketError::WindowStartTooLarge(U256::MAX));
    }
}
