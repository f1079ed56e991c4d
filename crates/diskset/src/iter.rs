//! In-order iteration with O(1) iterator state.
//!
//! The iterator remembers only the last value it yielded and re-seeks the
//! strict successor from the root on every step. Each step therefore costs
//! O(log n) node reads, the trade that keeps memory use independent of the
//! tree size — a full ancestor stack would defeat the engine's
//! memory-minimality goal.

use codec::PayloadCodec;

use crate::error::Result;
use crate::tree::DiskSet;

/// In-order iterator over a [`DiskSet`].
///
/// Yields `Result` items because every step performs file I/O. Values are
/// decoded fresh from payload bytes, so mutating a yielded value never
/// alters stored state. An I/O or decode failure is yielded once and leaves
/// the cursor where it was.
pub struct Iter<'a, C: PayloadCodec> {
    set: &'a mut DiskSet<C>,
    last: Option<C::Value>,
}

impl<'a, C: PayloadCodec> Iter<'a, C> {
    pub(crate) fn new(set: &'a mut DiskSet<C>) -> Self {
        Self { set, last: None }
    }
}

impl<C: PayloadCodec> Iterator for Iter<'_, C> {
    type Item = Result<C::Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let step = match &self.last {
            None => self.set.min_value(),
            Some(prev) => self.set.higher(prev),
        };
        match step {
            Ok(Some(value)) => {
                self.last = Some(value.clone());
                Some(Ok(value))
            }
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
