// SPDX-License-Identifier: MIT OR Apache-2.0
//! Admission control: a counted slot set bounding concurrent queries,
//! backed by a semaphore permit held as an RAII guard.

use std::sync::Arc;

use memory_error::{MemoryError, MemoryResult};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of queries concurrently executing stages 3-8.
#[derive(Clone)]
pub struct Admission {
    semaphore: Arc<Semaphore>,
}

impl Admission {
    /// Create an admission gate with `max_concurrent` slots.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Reserve a slot, failing immediately (never waiting) if none are
    /// free.
    ///
    /// # Errors
    ///
    /// Fails with `Validation` ("Maximum concurrent queries exceeded")
    /// when every slot is in use.
    pub fn try_reserve(&self) -> MemoryResult<QuerySlot> {
        let permit = Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .map_err(|_| MemoryError::validation("Maximum concurrent queries exceeded"))?;
        Ok(QuerySlot { permit })
    }
}

/// An RAII admission slot. Releases on drop, covering every exit path —
/// success, error, timeout, or cancellation.
pub struct QuerySlot {
    #[allow(dead_code)]
    permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_succeeds_up_to_the_limit() {
        let admission = Admission::new(2);
        let _a = admission.try_reserve().unwrap();
        let _b = admission.try_reserve().unwrap();
        let err = admission.try_reserve().unwrap_err();
        assert_eq!(err.kind, memory_error::MemoryErrorKind::Validation);
        assert!(err.message.contains("Maximum concurrent queries"));
    }

    #[test]
    fn releasing_a_slot_frees_capacity_for_the_next_reservation() {
        let admission = Admission::new(1);
        {
            let _slot = admission.try_reserve().unwrap();
            assert!(admission.try_reserve().is_err());
        }
        assert!(admission.try_reserve().is_ok());
    }
}
