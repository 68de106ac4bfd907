//! Per-identity transaction sequence allocation.

use std::sync::Mutex;

/// Hands out strictly increasing sequence numbers for one signing identity.
///
/// Seeded once from the account's on-chain sequence at client construction.
/// Each allocation is consumed by exactly one signed transaction; numbers are
/// never reused or decremented. The allocator cannot detect divergence caused
/// by the same identity signing outside this process — keep one allocator per
/// signing identity per process, or the chain will reject stale sequences.
#[derive(Debug)]
pub struct SequenceAllocator {
    next: Mutex<u64>,
}

impl SequenceAllocator {
    /// Creates an allocator that will hand out `start` first.
    pub fn new(start: u64) -> Self {
        Self { next: Mutex::new(start) }
    }

    /// Reserves the next sequence number.
    ///
    /// Never blocks on I/O, only on the short critical section. For N
    /// concurrent callers the returned values are a gapless, duplicate-free
    /// range; the order in which callers observe them is unspecified.
    pub fn allocate(&self) -> u64 {
        let mut next = self.next.lock().expect("sequence lock poisoned");
        let current = *next;
        *next += 1;
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use tokio::task::JoinSet;

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_allocations_are_gapless() {
        let allocator = Arc::new(SequenceAllocator::new(7));

        let mut tasks = JoinSet::new();
        for _ in 0..3 {
            let allocator = allocator.clone();
            tasks.spawn(async move { allocator.allocate() });
        }

        let mut seen = BTreeSet::new();
        while let Some(sequence) = tasks.join_next().await {
            assert!(seen.insert(sequence.unwrap()), "duplicate sequence");
        }
        assert_eq!(seen, BTreeSet::from([7, 8, 9]));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn many_concurrent_allocations() {
        let allocator = Arc::new(SequenceAllocator::new(0));

        let mut tasks = JoinSet::new();
        for _ in 0..64 {
            let allocator = allocator.clone();
            tasks.spawn(async move { allocator.allocate() });
        }

        let mut seen = BTreeSet::new();
        while let Some(sequence) = tasks.join_next().await {
            seen.insert(sequence.unwrap());
        }
        assert_eq!(seen, (0..64).collect::<BTreeSet<u64>>());
    }
}
