//! Per-bucket write serialization.
//!
//! Two overlapping reorders of the same column would otherwise race their
//! batched upserts, and the earlier snapshot could land last. Holding the
//! lock of every bucket an operation touches from load to write makes those
//! writes strictly ordered while leaving unrelated columns concurrent.

use tokio::sync::{Mutex, MutexGuard};

use crate::status::TicketStatus;

/// One async mutex per status bucket.
#[derive(Debug)]
pub struct BucketLocks {
    locks: [Mutex<()>; TicketStatus::COUNT],
}

/// Held locks; released on drop.
#[derive(Debug)]
pub struct BucketGuard<'a> {
    _guards: Vec<MutexGuard<'a, ()>>,
}

impl BucketLocks {
    pub fn new() -> Self {
        Self {
            locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    /// Lock every listed bucket.
    ///
    /// Buckets are taken in column order regardless of the order given, so
    /// two callers can never deadlock on each other.
    pub async fn acquire(&self, buckets: &[TicketStatus]) -> BucketGuard<'_> {
        let mut ordered = buckets.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for status in &ordered {
            guards.push(self.locks[status.ordinal()].lock().await);
        }
        BucketGuard { _guards: guards }
    }
}

impl Default for BucketLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn acquire_orders_and_dedups() {
        let locks = BucketLocks::new();
        let guard = locks
            .acquire(&[TicketStatus::Done, TicketStatus::New, TicketStatus::Done])
            .await;
        let held = |status: TicketStatus| locks.locks[status.ordinal()].try_lock().is_err();
        assert!(held(TicketStatus::New));
        assert!(held(TicketStatus::Done));
        assert!(!held(TicketStatus::Accepted));

        drop(guard);
        assert!(!held(TicketStatus::Done));
    }

    #[tokio::test]
    async fn same_bucket_is_exclusive() {
        let locks = Arc::new(BucketLocks::new());
        let held = locks.acquire(&[TicketStatus::Accepted]).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.acquire(&[TicketStatus::Accepted]).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished(), "second writer must wait");

        drop(held);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender proceeds once released")
            .unwrap();
    }

    #[tokio::test]
    async fn disjoint_buckets_do_not_block() {
        let locks = BucketLocks::new();
        let _a = locks.acquire(&[TicketStatus::New]).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&[TicketStatus::Done]),
        )
        .await;
        assert!(b.is_ok());
    }
}
