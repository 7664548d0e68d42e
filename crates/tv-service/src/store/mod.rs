//! Verification record store.
//!
//! Process-local map of token identifier to [`VerificationRecord`]. This is
//! the only shared mutable state in the service; `upsert` performs the whole
//! read-modify-write under one lock acquisition so that concurrent
//! presentations of the same identifier converge on a single terminal
//! decision and never lose attempt counts.
//!
//! Being process-local is a deployment choice: a single service instance
//! satisfies the replay-tracking contract on its own. Running multiple
//! instances requires replacing this module with a shared store.

use crate::models::VerificationRecord;
use chrono::Utc;
use common::types::DecisionKind;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// In-memory verification store with optional record retention.
pub struct VerificationStore {
    ttl: Option<Duration>,
    records: RwLock<HashMap<String, VerificationRecord>>,
}

impl VerificationStore {
    /// Create a store. Records older than `ttl` (measured from the last
    /// presentation) are removed by [`prune_expired`](Self::prune_expired);
    /// `None` retains records for the process lifetime.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Read-only lookup of the record for a token identifier.
    pub fn lookup(&self, token_id: &str) -> Option<VerificationRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token_id)
            .cloned()
    }

    /// Commit a decision for a token identifier.
    ///
    /// Inserts a new record (`attempts = 1`) on first sight. If a record
    /// already exists — including one committed by a racing caller between
    /// this caller's lookup and its authority check — the attempt counter is
    /// incremented and the first committed decision is kept; the submitted
    /// decision is discarded. The returned record is the committed state.
    ///
    /// Callers only submit terminal decisions; malformed tokens fail before
    /// any store access.
    pub fn upsert(&self, token_id: &str, decision: DecisionKind) -> VerificationRecord {
        let now = Utc::now();
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);

        let record = records
            .entry(token_id.to_string())
            .and_modify(|existing| {
                existing.attempts += 1;
                existing.last_seen_at = now;
            })
            .or_insert_with(|| VerificationRecord {
                token_id: token_id.to_string(),
                decision,
                first_verified_at: now,
                last_seen_at: now,
                attempts: 1,
            });

        record.clone()
    }

    /// Remove records whose last presentation is older than the retention
    /// window. Returns the number of records removed; a store without a TTL
    /// never removes anything.
    pub fn prune_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };

        let now = Utc::now();
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let before = records.len();
        records.retain(|_, record| {
            (now - record.last_seen_at)
                .to_std()
                .map_or(true, |age| age < ttl)
        });
        before - records.len()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_lookup_absent_returns_none() {
        let store = VerificationStore::new(None);
        assert!(store.lookup("abc123").is_none());
    }

    #[test]
    fn test_upsert_first_sight_creates_record() {
        let store = VerificationStore::new(None);

        let record = store.upsert("abc123", DecisionKind::Valid);

        assert_eq!(record.token_id, "abc123");
        assert_eq!(record.decision, DecisionKind::Valid);
        assert_eq!(record.attempts, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_increments_attempts() {
        let store = VerificationStore::new(None);

        store.upsert("abc123", DecisionKind::Valid);
        let record = store.upsert("abc123", DecisionKind::Valid);

        assert_eq!(record.attempts, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_keeps_first_committed_decision() {
        let store = VerificationStore::new(None);

        store.upsert("abc123", DecisionKind::Valid);
        let record = store.upsert("abc123", DecisionKind::Invalid);

        // A re-presented token never flips its terminal decision.
        assert_eq!(record.decision, DecisionKind::Valid);
        assert_eq!(record.attempts, 2);
    }

    #[test]
    fn test_upsert_first_verified_at_is_stable() {
        let store = VerificationStore::new(None);

        let first = store.upsert("abc123", DecisionKind::Expired);
        let second = store.upsert("abc123", DecisionKind::Expired);

        assert_eq!(second.first_verified_at, first.first_verified_at);
        assert!(second.last_seen_at >= first.last_seen_at);
    }

    #[test]
    fn test_distinct_identifiers_get_distinct_records() {
        let store = VerificationStore::new(None);

        store.upsert("abc123", DecisionKind::Valid);
        store.upsert("def456", DecisionKind::Invalid);

        assert_eq!(store.len(), 2);
        assert_eq!(
            store.lookup("abc123").unwrap().decision,
            DecisionKind::Valid
        );
        assert_eq!(
            store.lookup("def456").unwrap().decision,
            DecisionKind::Invalid
        );
    }

    #[test]
    fn test_prune_without_ttl_keeps_everything() {
        let store = VerificationStore::new(None);
        store.upsert("abc123", DecisionKind::Valid);

        assert_eq!(store.prune_expired(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_prune_with_zero_ttl_removes_all() {
        let store = VerificationStore::new(Some(Duration::from_secs(0)));
        store.upsert("abc123", DecisionKind::Valid);
        store.upsert("def456", DecisionKind::Invalid);

        assert_eq!(store.prune_expired(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_prune_with_long_ttl_keeps_fresh_records() {
        let store = VerificationStore::new(Some(Duration::from_secs(3600)));
        store.upsert("abc123", DecisionKind::Valid);

        assert_eq!(store.prune_expired(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_upserts_converge_on_one_record() {
        let store = Arc::new(VerificationStore::new(None));
        let threads = 8;
        let per_thread = 25;

        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    // Half the threads race to commit a conflicting decision.
                    let decision = if i % 2 == 0 {
                        DecisionKind::Valid
                    } else {
                        DecisionKind::Invalid
                    };
                    for _ in 0..per_thread {
                        store.upsert("abc123", decision);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let record = store.lookup("abc123").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(record.attempts, (threads * per_thread) as u64);
        // Whichever decision committed first is the one that stuck; the
        // record never holds a mixture.
        assert!(matches!(
            record.decision,
            DecisionKind::Valid | DecisionKind::Invalid
        ));
    }
}
