use crate::models::hit_result::HitResult;
use crate::wal::wal::{Wal, WalOperation};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Per-user history of area checks
///
/// Each user's entries live in a single map slot. Appending to and
/// clearing one user's history are journaled while that slot is locked,
/// so the WAL sees them in the same order the ledger applied them.
pub struct ResultLedger {
    entries: DashMap<u64, Vec<HitResult>>,
    next_id: AtomicU64,
    wal: Arc<Wal>,
}

impl ResultLedger {
    pub fn new(wal: Arc<Wal>) -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
            wal,
        }
    }

    /// Append a new check result stamped with `ts`
    pub fn record(&self, user_id: u64, x: f64, y: f64, r: i32, hit: bool, ts: i64) -> HitResult {
        let mut entries = self.entries.entry(user_id).or_default();

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let result = HitResult::new(id, user_id, x, y, r, hit, ts);

        self.journal(WalOperation::RecordResult {
            id,
            user_id,
            x,
            y,
            r,
            hit,
            ts,
        });
        entries.push(result.clone());

        result
    }

    /// Drop every result of a user, returning how many were removed
    pub fn clear_for_user(&self, user_id: u64) -> usize {
        match self.entries.entry(user_id) {
            Entry::Occupied(slot) => {
                self.journal(WalOperation::ClearResults { user_id });
                slot.remove().len()
            }
            Entry::Vacant(_slot) => {
                self.journal(WalOperation::ClearResults { user_id });
                0
            }
        }
    }

    /// Put back a result read from persistent storage
    pub fn restore(&self, result: HitResult) {
        self.next_id.fetch_max(result.id + 1, Ordering::Relaxed);
        self.entries.entry(result.user_id).or_default().push(result);
    }

    /// Replay a journaled clear
    pub fn restore_clear(&self, user_id: u64) {
        self.entries.remove(&user_id);
    }

    /// All results of a user, most recent first
    pub fn list_for_user(&self, user_id: u64) -> Vec<HitResult> {
        let mut results = match self.entries.get(&user_id) {
            Some(entries) => entries.value().clone(),
            None => return Vec::new(),
        };

        results.sort_by(|a, b| b.ts.cmp(&a.ts).then(b.id.cmp(&a.id)));
        results
    }

    /// Every stored result in ID order
    pub fn snapshot(&self) -> Vec<HitResult> {
        let mut results: Vec<HitResult> = self
            .entries
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect();

        results.sort_by_key(|result| result.id);
        results
    }

    /// Total number of stored results across all users
    pub fn total_results(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    fn journal(&self, op: WalOperation) {
        if let Err(e) = self.wal.log_operation(op) {
            warn!(error = %e, "Failed to log result change to WAL");
        }
    }
}
