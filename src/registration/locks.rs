//! Per-tournament mutual exclusion.
//!
//! Capacity decisions for one tournament must be serialized; unrelated
//! tournaments must not contend. The map hands out one lock handle per
//! tournament id, and the `Mutex` guards the tournament's ledger itself,
//! so holding the guard IS the exclusive section. Gateway I/O must never
//! happen while a guard is held.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::roster::RosterLedger;

pub type LedgerHandle = Arc<Mutex<RosterLedger>>;

#[derive(Default)]
pub struct RosterLocks {
    ledgers: RwLock<HashMap<String, LedgerHandle>>,
}

impl RosterLocks {
    pub fn new() -> Self {
        Self {
            ledgers: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, tournament_id: &str) -> Option<LedgerHandle> {
        self.ledgers.read().await.get(tournament_id).cloned()
    }

    /// Insert a freshly-built ledger unless another task won the race; in
    /// either case the returned handle is the one the whole process uses
    /// for this tournament from now on.
    pub async fn insert_if_absent(&self, tournament_id: &str, ledger: RosterLedger) -> LedgerHandle {
        let mut map = self.ledgers.write().await;
        map.entry(tournament_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ledger)))
            .clone()
    }

    /// Drop handles for tournaments that no longer take registrations.
    /// Returns how many entries were removed.
    pub async fn remove_stale(&self, stale: &[String]) -> usize {
        let mut map = self.ledgers.write().await;
        let before = map.len();
        for id in stale {
            map.remove(id);
        }
        before - map.len()
    }

    pub async fn len(&self) -> usize {
        self.ledgers.read().await.len()
    }
}
