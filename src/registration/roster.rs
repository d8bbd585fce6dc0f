//! Per-tournament roster ledger: the ordered confirmed-seat list and the
//! FIFO waitlist. This is the only place capacity decisions are made; it
//! must only be mutated while holding the tournament's lock handle (see
//! `locks`).

use chrono::{DateTime, Utc};

use crate::db::models::SeatState;

/// Outcome of a seat reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatOutcome {
    Confirmed,
    /// 1-based position in the waitlist.
    Waitlisted { position: usize },
}

#[derive(Debug, Clone)]
struct WaitlistEntry {
    registration_id: String,
    requested_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct RosterLedger {
    max_users: usize,
    /// Confirmed seats, in confirmation order.
    active: Vec<String>,
    /// FIFO by requested-at, ties broken by registration id.
    waitlist: Vec<WaitlistEntry>,
}

impl RosterLedger {
    pub fn new(max_users: usize) -> Self {
        Self {
            max_users,
            active: Vec::new(),
            waitlist: Vec::new(),
        }
    }

    /// Rebuild a ledger from persisted rows. `confirmed` must already be
    /// ordered by creation time; `waitlisted` entries are re-sorted to
    /// restore FIFO order.
    pub fn from_rows(
        max_users: usize,
        confirmed: Vec<String>,
        waitlisted: Vec<(String, DateTime<Utc>)>,
    ) -> Self {
        let mut waitlist: Vec<WaitlistEntry> = waitlisted
            .into_iter()
            .map(|(registration_id, requested_at)| WaitlistEntry {
                registration_id,
                requested_at,
            })
            .collect();
        waitlist.sort_by(|a, b| {
            a.requested_at
                .cmp(&b.requested_at)
                .then_with(|| a.registration_id.cmp(&b.registration_id))
        });

        let ledger = Self {
            max_users,
            active: confirmed,
            waitlist,
        };
        ledger.assert_invariants();
        ledger
    }

    /// Reserve a seat, falling back to the waitlist tail when the roster
    /// is at capacity. Re-reserving an id already tracked returns its
    /// current placement instead of duplicating it.
    pub fn try_reserve(
        &mut self,
        registration_id: &str,
        requested_at: DateTime<Utc>,
    ) -> SeatOutcome {
        if self.active.iter().any(|id| id == registration_id) {
            return SeatOutcome::Confirmed;
        }
        if let Some(position) = self.position_in_waitlist(registration_id) {
            return SeatOutcome::Waitlisted { position };
        }

        let outcome = if self.active.len() < self.max_users {
            self.active.push(registration_id.to_string());
            SeatOutcome::Confirmed
        } else {
            let entry = WaitlistEntry {
                registration_id: registration_id.to_string(),
                requested_at,
            };
            let at = self.waitlist.partition_point(|e| {
                (e.requested_at, e.registration_id.as_str())
                    <= (entry.requested_at, entry.registration_id.as_str())
            });
            self.waitlist.insert(at, entry);
            SeatOutcome::Waitlisted {
                position: at + 1,
            }
        };

        self.assert_invariants();
        outcome
    }

    /// Remove a registration from whichever list holds it. Idempotent.
    /// When a confirmed seat opens and the waitlist is non-empty, the
    /// head is promoted to a confirmed seat and its id returned so the
    /// caller can drive that registration forward.
    pub fn release(&mut self, registration_id: &str) -> Option<String> {
        let promoted = if let Some(idx) = self.active.iter().position(|id| id == registration_id) {
            self.active.remove(idx);
            if self.waitlist.is_empty() {
                None
            } else {
                let head = self.waitlist.remove(0);
                self.active.push(head.registration_id.clone());
                Some(head.registration_id)
            }
        } else {
            self.waitlist
                .retain(|e| e.registration_id != registration_id);
            None
        };

        self.assert_invariants();
        promoted
    }

    /// 1-based waitlist position for display; None if not waitlisted.
    pub fn position_in_waitlist(&self, registration_id: &str) -> Option<usize> {
        self.waitlist
            .iter()
            .position(|e| e.registration_id == registration_id)
            .map(|idx| idx + 1)
    }

    pub fn seat_state(&self, registration_id: &str) -> Option<SeatState> {
        if self.active.iter().any(|id| id == registration_id) {
            Some(SeatState::Confirmed)
        } else if self
            .waitlist
            .iter()
            .any(|e| e.registration_id == registration_id)
        {
            Some(SeatState::Waitlisted)
        } else {
            None
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn waitlist_len(&self) -> usize {
        self.waitlist.len()
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.active.len() <= self.max_users,
            "confirmed seats exceed capacity: {} > {}",
            self.active.len(),
            self.max_users
        );
        debug_assert!(
            !self
                .active
                .iter()
                .any(|id| self.waitlist.iter().any(|e| &e.registration_id == id)),
            "registration present in both roster and waitlist"
        );
    }
}
