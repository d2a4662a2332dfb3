//! Deferred register writes.
//!
//! Some writes only reach the hardware a few clocks later: CHBASE and CHACTL
//! are picked up by the glyph fetch and decode logic after a short pipeline.
//! Writes to them are queued by absolute scheduler tick and applied by a
//! single re-armable timer.

use serde::{Deserialize, Serialize};

use crate::scheduler::EventId;

/// Clocks between a CHBASE write and glyph fetches using it.
pub const CHBASE_WRITE_DELAY: u32 = 2;
/// Clocks between a CHACTL write and the decoder seeing it.
pub const CHACTL_WRITE_DELAY: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeferredRegister {
    Chbase,
    Chactl,
}

impl DeferredRegister {
    #[must_use]
    pub const fn delay(self) -> u32 {
        match self {
            DeferredRegister::Chbase => CHBASE_WRITE_DELAY,
            DeferredRegister::Chactl => CHACTL_WRITE_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredWrite {
    /// Scheduler tick the write takes effect on.
    pub target: u64,
    pub register: DeferredRegister,
    pub value: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredQueue {
    entries: Vec<DeferredWrite>,
    head: usize,
    #[serde(skip)]
    timer: Option<EventId>,
}

impl DeferredQueue {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            head: 0,
            timer: None,
        }
    }

    /// Queue a write. Returns true if it became the new head, in which case
    /// the timer must be re-armed.
    pub fn push(&mut self, write: DeferredWrite) -> bool {
        // Writes arrive almost in order: walk back from the tail.
        let mut pos = self.entries.len();
        while pos > self.head && self.entries[pos - 1].target > write.target {
            pos -= 1;
        }
        self.entries.insert(pos, write);
        pos == self.head
    }

    /// Next write due at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<DeferredWrite> {
        let write = *self.entries.get(self.head)?;
        if write.target > now {
            return None;
        }
        self.head += 1;
        if self.head * 2 > self.entries.len() {
            self.compact();
        }
        Some(write)
    }

    /// Target tick of the head entry.
    #[must_use]
    pub fn next_target(&self) -> Option<u64> {
        self.entries.get(self.head).map(|w| w.target)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len() - self.head
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop consumed entries.
    pub fn compact(&mut self) {
        self.entries.drain(..self.head);
        self.head = 0;
    }

    #[must_use]
    pub const fn timer(&self) -> Option<EventId> {
        self.timer
    }

    pub fn set_timer(&mut self, id: Option<EventId>) {
        self.timer = id;
    }

    /// Forget pending writes. The caller cancels the timer first.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.head = 0;
        self.timer = None;
    }

    /// Move targets saved against `saved_tick` onto a scheduler now at `now`.
    pub fn rebase(&mut self, saved_tick: u64, now: u64) {
        for write in &mut self.entries[self.head..] {
            write.target = now + write.target.saturating_sub(saved_tick);
        }
    }

    /// Repair a queue read back from a save state.
    pub fn normalize(&mut self) -> bool {
        let mut repaired = false;
        if self.head > self.entries.len() {
            self.head = self.entries.len();
            repaired = true;
        }
        self.compact();
        if !self.entries.is_sorted_by_key(|w| w.target) {
            self.entries.sort_by_key(|w| w.target);
            repaired = true;
        }
        repaired
    }
}
