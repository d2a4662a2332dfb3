//! WSYNC halt controller.
//!
//! A write to WSYNC pulls RDY low on the next clock and holds it until
//! clock 105. RDY cannot stop a write cycle, so when the CPU's next cycle is
//! a write the assert slips a clock at a time. A request that is still
//! pending when 105 passes is held to the next scanline's 105.

use serde::{Deserialize, Serialize};

use crate::scheduler::EventId;
use crate::timing::WSYNC_RELEASE_CYCLE;

/// Delay from the WSYNC write to the first halted clock.
pub const WSYNC_ASSERT_DELAY: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WsyncState {
    #[default]
    Idle,
    /// Written; waiting for a clock where RDY can be asserted.
    PendingFirstCycle,
    HaltAsserted,
    Released,
}

/// Result of a WSYNC register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsyncRequest {
    /// Schedule the assert timer.
    Schedule,
    /// Already pending or halted; nothing to do now.
    Ignored,
    /// Written on the last clock before release while a halt is active:
    /// re-assert right after the release.
    Rearm,
}

/// Result of the assert timer firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsyncAssert {
    /// CPU is mid-write; try again next clock.
    Retry,
    Asserted,
    /// Stale timer (reset or already asserted).
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WsyncController {
    state: WsyncState,
    rearm: bool,
    #[serde(skip)]
    timer: Option<EventId>,
}

impl WsyncController {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: WsyncState::Idle,
            rearm: false,
            timer: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> WsyncState {
        self.state
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        matches!(self.state, WsyncState::HaltAsserted)
    }

    #[must_use]
    pub const fn timer(&self) -> Option<EventId> {
        self.timer
    }

    pub fn set_timer(&mut self, id: Option<EventId>) {
        self.timer = id;
    }

    /// CPU wrote WSYNC at `clock`.
    pub fn request(&mut self, clock: u32) -> WsyncRequest {
        match self.state {
            WsyncState::Idle | WsyncState::Released => {
                self.state = WsyncState::PendingFirstCycle;
                WsyncRequest::Schedule
            }
            WsyncState::HaltAsserted if clock + 1 == WSYNC_RELEASE_CYCLE => {
                self.rearm = true;
                WsyncRequest::Rearm
            }
            WsyncState::PendingFirstCycle | WsyncState::HaltAsserted => WsyncRequest::Ignored,
        }
    }

    /// Assert timer fired.
    pub fn on_assert(&mut self, next_cycle_is_write: bool) -> WsyncAssert {
        self.timer = None;
        if self.state != WsyncState::PendingFirstCycle {
            return WsyncAssert::Ignored;
        }
        if next_cycle_is_write {
            return WsyncAssert::Retry;
        }
        self.state = WsyncState::HaltAsserted;
        WsyncAssert::Asserted
    }

    /// Release clock. Returns true when a re-armed request needs its assert
    /// timer scheduled.
    pub fn release(&mut self) -> bool {
        if self.state != WsyncState::HaltAsserted {
            return false;
        }
        if self.rearm {
            self.rearm = false;
            self.state = WsyncState::PendingFirstCycle;
            return true;
        }
        self.state = WsyncState::Released;
        false
    }

    /// Timer needed to resume this state after a reload.
    #[must_use]
    pub const fn needs_timer(&self) -> bool {
        matches!(self.state, WsyncState::PendingFirstCycle)
    }

    /// Forget everything. The caller cancels any outstanding timer first.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
