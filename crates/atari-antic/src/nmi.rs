//! DLI/VBI interrupt controller.
//!
//! NMIEN is sampled twice around the latch point. An enable visible to the
//! early sample (clock 7) asserts NMI with the latch at clock 8; an enable
//! that only the late sample (clock 8) sees asserts one clock later. Status
//! bits are set in NMIST whether or not the interrupt is enabled.

use serde::{Deserialize, Serialize};

use crate::registers::{NMI_DLI, NMI_RESET_KEY, NMI_VBI, NMIST_IDLE};

/// What the latch clock decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NmiLatch {
    /// Assert NMI now.
    pub assert_now: bool,
    /// Bits that will assert at the late clock instead.
    pub deferred: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NmiController {
    early_enable: u8,
    /// Requested but not asserted with the latch.
    deferred: u8,
    /// Bits latched by the most recent latch, and when.
    latched: u8,
    latch_timestamp: u32,
}

impl NmiController {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            early_enable: 0,
            deferred: 0,
            latched: 0,
            latch_timestamp: u32::MAX,
        }
    }

    pub fn sample_early(&mut self, nmien: u8) {
        self.early_enable = nmien & (NMI_DLI | NMI_VBI);
    }

    /// Latch `requests` (DLI and/or VBI) into NMIST. `nmien` is the late sample.
    pub fn latch(&mut self, requests: u8, nmien: u8, nmist: &mut u8, timestamp: u32) -> NmiLatch {
        let requests = requests & (NMI_DLI | NMI_VBI);
        if requests == 0 {
            self.deferred = 0;
            return NmiLatch::default();
        }

        *nmist |= requests;
        self.latched = requests;
        self.latch_timestamp = timestamp;

        let early = requests & self.early_enable;
        self.deferred = requests & !self.early_enable & nmien;

        NmiLatch {
            assert_now: early != 0,
            deferred: self.deferred,
        }
    }

    /// Late assert clock: true if a deferred request is still enabled.
    pub fn take_deferred(&mut self) -> bool {
        let fire = self.deferred != 0;
        self.deferred = 0;
        fire
    }

    /// NMIRES. Bits latched on this very clock survive the reset.
    pub fn reset_status(&self, nmist: &mut u8, timestamp: u32) {
        *nmist = NMIST_IDLE;
        if timestamp == self.latch_timestamp {
            *nmist |= self.latched;
        }
    }

    /// RESET key (or any external source) raises NMI directly.
    pub fn external(nmist: &mut u8) {
        *nmist |= NMI_RESET_KEY;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for NmiController {
    fn default() -> Self {
        Self::new()
    }
}
