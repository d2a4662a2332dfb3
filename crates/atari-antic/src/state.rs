//! Save-state exchange.
//!
//! The snapshot is a flat, versioned field list encoded as MessagePack with
//! field names, so fields can be added without breaking older snapshots.
//! Loading validates everything that indexes a buffer or table and repairs
//! what it can. Timers are never saved; they are re-armed from the restored
//! WSYNC state and deferred queue.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::antic::Antic;
use crate::beam::BeamPosition;
use crate::deferred::DeferredQueue;
use crate::display_list::{DlHistoryEntry, DlState, ModeLine, mode_spec};
use crate::error::StateError;
use crate::host::BlankingState;
use crate::nmi::NmiController;
use crate::playfield::{DECODE_LEN, LINE_BUFFER_LEN, NO_WINDOW, PlayfieldTiming};
use crate::registers::{ChipRegisters, PlayfieldWidth};
use crate::scheduler::Scheduler;
use crate::timing::DMA_LIMIT_CYCLE;
use crate::wsync::WsyncController;

/// Current snapshot layout.
///
/// - 1: initial layout.
/// - 2: light pen latches, display list history, blanking state.
pub const STATE_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
struct AnticState {
    version: u32,
    beam: BeamPosition,
    regs: ChipRegisters,
    dl_state: DlState,
    mode_line: ModeLine,
    pf_address: u16,
    pf_fetch_offset: u16,
    operand_low: u8,
    display_row: u32,
    latched_vscroll: u8,
    dma_active_line: bool,
    phantom_sprite_dma: bool,
    bus_latch: u8,
    field_odd: bool,
    halted_cycles: u64,
    nmi: NmiController,
    wsync: WsyncController,
    deferred: DeferredQueue,
    /// Scheduler tick the deferred targets are relative to.
    saved_tick: u64,
    timing: PlayfieldTiming,
    hscroll_delay: bool,
    decode_counter: u32,
    display_counter: u32,
    data: Vec<u8>,
    chars: Vec<u8>,
    decoded: Vec<u8>,
    #[serde(default)]
    dl_history: Vec<DlHistoryEntry>,
    #[serde(default)]
    blanking: BlankingState,
}

impl Antic {
    /// Snapshot the chip.
    pub fn save_state(&self) -> Result<Vec<u8>, StateError> {
        let state = AnticState {
            version: STATE_VERSION,
            beam: self.beam,
            regs: self.regs,
            dl_state: self.dl_state,
            mode_line: self.mode_line,
            pf_address: self.pf_address,
            pf_fetch_offset: self.pf_fetch_offset,
            operand_low: self.operand_low,
            display_row: self.display_row,
            latched_vscroll: self.latched_vscroll,
            dma_active_line: self.dma_active_line,
            phantom_sprite_dma: self.phantom_sprite_dma,
            bus_latch: self.bus_latch,
            field_odd: self.field_odd,
            halted_cycles: self.halted_cycles,
            nmi: self.nmi,
            wsync: self.wsync,
            deferred: self.deferred.clone(),
            saved_tick: self.last_tick,
            timing: self.playfield.timing,
            hscroll_delay: self.playfield.hscroll_delay,
            decode_counter: self.playfield.decode_counter,
            display_counter: self.playfield.display_counter,
            data: self.playfield.data.to_vec(),
            chars: self.playfield.chars.to_vec(),
            decoded: self.playfield.decoded.to_vec(),
            dl_history: self.dl_history.clone(),
            blanking: self.blanking,
        };
        Ok(rmp_serde::to_vec_named(&state)?)
    }

    /// Restore a snapshot taken by [`Antic::save_state`]. Outstanding timers
    /// are cancelled and re-armed against `scheduler`.
    pub fn load_state(
        &mut self,
        bytes: &[u8],
        scheduler: &mut impl Scheduler,
    ) -> Result<(), StateError> {
        let mut state: AnticState = rmp_serde::from_slice(bytes)?;
        if state.version > STATE_VERSION {
            return Err(StateError::UnsupportedVersion {
                found: state.version,
                supported: STATE_VERSION,
            });
        }
        debug!(
            "loading ANTIC state v{} at frame {} scanline {} clock {}",
            state.version, state.beam.frame, state.beam.scanline, state.beam.clock
        );

        repair(&mut state);
        self.cancel_timers(scheduler);

        self.beam = state.beam;
        self.regs = state.regs;
        self.dl_state = state.dl_state;
        self.mode_line = state.mode_line;
        self.pf_address = state.pf_address;
        self.pf_fetch_offset = state.pf_fetch_offset;
        self.operand_low = state.operand_low;
        self.display_row = state.display_row;
        self.latched_vscroll = state.latched_vscroll;
        self.dma_active_line = state.dma_active_line;
        self.phantom_sprite_dma = state.phantom_sprite_dma;
        self.bus_latch = state.bus_latch;
        self.field_odd = state.field_odd;
        self.halted_cycles = state.halted_cycles;
        self.nmi = state.nmi;
        self.wsync = state.wsync;
        self.deferred = state.deferred;
        self.blanking = state.blanking;
        self.last_tick = scheduler.current_tick();

        self.playfield.timing = state.timing;
        self.playfield.hscroll_delay = state.hscroll_delay;
        self.playfield.decode_counter = state.decode_counter;
        self.playfield.display_counter = state.display_counter;
        self.playfield.data.copy_from_slice(&state.data);
        self.playfield.chars.copy_from_slice(&state.chars);
        self.playfield.decoded.copy_from_slice(&state.decoded);

        self.dl_history = state.dl_history;

        // Derived values.
        self.update_char_row();
        self.pattern.invalidate();
        let key = self.pattern_key();
        self.pattern.update(key);

        // Timers.
        self.deferred.rebase(state.saved_tick, scheduler.current_tick());
        if !self.deferred.is_empty() {
            self.arm_deferred_timer(scheduler);
        }
        if self.wsync.needs_timer() {
            self.schedule_wsync(scheduler);
        }

        Ok(())
    }
}

/// Bring a decoded snapshot back within the ranges the stepper indexes by.
fn repair(state: &mut AnticState) {
    if state.beam.clamp() {
        warn!("ANTIC state: beam position out of range, clamped");
    }

    if state.regs.hscrol > 15 || state.regs.vscrol > 15 || state.latched_vscroll > 15 {
        warn!("ANTIC state: scroll registers out of range, masked");
        state.regs.hscrol &= 15;
        state.regs.vscrol &= 15;
        state.latched_vscroll &= 15;
    }

    let line = &mut state.mode_line;
    if line.row_counter > 15 || line.row_count == 0 || line.row_count > 16 || state.display_row > 15 {
        warn!("ANTIC state: row counters out of range, repaired");
        line.row_counter &= 15;
        line.row_count = line.row_count.clamp(1, 16);
        state.display_row &= 15;
    }
    let spec = mode_spec(line.mode());
    if line.mode() >= 2 && line.stride != spec.stride {
        warn!("ANTIC state: mode line stride inconsistent with mode, recomputed");
        line.stride = spec.stride;
        line.width_shift = spec.width_shift;
        line.push = spec.push;
        line.hires = spec.hires;
    }

    for (name, buf, len) in [
        ("data", &mut state.data, LINE_BUFFER_LEN),
        ("char", &mut state.chars, LINE_BUFFER_LEN),
        ("decode", &mut state.decoded, DECODE_LEN),
    ] {
        if buf.len() != len {
            warn!(
                "ANTIC state: {name} buffer has {} bytes, expected {len}",
                buf.len()
            );
            buf.resize(len, 0);
        }
    }

    let limit = state.beam.scanline_limit() as usize;
    if state.dl_history.len() != limit {
        if !state.dl_history.is_empty() {
            warn!(
                "ANTIC state: display list history has {} entries, expected {limit}",
                state.dl_history.len()
            );
        }
        state.dl_history.resize(limit, DlHistoryEntry::default());
    }

    if !timing_in_range(&state.timing) {
        warn!("ANTIC state: playfield timing out of range, line disabled");
        state.timing = PlayfieldTiming::for_line(PlayfieldWidth::Disabled, false, 0, 0);
    }
    let timing = state.timing;
    if state.decode_counter > NO_WINDOW || state.decode_counter < timing.dma_start.min(NO_WINDOW) {
        warn!("ANTIC state: decode cursor out of range, reset");
        state.decode_counter = timing.dma_start;
    }
    if state.display_counter > NO_WINDOW || state.display_counter < timing.display_start {
        warn!("ANTIC state: display cursor out of range, reset");
        state.display_counter = timing.display_start;
    }

    if state.deferred.normalize() {
        warn!("ANTIC state: deferred register queue out of order, sorted");
    }
}

fn timing_in_range(t: &PlayfieldTiming) -> bool {
    let dma_ok = if t.dma_start == NO_WINDOW {
        true
    } else {
        t.dma_start < t.dma_end && t.dma_end <= DMA_LIMIT_CYCLE && t.dma_virtual_end <= NO_WINDOW
    };
    let display_ok = (t.display_start == NO_WINDOW && t.display_end == NO_WINDOW)
        || (t.display_start >= 2 && t.display_start <= t.display_end && t.display_end < NO_WINDOW);
    dma_ok && display_ok
}
