//! ANTIC cycle stepper and register block.
//!
//! One [`Antic::advance`] call is one machine clock. Each clock first runs
//! the fixed-cycle logic for that offset (if any), then whatever the cached
//! DMA pattern says owns the bus. The return value tells the CPU whether it
//! may use the bus this clock.

use log::{debug, trace};

use crate::beam::{BeamPosition, BeamStep, VideoStandard};
use crate::deferred::{DeferredQueue, DeferredRegister, DeferredWrite};
use crate::display_list::{
    DL_LMS, DlHistoryEntry, DlState, ModeLine, PushMode, advance_in_4k, next_dl_address,
};
use crate::dma::{CHAR_FETCH_LAG, DmaPattern, PatternKey, SlotKind};
use crate::host::{AnticBus, AnticHost, BlankingState, DisplaySink};
use crate::nmi::NmiController;
use crate::playfield::{DecodeParams, Playfield, PlayfieldTiming};
use crate::registers::{
    CHACTL, CHBASE, ChipRegisters, DLISTH, DLISTL, DMACTL, HSCROL, NMI_DLI, NMI_VBI, NMIEN,
    NMIRES, NMIST, NMIST_IDLE, PENH, PENV, PMBASE, VCOUNT, VSCROL, WSYNC,
};
use crate::scheduler::{AnticEvent, Scheduler};
use crate::timing::{
    DISPLAY_START_LINE, HBLANK_END_CYCLE, LINE_END_CYCLE, SpecialCycle, VBLANK_START_LINE,
    in_display_region, special_cycle,
};
use crate::wsync::{WSYNC_ASSERT_DELAY, WsyncAssert, WsyncController, WsyncRequest, WsyncState};

/// ANTIC display list processor.
pub struct Antic {
    pub(crate) regs: ChipRegisters,
    pub(crate) beam: BeamPosition,
    pub(crate) dl_state: DlState,
    pub(crate) mode_line: ModeLine,
    /// Memory scan counter: playfield address of the current mode line.
    pub(crate) pf_address: u16,
    /// Playfield fetches (real and virtual) made on this scanline.
    pub(crate) pf_fetch_offset: u16,
    pub(crate) operand_low: u8,
    /// Row counter value displayed on this scanline, latched at hblank end.
    pub(crate) display_row: u32,
    pub(crate) char_row_base: u16,
    pub(crate) char_code_mask: u8,
    pub(crate) latched_vscroll: u8,
    /// Playfield data DMA runs on this scanline.
    pub(crate) dma_active_line: bool,
    pub(crate) phantom_sprite_dma: bool,
    /// Last value ANTIC saw on the bus.
    pub(crate) bus_latch: u8,
    pub(crate) field_odd: bool,
    pub(crate) blanking: BlankingState,
    pub(crate) halted_cycles: u64,
    /// Scheduler tick of the most recent clock.
    pub(crate) last_tick: u64,
    pub(crate) pattern: DmaPattern,
    pub(crate) playfield: Playfield,
    pub(crate) nmi: NmiController,
    pub(crate) wsync: WsyncController,
    pub(crate) deferred: DeferredQueue,
    pub(crate) dl_history: Vec<DlHistoryEntry>,
}

impl Antic {
    #[must_use]
    pub fn new(standard: VideoStandard) -> Self {
        let beam = BeamPosition::new(standard);
        Self {
            regs: ChipRegisters::new(),
            beam,
            dl_state: DlState::Idle,
            mode_line: ModeLine::new(),
            pf_address: 0,
            pf_fetch_offset: 0,
            operand_low: 0,
            display_row: 0,
            char_row_base: 0,
            char_code_mask: 0x7F,
            latched_vscroll: 0,
            dma_active_line: false,
            phantom_sprite_dma: false,
            bus_latch: 0xFF,
            field_odd: false,
            blanking: BlankingState::Active,
            halted_cycles: 0,
            last_tick: 0,
            pattern: DmaPattern::new(),
            playfield: Playfield::new(),
            nmi: NmiController::new(),
            wsync: WsyncController::new(),
            deferred: DeferredQueue::new(),
            dl_history: vec![DlHistoryEntry::default(); beam.scanline_limit() as usize],
        }
    }

    // ------------------------------------------------------------------
    // Reset and configuration
    // ------------------------------------------------------------------

    /// Power-on reset. Registers and display list state return to their
    /// initial values; the beam keeps running.
    ///
    /// The display list stays idle until scanline 8 instead of fetching on
    /// the next row boundary, so a reset mid-frame shows blank lines for
    /// the rest of that frame.
    pub fn cold_reset(&mut self, scheduler: &mut impl Scheduler) {
        self.cancel_timers(scheduler);
        let beam = self.beam;
        *self = Self::new(self.video_standard());
        self.beam = beam;
    }

    /// System reset line: interrupts off, WSYNC and queued writes dropped.
    pub fn warm_reset(&mut self, scheduler: &mut impl Scheduler) {
        self.cancel_timers(scheduler);
        self.regs.nmien = 0;
        self.regs.nmist = NMIST_IDLE;
        self.nmi.reset();
        self.wsync.reset();
        self.deferred.clear();
    }

    pub fn set_video_standard(&mut self, standard: VideoStandard) {
        self.beam.set_standard(standard);
        self.dl_history
            .resize(standard.lines_per_frame() as usize, DlHistoryEntry::default());
    }

    #[must_use]
    pub fn video_standard(&self) -> VideoStandard {
        VideoStandard::from_lines_per_frame(self.beam.scanline_limit())
    }

    pub(crate) fn cancel_timers(&mut self, scheduler: &mut impl Scheduler) {
        if let Some(id) = self.wsync.timer() {
            scheduler.cancel(id);
            self.wsync.set_timer(None);
        }
        if let Some(id) = self.deferred.timer() {
            scheduler.cancel(id);
            self.deferred.set_timer(None);
        }
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    #[must_use]
    pub fn clock(&self) -> u32 {
        self.beam.clock
    }

    #[must_use]
    pub fn scanline(&self) -> u32 {
        self.beam.scanline
    }

    #[must_use]
    pub fn frame_counter(&self) -> u32 {
        self.beam.frame
    }

    /// Packed beam position, see [`BeamPosition::timestamp`].
    #[must_use]
    pub fn timestamp(&self) -> u32 {
        self.beam.timestamp()
    }

    #[must_use]
    pub fn beam(&self) -> BeamPosition {
        self.beam
    }

    #[must_use]
    pub fn registers(&self) -> &ChipRegisters {
        &self.regs
    }

    /// Clocks the CPU has spent held by WSYNC.
    #[must_use]
    pub fn halted_cycle_count(&self) -> u64 {
        self.halted_cycles
    }

    #[must_use]
    pub fn display_list_pointer(&self) -> u16 {
        self.regs.dlist
    }

    #[must_use]
    pub fn playfield_address(&self) -> u16 {
        self.pf_address
    }

    /// One entry per scanline of the current frame.
    #[must_use]
    pub fn dl_history(&self) -> &[DlHistoryEntry] {
        &self.dl_history
    }

    #[must_use]
    pub fn dma_pattern(&self) -> &DmaPattern {
        &self.pattern
    }

    #[must_use]
    pub fn mode_line(&self) -> &ModeLine {
        &self.mode_line
    }

    #[must_use]
    pub fn dl_state(&self) -> DlState {
        self.dl_state
    }

    #[must_use]
    pub fn wsync_state(&self) -> WsyncState {
        self.wsync.state()
    }

    #[must_use]
    pub fn is_cpu_halted(&self) -> bool {
        self.wsync.is_halted()
    }

    // ------------------------------------------------------------------
    // Cycle stepper
    // ------------------------------------------------------------------

    /// Run one clock. Returns true when ANTIC owns the bus this clock and
    /// the CPU must not run.
    pub fn advance(&mut self, host: &mut impl AnticHost) -> bool {
        self.last_tick = host.current_tick();

        if self.beam.clock + 1 == LINE_END_CYCLE {
            self.finish_scanline(host);
        }

        match self.beam.step() {
            BeamStep::Clock => {}
            BeamStep::Scanline => self.start_scanline(),
            BeamStep::Frame => {
                self.start_frame(host);
                self.start_scanline();
            }
        }

        let x = self.beam.clock;

        // The release clock itself is still halted.
        let halted = self.wsync.is_halted();
        if halted {
            self.halted_cycles += 1;
        }

        let mut busy = halted;
        if let Some(special) = special_cycle(x) {
            busy |= self.run_special_cycle(special, host);
        }
        busy |= self.run_slot(x, host);
        busy
    }

    fn finish_scanline(&mut self, sink: &mut impl DisplaySink) {
        self.sync_playfield(LINE_END_CYCLE, 0, sink);
        sink.end_scanline(self.mode_line.control);
    }

    fn start_frame(&mut self, sink: &mut impl DisplaySink) {
        sink.end_frame();
        self.field_odd = !self.field_odd;
        sink.set_field_polarity(self.field_odd);
        self.dl_state = DlState::Idle;
        self.mode_line.clear();
    }

    fn start_scanline(&mut self) {
        let y = self.beam.scanline;
        if y == VBLANK_START_LINE {
            self.dl_state = DlState::Idle;
            self.mode_line.clear();
        } else if y == DISPLAY_START_LINE {
            self.dl_state = DlState::RowBoundary;
            self.mode_line.restart();
        }
        self.phantom_sprite_dma = self.regs.missile_dma_enabled() && !self.regs.dl_dma_enabled();
    }

    fn run_special_cycle(&mut self, special: SpecialCycle, host: &mut impl AnticHost) -> bool {
        match special {
            SpecialCycle::MissileDma => self.sprite_dma(None, host),
            SpecialCycle::RowBoundary => self.row_boundary(host),
            SpecialCycle::PlayerDma(n) => self.sprite_dma(Some(n), host),
            SpecialCycle::DlAddressLow => self.fetch_operand_low(host),
            SpecialCycle::DlAddressHigh => {
                self.nmi.sample_early(self.regs.nmien);
                self.fetch_operand_high(host)
            }
            SpecialCycle::NmiLatch => {
                self.latch_interrupts(host);
                false
            }
            SpecialCycle::LateNmi => {
                if self.nmi.take_deferred() {
                    trace!("late NMI at scanline {}", self.beam.scanline);
                    host.assert_nmi();
                }
                false
            }
            SpecialCycle::HblankEnd => {
                self.end_hblank();
                false
            }
            SpecialCycle::VisibleStart => {
                self.begin_visible(host);
                false
            }
            SpecialCycle::WsyncRelease => {
                if self.wsync.release() {
                    trace!("WSYNC re-armed at scanline {}", self.beam.scanline);
                    self.schedule_wsync(host);
                }
                false
            }
            SpecialCycle::VscrollLatch => {
                self.latched_vscroll = self.regs.vscrol;
                false
            }
            SpecialCycle::RowStep => {
                self.step_row();
                false
            }
            // Rollover is handled before the beam steps.
            SpecialCycle::LineEnd => false,
        }
    }

    fn run_slot(&mut self, x: u32, bus: &mut impl AnticBus) -> bool {
        let kind = self.pattern.slot(x);
        match kind {
            SlotKind::Playfield => {
                let addr = advance_in_4k(self.pf_address, self.pf_fetch_offset);
                self.playfield.data[x as usize] = bus.read_byte(addr);
                self.pf_fetch_offset = self.pf_fetch_offset.wrapping_add(1);
            }
            SlotKind::PlayfieldVirtual => {
                self.pf_fetch_offset = self.pf_fetch_offset.wrapping_add(1);
            }
            SlotKind::Character => {
                let code = self.playfield.data[(x - CHAR_FETCH_LAG) as usize] & self.char_code_mask;
                let addr = self.char_row_base.wrapping_add(u16::from(code) << 3);
                self.playfield.chars[x as usize] = bus.read_byte(addr);
            }
            SlotKind::Refresh | SlotKind::Idle | SlotKind::DisplayList | SlotKind::Sprite => {}
        }
        kind.occupies_bus()
    }

    /// Player/missile DMA. `player` is `None` for the missile slot.
    fn sprite_dma(&mut self, player: Option<u8>, host: &mut impl AnticHost) -> bool {
        let y = self.beam.scanline;
        let enabled = match player {
            None => self.regs.missile_dma_enabled(),
            Some(_) => self.regs.player_dma_enabled(),
        };
        if !enabled || !in_display_region(y) {
            return false;
        }

        let data = if self.phantom_sprite_dma {
            self.bus_latch
        } else {
            host.read_byte(self.sprite_address(player))
        };

        let odd = y & 1 != 0;
        match player {
            None => host.update_missile(odd, data),
            Some(n) => host.update_player(odd, usize::from(n), data),
        }
        true
    }

    fn sprite_address(&self, player: Option<u8>) -> u16 {
        let y = self.beam.scanline as u16;
        if self.regs.single_line_pm() {
            let base = u16::from(self.regs.pmbase & 0xF8) << 8;
            match player {
                None => base + 0x300 + y,
                Some(n) => base + 0x400 + 0x100 * u16::from(n) + y,
            }
        } else {
            let base = u16::from(self.regs.pmbase & 0xFC) << 8;
            match player {
                None => base + 0x180 + (y >> 1),
                Some(n) => base + 0x200 + 0x80 * u16::from(n) + (y >> 1),
            }
        }
    }

    fn read_dl_byte(&mut self, bus: &mut impl AnticBus) -> u8 {
        let value = bus.read_byte(self.regs.dlist);
        self.regs.dlist = next_dl_address(self.regs.dlist);
        self.bus_latch = value;
        value
    }

    fn row_boundary(&mut self, bus: &mut impl AnticBus) -> bool {
        let y = self.beam.scanline as usize;
        let dl_address = self.regs.dlist;
        let mut busy = false;

        self.dma_active_line = false;
        if self.dl_state == DlState::RowBoundary {
            // Without DL DMA the previous instruction runs again.
            let control = if self.regs.dl_dma_enabled() {
                busy = true;
                self.read_dl_byte(bus)
            } else {
                self.mode_line.control
            };
            self.mode_line.enter(control, self.regs.vscrol);
            self.playfield.clear_data();
            self.dl_state = DlState::RowActive;
            self.dma_active_line = self.mode_line.mode() >= 2;
        }

        if let Some(entry) = self.dl_history.get_mut(y) {
            *entry = DlHistoryEntry {
                dl_address,
                pf_address: self.pf_address,
                hv_scroll: self.regs.packed_scroll(),
                dmactl: self.regs.dmactl,
                control: self.mode_line.control,
                valid: self.dl_state != DlState::Idle,
            };
        }
        busy
    }

    fn fetch_operand_low(&mut self, bus: &mut impl AnticBus) -> bool {
        if !self.mode_line.operand_pending || !self.regs.dl_dma_enabled() {
            return false;
        }
        self.operand_low = self.read_dl_byte(bus);
        true
    }

    fn fetch_operand_high(&mut self, bus: &mut impl AnticBus) -> bool {
        if !self.mode_line.operand_pending {
            return false;
        }
        self.mode_line.operand_pending = false;
        if !self.regs.dl_dma_enabled() {
            return false;
        }

        let high = self.read_dl_byte(bus);
        let addr = u16::from_le_bytes([self.operand_low, high]);

        if self.mode_line.mode() == 1 {
            self.regs.dlist = addr;
            if self.mode_line.control & DL_LMS != 0 {
                debug!("JVB to ${addr:04X} at scanline {}", self.beam.scanline);
                self.mode_line.park_for_vblank();
                self.dl_state = DlState::Idle;
            } else {
                debug!("DL jump to ${addr:04X} at scanline {}", self.beam.scanline);
            }
        } else {
            self.pf_address = addr;
            if let Some(entry) = self.dl_history.get_mut(self.beam.scanline as usize) {
                entry.pf_address = addr;
            }
        }
        true
    }

    fn latch_interrupts(&mut self, bus: &mut impl AnticBus) {
        let mut requests = 0;
        if self.beam.scanline == VBLANK_START_LINE {
            requests |= NMI_VBI;
        }
        if self.mode_line.dli_enabled() && self.mode_line.is_last_row(self.latched_vscroll) {
            requests |= NMI_DLI;
        }

        let latch = self.nmi.latch(
            requests,
            self.regs.nmien,
            &mut self.regs.nmist,
            self.beam.timestamp(),
        );
        if latch.assert_now {
            trace!(
                "NMI {:#04X} at scanline {}",
                requests & self.regs.nmien,
                self.beam.scanline
            );
            bus.assert_nmi();
        }
    }

    fn end_hblank(&mut self) {
        self.display_row = self.mode_line.row_counter;
        self.update_char_row();

        let hscroll = self.mode_line.hscroll_enabled;
        let timing = PlayfieldTiming::for_line(
            self.regs.playfield_width(),
            hscroll,
            u32::from(self.regs.hscrol >> 1),
            self.mode_line.mode(),
        );
        self.playfield
            .begin_line(timing, hscroll && self.regs.hscrol & 1 != 0);
        self.pf_fetch_offset = 0;
        self.refresh_pattern();
    }

    fn begin_visible(&mut self, sink: &mut impl DisplaySink) {
        let y = self.beam.scanline;
        sink.begin_scanline(y, self.mode_line.hires);

        let blanking = if in_display_region(y) {
            BlankingState::Active
        } else {
            BlankingState::VerticalBlank
        };
        if blanking != self.blanking {
            self.blanking = blanking;
            sink.set_blanking_state(blanking);
        }
    }

    fn step_row(&mut self) {
        if self.dma_active_line {
            self.pf_address = advance_in_4k(self.pf_address, self.pattern.fetch_count() as u16);
        }

        if self.dl_state == DlState::RowActive && self.mode_line.step_row(self.latched_vscroll) {
            self.dl_state = DlState::RowBoundary;
        }

        let next = self.beam.scanline + 1;
        self.regs.vcount = if next >= self.beam.scanline_limit() {
            0
        } else {
            (next >> 1) as u8
        };
    }

    pub(crate) fn pattern_key(&self) -> PatternKey {
        let timing = self.playfield.timing;
        PatternKey {
            dma_start: timing.dma_start,
            dma_end: timing.dma_end,
            dma_virtual_end: timing.dma_virtual_end,
            mode: self.mode_line.mode(),
            active: self.dma_active_line,
            enabled: timing.has_dma(),
        }
    }

    fn refresh_pattern(&mut self) {
        let key = self.pattern_key();
        self.pattern.update(key);
    }

    /// Glyph row address for the current row of a text mode line.
    pub(crate) fn update_char_row(&mut self) {
        let mode = self.mode_line.mode();
        let row = match mode {
            5 | 7 => self.display_row >> 1,
            _ => self.display_row,
        };
        let row = ((row ^ self.regs.char_reflect()) & 7) as u16;

        let (base, mask) = if matches!(mode, 6 | 7) {
            (self.regs.char_base_512(), 0x3F)
        } else {
            (self.regs.char_base_1k(), 0x7F)
        };
        self.char_row_base = base + row;
        self.char_code_mask = mask;
    }

    // ------------------------------------------------------------------
    // Display composer coupling
    // ------------------------------------------------------------------

    /// Decode and emit playfield pixels up to composer position
    /// `clock + offset + 1`.
    pub fn sync_with_display(&mut self, offset: i32, sink: &mut impl DisplaySink) {
        self.sync_playfield(self.beam.clock, offset, sink);
    }

    fn sync_playfield(&mut self, clock: u32, offset: i32, sink: &mut impl DisplaySink) {
        let push = self.mode_line.push;
        let active = push != PushMode::Blank;
        let params = active.then(|| DecodeParams {
            mode: self.mode_line.mode(),
            row_counter: self.display_row,
            char_invert: self.regs.char_invert_mask(),
            char_blink: self.regs.char_blink_mask(),
        });
        if let Some(params) = &params {
            self.playfield.decode(clock, offset, params);
        }
        self.playfield.emit(clock, offset, push, params.as_ref(), sink);
    }

    // ------------------------------------------------------------------
    // Registers
    // ------------------------------------------------------------------

    #[must_use]
    pub fn read_register(&self, reg: u8) -> u8 {
        match reg & 0x0F {
            VCOUNT => self.regs.vcount,
            PENH => self.regs.penh,
            PENV => self.regs.penv,
            NMIST => self.regs.nmist,
            _ => 0xFF,
        }
    }

    pub fn write_register(&mut self, reg: u8, value: u8, host: &mut impl AnticHost) {
        match reg & 0x0F {
            DMACTL => self.write_dmactl(value, host),
            CHACTL => self.queue_deferred(DeferredRegister::Chactl, value, host),
            DLISTL => self.regs.dlist = (self.regs.dlist & 0xFF00) | u16::from(value),
            DLISTH => self.regs.dlist = (self.regs.dlist & 0x00FF) | (u16::from(value) << 8),
            HSCROL => {
                self.sync_with_display(0, host);
                self.regs.hscrol = value & 0x0F;
            }
            VSCROL => self.regs.vscrol = value & 0x0F,
            PMBASE => self.regs.pmbase = value,
            CHBASE => self.queue_deferred(DeferredRegister::Chbase, value, host),
            WSYNC => self.write_wsync(host),
            NMIEN => self.regs.nmien = value,
            NMIRES => self.nmi.reset_status(&mut self.regs.nmist, self.beam.timestamp()),
            _ => {}
        }
    }

    fn write_dmactl(&mut self, value: u8, host: &mut impl AnticHost) {
        self.sync_with_display(0, host);
        self.regs.dmactl = value;

        // Before hblank end the new value is picked up when the line's
        // timing is fixed.
        let x = self.beam.clock;
        if x < HBLANK_END_CYCLE {
            return;
        }

        let next = PlayfieldTiming::for_line(
            self.regs.playfield_width(),
            self.mode_line.hscroll_enabled,
            u32::from(self.regs.hscrol >> 1),
            self.mode_line.mode(),
        );
        let timing = self.playfield.timing.retime(next, x);
        self.playfield.retime(timing, x);
        self.refresh_pattern();
    }

    fn write_wsync(&mut self, scheduler: &mut impl Scheduler) {
        match self.wsync.request(self.beam.clock) {
            WsyncRequest::Schedule => self.schedule_wsync(scheduler),
            WsyncRequest::Rearm => {
                trace!("WSYNC written on the release clock at scanline {}", self.beam.scanline);
            }
            WsyncRequest::Ignored => {}
        }
    }

    pub(crate) fn schedule_wsync(&mut self, scheduler: &mut impl Scheduler) {
        let id = scheduler.schedule(WSYNC_ASSERT_DELAY, AnticEvent::WsyncAssert);
        self.wsync.set_timer(Some(id));
    }

    fn queue_deferred(&mut self, register: DeferredRegister, value: u8, scheduler: &mut impl Scheduler) {
        let write = DeferredWrite {
            target: scheduler.current_tick() + u64::from(register.delay()),
            register,
            value,
        };
        if self.deferred.push(write) {
            self.arm_deferred_timer(scheduler);
        }
    }

    pub(crate) fn arm_deferred_timer(&mut self, scheduler: &mut impl Scheduler) {
        if let Some(id) = self.deferred.timer() {
            scheduler.cancel(id);
        }
        let now = scheduler.current_tick();
        let id = self.deferred.next_target().map(|target| {
            let delay = u32::try_from(target.saturating_sub(now)).unwrap_or(u32::MAX);
            scheduler.schedule(delay, AnticEvent::RegisterUpdate)
        });
        self.deferred.set_timer(id);
    }

    fn apply_deferred(&mut self, write: DeferredWrite, sink: &mut impl DisplaySink) {
        // Pixels up to now were produced under the old value.
        self.sync_with_display(0, sink);
        match write.register {
            DeferredRegister::Chbase => self.regs.chbase = write.value,
            DeferredRegister::Chactl => self.regs.chactl = write.value,
        }
        self.update_char_row();
    }

    /// Entry point for timers registered through [`Scheduler::schedule`].
    pub fn on_scheduled_event(&mut self, event: AnticEvent, host: &mut impl AnticHost) {
        match event {
            AnticEvent::WsyncAssert => match self.wsync.on_assert(host.is_next_cpu_cycle_write()) {
                WsyncAssert::Retry => self.schedule_wsync(host),
                WsyncAssert::Asserted => {
                    self.bus_latch = host.cpu_held_cycle_value();
                    trace!(
                        "WSYNC halt at scanline {} clock {}",
                        self.beam.scanline,
                        self.beam.clock
                    );
                }
                WsyncAssert::Ignored => {}
            },
            AnticEvent::RegisterUpdate => {
                self.deferred.set_timer(None);
                let now = host.current_tick();
                while let Some(write) = self.deferred.pop_due(now) {
                    self.apply_deferred(write, host);
                }
                if !self.deferred.is_empty() {
                    self.arm_deferred_timer(host);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Interrupts and light pen
    // ------------------------------------------------------------------

    /// RESET key NMI.
    pub fn request_external_interrupt(&mut self, bus: &mut impl AnticBus) {
        NmiController::external(&mut self.regs.nmist);
        bus.assert_nmi();
    }

    pub fn set_light_pen_position(&mut self, h: u8, v: u8) {
        self.regs.penh = h;
        self.regs.penv = v;
    }

    /// Latch the beam into PENH/PENV, as the light pen input does.
    pub fn latch_light_pen(&mut self) {
        self.regs.penh = (self.beam.clock * 2) as u8;
        self.regs.penv = (self.beam.scanline >> 1) as u8;
    }
}

impl Default for Antic {
    fn default() -> Self {
        Self::new(VideoStandard::default())
    }
}
