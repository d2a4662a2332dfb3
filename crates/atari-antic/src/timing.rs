//! Fixed per-scanline cycle offsets.
//!
//! All offsets are machine clocks from the start of the scanline and follow
//! the ANTIC horizontal timing diagram. Changing any of them without a
//! hardware reference breaks software that races the beam.

use crate::beam::CLOCKS_PER_LINE;

/// Missile DMA slot.
pub const MISSILE_DMA_CYCLE: u32 = 0;
/// Row boundary evaluation and display list instruction fetch.
pub const ROW_BOUNDARY_CYCLE: u32 = 1;
/// First player DMA slot; players 0-3 use 2-5.
pub const PLAYER_DMA_FIRST_CYCLE: u32 = 2;
pub const PLAYER_DMA_LAST_CYCLE: u32 = 5;
/// Display list operand low byte (jump target / LMS address).
pub const DL_ADDRESS_LOW_CYCLE: u32 = 6;
/// Display list operand high byte. NMIEN is sampled early here.
pub const DL_ADDRESS_HIGH_CYCLE: u32 = 7;
/// Late NMIEN sample and DLI/VBI latch.
pub const NMI_LATCH_CYCLE: u32 = 8;
/// NMI assertion for enables that only the late sample saw.
pub const LATE_NMI_CYCLE: u32 = 9;
/// End of horizontal blank; playfield timing for the line is fixed here.
pub const HBLANK_END_CYCLE: u32 = 10;
/// Start of the visible part of the scanline.
pub const VISIBLE_START_CYCLE: u32 = 16;
/// WSYNC releases the CPU.
pub const WSYNC_RELEASE_CYCLE: u32 = 105;
/// Playfield DMA never runs at or past this clock.
pub const DMA_LIMIT_CYCLE: u32 = 106;
/// Memory refresh never runs at or past this clock.
pub const REFRESH_LIMIT_CYCLE: u32 = 107;
/// VSCROL is latched here to decide where scrolled mode lines stop.
pub const VSCROL_LATCH_CYCLE: u32 = 109;
/// Row counter step and playfield pointer advance.
pub const ROW_STEP_CYCLE: u32 = 111;
/// Scanline rollover sentinel.
pub const LINE_END_CYCLE: u32 = CLOCKS_PER_LINE;

/// First scanline of the display list region.
pub const DISPLAY_START_LINE: u32 = 8;
/// Scanline where vertical blank begins and VBI is latched.
pub const VBLANK_START_LINE: u32 = 248;

/// Entries in the per-clock tables (one per clock plus the rollover sentinel).
pub const PATTERN_LEN: usize = CLOCKS_PER_LINE as usize + 1;

/// Work bound to a fixed clock offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialCycle {
    MissileDma,
    RowBoundary,
    PlayerDma(u8),
    DlAddressLow,
    DlAddressHigh,
    NmiLatch,
    LateNmi,
    HblankEnd,
    VisibleStart,
    WsyncRelease,
    VscrollLatch,
    RowStep,
    LineEnd,
}

const fn build_special_cycles() -> [Option<SpecialCycle>; PATTERN_LEN] {
    let mut table = [None; PATTERN_LEN];
    table[MISSILE_DMA_CYCLE as usize] = Some(SpecialCycle::MissileDma);
    table[ROW_BOUNDARY_CYCLE as usize] = Some(SpecialCycle::RowBoundary);
    let mut x = PLAYER_DMA_FIRST_CYCLE;
    while x <= PLAYER_DMA_LAST_CYCLE {
        table[x as usize] = Some(SpecialCycle::PlayerDma((x - PLAYER_DMA_FIRST_CYCLE) as u8));
        x += 1;
    }
    table[DL_ADDRESS_LOW_CYCLE as usize] = Some(SpecialCycle::DlAddressLow);
    table[DL_ADDRESS_HIGH_CYCLE as usize] = Some(SpecialCycle::DlAddressHigh);
    table[NMI_LATCH_CYCLE as usize] = Some(SpecialCycle::NmiLatch);
    table[LATE_NMI_CYCLE as usize] = Some(SpecialCycle::LateNmi);
    table[HBLANK_END_CYCLE as usize] = Some(SpecialCycle::HblankEnd);
    table[VISIBLE_START_CYCLE as usize] = Some(SpecialCycle::VisibleStart);
    table[WSYNC_RELEASE_CYCLE as usize] = Some(SpecialCycle::WsyncRelease);
    table[VSCROL_LATCH_CYCLE as usize] = Some(SpecialCycle::VscrollLatch);
    table[ROW_STEP_CYCLE as usize] = Some(SpecialCycle::RowStep);
    table[LINE_END_CYCLE as usize] = Some(SpecialCycle::LineEnd);
    table
}

/// Offset-indexed dispatch table for the fixed-cycle logic.
pub const SPECIAL_CYCLES: [Option<SpecialCycle>; PATTERN_LEN] = build_special_cycles();

/// Which special handler, if any, owns clock `x`.
#[must_use]
pub fn special_cycle(x: u32) -> Option<SpecialCycle> {
    SPECIAL_CYCLES.get(x as usize).copied().flatten()
}

/// Display list region: player/missile DMA runs and the display is unblanked.
#[must_use]
pub const fn in_display_region(scanline: u32) -> bool {
    scanline >= DISPLAY_START_LINE && scanline < VBLANK_START_LINE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_table_covers_documented_offsets() {
        let expected = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 16, 105, 109, 111, 114];
        for x in 0..PATTERN_LEN as u32 {
            assert_eq!(
                special_cycle(x).is_some(),
                expected.contains(&x),
                "clock {x}"
            );
        }
        assert_eq!(special_cycle(4), Some(SpecialCycle::PlayerDma(2)));
        assert_eq!(special_cycle(200), None);
    }

    #[test]
    fn display_region_spans_lines_8_to_247() {
        assert!(!in_display_region(7));
        assert!(in_display_region(8));
        assert!(in_display_region(247));
        assert!(!in_display_region(248));
    }
}
