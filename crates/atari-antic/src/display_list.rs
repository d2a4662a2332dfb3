//! Display list instruction decoding and mode line state.
//!
//! # Instruction byte
//!
//! | Bits | Meaning                                                     |
//! |------|-------------------------------------------------------------|
//! | 0-3  | Mode: 0 = blank, 1 = jump, 2-15 = text/graphics             |
//! | 4    | Horizontal scroll enable                                    |
//! | 5    | Vertical scroll enable                                      |
//! | 6    | LMS (modes 2-15) or wait for vertical blank (mode 1)        |
//! | 7    | Display list interrupt on the last row                      |

use serde::{Deserialize, Serialize};

pub const DL_HSCROLL: u8 = 0x10;
pub const DL_VSCROLL: u8 = 0x20;
pub const DL_LMS: u8 = 0x40;
pub const DL_DLI: u8 = 0x80;

/// How decoded playfield bytes are pushed to the display sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PushMode {
    #[default]
    Blank,
    /// Two colour clocks per byte, playfield bitmasks.
    Lores,
    /// Four hi-res pixels per byte, luminance bits.
    Hires,
}

/// Fixed properties of one mode code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeSpec {
    /// Scanlines per mode line (mode 0 overrides from the instruction).
    pub rows: u8,
    /// Clocks between playfield fetches.
    pub stride: u32,
    /// Bytes fetched per 8 clocks of window, as a shift.
    pub width_shift: u8,
    pub push: PushMode,
    pub hires: bool,
    pub text: bool,
}

const fn spec(rows: u8, stride: u32, width_shift: u8, push: PushMode, text: bool) -> ModeSpec {
    ModeSpec {
        rows,
        stride,
        width_shift,
        push,
        hires: matches!(push, PushMode::Hires),
        text,
    }
}

/// Per-mode timing: rows, fetch stride, width shift, push mode.
pub const MODE_TABLE: [ModeSpec; 16] = [
    spec(1, 8, 0, PushMode::Blank, false),  // 0: blank lines
    spec(1, 8, 0, PushMode::Blank, false),  // 1: jump
    spec(8, 2, 2, PushMode::Hires, true),   // 2: 40x8 text, 1.5 colours
    spec(10, 2, 2, PushMode::Hires, true),  // 3: 40x10 text with descenders
    spec(8, 2, 2, PushMode::Lores, true),   // 4: 40x8 text, 5 colours
    spec(16, 2, 2, PushMode::Lores, true),  // 5: 40x16 text, 5 colours
    spec(8, 4, 1, PushMode::Lores, true),   // 6: 20x8 text, 5 colours
    spec(16, 4, 1, PushMode::Lores, true),  // 7: 20x16 text, 5 colours
    spec(8, 8, 0, PushMode::Lores, false),  // 8: 40x8 graphics, 4 colours
    spec(4, 8, 0, PushMode::Lores, false),  // 9: 80x4 graphics, 2 colours
    spec(4, 4, 1, PushMode::Lores, false),  // A: 80x4 graphics, 4 colours
    spec(2, 4, 1, PushMode::Lores, false),  // B: 160x2 graphics, 2 colours
    spec(1, 4, 1, PushMode::Lores, false),  // C: 160x1 graphics, 2 colours
    spec(2, 2, 2, PushMode::Lores, false),  // D: 160x2 graphics, 4 colours
    spec(1, 2, 2, PushMode::Lores, false),  // E: 160x1 graphics, 4 colours
    spec(1, 2, 2, PushMode::Hires, false),  // F: 320x1 graphics, 1.5 colours
];

#[must_use]
pub const fn mode_spec(mode: u8) -> ModeSpec {
    MODE_TABLE[(mode & 0x0F) as usize]
}

/// Display list pointer increment: the counter only carries within 1K.
#[must_use]
pub const fn next_dl_address(addr: u16) -> u16 {
    (addr & 0xFC00) | (addr.wrapping_add(1) & 0x03FF)
}

/// Playfield pointer increment: the counter only carries within 4K.
#[must_use]
pub const fn advance_in_4k(addr: u16, by: u16) -> u16 {
    (addr & 0xF000) | (addr.wrapping_add(by) & 0x0FFF)
}

/// Display list engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DlState {
    /// No active list: vertical blank, or parked by a JVB.
    #[default]
    Idle,
    /// Executing rows of a mode line.
    RowActive,
    /// The last row finished; the next scanline starts a new instruction.
    RowBoundary,
}

/// The mode line currently being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeLine {
    /// Current instruction byte.
    pub control: u8,
    /// Previous instruction byte, for scroll edge detection.
    pub prev_control: u8,
    pub row_counter: u32,
    pub row_count: u32,
    pub stride: u32,
    pub width_shift: u8,
    pub push: PushMode,
    pub hires: bool,
    /// Stop at the latched VSCROL instead of `row_count - 1`.
    pub row_stop_uses_vscroll: bool,
    pub hscroll_enabled: bool,
    /// Operand bytes are due at clocks 6/7.
    pub operand_pending: bool,
}

impl ModeLine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            control: 0,
            prev_control: 0,
            row_counter: 0,
            row_count: 1,
            stride: 8,
            width_shift: 0,
            push: PushMode::Blank,
            hires: false,
            row_stop_uses_vscroll: false,
            hscroll_enabled: false,
            operand_pending: false,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> u8 {
        self.control & 0x0F
    }

    #[must_use]
    pub const fn dli_enabled(&self) -> bool {
        self.control & DL_DLI != 0
    }

    /// Row the current mode line ends on.
    #[must_use]
    pub const fn row_stop(&self, latched_vscroll: u8) -> u32 {
        if self.row_stop_uses_vscroll {
            latched_vscroll as u32
        } else {
            (self.row_count.wrapping_sub(1)) & 15
        }
    }

    #[must_use]
    pub const fn is_last_row(&self, latched_vscroll: u8) -> bool {
        self.row_counter == self.row_stop(latched_vscroll)
    }

    /// Force a new instruction on the next boundary, as at the top of the
    /// display region.
    pub fn restart(&mut self) {
        self.row_counter = 0;
        self.row_count = 1;
        self.row_stop_uses_vscroll = false;
        self.prev_control = 0;
    }

    /// Step the row counter at the end of a scanline. Returns true when the
    /// mode line just finished.
    pub fn step_row(&mut self, latched_vscroll: u8) -> bool {
        if self.is_last_row(latched_vscroll) {
            true
        } else {
            self.row_counter = (self.row_counter + 1) & 15;
            false
        }
    }

    /// Enter a new mode line from `control`. VSCROL scroll-edge handling
    /// needs the live VSCROL value.
    pub fn enter(&mut self, control: u8, vscrol: u8) {
        self.prev_control = self.control;
        self.control = control;

        let mode = control & 0x0F;
        let spec = mode_spec(mode);
        self.row_counter = 0;
        self.stride = spec.stride;
        self.width_shift = spec.width_shift;
        self.push = spec.push;
        self.hires = spec.hires;
        self.row_count = match mode {
            0 => u32::from((control >> 4) & 7) + 1,
            _ => u32::from(spec.rows),
        };
        self.operand_pending = mode == 1 || (mode >= 2 && control & DL_LMS != 0);

        // Blank and jump lines never scroll.
        let scroll_prev = if self.prev_control & 0x0F < 2 { 0 } else { self.prev_control };
        let scroll_cur = if mode < 2 { 0 } else { control };

        self.row_stop_uses_vscroll = false;
        if (scroll_cur ^ scroll_prev) & DL_VSCROLL != 0 {
            if scroll_cur & DL_VSCROLL != 0 {
                self.row_counter = u32::from(vscrol & 0x0F);
            } else {
                self.row_stop_uses_vscroll = true;
            }
        }

        self.hscroll_enabled = scroll_cur & DL_HSCROLL != 0;
    }

    /// Apply a jump-and-wait-for-vertical-blank: only the DLI and scroll bits
    /// of the instruction survive, so a DLI requested on the JVB still fires.
    pub fn park_for_vblank(&mut self) {
        self.control &= !0x4F;
        self.row_count = 1;
        self.push = PushMode::Blank;
        self.hires = false;
    }

    /// Vertical blank clears the instruction.
    pub fn clear(&mut self) {
        self.control = 0;
        self.push = PushMode::Blank;
        self.hires = false;
        self.hscroll_enabled = false;
    }
}

impl Default for ModeLine {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-scanline record of what the display list did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DlHistoryEntry {
    pub dl_address: u16,
    pub pf_address: u16,
    /// HSCROL in bits 0-3, VSCROL in bits 4-7.
    pub hv_scroll: u8,
    pub dmactl: u8,
    pub control: u8,
    pub valid: bool,
}
