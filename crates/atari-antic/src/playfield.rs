//! Playfield decode pipeline.
//!
//! DMA writes raw bytes into per-scanline buffers indexed by clock. The
//! decoder turns them into one pixel byte per clock lazily, only as far as
//! the display composer has asked for, and never past what DMA has fetched.
//!
//! A decoded byte covers one clock of beam time:
//! - lores: two colour clocks, high nibble first, each a playfield bitmask
//!   (1 = PF0, 2 = PF1, 4 = PF2, 8 = PF3);
//! - hires: four hi-res pixels in the low nibble, MSB first.

use serde::{Deserialize, Serialize};

use crate::dma::CHAR_FETCH_LAG;
use crate::display_list::PushMode;
use crate::host::DisplaySink;
use crate::registers::PlayfieldWidth;
use crate::timing::DMA_LIMIT_CYCLE;

/// Clock index buffers: one slot per clock plus glyph lag headroom.
pub const LINE_BUFFER_LEN: usize = 128;
/// Decoded pixel bytes per scanline.
pub const DECODE_LEN: usize = 228;
/// Marker for "no window on this line".
pub const NO_WINDOW: u32 = 127;

/// Graphics data lands four clocks after its fetch, text six.
const GRAPHICS_DECODE_DELAY: usize = 4;
const TEXT_DECODE_DELAY: usize = 6;

/// Two 2-bit pixels to a byte of PF0/PF1/PF2 masks.
const EXPAND_160: [u8; 16] = [
    0x00, 0x01, 0x02, 0x04, 0x10, 0x11, 0x12, 0x14, 0x20, 0x21, 0x22, 0x24, 0x40, 0x41, 0x42,
    0x44,
];

/// As `EXPAND_160` with PF3 in place of PF2 (inverse characters, modes 4/5).
const EXPAND_160_ALT: [u8; 16] = [
    0x00, 0x01, 0x02, 0x08, 0x10, 0x11, 0x12, 0x18, 0x20, 0x21, 0x22, 0x28, 0x80, 0x81, 0x82,
    0x88,
];

/// Modes 6/7: glyph nibble to four colour clocks, colour from name bits 6-7.
const EXPAND_MODE6: [[u16; 16]; 4] = [
    [
        0x0000, 0x0100, 0x1000, 0x1100, 0x0001, 0x0101, 0x1001, 0x1101, 0x0010, 0x0110, 0x1010,
        0x1110, 0x0011, 0x0111, 0x1011, 0x1111,
    ],
    [
        0x0000, 0x0200, 0x2000, 0x2200, 0x0002, 0x0202, 0x2002, 0x2202, 0x0020, 0x0220, 0x2020,
        0x2220, 0x0022, 0x0222, 0x2022, 0x2222,
    ],
    [
        0x0000, 0x0400, 0x4000, 0x4400, 0x0004, 0x0404, 0x4004, 0x4404, 0x0040, 0x0440, 0x4040,
        0x4440, 0x0044, 0x0444, 0x4044, 0x4444,
    ],
    [
        0x0000, 0x0800, 0x8000, 0x8800, 0x0008, 0x0808, 0x8008, 0x8808, 0x0080, 0x0880, 0x8080,
        0x8880, 0x0088, 0x0888, 0x8088, 0x8888,
    ],
];

const EXPAND_MODE8: [u32; 16] = [
    0x0000_0000, 0x1111_0000, 0x2222_0000, 0x4444_0000, 0x0000_1111, 0x1111_1111, 0x2222_1111,
    0x4444_1111, 0x0000_2222, 0x1111_2222, 0x2222_2222, 0x4444_2222, 0x0000_4444, 0x1111_4444,
    0x2222_4444, 0x4444_4444,
];

const EXPAND_MODE9: [u32; 16] = [
    0x0000_0000, 0x1100_0000, 0x0011_0000, 0x1111_0000, 0x0000_1100, 0x1100_1100, 0x0011_1100,
    0x1111_1100, 0x0000_0011, 0x1100_0011, 0x0011_0011, 0x1111_0011, 0x0000_1111, 0x1100_1111,
    0x0011_1111, 0x1111_1111,
];

const EXPAND_MODE_A: [u16; 16] = [
    0x0000, 0x1100, 0x2200, 0x4400, 0x0011, 0x1111, 0x2211, 0x4411, 0x0022, 0x1122, 0x2222,
    0x4422, 0x0044, 0x1144, 0x2244, 0x4444,
];

const EXPAND_MODE_B: [u16; 16] = [
    0x0000, 0x0100, 0x1000, 0x1100, 0x0001, 0x0101, 0x1001, 0x1101, 0x0010, 0x0110, 0x1010,
    0x1110, 0x0011, 0x0111, 0x1011, 0x1111,
];

/// Where DMA and display run on the current scanline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayfieldTiming {
    pub display_start: u32,
    pub display_end: u32,
    pub dma_start: u32,
    /// Real fetches stop here (never past clock 106).
    pub dma_end: u32,
    /// Where fetches would stop without the 106 limit.
    pub dma_virtual_end: u32,
    pub fetch_width: PlayfieldWidth,
}

impl PlayfieldTiming {
    /// Timing for a scanline of `mode` at `width`. `hscroll_offset` is the
    /// DMA delay in clocks (`HSCROL >> 1`) when horizontal scroll is on.
    #[must_use]
    pub fn for_line(
        width: PlayfieldWidth,
        hscroll_enabled: bool,
        hscroll_offset: u32,
        mode: u8,
    ) -> Self {
        let fetch_width = if hscroll_enabled { width.widened() } else { width };
        let (display_start, display_end) = width.display_window().unwrap_or((NO_WINDOW, NO_WINDOW));

        let mut timing = Self {
            display_start,
            display_end,
            dma_start: NO_WINDOW,
            dma_end: NO_WINDOW,
            dma_virtual_end: NO_WINDOW,
            fetch_width,
        };

        if mode >= 2 && fetch_width != PlayfieldWidth::Disabled {
            let graphics_delay = if mode < 8 { 0 } else { 2 };
            let start = match fetch_width {
                PlayfieldWidth::Narrow => 26,
                PlayfieldWidth::Normal => 18,
                _ => 10,
            } + graphics_delay
                + hscroll_offset;
            let virtual_end = start + fetch_width.dma_clocks();
            timing.dma_start = start;
            timing.dma_virtual_end = virtual_end;
            timing.dma_end = virtual_end.min(DMA_LIMIT_CYCLE);
        }

        timing
    }

    #[must_use]
    pub const fn has_dma(&self) -> bool {
        self.dma_start != NO_WINDOW
    }

    /// Timing after a DMACTL write at `clock`, given the timing the new value
    /// would produce for a fresh line. A boundary the beam has already
    /// reached keeps its latched value; a start moved behind the beam is
    /// missed for the rest of the line.
    #[must_use]
    pub fn retime(&self, next: PlayfieldTiming, clock: u32) -> Self {
        let dma_start = if clock >= self.dma_start {
            self.dma_start
        } else if next.dma_start <= clock {
            NO_WINDOW
        } else {
            next.dma_start
        };

        let (dma_end, dma_virtual_end) = if clock >= self.dma_end {
            (self.dma_end, self.dma_virtual_end)
        } else if dma_start == NO_WINDOW {
            (NO_WINDOW, NO_WINDOW)
        } else if !next.has_dma() {
            // Switched off inside the window: no fetches from here on.
            (clock + 1, clock + 1)
        } else {
            let virtual_end = (dma_start + next.fetch_width.dma_clocks()).max(clock + 1);
            (virtual_end.min(DMA_LIMIT_CYCLE), virtual_end)
        };

        let display_start = if clock >= self.display_start {
            self.display_start
        } else {
            next.display_start
        };
        let display_end = if clock >= self.display_end {
            self.display_end
        } else if display_start == NO_WINDOW {
            NO_WINDOW
        } else if next.display_end == NO_WINDOW {
            clock + 1
        } else {
            next.display_end.max(clock + 1)
        };

        Self {
            display_start,
            display_end,
            dma_start,
            dma_end,
            dma_virtual_end,
            fetch_width: next.fetch_width,
        }
    }
}

/// Inputs the decoder needs from the rest of the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeParams {
    pub mode: u8,
    pub row_counter: u32,
    pub char_invert: u8,
    pub char_blink: u8,
}

/// Per-scanline buffers and cursors.
#[derive(Debug, Clone)]
pub struct Playfield {
    /// Fetched playfield bytes (names in text modes), indexed by clock.
    pub data: [u8; LINE_BUFFER_LEN],
    /// Fetched glyph rows, indexed by clock.
    pub chars: [u8; LINE_BUFFER_LEN],
    /// Decoded pixel bytes, indexed by clock.
    pub decoded: [u8; DECODE_LEN],
    pub decode_counter: u32,
    pub display_counter: u32,
    pub timing: PlayfieldTiming,
    /// Odd HSCROL: output lags by half a colour clock.
    pub hscroll_delay: bool,
}

impl Playfield {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: [0; LINE_BUFFER_LEN],
            chars: [0; LINE_BUFFER_LEN],
            decoded: [0; DECODE_LEN],
            decode_counter: NO_WINDOW,
            display_counter: NO_WINDOW,
            timing: PlayfieldTiming::for_line(PlayfieldWidth::Disabled, false, 0, 0),
            hscroll_delay: false,
        }
    }

    /// Start of the active region: fix timing and reset the cursors.
    pub fn begin_line(&mut self, timing: PlayfieldTiming, hscroll_delay: bool) {
        self.timing = timing;
        self.hscroll_delay = hscroll_delay;
        self.chars = [0; LINE_BUFFER_LEN];
        self.decoded = [0; DECODE_LEN];
        self.decode_counter = timing.dma_start;
        self.display_counter = timing.display_start;
    }

    /// Switch to retimed values mid-line. Cursors only move if their window
    /// had not opened yet.
    pub fn retime(&mut self, timing: PlayfieldTiming, clock: u32) {
        if clock < self.timing.dma_start {
            self.decode_counter = timing.dma_start;
        }
        if clock < self.timing.display_start {
            self.display_counter = timing.display_start;
        }
        self.timing = timing;
    }

    /// New mode line: the previous line's names are stale.
    pub fn clear_data(&mut self) {
        self.data = [0; LINE_BUFFER_LEN];
    }

    /// Decode up to the composer position `clock + offset + 1`, never past
    /// what DMA has delivered by `clock`.
    pub fn decode(&mut self, clock: u32, offset: i32, params: &DecodeParams) {
        let text = params.mode < 8;
        let lag = if text { CHAR_FETCH_LAG as i32 } else { 0 };
        let fetched = clock as i32 + 1 - lag;
        let requested = clock as i32 + offset.min(0) + 1 - lag;
        let limit = requested.min(fetched).min(self.timing.dma_end as i32);

        let mut x = self.decode_counter as i32;
        if x >= limit {
            return;
        }

        let delay = if text { TEXT_DECODE_DELAY } else { GRAPHICS_DECODE_DELAY };

        while x < limit {
            let xi = x as usize;
            let c = self.data[xi];
            let dst = xi + delay;
            let step = match params.mode {
                2 => {
                    let d = self.masked_glyph(c, self.chars[xi + 3], params);
                    self.decoded[dst] = d >> 4;
                    self.decoded[dst + 1] = d & 15;
                    2
                }
                3 => {
                    let mut mask = if params.row_counter >= 2 { 0xFF } else { 0x00 };
                    if params.row_counter & 6 == 0 && c & 0x60 != 0x60 {
                        mask ^= 0xFF;
                    }
                    let d = self.masked_glyph(c, self.chars[xi + 3] & mask, params);
                    self.decoded[dst] = d >> 4;
                    self.decoded[dst + 1] = d & 15;
                    2
                }
                4 | 5 => {
                    let d = self.chars[xi + 3];
                    let table = if c >= 0x80 { &EXPAND_160_ALT } else { &EXPAND_160 };
                    self.decoded[dst] = table[usize::from(d >> 4)];
                    self.decoded[dst + 1] = table[usize::from(d & 15)];
                    2
                }
                6 | 7 => {
                    let d = self.chars[xi + 3];
                    let table = &EXPAND_MODE6[usize::from(c >> 6)];
                    self.decoded[dst..dst + 2].copy_from_slice(&table[usize::from(d >> 4)].to_le_bytes());
                    self.decoded[dst + 2..dst + 4].copy_from_slice(&table[usize::from(d & 15)].to_le_bytes());
                    4
                }
                8 | 9 => {
                    let table = if params.mode == 8 { &EXPAND_MODE8 } else { &EXPAND_MODE9 };
                    self.decoded[dst..dst + 4].copy_from_slice(&table[usize::from(c >> 4)].to_le_bytes());
                    self.decoded[dst + 4..dst + 8].copy_from_slice(&table[usize::from(c & 15)].to_le_bytes());
                    8
                }
                10..=12 => {
                    let table = if params.mode == 10 { &EXPAND_MODE_A } else { &EXPAND_MODE_B };
                    self.decoded[dst..dst + 2].copy_from_slice(&table[usize::from(c >> 4)].to_le_bytes());
                    self.decoded[dst + 2..dst + 4].copy_from_slice(&table[usize::from(c & 15)].to_le_bytes());
                    4
                }
                13 | 14 => {
                    self.decoded[dst] = EXPAND_160[usize::from(c >> 4)];
                    self.decoded[dst + 1] = EXPAND_160[usize::from(c & 15)];
                    2
                }
                15 => {
                    self.decoded[dst] = c >> 4;
                    self.decoded[dst + 1] = c & 15;
                    2
                }
                // Blank and jump lines never open a DMA window.
                _ => break,
            };
            x += step;
        }

        self.decode_counter = x as u32;
    }

    /// Inverse video and blink for the hires text modes.
    fn masked_glyph(&self, name: u8, glyph: u8, params: &DecodeParams) -> u8 {
        let himask = if name & 0x80 != 0 { 0xFF } else { 0x00 };
        let inv = himask & params.char_invert;
        (glyph & (!himask | params.char_blink)) ^ inv
    }

    /// First position whose decoded byte is not ready yet. Once decode has
    /// passed the DMA window the whole line is ready.
    fn decoded_until(&self, mode: u8) -> u32 {
        if self.decode_counter >= self.timing.dma_end {
            return DECODE_LEN as u32;
        }
        let delay = if mode < 8 { TEXT_DECODE_DELAY } else { GRAPHICS_DECODE_DELAY };
        self.decode_counter + delay as u32
    }

    /// Push decoded bytes to the sink up to `clock + offset + 1`, clipped to
    /// the display window and to what has been decoded. `params` of `None`
    /// sends background instead.
    pub fn emit(
        &mut self,
        clock: u32,
        offset: i32,
        push: PushMode,
        params: Option<&DecodeParams>,
        sink: &mut impl DisplaySink,
    ) {
        let mut limit = (clock as i32 + offset + 1).clamp(0, self.timing.display_end as i32) as u32;
        if let Some(params) = params {
            limit = limit.min(self.decoded_until(params.mode));
        }
        let start = self.display_counter;
        if start >= limit {
            return;
        }

        let mut out = [0u8; LINE_BUFFER_LEN];
        let count = (limit - start) as usize;
        let hires = matches!(push, PushMode::Hires);

        if params.is_some() {
            for (i, slot) in out[..count].iter_mut().enumerate() {
                let x = start as usize + i;
                let b = self.decoded[x];
                *slot = if self.hscroll_delay {
                    let a = self.decoded[x - 1];
                    if hires {
                        ((a << 2) | (b >> 2)) & 15
                    } else {
                        (a << 4) | (b >> 4)
                    }
                } else {
                    b
                };
            }
        }

        if hires {
            sink.update_playfield_hires(start, &out[..count]);
        } else {
            sink.update_playfield_lores(start, &out[..count]);
        }

        self.display_counter = limit;
    }
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new()
    }
}
