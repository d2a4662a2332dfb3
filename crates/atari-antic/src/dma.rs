//! DMA pattern generator.
//!
//! Classifies every clock of a scanline by who owns the bus. The table only
//! depends on a handful of inputs (window, mode, DMA flags), so it is cached
//! under a key and regenerated when the key changes. The cycle stepper then
//! does a single lookup per clock.

use crate::display_list::mode_spec;
use crate::timing::{
    DL_ADDRESS_HIGH_CYCLE, DL_ADDRESS_LOW_CYCLE, DMA_LIMIT_CYCLE, LINE_END_CYCLE,
    MISSILE_DMA_CYCLE, PATTERN_LEN, PLAYER_DMA_FIRST_CYCLE, PLAYER_DMA_LAST_CYCLE,
    REFRESH_LIMIT_CYCLE, ROW_BOUNDARY_CYCLE,
};

/// Clocks between a playfield name fetch and the matching glyph fetch.
pub const CHAR_FETCH_LAG: u32 = 3;

/// First clock of the memory refresh cadence.
const REFRESH_FIRST_CYCLE: u32 = 25;
/// Refresh requests are raised every 4 clocks.
const REFRESH_INTERVAL: u32 = 4;
/// Nine refresh requests per scanline.
const REFRESH_COUNT: u32 = 9;

/// Bus owner for one clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotKind {
    #[default]
    Idle,
    Refresh,
    /// Playfield data fetch.
    Playfield,
    /// Past the DMA limit: the fetch pointer advances but no bus cycle runs.
    PlayfieldVirtual,
    /// Glyph fetch for a text mode.
    Character,
    /// Fixed display list slot; the fixed-cycle logic decides whether it runs.
    DisplayList,
    /// Fixed player/missile slot; the fixed-cycle logic decides whether it runs.
    Sprite,
}

impl SlotKind {
    /// Slots whose bus use is fixed by the pattern alone.
    #[must_use]
    pub const fn occupies_bus(self) -> bool {
        matches!(
            self,
            SlotKind::Refresh | SlotKind::Playfield | SlotKind::Character
        )
    }
}

/// Inputs the pattern is generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternKey {
    pub dma_start: u32,
    pub dma_end: u32,
    pub dma_virtual_end: u32,
    pub mode: u8,
    /// Playfield data DMA runs on this scanline (first row of a mode line).
    pub active: bool,
    /// DMACTL selects a non-zero playfield width.
    pub enabled: bool,
}

/// Cached per-clock bus classification.
#[derive(Debug, Clone)]
pub struct DmaPattern {
    slots: [SlotKind; PATTERN_LEN],
    key: Option<PatternKey>,
}

impl DmaPattern {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [SlotKind::Idle; PATTERN_LEN],
            key: None,
        }
    }

    #[must_use]
    pub fn slot(&self, x: u32) -> SlotKind {
        self.slots.get(x as usize).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn slots(&self) -> &[SlotKind; PATTERN_LEN] {
        &self.slots
    }

    #[must_use]
    pub fn key(&self) -> Option<PatternKey> {
        self.key
    }

    /// Forget the cached key so the next update regenerates the table.
    pub fn invalidate(&mut self) {
        self.key = None;
    }

    /// Number of clocks of a given kind.
    #[must_use]
    pub fn count(&self, kind: SlotKind) -> usize {
        self.slots.iter().filter(|&&s| s == kind).count()
    }

    /// Real plus virtual playfield fetches: how far the fetch pointer moves.
    #[must_use]
    pub fn fetch_count(&self) -> u32 {
        (self.count(SlotKind::Playfield) + self.count(SlotKind::PlayfieldVirtual)) as u32
    }

    /// Regenerate the table if `key` differs from the cached one.
    /// Returns true when the table was rebuilt.
    pub fn update(&mut self, key: PatternKey) -> bool {
        if self.key == Some(key) {
            return false;
        }
        self.key = Some(key);
        self.slots = [SlotKind::Idle; PATTERN_LEN];

        let spec = mode_spec(key.mode);
        if key.enabled && key.mode >= 2 && key.dma_virtual_end > key.dma_start {
            let stride = spec.stride as usize;

            let virtual_end = key.dma_virtual_end.min(LINE_END_CYCLE);
            if key.active {
                for x in (key.dma_start..virtual_end).step_by(stride) {
                    self.slots[x as usize] = if x < key.dma_end {
                        SlotKind::Playfield
                    } else {
                        SlotKind::PlayfieldVirtual
                    };
                }
            }

            // Glyph fetches run on every row of a text mode line, reading the
            // names fetched on the first row.
            if spec.text {
                let end = (virtual_end + CHAR_FETCH_LAG).min(DMA_LIMIT_CYCLE);
                for x in (key.dma_start + CHAR_FETCH_LAG..end).step_by(stride) {
                    self.slots[x as usize] = SlotKind::Character;
                }
            }
        }

        self.place_refresh();

        self.slots[MISSILE_DMA_CYCLE as usize] = SlotKind::Sprite;
        self.slots[ROW_BOUNDARY_CYCLE as usize] = SlotKind::DisplayList;
        for x in PLAYER_DMA_FIRST_CYCLE..=PLAYER_DMA_LAST_CYCLE {
            self.slots[x as usize] = SlotKind::Sprite;
        }
        self.slots[DL_ADDRESS_LOW_CYCLE as usize] = SlotKind::DisplayList;
        self.slots[DL_ADDRESS_HIGH_CYCLE as usize] = SlotKind::DisplayList;

        true
    }

    /// Refresh wants a slot every 4 clocks from 25. A request that collides
    /// with playfield DMA slides to the next free clock; a request still
    /// unserved when the next one is due, or by clock 107, is dropped.
    fn place_refresh(&mut self) {
        let mut next_free = REFRESH_FIRST_CYCLE - 1;
        for n in 0..REFRESH_COUNT {
            let due = REFRESH_FIRST_CYCLE + n * REFRESH_INTERVAL;
            if next_free >= due {
                continue;
            }

            next_free = due;
            while next_free < REFRESH_LIMIT_CYCLE {
                let x = next_free as usize;
                next_free += 1;
                if self.slots[x] == SlotKind::Idle {
                    self.slots[x] = SlotKind::Refresh;
                    break;
                }
            }
        }
    }
}

impl Default for DmaPattern {
    fn default() -> Self {
        Self::new()
    }
}
