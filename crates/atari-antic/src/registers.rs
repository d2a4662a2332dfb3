//! ANTIC register block.
//!
//! # Registers ($D400-$D40F, mirrored every 16 bytes)
//!
//! | Reg | Write  | Read   | Description                              |
//! |-----|--------|--------|------------------------------------------|
//! | $0  | DMACTL |        | DMA control (width, P/M, DL DMA)         |
//! | $1  | CHACTL |        | Character control (blank, invert, flip)  |
//! | $2  | DLISTL |        | Display list pointer low                 |
//! | $3  | DLISTH |        | Display list pointer high                |
//! | $4  | HSCROL |        | Horizontal fine scroll (0-15)            |
//! | $5  | VSCROL |        | Vertical fine scroll (0-15)              |
//! | $7  | PMBASE |        | Player/missile base page                 |
//! | $9  | CHBASE |        | Character set base page                  |
//! | $A  | WSYNC  |        | Halt CPU until horizontal sync           |
//! | $B  |        | VCOUNT | Scanline / 2                             |
//! | $C  |        | PENH   | Light pen horizontal latch               |
//! | $D  |        | PENV   | Light pen vertical latch                 |
//! | $E  | NMIEN  |        | NMI enable (7 = DLI, 6 = VBI)            |
//! | $F  | NMIRES | NMIST  | NMI status / reset                       |

use serde::{Deserialize, Serialize};

pub const DMACTL: u8 = 0x00;
pub const CHACTL: u8 = 0x01;
pub const DLISTL: u8 = 0x02;
pub const DLISTH: u8 = 0x03;
pub const HSCROL: u8 = 0x04;
pub const VSCROL: u8 = 0x05;
pub const PMBASE: u8 = 0x07;
pub const CHBASE: u8 = 0x09;
pub const WSYNC: u8 = 0x0A;
pub const VCOUNT: u8 = 0x0B;
pub const PENH: u8 = 0x0C;
pub const PENV: u8 = 0x0D;
pub const NMIEN: u8 = 0x0E;
pub const NMIRES: u8 = 0x0F;
pub const NMIST: u8 = 0x0F;

/// DMACTL bits.
pub const DMACTL_WIDTH_MASK: u8 = 0x03;
pub const DMACTL_MISSILE_DMA: u8 = 0x04;
pub const DMACTL_PLAYER_DMA: u8 = 0x08;
pub const DMACTL_SINGLE_LINE_PM: u8 = 0x10;
pub const DMACTL_DL_DMA: u8 = 0x20;

/// CHACTL bits.
pub const CHACTL_BLANK: u8 = 0x01;
pub const CHACTL_INVERT: u8 = 0x02;
pub const CHACTL_REFLECT: u8 = 0x04;

/// NMIEN/NMIST bits.
pub const NMI_DLI: u8 = 0x80;
pub const NMI_VBI: u8 = 0x40;
pub const NMI_RESET_KEY: u8 = 0x20;
/// NMIST after NMIRES: unused low bits read back as 1.
pub const NMIST_IDLE: u8 = 0x1F;

/// Playfield width class selected by DMACTL bits 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum PlayfieldWidth {
    Disabled,
    #[default]
    Narrow,
    Normal,
    Wide,
}

impl PlayfieldWidth {
    #[must_use]
    pub const fn from_dmactl(dmactl: u8) -> Self {
        match dmactl & DMACTL_WIDTH_MASK {
            0 => PlayfieldWidth::Disabled,
            1 => PlayfieldWidth::Narrow,
            2 => PlayfieldWidth::Normal,
            _ => PlayfieldWidth::Wide,
        }
    }

    /// One class wider, as used by horizontally scrolled fetches.
    #[must_use]
    pub const fn widened(self) -> Self {
        match self {
            PlayfieldWidth::Disabled => PlayfieldWidth::Disabled,
            PlayfieldWidth::Narrow => PlayfieldWidth::Normal,
            PlayfieldWidth::Normal | PlayfieldWidth::Wide => PlayfieldWidth::Wide,
        }
    }

    /// Clocks covered by the DMA window.
    #[must_use]
    pub const fn dma_clocks(self) -> u32 {
        match self {
            PlayfieldWidth::Disabled => 0,
            PlayfieldWidth::Narrow => 64,
            PlayfieldWidth::Normal => 80,
            PlayfieldWidth::Wide => 96,
        }
    }

    /// Display window `[start, end)` in clocks, `None` when disabled.
    #[must_use]
    pub const fn display_window(self) -> Option<(u32, u32)> {
        match self {
            PlayfieldWidth::Disabled => None,
            PlayfieldWidth::Narrow => Some((32, 96)),
            PlayfieldWidth::Normal => Some((24, 104)),
            PlayfieldWidth::Wide => Some((22, 110)),
        }
    }
}

/// Raw register values plus the VCOUNT and light pen latches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipRegisters {
    pub dmactl: u8,
    pub chactl: u8,
    pub dlist: u16,
    pub hscrol: u8,
    pub vscrol: u8,
    pub pmbase: u8,
    pub chbase: u8,
    pub nmien: u8,
    pub nmist: u8,
    pub vcount: u8,
    #[serde(default)]
    pub penh: u8,
    #[serde(default)]
    pub penv: u8,
}

impl ChipRegisters {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dmactl: 0,
            chactl: 0,
            dlist: 0,
            hscrol: 0,
            vscrol: 0,
            pmbase: 0,
            chbase: 0,
            nmien: 0,
            nmist: NMIST_IDLE,
            vcount: 0,
            penh: 0,
            penv: 0,
        }
    }

    #[must_use]
    pub const fn playfield_width(&self) -> PlayfieldWidth {
        PlayfieldWidth::from_dmactl(self.dmactl)
    }

    #[must_use]
    pub const fn dl_dma_enabled(&self) -> bool {
        self.dmactl & DMACTL_DL_DMA != 0
    }

    /// Player DMA also forces missile DMA.
    #[must_use]
    pub const fn missile_dma_enabled(&self) -> bool {
        self.dmactl & (DMACTL_MISSILE_DMA | DMACTL_PLAYER_DMA) != 0
    }

    #[must_use]
    pub const fn player_dma_enabled(&self) -> bool {
        self.dmactl & DMACTL_PLAYER_DMA != 0
    }

    #[must_use]
    pub const fn single_line_pm(&self) -> bool {
        self.dmactl & DMACTL_SINGLE_LINE_PM != 0
    }

    /// Mask XORed into inverse-video glyph rows.
    #[must_use]
    pub const fn char_invert_mask(&self) -> u8 {
        if self.chactl & CHACTL_INVERT != 0 { 0xFF } else { 0x00 }
    }

    /// Mask ANDed into inverse-video glyph rows (blink blanks them).
    #[must_use]
    pub const fn char_blink_mask(&self) -> u8 {
        if self.chactl & CHACTL_BLANK != 0 { 0x00 } else { 0xFF }
    }

    /// Row XOR applied by vertical reflect.
    #[must_use]
    pub const fn char_reflect(&self) -> u32 {
        if self.chactl & CHACTL_REFLECT != 0 { 7 } else { 0 }
    }

    /// 1K aligned character base for 40-column text modes.
    #[must_use]
    pub const fn char_base_1k(&self) -> u16 {
        ((self.chbase & 0xFC) as u16) << 8
    }

    /// 512-byte aligned character base for 20-column text modes.
    #[must_use]
    pub const fn char_base_512(&self) -> u16 {
        ((self.chbase & 0xFE) as u16) << 8
    }

    /// Pack HSCROL/VSCROL the way the display list history stores them.
    #[must_use]
    pub const fn packed_scroll(&self) -> u8 {
        (self.hscrol & 0x0F) | (self.vscrol << 4)
    }
}

impl Default for ChipRegisters {
    fn default() -> Self {
        Self::new()
    }
}
