//! Atari ANTIC (Alphanumeric Television Interface Controller).
//!
//! ANTIC is the display list processor of the Atari 8-bit computers. It
//! walks a display list in main memory, fetches playfield, character and
//! player/missile data by DMA, halts the 6502 for WSYNC and raises the
//! display list and vertical blank NMIs. Pixels are handed to GTIA, which
//! this crate only sees through the [`DisplaySink`] trait.
//!
//! # Standalone IC
//!
//! The chip owns no memory, CPU or video output. Everything it needs from
//! the machine is borrowed per call through [`AnticHost`]: bus reads and
//! the NMI line ([`AnticBus`]), the GTIA side ([`DisplaySink`]) and a timer
//! queue ([`Scheduler`]).
//!
//! # Timing
//!
//! - 114 machine clocks per scanline (1.79 MHz)
//! - 262 scanlines per frame (NTSC) or 312 (PAL)
//! - Display list region: scanlines 8-247, vertical blank from 248
//!
//! Fixed work happens at fixed clock offsets within the line:
//!
//! | Clock   | Work                                                   |
//! |---------|--------------------------------------------------------|
//! | 0       | Missile DMA                                            |
//! | 1       | Display list instruction fetch on a row boundary       |
//! | 2-5     | Player 0-3 DMA                                         |
//! | 6, 7    | Display list operand fetch (LMS / jump address)        |
//! | 8       | DLI/VBI latch into NMIST                               |
//! | 9       | Late NMI (NMIEN written just before the latch)         |
//! | 10      | End of horizontal blank: playfield timing fixed        |
//! | 16      | Start of visible scanline                              |
//! | 105     | WSYNC release                                          |
//! | 109     | VSCROL latched for the row stop test                   |
//! | 111     | Row counter step, VCOUNT update                        |
//!
//! Everything else is read from a per-line DMA slot pattern (playfield,
//! character, refresh), rebuilt only when the line's parameters change.
//!
//! # Driving the chip
//!
//! Per machine clock the host advances its scheduler, delivers due events
//! through [`Antic::on_scheduled_event`], then calls [`Antic::advance`].
//! A `true` return means ANTIC holds the bus and the CPU must skip the
//! clock. Register accesses go through [`Antic::read_register`] and
//! [`Antic::write_register`] with the low four address bits.

mod antic;
mod beam;
mod deferred;
mod display_list;
mod dma;
mod error;
mod host;
mod nmi;
mod playfield;
pub mod registers;
mod scheduler;
mod state;
pub mod timing;
mod wsync;

pub use antic::Antic;
pub use beam::{
    BeamPosition, BeamStep, CLOCKS_PER_LINE, NTSC_LINES_PER_FRAME, PAL_LINES_PER_FRAME,
    VideoStandard,
};
pub use deferred::{CHACTL_WRITE_DELAY, CHBASE_WRITE_DELAY};
pub use display_list::{DlHistoryEntry, DlState, ModeLine, ModeSpec, PushMode, mode_spec};
pub use dma::{DmaPattern, PatternKey, SlotKind};
pub use error::StateError;
pub use host::{AnticBus, AnticHost, BlankingState, DisplaySink};
pub use playfield::PlayfieldTiming;
pub use registers::{ChipRegisters, PlayfieldWidth};
pub use scheduler::{AnticEvent, EventId, EventScheduler, Scheduler};
pub use state::STATE_VERSION;
pub use wsync::WsyncState;
