//! Capabilities ANTIC borrows from the machine it sits in.
//!
//! The chip never owns memory, the CPU or the video output. Each call to
//! [`Antic::advance`](crate::Antic::advance) borrows them through one
//! [`AnticHost`], which is any type implementing all three halves.

use serde::{Deserialize, Serialize};

use crate::scheduler::Scheduler;

/// Memory and CPU coupling.
pub trait AnticBus {
    /// DMA read from the system bus.
    fn read_byte(&mut self, addr: u16) -> u8;

    /// True if the CPU's next bus cycle is a write (RDY cannot stop it).
    fn is_next_cpu_cycle_write(&self) -> bool;

    /// Value the CPU is driving onto the bus while it is held.
    fn cpu_held_cycle_value(&self) -> u8;

    /// Pulse the CPU NMI line.
    fn assert_nmi(&mut self);
}

/// Vertical blanking state reported to the display composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlankingState {
    #[default]
    Active,
    VerticalBlank,
}

/// Display composer (GTIA side).
///
/// Playfield positions are clocks from the start of the scanline. One lores
/// byte holds two colour clocks of playfield masks, one hires byte holds
/// four hi-res pixels in its low nibble.
pub trait DisplaySink {
    fn begin_scanline(&mut self, scanline: u32, hires: bool);
    fn update_playfield_lores(&mut self, x: u32, pixels: &[u8]);
    fn update_playfield_hires(&mut self, x: u32, pixels: &[u8]);
    /// Player graphics byte. `odd` is the scanline parity of the fetch.
    fn update_player(&mut self, odd: bool, index: usize, data: u8);
    fn update_missile(&mut self, odd: bool, data: u8);
    fn end_scanline(&mut self, dl_control: u8);
    fn end_frame(&mut self);
    fn set_blanking_state(&mut self, state: BlankingState);
    fn set_field_polarity(&mut self, odd: bool);
}

/// Everything [`Antic`](crate::Antic) needs from its surroundings.
pub trait AnticHost: AnticBus + DisplaySink + Scheduler {}

impl<T: AnticBus + DisplaySink + Scheduler> AnticHost for T {}
