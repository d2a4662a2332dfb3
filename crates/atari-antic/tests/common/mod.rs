//! Test host: flat 64K RAM, a sink that records everything ANTIC sends to
//! GTIA, and the reference event scheduler.

#![allow(dead_code)]

use atari_antic::{
    Antic, AnticBus, AnticEvent, BlankingState, DisplaySink, EventId, EventScheduler, Scheduler,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Begin(u32, bool),
    Lores(u32, Vec<u8>),
    Hires(u32, Vec<u8>),
    Player(bool, usize, u8),
    Missile(bool, u8),
    EndScanline(u8),
    EndFrame,
    Blanking(BlankingState),
    Field(bool),
}

pub struct TestHost {
    pub ram: Vec<u8>,
    pub sched: EventScheduler,
    pub events: Vec<SinkEvent>,
    pub reads: Vec<u16>,
    pub nmis: u32,
    /// Pretend the CPU's next bus cycle is a write.
    pub next_write: bool,
    pub held_value: u8,
}

impl TestHost {
    pub fn new() -> Self {
        Self {
            ram: vec![0; 0x10000],
            sched: EventScheduler::new(),
            events: Vec::new(),
            reads: Vec::new(),
            nmis: 0,
            next_write: false,
            held_value: 0,
        }
    }

    pub fn load(&mut self, addr: u16, bytes: &[u8]) {
        let start = addr as usize;
        self.ram[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Hi-res playfield bytes sent for `scanline`, with the first position.
    pub fn hires_on_line(&self, scanline: u32) -> Option<(u32, Vec<u8>)> {
        let begin = self
            .events
            .iter()
            .position(|e| matches!(e, SinkEvent::Begin(y, _) if *y == scanline))?;

        let mut first = None;
        let mut pixels = Vec::new();
        for event in &self.events[begin + 1..] {
            match event {
                SinkEvent::Hires(x, bytes) => {
                    first.get_or_insert(*x);
                    pixels.extend_from_slice(bytes);
                }
                SinkEvent::EndScanline(_) => break,
                _ => {}
            }
        }
        first.map(|x| (x, pixels))
    }
}

impl AnticBus for TestHost {
    fn read_byte(&mut self, addr: u16) -> u8 {
        self.reads.push(addr);
        self.ram[addr as usize]
    }

    fn is_next_cpu_cycle_write(&self) -> bool {
        self.next_write
    }

    fn cpu_held_cycle_value(&self) -> u8 {
        self.held_value
    }

    fn assert_nmi(&mut self) {
        self.nmis += 1;
    }
}

impl DisplaySink for TestHost {
    fn begin_scanline(&mut self, scanline: u32, hires: bool) {
        self.events.push(SinkEvent::Begin(scanline, hires));
    }

    fn update_playfield_lores(&mut self, x: u32, pixels: &[u8]) {
        self.events.push(SinkEvent::Lores(x, pixels.to_vec()));
    }

    fn update_playfield_hires(&mut self, x: u32, pixels: &[u8]) {
        self.events.push(SinkEvent::Hires(x, pixels.to_vec()));
    }

    fn update_player(&mut self, odd: bool, index: usize, data: u8) {
        self.events.push(SinkEvent::Player(odd, index, data));
    }

    fn update_missile(&mut self, odd: bool, data: u8) {
        self.events.push(SinkEvent::Missile(odd, data));
    }

    fn end_scanline(&mut self, dl_control: u8) {
        self.events.push(SinkEvent::EndScanline(dl_control));
    }

    fn end_frame(&mut self) {
        self.events.push(SinkEvent::EndFrame);
    }

    fn set_blanking_state(&mut self, state: BlankingState) {
        self.events.push(SinkEvent::Blanking(state));
    }

    fn set_field_polarity(&mut self, odd: bool) {
        self.events.push(SinkEvent::Field(odd));
    }
}

impl Scheduler for TestHost {
    fn current_tick(&self) -> u64 {
        self.sched.current_tick()
    }

    fn schedule(&mut self, delay: u32, event: AnticEvent) -> EventId {
        self.sched.schedule(delay, event)
    }

    fn cancel(&mut self, id: EventId) {
        self.sched.cancel(id);
    }
}

/// One machine clock, the way a host loop drives the chip.
pub fn step(antic: &mut Antic, host: &mut TestHost) -> bool {
    host.sched.tick();
    while let Some(event) = host.sched.pop_due() {
        antic.on_scheduled_event(event, host);
    }
    antic.advance(host)
}

/// Step until the beam has just executed `clock` of `scanline`.
pub fn run_to(antic: &mut Antic, host: &mut TestHost, scanline: u32, clock: u32) {
    while antic.scanline() != scanline || antic.clock() != clock {
        step(antic, host);
    }
}

/// Display list at `$2000`: one mode 2 line (LMS `$3000`, DLI if `dli`),
/// then JVB back to the top.
pub fn text_display_list(host: &mut TestHost, dli: bool) {
    let control = if dli { 0xC2 } else { 0x42 };
    host.load(0x2000, &[control, 0x00, 0x30, 0x41, 0x00, 0x20]);
}

pub fn point_display_list(antic: &mut Antic, host: &mut TestHost, addr: u16) {
    let [lo, hi] = addr.to_le_bytes();
    antic.write_register(atari_antic::registers::DLISTL, lo, host);
    antic.write_register(atari_antic::registers::DLISTH, hi, host);
}
