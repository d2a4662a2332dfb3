//! Beam counters and WSYNC halt timing.

mod common;

use atari_antic::registers::{DMACTL, WSYNC};
use atari_antic::{Antic, CLOCKS_PER_LINE, VideoStandard, WsyncState};
use common::{TestHost, run_to, step};

fn expected_position(n: u64, lines: u64) -> (u32, u32, u32) {
    let per_line = u64::from(CLOCKS_PER_LINE);
    let clock = n % per_line;
    let scanline = (n / per_line) % lines;
    let frame = n / (per_line * lines);
    (frame as u32, scanline as u32, clock as u32)
}

#[test]
fn beam_follows_clock_count() {
    for standard in [VideoStandard::Ntsc, VideoStandard::Pal] {
        let lines = u64::from(standard.lines_per_frame());
        let mut antic = Antic::new(standard);
        let mut host = TestHost::new();

        let checkpoints = [1, 113, 114, 115, 114 * lines - 1, 114 * lines, 114 * lines * 2 + 5000];
        let mut done = 0u64;
        for n in checkpoints {
            while done < n {
                step(&mut antic, &mut host);
                done += 1;
            }
            let (frame, scanline, clock) = expected_position(n, lines);
            assert_eq!(
                (antic.frame_counter(), antic.scanline(), antic.clock()),
                (frame, scanline, clock),
                "{standard:?} after {n} clocks"
            );
        }
    }
}

#[test]
fn frame_end_is_reported_once_per_frame() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    for _ in 0..114 * 262 * 3 {
        step(&mut antic, &mut host);
    }
    let frames = host
        .events
        .iter()
        .filter(|e| matches!(e, common::SinkEvent::EndFrame))
        .count();
    assert_eq!(frames, 3);
    assert_eq!(antic.frame_counter(), 3);
}

#[test]
fn wsync_halts_until_clock_105() {
    for x in [10, 50, 100, 104] {
        let mut antic = Antic::default();
        let mut host = TestHost::new();
        run_to(&mut antic, &mut host, 20, x);
        antic.write_register(WSYNC, 0, &mut host);
        assert_eq!(antic.wsync_state(), WsyncState::PendingFirstCycle);

        run_to(&mut antic, &mut host, 21, 0);
        assert_eq!(
            antic.halted_cycle_count(),
            u64::from(105 - x),
            "WSYNC written at clock {x}"
        );
        assert_eq!(antic.wsync_state(), WsyncState::Released);
    }
}

#[test]
fn halted_clocks_report_busy() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    run_to(&mut antic, &mut host, 30, 60);
    antic.write_register(WSYNC, 0, &mut host);

    let mut busy = 0;
    while antic.scanline() == 30 {
        if step(&mut antic, &mut host) && antic.scanline() == 30 {
            busy += 1;
        }
    }
    // Refresh slots all fall before clock 61: only the halt remains.
    assert_eq!(busy, 45);
}

#[test]
fn wsync_assert_waits_out_cpu_writes() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    run_to(&mut antic, &mut host, 20, 50);
    host.next_write = true;
    antic.write_register(WSYNC, 0, &mut host);
    for _ in 0..3 {
        step(&mut antic, &mut host);
    }
    assert_eq!(antic.halted_cycle_count(), 0);
    assert!(!antic.is_cpu_halted());

    host.next_write = false;
    run_to(&mut antic, &mut host, 21, 0);
    assert_eq!(antic.halted_cycle_count(), 105 - 53);
}

#[test]
fn wsync_on_last_halted_clock_holds_another_line() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    run_to(&mut antic, &mut host, 20, 50);
    antic.write_register(WSYNC, 0, &mut host);
    run_to(&mut antic, &mut host, 20, 104);
    assert!(antic.is_cpu_halted());
    antic.write_register(WSYNC, 0, &mut host);

    run_to(&mut antic, &mut host, 22, 0);
    assert_eq!(antic.halted_cycle_count(), 55 + 114);
}

#[test]
fn second_write_while_pending_is_ignored() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    run_to(&mut antic, &mut host, 20, 40);
    antic.write_register(WSYNC, 0, &mut host);
    antic.write_register(WSYNC, 0, &mut host);
    assert_eq!(host.sched.pending(), 1);
    run_to(&mut antic, &mut host, 21, 0);
    assert_eq!(antic.halted_cycle_count(), 65);
}

#[test]
fn dma_does_not_count_as_halt() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    // Player/missile DMA only: sprite slots are busy but the CPU is not halted.
    antic.write_register(DMACTL, 0x0C, &mut host);
    run_to(&mut antic, &mut host, 40, 10);
    assert_eq!(antic.halted_cycle_count(), 0);
}
