//! Display list driven scenarios: DLIs, text decode, mid-line DMACTL and
//! deferred CHBASE writes.

mod common;

use atari_antic::registers::{CHACTL, CHBASE, DMACTL, NMI_DLI, NMIEN, NMIST, NMIST_IDLE};
use atari_antic::{Antic, DlState, SlotKind};
use common::{TestHost, point_display_list, run_to, step, text_display_list};

const SCREEN: u16 = 0x3000;
const CHARSET: u16 = 0xE000;

/// Mode 2 screen at `$3000`: codes 1 and `$81` alternating, glyph row 0 of
/// code 1 is `$A5`.
fn text_screen(antic: &mut Antic, host: &mut TestHost, dli: bool) {
    text_display_list(host, dli);
    point_display_list(antic, host, 0x2000);
    let names: Vec<u8> = (0..40).map(|i| if i % 2 == 0 { 0x01 } else { 0x81 }).collect();
    host.load(SCREEN, &names);
    host.ram[usize::from(CHARSET) + 8] = 0xA5;
    antic.write_register(CHBASE, (CHARSET >> 8) as u8, host);
    antic.write_register(DMACTL, 0x22, host);
}

/// Steps through `frames` frames, recording where each NMI landed.
fn nmi_positions(antic: &mut Antic, host: &mut TestHost, frames: u32) -> Vec<(u32, u32)> {
    let mut positions = Vec::new();
    let end = antic.frame_counter() + frames;
    while antic.frame_counter() < end {
        let before = host.nmis;
        step(antic, host);
        if host.nmis != before {
            positions.push((antic.scanline(), antic.clock()));
        }
    }
    positions
}

#[test]
fn dli_fires_on_the_last_row_of_the_mode_line() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    text_screen(&mut antic, &mut host, true);
    antic.write_register(NMIEN, NMI_DLI, &mut host);

    let positions = nmi_positions(&mut antic, &mut host, 2);
    assert_eq!(positions, vec![(15, 8), (15, 8)]);
}

#[test]
fn dli_enabled_after_the_early_sample_fires_a_clock_late() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    text_screen(&mut antic, &mut host, true);

    run_to(&mut antic, &mut host, 15, 7);
    antic.write_register(NMIEN, NMI_DLI, &mut host);
    step(&mut antic, &mut host);
    assert_eq!(host.nmis, 0);
    assert_eq!(antic.read_register(NMIST), NMIST_IDLE | NMI_DLI);
    step(&mut antic, &mut host);
    assert_eq!((host.nmis, antic.clock()), (1, 9));
}

#[test]
fn dli_enabled_before_the_early_sample_fires_on_the_latch() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    text_screen(&mut antic, &mut host, true);

    run_to(&mut antic, &mut host, 15, 6);
    antic.write_register(NMIEN, NMI_DLI, &mut host);
    step(&mut antic, &mut host);
    assert_eq!(host.nmis, 0);
    step(&mut antic, &mut host);
    assert_eq!((host.nmis, antic.clock()), (1, 8));
}

#[test]
fn disabled_dli_still_sets_status() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    text_screen(&mut antic, &mut host, true);
    run_to(&mut antic, &mut host, 16, 0);
    assert_eq!(host.nmis, 0);
    assert_eq!(antic.read_register(NMIST) & NMI_DLI, NMI_DLI);
}

#[test]
fn jvb_parks_the_display_list_until_next_frame() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    text_screen(&mut antic, &mut host, false);

    run_to(&mut antic, &mut host, 16, 8);
    assert_eq!(antic.dl_state(), DlState::Idle);
    assert_eq!(antic.display_list_pointer(), 0x2000);

    let history = antic.dl_history();
    assert!(history[8].valid);
    assert_eq!(history[8].control, 0x42);
    assert_eq!(history[8].pf_address, SCREEN);
    assert_eq!(history[16].control, 0x41);

    run_to(&mut antic, &mut host, 100, 0);
    assert!(!antic.dl_history()[99].valid);
}

#[test]
fn dli_on_jvb_repeats_every_line_until_vertical_blank() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    host.load(0x2000, &[0x42, 0x00, 0x30, 0xC1, 0x00, 0x20]);
    point_display_list(&mut antic, &mut host, 0x2000);
    antic.write_register(DMACTL, 0x22, &mut host);
    antic.write_register(NMIEN, NMI_DLI, &mut host);

    let positions = nmi_positions(&mut antic, &mut host, 1);
    let expected: Vec<(u32, u32)> = (16..248).map(|y| (y, 8)).collect();
    assert_eq!(positions, expected);
}

#[test]
fn dl_dma_off_repeats_the_last_instruction() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    host.load(0x2000, &[0x4F, 0x00, 0x30, 0x0F, 0x0F, 0x41, 0x00, 0x20]);
    point_display_list(&mut antic, &mut host, 0x2000);
    antic.write_register(DMACTL, 0x22, &mut host);

    run_to(&mut antic, &mut host, 9, 20);
    antic.write_register(DMACTL, 0x02, &mut host);
    run_to(&mut antic, &mut host, 11, 112);

    assert_eq!(antic.mode_line().mode(), 0x0F);
    assert_eq!(antic.display_list_pointer(), 0x2004);
    assert_eq!(antic.playfield_address(), SCREEN + 4 * 40);
    let history = antic.dl_history();
    assert_eq!(history[10].control, 0x0F);
    assert_eq!(history[11].control, 0x0F);
}

#[test]
fn composer_ahead_of_the_beam_waits_for_fetched_bytes() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    host.load(0x2000, &[0x4F, 0x00, 0x30, 0x41, 0x00, 0x20]);
    point_display_list(&mut antic, &mut host, 0x2000);
    host.load(SCREEN, &[0xFF; 40]);
    antic.write_register(DMACTL, 0x22, &mut host);

    run_to(&mut antic, &mut host, 8, 40);
    antic.sync_with_display(20, &mut host);
    run_to(&mut antic, &mut host, 9, 0);

    let (x, pixels) = host.hires_on_line(8).expect("line 8 has hi-res output");
    assert_eq!(x, 24);
    assert_eq!(pixels, vec![0x0F; 80]);
}

#[test]
fn fetch_slots_report_a_busy_bus() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    text_screen(&mut antic, &mut host, false);

    run_to(&mut antic, &mut host, 8, 17);
    assert!(step(&mut antic, &mut host), "name fetch on clock 18");
    run_to(&mut antic, &mut host, 8, 20);
    assert!(step(&mut antic, &mut host), "glyph fetch on clock 21");
    run_to(&mut antic, &mut host, 8, 107);
    assert!(!step(&mut antic, &mut host), "nothing on clock 108");
}

fn line_8_pixels(chactl: u8) -> Vec<u8> {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    text_screen(&mut antic, &mut host, false);
    antic.write_register(CHACTL, chactl, &mut host);
    run_to(&mut antic, &mut host, 9, 0);

    let (x, pixels) = host.hires_on_line(8).expect("line 8 has hi-res output");
    assert_eq!(x, 24);
    assert_eq!(pixels.len(), 80);
    pixels
}

fn repeat_pairs(normal: [u8; 2], inverse: [u8; 2]) -> Vec<u8> {
    (0..20).flat_map(|_| normal.into_iter().chain(inverse)).collect()
}

#[test]
fn text_line_decodes_forty_characters() {
    assert_eq!(line_8_pixels(0x00), repeat_pairs([0xA, 0x5], [0xA, 0x5]));
}

#[test]
fn inverse_characters_follow_chactl() {
    assert_eq!(line_8_pixels(0x02), repeat_pairs([0xA, 0x5], [0x5, 0xA]));
    assert_eq!(line_8_pixels(0x01), repeat_pairs([0xA, 0x5], [0x0, 0x0]));
    assert_eq!(line_8_pixels(0x03), repeat_pairs([0xA, 0x5], [0xF, 0xF]));
}

#[test]
fn text_line_steals_name_and_glyph_cycles() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    text_screen(&mut antic, &mut host, false);
    run_to(&mut antic, &mut host, 8, 10);

    let pattern = antic.dma_pattern();
    assert_eq!(pattern.count(SlotKind::Playfield), 40);
    assert_eq!(pattern.count(SlotKind::Character), 40);
    assert_eq!(pattern.slot(18), SlotKind::Playfield);
    assert_eq!(pattern.slot(21), SlotKind::Character);

    // Later rows of the same mode line only fetch glyphs.
    run_to(&mut antic, &mut host, 9, 10);
    let pattern = antic.dma_pattern();
    assert_eq!(pattern.count(SlotKind::Playfield), 0);
    assert_eq!(pattern.count(SlotKind::Character), 40);
}

#[test]
fn playfield_pointer_advances_once_per_mode_line() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    text_screen(&mut antic, &mut host, false);
    run_to(&mut antic, &mut host, 8, 112);
    assert_eq!(antic.playfield_address(), SCREEN + 40);
    run_to(&mut antic, &mut host, 15, 112);
    assert_eq!(antic.playfield_address(), SCREEN + 40);
}

#[test]
fn dmactl_write_after_dma_start_keeps_latched_start() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    text_screen(&mut antic, &mut host, false);
    antic.write_register(DMACTL, 0x21, &mut host);

    run_to(&mut antic, &mut host, 8, 30);
    assert_eq!(antic.dma_pattern().key().map(|k| k.dma_start), Some(26));
    antic.write_register(DMACTL, 0x22, &mut host);

    let key = antic.dma_pattern().key().expect("pattern built");
    assert_eq!(key.dma_start, 26);
    assert_eq!(key.dma_end, 106);
    assert!(key.enabled);
}

#[test]
fn dmactl_start_moved_behind_the_beam_is_missed() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    text_screen(&mut antic, &mut host, false);
    antic.write_register(DMACTL, 0x21, &mut host);

    run_to(&mut antic, &mut host, 8, 20);
    antic.write_register(DMACTL, 0x22, &mut host);
    let key = antic.dma_pattern().key().expect("pattern built");
    assert!(!key.enabled);
    assert_eq!(antic.dma_pattern().count(SlotKind::Playfield), 0);
}

#[test]
fn dmactl_write_before_hblank_end_applies_to_the_line() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    text_screen(&mut antic, &mut host, false);
    antic.write_register(DMACTL, 0x21, &mut host);

    run_to(&mut antic, &mut host, 8, 5);
    antic.write_register(DMACTL, 0x22, &mut host);
    run_to(&mut antic, &mut host, 8, 10);
    assert_eq!(antic.dma_pattern().key().map(|k| k.dma_start), Some(18));
}

/// Glyph address read on the clock after `steps` steps from `(8, clock)`,
/// with CHBASE rewritten at `clock`.
fn glyph_read_after_chbase_write(clock: u32, steps: usize) -> u16 {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    text_screen(&mut antic, &mut host, false);

    run_to(&mut antic, &mut host, 8, clock);
    antic.write_register(CHBASE, 0xD0, &mut host);
    host.reads.clear();
    for _ in 0..steps {
        step(&mut antic, &mut host);
    }
    *host.reads.last().expect("a DMA read happened")
}

#[test]
fn chbase_write_reaches_glyph_fetch_two_clocks_later() {
    // Glyph fetches run on odd clocks from 21.
    assert_eq!(glyph_read_after_chbase_write(40, 1), 0xE008);
    assert_eq!(glyph_read_after_chbase_write(39, 2), 0xD008);
}

#[test]
fn chactl_write_is_visible_one_clock_later() {
    let mut antic = Antic::default();
    let mut host = TestHost::new();
    run_to(&mut antic, &mut host, 30, 30);
    antic.write_register(CHACTL, 0x04, &mut host);
    assert_eq!(antic.registers().chactl, 0);
    step(&mut antic, &mut host);
    assert_eq!(antic.registers().chactl, 0x04);
}
