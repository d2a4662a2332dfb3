//! Beam clock: the (frame, scanline, clock) position every other unit reads.

use serde::{Deserialize, Serialize};

/// Machine clocks per scanline.
pub const CLOCKS_PER_LINE: u32 = 114;
/// Scanlines per NTSC frame.
pub const NTSC_LINES_PER_FRAME: u32 = 262;
/// Scanlines per PAL frame.
pub const PAL_LINES_PER_FRAME: u32 = 312;

/// Video standard. Selects the frame height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoStandard {
    #[default]
    Ntsc,
    Pal,
}

impl VideoStandard {
    /// Scanlines per frame for this standard.
    #[must_use]
    pub const fn lines_per_frame(self) -> u32 {
        match self {
            VideoStandard::Ntsc => NTSC_LINES_PER_FRAME,
            VideoStandard::Pal => PAL_LINES_PER_FRAME,
        }
    }

    #[must_use]
    pub fn from_lines_per_frame(lines: u32) -> Self {
        if lines == PAL_LINES_PER_FRAME {
            VideoStandard::Pal
        } else {
            VideoStandard::Ntsc
        }
    }
}

/// What happened when the beam moved by one clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamStep {
    /// Still inside the same scanline.
    Clock,
    /// Wrapped into a new scanline of the same frame.
    Scanline,
    /// Wrapped into scanline 0 of a new frame.
    Frame,
}

/// Raster position. Only moves forward, one clock at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamPosition {
    pub frame: u32,
    pub scanline: u32,
    pub clock: u32,
    scanline_limit: u32,
}

impl BeamPosition {
    #[must_use]
    pub const fn new(standard: VideoStandard) -> Self {
        Self {
            frame: 0,
            scanline: 0,
            clock: 0,
            scanline_limit: standard.lines_per_frame(),
        }
    }

    #[must_use]
    pub const fn scanline_limit(&self) -> u32 {
        self.scanline_limit
    }

    /// Change the frame height. A beam already past the new limit wraps at
    /// the end of its current scanline.
    pub fn set_standard(&mut self, standard: VideoStandard) {
        self.scanline_limit = standard.lines_per_frame();
    }

    /// Move the beam forward by one clock.
    pub fn step(&mut self) -> BeamStep {
        self.clock += 1;
        if self.clock < CLOCKS_PER_LINE {
            return BeamStep::Clock;
        }

        self.clock = 0;
        self.scanline += 1;
        if self.scanline < self.scanline_limit {
            return BeamStep::Scanline;
        }

        self.scanline = 0;
        self.frame = self.frame.wrapping_add(1);
        BeamStep::Frame
    }

    /// Packed position: `frame << 20 | scanline << 8 | clock`.
    #[must_use]
    pub const fn timestamp(&self) -> u32 {
        (self.frame << 20)
            .wrapping_add(self.scanline << 8)
            .wrapping_add(self.clock)
    }

    /// Pull out-of-range counters back into range after a state load.
    /// Returns true if anything had to change.
    pub fn clamp(&mut self) -> bool {
        let mut repaired = false;
        if self.scanline_limit != NTSC_LINES_PER_FRAME && self.scanline_limit != PAL_LINES_PER_FRAME
        {
            self.scanline_limit = NTSC_LINES_PER_FRAME;
            repaired = true;
        }
        if self.clock >= CLOCKS_PER_LINE {
            self.clock = CLOCKS_PER_LINE - 1;
            repaired = true;
        }
        if self.scanline >= self.scanline_limit {
            self.scanline = self.scanline_limit - 1;
            repaired = true;
        }
        repaired
    }
}

impl Default for BeamPosition {
    fn default() -> Self {
        Self::new(VideoStandard::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beam_arithmetic_matches_clock_count() {
        for standard in [VideoStandard::Ntsc, VideoStandard::Pal] {
            let mut beam = BeamPosition::new(standard);
            let limit = standard.lines_per_frame();
            let total = u64::from(CLOCKS_PER_LINE * limit) * 2 + 777;
            for n in 1..=total {
                beam.step();
                if n % 9973 == 0 || n == total {
                    assert_eq!(u64::from(beam.clock), n % 114);
                    assert_eq!(u64::from(beam.scanline), (n / 114) % u64::from(limit));
                    assert_eq!(u64::from(beam.frame), n / (114 * u64::from(limit)));
                }
            }
        }
    }

    #[test]
    fn step_reports_wraps() {
        let mut beam = BeamPosition::new(VideoStandard::Ntsc);
        beam.clock = 112;
        assert_eq!(beam.step(), BeamStep::Clock);
        assert_eq!(beam.step(), BeamStep::Scanline);
        assert_eq!(beam.scanline, 1);

        beam.scanline = 261;
        beam.clock = 113;
        assert_eq!(beam.step(), BeamStep::Frame);
        assert_eq!((beam.frame, beam.scanline, beam.clock), (1, 0, 0));
    }

    #[test]
    fn timestamp_packs_fields() {
        let mut beam = BeamPosition::new(VideoStandard::Pal);
        beam.frame = 3;
        beam.scanline = 300;
        beam.clock = 17;
        assert_eq!(beam.timestamp(), (3 << 20) + (300 << 8) + 17);
    }

    #[test]
    fn clamp_repairs_out_of_range_counters() {
        let mut beam = BeamPosition::new(VideoStandard::Ntsc);
        beam.clock = 500;
        beam.scanline = 400;
        assert!(beam.clamp());
        assert_eq!(beam.clock, 113);
        assert_eq!(beam.scanline, 261);
        assert!(!beam.clamp());
    }
}
