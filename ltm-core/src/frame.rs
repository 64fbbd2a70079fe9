//! Frame buffer layout and render operations
//!
//! The controller latches 34 usable bits per transmission and only one of
//! five segment groups can be active per latch. The frame buffer holds all
//! five groups, 5 bytes each, in wire order:
//!
//! ```text
//! group  byte0     byte1     byte2     byte3     byte4
//!   0    A0 hi     A0 lo|..  ........  ....|M..  ........
//!   1    A1 hi     A1 lo|Nn  Nn        Nn  |.M.  ........
//!   2    A2 hi     A2 lo|Nn  Nn        Nn  |..M  ........
//!   3    A3 hi     A3 lo|A5  A5        A5  |...  M.ssssss
//!   4    A4 hi     A4 lo|A6  A6        A6  |...  .Mssssss
//! ```
//!
//! `A` = alphanumeric cell, `N` = numeric cell, `M` = mux-select bit,
//! `s` = stop bits. Cells 5 and 6 reuse spare bits of groups 3 and 4; that
//! is how the display is wired, not a logical choice.

use crate::codec::{alphanum_code, numeric_code};

/// Number of multiplexed segment groups
pub const GROUP_COUNT: usize = 5;

/// Bytes per group frame
pub const GROUP_BYTES: usize = 5;

/// Number of alphanumeric cells
pub const ALPHANUM_CELLS: usize = 7;

/// Number of numeric cells
pub const NUMERIC_CELLS: usize = 4;

/// Number of data bit positions exercised by [`FrameBuffer::with_segment_lit`]
pub const SEGMENT_POSITIONS: u8 = 29;

/// Stop bits in the last byte of every group, always transmitted as zero
pub const STOP_MASK: u8 = 0x3F;

/// One group's worth of segment data, in wire order
pub type GroupFrame = [u8; GROUP_BYTES];

/// Mux-select bits identifying the active group
pub const MUX_SELECT: [GroupFrame; GROUP_COUNT] = [
    [0x00, 0x00, 0x00, 0x04, 0x00],
    [0x00, 0x00, 0x00, 0x02, 0x00],
    [0x00, 0x00, 0x00, 0x01, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x80],
    [0x00, 0x00, 0x00, 0x00, 0x40],
];

/// Bits owned by the alphanumeric region
pub const ALPHANUM_MASK: [GroupFrame; GROUP_COUNT] = [
    [0xFF, 0xFC, 0x00, 0x00, 0x00],
    [0xFF, 0xFC, 0x00, 0x00, 0x00],
    [0xFF, 0xFC, 0x00, 0x00, 0x00],
    [0xFF, 0xFF, 0xFF, 0xF0, 0x00],
    [0xFF, 0xFF, 0xFF, 0xF0, 0x00],
];

/// Bits owned by the numeric region
pub const NUMERIC_MASK: [GroupFrame; GROUP_COUNT] = [
    [0x00, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x03, 0xFF, 0xF0, 0x00],
    [0x00, 0x03, 0xFF, 0xF0, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x00],
];

/// Full display state: five group frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameBuffer {
    groups: [GroupFrame; GROUP_COUNT],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Create a blank frame buffer with every group's mux-select bits set
    pub const fn new() -> Self {
        Self { groups: MUX_SELECT }
    }

    /// Get one group's frame
    pub fn group(&self, index: usize) -> Option<&GroupFrame> {
        self.groups.get(index)
    }

    /// Get all group frames
    pub fn groups(&self) -> &[GroupFrame; GROUP_COUNT] {
        &self.groups
    }

    /// Check if no content bits are lit
    pub fn is_blank(&self) -> bool {
        self.groups
            .iter()
            .zip(MUX_SELECT.iter())
            .all(|(group, mux)| group == mux)
    }

    /// Clear both content regions
    pub fn clear_all(&mut self) {
        self.clear_alphanumeric();
        self.clear_numeric();
    }

    /// Clear the alphanumeric region, leaving every other bit alone
    pub fn clear_alphanumeric(&mut self) {
        self.clear_region(&ALPHANUM_MASK);
    }

    /// Clear the numeric region, leaving every other bit alone
    pub fn clear_numeric(&mut self) {
        self.clear_region(&NUMERIC_MASK);
    }

    fn clear_region(&mut self, mask: &[GroupFrame; GROUP_COUNT]) {
        for (group, mask) in self.groups.iter_mut().zip(mask.iter()) {
            for (byte, mask) in group.iter_mut().zip(mask.iter()) {
                *byte &= !mask;
            }
        }
    }

    /// Render text into the alphanumeric region
    ///
    /// Only the first [`ALPHANUM_CELLS`] characters are shown. An empty
    /// string leaves the region blank.
    pub fn render_alphanumeric(&mut self, text: &str) {
        self.clear_alphanumeric();

        for (cell, c) in text.chars().take(ALPHANUM_CELLS).enumerate() {
            let code = alphanum_code(c);

            if cell < GROUP_COUNT {
                let group = &mut self.groups[cell];
                group[0] |= (code >> 8) as u8;
                group[1] |= (code & 0x00FC) as u8;
            } else {
                let group = &mut self.groups[cell - 2];
                group[1] |= ((code & 0xC000) >> 14) as u8;
                group[2] |= ((code & 0x3FC0) >> 6) as u8;
                group[3] |= ((code & 0x003C) << 2) as u8;
            }
        }
    }

    /// Render text into the numeric region
    ///
    /// Only the first [`NUMERIC_CELLS`] characters are shown. Even cells land
    /// in group 1, odd cells in group 2. An empty string leaves the region
    /// blank.
    pub fn render_numeric(&mut self, text: &str) {
        self.clear_numeric();

        for (cell, c) in text.chars().take(NUMERIC_CELLS).enumerate() {
            let code = numeric_code(c);
            let group = &mut self.groups[1 + cell % 2];

            if cell < 2 {
                group[1] |= (code & 0xC0) >> 6;
                group[2] |= (code & 0x3E) << 2;
            } else {
                group[2] |= (code & 0xE0) >> 5;
                group[3] |= (code & 0x1E) << 3;
            }
        }
    }

    /// Blank frame with a single data bit position lit in every group
    ///
    /// Positions count from the most significant bit of byte 0. Positions at
    /// or beyond [`SEGMENT_POSITIONS`] would hit mux-select bits and yield a
    /// blank frame.
    pub fn with_segment_lit(position: u8) -> Self {
        let mut frame = Self::new();
        if position < SEGMENT_POSITIONS {
            let byte = usize::from(position / 8);
            let bit = 0x80 >> (position % 8);
            for group in frame.groups.iter_mut() {
                group[byte] |= bit;
            }
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{alphanum_code, numeric_code, DASH};
    use proptest::prelude::*;

    fn bits_outside(frame: &FrameBuffer, mask: &[GroupFrame; GROUP_COUNT]) -> [GroupFrame; GROUP_COUNT] {
        let mut out = *frame.groups();
        for (group, mask) in out.iter_mut().zip(mask.iter()) {
            for (byte, mask) in group.iter_mut().zip(mask.iter()) {
                *byte &= !mask;
            }
        }
        out
    }

    #[test]
    fn test_masks_are_disjoint() {
        for g in 0..GROUP_COUNT {
            for b in 0..GROUP_BYTES {
                let stop = if b == GROUP_BYTES - 1 { STOP_MASK } else { 0 };
                let owners = [ALPHANUM_MASK[g][b], NUMERIC_MASK[g][b], MUX_SELECT[g][b], stop];
                for i in 0..owners.len() {
                    for j in i + 1..owners.len() {
                        assert_eq!(owners[i] & owners[j], 0, "group {} byte {}", g, b);
                    }
                }
            }
        }
    }

    #[test]
    fn test_new_frame_is_blank() {
        let frame = FrameBuffer::new();
        assert!(frame.is_blank());
        assert_eq!(frame.groups(), &MUX_SELECT);
    }

    #[test]
    fn test_render_single_character() {
        let mut frame = FrameBuffer::new();
        frame.render_alphanumeric("A");

        // 'A' = 0xEC88
        assert_eq!(frame.group(0), Some(&[0xEC, 0x88, 0x00, 0x04, 0x00]));
        assert_eq!(frame.group(1), Some(&MUX_SELECT[1]));
        assert!(!frame.is_blank());
    }

    #[test]
    fn test_render_overflow_cells() {
        let mut frame = FrameBuffer::new();
        frame.render_alphanumeric("-----RS");

        // 'R' = 0xCCC8 in cell 5 (group 3), 'S' = 0xB084 in cell 6 (group 4)
        let r = alphanum_code('R');
        let s = alphanum_code('S');
        let star = alphanum_code('-');
        assert_eq!(frame.groups()[3][0], (star >> 8) as u8);
        assert_eq!(frame.groups()[3][1], (star & 0xFC) as u8 | ((r & 0xC000) >> 14) as u8);
        assert_eq!(frame.groups()[3][2], ((r & 0x3FC0) >> 6) as u8);
        assert_eq!(frame.groups()[3][3], ((r & 0x3C) << 2) as u8);
        assert_eq!(frame.groups()[4][2], ((s & 0x3FC0) >> 6) as u8);
        assert_eq!(frame.groups()[4][4], 0x40);
    }

    #[test]
    fn test_extra_characters_ignored() {
        let mut seven = FrameBuffer::new();
        seven.render_alphanumeric("ABCDEFG");
        let mut nine = FrameBuffer::new();
        nine.render_alphanumeric("ABCDEFGHI");
        assert_eq!(seven, nine);

        let mut four = FrameBuffer::new();
        four.render_numeric("1234");
        let mut six = FrameBuffer::new();
        six.render_numeric("123456");
        assert_eq!(four, six);
    }

    #[test]
    fn test_empty_alphanumeric_clears_only_its_bits() {
        let mut frame = FrameBuffer::new();
        frame.render_numeric("8888");
        let before = frame;
        frame.render_alphanumeric("WWWWWWW");
        frame.render_alphanumeric("");

        assert_eq!(frame, before);
        assert_eq!(bits_outside(&frame, &ALPHANUM_MASK), bits_outside(&before, &ALPHANUM_MASK));
    }

    #[test]
    fn test_render_numeric_42() {
        let mut frame = FrameBuffer::new();
        frame.render_numeric("42");

        let four = numeric_code('4');
        let two = numeric_code('2');

        assert_eq!(frame.groups()[1][1] & 0x03, (four & 0xC0) >> 6);
        assert_eq!(frame.groups()[1][2], (four & 0x3E) << 2);
        assert_eq!(frame.groups()[2][1] & 0x03, (two & 0xC0) >> 6);
        assert_eq!(frame.groups()[2][2], (two & 0x3E) << 2);

        assert_eq!(frame.groups()[0], MUX_SELECT[0]);
        assert_eq!(frame.groups()[3], MUX_SELECT[3]);
        assert_eq!(frame.groups()[4], MUX_SELECT[4]);
        assert_eq!(frame.groups()[1][3], MUX_SELECT[1][3]);
        assert_eq!(frame.groups()[2][3], MUX_SELECT[2][3]);
    }

    #[test]
    fn test_render_numeric_upper_cells() {
        let mut frame = FrameBuffer::new();
        frame.render_numeric("--8-");

        let eight = numeric_code('8');
        assert_eq!(frame.groups()[1][2] & 0x07, (eight & 0xE0) >> 5);
        assert_eq!(frame.groups()[1][3] & 0xF0, (eight & 0x1E) << 3);
        assert_eq!(frame.groups()[2][2] & 0x07, (DASH & 0xE0) >> 5);
        assert_eq!(frame.groups()[2][3] & 0xF0, (DASH & 0x1E) << 3);
    }

    #[test]
    fn test_clear_all_restores_initial_state() {
        let mut frame = FrameBuffer::new();
        frame.render_alphanumeric("TESTING");
        frame.render_numeric("1234");
        frame.clear_all();
        assert_eq!(frame, FrameBuffer::new());
    }

    #[test]
    fn test_segment_walk() {
        let frame = FrameBuffer::with_segment_lit(0);
        for (g, group) in frame.groups().iter().enumerate() {
            assert_eq!(group[0], 0x80);
            assert_eq!(&group[1..], &MUX_SELECT[g][1..]);
        }

        let frame = FrameBuffer::with_segment_lit(28);
        for (g, group) in frame.groups().iter().enumerate() {
            assert_eq!(group[3], MUX_SELECT[g][3] | 0x08);
        }

        assert!(FrameBuffer::with_segment_lit(SEGMENT_POSITIONS).is_blank());
    }

    proptest! {
        #[test]
        fn prop_render_alphanumeric_idempotent(text in "[A-Z0-9a-z *-]{0,10}") {
            let mut once = FrameBuffer::new();
            once.render_alphanumeric(&text);
            let mut twice = once;
            twice.render_alphanumeric(&text);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_render_numeric_idempotent(text in "[0-9A -]{0,6}") {
            let mut once = FrameBuffer::new();
            once.render_numeric(&text);
            let mut twice = once;
            twice.render_numeric(&text);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_regions_commute(alpha in "[A-Z0-9]{0,7}", num in "[0-9]{0,4}") {
            let mut a_then_n = FrameBuffer::new();
            a_then_n.render_alphanumeric(&alpha);
            a_then_n.render_numeric(&num);

            let mut n_then_a = FrameBuffer::new();
            n_then_a.render_numeric(&num);
            n_then_a.render_alphanumeric(&alpha);

            prop_assert_eq!(a_then_n, n_then_a);
        }

        #[test]
        fn prop_alphanumeric_stays_in_its_region(text in "\\PC{0,9}") {
            let mut frame = FrameBuffer::new();
            frame.render_numeric("5309");
            let before = frame;
            frame.render_alphanumeric(&text);
            prop_assert_eq!(bits_outside(&frame, &ALPHANUM_MASK), bits_outside(&before, &ALPHANUM_MASK));
        }

        #[test]
        fn prop_numeric_stays_in_its_region(text in "\\PC{0,6}") {
            let mut frame = FrameBuffer::new();
            frame.render_alphanumeric("MIXTURE");
            let before = frame;
            frame.render_numeric(&text);
            prop_assert_eq!(bits_outside(&frame, &NUMERIC_MASK), bits_outside(&before, &NUMERIC_MASK));
        }

        #[test]
        fn prop_stop_bits_never_set(alpha in "\\PC{0,9}", num in "\\PC{0,6}") {
            let mut frame = FrameBuffer::new();
            frame.render_alphanumeric(&alpha);
            frame.render_numeric(&num);
            for group in frame.groups() {
                prop_assert_eq!(group[GROUP_BYTES - 1] & STOP_MASK, 0);
            }
        }
    }
}
