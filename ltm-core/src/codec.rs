//! Character to segment encoding
//!
//! Each alphanumeric cell has 14 segments, encoded in the top 14 bits of a
//! 16-bit code. The numeric cells at the bottom of the display only have 7
//! segments; their codes are folded out of the alphanumeric code of the same
//! digit rather than kept in a second table.

/// Code for anything not in the table (an asterisk)
pub const ASTERISK: u16 = 0x03FC;

/// Numeric code for anything that is not a digit (a dash)
pub const DASH: u8 = fold_numeric(ASTERISK);

/// Bits of an alphanumeric code that light the middle bar
const MIDDLE_SEGMENTS: u16 = 0x0088;

/// Numeric bit for the middle bar
const NUMERIC_MIDDLE: u8 = 0x02;

/// Alphanumeric glyph table
const ALPHANUM_TABLE: [(char, u16); 36] = [
    ('A', 0xEC88),
    ('B', 0xF2A0),
    ('C', 0x9C00),
    ('D', 0xF220),
    ('E', 0x9C88),
    ('F', 0x8C88),
    ('G', 0xBC80),
    ('H', 0x6C88),
    ('I', 0x9220),
    ('J', 0x7800),
    ('K', 0x0D48),
    ('L', 0x1C00),
    ('M', 0x6D04),
    ('N', 0x6C44),
    ('O', 0xFC00),
    ('P', 0xCC88),
    ('Q', 0xFC40),
    ('R', 0xCCC8),
    ('S', 0xB084),
    ('T', 0x8220),
    ('U', 0x7C00),
    ('V', 0x0D10),
    ('W', 0x6C50),
    ('X', 0x0154),
    ('Y', 0x0124),
    ('Z', 0x9110),
    ('0', 0xFC00),
    ('1', 0x6100),
    ('2', 0xD888),
    ('3', 0xF088),
    ('4', 0x6488),
    ('5', 0xB488),
    ('6', 0xBC88),
    ('7', 0xE000),
    ('8', 0xFC88),
    ('9', 0xF488),
];

/// Look up the 16-bit alphanumeric code for a character
///
/// Matching is exact and case-sensitive; lowercase letters, punctuation and
/// non-ASCII characters all render as [`ASTERISK`].
pub fn alphanum_code(c: char) -> u16 {
    ALPHANUM_TABLE
        .iter()
        .find(|(glyph, _)| *glyph == c)
        .map(|&(_, code)| code)
        .unwrap_or(ASTERISK)
}

/// Look up the 8-bit numeric code for a character
///
/// Only `'0'..='9'` have numeric glyphs; everything else renders as [`DASH`].
pub fn numeric_code(c: char) -> u8 {
    if c.is_ascii_digit() {
        fold_numeric(alphanum_code(c))
    } else {
        DASH
    }
}

/// Fold an alphanumeric code into the numeric segment layout
///
/// The six outer segments map straight across from the high byte. The two
/// halves of the alphanumeric middle bar collapse into the single numeric
/// middle segment.
pub const fn fold_numeric(code: u16) -> u8 {
    let outer = ((code & 0xFC00) >> 8) as u8;
    if code & MIDDLE_SEGMENTS != 0 {
        outer | NUMERIC_MIDDLE
    } else {
        outer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_table_lookup() {
        assert_eq!(alphanum_code('A'), 0xEC88);
        assert_eq!(alphanum_code('T'), 0x8220);
        assert_eq!(alphanum_code('Z'), 0x9110);
        assert_eq!(alphanum_code('0'), 0xFC00);
        assert_eq!(alphanum_code('9'), 0xF488);
    }

    #[test]
    fn test_every_table_entry_is_returned() {
        for (glyph, code) in ALPHANUM_TABLE {
            assert_eq!(alphanum_code(glyph), code, "glyph {:?}", glyph);
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(alphanum_code('a'), ASTERISK);
        assert_eq!(alphanum_code('z'), ASTERISK);
    }

    #[test]
    fn test_unmapped_characters_render_asterisk() {
        for c in [' ', '*', '-', ':', '\0', 'é', '\u{1F600}'] {
            assert_eq!(alphanum_code(c), ASTERISK);
        }
    }

    #[test]
    fn test_dash_pattern() {
        // The asterisk has no outer segments but does cross the middle
        assert_eq!(DASH, 0x02);
        assert_eq!(numeric_code('-'), DASH);
        assert_eq!(numeric_code('A'), DASH);
        assert_eq!(numeric_code(' '), DASH);
    }

    #[test]
    fn test_numeric_digits() {
        assert_eq!(numeric_code('0'), 0xFC);
        assert_eq!(numeric_code('1'), 0x60);
        assert_eq!(numeric_code('2'), 0xDA);
        assert_eq!(numeric_code('3'), 0xF2);
        assert_eq!(numeric_code('4'), 0x66);
        assert_eq!(numeric_code('5'), 0xB6);
        assert_eq!(numeric_code('6'), 0xBE);
        assert_eq!(numeric_code('7'), 0xE0);
        assert_eq!(numeric_code('8'), 0xFE);
        assert_eq!(numeric_code('9'), 0xF6);
    }

    #[test]
    fn test_letters_with_digit_shapes_still_dash() {
        // 'O' shares its glyph with '0' but is not a digit
        assert_eq!(alphanum_code('O'), alphanum_code('0'));
        assert_eq!(numeric_code('O'), DASH);
    }

    proptest! {
        #[test]
        fn prop_unmapped_is_asterisk(c in any::<char>()) {
            prop_assume!(!c.is_ascii_uppercase() && !c.is_ascii_digit());
            prop_assert_eq!(alphanum_code(c), ASTERISK);
        }

        #[test]
        fn prop_non_digit_is_dash(c in any::<char>()) {
            prop_assume!(!c.is_ascii_digit());
            prop_assert_eq!(numeric_code(c), fold_numeric(ASTERISK));
        }

        #[test]
        fn prop_digit_is_fold_of_alphanum(d in 0u32..10) {
            let c = char::from_digit(d, 10).unwrap();
            prop_assert_eq!(numeric_code(c), fold_numeric(alphanum_code(c)));
        }
    }
}
