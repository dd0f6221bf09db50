//! Turns an 8-dot coverage mask into one printable character.

use serde::{Deserialize, Serialize};

use crate::utils::pop_count8;

/// Character set used for graph cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlyphMode {
    /// Unicode braille patterns (U+2800..U+28FF).
    #[default]
    Braille,
    /// One of `' '`, `'\''`, `'.'`, `':'`.
    Ascii,
}

pub const BRAILLE_BLANK: u32 = 0x2800;

// Unicode braille bit for each mask bit. Mask bits are row-major from the
// top (bit 2k left, bit 2k+1 right); braille numbers the first three rows
// column-major and puts the bottom row in bits 6 and 7.
const BRAILLE_BIT: [u8; 8] = [0, 3, 1, 4, 2, 5, 6, 7];

pub const ASCII_UPPER: char = '\'';
pub const ASCII_LOWER: char = '.';
pub const ASCII_FULL: char = ':';

pub fn glyph(details: u8, mode: GlyphMode) -> char {
    // A blank braille cell may be drawn as a substitute box on some fonts.
    if details == 0x00 {
        return ' ';
    }
    match mode {
        GlyphMode::Braille => braille_char(details),
        GlyphMode::Ascii => ascii_char(details),
    }
}

pub fn braille_char(details: u8) -> char {
    let mut pattern = 0u32;
    for (bit, target) in BRAILLE_BIT.iter().enumerate() {
        if details & (1 << bit) != 0 {
            pattern |= 1 << target;
        }
    }
    char::from_u32(BRAILLE_BLANK + pattern).unwrap_or(' ')
}

pub fn ascii_char(details: u8) -> char {
    if details == 0x00 {
        return ' ';
    }
    if pop_count8(details) >= 5 {
        return ASCII_FULL;
    }

    let upper = pop_count8(details & 0x0F);
    let lower = pop_count8(details & 0xF0);
    if upper > lower {
        return ASCII_UPPER;
    }
    if lower > upper {
        return ASCII_LOWER;
    }

    // Same number of dots in each half: the outer rows count double.
    let upper_weight = 2 * pop_count8(details & 0x03) + pop_count8(details & 0x0C);
    let lower_weight = pop_count8(details & 0x30) + 2 * pop_count8(details & 0xC0);
    if upper_weight > lower_weight {
        ASCII_UPPER
    } else {
        ASCII_LOWER
    }
}
