//! Advance widths for the standard-14 Helvetica faces and WinAnsi encoding.
//!
//! Widths are in 1/1000 em, taken from the Adobe AFM files for codes
//! 32..=126. Accented Latin-1 letters measure as their base letter.

use crate::layout::FontFace;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // 'p'..'~'
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Width used for codes without a table entry.
const FALLBACK_WIDTH: u16 = 556;

/// Byte substituted for characters WinAnsi cannot encode.
const REPLACEMENT: u8 = b'?';

/// Map a character to its WinAnsiEncoding byte.
pub fn win_ansi_byte(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '€' => 0x80,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '–' => 0x96,
        '—' => 0x97,
        _ => REPLACEMENT,
    }
}

/// Encode `text` for a WinAnsi simple font; unencodable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

/// ASCII letter whose glyph width an accented Latin-1 letter borrows.
fn latin1_base(code: u8) -> Option<u8> {
    let base = match code {
        0xc0..=0xc5 => b'A',
        0xc7 => b'C',
        0xc8..=0xcb => b'E',
        0xcc..=0xcf => b'I',
        0xd1 => b'N',
        0xd2..=0xd6 | 0xd8 => b'O',
        0xd9..=0xdc => b'U',
        0xdd => b'Y',
        0xe0..=0xe5 => b'a',
        0xe7 => b'c',
        0xe8..=0xeb => b'e',
        0xec..=0xef => b'i',
        0xf1 => b'n',
        0xf2..=0xf6 | 0xf8 => b'o',
        0xf9..=0xfc => b'u',
        0xfd | 0xff => b'y',
        0xa0 => b' ',
        _ => return None,
    };
    Some(base)
}

fn glyph_width(font: FontFace, code: u8) -> u16 {
    let table = match font {
        FontFace::Helvetica => &HELVETICA,
        FontFace::HelveticaBold => &HELVETICA_BOLD,
    };
    let bold = font == FontFace::HelveticaBold;
    match code {
        0x20..=0x7e => table[(code - 0x20) as usize],
        0x91 | 0x92 => if bold { 278 } else { 222 },
        0x93 | 0x94 => if bold { 500 } else { 333 },
        0x96 => 556,
        0x97 => 1000,
        _ => latin1_base(code)
            .map(|base| table[(base - 0x20) as usize])
            .unwrap_or(FALLBACK_WIDTH),
    }
}

/// Width of `text` in points when set in `font` at `size`.
pub fn text_width(font: FontFace, text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| u32::from(glyph_width(font, win_ansi_byte(c))))
        .sum();
    units as f32 * size / 1000.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_widths() {
        // "Hello" in Helvetica: 722 + 556 + 222 + 222 + 556 = 2278.
        assert!((text_width(FontFace::Helvetica, "Hello", 10.0) - 22.78).abs() < 1e-4);
        // Bold is wider for lowercase.
        assert!(
            text_width(FontFace::HelveticaBold, "hello", 12.0)
                > text_width(FontFace::Helvetica, "hello", 12.0)
        );
    }

    #[test]
    fn width_scales_linearly_with_size() {
        let w10 = text_width(FontFace::HelveticaBold, "JANE DOE", 10.0);
        let w25 = text_width(FontFace::HelveticaBold, "JANE DOE", 25.0);
        assert!((w25 - w10 * 2.5).abs() < 1e-3);
        assert_eq!(text_width(FontFace::Helvetica, "", 14.0), 0.0);
    }

    #[test]
    fn accented_letters_borrow_base_width() {
        assert_eq!(
            text_width(FontFace::Helvetica, "José", 10.0),
            text_width(FontFace::Helvetica, "Jose", 10.0)
        );
    }

    #[test]
    fn win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Zoë"), vec![b'Z', b'o', 0xeb]);
        assert_eq!(encode_win_ansi("O’Brien")[1], 0x92);
        assert_eq!(encode_win_ansi("李"), vec![REPLACEMENT]);
    }
}
