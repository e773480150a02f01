//! Synthetic style remapping onto the Unicode Mathematical Alphanumeric
//! Symbols block.
//!
//! A base font plus a small bold or italic face can cover "rich" text
//! without any markup: the supplementary face's ASCII letters are remapped
//! onto the bold/italic math code points at merge time, and later text is
//! converted with [`make_bold`] / [`make_italic`] so it resolves to those
//! glyphs.

/// First code point of the Mathematical Bold capital block.
pub const CAPITAL_BOLD: u32 = 0x1D400;
/// First code point of the Mathematical Bold small block.
pub const SMALL_BOLD: u32 = 0x1D41A;
/// First code point of the Mathematical Italic capital block.
pub const CAPITAL_ITALIC: u32 = 0x1D434;
/// First code point of the Mathematical Italic small block.
pub const SMALL_ITALIC: u32 = 0x1D44E;
/// First code point of the Mathematical Bold Italic capital block.
pub const CAPITAL_BOLD_ITALIC: u32 = 0x1D468;
/// First code point of the Mathematical Bold Italic small block.
pub const SMALL_BOLD_ITALIC: u32 = 0x1D482;

fn remap_letter(code: u32, capital_base: u32, small_base: u32) -> u32 {
    if ('A' as u32..='Z' as u32).contains(&code) {
        code - 'A' as u32 + capital_base
    } else if ('a' as u32..='z' as u32).contains(&code) {
        code - 'a' as u32 + small_base
    } else {
        code
    }
}

/// Map an ASCII letter onto its Mathematical Bold code point.
///
/// Non-letter input passes through unchanged.
pub fn bold_map(code: u32) -> u32 {
    remap_letter(code, CAPITAL_BOLD, SMALL_BOLD)
}

/// Map an ASCII letter onto its Mathematical Italic code point.
pub fn italic_map(code: u32) -> u32 {
    remap_letter(code, CAPITAL_ITALIC, SMALL_ITALIC)
}

/// Map an ASCII letter onto its Mathematical Bold Italic code point.
pub fn bold_italic_map(code: u32) -> u32 {
    remap_letter(code, CAPITAL_BOLD_ITALIC, SMALL_BOLD_ITALIC)
}

fn convert(text: &str, map: fn(u32) -> u32) -> String {
    text.chars()
        .map(|c| char::from_u32(map(c as u32)).unwrap_or(c))
        .collect()
}

/// Convert a string to its bold form using math bold code points.
pub fn make_bold(text: &str) -> String {
    convert(text, bold_map)
}

/// Convert a string to its italic form using math italic code points.
pub fn make_italic(text: &str) -> String {
    convert(text, italic_map)
}

/// Convert a string to its bold-italic form using math bold italic code
/// points.
pub fn make_bold_italic(text: &str) -> String {
    convert(text, bold_italic_map)
}
