//! Text normalization and context windows.

use unicode_normalization::UnicodeNormalization;

/// Normalize raw input: NFC composition and `\n` line endings.
pub fn normalize(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .nfc()
        .collect()
}

/// Byte index `chars` characters before `byte_idx` (clamped to 0).
fn back_chars(text: &str, byte_idx: usize, chars: usize) -> usize {
    text[..byte_idx]
        .char_indices()
        .rev()
        .nth(chars.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte index `chars` characters after `byte_idx` (clamped to the end).
fn forward_chars(text: &str, byte_idx: usize, chars: usize) -> usize {
    text[byte_idx..]
        .char_indices()
        .nth(chars)
        .map(|(i, _)| byte_idx + i)
        .unwrap_or(text.len())
}

/// The match plus up to `radius` characters either side, as a byte range.
pub fn window_bounds(text: &str, start: usize, end: usize, radius: usize) -> (usize, usize) {
    if radius == 0 {
        return (start, end);
    }
    (back_chars(text, start, radius), forward_chars(text, end, radius))
}

/// The match plus up to `radius` characters either side, newlines flattened.
pub fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let (from, to) = window_bounds(text, start, end, radius);
    text[from..to].replace(['\n', '\r'], " ")
}
