//! Processing instruction splitting
//!
//! Engines that hand out a PI as one raw `target[ data]` string are split
//! here, following XML 1.0 section 2.6.

#[inline]
fn is_pi_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

/// Split raw PI content into `(target, data)`.
///
/// The target is the leading run of non-whitespace characters. Exactly one
/// whitespace run after the target is skipped; the rest is the data, kept
/// as-is. A bare target yields empty data.
pub fn split_processing_instruction(raw: &str) -> (&str, &str) {
    let bytes = raw.as_bytes();
    let target_end = bytes
        .iter()
        .position(|&b| is_pi_whitespace(b))
        .unwrap_or(bytes.len());

    let data_start = bytes[target_end..]
        .iter()
        .position(|&b| !is_pi_whitespace(b))
        .map_or(bytes.len(), |offset| target_end + offset);

    // Both bounds sit next to ASCII bytes, so they are char boundaries
    (&raw[..target_end], &raw[data_start..])
}
