/// UTF-16 code unit helpers for word-oriented buffers.
///
/// Strings cross the binary operation channel as UTF-16 code units, one unit
/// per buffer word. Astral characters occupy two units (a surrogate pair), so
/// lengths are always counted in units, never in chars or bytes.

/// Number of UTF-16 code units needed to encode `text`.
#[inline]
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Write `text` as UTF-16 code units into `buf` starting at `offset`.
///
/// Returns the offset just past the last written unit, or `None` when the
/// units do not fit. Nothing is written on overflow.
pub fn write_utf16(buf: &mut [u16], offset: usize, text: &str) -> Option<usize> {
    let end = offset.checked_add(utf16_len(text))?;
    if end > buf.len() {
        return None;
    }
    let mut at = offset;
    let mut pair = [0u16; 2];
    for ch in text.chars() {
        for unit in ch.encode_utf16(&mut pair) {
            buf[at] = *unit;
            at += 1;
        }
    }
    Some(at)
}

/// Decode UTF-16 code units into a `String`.
///
/// - Unpaired surrogates are replaced with U+FFFD and decoding continues.
/// - Valid pairs split across the slice are never produced by the encoder, so
///   there is no carry between calls.
pub fn read_utf16_lossy(units: &[u16]) -> String {
    let mut out = String::with_capacity(units.len());
    for decoded in char::decode_utf16(units.iter().copied()) {
        out.push(decoded.unwrap_or(char::REPLACEMENT_CHARACTER));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counts_surrogate_pairs() {
        assert_eq!(utf16_len(""), 0);
        assert_eq!(utf16_len("view"), 4);
        // U+1F600 needs a surrogate pair.
        assert_eq!(utf16_len("a\u{1F600}"), 3);
    }

    #[test]
    fn writes_units_and_reports_end() {
        let mut buf = [0u16; 8];
        let end = write_utf16(&mut buf, 2, "h\u{e9}").unwrap();
        assert_eq!(end, 4);
        assert_eq!(&buf[2..4], &[0x68, 0xE9]);
    }

    #[test]
    fn refuses_to_write_past_the_end() {
        let mut buf = [7u16; 3];
        assert_eq!(write_utf16(&mut buf, 1, "abc"), None);
        assert_eq!(buf, [7, 7, 7]);
    }

    #[test]
    fn astral_text_survives() {
        let text = "x\u{1F600}y";
        let mut buf = [0u16; 4];
        let end = write_utf16(&mut buf, 0, text).unwrap();
        assert_eq!(read_utf16_lossy(&buf[..end]), text);
    }

    #[test]
    fn lone_surrogate_becomes_replacement() {
        assert_eq!(read_utf16_lossy(&[0x61, 0xD800, 0x62]), "a\u{FFFD}b");
        assert_eq!(read_utf16_lossy(&[0xDC00]), "\u{FFFD}");
    }
}
