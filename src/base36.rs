//! Lowercase base-36 encoding used for tag ids, filter positions and
//! message ids.

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Encode an integer as lowercase base 36
///
/// # Examples
/// ```
/// # use mailtag::base36;
/// assert_eq!(base36::encode(0), "0");
/// assert_eq!(base36::encode(35), "z");
/// assert_eq!(base36::encode(36), "10");
/// ```
#[must_use]
pub fn encode(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut buf = Vec::new();
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    // Only ASCII digits were pushed
    String::from_utf8(buf).unwrap_or_default()
}

/// Decode a base-36 string (case-insensitive)
///
/// Returns `None` for empty input, characters outside `[0-9a-z]`, or overflow.
#[must_use]
pub fn decode(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    u64::from_str_radix(&text.to_ascii_lowercase(), 36).ok()
}
