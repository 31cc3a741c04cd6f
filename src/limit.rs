//! Page size handling for list queries.
//!
//! Invalid or out-of-range limits are never an error. They are coerced:
//!
//! | input                         | result            |
//! |-------------------------------|-------------------|
//! | absent                        | [`DEFAULT_LIMIT`] |
//! | no leading integer (`"abc"`)  | [`DEFAULT_LIMIT`] |
//! | `< 1` (`"0"`, `"-3"`)         | [`DEFAULT_LIMIT`] |
//! | `1..=100`                     | unchanged         |
//! | `> 100`                       | [`MAX_LIMIT`]     |
//!
//! Only the leading integer of the raw text is read, so `"15abc"`, `" 15"`
//! and `"15.9"` all mean 15.

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

/// Normalize a raw query-string limit into `1..=MAX_LIMIT`.
pub fn normalize_limit(raw: Option<&str>) -> usize {
    match raw.and_then(parse_leading_int) {
        Some(n) if n < 1 => DEFAULT_LIMIT,
        Some(n) => clamp_limit(usize::try_from(n).unwrap_or(MAX_LIMIT)),
        None => DEFAULT_LIMIT,
    }
}

/// Clamp an already-numeric limit. Zero falls back to the default.
pub fn clamp_limit(limit: usize) -> usize {
    match limit {
        0 => DEFAULT_LIMIT,
        n => n.min(MAX_LIMIT),
    }
}

/// Parse an optional sign followed by digits, ignoring leading whitespace and
/// anything after the digits. Values too large for `i64` saturate.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude = digits[..end].bytes().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}
