//! Numeric literals with SI / engineering prefixes.
//!
//! Prefixes are case-insensitive, as in SPICE: `m` and `M` are both milli,
//! mega is spelled `meg`.
//!
//! | Prefix | Exponent |
//! |--------|----------|
//! | `f` | -15 |
//! | `p` | -12 |
//! | `n` | -9 |
//! | `u`, `µ` | -6 |
//! | `m` | -3 |
//! | `k` | 3 |
//! | `meg` | 6 |
//! | `g` | 9 |
//! | `t` | 12 |
//!
//! Letters after a recognised prefix are a unit name and are ignored
//! (`10uF`, `2.2kOhm`).

use thiserror::Error;

/// Failure to read a metric value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    /// Numeric part missing or unparseable
    #[error("malformed number '{0}'")]
    MalformedNumber(String),

    /// Trailing letter is not a prefix
    #[error("unknown metric prefix '{prefix}' in '{token}'")]
    UnknownPrefix { token: String, prefix: char },
}

/// Power of ten for the prefix at the start of `suffix`, if any.
///
/// `meg` is checked before the single-letter prefixes so it never reads as
/// milli.
pub fn metric_exponent(suffix: &str) -> Option<i32> {
    if suffix.len() >= 3 && suffix.as_bytes()[..3].eq_ignore_ascii_case(b"meg") {
        return Some(6);
    }
    let exponent = match suffix.chars().next()? {
        'f' | 'F' => -15,
        'p' | 'P' => -12,
        'n' | 'N' => -9,
        'u' | 'U' | 'µ' => -6,
        'm' | 'M' => -3,
        'k' | 'K' => 3,
        'g' | 'G' => 9,
        't' | 'T' => 12,
        _ => return None,
    };
    Some(exponent)
}

/// Parse a number with an optional metric prefix into a plain value.
pub fn parse_metric(token: &str) -> Result<f64, MetricError> {
    let split = numeric_len(token);
    let (number, suffix) = token.split_at(split);

    if !number.bytes().any(|b| b.is_ascii_digit()) {
        return Err(MetricError::MalformedNumber(token.to_string()));
    }
    let mantissa: f64 = number
        .parse()
        .map_err(|_| MetricError::MalformedNumber(token.to_string()))?;

    let exponent = match suffix.chars().next() {
        None => 0,
        Some(c) if !c.is_alphabetic() => {
            return Err(MetricError::MalformedNumber(token.to_string()));
        }
        Some(c) => metric_exponent(suffix).ok_or_else(|| MetricError::UnknownPrefix {
            token: token.to_string(),
            prefix: c,
        })?,
    };

    Ok(mantissa * 10f64.powi(exponent))
}

/// Length of the leading `[sign] digits [. digits] [e [sign] digits]` run.
fn numeric_len(token: &str) -> usize {
    let bytes = token.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }

    // Only an exponent if digits follow; otherwise `e` is left for the suffix.
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }

    i
}
