//! Duration strings such as `300ms`, `1.5h` or `2h45m`.
//!
//! A duration is a sequence of decimal numbers, each with an optional
//! fraction and a unit suffix. Valid units are `ns`, `us` (or `µs`), `ms`,
//! `s`, `m` and `h`. The bare string `0` is accepted as zero.
//!
//! [`Duration`] is unsigned, so a leading `-` is only accepted when the
//! value it negates is zero (`-0`, `-0s`).

use std::time::Duration;

use crate::errors::DurationParseError;

const NANOS_PER_SEC: u128 = 1_000_000_000;

// Fraction digits past this point cannot change the result at nanosecond
// precision and would overflow the accumulator.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parses a duration string.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use service_bootstrap::duration::parse_duration;
///
/// assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
/// assert!(parse_duration("10").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    if input.is_empty() {
        return Err(DurationParseError::Empty);
    }
    let (negative, rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    let parsed = parse_unsigned(input, rest)?;
    if negative && !parsed.is_zero() {
        return Err(DurationParseError::Negative(input.to_string()));
    }
    Ok(parsed)
}

// `input` is the full string, kept for error messages; `rest` has the sign stripped.
fn parse_unsigned(input: &str, mut rest: &str) -> Result<Duration, DurationParseError> {
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(DurationParseError::Invalid(input.to_string()));
    }

    let overflow = || DurationParseError::Overflow(input.to_string());
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let (whole, after_whole) = split_digits(rest);
        let (fraction, after_number) = match after_whole.strip_prefix('.') {
            Some(after_dot) => split_digits(after_dot),
            None => ("", after_whole),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(DurationParseError::Invalid(input.to_string()));
        }

        let unit_end = after_number
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after_number.len());
        let (unit, tail) = after_number.split_at(unit_end);
        if unit.is_empty() {
            return Err(DurationParseError::MissingUnit(input.to_string()));
        }
        let scale = unit_scale(unit).ok_or_else(|| DurationParseError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

        let mut numerator: u128 = 0;
        let mut denominator: u128 = 1;
        for digit in fraction.bytes().take(MAX_FRACTION_DIGITS) {
            numerator = numerator * 10 + u128::from(digit - b'0');
            denominator *= 10;
        }
        nanos = nanos
            .checked_add(numerator * scale / denominator)
            .ok_or_else(overflow)?;

        total = total.checked_add(nanos).ok_or_else(overflow)?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| overflow())?;
    let subsec = (total % NANOS_PER_SEC) as u32;
    Ok(Duration::new(secs, subsec))
}

/// Renders a duration in the grammar accepted by [`parse_duration`].
///
/// Durations under one second use the largest of `ms`, `µs` or `ns` that
/// keeps a non-zero integer part; longer ones are written as hours, minutes
/// and (fractional) seconds, e.g. `1h0m0s`, `1m30s`, `1.5s`.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < NANOS_PER_SEC {
        let (unit, scale) = if nanos < 1_000 {
            ("ns", 1)
        } else if nanos < 1_000_000 {
            ("µs", 1_000)
        } else {
            ("ms", 1_000_000)
        };
        return format!("{}{}", decimal(nanos, scale), unit);
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = decimal(
        u128::from(total_secs % 60) * NANOS_PER_SEC + u128::from(duration.subsec_nanos()),
        NANOS_PER_SEC,
    );

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn unit_scale(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3600 * NANOS_PER_SEC),
        _ => None,
    }
}

/// `value / scale` as a decimal with trailing zeros trimmed. `scale` is a power of ten.
fn decimal(value: u128, scale: u128) -> String {
    let whole = value / scale;
    let remainder = value % scale;
    if remainder == 0 {
        return whole.to_string();
    }

    let width = scale.to_string().len() - 1;
    let fraction = format!("{:0width$}", remainder, width = width);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}
