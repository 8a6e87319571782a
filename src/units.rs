//! Duration and byte-size literals
//!
//! Both are ordinary strings in a document; these grammars are applied
//! only when a typed accessor asks for them. A bare number is taken as
//! milliseconds for durations and as bytes for sizes.

use crate::error::ValueError;
use std::fmt;
use std::time::Duration;

/// A duration that may be unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeSpan {
    Finite(Duration),
    /// Written as `infinite`
    Infinite,
}

impl TimeSpan {
    pub fn is_infinite(&self) -> bool {
        matches!(self, TimeSpan::Infinite)
    }

    /// The finite duration, `None` for [`TimeSpan::Infinite`]
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            TimeSpan::Finite(duration) => Some(*duration),
            TimeSpan::Infinite => None,
        }
    }
}

impl From<Duration> for TimeSpan {
    fn from(duration: Duration) -> Self {
        TimeSpan::Finite(duration)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSpan::Finite(duration) => write!(f, "{}ns", duration.as_nanos()),
            TimeSpan::Infinite => write!(f, "infinite"),
        }
    }
}

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Nanoseconds per unit
fn duration_unit(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "" | "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => 1_000_000,
        "ns" | "nano" | "nanos" | "nanosecond" | "nanoseconds" => 1,
        "us" | "micro" | "micros" | "microsecond" | "microseconds" => 1_000,
        "s" | "second" | "seconds" => NANOS_PER_SECOND,
        "m" | "minute" | "minutes" => 60 * NANOS_PER_SECOND,
        "h" | "hour" | "hours" => 3_600 * NANOS_PER_SECOND,
        "d" | "day" | "days" => 86_400 * NANOS_PER_SECOND,
        _ => return None,
    };
    Some(nanos)
}

/// Splits `"10 ms"` into `("10", "ms")`
fn split_number(text: &str) -> (&str, &str) {
    let end = text
        .char_indices()
        .find(|&(index, c)| {
            !(c.is_ascii_digit()
                || c == '.'
                || (index == 0 && (c == '+' || c == '-'))
                || ((c == 'e' || c == 'E')
                    && text[index + 1..].starts_with(|n: char| n.is_ascii_digit() || n == '-')))
        })
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    (&text[..end], text[end..].trim())
}

/// Scales `number` by `unit`, exactly for integers and by floating point
/// otherwise. Negative amounts are rejected.
fn scale(number: &str, unit: u128) -> Option<u128> {
    if let Ok(whole) = number.trim_start_matches('+').parse::<u128>() {
        return whole.checked_mul(unit);
    }
    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let scaled = value * unit as f64;
    if scaled >= u128::MAX as f64 {
        return None;
    }
    Some(scaled as u128)
}

/// Parses a duration: a number with an optional unit, or `infinite`
pub fn parse_duration(text: &str) -> Result<TimeSpan, ValueError> {
    let trimmed = text.trim();
    if trimmed == "infinite" {
        return Ok(TimeSpan::Infinite);
    }
    let invalid = || ValueError::InvalidDuration(text.to_string());

    let (number, unit) = split_number(trimmed);
    if number.is_empty() {
        return Err(invalid());
    }
    let unit = duration_unit(unit).ok_or_else(invalid)?;
    let nanos = scale(number, unit).ok_or_else(invalid)?;

    let seconds = u64::try_from(nanos / NANOS_PER_SECOND).map_err(|_| invalid())?;
    let subsec = (nanos % NANOS_PER_SECOND) as u32;
    Ok(TimeSpan::Finite(Duration::new(seconds, subsec)))
}

const SI_PREFIXES: [(&str, &str, &str); 8] = [
    ("k", "kilo", "kibi"),
    ("M", "mega", "mebi"),
    ("G", "giga", "gibi"),
    ("T", "tera", "tebi"),
    ("P", "peta", "pebi"),
    ("E", "exa", "exbi"),
    ("Z", "zetta", "zebi"),
    ("Y", "yotta", "yobi"),
];

/// Bytes per unit, powers of 1000 for SI units and of 1024 for IEC units
fn byte_unit(unit: &str) -> Option<u128> {
    if matches!(unit, "" | "B" | "b" | "byte" | "bytes") {
        return Some(1);
    }

    for (index, (letter, si, iec)) in SI_PREFIXES.iter().enumerate() {
        let power = index as u32 + 1;
        let upper = letter.to_ascii_uppercase();
        let lower = letter.to_ascii_lowercase();

        let si_forms = [
            format!("{}B", letter),
            format!("{}byte", si),
            format!("{}bytes", si),
        ];
        if si_forms.iter().any(|form| form == unit) {
            return Some(1000u128.pow(power));
        }

        let iec_forms = [
            upper.clone(),
            lower,
            format!("{}i", upper),
            format!("{}iB", upper),
            format!("{}byte", iec),
            format!("{}bytes", iec),
        ];
        if iec_forms.iter().any(|form| form == unit) {
            return Some(1024u128.pow(power));
        }
    }
    None
}

/// Parses a byte size such as `512`, `10kB`, `1.5 MiB` or `2 gigabytes`
pub fn parse_byte_size(text: &str) -> Result<u64, ValueError> {
    let invalid = || ValueError::InvalidByteSize(text.to_string());
    let (number, unit) = split_number(text.trim());
    if number.is_empty() {
        return Err(invalid());
    }
    let unit = byte_unit(unit).ok_or_else(invalid)?;
    let bytes = scale(number, unit).ok_or_else(invalid)?;
    u64::try_from(bytes).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_units() {
        let cases = [
            ("500ms", Duration::from_millis(500)),
            ("500", Duration::from_millis(500)),
            ("10 s", Duration::from_secs(10)),
            ("3 minutes", Duration::from_secs(180)),
            ("2h", Duration::from_secs(7_200)),
            ("1 day", Duration::from_secs(86_400)),
            ("250us", Duration::from_micros(250)),
            ("7 nanos", Duration::from_nanos(7)),
            ("1.5s", Duration::from_millis(1_500)),
        ];
        for (text, expected) in cases {
            assert_eq!(
                parse_duration(text).unwrap(),
                TimeSpan::Finite(expected),
                "duration {}",
                text
            );
        }
    }

    #[test]
    fn test_infinite_duration() {
        let span = parse_duration("infinite").unwrap();
        assert!(span.is_infinite());
        assert_eq!(span.as_duration(), None);
    }

    #[test]
    fn test_invalid_durations() {
        for text in ["", "ms", "10 fortnights", "-5s", "abc"] {
            assert!(
                matches!(parse_duration(text), Err(ValueError::InvalidDuration(_))),
                "duration {:?}",
                text
            );
        }
    }

    #[test]
    fn test_byte_sizes() {
        let cases = [
            ("512", 512),
            ("512B", 512),
            ("10kB", 10_000),
            ("10K", 10_240),
            ("10k", 10_240),
            ("1 KiB", 1_024),
            ("2MB", 2_000_000),
            ("2M", 2 * 1_048_576),
            ("1.5 MiB", 1_572_864),
            ("3 gigabytes", 3_000_000_000),
            ("1 gibibyte", 1_073_741_824),
            ("1 TB", 1_000_000_000_000),
        ];
        for (text, expected) in cases {
            assert_eq!(parse_byte_size(text).unwrap(), expected, "size {}", text);
        }
    }

    #[test]
    fn test_invalid_byte_sizes() {
        for text in ["", "MB", "10 parsecs", "1 ZB", "-1kB"] {
            assert!(
                matches!(parse_byte_size(text), Err(ValueError::InvalidByteSize(_))),
                "size {:?}",
                text
            );
        }
    }
}
