//! Parsing of duration strings such as `300ms`, `1.5h` or `2h45m`.
//!
//! A duration is an optional sign followed by one or more decimal numbers,
//! each with an optional fraction and a mandatory unit suffix. Valid units
//! are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. The bare string `0`
//! is accepted as zero.

use std::time::Duration;

use crate::error::{Result, TtlkvError};

/// Fraction digits beyond this precision are ignored.
const MAX_FRACTION_DIGITS: usize = 18;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(1_000_000_000),
        "m" => Some(60 * 1_000_000_000),
        "h" => Some(60 * 60 * 1_000_000_000),
        _ => None,
    }
}

fn fraction_nanos(digits: &str, scale: u128) -> u128 {
    let mut numerator: u128 = 0;
    let mut denominator: u128 = 1;
    for b in digits.bytes().take(MAX_FRACTION_DIGITS) {
        numerator = numerator * 10 + u128::from(b - b'0');
        denominator *= 10;
    }
    numerator * scale / denominator
}

/// Parses a duration string into a non-negative [`Duration`].
///
/// Negative durations are rejected with [`TtlkvError::NegativeDuration`];
/// `-0s` is zero and accepted. Surrounding whitespace is ignored.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let invalid = |reason: String| TtlkvError::InvalidDuration {
        input: input.to_string(),
        reason,
    };
    let overflow = || TtlkvError::DurationOverflow(input.to_string());

    let s = input.trim();
    let (negative, mut rest) = match s.as_bytes().first() {
        None => return Err(invalid("empty duration".into())),
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        Some(_) => (false, s),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid("missing value".into()));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let int_digits = &rest[..int_len];
        rest = &rest[int_len..];

        let mut frac_digits = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
            frac_digits = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid("expected a number".into()));
        }

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];
        if unit.is_empty() {
            return Err(invalid("missing unit".into()));
        }
        let scale = unit_nanos(unit).ok_or_else(|| invalid(format!("unknown unit \"{unit}\"")))?;

        let whole: u128 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| overflow())?
        };
        let value = whole
            .checked_mul(scale)
            .and_then(|v| v.checked_add(fraction_nanos(frac_digits, scale)))
            .ok_or_else(overflow)?;
        total = total.checked_add(value).ok_or_else(overflow)?;
        if total > u128::from(u64::MAX) {
            return Err(overflow());
        }
    }

    if negative && total > 0 {
        return Err(TtlkvError::NegativeDuration(input.to_string()));
    }

    // Bounded by the u64::MAX check above.
    Ok(Duration::from_nanos(total as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("0", Duration::ZERO ; "bare zero")]
    #[test_case("5s", Duration::from_secs(5) ; "seconds")]
    #[test_case("300ms", Duration::from_millis(300) ; "milliseconds")]
    #[test_case("1.5h", Duration::from_secs(5400) ; "fractional hours")]
    #[test_case("2h45m", Duration::from_secs(2 * 3600 + 45 * 60) ; "compound")]
    #[test_case("1m30.5s", Duration::from_millis(90_500) ; "compound with fraction")]
    #[test_case(".5s", Duration::from_millis(500) ; "leading dot")]
    #[test_case("1.s", Duration::from_secs(1) ; "trailing dot")]
    #[test_case("10ns", Duration::from_nanos(10) ; "nanoseconds")]
    #[test_case("7us", Duration::from_micros(7) ; "ascii micro")]
    #[test_case("7µs", Duration::from_micros(7) ; "micro sign")]
    #[test_case("+5s", Duration::from_secs(5) ; "explicit plus")]
    #[test_case("-0s", Duration::ZERO ; "negative zero")]
    #[test_case("  5s ", Duration::from_secs(5) ; "surrounding whitespace")]
    fn test_parse_valid(input: &str, expected: Duration) {
        assert_eq!(parse_duration(input).unwrap(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "blank")]
    #[test_case("-" ; "sign only")]
    #[test_case("5" ; "missing unit")]
    #[test_case("s" ; "missing number")]
    #[test_case("5x" ; "unknown unit")]
    #[test_case("1.2.3s" ; "two dots")]
    #[test_case("five seconds" ; "words")]
    fn test_parse_invalid(input: &str) {
        assert!(matches!(
            parse_duration(input),
            Err(TtlkvError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            parse_duration("-5s"),
            Err(TtlkvError::NegativeDuration(_))
        ));
        assert!(matches!(
            parse_duration("-1h30m"),
            Err(TtlkvError::NegativeDuration(_))
        ));
    }

    #[test]
    fn test_overflow_rejected() {
        assert!(matches!(
            parse_duration("99999999999h"),
            Err(TtlkvError::DurationOverflow(_))
        ));
        assert!(matches!(
            parse_duration("99999999999999999999999999999999999999999s"),
            Err(TtlkvError::DurationOverflow(_))
        ));
    }

    #[test]
    fn test_excess_fraction_digits_truncated() {
        let d = parse_duration("1.0000000000000000009s").unwrap();
        assert_eq!(d, Duration::from_secs(1));
    }

    proptest! {
        #[test]
        fn prop_millis_roundtrip(n in 0u32..) {
            let d = parse_duration(&format!("{n}ms")).unwrap();
            prop_assert_eq!(d, Duration::from_millis(u64::from(n)));
        }

        #[test]
        fn prop_compound_sums_parts(h in 0u64..1000, m in 0u64..60, s in 0u64..60) {
            let d = parse_duration(&format!("{h}h{m}m{s}s")).unwrap();
            prop_assert_eq!(d, Duration::from_secs(h * 3600 + m * 60 + s));
        }
    }
}
