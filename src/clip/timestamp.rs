use std::fmt;
use std::num::NonZeroU64;
use std::ops::{Add, Sub};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::InputError;

/// A point in a recording, always normalized so minutes and seconds are below 60.
///
/// Field order matters: the derived ordering compares hours first, which
/// matches the ordering of the total seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    hours: u64,
    minutes: u8,
    seconds: u8,
}

fn pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^(?:(?:(?P<h>\d+):)?(?P<m>[0-5]?\d):)?(?P<s>[0-5]?\d)$").ok()
        })
        .as_ref()
}

impl Timestamp {
    pub fn from_seconds(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: ((total % 3600) / 60) as u8,
            seconds: (total % 60) as u8,
        }
    }

    pub fn from_hms(hours: u64, minutes: u64, seconds: u64) -> Self {
        let total = hours
            .saturating_mul(3600)
            .saturating_add(minutes.saturating_mul(60))
            .saturating_add(seconds);
        Self::from_seconds(total)
    }

    /// Parse `[[H+:]M[M]:]S[S]` with minutes and seconds in `0..60`.
    pub fn parse(text: &str) -> Result<Self, InputError> {
        let text = text.trim();
        let captures = pattern()
            .and_then(|pattern| pattern.captures(text))
            .ok_or_else(|| InputError::invalid_timestamp(text))?;

        let group = |name: &str| -> Result<u64, InputError> {
            match captures.name(name) {
                Some(value) => value
                    .as_str()
                    .parse::<u64>()
                    .map_err(|_| InputError::invalid_timestamp(text)),
                None => Ok(0),
            }
        };

        let hours = group("h")?;
        if hours > u64::MAX / 3600 {
            return Err(InputError::invalid_timestamp(text));
        }

        Ok(Self::from_hms(hours, group("m")?, group("s")?))
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }

    /// Index of the fixed-length segment that contains this point.
    pub fn to_segment_index(&self, segment_seconds: NonZeroU64) -> u64 {
        self.total_seconds() / segment_seconds.get()
    }

    /// `HH:MM:SS`
    pub fn human(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }

    /// `HH-MM-SS`, safe for file names.
    pub fn machine(&self) -> String {
        format!("{:02}-{:02}-{:02}", self.hours, self.minutes, self.seconds)
    }

    fn offset(self, delta: i128) -> Self {
        let total = (i128::from(self.total_seconds()) + delta).clamp(0, i128::from(u64::MAX));
        Self::from_seconds(total as u64)
    }
}

/// Shift forward by a signed number of seconds, clamping at zero.
impl Add<i64> for Timestamp {
    type Output = Timestamp;

    fn add(self, seconds: i64) -> Self::Output {
        self.offset(i128::from(seconds))
    }
}

/// Shift backward by a signed number of seconds, clamping at zero.
impl Sub<i64> for Timestamp {
    type Output = Timestamp;

    fn sub(self, seconds: i64) -> Self::Output {
        self.offset(-i128::from(seconds))
    }
}

impl FromStr for Timestamp {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.human())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn two() -> NonZeroU64 {
        NonZeroU64::new(2).unwrap()
    }

    #[test]
    fn parses_all_shapes() {
        assert_eq!(Timestamp::parse("1:02:03").unwrap(), Timestamp::from_hms(1, 2, 3));
        assert_eq!(Timestamp::parse("01:02:03").unwrap(), Timestamp::from_hms(1, 2, 3));
        assert_eq!(Timestamp::parse("123:00:59").unwrap(), Timestamp::from_hms(123, 0, 59));
        assert_eq!(Timestamp::parse("2:03").unwrap(), Timestamp::from_hms(0, 2, 3));
        assert_eq!(Timestamp::parse("45").unwrap(), Timestamp::from_hms(0, 0, 45));
        assert_eq!(Timestamp::parse(" 0:5 ").unwrap(), Timestamp::from_hms(0, 0, 5));
    }

    #[test]
    fn rejects_other_shapes() {
        for text in ["", "1:60:00", "1:00:60", "abc", "1:2:3:4", "1::3", ":30", "1:02:03x", "-1:00"] {
            assert!(
                matches!(Timestamp::parse(text), Err(InputError::InvalidTimestamp { .. })),
                "{text:?}"
            );
        }
    }

    #[test]
    fn rejects_overflowing_hours() {
        assert!(Timestamp::parse("99999999999999999999999:00:00").is_err());
    }

    #[test]
    fn arithmetic_clamps_and_renormalizes() {
        let ts = Timestamp::parse("1:02:03").unwrap();

        assert_eq!(ts - 10_000, Timestamp::default());
        assert_eq!(ts + 5, Timestamp::from_hms(1, 2, 8));
        assert_eq!(ts + 57, Timestamp::from_hms(1, 3, 0));
        assert_eq!(ts + -3_723, Timestamp::default());
        assert_eq!(ts - -57, Timestamp::from_hms(1, 3, 0));
    }

    #[test]
    fn segment_index_floors() {
        assert_eq!(Timestamp::from_hms(0, 0, 5).to_segment_index(two()), 2);
        assert_eq!(Timestamp::from_hms(0, 0, 4).to_segment_index(two()), 2);
        assert_eq!(Timestamp::from_hms(0, 0, 3).to_segment_index(two()), 1);
        assert_eq!(Timestamp::from_hms(0, 0, 0).to_segment_index(two()), 0);
    }

    #[test]
    fn renders_zero_padded() {
        let ts = Timestamp::from_hms(1, 2, 3);
        assert_eq!(ts.human(), "01:02:03");
        assert_eq!(ts.machine(), "01-02-03");
        assert_eq!(Timestamp::from_hms(100, 0, 0).machine(), "100-00-00");
        assert_eq!(ts.to_string(), "01:02:03");
    }

    #[test]
    fn pattern_compiles() {
        assert!(pattern().is_some());
    }

    #[test]
    fn from_hms_normalizes() {
        let ts = Timestamp::from_hms(0, 61, 75);
        assert_eq!((ts.hours, ts.minutes, ts.seconds), (1, 2, 15));
    }

    proptest! {
        #[test]
        fn render_then_parse_preserves_total(h in 0u64..10_000, m in 0u64..60, s in 0u64..60) {
            let ts = Timestamp::parse(&Timestamp::from_hms(h, m, s).human()).unwrap();
            prop_assert_eq!(ts.total_seconds(), h * 3600 + m * 60 + s);
        }

        #[test]
        fn subtraction_never_goes_negative(total in 0u64..1_000_000, s in 0i64..2_000_000) {
            let ts = Timestamp::from_seconds(total) - s;
            prop_assert_eq!(ts.total_seconds() as i64, (total as i64 - s).max(0));
        }

        #[test]
        fn segment_index_is_monotonic(a in 0u64..1_000_000, b in 0u64..1_000_000, len in 1u64..30) {
            let (lo, hi) = (a.min(b), a.max(b));
            let len = NonZeroU64::new(len).unwrap();
            prop_assert!(
                Timestamp::from_seconds(lo).to_segment_index(len)
                    <= Timestamp::from_seconds(hi).to_segment_index(len)
            );
        }

        #[test]
        fn ordering_matches_total_seconds(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            prop_assert_eq!(
                Timestamp::from_seconds(a).cmp(&Timestamp::from_seconds(b)),
                a.cmp(&b)
            );
        }
    }
}
