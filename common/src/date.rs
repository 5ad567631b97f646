//! Calendar [`Date`]s and half-open [`DateRange`]s of them.

use std::{fmt, str::FromStr};

use derive_more::{Display, Error, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use time::macros::format_description;

/// Calendar date without a time zone.
#[derive(
    Clone, Copy, Debug, Eq, From, Hash, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Date(time::Date);

impl Date {
    /// Creates a new [`Date`] out of the provided calendar components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn from_calendar(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = time::Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day).ok().map(Self)
    }

    /// Returns the [`Date`] the provided number of `days` later.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn add_days(self, days: i64) -> Option<Self> {
        self.0
            .checked_add(time::Duration::days(days))
            .map(Self)
    }

    /// Returns the number of whole days from this [`Date`] to the `other`
    /// one (negative if `other` is earlier).
    #[must_use]
    pub fn days_until(self, other: Self) -> i64 {
        (other.0 - self.0).whole_days()
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day(),
        )
    }
}

impl FromStr for Date {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::Date::parse(s, format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| "expected `YYYY-MM-DD` date")
    }
}

/// Number of nights in a [`DateRange`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd)]
pub struct Nights(u32);

impl Nights {
    /// Returns the number of nights as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Half-open range of [`Date`]s: `start` is included, `end` is excluded.
///
/// Always spans at least one night.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DateRange {
    /// First [`Date`] of this [`DateRange`].
    start: Date,

    /// First [`Date`] after this [`DateRange`].
    end: Date,
}

impl DateRange {
    /// Creates a new [`DateRange`] of `[start, end)`.
    ///
    /// # Errors
    ///
    /// If `end` is not after `start`.
    pub fn new(start: Date, end: Date) -> Result<Self, InvalidRange> {
        if end <= start {
            return Err(InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns the first [`Date`] of this [`DateRange`].
    #[must_use]
    pub const fn start(&self) -> Date {
        self.start
    }

    /// Returns the first [`Date`] after this [`DateRange`].
    #[must_use]
    pub const fn end(&self) -> Date {
        self.end
    }

    /// Returns the number of [`Nights`] in this [`DateRange`].
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn nights(&self) -> Nights {
        // `time::Date` spans less than `u32::MAX` days.
        Nights(
            u32::try_from(self.start.days_until(self.end))
                .expect("positive and bounded by `time::Date` range"),
        )
    }

    /// Checks whether this [`DateRange`] shares at least one night with the
    /// `other` one.
    ///
    /// Ranges touching at a boundary date don't overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Error of creating a [`DateRange`] whose end is not after its start.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`{end}` is not after `{start}`")]
pub struct InvalidRange {
    /// Requested start of the range.
    pub start: Date,

    /// Requested end of the range.
    pub end: Date,
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Calendar date in `YYYY-MM-DD` format.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Date = super::Date;

    impl Date {
        fn to_output<S: ScalarValue>(d: &Date) -> Value<S> {
            Value::scalar(d.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Date` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Date` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use proptest::prelude::*;

    use super::{Date, DateRange};

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(date(start), date(end)).unwrap()
    }

    #[test]
    fn parses_and_displays() {
        assert_eq!(date("2024-06-01").to_string(), "2024-06-01");
        assert_eq!(
            date("2024-02-29"),
            Date::from_calendar(2024, 2, 29).unwrap(),
        );

        assert!("2024-6-1x".parse::<Date>().is_err());
        assert!("2023-02-29".parse::<Date>().is_err());
        assert!("".parse::<Date>().is_err());
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        assert!(DateRange::new(date("2024-06-04"), date("2024-06-04")).is_err());
        assert!(DateRange::new(date("2024-06-04"), date("2024-06-01")).is_err());
        assert!(DateRange::new(date("2024-06-01"), date("2024-06-02")).is_ok());
    }

    #[test]
    fn counts_nights() {
        assert_eq!(range("2024-06-01", "2024-06-04").nights().get(), 3);
        assert_eq!(range("2024-06-30", "2024-07-01").nights().get(), 1);
        assert_eq!(range("2023-12-31", "2024-12-31").nights().get(), 366);
    }

    #[test]
    fn overlaps_half_open() {
        let existing = range("2024-06-01", "2024-06-05");

        assert!(existing.overlaps(&range("2024-06-04", "2024-06-08")));
        assert!(!existing.overlaps(&range("2024-06-05", "2024-06-08")));
        assert!(!existing.overlaps(&range("2024-05-28", "2024-06-01")));
        assert!(existing.overlaps(&range("2024-05-01", "2024-07-01")));
        assert!(existing.overlaps(&range("2024-06-02", "2024-06-03")));
        assert!(existing.overlaps(&existing));
    }

    fn any_range() -> impl Strategy<Value = DateRange> {
        (0_i64..400, 1_i64..30).prop_map(|(offset, len)| {
            let base = Date::from_calendar(2024, 1, 1).unwrap();
            let start = base.add_days(offset).unwrap();
            DateRange::new(start, start.add_days(len).unwrap()).unwrap()
        })
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in any_range(), b in any_range()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn overlap_means_shared_night(a in any_range(), b in any_range()) {
            let shared = (0..i64::from(a.nights().get())).any(|n| {
                let night = a.start().add_days(n).unwrap();
                b.start() <= night && night < b.end()
            });
            prop_assert_eq!(a.overlaps(&b), shared);
        }
    }
}
