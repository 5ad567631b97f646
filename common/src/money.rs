//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{prelude::ToPrimitive as _, Decimal};

/// Non-negative amount of money.
///
/// Stored as a [`Decimal`], so multiplying a nightly rate by many nights
/// doesn't drift the way floating-point arithmetic does.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Money(Decimal);

impl Money {
    /// Zero amount of [`Money`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Money`] if the provided `amount` is not negative.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        (amount >= Decimal::ZERO).then_some(Self(amount.normalize()))
    }

    /// Returns the amount of this [`Money`].
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks whether this [`Money`] is greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Multiplies this [`Money`] by the provided `times`.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn checked_mul(self, times: u32) -> Option<Self> {
        self.0
            .checked_mul(Decimal::from(times))
            .map(|amount| Self(amount.normalize()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_integer() {
            if let Some(int) = self.0.to_i128() {
                return write!(f, "{int}");
            }
        }
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s).map_err(|_| "invalid amount")?;
        Self::new(amount).ok_or("negative amount")
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Non-negative money amount in `{major}.{minor}` format, where:
    /// - `major` is an integer;
    /// - `minor` is an optional integer.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use super::Money;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(money("123.45").amount(), Decimal::new(12345, 2));
        assert_eq!(money("100"), money("100.00"));
        assert_eq!(money("0"), Money::ZERO);

        assert!(Money::from_str("-1").is_err());
        assert!(Money::from_str("12USD").is_err());
        assert!(Money::from_str("").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(money("123.45").to_string(), "123.45");
        assert_eq!(money("123.40").to_string(), "123.4");
        assert_eq!(money("123.00").to_string(), "123");
        assert_eq!(money("300").to_string(), "300");
    }

    #[test]
    fn multiplies_without_drift() {
        assert_eq!(money("100.0").checked_mul(3), Some(money("300")));
        assert_eq!(money("0.1").checked_mul(30), Some(money("3")));
        assert_eq!(money("19.99").checked_mul(0), Some(Money::ZERO));
    }

    proptest! {
        #[test]
        fn mul_is_repeated_add(cents in 1_i64..10_000_000, n in 1_u32..1000) {
            let rate = Money::new(Decimal::new(cents, 2)).unwrap();
            let sum = (0..n).fold(Decimal::ZERO, |acc, _| acc + rate.amount());
            prop_assert_eq!(rate.checked_mul(n).unwrap().amount(), sum);
        }
    }
}
