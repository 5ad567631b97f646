//! [`Property`] definitions.

use std::collections::BTreeSet;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateRange, DateTimeOf, Money, Nights};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user;

/// Rentable listing owned by a host.
#[derive(Clone, Debug)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: Id,

    /// ID of the host owning this [`Property`].
    ///
    /// Never changes once the [`Property`] is created.
    pub owner_id: user::Id,

    /// [`Title`] of this [`Property`].
    pub title: Title,

    /// [`Country`] this [`Property`] is located in.
    pub country: Country,

    /// [`City`] this [`Property`] is located in.
    pub city: City,

    /// [`Address`] of this [`Property`].
    pub address: Address,

    /// [`Description`] of this [`Property`].
    pub description: Description,

    /// [`NightlyRate`] of this [`Property`].
    pub nightly_rate: NightlyRate,

    /// [`Kind`] of this [`Property`].
    pub kind: Kind,

    /// [`Amenities`] this [`Property`] provides.
    pub amenities: Amenities,

    /// [`DateTime`] when this [`Property`] was created.
    pub created_at: CreationDateTime,
}

impl Property {
    /// Checks whether this [`Property`] is owned by the provided user.
    #[must_use]
    pub fn is_owned_by(&self, user_id: user::Id) -> bool {
        self.owner_id == user_id
    }
}

/// ID of a [`Property`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Defines a trimmed text value of a [`Property`], limited in length.
macro_rules! define_text {
    (
        #[doc = $doc:literal]
        $name:ident { max = $max:literal, allow_empty = $empty:literal }
    ) => {
        #[doc = $doc]
        #[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
        #[cfg_attr(
            feature = "postgres",
            derive(FromSql, ToSql),
            postgres(transparent)
        )]
        #[as_ref(forward)]
        pub struct $name(String);

        impl $name {
            /// Maximum number of characters.
            pub const MAX_LEN: usize = $max;

            #[doc = concat!(
                "Creates a new [`", stringify!($name), "`] out of the ",
                "provided `text` with its surrounding whitespace trimmed.",
            )]
            #[must_use]
            pub fn new(text: impl AsRef<str>) -> Option<Self> {
                let text = text.as_ref().trim();
                let len = text.chars().count();
                let fits = len <= Self::MAX_LEN && ($empty || len > 0);
                fits.then(|| Self(text.to_owned()))
            }
        }

        impl FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
                    .ok_or(concat!("invalid `", stringify!($name), "`"))
            }
        }
    };
}

define_text! {
    #[doc = "Title of a [`Property`]."]
    Title { max = 256, allow_empty = false }
}

define_text! {
    #[doc = "Country a [`Property`] is located in."]
    Country { max = 128, allow_empty = false }
}

define_text! {
    #[doc = "City a [`Property`] is located in."]
    City { max = 128, allow_empty = false }
}

define_text! {
    #[doc = "Street address of a [`Property`]."]
    Address { max = 512, allow_empty = false }
}

define_text! {
    #[doc = "Free-form description of a [`Property`]."]
    Description { max = 4096, allow_empty = true }
}

define_text! {
    #[doc = "URL of a [`Property`] image, stored by an external uploader."]
    ImageUrl { max = 2048, allow_empty = false }
}

/// Price of a single night in a [`Property`].
///
/// Always positive.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct NightlyRate(Money);

impl NightlyRate {
    /// Creates a new [`NightlyRate`] if the provided `amount` is positive.
    #[must_use]
    pub fn new(amount: Money) -> Option<Self> {
        amount.is_positive().then_some(Self(amount))
    }

    /// Returns the [`Money`] amount of this [`NightlyRate`].
    #[must_use]
    pub const fn amount(self) -> Money {
        self.0
    }

    /// Prices the provided `stay` at this [`NightlyRate`].
    ///
    /// [`None`] is returned if the total overflows.
    #[must_use]
    pub fn quote(self, stay: &DateRange) -> Option<Quote> {
        let nights = stay.nights();
        let total = self.0.checked_mul(nights.get())?;
        Some(Quote { nights, total })
    }
}

/// Price of a stay in a [`Property`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Quote {
    /// Number of nights in the stay.
    pub nights: Nights,

    /// Total price of all the nights.
    pub total: Money,
}

define_kind! {
    #[doc = "Kind of a [`Property`]."]
    enum Kind {
        #[doc = "An apartment in a building."]
        Apartment = 1,

        #[doc = "A whole house."]
        House = 2,

        #[doc = "A single room."]
        Room = 3,

        #[doc = "Anything else."]
        Other = 4,
    }
}

define_kind! {
    #[doc = "Capability a [`Property`] may provide."]
    enum Amenity {
        #[doc = "Wireless internet."]
        Wifi = 1,

        #[doc = "Air conditioning."]
        AirConditioning = 2,

        #[doc = "Kitchen available to guests."]
        Kitchen = 3,

        #[doc = "Parking place."]
        Parking = 4,

        #[doc = "Pets are allowed."]
        PetsAllowed = 5,

        #[doc = "Swimming pool."]
        Pool = 6,

        #[doc = "Washing machine."]
        Washer = 7,

        #[doc = "Clothes dryer."]
        Dryer = 8,

        #[doc = "Television."]
        Tv = 9,

        #[doc = "Heating."]
        Heating = 10,

        #[doc = "Balcony."]
        Balcony = 11,
    }
}

/// Set of [`Amenity`]s a [`Property`] provides.
///
/// An empty set is a valid one: such a [`Property`] has no amenity records.
#[derive(Clone, Debug, Default, Eq, From, Into, PartialEq)]
pub struct Amenities(BTreeSet<Amenity>);

impl Amenities {
    /// Checks whether the provided [`Amenity`] is in this set.
    #[must_use]
    pub fn contains(&self, amenity: Amenity) -> bool {
        self.0.contains(&amenity)
    }

    /// Checks whether this set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the [`Amenity`]s in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Amenity> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Amenity> for Amenities {
    fn from_iter<I: IntoIterator<Item = Amenity>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Image of a [`Property`].
#[derive(Clone, Debug)]
pub struct Image {
    /// ID of the [`Property`] this [`Image`] depicts.
    pub property_id: Id,

    /// [`ImageUrl`] of this [`Image`].
    pub url: ImageUrl,

    /// [`DateTime`] when this [`Image`] was added.
    pub added_at: ImageCreationDateTime,
}

/// [`DateTime`] when a [`Property`] was created.
pub type CreationDateTime = DateTimeOf<(Property, unit::Creation)>;

/// [`DateTime`] when an [`Image`] was added.
pub type ImageCreationDateTime = DateTimeOf<(Image, unit::Creation)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Date, DateRange, Money};
    use proptest::prelude::*;

    use super::{Amenities, Amenity, Description, NightlyRate, Title};

    fn rate(amount: &str) -> NightlyRate {
        NightlyRate::new(Money::from_str(amount).unwrap()).unwrap()
    }

    fn stay(start: &str, end: &str) -> DateRange {
        DateRange::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
    }

    #[test]
    fn quotes_nights_times_rate() {
        let quote = rate("100.0").quote(&stay("2024-06-01", "2024-06-04"));

        let quote = quote.unwrap();
        assert_eq!(quote.nights.get(), 3);
        assert_eq!(quote.total, Money::from_str("300").unwrap());
    }

    #[test]
    fn rejects_non_positive_rate() {
        assert!(NightlyRate::new(Money::ZERO).is_none());
        assert!(NightlyRate::new(Money::from_str("0.01").unwrap()).is_some());
    }

    #[test]
    fn trims_and_limits_text() {
        assert_eq!(Title::new("  Loft  ").unwrap().to_string(), "Loft");
        assert!(Title::new("   ").is_none());
        assert!(Title::new("x".repeat(256)).is_some());
        assert!(Title::new("x".repeat(257)).is_none());

        assert_eq!(Description::new("").unwrap().to_string(), "");
        assert!(Description::new("é".repeat(4096)).is_some());
    }

    #[test]
    fn collects_amenities_once() {
        let set = [Amenity::Wifi, Amenity::Pool, Amenity::Wifi]
            .into_iter()
            .collect::<Amenities>();

        assert!(set.contains(Amenity::Wifi));
        assert!(!set.contains(Amenity::Balcony));
        assert_eq!(set.iter().count(), 2);
        assert_eq!(Amenity::ALL.len(), 11);
    }

    proptest! {
        #[test]
        fn quote_is_linear_in_nights(cents in 1_i64..1_000_000, n in 1_i64..400) {
            let rate = NightlyRate::new(
                Money::new(rust_decimal::Decimal::new(cents, 2)).unwrap(),
            )
            .unwrap();
            let start = Date::from_calendar(2024, 1, 1).unwrap();
            let stay = DateRange::new(start, start.add_days(n).unwrap()).unwrap();

            let quote = rate.quote(&stay).unwrap();
            prop_assert_eq!(i64::from(quote.nights.get()), n);
            prop_assert_eq!(
                quote.total.amount(),
                rate.amount().amount() * rust_decimal::Decimal::from(n),
            );
        }
    }
}
