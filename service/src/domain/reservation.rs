//! [`Reservation`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateRange, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Property;
use crate::domain::{property, review::Eligibility, user};

/// Confirmed booking of a [`Property`] by a guest for a [`DateRange`].
///
/// Only the [`Eligibility`] changes after creation.
#[derive(Clone, Debug)]
pub struct Reservation {
    /// ID of this [`Reservation`].
    pub id: Id,

    /// ID of the reserved [`Property`].
    pub property_id: property::Id,

    /// ID of the guest who made this [`Reservation`].
    pub guest_id: user::Id,

    /// ID of the host owning the reserved [`Property`] at the moment this
    /// [`Reservation`] was made.
    pub host_id: user::Id,

    /// Reserved nights.
    pub stay: DateRange,

    /// Number of guests staying.
    pub guests: GuestCount,

    /// Total price computed at the moment this [`Reservation`] was made.
    pub total_price: Money,

    /// Review [`Eligibility`] of this [`Reservation`].
    pub eligibility: Eligibility,

    /// [`DateTime`] when this [`Reservation`] was created.
    pub created_at: CreationDateTime,
}

impl Reservation {
    /// Indicates whether the host has enabled reviewing this [`Reservation`].
    #[must_use]
    pub fn is_review_enabled(&self) -> bool {
        self.eligibility != Eligibility::Completed
    }
}

/// ID of a [`Reservation`].
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

/// Number of guests in a [`Reservation`].
///
/// Always positive.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd)]
pub struct GuestCount(u16);

impl GuestCount {
    /// Creates a new [`GuestCount`] if the provided `count` is positive and
    /// fits into [`u16`].
    #[must_use]
    pub fn new(count: impl TryInto<u16>) -> Option<Self> {
        count.try_into().ok().filter(|c| *c > 0).map(Self)
    }

    /// Returns the number of guests.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

/// [`DateTime`] when a [`Reservation`] was created.
pub type CreationDateTime = DateTimeOf<(Reservation, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::GuestCount;

    #[test]
    fn guest_count_is_positive() {
        assert!(GuestCount::new(0).is_none());
        assert!(GuestCount::new(-2).is_none());
        assert!(GuestCount::new(70_000).is_none());
        assert_eq!(GuestCount::new(4).map(GuestCount::get), Some(4));
    }
}
