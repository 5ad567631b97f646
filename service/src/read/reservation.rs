//! [`Reservation`]-related read definitions.

use common::DateRange;
use derive_more::Deref;

#[cfg(doc)]
use crate::domain::{Property, Reservation};
use crate::domain::{property, user};

/// Indicator whether a [`Property`] is free for some [`DateRange`].
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct IsAvailable(pub bool);

impl PartialEq<bool> for IsAvailable {
    fn eq(&self, other: &bool) -> bool {
        self.0 == *other
    }
}

/// Indicator whether a [`Property`] has any [`Reservation`]s at all.
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct IsReserved(pub bool);

/// [`DateRange`] of a [`Property`] to check the availability of.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Slot {
    /// ID of the [`Property`] to check.
    pub property_id: property::Id,

    /// Nights to check.
    pub stay: DateRange,
}

/// Selector of [`Reservation`]s made by a guest.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OfGuest(pub user::Id);

/// Selector of [`Reservation`]s of [`Property`]s owned by a host.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OfHost(pub user::Id);
