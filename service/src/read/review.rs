//! [`Review`]-related read definitions.

use derive_more::Deref;

#[cfg(doc)]
use crate::domain::{Property, Reservation, Review};
use crate::domain::{property, reservation, user};

/// [`Reservation`] a guest may leave a [`Review`] for, if any.
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct Eligible(pub Option<reservation::Id>);

impl Eligible {
    /// Indicates whether a [`Review`] may be left.
    #[must_use]
    pub const fn can_review(&self) -> bool {
        self.0.is_some()
    }
}

/// Guest wishing to leave a [`Review`] for a [`Property`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Candidate {
    /// ID of the guest.
    pub guest_id: user::Id,

    /// ID of the [`Property`] to review.
    pub property_id: property::Id,
}
