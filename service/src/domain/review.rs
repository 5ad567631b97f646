//! [`Review`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Property, Reservation};
use crate::domain::{property, reservation, user};

/// Guest's review of a [`Property`], left for exactly one [`Reservation`].
#[derive(Clone, Debug)]
pub struct Review {
    /// ID of this [`Review`].
    pub id: Id,

    /// ID of the reviewed [`Property`].
    pub property_id: property::Id,

    /// ID of the guest who wrote this [`Review`].
    pub author_id: user::Id,

    /// ID of the [`Reservation`] this [`Review`] is left for.
    pub reservation_id: reservation::Id,

    /// [`Rating`] given in this [`Review`].
    pub rating: Rating,

    /// [`Comment`] of this [`Review`].
    pub comment: Comment,

    /// [`DateTime`] when this [`Review`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Review`].
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

/// Rating of a [`Review`], from `1` to `5` stars.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd)]
pub struct Rating(u8);

impl Rating {
    /// Lowest possible [`Rating`].
    pub const MIN: Self = Self(1);

    /// Highest possible [`Rating`].
    pub const MAX: Self = Self(5);

    /// Creates a new [`Rating`] if the provided `stars` are in range.
    #[must_use]
    pub fn new(stars: impl TryInto<u8>) -> Option<Self> {
        let stars = stars.try_into().ok()?;
        (Self::MIN.0..=Self::MAX.0)
            .contains(&stars)
            .then_some(Self(stars))
    }

    /// Returns the number of stars.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Comment of a [`Review`].
///
/// Trimmed, non-empty and at most [`Comment::MAX_LEN`] characters. The
/// minimal length is a matter of configuration, so isn't checked here.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Comment(String);

impl Comment {
    /// Maximum number of characters in a [`Comment`].
    pub const MAX_LEN: usize = 4096;

    /// Creates a new [`Comment`] out of the provided `text` trimmed.
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        let len = text.chars().count();
        (len > 0 && len <= Self::MAX_LEN).then(|| Self(text.to_owned()))
    }

    /// Returns the number of characters in this [`Comment`].
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl FromStr for Comment {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Comment`")
    }
}

define_kind! {
    #[doc = "Review eligibility of a [`Reservation`]."]
    enum Eligibility {
        #[doc = "Stay occurred, the host hasn't enabled a review."]
        Completed = 1,

        #[doc = "Host enabled a review, the guest hasn't left it yet."]
        ReviewEnabled = 2,

        #[doc = "Guest has left the review."]
        Reviewed = 3,
    }
}

impl Eligibility {
    /// Returns the [`Eligibility`] after the host enables a review.
    ///
    /// Enabling is idempotent and never reverts a [`Eligibility::Reviewed`].
    #[must_use]
    pub const fn enabled(self) -> Self {
        match self {
            Self::Completed | Self::ReviewEnabled => Self::ReviewEnabled,
            Self::Reviewed => Self::Reviewed,
        }
    }

    /// Returns the [`Eligibility`] after the guest leaves a review.
    ///
    /// [`None`] is returned if a review cannot be left in this state.
    #[must_use]
    pub const fn reviewed(self) -> Option<Self> {
        match self {
            Self::ReviewEnabled => Some(Self::Reviewed),
            Self::Completed | Self::Reviewed => None,
        }
    }

    /// Indicates whether a review may be left in this state.
    #[must_use]
    pub const fn can_review(self) -> bool {
        matches!(self, Self::ReviewEnabled)
    }
}

/// [`DateTime`] when a [`Review`] was created.
pub type CreationDateTime = DateTimeOf<(Review, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Comment, Eligibility, Rating};

    #[test]
    fn rating_is_one_to_five() {
        assert!(Rating::new(0).is_none());
        assert!(Rating::new(6).is_none());
        assert!(Rating::new(-1).is_none());
        assert_eq!(Rating::new(1), Some(Rating::MIN));
        assert_eq!(Rating::new(5), Some(Rating::MAX));
    }

    #[test]
    fn comment_is_trimmed() {
        let comment = Comment::new("  Lovely stay!  ").unwrap();

        assert_eq!(comment.to_string(), "Lovely stay!");
        assert_eq!(comment.char_count(), 12);
        assert!(Comment::new(" \n\t ").is_none());
    }

    #[test]
    fn eligibility_moves_forward_only() {
        use Eligibility as E;

        assert_eq!(E::Completed.enabled(), E::ReviewEnabled);
        assert_eq!(E::ReviewEnabled.enabled(), E::ReviewEnabled);
        assert_eq!(E::Reviewed.enabled(), E::Reviewed);

        assert_eq!(E::Completed.reviewed(), None);
        assert_eq!(E::ReviewEnabled.reviewed(), Some(E::Reviewed));
        assert_eq!(E::Reviewed.reviewed(), None);

        assert!(E::ReviewEnabled.can_review());
        assert!(!E::Completed.can_review());
        assert!(!E::Reviewed.can_review());
    }
}
