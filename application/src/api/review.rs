//! [`Review`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLObject, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{api, api::scalar, Context};

/// Guest's review of a `Property`, left for exactly one `Reservation`.
#[derive(Clone, Debug, From)]
pub struct Review(domain::Review);

/// Guest's review of a `Property`, left for exactly one `Reservation`.
#[graphql_object(context = Context)]
impl Review {
    /// Unique identifier of this `Review`.
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// ID of the reviewed `Property`.
    pub fn property_id(&self) -> api::property::Id {
        self.0.property_id.into()
    }

    /// ID of the guest who wrote this `Review`.
    pub fn author_id(&self) -> api::user::Id {
        self.0.author_id.into()
    }

    /// ID of the `Reservation` this `Review` is left for.
    pub fn reservation_id(&self) -> api::reservation::Id {
        self.0.reservation_id.into()
    }

    /// Rating from `1` to `5` stars.
    pub fn rating(&self) -> i32 {
        self.0.rating.get().into()
    }

    /// Comment about the stay.
    pub fn comment(&self) -> Comment {
        self.0.comment.clone().into()
    }

    /// `DateTime` when this `Review` was created.
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Review`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::review::Id)]
#[into(domain::review::Id)]
#[graphql(name = "ReviewId", transparent)]
pub struct Id(Uuid);

/// Comment of a `Review`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ReviewComment",
    with = scalar::Via::<domain::review::Comment>,
)]
pub struct Comment(domain::review::Comment);

/// Whether the current `User` may review a `Property`.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "ReviewEligibility")]
pub struct Eligibility {
    /// Indicator whether a `Review` may be left.
    pub can_review: bool,

    /// `Reservation` to leave the `Review` for, if any.
    pub reservation_id: Option<api::reservation::Id>,
}

impl From<service::read::review::Eligible> for Eligibility {
    fn from(eligible: service::read::review::Eligible) -> Self {
        Self {
            can_review: eligible.can_review(),
            reservation_id: eligible.0.map(Into::into),
        }
    }
}
