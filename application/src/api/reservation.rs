//! [`Reservation`]-related definitions.

use common::{Date, DateTime, Handler as _, Money};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, AsError, Context, Error};

/// Confirmed booking of a `Property`.
#[derive(Debug)]
pub struct Reservation {
    /// Underlying [`domain::Reservation`].
    reservation: domain::Reservation,

    /// Reserved [`api::Property`].
    property: OnceCell<api::Property>,
}

impl From<domain::Reservation> for Reservation {
    fn from(reservation: domain::Reservation) -> Self {
        Self {
            reservation,
            property: OnceCell::new(),
        }
    }
}

/// Confirmed booking of a `Property`.
#[graphql_object(context = Context)]
impl Reservation {
    /// Unique identifier of this `Reservation`.
    pub fn id(&self) -> Id {
        self.reservation.id.into()
    }

    /// Reserved `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Reservation.property",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn property(
        &self,
        ctx: &Context,
    ) -> Result<&api::Property, Error> {
        let id = self.reservation.property_id;
        self.property
            .get_or_try_init(|| async {
                ctx.service()
                    .execute(query::property::ById::by(id))
                    .await
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())?
                    .ok_or_else(|| api::PropertyError::NotExists.into())
                    .map_err(ctx.error())
                    .map(Into::into)
            })
            .await
    }

    /// ID of the guest who made this `Reservation`.
    pub fn guest_id(&self) -> api::user::Id {
        self.reservation.guest_id.into()
    }

    /// ID of the host of the reserved `Property`.
    pub fn host_id(&self) -> api::user::Id {
        self.reservation.host_id.into()
    }

    /// First night of the stay.
    pub fn start_date(&self) -> Date {
        self.reservation.stay.start()
    }

    /// Check-out `Date`, not included into the stay.
    pub fn end_date(&self) -> Date {
        self.reservation.stay.end()
    }

    /// Number of reserved nights.
    pub fn nights(&self) -> Result<i32, Error> {
        i32::try_from(self.reservation.stay.nights().get())
            .map_err(AsError::into_error)
    }

    /// Number of guests staying.
    pub fn guests(&self) -> i32 {
        self.reservation.guests.get().into()
    }

    /// Total price fixed at the moment of reserving.
    pub fn total_price(&self) -> Money {
        self.reservation.total_price
    }

    /// State of the review for this `Reservation`.
    pub fn review_state(&self) -> ReviewState {
        self.reservation.eligibility.into()
    }

    /// `DateTime` when this `Reservation` was created.
    pub fn created_at(&self) -> DateTime {
        self.reservation.created_at.coerce()
    }
}

/// Unique identifier of a `Reservation`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::reservation::Id)]
#[into(domain::reservation::Id)]
#[graphql(name = "ReservationId", transparent)]
pub struct Id(Uuid);

/// State of the review for a `Reservation`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "ReviewState")]
pub enum ReviewState {
    /// Stay occurred, the host hasn't enabled a review.
    Completed,

    /// Host enabled a review, the guest hasn't left it yet.
    ReviewEnabled,

    /// Guest has left the review.
    Reviewed,
}

impl From<domain::review::Eligibility> for ReviewState {
    fn from(eligibility: domain::review::Eligibility) -> Self {
        use domain::review::Eligibility as E;
        match eligibility {
            E::Completed => Self::Completed,
            E::ReviewEnabled => Self::ReviewEnabled,
            E::Reviewed => Self::Reviewed,
        }
    }
}

#[cfg(test)]
mod spec {
    use service::domain::review::Eligibility;

    use super::ReviewState;

    #[test]
    fn exposes_every_review_state() {
        assert_eq!(
            Eligibility::ALL
                .iter()
                .copied()
                .map(ReviewState::from)
                .collect::<Vec<_>>(),
            [
                ReviewState::Completed,
                ReviewState::ReviewEnabled,
                ReviewState::Reviewed,
            ],
        );
    }
}
