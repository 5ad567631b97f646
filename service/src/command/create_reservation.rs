//! [`Command`] for reserving a [`Property`].

use common::{
    date::InvalidRange,
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Date, DateRange, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        property,
        reservation::{self, GuestCount},
        review::Eligibility,
        user, Property, Reservation,
    },
    error::{Categorize, Kind},
    infra::{
        database::{self, Constraint},
        Database,
    },
    read::reservation::{IsAvailable, Slot},
    Service,
};

use super::Command;

/// [`Command`] for reserving a [`Property`].
///
/// Checks go in order: the [`Property`] exists, the guest doesn't own it, the
/// stay is not empty, its nights are free.
///
/// The availability check and the insertion happen in a single transaction
/// holding the [`Property`] locked, so two overlapping requests never both
/// succeed.
#[derive(Clone, Debug)]
pub struct CreateReservation {
    /// ID of the [`Property`] to reserve.
    pub property_id: property::Id,

    /// ID of the guest making the [`Reservation`].
    pub guest_id: user::Id,

    /// Number of guests staying.
    pub guests: GuestCount,

    /// First night of the stay.
    pub start: Date,

    /// Check-out [`Date`], not included into the stay.
    pub end: Date,
}

impl<Db> Command<CreateReservation> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Property, property::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<IsAvailable, Slot>>,
            Ok = IsAvailable,
            Err = Traced<database::Error>,
        > + Database<Insert<Reservation>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Reservation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateReservation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateReservation {
            property_id,
            guest_id,
            guests,
            start,
            end,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize reservations of the same `Property`.
        tx.execute(Lock(By::<Property, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if property.is_owned_by(guest_id) {
            return Err(tracerr::new!(E::SelfBookingNotAllowed(guest_id)));
        }

        let stay = DateRange::new(start, end)
            .map_err(E::InvalidRange)
            .map_err(tracerr::wrap!())?;

        let available = tx
            .execute(Select(By::<IsAvailable, _>::new(Slot {
                property_id,
                stay,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !*available {
            log::debug!(
                "`Property(id: {property_id})` is unavailable for {stay}, \
                 rejecting `User(id: {guest_id})`",
            );
            return Err(tracerr::new!(E::DatesUnavailable(stay)));
        }

        let quote = property
            .nightly_rate
            .quote(&stay)
            .ok_or(E::PriceOverflow(stay))
            .map_err(tracerr::wrap!())?;

        let reservation = Reservation {
            id: reservation::Id::new(),
            property_id,
            guest_id,
            host_id: property.owner_id,
            stay,
            guests,
            total_price: quote.total,
            eligibility: Eligibility::Completed,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(reservation.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().violated_constraint()
                    == Some(Constraint::NoOverlappingReservations)
                {
                    tracerr::new!(E::DatesUnavailable(stay))
                } else {
                    tracerr::map_from(e)
                }
            })
            .map_err(tracerr::wrap!())?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "`Reservation(id: {})` of `Property(id: {property_id})` for {stay} \
             created by `User(id: {guest_id})`, total {}",
            reservation.id,
            reservation.total_price,
        );

        Ok(reservation)
    }
}

/// Error of [`CreateReservation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Check-out [`Date`] is not after the first night.
    #[display("Invalid stay: {_0}")]
    #[from(ignore)]
    InvalidRange(InvalidRange),

    /// [`Property`] doesn't exist.
    #[display("`Property(id: {_0})` does not exist")]
    #[from(ignore)]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// Guest owns the [`Property`].
    #[display("`User(id: {_0})` cannot reserve an own `Property`")]
    #[from(ignore)]
    SelfBookingNotAllowed(#[error(not(source))] user::Id),

    /// Some night of the stay is already reserved.
    #[display("Some night of {_0} is already reserved")]
    #[from(ignore)]
    DatesUnavailable(#[error(not(source))] DateRange),

    /// Total price of the stay is not representable.
    #[display("Total price of {_0} is too large")]
    #[from(ignore)]
    PriceOverflow(#[error(not(source))] DateRange),
}

impl Categorize for ExecutionError {
    fn kind(&self) -> Kind {
        match self {
            Self::Db(e) => e.kind(),
            Self::InvalidRange(_) | Self::PriceOverflow(_) => {
                Kind::InvalidInput
            }
            Self::PropertyNotExists(_) => Kind::NotFound,
            Self::SelfBookingNotAllowed(_) => Kind::NotAuthorized,
            Self::DatesUnavailable(_) => Kind::Conflict,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Date, Money};

    use crate::{
        command::CreateProperty,
        domain::{property, reservation::GuestCount, user, Property},
        error::{Categorize as _, Kind},
        infra::Memory,
        Command as _, Config, Service,
    };

    use super::{CreateReservation, ExecutionError};

    async fn listed(svc: &Service<Memory>, rate: &str) -> Property {
        svc.execute(CreateProperty {
            owner_id: user::Id::from(1),
            title: property::Title::new("Loft").unwrap(),
            country: property::Country::new("France").unwrap(),
            city: property::City::new("Paris").unwrap(),
            address: property::Address::new("1 Rue de Rivoli").unwrap(),
            description: property::Description::new("").unwrap(),
            nightly_rate: property::NightlyRate::new(
                Money::from_str(rate).unwrap(),
            )
            .unwrap(),
            kind: property::Kind::Apartment,
            amenities: property::Amenities::default(),
        })
        .await
        .unwrap()
    }

    fn reserve(
        property: &Property,
        guest: i64,
        start: &str,
        end: &str,
    ) -> CreateReservation {
        CreateReservation {
            property_id: property.id,
            guest_id: user::Id::from(guest),
            guests: GuestCount::new(2).unwrap(),
            start: Date::from_str(start).unwrap(),
            end: Date::from_str(end).unwrap(),
        }
    }

    #[tokio::test]
    async fn computes_total_from_nights() {
        let svc = Service::new(Config::default(), Memory::new());
        let property = listed(&svc, "100.0").await;

        let reservation = svc
            .execute(reserve(&property, 2, "2024-06-01", "2024-06-04"))
            .await
            .unwrap();

        assert_eq!(reservation.total_price, Money::from_str("300").unwrap());
        assert_eq!(reservation.stay.nights().get(), 3);
        assert_eq!(reservation.host_id, property.owner_id);
        assert!(!reservation.is_review_enabled());
    }

    #[tokio::test]
    async fn rejects_overlap_but_accepts_boundary_touch() {
        let svc = Service::new(Config::default(), Memory::new());
        let property = listed(&svc, "100").await;

        _ = svc
            .execute(reserve(&property, 2, "2024-06-01", "2024-06-05"))
            .await
            .unwrap();

        let err = svc
            .execute(reserve(&property, 3, "2024-06-04", "2024-06-08"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::DatesUnavailable(_)));
        assert_eq!(err.kind(), Kind::Conflict);

        _ = svc
            .execute(reserve(&property, 3, "2024-06-05", "2024-06-08"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejects_self_booking() {
        let svc = Service::new(Config::default(), Memory::new());
        let property = listed(&svc, "100").await;

        let err = svc
            .execute(reserve(&property, 1, "2024-06-01", "2024-06-02"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::SelfBookingNotAllowed(_),
        ));
    }

    #[tokio::test]
    async fn rejects_empty_stay() {
        let svc = Service::new(Config::default(), Memory::new());
        let property = listed(&svc, "100").await;

        for end in ["2024-06-01", "2024-05-30"] {
            let err = svc
                .execute(reserve(&property, 2, "2024-06-01", end))
                .await
                .unwrap_err();

            assert!(matches!(err.as_ref(), ExecutionError::InvalidRange(_)));
            assert_eq!(err.kind(), Kind::InvalidInput);
        }
    }

    #[tokio::test]
    async fn reports_self_booking_before_range() {
        let svc = Service::new(Config::default(), Memory::new());
        let property = listed(&svc, "100").await;

        let err = svc
            .execute(reserve(&property, 1, "2024-06-05", "2024-06-01"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::SelfBookingNotAllowed(_),
        ));

        let err = svc
            .execute(CreateReservation {
                property_id: property::Id::new(),
                ..reserve(&property, 2, "2024-06-05", "2024-06-01")
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::PropertyNotExists(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_property() {
        let svc = Service::new(Config::default(), Memory::new());

        let err = svc
            .execute(CreateReservation {
                property_id: property::Id::new(),
                guest_id: user::Id::from(2),
                guests: GuestCount::new(1).unwrap(),
                start: Date::from_str("2024-06-01").unwrap(),
                end: Date::from_str("2024-06-02").unwrap(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Kind::NotFound);
    }

    #[tokio::test]
    async fn concurrent_overlapping_requests_succeed_once() {
        let svc = Service::new(Config::default(), Memory::new());
        let property = listed(&svc, "100").await;

        let (a, b) = tokio::join!(
            svc.execute(reserve(&property, 2, "2024-06-01", "2024-06-05")),
            svc.execute(reserve(&property, 3, "2024-06-03", "2024-06-07")),
        );

        assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
        let err = a.err().or(b.err()).unwrap();
        assert!(matches!(err.as_ref(), ExecutionError::DatesUnavailable(_)));
    }
}
