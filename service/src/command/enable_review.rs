//! [`Command`] for enabling a [`Review`] of a [`Reservation`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Review;
use crate::{
    domain::{reservation, user, Reservation},
    error::{Categorize, Kind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for enabling a [`Review`] of a [`Reservation`] by its host.
///
/// Idempotent: enabling an already enabled (or reviewed) [`Reservation`]
/// changes nothing.
#[derive(Clone, Copy, Debug)]
pub struct EnableReview {
    /// ID of the [`Reservation`] to enable a [`Review`] for.
    pub reservation_id: reservation::Id,

    /// ID of the host requesting.
    pub host_id: user::Id,
}

impl<Db> Command<EnableReview> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Reservation, reservation::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Reservation>, reservation::Id>>,
            Ok = Option<Reservation>,
            Err = Traced<database::Error>,
        > + Database<
            Update<Reservation>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Reservation;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: EnableReview) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let EnableReview {
            reservation_id,
            host_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Reservation, _>::new(reservation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut reservation = tx
            .execute(Select(By::<Option<Reservation>, _>::new(reservation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ReservationNotExists(reservation_id))
            .map_err(tracerr::wrap!())?;
        if reservation.host_id != host_id {
            return Err(tracerr::new!(E::NotHost(host_id)));
        }

        let eligibility = reservation.eligibility.enabled();
        if reservation.eligibility == eligibility {
            return Ok(reservation);
        }

        reservation.eligibility = eligibility;
        tx.execute(Update(reservation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "Review of `Reservation(id: {reservation_id})` enabled by \
             `User(id: {host_id})`",
        );

        Ok(reservation)
    }
}

/// Error of [`EnableReview`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Reservation`] doesn't exist.
    #[display("`Reservation(id: {_0})` does not exist")]
    #[from(ignore)]
    ReservationNotExists(#[error(not(source))] reservation::Id),

    /// User is not the host of the [`Reservation`].
    #[display("`User(id: {_0})` is not the host of the `Reservation`")]
    #[from(ignore)]
    NotHost(#[error(not(source))] user::Id),
}

impl Categorize for ExecutionError {
    fn kind(&self) -> Kind {
        match self {
            Self::Db(e) => e.kind(),
            Self::ReservationNotExists(_) => Kind::NotFound,
            Self::NotHost(_) => Kind::NotAuthorized,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Date, Money};

    use crate::{
        command::{CreateProperty, CreateReservation},
        domain::{
            property,
            reservation::{self, GuestCount},
            review::Eligibility,
            user, Reservation,
        },
        error::{Categorize as _, Kind},
        infra::Memory,
        Command as _, Config, Service,
    };

    use super::{EnableReview, ExecutionError};

    async fn reserved(svc: &Service<Memory>) -> Reservation {
        let property = svc
            .execute(CreateProperty {
                owner_id: user::Id::from(1),
                title: property::Title::new("Chalet").unwrap(),
                country: property::Country::new("Austria").unwrap(),
                city: property::City::new("Innsbruck").unwrap(),
                address: property::Address::new("4 Maria-Theresien-Str")
                    .unwrap(),
                description: property::Description::new("").unwrap(),
                nightly_rate: property::NightlyRate::new(
                    Money::from_str("120").unwrap(),
                )
                .unwrap(),
                kind: property::Kind::House,
                amenities: property::Amenities::default(),
            })
            .await
            .unwrap();

        svc.execute(CreateReservation {
            property_id: property.id,
            guest_id: user::Id::from(2),
            guests: GuestCount::new(2).unwrap(),
            start: Date::from_str("2024-06-01").unwrap(),
            end: Date::from_str("2024-06-03").unwrap(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn host_enables_review() {
        let svc = Service::new(Config::default(), Memory::new());
        let reservation = reserved(&svc).await;
        assert_eq!(reservation.eligibility, Eligibility::Completed);

        let enabled = svc
            .execute(EnableReview {
                reservation_id: reservation.id,
                host_id: user::Id::from(1),
            })
            .await
            .unwrap();
        assert_eq!(enabled.eligibility, Eligibility::ReviewEnabled);

        let again = svc
            .execute(EnableReview {
                reservation_id: reservation.id,
                host_id: user::Id::from(1),
            })
            .await
            .unwrap();
        assert_eq!(again.eligibility, Eligibility::ReviewEnabled);
    }

    #[tokio::test]
    async fn only_host_enables_review() {
        let svc = Service::new(Config::default(), Memory::new());
        let reservation = reserved(&svc).await;

        for requester in [2, 3] {
            let err = svc
                .execute(EnableReview {
                    reservation_id: reservation.id,
                    host_id: user::Id::from(requester),
                })
                .await
                .unwrap_err();

            assert!(matches!(err.as_ref(), ExecutionError::NotHost(_)));
            assert_eq!(err.kind(), Kind::NotAuthorized);
        }
    }

    #[tokio::test]
    async fn missing_reservation_is_not_found() {
        let svc = Service::new(Config::default(), Memory::new());

        let err = svc
            .execute(EnableReview {
                reservation_id: reservation::Id::new(),
                host_id: user::Id::from(1),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::ReservationNotExists(_),
        ));
        assert_eq!(err.kind(), Kind::NotFound);
    }
}
