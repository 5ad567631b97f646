//! [`Command`] for deleting a [`Property`] listing.

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Reservation;
use crate::{
    domain::{property, user, Property},
    error::{Categorize, Kind},
    infra::{database, Database},
    read::reservation::IsReserved,
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Property`] listing by its owner.
///
/// A [`Property`] having any [`Reservation`]s is never deleted, so booking
/// and review history stays intact. Its images and amenities go away along
/// with it.
#[derive(Clone, Copy, Debug)]
pub struct DeleteProperty {
    /// ID of the [`Property`] to delete.
    pub property_id: property::Id,

    /// ID of the user requesting the deletion.
    pub requester_id: user::Id,
}

impl<Db> Command<DeleteProperty> for Service<Db>
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
            Select<By<IsReserved, property::Id>>,
            Ok = IsReserved,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Property, property::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteProperty {
            property_id,
            requester_id,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Reservations lock the same `Property`, so none sneaks in meanwhile.
        tx.execute(Lock(By::<Property, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if !property.is_owned_by(requester_id) {
            return Err(tracerr::new!(E::NotOwner(requester_id)));
        }

        let reserved = tx
            .execute(Select(By::<IsReserved, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if *reserved {
            return Err(tracerr::new!(E::HasReservations(property_id)));
        }

        tx.execute(Delete(By::<Property, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "`Property(id: {property_id})` deleted by \
             `User(id: {requester_id})`",
        );

        Ok(property)
    }
}

/// Error of [`DeleteProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Property`] doesn't exist.
    #[display("`Property(id: {_0})` does not exist")]
    #[from(ignore)]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// User is not the owner of the [`Property`].
    #[display("`User(id: {_0})` is not the owner of the `Property`")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] user::Id),

    /// [`Property`] has [`Reservation`]s.
    #[display("`Property(id: {_0})` has reservations")]
    #[from(ignore)]
    HasReservations(#[error(not(source))] property::Id),
}

impl Categorize for ExecutionError {
    fn kind(&self) -> Kind {
        match self {
            Self::Db(e) => e.kind(),
            Self::PropertyNotExists(_) => Kind::NotFound,
            Self::NotOwner(_) => Kind::NotAuthorized,
            Self::HasReservations(_) => Kind::Conflict,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Date, Money};

    use crate::{
        command::{AddPropertyImage, CreateProperty, CreateReservation},
        domain::{property, reservation::GuestCount, user, Property},
        error::{Categorize as _, Kind},
        infra::Memory,
        query, Command as _, Config, Query as _, Service,
    };

    use super::{DeleteProperty, ExecutionError};

    async fn listed(svc: &Service<Memory>) -> Property {
        svc.execute(CreateProperty {
            owner_id: user::Id::from(1),
            title: property::Title::new("Cabin").unwrap(),
            country: property::Country::new("Norway").unwrap(),
            city: property::City::new("Bergen").unwrap(),
            address: property::Address::new("2 Bryggen").unwrap(),
            description: property::Description::new("").unwrap(),
            nightly_rate: property::NightlyRate::new(
                Money::from_str("80").unwrap(),
            )
            .unwrap(),
            kind: property::Kind::House,
            amenities: property::Amenities::default(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn deletes_own_property_with_images() {
        let svc = Service::new(Config::default(), Memory::new());
        let property = listed(&svc).await;
        _ = svc
            .execute(AddPropertyImage {
                property_id: property.id,
                requester_id: property.owner_id,
                url: property::ImageUrl::new("http://img/1.png").unwrap(),
            })
            .await
            .unwrap();

        let deleted = svc
            .execute(DeleteProperty {
                property_id: property.id,
                requester_id: property.owner_id,
            })
            .await
            .unwrap();
        assert_eq!(deleted.id, property.id);

        let found = svc
            .execute(query::property::ById::by(property.id))
            .await
            .unwrap();
        assert!(found.is_none());
        let images = svc
            .execute(query::property::Images::by(property.id))
            .await
            .unwrap();
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn only_owner_deletes() {
        let svc = Service::new(Config::default(), Memory::new());
        let property = listed(&svc).await;

        let err = svc
            .execute(DeleteProperty {
                property_id: property.id,
                requester_id: user::Id::from(2),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));
        assert_eq!(err.kind(), Kind::NotAuthorized);

        let found = svc
            .execute(query::property::ById::by(property.id))
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn missing_property_is_not_found() {
        let svc = Service::new(Config::default(), Memory::new());

        let err = svc
            .execute(DeleteProperty {
                property_id: property::Id::new(),
                requester_id: user::Id::from(1),
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Kind::NotFound);
    }

    #[tokio::test]
    async fn keeps_reserved_property() {
        let svc = Service::new(Config::default(), Memory::new());
        let property = listed(&svc).await;
        _ = svc
            .execute(CreateReservation {
                property_id: property.id,
                guest_id: user::Id::from(2),
                guests: GuestCount::new(1).unwrap(),
                start: Date::from_str("2024-06-01").unwrap(),
                end: Date::from_str("2024-06-03").unwrap(),
            })
            .await
            .unwrap();

        let err = svc
            .execute(DeleteProperty {
                property_id: property.id,
                requester_id: property.owner_id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::HasReservations(_)));
        assert_eq!(err.kind(), Kind::Conflict);

        let found = svc
            .execute(query::property::ById::by(property.id))
            .await
            .unwrap();
        assert!(found.is_some());
    }
}
