//! [`Command`] for updating descriptive fields of a [`Property`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, user, Property},
    error::{Categorize, Kind},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating descriptive fields of a [`Property`].
///
/// Owner and creation [`DateTime`] of a [`Property`] never change.
///
/// [`DateTime`]: common::DateTime
#[derive(Clone, Debug)]
pub struct UpdateProperty {
    /// ID of the [`Property`] to update.
    pub property_id: property::Id,

    /// ID of the user requesting the update.
    pub requester_id: user::Id,

    /// New [`property::Title`].
    pub title: property::Title,

    /// New [`property::Country`].
    pub country: property::Country,

    /// New [`property::City`].
    pub city: property::City,

    /// New [`property::Address`].
    pub address: property::Address,

    /// New [`property::Description`].
    pub description: property::Description,

    /// New [`property::NightlyRate`].
    pub nightly_rate: property::NightlyRate,

    /// New [`property::Kind`].
    pub kind: property::Kind,

    /// New [`property::Amenities`].
    pub amenities: property::Amenities,
}

impl<Db> Command<UpdateProperty> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Property, property::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateProperty {
            property_id,
            requester_id,
            title,
            country,
            city,
            address,
            description,
            nightly_rate,
            kind,
            amenities,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Property`.
        tx.execute(Lock(By::<Property, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if !property.is_owned_by(requester_id) {
            return Err(tracerr::new!(E::NotOwner(requester_id)));
        }

        property.title = title;
        property.country = country;
        property.city = city;
        property.address = address;
        property.description = description;
        property.nightly_rate = nightly_rate;
        property.kind = kind;
        property.amenities = amenities;
        tx.execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(property)
    }
}

/// Error of [`UpdateProperty`] [`Command`] execution.
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
}

impl Categorize for ExecutionError {
    fn kind(&self) -> Kind {
        match self {
            Self::Db(e) => e.kind(),
            Self::PropertyNotExists(_) => Kind::NotFound,
            Self::NotOwner(_) => Kind::NotAuthorized,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::Money;

    use crate::{
        command::CreateProperty,
        domain::{
            property::{self, Amenity},
            user, Property,
        },
        error::{Categorize as _, Kind},
        infra::Memory,
        query, Command as _, Config, Query as _, Service,
    };

    use super::{ExecutionError, UpdateProperty};

    async fn listed(svc: &Service<Memory>) -> Property {
        svc.execute(CreateProperty {
            owner_id: user::Id::from(1),
            title: property::Title::new("Loft").unwrap(),
            country: property::Country::new("France").unwrap(),
            city: property::City::new("Paris").unwrap(),
            address: property::Address::new("1 Rue de Rivoli").unwrap(),
            description: property::Description::new("").unwrap(),
            nightly_rate: property::NightlyRate::new(
                Money::from_str("100").unwrap(),
            )
            .unwrap(),
            kind: property::Kind::Apartment,
            amenities: property::Amenities::default(),
        })
        .await
        .unwrap()
    }

    fn update(property: &Property, requester: i64) -> UpdateProperty {
        UpdateProperty {
            property_id: property.id,
            requester_id: user::Id::from(requester),
            title: property::Title::new("Sunny loft").unwrap(),
            country: property::Country::new("France").unwrap(),
            city: property::City::new("Lyon").unwrap(),
            address: property::Address::new("5 Quai Saint-Antoine").unwrap(),
            description: property::Description::new("Near the river")
                .unwrap(),
            nightly_rate: property::NightlyRate::new(
                Money::from_str("140").unwrap(),
            )
            .unwrap(),
            kind: property::Kind::Apartment,
            amenities: [Amenity::Wifi, Amenity::Kitchen].into_iter().collect(),
        }
    }

    #[tokio::test]
    async fn keeps_owner_and_creation_time() {
        let svc = Service::new(Config::default(), Memory::new());
        let property = listed(&svc).await;

        let updated = svc.execute(update(&property, 1)).await.unwrap();

        assert_eq!(updated.id, property.id);
        assert_eq!(updated.owner_id, property.owner_id);
        assert_eq!(updated.created_at, property.created_at);
        assert_eq!(updated.title.to_string(), "Sunny loft");
        assert_eq!(updated.city.to_string(), "Lyon");
        assert!(updated.amenities.contains(Amenity::Wifi));

        let stored = svc
            .execute(query::property::ById::by(property.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title.to_string(), "Sunny loft");
        assert_eq!(stored.owner_id, property.owner_id);
        assert_eq!(stored.created_at, property.created_at);
    }

    #[tokio::test]
    async fn only_owner_updates() {
        let svc = Service::new(Config::default(), Memory::new());
        let property = listed(&svc).await;

        let err = svc.execute(update(&property, 2)).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));
        assert_eq!(err.kind(), Kind::NotAuthorized);

        let stored = svc
            .execute(query::property::ById::by(property.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.title.to_string(), "Loft");
    }

    #[tokio::test]
    async fn missing_property_is_not_found() {
        let svc = Service::new(Config::default(), Memory::new());
        let mut property = listed(&svc).await;
        property.id = property::Id::new();

        let err = svc.execute(update(&property, 1)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PropertyNotExists(_)));
        assert_eq!(err.kind(), Kind::NotFound);
    }
}
