//! [`Command`] for creating a new [`Property`].

use common::{operations::Insert, DateTime};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{property, user, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Property`].
#[derive(Clone, Debug)]
pub struct CreateProperty {
    /// ID of the host listing a new [`Property`].
    pub owner_id: user::Id,

    /// [`property::Title`] of a new [`Property`].
    pub title: property::Title,

    /// [`property::Country`] of a new [`Property`].
    pub country: property::Country,

    /// [`property::City`] of a new [`Property`].
    pub city: property::City,

    /// [`property::Address`] of a new [`Property`].
    pub address: property::Address,

    /// [`property::Description`] of a new [`Property`].
    pub description: property::Description,

    /// [`property::NightlyRate`] of a new [`Property`].
    pub nightly_rate: property::NightlyRate,

    /// [`property::Kind`] of a new [`Property`].
    pub kind: property::Kind,

    /// [`property::Amenities`] of a new [`Property`].
    pub amenities: property::Amenities,
}

impl<Db> Command<CreateProperty> for Service<Db>
where
    Db: Database<Insert<Property>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        let CreateProperty {
            owner_id,
            title,
            country,
            city,
            address,
            description,
            nightly_rate,
            kind,
            amenities,
        } = cmd;

        let property = Property {
            id: property::Id::new(),
            owner_id,
            title,
            country,
            city,
            address,
            description,
            nightly_rate,
            kind,
            amenities,
            created_at: DateTime::now().coerce(),
        };
        self.database()
            .execute(Insert(property.clone()))
            .await
            .map_err(tracerr::wrap!())?;

        log::info!(
            "`Property(id: {})` listed by `User(id: {owner_id})`",
            property.id,
        );

        Ok(property)
    }
}

/// Error of [`CreateProperty`] [`Command`] execution.
pub type ExecutionError = database::Error;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::Money;

    use crate::{
        domain::{
            property::{self, Amenity},
            user,
        },
        infra::Memory,
        query, Command as _, Config, Query as _, Service,
    };

    use super::CreateProperty;

    fn create(amenities: &[Amenity]) -> CreateProperty {
        CreateProperty {
            owner_id: user::Id::from(7),
            title: property::Title::new("  Sea view  ").unwrap(),
            country: property::Country::new("Spain").unwrap(),
            city: property::City::new("Valencia").unwrap(),
            address: property::Address::new("9 Carrer de la Mar").unwrap(),
            description: property::Description::new("").unwrap(),
            nightly_rate: property::NightlyRate::new(
                Money::from_str("75.50").unwrap(),
            )
            .unwrap(),
            kind: property::Kind::House,
            amenities: amenities.iter().copied().collect(),
        }
    }

    #[tokio::test]
    async fn stores_listed_property() {
        let svc = Service::new(Config::default(), Memory::new());

        let created = svc
            .execute(create(&[Amenity::Parking, Amenity::Wifi]))
            .await
            .unwrap();

        let stored = svc
            .execute(query::property::ById::by(created.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.owner_id, user::Id::from(7));
        assert_eq!(stored.title.to_string(), "Sea view");
        assert_eq!(stored.created_at, created.created_at);
        assert!(stored.amenities.contains(Amenity::Parking));
        assert!(stored.amenities.contains(Amenity::Wifi));
        assert!(!stored.amenities.contains(Amenity::Kitchen));
    }

    #[tokio::test]
    async fn lists_without_amenities() {
        let svc = Service::new(Config::default(), Memory::new());

        let created = svc.execute(create(&[])).await.unwrap();

        assert!(created.amenities.is_empty());
        assert_ne!(
            created.id,
            svc.execute(create(&[])).await.unwrap().id,
        );
    }

    #[test]
    fn rejects_non_positive_rate() {
        for rate in ["0", "0.00"] {
            let amount = Money::from_str(rate).unwrap();
            assert!(property::NightlyRate::new(amount).is_none());
        }
        assert!(Money::from_str("-5").is_err());
    }
}
