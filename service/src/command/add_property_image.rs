//! [`Command`] for adding a [`property::Image`] to a [`Property`].

use common::{
    operations::{By, Insert, Select},
    DateTime,
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

/// [`Command`] for adding a [`property::Image`] to a [`Property`].
///
/// The first added [`property::Image`] represents the [`Property`] in search
/// results.
#[derive(Clone, Debug)]
pub struct AddPropertyImage {
    /// ID of the [`Property`] to add the [`property::Image`] to.
    pub property_id: property::Id,

    /// ID of the user requesting the addition.
    pub requester_id: user::Id,

    /// [`property::ImageUrl`] of the already uploaded image.
    pub url: property::ImageUrl,
}

impl<Db> Command<AddPropertyImage> for Service<Db>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<property::Image>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = property::Image;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AddPropertyImage,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AddPropertyImage {
            property_id,
            requester_id,
            url,
        } = cmd;

        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;
        if !property.is_owned_by(requester_id) {
            return Err(tracerr::new!(E::NotOwner(requester_id)));
        }

        let image = property::Image {
            property_id,
            url,
            added_at: DateTime::now().coerce(),
        };
        self.database()
            .execute(Insert(image.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(image)
    }
}

/// Error of [`AddPropertyImage`] [`Command`] execution.
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
        domain::{property, user, Property},
        error::{Categorize as _, Kind},
        infra::Memory,
        query, Command as _, Config, Query as _, Service,
    };

    use super::{AddPropertyImage, ExecutionError};

    async fn listed(svc: &Service<Memory>) -> Property {
        svc.execute(CreateProperty {
            owner_id: user::Id::from(1),
            title: property::Title::new("Room").unwrap(),
            country: property::Country::new("Italy").unwrap(),
            city: property::City::new("Rome").unwrap(),
            address: property::Address::new("3 Via del Corso").unwrap(),
            description: property::Description::new("").unwrap(),
            nightly_rate: property::NightlyRate::new(
                Money::from_str("60").unwrap(),
            )
            .unwrap(),
            kind: property::Kind::Room,
            amenities: property::Amenities::default(),
        })
        .await
        .unwrap()
    }

    fn image(
        property_id: property::Id,
        requester: i64,
        url: &str,
    ) -> AddPropertyImage {
        AddPropertyImage {
            property_id,
            requester_id: user::Id::from(requester),
            url: property::ImageUrl::new(url).unwrap(),
        }
    }

    #[tokio::test]
    async fn appends_images_in_order() {
        let svc = Service::new(Config::default(), Memory::new());
        let property = listed(&svc).await;

        for url in ["http://z/front.png", "http://a/back.png"] {
            _ = svc.execute(image(property.id, 1, url)).await.unwrap();
        }

        let urls = svc
            .execute(query::property::Images::by(property.id))
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.url.to_string())
            .collect::<Vec<_>>();
        assert_eq!(urls, ["http://z/front.png", "http://a/back.png"]);
    }

    #[tokio::test]
    async fn only_owner_adds_images() {
        let svc = Service::new(Config::default(), Memory::new());
        let property = listed(&svc).await;

        let err = svc
            .execute(image(property.id, 2, "http://x/1.png"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));
        assert_eq!(err.kind(), Kind::NotAuthorized);

        let images = svc
            .execute(query::property::Images::by(property.id))
            .await
            .unwrap();
        assert!(images.is_empty());
    }

    #[tokio::test]
    async fn missing_property_is_not_found() {
        let svc = Service::new(Config::default(), Memory::new());

        let err = svc
            .execute(image(property::Id::new(), 1, "http://x/1.png"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), Kind::NotFound);
    }
}
