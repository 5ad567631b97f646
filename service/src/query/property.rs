//! [`Query`] collection related to a single [`Property`].

use common::{
    date::InvalidRange,
    operations::{By, Select},
    Date, DateRange,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, Property, Review},
    error::{Categorize, Kind},
    infra::{database, Database},
    read::{self, reservation::Slot},
    Service,
};

use super::{DatabaseQuery, Query};

/// Queries a [`Property`] by its [`property::Id`].
pub type ById = DatabaseQuery<By<Option<Property>, property::Id>>;

/// Queries [`property::Image`]s of a [`Property`] in the order they were
/// added.
pub type Images = DatabaseQuery<By<Vec<property::Image>, property::Id>>;

/// Queries [`Review`]s of a [`Property`], newest first.
pub type Reviews = DatabaseQuery<By<Vec<Review>, property::Id>>;

/// [`Query`] checking whether a [`Property`] is free for a stay.
#[derive(Clone, Copy, Debug)]
pub struct IsAvailable {
    /// ID of the [`Property`] to check.
    pub property_id: property::Id,

    /// First night of the stay.
    pub start: Date,

    /// Check-out [`Date`], not included into the stay.
    pub end: Date,
}

impl<Db> Query<IsAvailable> for Service<Db>
where
    Db: Database<
        Select<By<read::reservation::IsAvailable, Slot>>,
        Ok = read::reservation::IsAvailable,
        Err = Traced<database::Error>,
    >,
{
    type Ok = read::reservation::IsAvailable;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, q: IsAvailable) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let IsAvailable {
            property_id,
            start,
            end,
        } = q;

        let stay = DateRange::new(start, end)
            .map_err(E::InvalidRange)
            .map_err(tracerr::wrap!())?;

        self.database()
            .execute(Select(By::new(Slot { property_id, stay })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// [`Query`] quoting the total price of a stay at a [`Property`].
#[derive(Clone, Copy, Debug)]
pub struct ComputePrice {
    /// ID of the [`Property`] to stay at.
    pub property_id: property::Id,

    /// First night of the stay.
    pub start: Date,

    /// Check-out [`Date`], not included into the stay.
    pub end: Date,
}

impl<Db> Query<ComputePrice> for Service<Db>
where
    Db: Database<
        Select<By<Option<Property>, property::Id>>,
        Ok = Option<Property>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = property::Quote;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, q: ComputePrice) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ComputePrice {
            property_id,
            start,
            end,
        } = q;

        let stay = DateRange::new(start, end)
            .map_err(E::InvalidRange)
            .map_err(tracerr::wrap!())?;

        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        property
            .nightly_rate
            .quote(&stay)
            .ok_or(E::PriceOverflow(stay))
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`IsAvailable`] or [`ComputePrice`] [`Query`] execution.
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
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Date, Money};

    use crate::{
        command::{CreateProperty, CreateReservation},
        domain::{property, reservation::GuestCount, user},
        error::{Categorize as _, Kind},
        infra::Memory,
        Config, Query as _, Service,
    };

    use super::{ComputePrice, ExecutionError, IsAvailable};

    fn date(s: &str) -> Date {
        Date::from_str(s).unwrap()
    }

    async fn listed(svc: &Service<Memory>) -> property::Id {
        svc.execute(CreateProperty {
            owner_id: user::Id::from(1),
            title: property::Title::new("Loft").unwrap(),
            country: property::Country::new("France").unwrap(),
            city: property::City::new("Paris").unwrap(),
            address: property::Address::new("1 Rue de Rivoli").unwrap(),
            description: property::Description::new("").unwrap(),
            nightly_rate: property::NightlyRate::new(
                Money::from_str("100.0").unwrap(),
            )
            .unwrap(),
            kind: property::Kind::Apartment,
            amenities: property::Amenities::default(),
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn quotes_stay() {
        let svc = Service::new(Config::default(), Memory::new());
        let property_id = listed(&svc).await;

        let quote = svc
            .execute(ComputePrice {
                property_id,
                start: date("2024-06-01"),
                end: date("2024-06-04"),
            })
            .await
            .unwrap();

        assert_eq!(quote.nights.get(), 3);
        assert_eq!(quote.total, Money::from_str("300").unwrap());
    }

    #[tokio::test]
    async fn quote_fails_on_bad_input() {
        let svc = Service::new(Config::default(), Memory::new());
        let property_id = listed(&svc).await;

        let err = svc
            .execute(ComputePrice {
                property_id,
                start: date("2024-06-04"),
                end: date("2024-06-04"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidRange(_)));

        let err = svc
            .execute(ComputePrice {
                property_id: property::Id::new(),
                start: date("2024-06-01"),
                end: date("2024-06-04"),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::NotFound);
    }

    #[tokio::test]
    async fn reports_availability() {
        let svc = Service::new(Config::default(), Memory::new());
        let property_id = listed(&svc).await;
        _ = svc
            .execute(CreateReservation {
                property_id,
                guest_id: user::Id::from(2),
                guests: GuestCount::new(1).unwrap(),
                start: date("2024-06-01"),
                end: date("2024-06-05"),
            })
            .await
            .unwrap();

        let check = |start, end| IsAvailable {
            property_id,
            start: date(start),
            end: date(end),
        };
        assert!(!*svc.execute(check("2024-06-04", "2024-06-08")).await.unwrap());
        assert!(!*svc.execute(check("2024-05-01", "2024-07-01")).await.unwrap());
        assert!(*svc.execute(check("2024-06-05", "2024-06-08")).await.unwrap());
        assert!(*svc.execute(check("2024-05-28", "2024-06-01")).await.unwrap());
    }
}
