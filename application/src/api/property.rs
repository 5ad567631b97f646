//! [`Property`]-related definitions.

use std::num::TryFromIntError;

use common::{DateTime, Handler as _, Money};
use derive_more::{AsRef, Display, From, Into};
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLObject,
    GraphQLScalar,
};
use service::{domain, query};
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A rentable property.
#[derive(Clone, Debug, From)]
pub struct Property(domain::Property);

/// A rentable property.
#[graphql_object(context = Context)]
impl Property {
    /// Unique identifier of this `Property`.
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// ID of the host owning this `Property`.
    pub fn owner_id(&self) -> api::user::Id {
        self.0.owner_id.into()
    }

    /// Title of this `Property`.
    pub fn title(&self) -> Title {
        self.0.title.clone().into()
    }

    /// Country this `Property` is located in.
    pub fn country(&self) -> Country {
        self.0.country.clone().into()
    }

    /// City this `Property` is located in.
    pub fn city(&self) -> City {
        self.0.city.clone().into()
    }

    /// Street address of this `Property`.
    pub fn address(&self) -> Address {
        self.0.address.clone().into()
    }

    /// Free-form description of this `Property`.
    pub fn description(&self) -> Description {
        self.0.description.clone().into()
    }

    /// Price of a single night in this `Property`.
    pub fn nightly_rate(&self) -> Money {
        self.0.nightly_rate.amount()
    }

    /// Kind of this `Property`.
    pub fn kind(&self) -> Kind {
        self.0.kind.into()
    }

    /// Amenities this `Property` provides.
    pub fn amenities(&self) -> Vec<Amenity> {
        self.0.amenities.iter().map(Into::into).collect()
    }

    /// `DateTime` when this `Property` was created.
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// Images of this `Property` in the order they were added.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.images",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn images(&self, ctx: &Context) -> Result<Vec<Image>, Error> {
        ctx.service()
            .execute(query::property::Images::by(self.0.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|images| images.into_iter().map(Into::into).collect())
    }

    /// Reviews of this `Property`, newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.reviews",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn reviews(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Review>, Error> {
        ctx.service()
            .execute(query::property::Reviews::by(self.0.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|reviews| reviews.into_iter().map(Into::into).collect())
    }
}

/// Unique identifier of a `Property`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::property::Id)]
#[into(domain::property::Id)]
#[graphql(name = "PropertyId", transparent)]
pub struct Id(Uuid);

/// Title of a `Property`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyTitle",
    with = scalar::Via::<domain::property::Title>,
)]
pub struct Title(domain::property::Title);

/// Country a `Property` is located in.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyCountry",
    with = scalar::Via::<domain::property::Country>,
)]
pub struct Country(domain::property::Country);

/// City a `Property` is located in.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyCity",
    with = scalar::Via::<domain::property::City>,
)]
pub struct City(domain::property::City);

/// Street address of a `Property`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyAddress",
    with = scalar::Via::<domain::property::Address>,
)]
pub struct Address(domain::property::Address);

/// Description of a `Property`, possibly empty.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyDescription",
    with = scalar::Via::<domain::property::Description>,
)]
pub struct Description(domain::property::Description);

/// URL of an already uploaded `PropertyImage`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyImageUrl",
    with = scalar::Via::<domain::property::ImageUrl>,
)]
pub struct ImageUrl(domain::property::ImageUrl);

/// Image of a `Property`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "PropertyImage")]
pub struct Image {
    /// URL of this `PropertyImage`.
    pub url: ImageUrl,

    /// `DateTime` when this `PropertyImage` was added.
    pub added_at: DateTime,
}

impl From<domain::property::Image> for Image {
    fn from(image: domain::property::Image) -> Self {
        Self {
            url: image.url.into(),
            added_at: image.added_at.coerce(),
        }
    }
}

/// Kind of a `Property`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PropertyKind")]
pub enum Kind {
    /// An apartment in a building.
    Apartment,

    /// A whole house.
    House,

    /// A single room.
    Room,

    /// Anything else.
    Other,
}

impl From<domain::property::Kind> for Kind {
    fn from(kind: domain::property::Kind) -> Self {
        use domain::property::Kind as K;
        match kind {
            K::Apartment => Self::Apartment,
            K::House => Self::House,
            K::Room => Self::Room,
            K::Other => Self::Other,
        }
    }
}

impl From<Kind> for domain::property::Kind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Apartment => Self::Apartment,
            Kind::House => Self::House,
            Kind::Room => Self::Room,
            Kind::Other => Self::Other,
        }
    }
}

/// Capability a `Property` may provide.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PropertyAmenity")]
pub enum Amenity {
    /// Wireless internet.
    Wifi,

    /// Air conditioning.
    AirConditioning,

    /// Kitchen available to guests.
    Kitchen,

    /// Parking place.
    Parking,

    /// Pets are allowed.
    PetsAllowed,

    /// Swimming pool.
    Pool,

    /// Washing machine.
    Washer,

    /// Clothes dryer.
    Dryer,

    /// Television.
    Tv,

    /// Heating.
    Heating,

    /// Balcony.
    Balcony,
}

impl From<domain::property::Amenity> for Amenity {
    fn from(amenity: domain::property::Amenity) -> Self {
        use domain::property::Amenity as A;
        match amenity {
            A::Wifi => Self::Wifi,
            A::AirConditioning => Self::AirConditioning,
            A::Kitchen => Self::Kitchen,
            A::Parking => Self::Parking,
            A::PetsAllowed => Self::PetsAllowed,
            A::Pool => Self::Pool,
            A::Washer => Self::Washer,
            A::Dryer => Self::Dryer,
            A::Tv => Self::Tv,
            A::Heating => Self::Heating,
            A::Balcony => Self::Balcony,
        }
    }
}

impl From<Amenity> for domain::property::Amenity {
    fn from(amenity: Amenity) -> Self {
        match amenity {
            Amenity::Wifi => Self::Wifi,
            Amenity::AirConditioning => Self::AirConditioning,
            Amenity::Kitchen => Self::Kitchen,
            Amenity::Parking => Self::Parking,
            Amenity::PetsAllowed => Self::PetsAllowed,
            Amenity::Pool => Self::Pool,
            Amenity::Washer => Self::Washer,
            Amenity::Dryer => Self::Dryer,
            Amenity::Tv => Self::Tv,
            Amenity::Heating => Self::Heating,
            Amenity::Balcony => Self::Balcony,
        }
    }
}

/// Descriptive fields of a `Property` provided by its host.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "PropertyInput")]
pub struct Input {
    /// Title of the `Property`.
    pub title: Title,

    /// Country the `Property` is located in.
    pub country: Country,

    /// City the `Property` is located in.
    pub city: City,

    /// Street address of the `Property`.
    pub address: Address,

    /// Description of the `Property`, may be empty.
    pub description: Description,

    /// Price of a single night, must be positive.
    pub nightly_rate: Money,

    /// Kind of the `Property`.
    pub kind: Kind,

    /// Amenities the `Property` provides, none if omitted.
    pub amenities: Option<Vec<Amenity>>,
}

/// Price of a stay in a `Property`.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "PriceQuote")]
pub struct Quote {
    /// Number of nights in the stay.
    pub nights: i32,

    /// Total price of all the nights.
    pub total: Money,
}

impl TryFrom<domain::property::Quote> for Quote {
    type Error = TryFromIntError;

    fn try_from(quote: domain::property::Quote) -> Result<Self, Self::Error> {
        Ok(Self {
            nights: quote.nights.get().try_into()?,
            total: quote.total,
        })
    }
}

pub mod search {
    //! Definitions related to the `Property` search.

    use std::num::TryFromIntError;

    use common::Money;
    use derive_more::{From, Into};
    use juniper::{graphql_object, GraphQLInputObject};
    use service::read::property::search;

    use super::{Amenity, ImageUrl, Kind, Property};
    use crate::{AsError as _, Context, Error};

    /// Criteria of a `Property` search. Omitted ones impose no constraint.
    #[derive(Clone, Debug, Default, GraphQLInputObject)]
    #[graphql(name = "PropertySearchCriteria")]
    pub struct Criteria {
        /// Text to look for in a city, country or title, ignoring case.
        pub destination: Option<String>,

        /// Lowest acceptable nightly rate, inclusive.
        pub min_price: Option<Money>,

        /// Highest acceptable nightly rate, inclusive.
        pub max_price: Option<Money>,

        /// Required kind.
        pub kind: Option<Kind>,

        /// Amenities to be provided, all of them.
        pub amenities: Option<Vec<Amenity>>,
    }

    impl From<Criteria> for search::Criteria {
        fn from(criteria: Criteria) -> Self {
            let Criteria {
                destination,
                min_price,
                max_price,
                kind,
                amenities,
            } = criteria;

            Self {
                destination,
                min_price,
                max_price,
                kind: kind.map(Into::into),
                amenities: amenities
                    .into_iter()
                    .flatten()
                    .map(Into::into)
                    .collect(),
            }
        }
    }

    /// Page of the found `Property`s.
    #[derive(Clone, Debug, From, Into)]
    pub struct Page(search::Page);

    /// Page of the found `Property`s, newest first.
    #[graphql_object(name = "PropertySearchPage", context = Context)]
    impl Page {
        /// Found `Property`s on this page.
        #[must_use]
        pub fn items(&self) -> Vec<Summary> {
            self.0.items.iter().cloned().map(Summary).collect()
        }

        /// Total number of the found `Property`s on all pages.
        pub fn total_count(&self) -> Result<i32, Error> {
            to_int(self.0.total_count)
        }

        /// Total number of pages.
        pub fn total_pages(&self) -> Result<i32, Error> {
            to_int(self.0.total_pages)
        }

        /// Number of this page, starting from `1`.
        pub fn current_page(&self) -> Result<i32, Error> {
            to_int(u64::from(self.0.current_page))
        }
    }

    /// Found `Property` along with its representative image.
    #[derive(Clone, Debug)]
    pub struct Summary(search::Summary);

    /// Found `Property` along with its representative image.
    #[graphql_object(name = "PropertySummary", context = Context)]
    impl Summary {
        /// Found `Property`.
        #[must_use]
        pub fn property(&self) -> Property {
            self.0.property.clone().into()
        }

        /// URL of the first image added to the `Property`, if any.
        #[must_use]
        pub fn image(&self) -> Option<ImageUrl> {
            self.0.image.clone().map(Into::into)
        }
    }

    /// Converts a counter into a GraphQL `Int`.
    fn to_int(n: u64) -> Result<i32, Error> {
        i32::try_from(n).map_err(|e: TryFromIntError| e.into_error())
    }
}
