//! GraphQL [`Query`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Searches `Property`s, newest first.
    ///
    /// Omitted or non-positive `page` and `perPage` fall back to the first
    /// page and the configured page size. A page past the last one is empty
    /// but still reports the totals.
    #[tracing::instrument(
        skip_all,
        fields(
            criteria = ?criteria,
            gql.name = "properties",
            otel.name = Self::SPAN_NAME,
            page = ?page,
            per_page = ?per_page,
        ),
    )]
    pub async fn properties(
        criteria: Option<api::property::search::Criteria>,
        page: Option<i32>,
        per_page: Option<i32>,
        ctx: &Context,
    ) -> Result<api::property::search::Page, Error> {
        ctx.service()
            .execute(query::properties::Search {
                criteria: criteria.unwrap_or_default().into(),
                page,
                per_page,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Property` with the specified ID, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "property",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn property(
        id: api::property::Id,
        ctx: &Context,
    ) -> Result<Option<api::Property>, Error> {
        ctx.service()
            .execute(query::property::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|p| p.map(Into::into))
    }

    /// Returns `Property`s listed by the specified `User`, newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "propertiesOfOwner",
            otel.name = Self::SPAN_NAME,
            owner_id = %owner_id,
        ),
    )]
    pub async fn properties_of_owner(
        owner_id: api::user::Id,
        ctx: &Context,
    ) -> Result<Vec<api::Property>, Error> {
        ctx.service()
            .execute(query::properties::OfOwnerList::by(
                read::property::OfOwner(owner_id.into()),
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Returns `Property`s listed by the current `User`, newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myProperties",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_properties(
        ctx: &Context,
    ) -> Result<Vec<api::Property>, Error> {
        let my_id = ctx.actor().await?.user_id;

        ctx.service()
            .execute(query::properties::OfOwnerList::by(
                read::property::OfOwner(my_id.into()),
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Checks whether the `Property` is free for every night from
    /// `startDate` until `endDate`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_DATE_RANGE` - `endDate` is not after `startDate`.
    #[tracing::instrument(
        skip_all,
        fields(
            end_date = %end_date,
            gql.name = "isAvailable",
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
            start_date = %start_date,
        ),
    )]
    pub async fn is_available(
        property_id: api::property::Id,
        start_date: Date,
        end_date: Date,
        ctx: &Context,
    ) -> Result<bool, Error> {
        ctx.service()
            .execute(query::property::IsAvailable {
                property_id: property_id.into(),
                start: start_date,
                end: end_date,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|available| *available)
    }

    /// Quotes the total price of a stay at the `Property`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_DATE_RANGE` - `endDate` is not after `startDate`;
    /// - `PROPERTY_NOT_EXISTS` - the `Property` does not exist;
    /// - `PRICE_OVERFLOW` - the total price is too large.
    #[tracing::instrument(
        skip_all,
        fields(
            end_date = %end_date,
            gql.name = "quote",
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
            start_date = %start_date,
        ),
    )]
    pub async fn quote(
        property_id: api::property::Id,
        start_date: Date,
        end_date: Date,
        ctx: &Context,
    ) -> Result<api::property::Quote, Error> {
        let quote = ctx
            .service()
            .execute(query::property::ComputePrice {
                property_id: property_id.into(),
                start: start_date,
                end: end_date,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        quote
            .try_into()
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Returns `Reservation`s made by the current `User`, newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myReservations",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_reservations(
        ctx: &Context,
    ) -> Result<Vec<api::Reservation>, Error> {
        let my_id = ctx.actor().await?.user_id;

        ctx.service()
            .execute(query::reservation::OfGuestList::by(
                read::reservation::OfGuest(my_id.into()),
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Returns `Reservation`s of the `Property`s owned by the current
    /// `User`, newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "hostReservations",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn host_reservations(
        ctx: &Context,
    ) -> Result<Vec<api::Reservation>, Error> {
        let my_id = ctx.actor().await?.user_id;

        ctx.service()
            .execute(query::reservation::OfHostList::by(
                read::reservation::OfHost(my_id.into()),
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }

    /// Checks whether the current `User` may review the `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "canReview",
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
        ),
    )]
    pub async fn can_review(
        property_id: api::property::Id,
        ctx: &Context,
    ) -> Result<api::review::Eligibility, Error> {
        let my_id = ctx.actor().await?.user_id;

        ctx.service()
            .execute(query::review::CanReview::by(read::review::Candidate {
                guest_id: my_id.into(),
                property_id: property_id.into(),
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl AsError for query::property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidRange(_) => api::StayError::InvalidRange.into(),
            Self::PropertyNotExists(_) => api::PropertyError::NotExists.into(),
            Self::PriceOverflow(_) => api::StayError::PriceOverflow.into(),
        })
    }
}
