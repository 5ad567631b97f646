//! GraphQL [`Mutation`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{
    command,
    domain::{property, reservation, review},
    Command as _,
};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Lists a new `Property` owned by the current `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_NIGHTLY_RATE` - the provided nightly rate is not positive.
    #[tracing::instrument(
        skip_all,
        fields(
            city = %input.city,
            gql.name = "createProperty",
            otel.name = Self::SPAN_NAME,
            title = %input.title,
        ),
    )]
    pub async fn create_property(
        input: api::property::Input,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        let my_id = ctx.actor().await?.user_id;
        let fields = Fields::try_from(input).map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateProperty {
                owner_id: my_id.into(),
                title: fields.title,
                country: fields.country,
                city: fields.city,
                address: fields.address,
                description: fields.description,
                nightly_rate: fields.nightly_rate,
                kind: fields.kind,
                amenities: fields.amenities,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Replaces descriptive fields of the `Property` owned by the current
    /// `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_NIGHTLY_RATE` - the provided nightly rate is not positive;
    /// - `PROPERTY_NOT_EXISTS` - the `Property` does not exist;
    /// - `NOT_OWNER` - the current `User` does not own the `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateProperty",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_property(
        id: api::property::Id,
        input: api::property::Input,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        let my_id = ctx.actor().await?.user_id;
        let fields = Fields::try_from(input).map_err(ctx.error())?;

        ctx.service()
            .execute(command::UpdateProperty {
                property_id: id.into(),
                requester_id: my_id.into(),
                title: fields.title,
                country: fields.country,
                city: fields.city,
                address: fields.address,
                description: fields.description,
                nightly_rate: fields.nightly_rate,
                kind: fields.kind,
                amenities: fields.amenities,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Adds an already uploaded image to the `Property` owned by the current
    /// `User`.
    ///
    /// The first added image represents the `Property` in search results.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PROPERTY_NOT_EXISTS` - the `Property` does not exist;
    /// - `NOT_OWNER` - the current `User` does not own the `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "addPropertyImage",
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
            url = %url,
        ),
    )]
    pub async fn add_property_image(
        property_id: api::property::Id,
        url: api::property::ImageUrl,
        ctx: &Context,
    ) -> Result<api::property::Image, Error> {
        let my_id = ctx.actor().await?.user_id;

        ctx.service()
            .execute(command::AddPropertyImage {
                property_id: property_id.into(),
                requester_id: my_id.into(),
                url: url.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the `Property` owned by the current `User`.
    ///
    /// Images of the `Property` are deleted along with it. Returns the ID of
    /// the deleted `Property`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PROPERTY_NOT_EXISTS` - the `Property` does not exist;
    /// - `NOT_OWNER` - the current `User` does not own the `Property`;
    /// - `PROPERTY_RESERVED` - the `Property` has `Reservation`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteProperty",
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
        ),
    )]
    pub async fn delete_property(
        property_id: api::property::Id,
        ctx: &Context,
    ) -> Result<api::property::Id, Error> {
        let my_id = ctx.actor().await?.user_id;

        ctx.service()
            .execute(command::DeleteProperty {
                property_id: property_id.into(),
                requester_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|deleted| deleted.id.into())
    }

    /// Reserves the `Property` for the current `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_GUEST_COUNT` - `guests` is not positive;
    /// - `INVALID_DATE_RANGE` - `endDate` is not after `startDate`;
    /// - `PROPERTY_NOT_EXISTS` - the `Property` does not exist;
    /// - `SELF_BOOKING` - the current `User` owns the `Property`;
    /// - `DATES_UNAVAILABLE` - some night is reserved already.
    #[tracing::instrument(
        skip_all,
        fields(
            end_date = %end_date,
            gql.name = "createReservation",
            guests = guests,
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
            start_date = %start_date,
        ),
    )]
    pub async fn create_reservation(
        property_id: api::property::Id,
        start_date: Date,
        end_date: Date,
        guests: i32,
        ctx: &Context,
    ) -> Result<api::Reservation, Error> {
        let my_id = ctx.actor().await?.user_id;
        let guests = reservation::GuestCount::new(guests)
            .ok_or_else(|| InputError::GuestCount.into())
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateReservation {
                property_id: property_id.into(),
                guest_id: my_id.into(),
                guests,
                start: start_date,
                end: end_date,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Allows the guest of the `Reservation` to review the stay.
    ///
    /// Enabling an already enabled review changes nothing.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RESERVATION_NOT_EXISTS` - the `Reservation` does not exist;
    /// - `NOT_HOST` - the current `User` is not the host of the
    ///                `Reservation`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "enableReview",
            otel.name = Self::SPAN_NAME,
            reservation_id = %reservation_id,
        ),
    )]
    pub async fn enable_review(
        reservation_id: api::reservation::Id,
        ctx: &Context,
    ) -> Result<api::Reservation, Error> {
        let my_id = ctx.actor().await?.user_id;

        ctx.service()
            .execute(command::EnableReview {
                reservation_id: reservation_id.into(),
                host_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Leaves a `Review` of the `Property` for the `Reservation` made by the
    /// current `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_RATING` - `rating` is not from `1` to `5`;
    /// - `COMMENT_TOO_SHORT` - `comment` is shorter than allowed;
    /// - `REVIEW_NOT_PERMITTED` - the `Reservation` is not the current
    ///                            `User`'s one, or its review is not
    ///                            enabled;
    /// - `ALREADY_REVIEWED` - the `Reservation` is reviewed already.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "submitReview",
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
            rating = rating,
            reservation_id = %reservation_id,
        ),
    )]
    pub async fn submit_review(
        property_id: api::property::Id,
        reservation_id: api::reservation::Id,
        rating: i32,
        comment: api::review::Comment,
        ctx: &Context,
    ) -> Result<api::Review, Error> {
        let my_id = ctx.actor().await?.user_id;
        let rating = review::Rating::new(rating)
            .ok_or_else(|| InputError::Rating.into())
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::SubmitReview {
                property_id: property_id.into(),
                guest_id: my_id.into(),
                reservation_id: reservation_id.into(),
                rating,
                comment: comment.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

/// Validated [`api::property::Input`].
struct Fields {
    title: property::Title,
    country: property::Country,
    city: property::City,
    address: property::Address,
    description: property::Description,
    nightly_rate: property::NightlyRate,
    kind: property::Kind,
    amenities: property::Amenities,
}

impl TryFrom<api::property::Input> for Fields {
    type Error = Error;

    fn try_from(input: api::property::Input) -> Result<Self, Self::Error> {
        let api::property::Input {
            title,
            country,
            city,
            address,
            description,
            nightly_rate,
            kind,
            amenities,
        } = input;

        Ok(Self {
            title: title.into(),
            country: country.into(),
            city: city.into(),
            address: address.into(),
            description: description.into(),
            nightly_rate: property::NightlyRate::new(nightly_rate)
                .ok_or(InputError::NightlyRate)?,
            kind: kind.into(),
            amenities: amenities
                .into_iter()
                .flatten()
                .map(Into::into)
                .collect(),
        })
    }
}

define_error! {
    enum InputError {
        #[code = "INVALID_NIGHTLY_RATE"]
        #[status = BAD_REQUEST]
        #[message = "Nightly rate must be positive"]
        NightlyRate,

        #[code = "INVALID_GUEST_COUNT"]
        #[status = BAD_REQUEST]
        #[message = "Number of guests must be positive"]
        GuestCount,

        #[code = "INVALID_RATING"]
        #[status = BAD_REQUEST]
        #[message = "Rating must be from 1 to 5"]
        Rating,
    }
}

impl AsError for command::update_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::PropertyNotExists(_) => api::PropertyError::NotExists.into(),
            Self::NotOwner(_) => api::PropertyError::NotOwner.into(),
        })
    }
}

impl AsError for command::add_property_image::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::PropertyNotExists(_) => api::PropertyError::NotExists.into(),
            Self::NotOwner(_) => api::PropertyError::NotOwner.into(),
        })
    }
}

impl AsError for command::delete_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PROPERTY_RESERVED"]
                #[status = CONFLICT]
                #[message = "`Property` with `Reservation`s cannot be deleted"]
                Reserved,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::PropertyNotExists(_) => api::PropertyError::NotExists.into(),
            Self::NotOwner(_) => api::PropertyError::NotOwner.into(),
            Self::HasReservations(_) => Error::Reserved.into(),
        })
    }
}

impl AsError for command::create_reservation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "SELF_BOOKING"]
                #[status = FORBIDDEN]
                #[message = "`User` cannot reserve an own `Property`"]
                SelfBooking,

                #[code = "DATES_UNAVAILABLE"]
                #[status = CONFLICT]
                #[message = "Some night of the stay is reserved already"]
                DatesUnavailable,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidRange(_) => api::StayError::InvalidRange.into(),
            Self::PropertyNotExists(_) => api::PropertyError::NotExists.into(),
            Self::SelfBookingNotAllowed(_) => Error::SelfBooking.into(),
            Self::DatesUnavailable(_) => Error::DatesUnavailable.into(),
            Self::PriceOverflow(_) => api::StayError::PriceOverflow.into(),
        })
    }
}

impl AsError for command::enable_review::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "RESERVATION_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Reservation` with the specified ID does not \
                             exist"]
                ReservationNotExists,

                #[code = "NOT_HOST"]
                #[status = FORBIDDEN]
                #[message = "Authenticated `User` must be the host of the \
                             `Reservation`"]
                NotHost,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::ReservationNotExists(_) => Error::ReservationNotExists.into(),
            Self::NotHost(_) => Error::NotHost.into(),
        })
    }
}

impl AsError for command::submit_review::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "COMMENT_TOO_SHORT"]
                #[status = BAD_REQUEST]
                #[message = "`ReviewComment` is too short"]
                CommentTooShort,

                #[code = "REVIEW_NOT_PERMITTED"]
                #[status = FORBIDDEN]
                #[message = "`Reservation` cannot be reviewed by the \
                             authenticated `User`"]
                NotPermitted,

                #[code = "ALREADY_REVIEWED"]
                #[status = CONFLICT]
                #[message = "`Reservation` is reviewed already"]
                AlreadyReviewed,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::CommentTooShort(_) => Error::CommentTooShort.into(),
            Self::NotPermitted(_) => Error::NotPermitted.into(),
            Self::AlreadyReviewed(_) => Error::AlreadyReviewed.into(),
        })
    }
}
