//! GraphQL API definitions.

mod mutation;
pub mod property;
mod query;
pub mod reservation;
pub mod review;
pub mod scalar;
pub mod user;

use juniper::EmptySubscription;

use crate::{define_error, Context};

pub use self::{
    mutation::Mutation, property::Property, query::Query,
    reservation::Reservation, review::Review,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

/// Creates a new [`Schema`].
#[must_use]
pub fn schema() -> Schema {
    Schema::new(Query, Mutation, EmptySubscription::new())
}

define_error! {
    enum PropertyError {
        #[code = "PROPERTY_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Property` with the specified ID does not exist"]
        NotExists,

        #[code = "NOT_OWNER"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must own the `Property`"]
        NotOwner,
    }
}

define_error! {
    enum StayError {
        #[code = "INVALID_DATE_RANGE"]
        #[status = BAD_REQUEST]
        #[message = "`endDate` must be after `startDate`"]
        InvalidRange,

        #[code = "PRICE_OVERFLOW"]
        #[status = BAD_REQUEST]
        #[message = "Total price of the stay is too large"]
        PriceOverflow,
    }
}

#[cfg(test)]
mod spec {
    #[test]
    fn schema_describes_operations() {
        let sdl = super::schema().as_sdl();

        for field in [
            "properties(",
            "property(",
            "propertiesOfOwner(",
            "myProperties",
            "isAvailable(",
            "quote(",
            "myReservations",
            "hostReservations",
            "canReview(",
            "createProperty(",
            "updateProperty(",
            "addPropertyImage(",
            "deleteProperty(",
            "createReservation(",
            "enableReview(",
            "submitReview(",
        ] {
            assert!(sdl.contains(field), "missing `{field}` in schema");
        }
        assert!(sdl.contains("enum ReviewState"));
        assert!(!sdl.contains("type Subscription"));
    }
}
