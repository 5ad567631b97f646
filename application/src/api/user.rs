//! `User`-related definitions.
//!
//! Users live in the upstream identity provider, so only their IDs are known
//! here.

use derive_more::{AsRef, Display, From, Into};
use juniper::GraphQLScalar;
use service::domain;

use crate::api::scalar;

/// Unique identifier of a `User`.
#[derive(
    AsRef,
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    From,
    GraphQLScalar,
    Into,
    PartialEq,
)]
#[graphql(name = "UserId", with = scalar::Via::<domain::user::Id>)]
pub struct Id(domain::user::Id);
