//! [`Query`] collection related to [`Reservation`]s.

use common::operations::By;

use crate::{
    domain::Reservation,
    read::reservation::{OfGuest, OfHost},
};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries [`Reservation`]s made by a guest, newest first.
pub type OfGuestList = DatabaseQuery<By<Vec<Reservation>, OfGuest>>;

/// Queries [`Reservation`]s of a host's properties, newest first.
pub type OfHostList = DatabaseQuery<By<Vec<Reservation>, OfHost>>;
