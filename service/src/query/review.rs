//! [`Query`] collection related to [`Review`]s.

use common::operations::By;

use crate::read::review::{Candidate, Eligible};
#[cfg(doc)]
use crate::{domain::Review, Query};

use super::DatabaseQuery;

/// Queries the [`Reservation`] a guest may leave a [`Review`] for.
///
/// The earliest eligible [`Reservation`] is picked, if there are many.
///
/// [`Reservation`]: crate::domain::Reservation
pub type CanReview = DatabaseQuery<By<Eligible, Candidate>>;
