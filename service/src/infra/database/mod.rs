//! [`Database`]-related implementations.

#[cfg(any(test, feature = "memory"))]
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

use crate::error::{Categorize, Kind};

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(any(test, feature = "memory"))]
    /// [`Memory`] error.
    Memory(memory::Error),

    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

impl Error {
    /// Returns the [`Constraint`] this error is a violation of, if any.
    #[must_use]
    pub fn violated_constraint(&self) -> Option<Constraint> {
        match self {
            #[cfg(any(test, feature = "memory"))]
            Self::Memory(e) => e.violated_constraint(),
            #[cfg(feature = "postgres")]
            Self::Postgres(e) => e.violated_constraint(),
        }
    }
}

impl Categorize for Error {
    fn kind(&self) -> Kind {
        if self.violated_constraint().is_some() {
            Kind::Conflict
        } else {
            Kind::StoreUnavailable
        }
    }
}

/// Invariant enforced by a [`Database`] itself, so holding even against
/// concurrent writers.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Constraint {
    /// Reservations of the same property never share a night.
    #[display("no overlapping reservations")]
    NoOverlappingReservations,

    /// At most one review is left per reservation.
    #[display("one review per reservation")]
    OneReviewPerReservation,
}
