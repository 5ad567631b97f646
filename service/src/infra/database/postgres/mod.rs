//! Postgres [`Database`] implementation.

pub mod client;
pub mod connection;
mod impls;
mod predicate;

use deadpool_postgres::Runtime;
use derive_more::{Deref, Display, Error as StdError, From};
use tokio_postgres::{error::SqlState, NoTls};
use tracerr::Traced;

#[cfg(doc)]
use crate::infra::Database;
use crate::infra::database::{self, Constraint};

pub use refinery::embed_migrations;

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
};

pub use deadpool_postgres::Config;

/// Name of the exclusion constraint keeping reservations of the same property
/// from sharing a night.
const RESERVATIONS_NO_OVERLAP: &str = "reservations_no_overlap";

/// Name of the unique constraint allowing at most one review per reservation.
const REVIEWS_ONE_PER_RESERVATION: &str = "reviews_reservation_id_key";

/// Postgres [`Database`] client.
#[derive(Clone, Debug, Deref)]
pub struct Postgres<T = NonTx>(T);

impl Postgres {
    /// Creates a new [`Postgres`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If failed to create a new [`Postgres`] client.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self(NonTx::from_pool(pool)))
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// [`Connection`] error.
    #[display("`Connection` error: {_0}")]
    Connection(connection::Error),

    /// Error of creating a new [`connection::Pool`] client.
    #[display("Failed to create a new `connection::Pool`: {_0}")]
    PoolCreationError(connection::PoolCreationError),

    /// [`connection::Pool`] error.
    #[display("`connection::Pool` error: {_0}")]
    PoolError(connection::PoolError),
}

impl Error {
    /// Checks whether this [`Error`] is a violation of the provided
    /// constraint with the provided [`SqlState`].
    fn violates(&self, state: &SqlState, constraint: &str) -> bool {
        match self {
            Self::Connection(e) => {
                e.code() == Some(state)
                    && e.as_db_error().and_then(|e| e.constraint())
                        == Some(constraint)
            }
            Self::PoolError(..) | Self::PoolCreationError(..) => false,
        }
    }

    /// Returns the [`Constraint`] this [`Error`] is a violation of, if any.
    #[must_use]
    pub fn violated_constraint(&self) -> Option<Constraint> {
        if self.violates(&SqlState::EXCLUSION_VIOLATION, RESERVATIONS_NO_OVERLAP)
        {
            return Some(Constraint::NoOverlappingReservations);
        }
        if self
            .violates(&SqlState::UNIQUE_VIOLATION, REVIEWS_ONE_PER_RESERVATION)
        {
            return Some(Constraint::OneReviewPerReservation);
        }
        None
    }
}
