//! Error categories shared by all the [`Command`]s and [`Query`]s.
//!
//! [`Command`]: crate::Command
//! [`Query`]: crate::Query

use derive_more::Display;
use tracerr::Traced;

/// Category of an error, telling the caller how it should be reacted on.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Kind {
    /// Input is malformed, missing or out of range.
    InvalidInput,

    /// Requested entity doesn't exist.
    NotFound,

    /// Request clashes with the current state (taken dates, duplicate
    /// review).
    Conflict,

    /// Actor is not allowed to perform the request.
    NotAuthorized,

    /// Infrastructure failed transiently.
    StoreUnavailable,
}

impl Kind {
    /// Indicates whether the failed request may succeed if retried as is.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::StoreUnavailable)
    }
}

/// Error which may be [`Kind`]-categorized.
pub trait Categorize {
    /// Returns the [`Kind`] of this error.
    fn kind(&self) -> Kind;
}

impl<E: Categorize> Categorize for Traced<E> {
    fn kind(&self) -> Kind {
        self.as_ref().kind()
    }
}
