//! [`Command`] for leaving a [`Review`] of a reserved [`Property`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use smart_default::SmartDefault;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::{review::Eligibility, Property};
use crate::{
    domain::{property, reservation, review, user, Reservation, Review},
    error::{Categorize, Kind},
    infra::{
        database::{self, Constraint},
        Database,
    },
    Service,
};

use super::Command;

/// Configuration of [`SubmitReview`] [`Command`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Minimal number of characters in a [`review::Comment`].
    #[default(10)]
    pub min_comment_length: usize,
}

/// [`Command`] for leaving a [`Review`] of a reserved [`Property`].
///
/// The [`Reservation`] must be in [`Eligibility::ReviewEnabled`] state at the
/// moment of submission, which is re-checked while holding it locked.
#[derive(Clone, Debug)]
pub struct SubmitReview {
    /// ID of the reviewed [`Property`].
    pub property_id: property::Id,

    /// ID of the guest leaving the [`Review`].
    pub guest_id: user::Id,

    /// ID of the [`Reservation`] the [`Review`] is left for.
    pub reservation_id: reservation::Id,

    /// [`review::Rating`] of the [`Property`].
    pub rating: review::Rating,

    /// [`review::Comment`] about the stay.
    pub comment: review::Comment,
}

impl<Db> Command<SubmitReview> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Reservation, reservation::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Reservation>, reservation::Id>>,
            Ok = Option<Reservation>,
            Err = Traced<database::Error>,
        > + Database<Insert<Review>, Ok = (), Err = Traced<database::Error>>
        + Database<
            Update<Reservation>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Review;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SubmitReview) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SubmitReview {
            property_id,
            guest_id,
            reservation_id,
            rating,
            comment,
        } = cmd;

        let min = self.config().submit_review.min_comment_length;
        if comment.char_count() < min {
            return Err(tracerr::new!(E::CommentTooShort(min)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent submissions for the same `Reservation`.
        tx.execute(Lock(By::<Reservation, _>::new(reservation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut reservation = tx
            .execute(Select(By::<Option<Reservation>, _>::new(reservation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|r| r.guest_id == guest_id && r.property_id == property_id)
            .ok_or(E::NotPermitted(reservation_id))
            .map_err(tracerr::wrap!())?;
        reservation.eligibility = match reservation.eligibility.reviewed() {
            Some(reviewed) => reviewed,
            None if reservation.eligibility == review::Eligibility::Reviewed => {
                return Err(tracerr::new!(E::AlreadyReviewed(reservation_id)));
            }
            None => {
                return Err(tracerr::new!(E::NotPermitted(reservation_id)));
            }
        };

        let review = Review {
            id: review::Id::new(),
            property_id,
            author_id: guest_id,
            reservation_id,
            rating,
            comment,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(review.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().violated_constraint()
                    == Some(Constraint::OneReviewPerReservation)
                {
                    tracerr::new!(E::AlreadyReviewed(reservation_id))
                } else {
                    tracerr::map_from(e)
                }
            })
            .map_err(tracerr::wrap!())?;

        tx.execute(Update(reservation))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "`Review(id: {})` of `Property(id: {property_id})` left by \
             `User(id: {guest_id})` for `Reservation(id: {reservation_id})`",
            review.id,
        );

        Ok(review)
    }
}

/// Error of [`SubmitReview`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`review::Comment`] is shorter than the configured minimum.
    #[display("`Comment` must contain at least {_0} characters")]
    #[from(ignore)]
    CommentTooShort(#[error(not(source))] usize),

    /// [`Reservation`] is not eligible for a [`Review`] by the guest.
    #[display("`Reservation(id: {_0})` cannot be reviewed")]
    #[from(ignore)]
    NotPermitted(#[error(not(source))] reservation::Id),

    /// [`Reservation`] is reviewed already.
    #[display("`Reservation(id: {_0})` is reviewed already")]
    #[from(ignore)]
    AlreadyReviewed(#[error(not(source))] reservation::Id),
}

impl Categorize for ExecutionError {
    fn kind(&self) -> Kind {
        match self {
            Self::Db(e) => e.kind(),
            Self::CommentTooShort(_) => Kind::InvalidInput,
            Self::NotPermitted(_) => Kind::NotAuthorized,
            Self::AlreadyReviewed(_) => Kind::Conflict,
        }
    }
}
