//! In-memory [`Database`] implementation.

use std::{collections::HashMap, future::Future, sync::Arc};

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Update,
};
use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{property, reservation, Property, Reservation, Review},
    infra::{
        database::{self, Constraint},
        Database,
    },
    read::{
        property::{search, OfOwner},
        reservation::{IsAvailable, IsReserved, OfGuest, OfHost, Slot},
        review::{Candidate, Eligible},
    },
};

/// In-memory [`Database`].
///
/// [`Transact`]ion holds the whole [`State`] exclusively until it's committed
/// or dropped, so transactions are fully serialized.
#[derive(Clone, Debug, Default)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Non-transactional [`Memory`] access: each operation is applied atomically
/// on its own.
#[derive(Clone, Debug, Default)]
pub struct NonTx(Arc<Mutex<State>>);

/// Transactional [`Memory`] access.
///
/// Changes are staged upon a copy of the [`State`] and discarded on drop,
/// unless committed.
#[derive(Clone, Debug)]
pub struct Tx(Arc<Mutex<Option<Staged>>>);

/// [`State`] staged by a [`Tx`].
#[derive(Debug)]
struct Staged {
    /// Exclusively held committed [`State`].
    committed: OwnedMutexGuard<State>,

    /// [`State`] with the changes of the [`Tx`] applied.
    state: State,
}

/// Stored data.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// [`Property`]s by their IDs.
    properties: HashMap<property::Id, Property>,

    /// [`property::Image`]s in the order they were added.
    images: Vec<property::Image>,

    /// [`Reservation`]s by their IDs.
    reservations: HashMap<reservation::Id, Reservation>,

    /// [`Review`]s in the order they were left.
    reviews: Vec<Review>,
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Constraint`] is violated.
    #[display("`{_0}` constraint is violated")]
    Violation(#[error(not(source))] Constraint),

    /// [`Tx`] is already committed.
    #[display("Transaction is already committed")]
    Committed,
}

impl Error {
    /// Returns the [`Constraint`] this [`Error`] is a violation of, if any.
    #[must_use]
    pub const fn violated_constraint(&self) -> Option<Constraint> {
        match self {
            Self::Violation(c) => Some(*c),
            Self::Committed => None,
        }
    }
}

/// Access to the [`State`] of a [`Memory`] database.
pub trait Access {
    /// Applies the provided function to the accessible [`State`].
    ///
    /// # Errors
    ///
    /// If the function fails, or the [`State`] is not accessible anymore.
    fn with<R>(
        &self,
        f: impl FnOnce(&mut State) -> Result<R, Error>,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;
}

impl Access for NonTx {
    async fn with<R>(
        &self,
        f: impl FnOnce(&mut State) -> Result<R, Error>,
    ) -> Result<R, Traced<database::Error>> {
        let mut state = self.0.lock().await;
        f(&mut state)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

impl Access for Tx {
    async fn with<R>(
        &self,
        f: impl FnOnce(&mut State) -> Result<R, Error>,
    ) -> Result<R, Traced<database::Error>> {
        let mut staged = self.0.lock().await;
        staged
            .as_mut()
            .ok_or(Error::Committed)
            .and_then(|s| f(&mut s.state))
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
    }
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let committed = Arc::clone(&self.0 .0).lock_owned().await;
        let state = committed.clone();
        Ok(Memory(Tx(Arc::new(Mutex::new(Some(Staged {
            committed,
            state,
        }))))))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        // Already inside a transaction, so it's joined.
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let staged = self.0 .0.lock().await.take();
        let Staged {
            mut committed,
            state,
        } = staged
            .ok_or(Error::Committed)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        *committed = state;
        Ok(())
    }
}

impl<T: Access> Database<Select<By<Option<Property>, property::Id>>>
    for Memory<T>
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0.with(|s| Ok(s.properties.get(&id).cloned())).await
    }
}

impl<T: Access> Database<Insert<Property>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(property)).await.map_err(tracerr::wrap!())
    }
}

impl<T: Access> Database<Update<Property>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|s| {
                _ = s.properties.insert(property.id, property);
                Ok(())
            })
            .await
    }
}

impl<T: Access> Database<Lock<By<Property, property::Id>>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // The whole `State` is locked by a `Tx` already.
        Ok(())
    }
}

impl<T: Access> Database<Delete<By<Property, property::Id>>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .with(|s| {
                _ = s.properties.remove(&id);
                s.images.retain(|i| i.property_id != id);
                Ok(())
            })
            .await
    }
}

impl<T: Access> Database<Select<By<Vec<Property>, OfOwner>>> for Memory<T> {
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, OfOwner>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfOwner(owner_id) = by.into_inner();
        self.0
            .with(|s| {
                let mut found = s
                    .properties
                    .values()
                    .filter(|p| p.owner_id == owner_id)
                    .cloned()
                    .collect::<Vec<_>>();
                found.sort_unstable_by(|a, b| {
                    (b.created_at, b.id).cmp(&(a.created_at, a.id))
                });
                Ok(found)
            })
            .await
    }
}

impl<T: Access> Database<Insert<property::Image>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(image): Insert<property::Image>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|s| {
                s.images.push(image);
                Ok(())
            })
            .await
    }
}

impl<T: Access> Database<Select<By<Vec<property::Image>, property::Id>>>
    for Memory<T>
{
    type Ok = Vec<property::Image>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<property::Image>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .with(|s| {
                Ok(s.images
                    .iter()
                    .filter(|i| i.property_id == id)
                    .cloned()
                    .collect())
            })
            .await
    }
}

impl State {
    /// Returns the [`Property`]s passing the provided [`search::Filter`],
    /// newest first.
    fn search(&self, filter: &search::Filter) -> Vec<&Property> {
        let mut found = self
            .properties
            .values()
            .filter(|p| filter.matches(p))
            .collect::<Vec<_>>();
        found.sort_unstable_by(|a, b| {
            (b.created_at, b.id).cmp(&(a.created_at, a.id))
        });
        found
    }

    /// Returns [`Reservation`]s satisfying the provided predicate, newest
    /// first.
    fn reservations(
        &self,
        predicate: impl Fn(&Reservation) -> bool,
    ) -> Vec<Reservation> {
        let mut found = self
            .reservations
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect::<Vec<_>>();
        found.sort_unstable_by(|a, b| {
            (b.created_at, b.id).cmp(&(a.created_at, a.id))
        });
        found
    }
}

impl<T: Access> Database<Select<By<search::TotalCount, search::Filter>>>
    for Memory<T>
{
    type Ok = search::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<search::TotalCount, search::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        self.0
            .with(|s| Ok((s.search(&filter).len() as u64).into()))
            .await
    }
}

impl<T: Access> Database<Select<By<search::Page, search::Selector>>>
    for Memory<T>
{
    type Ok = search::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<search::Page, search::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let search::Selector { arguments, filter } = by.into_inner();
        let skip = usize::try_from(arguments.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(arguments.per_page()).unwrap_or(usize::MAX);

        self.0
            .with(|s| {
                let found = s.search(&filter);
                let total_count = found.len() as u64;
                let items = found
                    .into_iter()
                    .skip(skip)
                    .take(take)
                    .map(|p| search::Summary {
                        property: p.clone(),
                        image: s
                            .images
                            .iter()
                            .find(|i| i.property_id == p.id)
                            .map(|i| i.url.clone()),
                    })
                    .collect::<Vec<_>>();
                Ok(search::Page::new(&arguments, items, total_count))
            })
            .await
    }
}

impl<T: Access> Database<Select<By<IsAvailable, Slot>>> for Memory<T> {
    type Ok = IsAvailable;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<IsAvailable, Slot>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Slot { property_id, stay } = by.into_inner();
        self.0
            .with(|s| {
                Ok(IsAvailable(!s.reservations.values().any(|r| {
                    r.property_id == property_id && r.stay.overlaps(&stay)
                })))
            })
            .await
    }
}

impl<T: Access> Database<Select<By<IsReserved, property::Id>>> for Memory<T> {
    type Ok = IsReserved;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<IsReserved, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .with(|s| {
                Ok(IsReserved(
                    s.reservations.values().any(|r| r.property_id == id),
                ))
            })
            .await
    }
}

impl<T: Access> Database<Insert<Reservation>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(reservation): Insert<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|s| {
                if s.reservations.values().any(|r| {
                    r.property_id == reservation.property_id
                        && r.stay.overlaps(&reservation.stay)
                }) {
                    return Err(Error::Violation(
                        Constraint::NoOverlappingReservations,
                    ));
                }
                _ = s.reservations.insert(reservation.id, reservation);
                Ok(())
            })
            .await
    }
}

impl<T: Access> Database<Update<Reservation>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(reservation): Update<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|s| {
                if let Some(r) = s.reservations.get_mut(&reservation.id) {
                    r.eligibility = reservation.eligibility;
                }
                Ok(())
            })
            .await
    }
}

impl<T: Access> Database<Select<By<Option<Reservation>, reservation::Id>>>
    for Memory<T>
{
    type Ok = Option<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Reservation>, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0.with(|s| Ok(s.reservations.get(&id).cloned())).await
    }
}

impl<T: Access> Database<Lock<By<Reservation, reservation::Id>>>
    for Memory<T>
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Reservation, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // The whole `State` is locked by a `Tx` already.
        Ok(())
    }
}

impl<T: Access> Database<Select<By<Vec<Reservation>, OfGuest>>> for Memory<T> {
    type Ok = Vec<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Reservation>, OfGuest>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfGuest(guest_id) = by.into_inner();
        self.0
            .with(|s| Ok(s.reservations(|r| r.guest_id == guest_id)))
            .await
    }
}

impl<T: Access> Database<Select<By<Vec<Reservation>, OfHost>>> for Memory<T> {
    type Ok = Vec<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Reservation>, OfHost>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OfHost(host_id) = by.into_inner();
        self.0
            .with(|s| Ok(s.reservations(|r| r.host_id == host_id)))
            .await
    }
}

impl<T: Access> Database<Insert<Review>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(review): Insert<Review>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .with(|s| {
                if s
                    .reviews
                    .iter()
                    .any(|r| r.reservation_id == review.reservation_id)
                {
                    return Err(Error::Violation(
                        Constraint::OneReviewPerReservation,
                    ));
                }
                s.reviews.push(review);
                Ok(())
            })
            .await
    }
}

impl<T: Access> Database<Select<By<Vec<Review>, property::Id>>> for Memory<T> {
    type Ok = Vec<Review>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Review>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.0
            .with(|s| {
                let mut found = s
                    .reviews
                    .iter()
                    .filter(|r| r.property_id == id)
                    .cloned()
                    .collect::<Vec<_>>();
                found.sort_by(|a, b| {
                    (b.created_at, b.id).cmp(&(a.created_at, a.id))
                });
                Ok(found)
            })
            .await
    }
}

impl<T: Access> Database<Select<By<Eligible, Candidate>>> for Memory<T> {
    type Ok = Eligible;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Eligible, Candidate>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Candidate {
            guest_id,
            property_id,
        } = by.into_inner();
        self.0
            .with(|s| {
                Ok(Eligible(
                    s.reservations
                        .values()
                        .filter(|r| {
                            r.guest_id == guest_id
                                && r.property_id == property_id
                                && r.eligibility.can_review()
                                && !s
                                    .reviews
                                    .iter()
                                    .any(|rv| rv.reservation_id == r.id)
                        })
                        .min_by_key(|r| (r.created_at, r.id))
                        .map(|r| r.id),
                ))
            })
            .await
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{
        operations::{By, Commit, Insert, Select, Transact},
        Date, DateRange, DateTime, Money,
    };

    use crate::{
        domain::{
            property,
            reservation::{self, GuestCount},
            review::Eligibility,
            user, Reservation,
        },
        infra::{
            database::{self, Constraint},
            Database as _,
        },
        read::reservation::{IsAvailable, Slot},
    };

    use super::Memory;

    fn reservation(
        property_id: property::Id,
        start: &str,
        end: &str,
    ) -> Reservation {
        Reservation {
            id: reservation::Id::new(),
            property_id,
            guest_id: user::Id::from(2),
            host_id: user::Id::from(1),
            stay: DateRange::new(
                Date::from_str(start).unwrap(),
                Date::from_str(end).unwrap(),
            )
            .unwrap(),
            guests: GuestCount::new(1).unwrap(),
            total_price: Money::from_str("100").unwrap(),
            eligibility: Eligibility::Completed,
            created_at: DateTime::now().coerce(),
        }
    }

    #[tokio::test]
    async fn rejects_overlapping_reservations() {
        let db = Memory::new();
        let property_id = property::Id::new();

        db.execute(Insert(reservation(property_id, "2025-03-01", "2025-03-04")))
            .await
            .unwrap();
        let err = db
            .execute(Insert(reservation(property_id, "2025-03-03", "2025-03-05")))
            .await
            .unwrap_err();

        assert_eq!(
            err.as_ref().violated_constraint(),
            Some(Constraint::NoOverlappingReservations),
        );
        db.execute(Insert(reservation(property_id, "2025-03-04", "2025-03-05")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn discards_uncommitted_transaction() {
        let db = Memory::new();
        let property_id = property::Id::new();
        let slot = Slot {
            property_id,
            stay: reservation(property_id, "2025-03-01", "2025-03-02").stay,
        };

        {
            let tx = db.execute(Transact).await.unwrap();
            tx.execute(Insert(reservation(
                property_id,
                "2025-03-01",
                "2025-03-02",
            )))
            .await
            .unwrap();
        }
        let available = db
            .execute(Select(By::<IsAvailable, _>::new(slot)))
            .await
            .unwrap();
        assert!(*available);

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(reservation(property_id, "2025-03-01", "2025-03-02")))
            .await
            .unwrap();
        tx.execute(Commit).await.unwrap();
        drop(tx);

        let available = db
            .execute(Select(By::<IsAvailable, _>::new(slot)))
            .await
            .unwrap();
        assert!(!*available);
    }

    #[tokio::test]
    async fn committed_transaction_is_unusable() {
        let db = Memory::new();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Commit).await.unwrap();
        let err = tx.execute(Commit).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            database::Error::Memory(super::Error::Committed),
        ));
    }
}
