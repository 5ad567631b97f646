//! Postgres database client definitions.

pub mod non_tx;
pub mod tx;

use std::future::Future;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database;

pub use self::{non_tx::NonTx, tx::Tx};

/// Lazily established connection, shared between clones of a client.
#[derive(Debug)]
pub(crate) struct Lazy<C>(RwLock<Option<C>>);

impl<C> Default for Lazy<C> {
    fn default() -> Self {
        Self(RwLock::new(None))
    }
}

impl<C> Lazy<C> {
    /// Returns the established connection, establishing it with the provided
    /// `init` first, if there is none yet.
    pub(crate) async fn get_or_try_init<F, Fut>(
        &self,
        init: F,
    ) -> Result<RwLockReadGuard<'_, C>, Traced<database::Error>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C, Traced<database::Error>>>,
    {
        let conn = self.0.read().await;
        let guard = if conn.is_some() {
            conn
        } else {
            drop(conn);

            let mut conn = self.0.write().await;
            if conn.is_none() {
                *conn = Some(init().await.map_err(tracerr::wrap!())?);
            }
            conn.downgrade()
        };

        Ok(RwLockReadGuard::map(guard, |conn| {
            conn.as_ref()
                .expect("connection cannot be dropped while guard is alive")
        }))
    }

    /// Takes the established connection out, if any.
    ///
    /// The next use establishes a new connection.
    pub(crate) async fn take(&self) -> Option<C> {
        self.0.write().await.take()
    }
}

/// Implements [`Connection`] for a client by delegating to the connection it
/// establishes lazily.
///
/// [`Connection`]: super::Connection
macro_rules! delegate_connection {
    ($client:ty) => {
        impl Connection for $client {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Vec<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Option<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query_opt(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<u64, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .exec(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }
        }
    };
}
pub(crate) use delegate_connection;
