//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

use super::{delegate_connection, Lazy, NonTx};

/// Transactional Postgres database client.
///
/// The transaction is started on first use, so a [`Tx`] which never touched
/// the database costs nothing.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to take a [`Connection`] from, if the [`NonTx`]
    /// one can't be reused.
    pool: connection::Pool,

    /// Inner representation of this client.
    inner: Arc<Inner>,
}

/// Inner representation of the [`Tx`] client.
#[derive(Debug)]
struct Inner {
    /// [`NonTx`] client this [`Tx`] was derived from.
    ///
    /// Its [`Connection`] is reused, if established, and the transaction is
    /// started on it.
    non_tx: Mutex<Option<NonTx>>,

    /// Lazily started [`connection::Tx`].
    tx: Lazy<connection::Tx>,
}

impl Tx {
    /// Creates a new [`Tx`] client from the provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            inner: Arc::new(Inner {
                non_tx: Mutex::new(Some(client)),
                tx: Lazy::default(),
            }),
        }
    }

    /// Returns underlying [`Connection`] of this [`Tx`] client, starting the
    /// transaction if it isn't yet.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        self.inner
            .tx
            .get_or_try_init(|| async {
                let reused = match self.inner.non_tx.lock().await.take() {
                    Some(client) => client.take_connection().await,
                    None => None,
                };
                let conn = if let Some(conn) = reused {
                    conn
                } else {
                    self.pool
                        .get()
                        .await
                        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                        .map_err(tracerr::map_from)?
                };
                connection::Tx::begin(conn).await.map_err(tracerr::wrap!())
            })
            .await
            .map_err(tracerr::wrap!())
    }

    /// Commits this [`Tx`] client.
    ///
    /// # Errors
    ///
    /// If failed to commit transaction of this [`Tx`] client.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        if let Some(tx) = self.inner.tx.take().await {
            tx.commit().await.map_err(tracerr::wrap!())
        } else {
            // Nothing was done, so nothing to commit.
            Ok(())
        }
    }
}

delegate_connection!(Tx);
