//! [`NonTx`] client definitions.

use std::sync::Arc;

use tokio::sync::RwLockReadGuard;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

use super::{delegate_connection, Lazy};

/// Non-transactional Postgres database client.
///
/// Every statement is committed on its own.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to take [`Connection`]s from.
    pub(crate) pool: connection::Pool,

    /// [`Connection`] taken from the [`connection::Pool`] on first use.
    connection: Arc<Lazy<connection::NonTx>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client from the provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            connection: Arc::default(),
        }
    }

    /// Takes a fresh [`Connection`] from the [`connection::Pool`].
    async fn pooled(&self) -> Result<connection::NonTx, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }

    /// Returns the underlying [`Connection`] of this [`NonTx`] client.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        self.connection
            .get_or_try_init(|| self.pooled())
            .await
            .map_err(tracerr::wrap!())
    }

    /// Takes the underlying [`Connection`] out of this [`NonTx`] client, if
    /// it was established.
    pub(crate) async fn take_connection(&self) -> Option<connection::NonTx> {
        self.connection.take().await
    }
}

delegate_connection!(NonTx);
