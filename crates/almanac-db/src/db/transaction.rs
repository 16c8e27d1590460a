//! Transaction helper utilities for database operations.
//!
//! ## Usage
//!
//! Diesel-async provides transaction support through
//! `AsyncConnection::transaction`. Wrap multi-row writes in a closure:
//!
//! ```rust,ignore
//! use diesel_async::scoped_futures::ScopedFutureExt;
//! use crate::db::transaction::with_transaction;
//!
//! with_transaction(conn, |conn| async move {
//!     file::upsert_file(conn, &header).await?;
//!     component::upsert_component(conn, &row).await?;
//!     Ok(())
//! }.scope_boxed()).await?;
//! ```

use diesel_async::{AsyncConnection, scoped_futures::ScopedBoxFuture};

use crate::db::connection::DbConnection;

/// ## Summary
/// Runs a database transaction and returns the closure result.
///
/// ## Errors
/// Returns any error produced by the closure, or errors raised while
/// starting or committing the transaction. An error rolls the whole
/// transaction back; no partial state stays visible.
pub async fn with_transaction<'conn, T, F>(
    conn: &'conn mut DbConnection<'conn>,
    callback: F,
) -> anyhow::Result<T>
where
    F: for<'r> FnOnce(&'r mut DbConnection<'conn>) -> ScopedBoxFuture<'conn, 'r, anyhow::Result<T>>
        + Send
        + 'conn,
    T: Send + 'conn,
{
    conn.transaction::<_, anyhow::Error, _>(callback).await
}
