//! CRUD operations.
//!
//! Every operation is a plain async function taking the database client as
//! its first argument. [`crate::Orm`] forwards to these with its live
//! client; they can also be called directly with any [`DatabaseClient`].
//!
//! [`DatabaseClient`]: crate::DatabaseClient

mod create;
mod delete;
mod find;
mod raw;
mod update;
mod upsert;

pub use create::create;
pub use delete::delete;
pub use find::{find_all, find_many, find_unique};
pub use raw::{raw, raw_as};
pub use update::update;
pub use upsert::upsert;

use crate::driver::DatabaseClient;
use crate::error::OrmResult;
use entiorm_core::query::{first_rows, Query};
use entiorm_core::Record;
use tracing::debug;

/// Runs a built query and returns the rows of its first statement.
async fn fetch_rows(client: &dyn DatabaseClient, query: Query) -> OrmResult<Vec<Record>> {
    let (text, params) = query.into_parts();
    debug!(query = %text, params = ?params.keys().collect::<Vec<_>>(), "executing query");
    let response = client.query(&text, params).await?;
    Ok(first_rows(response)?)
}
