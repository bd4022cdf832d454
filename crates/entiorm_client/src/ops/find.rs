use super::fetch_rows;
use crate::driver::DatabaseClient;
use crate::error::{OrmError, OrmResult};
use entiorm_core::query::{hydrate_all, hydrate_first, select};
use entiorm_core::{Entity, Filter};

/// Finds the single row matching `filter`.
///
/// `filter` must not be empty, and every field in it other than `id` must
/// be declared unique on `T`; otherwise the call fails before the database
/// is contacted. Returns `None` when nothing matches.
pub async fn find_unique<T: Entity>(
    client: &dyn DatabaseClient,
    filter: &Filter,
) -> OrmResult<Option<T>> {
    if filter.is_empty() {
        return Err(OrmError::invalid_argument(
            "find_unique needs at least one condition",
        ));
    }
    filter.ensure_unique(T::entity_type(), &T::properties())?;
    let table = T::table_name()?;
    let rows = fetch_rows(client, select(&table).filter(filter).limit(1).build()).await?;
    Ok(hydrate_first(rows)?)
}

/// Finds every row matching `filter`.
///
/// An empty filter matches every row.
pub async fn find_many<T: Entity>(client: &dyn DatabaseClient, filter: &Filter) -> OrmResult<Vec<T>> {
    let table = T::table_name()?;
    let rows = fetch_rows(client, select(&table).filter(filter).build()).await?;
    Ok(hydrate_all(rows)?)
}

/// Returns every row of `T`'s table.
pub async fn find_all<T: Entity>(client: &dyn DatabaseClient) -> OrmResult<Vec<T>> {
    let table = T::table_name()?;
    let rows = fetch_rows(client, select(&table).build()).await?;
    Ok(hydrate_all(rows)?)
}
