use super::update::replace;
use super::{create, fetch_rows};
use crate::driver::DatabaseClient;
use crate::error::{OrmError, OrmResult};
use entiorm_core::query::select;
use entiorm_core::{CoreError, Entity, Filter, RecordId, ID_FIELD};
use serde_json::Value;
use tracing::debug;

/// Updates the row whose `key_fields` equal those of `entity`, or creates
/// one if there is none.
///
/// Every key field other than `id` must be a field of `entity`. The key
/// fields are not checked against the declared `unique` flags. On failure
/// `entity` is left as it was.
///
/// Lookup and write are separate calls: two concurrent upserts with the same
/// key can both create a row unless the database enforces uniqueness on it.
pub async fn upsert<T: Entity>(
    client: &dyn DatabaseClient,
    entity: &mut T,
    key_fields: &[&str],
) -> OrmResult<()> {
    if key_fields.is_empty() {
        return Err(OrmError::invalid_argument("upsert needs at least one key field"));
    }

    let table = T::table_name()?;
    let fields = entity.to_record()?;
    if let Some(unknown) = key_fields
        .iter()
        .find(|field| **field != ID_FIELD && !fields.contains_key(**field))
    {
        return Err(OrmError::invalid_argument(format!(
            "upsert key `{unknown}` is not a field of {}",
            T::entity_type().short_name()
        )));
    }
    let filter = key_fields.iter().fold(Filter::new(), |filter, field| {
        match (*field, entity.id()) {
            (ID_FIELD, Some(id)) => filter.id(id.clone()),
            _ => filter.eq(*field, fields.get(*field).cloned().unwrap_or(Value::Null)),
        }
    });

    let rows = fetch_rows(client, select(&table).filter(&filter).limit(1).build()).await?;
    match rows.into_iter().next() {
        Some(existing) => {
            let id = existing
                .get(ID_FIELD)
                .cloned()
                .ok_or_else(|| CoreError::invalid_response("matched row has no id"))?;
            let id: RecordId = serde_json::from_value(id).map_err(CoreError::from)?;
            debug!(id = %id, "upsert matched existing row");
            replace(client, entity, id.qualified_for(&table)).await
        }
        None => {
            debug!(table = %table, "upsert found no row, creating");
            create(client, entity).await
        }
    }
}
