use crate::driver::DatabaseClient;
use crate::error::{OrmError, OrmResult};
use entiorm_core::{Entity, RecordId};
use tracing::debug;

/// Replaces the stored content of `entity` with its current fields.
///
/// A key-only identifier is qualified with the entity's table. The record
/// returned by the database is merged back onto `entity`.
pub async fn update<T: Entity>(client: &dyn DatabaseClient, entity: &mut T) -> OrmResult<()> {
    let id = entity.id().cloned().ok_or(OrmError::MissingIdentifier {
        operation: "update",
    })?;
    let table = T::table_name()?;
    replace(client, entity, id.qualified_for(&table)).await
}

/// Writes the fields of `entity` to `target` and merges the stored record
/// back, setting `target` as the entity's id.
///
/// `entity` is only modified once the write has succeeded.
pub(super) async fn replace<T: Entity>(
    client: &dyn DatabaseClient,
    entity: &mut T,
    target: RecordId,
) -> OrmResult<()> {
    let payload = entity.to_record()?;
    debug!(id = %target, fields = payload.len(), "update");

    let record = client.update(&target, payload).await?;
    entity.merge_record(record)?;
    if entity.id().is_none() {
        entity.set_id(target);
    }
    Ok(())
}
