use crate::driver::DatabaseClient;
use crate::error::{OrmError, OrmResult};
use entiorm_core::{CoreError, Entity, ID_FIELD};
use tracing::debug;

/// Inserts `entity` into its table.
///
/// The first returned row is merged back onto `entity`, so the generated
/// identifier and any database-computed defaults become visible on it. If
/// the call fails the entity is left as it was.
pub async fn create<T: Entity>(client: &dyn DatabaseClient, entity: &mut T) -> OrmResult<()> {
    let table = T::table_name()?;
    let payload = entity.to_record()?;
    debug!(table = %table, fields = payload.len(), "create");

    let record = client
        .create(&table, payload)
        .await?
        .into_iter()
        .next()
        .ok_or(OrmError::EmptyResponse {
            operation: "create",
        })?;
    if !record.contains_key(ID_FIELD) {
        return Err(CoreError::invalid_response("created record has no id").into());
    }

    entity.merge_record(record)?;
    Ok(())
}
