use crate::driver::DatabaseClient;
use crate::error::{OrmError, OrmResult};
use entiorm_core::Entity;
use tracing::debug;

/// Deletes the row backing `entity`.
///
/// The in-memory entity is not modified.
pub async fn delete<T: Entity>(client: &dyn DatabaseClient, entity: &T) -> OrmResult<()> {
    let id = entity.id().ok_or(OrmError::MissingIdentifier {
        operation: "delete",
    })?;
    let target = id.qualified_for(&T::table_name()?);
    debug!(id = %target, "delete");

    client.delete(&target).await?;
    Ok(())
}
