use crate::driver::DatabaseClient;
use crate::error::OrmResult;
use entiorm_core::query::first_payload;
use entiorm_core::{CoreError, Record};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Runs `query` as given and returns the payload of its first statement.
///
/// The payload is unwrapped from its `{ result }` envelope when there is
/// one, and is returned even when the envelope reports an `ERR` status.
/// Client failures are returned unchanged as [`crate::OrmError::Driver`].
pub async fn raw(
    client: &dyn DatabaseClient,
    query: &str,
    params: Option<Record>,
) -> OrmResult<Value> {
    debug!(query = %query, "raw");
    let response = client.query(query, params.unwrap_or_default()).await?;
    Ok(first_payload(response))
}

/// Like [`raw`], deserializing the payload into `R`.
pub async fn raw_as<R: DeserializeOwned>(
    client: &dyn DatabaseClient,
    query: &str,
    params: Option<Record>,
) -> OrmResult<R> {
    let value = raw(client, query, params).await?;
    Ok(serde_json::from_value(value).map_err(CoreError::from)?)
}
