//! Database client abstraction.
//!
//! The ORM does not speak any wire protocol itself. A [`DatabaseClient`]
//! wraps a concrete client library (WebSocket, HTTP, embedded engine or a
//! test double) behind the small set of calls the ORM needs.

use crate::error::DriverResult;
use async_trait::async_trait;
use entiorm_core::{Record, RecordId};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Credentials presented on sign-in.
///
/// Which of `namespace` and `database` are set decides the level the user
/// signs in at: both unset is a root user, only `namespace` a namespace
/// user, both a database user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
    /// Namespace of a namespace or database user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Database of a database user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

/// Namespace and database selected for subsequent calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    /// Namespace.
    pub namespace: String,
    /// Database.
    pub database: String,
}

/// A connection-scoped database client.
///
/// One instance backs one connection. Query responses are returned raw:
/// one value per statement, either the bare payload or an envelope with a
/// `result` field.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Opens the connection to `url`.
    async fn connect(&self, url: &str) -> DriverResult<()>;

    /// Signs in.
    async fn signin(&self, credentials: &Credentials) -> DriverResult<()>;

    /// Selects namespace and database.
    async fn use_scope(&self, scope: &Scope) -> DriverResult<()>;

    /// Runs a query with bound parameters.
    async fn query(&self, text: &str, params: Record) -> DriverResult<Vec<Value>>;

    /// Inserts a record into `table` and returns the stored rows.
    async fn create(&self, table: &str, payload: Record) -> DriverResult<Vec<Record>>;

    /// Replaces the content of one record and returns it.
    async fn update(&self, id: &RecordId, payload: Record) -> DriverResult<Record>;

    /// Deletes one record.
    async fn delete(&self, id: &RecordId) -> DriverResult<()>;

    /// Checks that the connection is alive.
    async fn ping(&self) -> DriverResult<()>;

    /// Closes the connection.
    async fn close(&self) -> DriverResult<()>;
}

/// Produces a fresh, unconnected client for every connection attempt.
pub trait ClientFactory: Send + Sync {
    /// Returns a new client.
    fn open(&self) -> Arc<dyn DatabaseClient>;
}

impl<F> ClientFactory for F
where
    F: Fn() -> Arc<dyn DatabaseClient> + Send + Sync,
{
    fn open(&self) -> Arc<dyn DatabaseClient> {
        self()
    }
}
