//! Connection manager.

use crate::config::{ConnectMode, OrmConfig};
use crate::driver::{ClientFactory, DatabaseClient};
use crate::error::{DriverResult, OrmError, OrmResult};
use crate::ops;
use entiorm_core::{Entity, Filter, Record};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Lifecycle state of an [`Orm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No client is held.
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// A signed-in, scoped client is held.
    Connected,
}

struct Slot {
    state: ConnectionState,
    client: Option<Arc<dyn DatabaseClient>>,
}

/// Entry point of the ORM: owns one database client and runs CRUD
/// operations through it.
///
/// # Example
///
/// ```rust,ignore
/// use entiorm_client::{ConnectMode, Orm, OrmConfig};
/// use entiorm_core::Filter;
///
/// let orm = Orm::new(OrmConfig::new("ws://localhost:8000/rpc", "test", "app"), factory);
/// orm.connect(ConnectMode::Root).await?;
///
/// let mut user = User { email: "a@x.com".into(), ..User::default() };
/// orm.create(&mut user).await?;
///
/// let found: Option<User> = orm.find_unique(&Filter::new().eq("email", "a@x.com")).await?;
/// ```
///
/// `connect` replaces the held client unconditionally. It must not run
/// concurrently with itself or with operations on the same instance.
pub struct Orm {
    config: OrmConfig,
    factory: Box<dyn ClientFactory>,
    slot: Mutex<Slot>,
}

impl Orm {
    /// Creates a disconnected ORM.
    pub fn new(config: OrmConfig, factory: impl ClientFactory + 'static) -> Self {
        Self {
            config,
            factory: Box::new(factory),
            slot: Mutex::new(Slot {
                state: ConnectionState::Disconnected,
                client: None,
            }),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OrmConfig {
        &self.config
    }

    /// Returns the current lifecycle state.
    ///
    /// This does not contact the database; see [`Orm::is_connected`].
    pub fn state(&self) -> ConnectionState {
        self.slot.lock().state
    }

    /// Connects, signs in at `mode` and selects the configured namespace and
    /// database.
    ///
    /// Any previously held client is dropped first. If a step fails the new
    /// client is discarded, the ORM stays disconnected and the failure is
    /// returned as [`OrmError::Connection`].
    pub async fn connect(&self, mode: ConnectMode) -> OrmResult<()> {
        {
            let mut slot = self.slot.lock();
            slot.client = None;
            slot.state = ConnectionState::Connecting;
        }

        let client = self.factory.open();
        match self.open_session(client.as_ref(), mode).await {
            Ok(()) => {
                let mut slot = self.slot.lock();
                slot.client = Some(client);
                slot.state = ConnectionState::Connected;
                info!(url = %self.config.url, ?mode, "connected");
                Ok(())
            }
            Err(e) => {
                self.slot.lock().state = ConnectionState::Disconnected;
                warn!(url = %self.config.url, ?mode, error = %e, "connection failed, client discarded");
                Err(OrmError::connection(e))
            }
        }
    }

    async fn open_session(&self, client: &dyn DatabaseClient, mode: ConnectMode) -> DriverResult<()> {
        client.connect(&self.config.url).await?;
        client.signin(&self.config.credentials(mode)).await?;
        client.use_scope(&self.config.scope()).await
    }

    /// Closes and releases the held client. Does nothing when disconnected.
    pub async fn disconnect(&self) -> OrmResult<()> {
        let client = {
            let mut slot = self.slot.lock();
            slot.state = ConnectionState::Disconnected;
            slot.client.take()
        };
        if let Some(client) = client {
            client.close().await?;
            info!(url = %self.config.url, "disconnected");
        }
        Ok(())
    }

    /// Pings the database.
    ///
    /// A failed ping releases the client and reports `false`.
    pub async fn is_connected(&self) -> bool {
        let Some(client) = self.slot.lock().client.clone() else {
            return false;
        };
        match client.ping().await {
            Ok(()) => true,
            Err(e) => {
                let mut slot = self.slot.lock();
                // Keep a client installed by a reconnect in the meantime.
                if slot
                    .client
                    .as_ref()
                    .is_some_and(|held| Arc::ptr_eq(held, &client))
                {
                    slot.client = None;
                    slot.state = ConnectionState::Disconnected;
                }
                warn!(error = %e, "ping failed, client discarded");
                false
            }
        }
    }

    fn client(&self) -> OrmResult<Arc<dyn DatabaseClient>> {
        self.slot.lock().client.clone().ok_or(OrmError::NotConnected)
    }

    /// Inserts `entity`; see [`ops::create`].
    pub async fn create<T: Entity>(&self, entity: &mut T) -> OrmResult<()> {
        let client = self.client()?;
        ops::create(client.as_ref(), entity).await
    }

    /// Finds one entity by unique fields; see [`ops::find_unique`].
    pub async fn find_unique<T: Entity>(&self, filter: &Filter) -> OrmResult<Option<T>> {
        let client = self.client()?;
        ops::find_unique(client.as_ref(), filter).await
    }

    /// Finds all entities matching `filter`; see [`ops::find_many`].
    pub async fn find_many<T: Entity>(&self, filter: &Filter) -> OrmResult<Vec<T>> {
        let client = self.client()?;
        ops::find_many(client.as_ref(), filter).await
    }

    /// Returns every entity of `T`; see [`ops::find_all`].
    pub async fn find_all<T: Entity>(&self) -> OrmResult<Vec<T>> {
        let client = self.client()?;
        ops::find_all(client.as_ref()).await
    }

    /// Writes `entity` back; see [`ops::update`].
    pub async fn update<T: Entity>(&self, entity: &mut T) -> OrmResult<()> {
        let client = self.client()?;
        ops::update(client.as_ref(), entity).await
    }

    /// Deletes the row of `entity`; see [`ops::delete`].
    pub async fn delete<T: Entity>(&self, entity: &T) -> OrmResult<()> {
        let client = self.client()?;
        ops::delete(client.as_ref(), entity).await
    }

    /// Updates or creates `entity` keyed by `key_fields`; see [`ops::upsert`].
    pub async fn upsert<T: Entity>(&self, entity: &mut T, key_fields: &[&str]) -> OrmResult<()> {
        let client = self.client()?;
        ops::upsert(client.as_ref(), entity, key_fields).await
    }

    /// Runs a raw query; see [`ops::raw`].
    pub async fn raw(&self, query: &str, params: Option<Record>) -> OrmResult<Value> {
        let client = self.client()?;
        ops::raw(client.as_ref(), query, params).await
    }

    /// Runs a raw query and deserializes its payload; see [`ops::raw_as`].
    pub async fn raw_as<R: DeserializeOwned>(
        &self,
        query: &str,
        params: Option<Record>,
    ) -> OrmResult<R> {
        let client = self.client()?;
        ops::raw_as(client.as_ref(), query, params).await
    }
}

impl fmt::Debug for Orm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orm")
            .field("url", &self.config.url)
            .field("namespace", &self.config.namespace)
            .field("database", &self.config.database)
            .field("state", &self.state())
            .finish()
    }
}
