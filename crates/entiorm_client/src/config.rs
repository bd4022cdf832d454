//! Configuration for the ORM.

use crate::driver::{Credentials, Scope};
use serde::Deserialize;

/// User name used when none is configured.
pub const DEFAULT_USERNAME: &str = "root";

/// Password used when none is configured.
///
/// Development default only.
pub const DEFAULT_PASSWORD: &str = "root";

/// Level at which [`crate::Orm::connect`] signs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectMode {
    /// Root user.
    #[default]
    Root,
    /// Namespace user of the configured namespace.
    Namespace,
    /// Database user of the configured namespace and database.
    Database,
}

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrmConfig {
    /// Endpoint of the database, e.g. `ws://localhost:8000/rpc`.
    pub url: String,
    /// Namespace to work in.
    pub namespace: String,
    /// Database to work in.
    pub database: String,
    /// User name; defaults to [`DEFAULT_USERNAME`].
    #[serde(default)]
    pub username: Option<String>,
    /// Password; defaults to [`DEFAULT_PASSWORD`].
    #[serde(default)]
    pub password: Option<String>,
}

impl OrmConfig {
    /// Creates a configuration with default credentials.
    pub fn new(
        url: impl Into<String>,
        namespace: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            namespace: namespace.into(),
            database: database.into(),
            username: None,
            password: None,
        }
    }

    /// Sets user name and password.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Returns the credentials for signing in at `mode`.
    pub fn credentials(&self, mode: ConnectMode) -> Credentials {
        let (namespace, database) = match mode {
            ConnectMode::Root => (None, None),
            ConnectMode::Namespace => (Some(self.namespace.clone()), None),
            ConnectMode::Database => (Some(self.namespace.clone()), Some(self.database.clone())),
        };
        Credentials {
            username: self
                .username
                .clone()
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password: self
                .password
                .clone()
                .unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
            namespace,
            database,
        }
    }

    /// Returns the namespace and database to select after signing in.
    pub fn scope(&self) -> Scope {
        Scope {
            namespace: self.namespace.clone(),
            database: self.database.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_default_to_development_user() {
        let config = OrmConfig::new("mem://", "test", "app");
        let credentials = config.credentials(ConnectMode::Root);
        assert_eq!(credentials.username, "root");
        assert_eq!(credentials.password, "root");
        assert!(credentials.namespace.is_none());
        assert!(credentials.database.is_none());
    }

    #[test]
    fn connect_mode_selects_scope_of_credentials() {
        let config = OrmConfig::new("mem://", "test", "app").with_credentials("ops", "secret");

        let namespace = config.credentials(ConnectMode::Namespace);
        assert_eq!(namespace.username, "ops");
        assert_eq!(namespace.namespace.as_deref(), Some("test"));
        assert!(namespace.database.is_none());

        let database = config.credentials(ConnectMode::Database);
        assert_eq!(database.namespace.as_deref(), Some("test"));
        assert_eq!(database.database.as_deref(), Some("app"));
    }

    #[test]
    fn builder_overrides_scope() {
        let config = OrmConfig::new("mem://", "a", "b")
            .with_namespace("ns")
            .with_database("db");
        let scope = config.scope();
        assert_eq!(scope.namespace, "ns");
        assert_eq!(scope.database, "db");
    }

    #[test]
    fn deserializes_with_optional_credentials() {
        let config: OrmConfig = serde_json::from_str(
            r#"{ "url": "ws://localhost:8000/rpc", "namespace": "test", "database": "app" }"#,
        )
        .unwrap();
        assert_eq!(config, OrmConfig::new("ws://localhost:8000/rpc", "test", "app"));

        let mode: ConnectMode = serde_json::from_str(r#""namespace""#).unwrap();
        assert_eq!(mode, ConnectMode::Namespace);
    }
}
