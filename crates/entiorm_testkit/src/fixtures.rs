//! Test fixtures and ORM helpers.
//!
//! Provides sample entity types declared in the process-wide metadata store
//! and ORM instances wired to a fresh [`MemoryServer`].

use crate::memory::MemoryServer;
use entiorm_client::{ConnectMode, Orm, OrmConfig};
use entiorm_core::{declare_entity, Entity, EntityOptions, FieldType, PropertyOptions, RecordId};
use serde::{Deserialize, Serialize};
use std::sync::Once;

/// Namespace used by [`test_config`].
pub const TEST_NAMESPACE: &str = "test";

/// Database used by [`test_config`].
pub const TEST_DATABASE: &str = "app";

/// Sample entity stored in table `users`.
///
/// `email` is unique, `username` is indexed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Unique e-mail address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Optional login name.
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// Creates an unsaved user.
    pub fn new(email: &str, name: &str, age: u32) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            age,
            ..Self::default()
        }
    }
}

impl Entity for User {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
}

/// Sample entity stored in table `post`, with no unique fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Title.
    pub title: String,
    /// E-mail of the author.
    pub author: String,
    /// Publication flag.
    #[serde(default)]
    pub published: bool,
    /// Creation time, filled in by the database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Entity for Post {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
}

/// Sample subtype of [`User`] stored in table `admins`.
///
/// Inherits the `User` properties, so `email` is unique here as well.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    /// Identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Unique e-mail address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Permission level.
    pub level: u8,
}

impl Entity for Admin {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }
}

/// Declares the sample entities. Safe to call from every test.
pub fn declare_fixtures() {
    static DECLARED: Once = Once::new();
    DECLARED.call_once(|| {
        let _ = declare_entity::<User>(EntityOptions::new().table("users"))
            .property("email", PropertyOptions::new(FieldType::String).unique())
            .property("name", PropertyOptions::new(FieldType::String).required())
            .property("age", PropertyOptions::new(FieldType::Number))
            .property("username", PropertyOptions::new(FieldType::String).index());

        let _ = declare_entity::<Post>(EntityOptions::new())
            .property("title", PropertyOptions::new(FieldType::String).required())
            .property("author", PropertyOptions::new(FieldType::String).index())
            .property("published", PropertyOptions::new(FieldType::Bool))
            .property("created_at", PropertyOptions::new(FieldType::Datetime));

        let _ = declare_entity::<Admin>(EntityOptions::new().table("admins"))
            .extends::<User>()
            .property("level", PropertyOptions::new(FieldType::Number));
    });
}

/// Returns a configuration for the test namespace and database.
pub fn test_config() -> OrmConfig {
    OrmConfig::new("mem://localhost", TEST_NAMESPACE, TEST_DATABASE)
}

/// An ORM wired to its own in-memory database.
pub struct TestOrm {
    /// The ORM instance.
    pub orm: Orm,
    /// The database behind it.
    pub server: MemoryServer,
}

impl TestOrm {
    /// Creates a disconnected ORM over a fresh database.
    pub fn new() -> Self {
        Self::with_config(MemoryServer::new(), test_config())
    }

    /// Creates a disconnected ORM over `server` with `config`.
    pub fn with_config(server: MemoryServer, config: OrmConfig) -> Self {
        declare_fixtures();
        Self {
            orm: Orm::new(config, server.factory()),
            server,
        }
    }

    /// Creates an ORM already connected as root.
    pub async fn connected() -> Self {
        let test = Self::new();
        test.orm
            .connect(ConnectMode::Root)
            .await
            .expect("Failed to connect to in-memory database");
        test
    }

    /// Rows currently stored in `table` of the test database.
    pub fn rows(&self, table: &str) -> Vec<entiorm_core::Record> {
        self.server.rows(
            &self.orm.config().namespace,
            &self.orm.config().database,
            table,
        )
    }
}

impl Default for TestOrm {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestOrm {
    type Target = Orm;

    fn deref(&self) -> &Self::Target {
        &self.orm
    }
}
