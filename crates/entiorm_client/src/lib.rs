//! # EntiORM Client
//!
//! Connection management and CRUD operations for EntiORM.
//!
//! This crate provides:
//! - The `DatabaseClient` abstraction over a concrete database client
//! - `Orm`, which owns one client and tracks the connection lifecycle
//! - create, find-unique, find-many, find-all, update, delete, upsert and
//!   raw queries over declared entity types
//!
//! ## Key Invariants
//!
//! - `find_unique` only accepts fields declared unique, plus `id`
//! - update and delete require an identifier and fail before any call
//!   to the database without one
//! - No operation retries; failures surface immediately
//! - A failed connect or ping releases the client

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connection;
mod driver;
mod error;

pub mod ops;

pub use config::{ConnectMode, OrmConfig, DEFAULT_PASSWORD, DEFAULT_USERNAME};
pub use connection::{ConnectionState, Orm};
pub use driver::{ClientFactory, Credentials, DatabaseClient, Scope};
pub use error::{DriverError, DriverResult, OrmError, OrmResult};

pub use entiorm_core::{
    declare_entity, declare_property, Entity, EntityOptions, FieldType, Filter, PropertyOptions,
    Record, RecordId,
};
