//! # EntiORM Core
//!
//! Schema registry and query engine for EntiORM.
//!
//! This crate provides:
//! - A process-wide metadata store keyed by type identity
//! - Entity and property declarations
//! - The `Entity` trait every mapped type implements
//! - Record references (`table:key`)
//! - Parameterized query construction from equality filters
//! - Decoding of query responses and hydration into entities
//!
//! It performs no I/O. Executing queries is the job of `entiorm_client`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entity;
mod error;
mod metadata;
mod record_id;
mod schema;

pub mod query;

pub use entity::{Entity, Record, ID_FIELD};
pub use error::{CoreError, CoreResult};
pub use metadata::{
    EntityMetadata, EntityType, FieldType, MetadataStore, PropertyMap, PropertyMetadata,
};
pub use query::{Filter, Query};
pub use record_id::RecordId;
pub use schema::{
    declare_entity, declare_property, declare_property_in, default_table_name, EntityDeclaration,
    EntityOptions, PropertyOptions,
};
