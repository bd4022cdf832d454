//! Entity trait for declared schema types.

use crate::error::{CoreError, CoreResult};
use crate::metadata::{EntityType, MetadataStore, PropertyMap, PropertyMetadata};
use crate::record_id::RecordId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Name of the identifier field in every record.
pub const ID_FIELD: &str = "id";

/// A plain field map as exchanged with the database.
pub type Record = Map<String, Value>;

/// Trait for types that map onto a database table.
///
/// Implementors provide access to the identifier field; everything else is
/// derived from `serde` and the metadata declared for the type.
///
/// # Example
///
/// ```rust,ignore
/// use entiorm_core::{Entity, RecordId};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct User {
///     id: Option<RecordId>,
///     email: String,
///     name: String,
///     age: u32,
/// }
///
/// impl Entity for User {
///     fn id(&self) -> Option<&RecordId> {
///         self.id.as_ref()
///     }
///
///     fn set_id(&mut self, id: RecordId) {
///         self.id = Some(id);
///     }
/// }
/// ```
///
/// The identifier must serialize under the field name [`ID_FIELD`] so that
/// records returned by the database hydrate it.
pub trait Entity: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// Returns the identifier, unset until the entity has been stored.
    fn id(&self) -> Option<&RecordId>;

    /// Replaces the identifier.
    fn set_id(&mut self, id: RecordId);

    /// Returns the type identity used for metadata lookups.
    fn entity_type() -> EntityType {
        EntityType::of::<Self>()
    }

    /// Returns the table declared for this exact type.
    ///
    /// Fails with [`CoreError::DeclarationMissing`] if the type has no entity
    /// declaration of its own.
    fn table_name() -> CoreResult<String> {
        MetadataStore::global().table_name(Self::entity_type())
    }

    /// Returns the declared properties, empty if none were declared.
    fn properties() -> PropertyMap {
        MetadataStore::global().properties(Self::entity_type())
    }

    /// Returns the metadata of one declared property.
    fn property(field: &str) -> Option<PropertyMetadata> {
        MetadataStore::global().property(Self::entity_type(), field)
    }

    /// Serializes every field except the identifier.
    ///
    /// This is the write payload for create and update.
    fn to_record(&self) -> CoreResult<Record> {
        let mut record = into_record(serde_json::to_value(self)?)?;
        record.remove(ID_FIELD);
        Ok(record)
    }

    /// Overwrites fields with every key present in `record`.
    ///
    /// Keys the entity does not know are ignored by deserialization unless
    /// the type denies unknown fields. On failure `self` is left untouched.
    fn merge_record(&mut self, record: Record) -> CoreResult<()> {
        let mut fields = into_record(serde_json::to_value(&*self)?)?;
        fields.extend(record);
        *self = serde_json::from_value(Value::Object(fields))?;
        Ok(())
    }

    /// Builds a fresh entity from a raw record.
    fn from_record(record: Record) -> CoreResult<Self> {
        let mut entity = Self::default();
        entity.merge_record(record)?;
        Ok(entity)
    }
}

fn into_record(value: Value) -> CoreResult<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::invalid_response(format!(
            "entity must serialize to an object, got {other}"
        ))),
    }
}
