//! Process-wide metadata store.
//!
//! Entity and property metadata are kept per type, keyed by the type's
//! [`TypeId`]. The two kinds never collide: a type can carry an entity
//! declaration, a property map, both, or neither.
//!
//! A type may name a parent type. Property lookups walk the parent chain
//! (own declarations win), while entity lookups never do: a subtype that was
//! not itself declared has no table, even when its parent has one.

use crate::error::{CoreError, CoreResult};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

/// Stable identity of an entity type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
}

impl EntityType {
    /// Returns the identity of `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the full type path.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the type name without its module path or generic arguments.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityType({})", self.name)
    }
}

/// Entity-level metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    /// Table backing the entity.
    pub table: String,
}

/// Declared type tag of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// UTF-8 text.
    String,
    /// Integer or floating point number.
    Number,
    /// Boolean.
    Bool,
    /// Point in time.
    Datetime,
    /// Nested object.
    Object,
    /// Array of values.
    Array,
    /// Reference to another record.
    Record,
    /// Any value.
    Any,
    /// Database-specific type name.
    Custom(String),
}

impl FieldType {
    /// Returns the lowercase tag name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Datetime => "datetime",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Record => "record",
            FieldType::Any => "any",
            FieldType::Custom(name) => name,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMetadata {
    /// Declared type tag.
    pub field_type: FieldType,
    /// Whether the field is required. Declared only, not enforced on write.
    pub required: bool,
    /// Whether the field identifies at most one row.
    pub unique: bool,
    /// Whether the field should be indexed.
    pub index: bool,
}

/// Property metadata of one type, by field name.
pub type PropertyMap = BTreeMap<String, PropertyMetadata>;

#[derive(Debug, Default)]
struct TypeRecord {
    entity: Option<EntityMetadata>,
    properties: PropertyMap,
    parent: Option<EntityType>,
}

/// Keyed store of entity and property metadata.
///
/// Declarations write once per type at startup; queries read many times
/// afterwards. Most code uses [`MetadataStore::global`]; separate stores are
/// useful in tests.
#[derive(Debug, Default)]
pub struct MetadataStore {
    types: RwLock<HashMap<TypeId, TypeRecord>>,
}

static GLOBAL: LazyLock<MetadataStore> = LazyLock::new(MetadataStore::new);

impl MetadataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide store.
    pub fn global() -> &'static MetadataStore {
        &GLOBAL
    }

    /// Sets the entity metadata of `ty`, replacing any earlier value.
    pub fn set_entity(&self, ty: EntityType, metadata: EntityMetadata) {
        self.types.write().entry(ty.id).or_default().entity = Some(metadata);
    }

    /// Returns the entity metadata declared on `ty` itself.
    ///
    /// Ancestors are not consulted.
    #[must_use]
    pub fn own_entity(&self, ty: EntityType) -> Option<EntityMetadata> {
        self.types
            .read()
            .get(&ty.id)
            .and_then(|record| record.entity.clone())
    }

    /// Returns the table of `ty`, failing if `ty` has no declaration of its own.
    pub fn table_name(&self, ty: EntityType) -> CoreResult<String> {
        self.own_entity(ty)
            .map(|metadata| metadata.table)
            .ok_or_else(|| CoreError::declaration_missing(ty.short_name()))
    }

    /// Sets the metadata of one property of `ty`.
    pub fn set_property(&self, ty: EntityType, field: impl Into<String>, metadata: PropertyMetadata) {
        self.types
            .write()
            .entry(ty.id)
            .or_default()
            .properties
            .insert(field.into(), metadata);
    }

    /// Records `parent` as the supertype of `ty`.
    pub fn set_parent(&self, ty: EntityType, parent: EntityType) {
        self.types.write().entry(ty.id).or_default().parent = Some(parent);
    }

    /// Returns the parent of `ty`, if one was declared.
    #[must_use]
    pub fn parent(&self, ty: EntityType) -> Option<EntityType> {
        self.types.read().get(&ty.id).and_then(|record| record.parent)
    }

    /// Returns the properties declared on `ty` itself.
    #[must_use]
    pub fn own_properties(&self, ty: EntityType) -> PropertyMap {
        self.types
            .read()
            .get(&ty.id)
            .map(|record| record.properties.clone())
            .unwrap_or_default()
    }

    /// Returns the properties of `ty` merged with those of its ancestors.
    ///
    /// Returns an empty map for an undeclared type.
    #[must_use]
    pub fn properties(&self, ty: EntityType) -> PropertyMap {
        let types = self.types.read();
        let mut merged = PropertyMap::new();
        for id in lineage(&types, ty.id).into_iter().rev() {
            if let Some(record) = types.get(&id) {
                merged.extend(
                    record
                        .properties
                        .iter()
                        .map(|(field, metadata)| (field.clone(), metadata.clone())),
                );
            }
        }
        merged
    }

    /// Returns the metadata of one property, searching ancestors if `ty`
    /// does not declare it.
    #[must_use]
    pub fn property(&self, ty: EntityType, field: &str) -> Option<PropertyMetadata> {
        let types = self.types.read();
        lineage(&types, ty.id)
            .into_iter()
            .find_map(|id| types.get(&id).and_then(|record| record.properties.get(field)))
            .cloned()
    }
}

/// Returns `start` followed by its ancestors, nearest first.
fn lineage(types: &HashMap<TypeId, TypeRecord>, start: TypeId) -> Vec<TypeId> {
    let mut chain = vec![start];
    let mut seen = HashSet::from([start]);
    let mut current = start;
    while let Some(parent) = types.get(&current).and_then(|record| record.parent) {
        // A cycle in parent links ends the walk.
        if !seen.insert(parent.id) {
            break;
        }
        chain.push(parent.id);
        current = parent.id;
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account;
    struct Admin;
    struct Orphan;

    fn text(unique: bool) -> PropertyMetadata {
        PropertyMetadata {
            field_type: FieldType::String,
            required: false,
            unique,
            index: false,
        }
    }

    #[test]
    fn undeclared_type_has_no_metadata() {
        let store = MetadataStore::new();
        let ty = EntityType::of::<Orphan>();
        assert!(store.own_entity(ty).is_none());
        assert!(store.properties(ty).is_empty());
        assert!(store.property(ty, "name").is_none());
    }

    #[test]
    fn table_name_requires_own_declaration() {
        let store = MetadataStore::new();
        let account = EntityType::of::<Account>();
        let admin = EntityType::of::<Admin>();
        store.set_entity(
            account,
            EntityMetadata {
                table: "accounts".into(),
            },
        );
        store.set_parent(admin, account);

        assert_eq!(store.table_name(account).unwrap(), "accounts");
        let err = store.table_name(admin).unwrap_err();
        assert!(matches!(err, CoreError::DeclarationMissing { ref entity } if entity == "Admin"));
    }

    #[test]
    fn entity_and_property_kinds_do_not_collide() {
        let store = MetadataStore::new();
        let ty = EntityType::of::<Account>();
        store.set_property(ty, "email", text(true));
        assert!(store.own_entity(ty).is_none());

        store.set_entity(ty, EntityMetadata { table: "a".into() });
        assert_eq!(store.own_properties(ty).len(), 1);
    }

    #[test]
    fn properties_are_inherited_and_overridable() {
        let store = MetadataStore::new();
        let account = EntityType::of::<Account>();
        let admin = EntityType::of::<Admin>();
        store.set_property(account, "email", text(true));
        store.set_property(account, "name", text(false));
        store.set_property(admin, "name", text(true));
        store.set_parent(admin, account);

        let merged = store.properties(admin);
        assert_eq!(merged.len(), 2);
        assert!(merged["email"].unique);
        assert!(merged["name"].unique);
        assert!(!store.properties(account)["name"].unique);
        assert!(store.property(admin, "email").is_some());
        assert_eq!(store.own_properties(admin).len(), 1);
    }

    #[test]
    fn parent_cycle_terminates() {
        let store = MetadataStore::new();
        let account = EntityType::of::<Account>();
        let admin = EntityType::of::<Admin>();
        store.set_parent(admin, account);
        store.set_parent(account, admin);
        store.set_property(account, "email", text(true));

        assert_eq!(store.properties(admin).len(), 1);
        assert!(store.property(admin, "missing").is_none());
    }

    #[test]
    fn short_name_strips_path_and_generics() {
        struct Wrapper<T>(T);
        let ty = EntityType::of::<Wrapper<Account>>();
        assert_eq!(ty.short_name(), "Wrapper");
        assert_eq!(EntityType::of::<Account>().short_name(), "Account");
    }
}
