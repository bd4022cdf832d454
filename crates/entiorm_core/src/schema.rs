//! Schema declarations.
//!
//! Entity types are declared once at startup with an explicit registration
//! call. Each call writes straight into a [`MetadataStore`], so reapplying a
//! declaration with identical arguments leaves the store unchanged.
//!
//! ```rust,ignore
//! use entiorm_core::{declare_entity, EntityOptions, FieldType, PropertyOptions};
//!
//! declare_entity::<User>(EntityOptions::new().table("users"))
//!     .property("email", PropertyOptions::new(FieldType::String).unique())
//!     .property("name", PropertyOptions::new(FieldType::String).required())
//!     .property("age", PropertyOptions::new(FieldType::Number));
//! ```

use crate::metadata::{EntityMetadata, EntityType, FieldType, MetadataStore, PropertyMetadata};
use std::marker::PhantomData;

/// Options for an entity declaration.
#[derive(Debug, Clone, Default)]
pub struct EntityOptions {
    /// Table name; defaults to the lowercased type name.
    pub table: Option<String>,
}

impl EntityOptions {
    /// Creates options with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the table name.
    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

/// Options for a property declaration.
///
/// The type tag is mandatory; `required`, `unique` and `index` default to
/// false.
#[derive(Debug, Clone)]
pub struct PropertyOptions {
    field_type: FieldType,
    required: bool,
    unique: bool,
    index: bool,
}

impl PropertyOptions {
    /// Creates options for a field of the given type.
    #[must_use]
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            unique: false,
            index: false,
        }
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field as unique, making it usable in `find_unique`.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the field as indexed.
    #[must_use]
    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    fn into_metadata(self) -> PropertyMetadata {
        PropertyMetadata {
            field_type: self.field_type,
            required: self.required,
            unique: self.unique,
            index: self.index,
        }
    }
}

/// Returns the table name used when none is given: the lowercased type name.
#[must_use]
pub fn default_table_name(ty: EntityType) -> String {
    ty.short_name().to_lowercase()
}

/// An in-progress declaration of entity type `T`.
///
/// Every method has already written to the store by the time it returns;
/// dropping the declaration needs no finishing call.
#[must_use = "a declaration is usually chained with property declarations"]
pub struct EntityDeclaration<'s, T: 'static> {
    store: &'s MetadataStore,
    _marker: PhantomData<fn() -> T>,
}

impl<'s, T: 'static> EntityDeclaration<'s, T> {
    /// Declares `T` as an entity in `store`.
    pub fn in_store(store: &'s MetadataStore, options: EntityOptions) -> Self {
        let ty = EntityType::of::<T>();
        let table = options.table.unwrap_or_else(|| default_table_name(ty));
        store.set_entity(ty, EntityMetadata { table });
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Declares one field of `T`, keeping previously declared fields.
    pub fn property(self, field: &str, options: PropertyOptions) -> Self {
        declare_property_in::<T>(self.store, field, options);
        self
    }

    /// Records `P` as the supertype of `T`, so `T` inherits `P`'s properties.
    ///
    /// The table is never inherited.
    pub fn extends<P: 'static>(self) -> Self {
        self.store
            .set_parent(EntityType::of::<T>(), EntityType::of::<P>());
        self
    }

    /// Returns the identity of the declared type.
    pub fn entity_type(&self) -> EntityType {
        EntityType::of::<T>()
    }
}

/// Declares `T` as an entity in the process-wide store.
pub fn declare_entity<T: 'static>(options: EntityOptions) -> EntityDeclaration<'static, T> {
    EntityDeclaration::in_store(MetadataStore::global(), options)
}

/// Declares one field of `T` in the process-wide store.
pub fn declare_property<T: 'static>(field: &str, options: PropertyOptions) {
    declare_property_in::<T>(MetadataStore::global(), field, options);
}

/// Declares one field of `T` in `store`.
pub fn declare_property_in<T: 'static>(store: &MetadataStore, field: &str, options: PropertyOptions) {
    store.set_property(EntityType::of::<T>(), field, options.into_metadata());
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct BlogPost;
    struct Comment;
    struct Reply;

    #[test]
    fn table_defaults_to_lowercased_type_name() {
        let store = MetadataStore::new();
        let _ = EntityDeclaration::<BlogPost>::in_store(&store, EntityOptions::new());
        assert_eq!(
            store.table_name(EntityType::of::<BlogPost>()).unwrap(),
            "blogpost"
        );
    }

    #[test]
    fn explicit_table_wins() {
        let store = MetadataStore::new();
        let _ = EntityDeclaration::<BlogPost>::in_store(&store, EntityOptions::new().table("posts"));
        assert_eq!(store.table_name(EntityType::of::<BlogPost>()).unwrap(), "posts");
    }

    #[test]
    fn properties_accumulate() {
        let store = MetadataStore::new();
        let decl = EntityDeclaration::<Comment>::in_store(&store, EntityOptions::new())
            .property("body", PropertyOptions::new(FieldType::String).required())
            .property("slug", PropertyOptions::new(FieldType::String).unique().index());
        let properties = store.properties(decl.entity_type());

        assert_eq!(properties.len(), 2);
        assert!(properties["body"].required);
        assert!(!properties["body"].unique);
        assert!(properties["slug"].unique);
        assert!(properties["slug"].index);
    }

    #[test]
    fn redeclaration_is_idempotent() {
        let store = MetadataStore::new();
        for _ in 0..2 {
            let _ = EntityDeclaration::<Comment>::in_store(&store, EntityOptions::new().table("c"))
                .property("slug", PropertyOptions::new(FieldType::String).unique());
        }
        let ty = EntityType::of::<Comment>();
        assert_eq!(store.table_name(ty).unwrap(), "c");
        assert_eq!(store.properties(ty).len(), 1);
    }

    #[test]
    fn subtype_inherits_properties_not_table() {
        let store = MetadataStore::new();
        let _ = EntityDeclaration::<Comment>::in_store(&store, EntityOptions::new())
            .property("slug", PropertyOptions::new(FieldType::String).unique());
        declare_property_in::<Reply>(&store, "depth", PropertyOptions::new(FieldType::Number));
        store.set_parent(EntityType::of::<Reply>(), EntityType::of::<Comment>());

        let reply = EntityType::of::<Reply>();
        assert!(store.table_name(reply).is_err());
        assert!(store.property(reply, "slug").unwrap().unique);
        assert_eq!(store.properties(reply).len(), 2);
    }

    proptest! {
        #[test]
        fn unique_defaults_to_false(
            field in "[a-z][a-z0-9_]{0,15}",
            required in any::<bool>(),
            index in any::<bool>(),
        ) {
            let store = MetadataStore::new();
            let mut options = PropertyOptions::new(FieldType::Any);
            if required {
                options = options.required();
            }
            if index {
                options = options.index();
            }
            declare_property_in::<BlogPost>(&store, &field, options);

            let metadata = store.property(EntityType::of::<BlogPost>(), &field).unwrap();
            prop_assert!(!metadata.unique);
            prop_assert_eq!(metadata.required, required);
            prop_assert_eq!(metadata.index, index);
        }

        #[test]
        fn declared_table_is_returned_verbatim(table in "[a-z_][a-z0-9_]{0,20}") {
            let store = MetadataStore::new();
            let _ = EntityDeclaration::<Reply>::in_store(&store, EntityOptions::new().table(table.clone()));
            prop_assert_eq!(store.table_name(EntityType::of::<Reply>()).unwrap(), table);
        }
    }
}
