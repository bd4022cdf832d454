//! Equality filters.

use crate::entity::ID_FIELD;
use crate::error::{CoreError, CoreResult};
use crate::metadata::{EntityType, PropertyMap};
use crate::record_id::RecordId;
use serde_json::Value;

/// Value a filter field is compared against.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A plain value, bound as given.
    Value(Value),
    /// A structured record reference. Only valid for the identifier field,
    /// where just its key is bound.
    Record(RecordId),
}

/// One `field = value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Field name, passed through to the query unescaped.
    pub field: String,
    /// Compared value.
    pub value: FilterValue,
}

impl Condition {
    /// Returns true if the condition targets the identifier field.
    #[must_use]
    pub fn is_identifier(&self) -> bool {
        self.field == ID_FIELD
    }

    /// Returns the value bound for this condition's parameter.
    ///
    /// For the identifier, a structured reference binds only its key, and a
    /// structured `{ "tb", "id" }` object binds only its `id`. Text is bound
    /// unchanged.
    #[must_use]
    pub fn bound_value(&self) -> Value {
        match &self.value {
            FilterValue::Record(id) => Value::String(id.key().to_string()),
            FilterValue::Value(Value::Object(map)) if self.is_identifier() => {
                map.get(ID_FIELD).cloned().unwrap_or(Value::Null)
            }
            FilterValue::Value(value) => value.clone(),
        }
    }
}

/// A conjunction of equality conditions, kept in insertion order.
///
/// Field names must come from the entity's declared fields. They are placed
/// in the query text as-is and only the values are bound as parameters.
///
/// ```rust,ignore
/// let filter = Filter::new().eq("email", "a@x.com").eq("active", true);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Creates an empty filter, matching every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `field = value`.
    ///
    /// A later condition on the same field replaces the earlier one in place.
    #[must_use]
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field.into(), FilterValue::Value(value.into()))
    }

    /// Adds a condition on the identifier field.
    #[must_use]
    pub fn id(self, id: RecordId) -> Self {
        self.push(ID_FIELD.to_string(), FilterValue::Record(id))
    }

    fn push(mut self, field: String, value: FilterValue) -> Self {
        match self.conditions.iter_mut().find(|c| c.field == field) {
            Some(existing) => existing.value = value,
            None => self.conditions.push(Condition { field, value }),
        }
        self
    }

    /// Returns the conditions in order.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns true if the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns the number of conditions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Checks that every non-identifier field is declared unique.
    ///
    /// The identifier is always accepted. The first offending field, in
    /// filter order, is reported.
    pub fn ensure_unique(&self, entity: EntityType, properties: &PropertyMap) -> CoreResult<()> {
        for condition in self.conditions.iter().filter(|c| !c.is_identifier()) {
            let unique = properties
                .get(&condition.field)
                .is_some_and(|metadata| metadata.unique);
            if !unique {
                return Err(CoreError::not_unique_field(
                    entity.short_name(),
                    condition.field.clone(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FieldType, PropertyMetadata};
    use serde_json::json;

    struct Member;

    fn properties() -> PropertyMap {
        let mut map = PropertyMap::new();
        for (field, unique) in [("email", true), ("name", false)] {
            map.insert(
                field.to_string(),
                PropertyMetadata {
                    field_type: FieldType::String,
                    required: false,
                    unique,
                    index: false,
                },
            );
        }
        map
    }

    #[test]
    fn keeps_insertion_order_and_replaces_duplicates() {
        let filter = Filter::new().eq("b", 1).eq("a", 2).eq("b", 3);
        let fields: Vec<_> = filter.conditions().iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, ["b", "a"]);
        assert_eq!(filter.conditions()[0].bound_value(), json!(3));
    }

    #[test]
    fn identifier_binding_normalizes_structured_refs() {
        let by_ref = Filter::new().id(RecordId::new("members", "k1"));
        assert_eq!(by_ref.conditions()[0].bound_value(), json!("k1"));

        let by_object = Filter::new().eq("id", json!({ "tb": "members", "id": "k2" }));
        assert_eq!(by_object.conditions()[0].bound_value(), json!("k2"));

        let by_text = Filter::new().eq("id", "members:k3");
        assert_eq!(by_text.conditions()[0].bound_value(), json!("members:k3"));
    }

    #[test]
    fn plain_object_values_are_bound_unchanged() {
        let filter = Filter::new().eq("meta", json!({ "id": 1 }));
        assert_eq!(filter.conditions()[0].bound_value(), json!({ "id": 1 }));
    }

    #[test]
    fn ensure_unique_accepts_unique_and_identifier() {
        let filter = Filter::new().eq("email", "a@x.com").id(RecordId::new("m", "1"));
        assert!(filter
            .ensure_unique(EntityType::of::<Member>(), &properties())
            .is_ok());
    }

    #[test]
    fn ensure_unique_rejects_first_offender() {
        let filter = Filter::new().eq("email", "a@x.com").eq("name", "A").eq("age", 3);
        let err = filter
            .ensure_unique(EntityType::of::<Member>(), &properties())
            .unwrap_err();
        assert!(matches!(err, CoreError::NotUniqueField { ref field, .. } if field == "name"));
    }

    #[test]
    fn ensure_unique_rejects_undeclared_fields() {
        let filter = Filter::new().eq("nickname", "x");
        assert!(filter
            .ensure_unique(EntityType::of::<Member>(), &PropertyMap::new())
            .is_err());
    }
}
