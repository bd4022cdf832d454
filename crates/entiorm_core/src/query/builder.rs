//! Parameterized query construction.

use crate::entity::Record;
use crate::query::filter::Filter;
use serde_json::Value;
use std::fmt::Write as _;

/// Parameter that carries the table name for identifier conditions.
pub const TABLE_PARAM: &str = "table";

/// A query string together with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    text: String,
    params: Record,
}

impl Query {
    /// Returns the query text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the bound parameters.
    #[must_use]
    pub fn params(&self) -> &Record {
        &self.params
    }

    /// Splits the query into text and parameters.
    #[must_use]
    pub fn into_parts(self) -> (String, Record) {
        (self.text, self.params)
    }
}

/// Builder for `SELECT * FROM <table>` queries.
#[derive(Debug, Clone)]
pub struct Select<'a> {
    table: &'a str,
    filter: Option<&'a Filter>,
    limit: Option<usize>,
}

/// Starts a select over `table`.
#[must_use]
pub fn select(table: &str) -> Select<'_> {
    Select {
        table,
        filter: None,
        limit: None,
    }
}

impl<'a> Select<'a> {
    /// Restricts the select to rows matching every condition of `filter`.
    #[must_use]
    pub fn filter(mut self, filter: &'a Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Caps the number of returned rows.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Renders the query.
    ///
    /// Conditions appear in filter order joined by `AND`. An identifier
    /// condition addresses the row through `type::thing($table, $id)`, every
    /// other field is compared with a parameter of the same name. An empty
    /// filter renders no `WHERE` clause.
    #[must_use]
    pub fn build(self) -> Query {
        let mut text = format!("SELECT * FROM {}", self.table);
        let mut params = Record::new();

        if let Some(filter) = self.filter.filter(|f| !f.is_empty()) {
            let clauses: Vec<String> = filter
                .conditions()
                .iter()
                .map(|condition| {
                    params.insert(condition.field.clone(), condition.bound_value());
                    if condition.is_identifier() {
                        params.insert(TABLE_PARAM.to_string(), Value::String(self.table.to_string()));
                        format!(
                            "{field} = type::thing(${table}, ${field})",
                            field = condition.field,
                            table = TABLE_PARAM
                        )
                    } else {
                        format!("{field} = ${field}", field = condition.field)
                    }
                })
                .collect();
            let _ = write!(text, " WHERE {}", clauses.join(" AND "));
        }

        if let Some(limit) = self.limit {
            let _ = write!(text, " LIMIT {limit}");
        }

        Query { text, params }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_id::RecordId;
    use serde_json::json;

    #[test]
    fn unconditional_scan() {
        let query = select("users").build();
        assert_eq!(query.text(), "SELECT * FROM users");
        assert!(query.params().is_empty());
    }

    #[test]
    fn conjunction_in_filter_order() {
        let filter = Filter::new().eq("email", "a@x.com").eq("age", 30);
        let query = select("users").filter(&filter).build();
        assert_eq!(
            query.text(),
            "SELECT * FROM users WHERE email = $email AND age = $age"
        );
        assert_eq!(query.params()["email"], json!("a@x.com"));
        assert_eq!(query.params()["age"], json!(30));
        assert!(!query.params().contains_key(TABLE_PARAM));
    }

    #[test]
    fn identifier_condition_binds_table_and_key() {
        let filter = Filter::new().id(RecordId::new("users", "abc"));
        let query = select("users").filter(&filter).limit(1).build();
        assert_eq!(
            query.text(),
            "SELECT * FROM users WHERE id = type::thing($table, $id) LIMIT 1"
        );
        assert_eq!(query.params()["table"], json!("users"));
        assert_eq!(query.params()["id"], json!("abc"));
    }

    #[test]
    fn empty_filter_renders_no_where() {
        let filter = Filter::new();
        let query = select("users").filter(&filter).limit(5).build();
        assert_eq!(query.text(), "SELECT * FROM users LIMIT 5");
    }
}
