//! Query response decoding and hydration.
//!
//! A query response is a sequence of statement results, one per statement
//! in the query text. A statement result is either the bare payload (usually
//! an array of rows) or an envelope `{ "status": .., "result": .. }`. All
//! read paths only look at the first statement.

use crate::entity::{Entity, Record};
use crate::error::{CoreError, CoreResult};
use serde_json::Value;

const RESULT_FIELD: &str = "result";
const STATUS_FIELD: &str = "status";
const STATUS_ERR: &str = "ERR";

/// Returns the payload of the first statement, unwrapped from its envelope.
///
/// An empty response yields `Value::Null`. An envelope whose status is
/// `ERR` becomes [`CoreError::StatementFailed`].
pub fn first_statement(response: Vec<Value>) -> CoreResult<Value> {
    match response.into_iter().next() {
        Some(statement) => unwrap_statement(statement, true),
        None => Ok(Value::Null),
    }
}

/// Returns the payload of the first statement, unwrapped from its envelope
/// whatever its status.
///
/// The payload of an `ERR` envelope is returned as-is. An empty response
/// yields `Value::Null`.
#[must_use]
pub fn first_payload(response: Vec<Value>) -> Value {
    match response.into_iter().next() {
        Some(statement) => unwrap_statement(statement, false).unwrap_or(Value::Null),
        None => Value::Null,
    }
}

fn unwrap_statement(statement: Value, check_status: bool) -> CoreResult<Value> {
    let Value::Object(mut envelope) = statement else {
        return Ok(statement);
    };
    if !envelope.contains_key(RESULT_FIELD) {
        return Ok(Value::Object(envelope));
    }

    let result = envelope.remove(RESULT_FIELD).unwrap_or(Value::Null);
    if check_status && envelope.get(STATUS_FIELD).and_then(Value::as_str) == Some(STATUS_ERR) {
        let message = match result {
            Value::String(message) => message,
            other => other.to_string(),
        };
        return Err(CoreError::StatementFailed { message });
    }
    Ok(result)
}

/// Returns the rows of the first statement.
///
/// A missing or null payload yields no rows; a single object is one row.
pub fn first_rows(response: Vec<Value>) -> CoreResult<Vec<Record>> {
    match first_statement(response)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(rows) => rows
            .into_iter()
            .map(|row| match row {
                Value::Object(record) => Ok(record),
                other => Err(CoreError::invalid_response(format!(
                    "expected a row object, got {other}"
                ))),
            })
            .collect(),
        Value::Object(record) => Ok(vec![record]),
        other => Err(CoreError::invalid_response(format!(
            "expected rows, got {other}"
        ))),
    }
}

/// Hydrates every row into a fresh `T`.
pub fn hydrate_all<T: Entity>(rows: Vec<Record>) -> CoreResult<Vec<T>> {
    rows.into_iter().map(T::from_record).collect()
}

/// Hydrates the first row, if any, into a fresh `T`.
pub fn hydrate_first<T: Entity>(rows: Vec<Record>) -> CoreResult<Option<T>> {
    rows.into_iter().next().map(T::from_record).transpose()
}
