//! Conversion between core [`Value`]s and rusqlite types.
//!
//! Bound parameters go out as [`rusqlite::types::Value`]; result cells come
//! back through [`ValueRef`] and are collected into [`Record`]s keyed by the
//! statement's column names.

use exercise_tracker_core::{Record, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Row, Statement};

/// Converts a core value into an owned rusqlite value for binding.
pub(crate) fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Real(v) => SqlValue::Real(*v),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
    }
}

/// Converts a borrowed result cell into a core value.
///
/// Text that is not valid UTF-8 is decoded lossily.
pub(crate) fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Real(v),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

/// Binds a parameter list in placeholder order.
pub(crate) fn bind_params(params: &[Value]) -> impl rusqlite::Params + '_ {
    rusqlite::params_from_iter(params.iter().map(to_sql))
}

/// Returns a statement's result column names, owned so the statement can be
/// borrowed mutably for execution afterwards.
pub(crate) fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

/// Reads one row into a [`Record`] keyed by `columns`.
pub(crate) fn row_to_record(row: &Row<'_>, columns: &[String]) -> rusqlite::Result<Record> {
    let mut record = Record::new();
    for (index, name) in columns.iter().enumerate() {
        record.insert(name.as_str(), from_sql(row.get_ref(index)?));
    }
    Ok(record)
}
