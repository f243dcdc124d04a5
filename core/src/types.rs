//! Record and schema type definitions.
//!
//! This module defines the data model shared by the validator, the clause
//! builder, and the SQLite backend. Tables are not modeled as Rust structs:
//! their columns are discovered at runtime and carried around as a
//! [`TableSchema`] value, while rows and predicates are untyped [`Record`]s.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Column used by [`DateRange`] when none is given.
pub const DEFAULT_DATE_COLUMN: &str = "date";

/// A scalar value stored in, or compared against, a table column.
///
/// Serializes untagged, so a JSON `null`, number, or string maps directly
/// onto [`Null`](Value::Null), [`Integer`](Value::Integer)/[`Real`](Value::Real),
/// or [`Text`](Value::Text).
///
/// # Examples
///
/// ```
/// use exercise_tracker_core::{TypeClass, Value};
///
/// assert_eq!(Value::from(42).type_class(), Some(TypeClass::Numeric));
/// assert_eq!(Value::from("run").type_class(), Some(TypeClass::Text));
/// assert_eq!(Value::Null.type_class(), None);
/// assert!(Value::from("").is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`, or a field that was not supplied.
    #[default]
    Null,
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl Value {
    /// Returns the runtime type class of this value, or `None` for `Null`.
    pub fn type_class(&self) -> Option<TypeClass> {
        match self {
            Value::Null => None,
            Value::Integer(_) | Value::Real(_) => Some(TypeClass::Numeric),
            Value::Text(_) => Some(TypeClass::Text),
            Value::Blob(_) => Some(TypeClass::Binary),
        }
    }

    /// Returns `true` for `Null` and for empty text.
    ///
    /// Empty values are let through validation without a type check so that
    /// optional fields can be passed along unset.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Returns `true` if this is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Abstract classification of a runtime value, checked against a column's
/// declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// Integers and reals.
    Numeric,
    /// Strings.
    Text,
    /// Raw bytes. No declared type accepts this class.
    Binary,
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeClass::Numeric => f.write_str("numeric"),
            TypeClass::Text => f.write_str("text"),
            TypeClass::Binary => f.write_str("binary"),
        }
    }
}

/// An insertion-ordered mapping from column name to [`Value`].
///
/// Used both as a row to insert and as an equality predicate (a conjunction
/// of `column = value` constraints). Inserting a column that is already
/// present replaces its value without changing its position.
///
/// # Examples
///
/// ```
/// use exercise_tracker_core::{Record, Value};
///
/// let record = Record::new()
///     .with("userId", 1)
///     .with("description", "push-ups")
///     .with("userId", 2);
///
/// assert_eq!(record.len(), 2);
/// assert_eq!(record.get("userId"), Some(&Value::Integer(2)));
/// assert_eq!(record.columns().collect::<Vec<_>>(), ["userId", "description"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Sets `column` to `value`, returning the previous value if any.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((column, value));
                None
            }
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Removes `column`, preserving the order of the remaining entries.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(name, _)| name == column)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// `(column, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, value) in &self.entries {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of column names to scalar values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
                let mut record = Record::new();
                while let Some((column, value)) = access.next_entry::<String, Value>()? {
                    record.insert(column, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// One column of a table as reported by schema introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Declared type text exactly as written in the DDL (e.g. `VARCHAR(255)`).
    pub declared_type: String,
    /// Whether the column carries a `NOT NULL` constraint.
    pub not_null: bool,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            not_null: false,
            primary_key: false,
        }
    }
}

/// The live description of a table: its name and ordered columns.
///
/// Fetched fresh for every operation and passed to the validator; never
/// cached across calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnInfo>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Finds a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Returns `true` if introspection found no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Sort direction for an `ORDER BY` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Parses a direction token (`ASC`/`DESC`, ASCII case-insensitive).
    ///
    /// Unrecognized tokens yield `None` rather than an error; the ordering is
    /// then rendered without a direction qualifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use exercise_tracker_core::SortDirection;
    ///
    /// assert_eq!(SortDirection::from_token("DESC"), Some(SortDirection::Desc));
    /// assert_eq!(SortDirection::from_token("asc"), Some(SortDirection::Asc));
    /// assert_eq!(SortDirection::from_token("sideways"), None);
    /// ```
    pub fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("ASC") {
            Some(SortDirection::Asc)
        } else if token.eq_ignore_ascii_case("DESC") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Ordering applied to a select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Column to sort on. Must exist on the target table.
    pub column: String,
    /// Direction, or `None` to use the store default.
    pub direction: Option<SortDirection>,
}

impl OrderBy {
    pub fn new(column: impl Into<String>, direction: Option<SortDirection>) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, Some(SortDirection::Asc))
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, Some(SortDirection::Desc))
    }
}

/// Optional ordering and row limit for a select.
///
/// # Examples
///
/// ```
/// use exercise_tracker_core::{QueryOptions, SortDirection};
///
/// let options = QueryOptions::new()
///     .order_by("date", Some(SortDirection::Desc))
///     .with_limit(1);
/// assert_eq!(options.effective_limit(), Some(1));
///
/// // A zero limit means unbounded.
/// assert_eq!(QueryOptions::new().with_limit(0).effective_limit(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Ordering, if any.
    #[serde(default)]
    pub order: Option<OrderBy>,
    /// Maximum number of rows; `None` or `0` means unbounded.
    #[serde(default)]
    pub limit: Option<u64>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Option<SortDirection>) -> Self {
        self.order = Some(OrderBy::new(column, direction));
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the limit only when it is positive.
    pub fn effective_limit(&self) -> Option<u64> {
        self.limit.filter(|&limit| limit > 0)
    }

    /// Returns the sort column, if ordering was requested.
    pub fn sort_column(&self) -> Option<&str> {
        self.order.as_ref().map(|o| o.column.as_str())
    }
}

/// Inclusive date bounds applied to one date column.
///
/// Either bound may be omitted for an open range; omitting both disables the
/// range entirely. Bounds are compared as text, so they should use the same
/// `YYYY-MM-DD` form as the stored dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Column the bounds apply to.
    pub column: String,
    /// Inclusive lower bound.
    pub from: Option<String>,
    /// Inclusive upper bound.
    pub to: Option<String>,
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            column: DEFAULT_DATE_COLUMN.to_string(),
            from: None,
            to: None,
        }
    }
}

impl DateRange {
    /// Creates a range over the default `date` column.
    pub fn new(from: Option<impl Into<String>>, to: Option<impl Into<String>>) -> Self {
        Self {
            column: DEFAULT_DATE_COLUMN.to_string(),
            from: from.map(Into::into),
            to: to.map(Into::into),
        }
    }

    /// Retargets the range at a different column.
    pub fn on_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Returns `true` when neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_classes() {
        assert_eq!(Value::Integer(1).type_class(), Some(TypeClass::Numeric));
        assert_eq!(Value::Real(1.5).type_class(), Some(TypeClass::Numeric));
        assert_eq!(Value::from("x").type_class(), Some(TypeClass::Text));
        assert_eq!(Value::Blob(vec![1]).type_class(), Some(TypeClass::Binary));
        assert_eq!(Value::Null.type_class(), None);
    }

    #[test]
    fn test_value_emptiness() {
        assert!(Value::Null.is_empty());
        assert!(Value::from("").is_empty());
        assert!(!Value::from(" ").is_empty());
        assert!(!Value::Integer(0).is_empty());
    }

    #[test]
    fn test_value_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }

    #[test]
    fn test_value_json_untagged() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, 3, 2.5, "x"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Integer(3),
                Value::Real(2.5),
                Value::Text("x".into())
            ]
        );
    }

    #[test]
    fn test_record_replace_keeps_position() {
        let mut record = Record::new().with("a", 1).with("b", 2);
        let previous = record.insert("a", 10);
        assert_eq!(previous, Some(Value::Integer(1)));
        assert_eq!(record.columns().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(record.get("a"), Some(&Value::Integer(10)));
    }

    #[test]
    fn test_record_remove() {
        let mut record = Record::new().with("a", 1).with("b", 2).with("c", 3);
        assert_eq!(record.remove("b"), Some(Value::Integer(2)));
        assert_eq!(record.remove("missing"), None);
        assert_eq!(record.columns().collect::<Vec<_>>(), ["a", "c"]);
    }

    #[test]
    fn test_record_serializes_in_column_order() {
        let record = Record::new().with("name", "Alice").with("id", 7);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"name":"Alice","id":7}"#);
    }

    #[test]
    fn test_record_deserializes_in_document_order() {
        let record: Record = serde_json::from_str(r#"{"z": 1, "a": "x", "m": null}"#).unwrap();
        assert_eq!(record.columns().collect::<Vec<_>>(), ["z", "a", "m"]);
        assert_eq!(record.get("m"), Some(&Value::Null));
    }

    #[test]
    fn test_table_schema_lookup() {
        let table = TableSchema::new(
            "Users",
            vec![
                ColumnInfo::new("id", "INTEGER"),
                ColumnInfo::new("name", "VARCHAR(255)"),
            ],
        );
        assert!(table.has_column("name"));
        assert!(!table.has_column("Name"));
        assert_eq!(table.column("id").unwrap().declared_type, "INTEGER");
    }

    #[test]
    fn test_date_range_defaults() {
        let range = DateRange::default();
        assert_eq!(range.column, "date");
        assert!(range.is_unbounded());

        let range = DateRange::new(Some("2024-01-01"), None::<String>).on_column("day");
        assert_eq!(range.column, "day");
        assert!(!range.is_unbounded());
    }
}
