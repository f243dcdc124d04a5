//! SQL fragment rendering for selects and inserts.
//!
//! Every function here is a pure function of its structured input and never
//! consults the store. Values are never written into the SQL text: each one
//! becomes a `?` placeholder with the value appended to [`Fragment::params`]
//! in placeholder order. Table and column names are double-quoted, and are
//! expected to have been checked against the live schema beforehand.
//!
//! # Example
//!
//! ```
//! use exercise_tracker_core::*;
//!
//! let predicate = Record::new().with("userId", 3);
//! let range = DateRange::new(Some("2024-01-15"), Some("2024-02-15"));
//! let options = QueryOptions::new()
//!     .order_by("date", Some(SortDirection::Desc))
//!     .with_limit(10);
//!
//! let stmt = select_statement("Exercises", &predicate, Some(&range), &options, false);
//! assert_eq!(
//!     stmt.sql,
//!     r#"SELECT * FROM "Exercises" WHERE "userId" = ? AND "date" BETWEEN ? AND ? ORDER BY "date" DESC LIMIT ?"#
//! );
//! assert_eq!(stmt.params.len(), 4);
//! ```

use crate::{DateRange, QueryOptions, Record, Value};

/// Alias of the window column added by [`select_statement`] when a total row
/// count is requested.
pub const TOTAL_ROWS_COLUMN: &str = "__total_rows";

/// A piece of SQL text plus the values bound to its placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// SQL text containing `?` placeholders.
    pub sql: String,
    /// Bound values, one per placeholder, in order.
    pub params: Vec<Value>,
}

impl Fragment {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Appends another fragment's text and parameters.
    pub fn push(&mut self, other: Fragment) {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
    }

    /// Appends literal SQL text with no parameters.
    pub fn push_sql(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Appends a `?` placeholder bound to `value`.
    pub fn push_param(&mut self, value: impl Into<Value>) {
        self.sql.push('?');
        self.params.push(value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Quotes an identifier, doubling any embedded double quotes.
///
/// ```
/// use exercise_tracker_core::quote_ident;
///
/// assert_eq!(quote_ident("userId"), r#""userId""#);
/// assert_eq!(quote_ident(r#"a"b"#), r#""a""b""#);
/// ```
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Renders a conjunctive equality filter over the predicate's columns.
///
/// An empty predicate renders nothing and so matches every row. A `NULL`
/// value renders `IS NULL`, since `= NULL` never matches.
pub fn predicate_clause(predicate: &Record) -> Fragment {
    let mut fragment = Fragment::default();
    for (index, (column, value)) in predicate.iter().enumerate() {
        fragment.push_sql(if index == 0 { " WHERE " } else { " AND " });
        fragment.push_sql(&quote_ident(column));
        if value.is_null() {
            fragment.push_sql(" IS NULL");
        } else {
            fragment.push_sql(" = ");
            fragment.push_param(value.clone());
        }
    }
    fragment
}

/// Renders an inclusive date-range filter.
///
/// `first` selects the leading keyword: ` WHERE` when no filter precedes this
/// one, ` AND` when it follows a predicate clause. Both bounds give a
/// `BETWEEN`, one bound gives `>=` or `<=`, and no bounds give nothing.
pub fn date_range_clause(range: &DateRange, first: bool) -> Fragment {
    let mut condition = Fragment::default();
    match (&range.from, &range.to) {
        (Some(from), Some(to)) => {
            condition.push_sql(" BETWEEN ");
            condition.push_param(from.as_str());
            condition.push_sql(" AND ");
            condition.push_param(to.as_str());
        }
        (Some(from), None) => {
            condition.push_sql(" >= ");
            condition.push_param(from.as_str());
        }
        (None, Some(to)) => {
            condition.push_sql(" <= ");
            condition.push_param(to.as_str());
        }
        (None, None) => return condition,
    }

    let mut fragment = Fragment::new(if first { " WHERE " } else { " AND " });
    fragment.push_sql(&quote_ident(&range.column));
    fragment.push(condition);
    fragment
}

/// Renders `ORDER BY` and `LIMIT`.
///
/// The direction qualifier is omitted when none was recognized. The limit is
/// rendered only when positive.
pub fn options_clause(options: &QueryOptions) -> Fragment {
    let mut fragment = Fragment::default();

    if let Some(order) = &options.order {
        fragment.push_sql(" ORDER BY ");
        fragment.push_sql(&quote_ident(&order.column));
        if let Some(direction) = order.direction {
            fragment.push_sql(" ");
            fragment.push_sql(direction.as_sql());
        }
    }

    if let Some(limit) = options.effective_limit() {
        fragment.push_sql(" LIMIT ");
        // SQLite limits are signed; anything larger is unbounded in practice.
        fragment.push_param(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    fragment
}

/// Composes a full `SELECT * FROM table` with optional filters and options.
///
/// When `with_total` is set, each row also carries a
/// [`TOTAL_ROWS_COLUMN`] holding the number of matching rows before `LIMIT`
/// is applied.
pub fn select_statement(
    table: &str,
    predicate: &Record,
    range: Option<&DateRange>,
    options: &QueryOptions,
    with_total: bool,
) -> Fragment {
    let mut stmt = Fragment::new("SELECT *");
    if with_total {
        stmt.push_sql(", COUNT(*) OVER () AS ");
        stmt.push_sql(&quote_ident(TOTAL_ROWS_COLUMN));
    }
    stmt.push_sql(" FROM ");
    stmt.push_sql(&quote_ident(table));

    stmt.push(predicate_clause(predicate));
    if let Some(range) = range {
        stmt.push(date_range_clause(range, predicate.is_empty()));
    }
    stmt.push(options_clause(options));
    stmt
}

/// Composes an `INSERT` of `record` into `table`.
///
/// An empty record inserts a row of column defaults.
pub fn insert_statement(table: &str, record: &Record) -> Fragment {
    let mut stmt = Fragment::new("INSERT INTO ");
    stmt.push_sql(&quote_ident(table));

    if record.is_empty() {
        stmt.push_sql(" DEFAULT VALUES");
        return stmt;
    }

    let columns: Vec<String> = record.columns().map(quote_ident).collect();
    stmt.push_sql(" (");
    stmt.push_sql(&columns.join(", "));
    stmt.push_sql(") VALUES (");
    for (index, value) in record.values().enumerate() {
        if index > 0 {
            stmt.push_sql(", ");
        }
        stmt.push_param(value.clone());
    }
    stmt.push_sql(")");
    stmt
}
