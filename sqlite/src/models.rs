//! Typed users and exercises built on the generic CRUD operations.
//!
//! These functions are the callers the data-access layer was written for:
//! they pass table names and untyped records down to [`Store`] and map the
//! returned rows onto [`User`] and [`Exercise`].

use chrono::NaiveDate;
use exercise_tracker_core::{DateRange, QueryOptions, Record, SortDirection, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::connection::Store;
use crate::error::{OperationResult, StoreError};
use crate::query::TableQuery;
use crate::schema::{EXERCISES_TABLE, USERS_TABLE};

/// Format of stored exercise dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub description: String,
    /// Duration in minutes.
    pub duration: i64,
    pub date: NaiveDate,
}

/// An exercise to be logged. A missing date defaults to today in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExercise {
    pub user_id: i64,
    pub description: String,
    pub duration: i64,
    pub date: Option<NaiveDate>,
}

/// A freshly logged exercise together with the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedExercise {
    pub user: User,
    pub exercise: Exercise,
}

/// Date bounds and limit for an exercise log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<u64>,
}

/// A user's exercises in date order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseLog {
    pub user: User,
    pub exercises: Vec<Exercise>,
    /// Number of exercises returned.
    pub count: usize,
    /// Number of exercises matching the date bounds before the limit.
    pub total: u64,
}

impl TryFrom<Record> for User {
    type Error = StoreError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        Ok(Self {
            id: int_field(&record, "id")?,
            name: text_field(&record, "name")?,
        })
    }
}

impl TryFrom<Record> for Exercise {
    type Error = StoreError;

    fn try_from(record: Record) -> Result<Self, Self::Error> {
        let date = text_field(&record, "date")?;
        let date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|e| StoreError::Conversion(format!("invalid date '{date}': {e}")))?;
        Ok(Self {
            id: int_field(&record, "id")?,
            user_id: int_field(&record, "userId")?,
            description: text_field(&record, "description")?,
            duration: int_field(&record, "duration")?,
            date,
        })
    }
}

fn int_field(record: &Record, column: &str) -> OperationResult<i64> {
    record
        .get(column)
        .and_then(Value::as_i64)
        .ok_or_else(|| StoreError::Conversion(format!("missing integer column: {column}")))
}

fn text_field(record: &Record, column: &str) -> OperationResult<String> {
    record
        .get(column)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| StoreError::Conversion(format!("missing text column: {column}")))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Adds a user and returns the stored row.
///
/// The insert and the read-back run in separate connection scopes, so a
/// concurrent delete in between is reported as [`StoreError::NotFound`].
///
/// # Errors
///
/// Returns [`StoreError::AlreadyExists`] if the name is taken.
pub fn add_user(store: &Store, name: &str) -> OperationResult<User> {
    let id = store
        .insert_record(USERS_TABLE, &Record::new().with("name", name))
        .map_err(|err| {
            if err.is_unique_violation() {
                StoreError::AlreadyExists(format!("can't add user with name: \"{name}\""))
            } else {
                err
            }
        })?;
    debug!(id, name, "user added");

    get_user(store, id)?.ok_or_else(|| StoreError::NotFound(format!("user with id = {id}")))
}

/// Looks up a user by id.
pub fn get_user(store: &Store, id: i64) -> OperationResult<Option<User>> {
    store
        .get_one(USERS_TABLE, &Record::new().with("id", id))?
        .map(User::try_from)
        .transpose()
}

/// Logs an exercise for an existing user.
///
/// The user check, the insert, and the read-back share one transaction.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] if the user does not exist.
pub fn add_exercise(store: &Store, new: &NewExercise) -> OperationResult<LoggedExercise> {
    let mut record = Record::new()
        .with("userId", new.user_id)
        .with("description", new.description.as_str())
        .with("duration", new.duration);
    if let Some(date) = new.date {
        record.insert("date", format_date(date));
    }

    store.with_transaction(|conn| {
        let query = TableQuery::new(conn);

        let user_id = new.user_id;
        let user = query
            .get_one(USERS_TABLE, &Record::new().with("id", user_id))?
            .ok_or_else(|| StoreError::NotFound(format!("there is no user with id = {user_id}")))
            .and_then(User::try_from)?;

        let id = query.insert_record(EXERCISES_TABLE, &record)?;
        let exercise = query
            .get_one(EXERCISES_TABLE, &Record::new().with("id", id))?
            .ok_or_else(|| StoreError::NotFound(format!("exercise with id = {id}")))
            .and_then(Exercise::try_from)?;

        debug!(user_id = user.id, exercise_id = exercise.id, "exercise logged");
        Ok(LoggedExercise { user, exercise })
    })
}

/// Returns a user's exercises within the filter's bounds, oldest first.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] if the user does not exist.
pub fn exercise_log(
    store: &Store,
    user_id: i64,
    filter: &LogFilter,
) -> OperationResult<ExerciseLog> {
    let user = get_user(store, user_id)?
        .ok_or_else(|| StoreError::NotFound(format!("there is no user with id = {user_id}")))?;

    let range = DateRange::new(filter.from.map(format_date), filter.to.map(format_date));
    let mut options = QueryOptions::new().order_by("date", Some(SortDirection::Asc));
    if let Some(limit) = filter.limit {
        options = options.with_limit(limit);
    }

    let ranged = store.get_all_matching_with_date_range(
        EXERCISES_TABLE,
        &Record::new().with("userId", user_id),
        &range,
        &options,
    )?;
    let exercises = ranged
        .rows
        .into_iter()
        .map(Exercise::try_from)
        .collect::<OperationResult<Vec<_>>>()?;

    Ok(ExerciseLog {
        user,
        count: exercises.len(),
        total: ranged.total,
        exercises,
    })
}

/// Returns every logged exercise in insertion order.
pub fn all_exercises(store: &Store) -> OperationResult<Vec<Exercise>> {
    let options = QueryOptions::new().order_by("id", Some(SortDirection::Asc));
    store
        .get_all(EXERCISES_TABLE, &options)?
        .into_iter()
        .map(Exercise::try_from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_record() {
        let record = Record::new().with("id", 3).with("name", "Alice");
        assert_eq!(
            User::try_from(record).unwrap(),
            User {
                id: 3,
                name: "Alice".to_string()
            }
        );
    }

    #[test]
    fn test_user_from_incomplete_record() {
        let record = Record::new().with("id", 3);
        assert!(matches!(User::try_from(record), Err(StoreError::Conversion(_))));
    }

    #[test]
    fn test_exercise_rejects_bad_date() {
        let record = Record::new()
            .with("id", 1)
            .with("userId", 1)
            .with("description", "run")
            .with("duration", 10)
            .with("date", "yesterday");
        assert!(matches!(Exercise::try_from(record), Err(StoreError::Conversion(_))));
    }

    #[test]
    fn test_exercise_serializes_user_id_in_camel_case() {
        let exercise = Exercise {
            id: 1,
            user_id: 2,
            description: "run".to_string(),
            duration: 30,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let json = serde_json::to_value(&exercise).unwrap();
        assert_eq!(json["userId"], 2);
        assert_eq!(json["date"], "2024-01-01");
    }
}
