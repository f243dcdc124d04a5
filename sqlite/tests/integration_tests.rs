//! Integration tests for the exercise-tracker-sqlite crate.

use chrono::NaiveDate;
use exercise_tracker_core::{
    DateRange, QueryOptions, Record, SortDirection, ValidationError, Value, validate_fields,
};
use exercise_tracker_sqlite::{
    FaultKind, LogFilter, NewExercise, Store, StoreConfig, StoreError, add_exercise, add_user,
    all_exercises, describe_table, exercise_log, get_user,
};

/// Creates an initialized store in a fresh temporary directory.
///
/// The directory guard must outlive the store.
fn setup_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path().join("storage.db"));
    store.init().unwrap();
    (dir, store)
}

/// Inserts a user and returns its id.
fn insert_user(store: &Store, name: &str) -> i64 {
    store
        .insert_record("Users", &Record::new().with("name", name))
        .unwrap()
}

/// Inserts an exercise with an explicit date and returns its id.
fn insert_exercise(store: &Store, user_id: i64, description: &str, date: &str) -> i64 {
    let record = Record::new()
        .with("userId", user_id)
        .with("description", description)
        .with("duration", 30)
        .with("date", date);
    store.insert_record("Exercises", &record).unwrap()
}

/// A user with exercises on the first of January, February, and March 2024.
fn seeded_store() -> (tempfile::TempDir, Store, i64) {
    let (dir, store) = setup_store();
    let user = insert_user(&store, "Alice");
    insert_exercise(&store, user, "january", "2024-01-01");
    insert_exercise(&store, user, "february", "2024-02-01");
    insert_exercise(&store, user, "march", "2024-03-01");
    (dir, store, user)
}

fn dates(rows: &[Record]) -> Vec<&str> {
    rows.iter()
        .map(|row| row.get("date").and_then(Value::as_str).unwrap())
        .collect()
}

fn count_rows(store: &Store, table: &str) -> usize {
    store.get_all(table, &QueryOptions::new()).unwrap().len()
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_subset_of_columns_validates() {
    let (_dir, store) = setup_store();
    let schema = store
        .with_connection(|conn| describe_table(conn, "Exercises"))
        .unwrap();

    let record = Record::new()
        .with("description", "run")
        .with("duration", 45);
    validate_fields(&schema, &record).unwrap();

    let empty_date = Record::new().with("duration", 45).with("date", "");
    validate_fields(&schema, &empty_date).unwrap();
}

#[test]
fn test_unknown_column_executes_nothing() {
    let (_dir, store) = setup_store();

    let record = Record::new().with("name", "Alice").with("email", "a@example.com");
    let err = store.insert_record("Users", &record).unwrap_err();

    match err {
        StoreError::Validation(ValidationError::UnknownColumn { column, table }) => {
            assert_eq!(column, "email");
            assert_eq!(table, "Users");
        }
        other => panic!("expected UnknownColumn, got {other:?}"),
    }
    assert_eq!(count_rows(&store, "Users"), 0);
}

#[test]
fn test_unknown_predicate_column_is_rejected() {
    let (_dir, store) = setup_store();
    let err = store
        .get_one("Users", &Record::new().with("nickname", "Al"))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::UnknownColumn { .. })
    ));
}

#[test]
fn test_type_mismatch() {
    let (_dir, store) = setup_store();

    let err = store
        .insert_record("Users", &Record::new().with("name", 42))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::TypeMismatch { ref column, .. }) if column == "name"
    ));

    let user = insert_user(&store, "Alice");
    let record = Record::new()
        .with("userId", user)
        .with("description", "run")
        .with("duration", "long");
    let err = store.insert_record("Exercises", &record).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::TypeMismatch { ref column, .. })
            if column == "duration"
    ));
    assert_eq!(count_rows(&store, "Exercises"), 0);
}

#[test]
fn test_first_invalid_column_wins() {
    let (_dir, store) = setup_store();
    let record = Record::new()
        .with("userId", "one")
        .with("description", "run")
        .with("duration", 10);
    let err = store.insert_record("Exercises", &record).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::TypeMismatch { ref column, .. })
            if column == "userId"
    ));
}

#[test]
fn test_missing_table() {
    let (_dir, store) = setup_store();
    let err = store.get_all("Workouts", &QueryOptions::new()).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::NoSuchTable(ref t)) if t == "Workouts"
    ));
    assert_eq!(err.to_string(), "validation failed: no such table: Workouts");
}

// =============================================================================
// Round trip
// =============================================================================

#[test]
fn test_insert_then_get_one() {
    let (_dir, store) = setup_store();

    let id = insert_user(&store, "Alice");
    let row = store
        .get_one("Users", &Record::new().with("id", id))
        .unwrap()
        .expect("inserted row should be readable");

    assert_eq!(row.get("id"), Some(&Value::Integer(id)));
    assert_eq!(row.get("name"), Some(&Value::from("Alice")));
    assert_eq!(row.columns().collect::<Vec<_>>(), ["id", "name"]);
}

#[test]
fn test_get_one_no_match_is_empty_success() {
    let (_dir, store) = setup_store();
    assert_eq!(store.get_one("Users", &Record::new().with("id", 7)).unwrap(), None);
}

#[test]
fn test_default_date_is_filled_by_store() {
    let (_dir, store) = setup_store();
    let user = insert_user(&store, "Alice");
    let id = store
        .insert_record(
            "Exercises",
            &Record::new()
                .with("userId", user)
                .with("description", "walk")
                .with("duration", 20),
        )
        .unwrap();

    let row = store
        .get_one("Exercises", &Record::new().with("id", id))
        .unwrap()
        .unwrap();
    let date = row.get("date").and_then(Value::as_str).unwrap();
    assert!(NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok());
}

// =============================================================================
// Date ranges, ordering, and limits
// =============================================================================

#[test]
fn test_date_range_both_bounds() {
    let (_dir, store, user) = seeded_store();
    let range = DateRange::new(Some("2024-01-15"), Some("2024-02-15"));
    let result = store
        .get_all_matching_with_date_range(
            "Exercises",
            &Record::new().with("userId", user),
            &range,
            &QueryOptions::new(),
        )
        .unwrap();

    assert_eq!(dates(&result.rows), ["2024-02-01"]);
    assert_eq!(result.total, 1);
}

#[test]
fn test_date_range_lower_bound_only() {
    let (_dir, store, user) = seeded_store();
    let range = DateRange::new(Some("2024-01-15"), None::<String>);
    let options = QueryOptions::new().order_by("date", Some(SortDirection::Asc));
    let result = store
        .get_all_matching_with_date_range(
            "Exercises",
            &Record::new().with("userId", user),
            &range,
            &options,
        )
        .unwrap();

    assert_eq!(dates(&result.rows), ["2024-02-01", "2024-03-01"]);
}

#[test]
fn test_date_range_upper_bound_only() {
    let (_dir, store, user) = seeded_store();
    let range = DateRange::new(None::<String>, Some("2024-02-01"));
    let options = QueryOptions::new().order_by("date", Some(SortDirection::Asc));
    let result = store
        .get_all_matching_with_date_range(
            "Exercises",
            &Record::new().with("userId", user),
            &range,
            &options,
        )
        .unwrap();

    assert_eq!(dates(&result.rows), ["2024-01-01", "2024-02-01"]);
}

#[test]
fn test_date_range_unbounded_returns_all() {
    let (_dir, store, user) = seeded_store();
    let options = QueryOptions::new().order_by("date", Some(SortDirection::Asc));
    let result = store
        .get_all_matching_with_date_range(
            "Exercises",
            &Record::new().with("userId", user),
            &DateRange::default(),
            &options,
        )
        .unwrap();

    assert_eq!(dates(&result.rows), ["2024-01-01", "2024-02-01", "2024-03-01"]);
    assert_eq!(result.total, 3);
}

#[test]
fn test_date_range_scoped_to_predicate() {
    let (_dir, store, alice) = seeded_store();
    let bob = insert_user(&store, "Bob");
    insert_exercise(&store, bob, "bob's run", "2024-02-10");

    let range = DateRange::new(Some("2024-01-15"), Some("2024-02-15"));
    let result = store
        .get_all_matching_with_date_range(
            "Exercises",
            &Record::new().with("userId", alice),
            &range,
            &QueryOptions::new(),
        )
        .unwrap();

    assert_eq!(dates(&result.rows), ["2024-02-01"]);
}

#[test]
fn test_limit_one_descending_returns_latest() {
    let (_dir, store, user) = seeded_store();
    let options = QueryOptions::new()
        .order_by("date", Some(SortDirection::Desc))
        .with_limit(1);

    let rows = store
        .get_all_matching("Exercises", &Record::new().with("userId", user), &options)
        .unwrap();
    assert_eq!(dates(&rows), ["2024-03-01"]);

    let ranged = store
        .get_all_matching_with_date_range(
            "Exercises",
            &Record::new().with("userId", user),
            &DateRange::default(),
            &options,
        )
        .unwrap();
    assert_eq!(dates(&ranged.rows), ["2024-03-01"]);
    assert_eq!(ranged.total, 3);
}

#[test]
fn test_zero_limit_means_unlimited() {
    let (_dir, store, _user) = seeded_store();
    let options = QueryOptions::new().with_limit(0);
    assert_eq!(store.get_all("Exercises", &options).unwrap().len(), 3);
}

#[test]
fn test_get_all_is_stable() {
    let (_dir, store, _user) = seeded_store();
    let options = QueryOptions::new().order_by("description", Some(SortDirection::Desc));

    let first = store.get_all("Exercises", &options).unwrap();
    let second = store.get_all("Exercises", &options).unwrap();
    assert_eq!(first, second);

    let unordered_first = store.get_all("Exercises", &QueryOptions::new()).unwrap();
    let unordered_second = store.get_all("Exercises", &QueryOptions::new()).unwrap();
    assert_eq!(unordered_first, unordered_second);
}

// =============================================================================
// Faults
// =============================================================================

#[test]
fn test_duplicate_is_unique_violation() {
    let (_dir, store) = setup_store();
    insert_user(&store, "Alice");

    let err = store
        .insert_record("Users", &Record::new().with("name", "Alice"))
        .unwrap_err();
    assert!(err.is_unique_violation());
    assert_eq!(err.fault_kind(), Some(FaultKind::UniqueViolation));
    assert_eq!(count_rows(&store, "Users"), 1);
}

#[test]
fn test_not_null_is_generic_constraint() {
    let (_dir, store) = setup_store();
    let user = insert_user(&store, "Alice");
    let err = store
        .insert_record(
            "Exercises",
            &Record::new().with("userId", user).with("duration", 10),
        )
        .unwrap_err();
    assert!(!err.is_unique_violation());
    assert_eq!(err.fault_kind(), Some(FaultKind::Constraint));
}

#[test]
fn test_hostile_values_are_bound() {
    let (_dir, store) = setup_store();
    let hostile = "Robert'); DROP TABLE Users; --";
    let id = insert_user(&store, hostile);

    let row = store
        .get_one("Users", &Record::new().with("name", hostile))
        .unwrap()
        .unwrap();
    assert_eq!(row.get("id"), Some(&Value::Integer(id)));
    assert_eq!(count_rows(&store, "Users"), 1);
}

// =============================================================================
// Configuration and concurrency
// =============================================================================

#[test]
fn test_custom_init_script() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("init.sql");
    std::fs::write(
        &script,
        "CREATE TABLE IF NOT EXISTS Notes (id INTEGER PRIMARY KEY, body TEXT);",
    )
    .unwrap();

    let mut config = StoreConfig::new(dir.path().join("notes.db"));
    config.init_script = Some(script);
    let store = Store::open(config);
    store.init().unwrap();

    let id = store
        .insert_record("Notes", &Record::new().with("body", "hello"))
        .unwrap();
    assert_eq!(id, 1);
    assert!(store.get_all("Users", &QueryOptions::new()).is_err());
}

#[test]
fn test_concurrent_operations_use_independent_connections() {
    let (_dir, store) = setup_store();

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let store = store.clone();
            scope.spawn(move || {
                for n in 0..10 {
                    let name = format!("user-{worker}-{n}");
                    let id = insert_user(&store, &name);
                    let row = store
                        .get_one("Users", &Record::new().with("id", id))
                        .unwrap()
                        .unwrap();
                    assert_eq!(row.get("name"), Some(&Value::from(name.as_str())));
                }
            });
        }
    });

    assert_eq!(count_rows(&store, "Users"), 40);
}

#[test]
fn test_concurrent_exercise_logging() {
    let (_dir, store) = setup_store();
    let user_id = add_user(&store, "Alice").unwrap().id;

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let store = store.clone();
            scope.spawn(move || {
                for n in 0..25 {
                    let new = NewExercise {
                        user_id,
                        description: format!("set-{worker}-{n}"),
                        duration: 10,
                        date: None,
                    };
                    if let Err(err) = add_exercise(&store, &new) {
                        panic!("worker {worker} exercise {n} failed: {err}");
                    }
                }
            });
        }
    });

    assert_eq!(all_exercises(&store).unwrap().len(), 200);
}

// =============================================================================
// Users and exercises
// =============================================================================

#[test]
fn test_add_user_and_duplicate() {
    let (_dir, store) = setup_store();

    let alice = add_user(&store, "Alice").unwrap();
    assert_eq!(alice.name, "Alice");
    assert_eq!(get_user(&store, alice.id).unwrap(), Some(alice));

    let err = add_user(&store, "Alice").unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
}

#[test]
fn test_add_user_vanished_before_read_back() {
    let (_dir, store) = setup_store();
    store
        .with_connection(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER vanish_users AFTER INSERT ON Users
                 BEGIN DELETE FROM Users WHERE id = NEW.id; END;",
            )?;
            Ok(())
        })
        .unwrap();

    let err = add_user(&store, "Ghost").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
}

#[test]
fn test_add_exercise_requires_user() {
    let (_dir, store) = setup_store();
    let err = add_exercise(
        &store,
        &NewExercise {
            user_id: 99,
            description: "run".into(),
            duration: 10,
            date: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(all_exercises(&store).unwrap().is_empty());
}

#[test]
fn test_exercise_log_filters_and_counts() {
    let (_dir, store) = setup_store();
    let alice = add_user(&store, "Alice").unwrap();
    for (description, day) in [("run", 1), ("swim", 2), ("lift", 3), ("bike", 4)] {
        let logged = add_exercise(
            &store,
            &NewExercise {
                user_id: alice.id,
                description: description.into(),
                duration: 30,
                date: NaiveDate::from_ymd_opt(2024, 5, day),
            },
        )
        .unwrap();
        assert_eq!(logged.user, alice);
        assert_eq!(logged.exercise.description, description);
    }

    let filter = LogFilter {
        from: NaiveDate::from_ymd_opt(2024, 5, 2),
        to: None,
        limit: Some(2),
    };
    let log = exercise_log(&store, alice.id, &filter).unwrap();

    assert_eq!(log.user, alice);
    assert_eq!(log.count, 2);
    assert_eq!(log.total, 3);
    let descriptions: Vec<_> = log.exercises.iter().map(|e| e.description.as_str()).collect();
    assert_eq!(descriptions, ["swim", "lift"]);
}

#[test]
fn test_exercise_log_unknown_user() {
    let (_dir, store) = setup_store();
    let err = exercise_log(&store, 5, &LogFilter::default()).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}
