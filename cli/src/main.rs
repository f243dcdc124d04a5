use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use exercise_tracker_sqlite::{
    DATE_FORMAT, LogFilter, NewExercise, Store, StoreConfig, add_exercise, add_user, all_exercises,
    exercise_log, get_user,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATABASE: &str = "storage.db";

#[derive(Debug, Parser)]
#[command(name = "exercise-tracker")]
#[command(about = "Track users and their logged exercises in a SQLite database")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct StoreArgs {
    /// YAML store configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite database file (overrides the configured path).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the tables if they do not exist.
    Init,
    /// Drop all tables and recreate them empty.
    Reset,
    /// Add a user with a unique name.
    AddUser(AddUserArgs),
    /// Show a single user.
    User(UserArgs),
    /// Log an exercise for an existing user.
    AddExercise(AddExerciseArgs),
    /// Show a user's exercise log, oldest first.
    Log(LogArgs),
    /// List every logged exercise.
    Exercises,
}

#[derive(Debug, Args)]
struct AddUserArgs {
    /// Name of the new user.
    name: String,
}

#[derive(Debug, Args)]
struct UserArgs {
    /// Id of the user.
    id: i64,
}

#[derive(Debug, Args)]
struct AddExerciseArgs {
    /// Id of the user the exercise belongs to.
    #[arg(long)]
    user_id: i64,
    /// What was done.
    #[arg(long)]
    description: String,
    /// Duration in minutes.
    #[arg(long)]
    duration: i64,
    /// Date of the exercise (YYYY-MM-DD, default: today).
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
struct LogArgs {
    /// Id of the user.
    user_id: i64,
    /// Earliest date to include (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    from: Option<NaiveDate>,
    /// Latest date to include (YYYY-MM-DD).
    #[arg(long, value_parser = parse_date)]
    to: Option<NaiveDate>,
    /// Maximum number of exercises to show.
    #[arg(long)]
    limit: Option<u64>,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = open_store(&cli.store).and_then(|store| match cli.command {
        Command::Init => run_init(&store),
        Command::Reset => run_reset(&store),
        Command::AddUser(args) => run_add_user(&store, args),
        Command::User(args) => run_user(&store, args),
        Command::AddExercise(args) => run_add_exercise(&store, args),
        Command::Log(args) => run_log(&store, args),
        Command::Exercises => run_exercises(&store),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| format!("invalid date '{raw}', expected YYYY-MM-DD: {e}"))
}

fn open_store(args: &StoreArgs) -> Result<Store, String> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => StoreConfig::new(DEFAULT_DATABASE),
    };
    if let Some(db) = &args.db {
        config.database = db.clone();
    }
    Ok(Store::open(config))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{json}");
    Ok(())
}

fn run_init(store: &Store) -> Result<(), String> {
    store
        .init()
        .map_err(|e| format!("Initialization failed: {e}"))?;
    println!(
        "Database initialized in '{}'.",
        store.config().database.display()
    );
    Ok(())
}

fn run_reset(store: &Store) -> Result<(), String> {
    store.reset().map_err(|e| format!("Reset failed: {e}"))?;
    println!(
        "Database reset in '{}' (tables dropped and recreated).",
        store.config().database.display()
    );
    Ok(())
}

fn run_add_user(store: &Store, args: AddUserArgs) -> Result<(), String> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err("User name cannot be empty".to_string());
    }
    let user = add_user(store, name).map_err(|e| format!("Failed to add user: {e}"))?;
    print_json(&user)
}

fn run_user(store: &Store, args: UserArgs) -> Result<(), String> {
    let user = get_user(store, args.id)
        .map_err(|e| format!("Failed to read user: {e}"))?
        .ok_or_else(|| format!("There is no user with id = {}", args.id))?;
    print_json(&user)
}

fn run_add_exercise(store: &Store, args: AddExerciseArgs) -> Result<(), String> {
    let description = args.description.trim();
    if description.is_empty() {
        return Err("--description cannot be empty".to_string());
    }
    if args.duration <= 0 {
        return Err("--duration must be a positive number of minutes".to_string());
    }

    let new = NewExercise {
        user_id: args.user_id,
        description: description.to_string(),
        duration: args.duration,
        date: args.date,
    };
    let logged = add_exercise(store, &new).map_err(|e| format!("Failed to add exercise: {e}"))?;
    print_json(&logged)
}

fn run_log(store: &Store, args: LogArgs) -> Result<(), String> {
    if let (Some(from), Some(to)) = (args.from, args.to) {
        if from > to {
            return Err("--from must not be later than --to".to_string());
        }
    }

    let filter = LogFilter {
        from: args.from,
        to: args.to,
        limit: args.limit,
    };
    let log = exercise_log(store, args.user_id, &filter)
        .map_err(|e| format!("Failed to read exercise log: {e}"))?;
    print_json(&log)
}

fn run_exercises(store: &Store) -> Result<(), String> {
    let exercises = all_exercises(store).map_err(|e| format!("Failed to list exercises: {e}"))?;
    print_json(&exercises)
}
