//! staff-desk command line
//!
//! ```bash
//! staff-desk init
//! staff-desk signup --first-name Ada --last-name Lovelace --username ada_l --email ada@x.com
//! staff-desk login --username ada_l
//! staff-desk list
//! staff-desk add --first-name Grace --last-name Hopper --username ghopper \
//!     --email grace@navy.mil --password cobol1959 --department IT --rating 4.5
//! staff-desk delete --id 2
//! staff-desk logout
//! ```

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use shared::error::ErrorCode;
use shared::models::Person;
use staff_desk::controllers::{Feedback, LoginController, SignUpController, TableController};
use staff_desk::validation::{DEPARTMENTS, RecordForm, SignUpForm};
use staff_desk::{AppState, Config, logger};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "staff-desk")]
#[command(about = "Employee Manager Pro: employee records from the command line", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON config file (defaults to $STAFF_DESK_CONFIG, then ./staff-desk.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database and table if needed
    Init,

    /// Create an account
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "STAFF_DESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log in and remember the credentials
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "STAFF_DESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the session and forget remembered credentials
    Logout,

    /// Show the current session
    Whoami,

    /// List every record
    List,

    /// Add a record
    Add {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_parser = PossibleValuesParser::new(DEPARTMENTS))]
        department: Option<String>,
        /// Performance rating, e.g. 4.5
        #[arg(long, allow_hyphen_values = true)]
        rating: String,
        #[arg(long)]
        image_url: Option<String>,
    },

    /// Delete a record by id
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return Ok(report(&Feedback::error(e.code(), e.to_string()))),
    };
    let _log_guard = logger::init_logger(config.log_dir.as_deref(), &config.log_level);
    tracing::debug!(?config, "Configuration loaded");

    let state = AppState::new(config);
    let code = run(cli.command, &state).await;
    state.db.close().await;
    Ok(code)
}

async fn run(command: Command, state: &Arc<AppState>) -> ExitCode {
    let login = LoginController::new(state.clone());

    let feedback = match command {
        Command::Init => {
            println!("Welcome to Employee Manager Pro!");
            match state.db.ensure_schema().await {
                Ok(true) => Feedback::info("Database ready; users are registered."),
                Ok(false) => Feedback::info("Database ready; no users yet. Sign up to begin."),
                Err(e) => Feedback::error(e.code(), format!("Error initializing database: {e}")),
            }
        }
        Command::Signup {
            first_name,
            last_name,
            username,
            email,
            password,
        } => {
            let form = SignUpForm {
                first_name,
                last_name,
                username,
                email,
                password,
            };
            SignUpController::new(state.clone()).sign_up(&form).await
        }
        Command::Login { username, password } => login.login(&username, &password).await,
        Command::Logout => {
            // Sessions live per process; pick up the remembered one first
            let _ = login.resume().await;
            login.logout()
        }
        Command::Whoami => match login.resume().await {
            Some(session) => Feedback::info(format!(
                "{session} since {}",
                session
                    .logged_in_at()
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
            )),
            None => Feedback::info("Not logged in."),
        },
        Command::List => {
            if login.resume().await.is_none() {
                return please_log_in();
            }
            match TableController::new(state.clone()).records().await {
                Ok(people) => {
                    print_table(&people);
                    return ExitCode::SUCCESS;
                }
                Err(feedback) => feedback,
            }
        }
        Command::Add {
            first_name,
            last_name,
            username,
            email,
            password,
            department,
            rating,
            image_url,
        } => {
            if login.resume().await.is_none() {
                return please_log_in();
            }
            let form = RecordForm {
                first_name,
                last_name,
                username,
                email,
                password,
                department,
                performance_rating: rating,
                image_url,
            };
            TableController::new(state.clone()).add_record(form).await
        }
        Command::Delete { id } => {
            if login.resume().await.is_none() {
                return please_log_in();
            }
            let table = TableController::new(state.clone());
            match table.records().await {
                Ok(people) => {
                    let selected = people.iter().find(|p| p.id == Some(id));
                    table.delete_record(selected).await
                }
                Err(feedback) => feedback,
            }
        }
    };

    report(&feedback)
}

fn report(feedback: &Feedback) -> ExitCode {
    if feedback.is_error() {
        tracing::debug!(code = %feedback.code, category = feedback.code.category().name(), "Command failed");
        eprintln!("{feedback}");
    } else {
        println!("{feedback}");
    }
    ExitCode::from(feedback.exit_status())
}

fn please_log_in() -> ExitCode {
    report(&Feedback::error(ErrorCode::NotAuthenticated, "Please log in first."))
}

fn print_table(people: &[Person]) {
    println!(
        "{:>4}  {:<15} {:<15} {:<15} {:<12} {:>6}  {}",
        "ID", "First Name", "Last Name", "Username", "Department", "Rating", "Email"
    );
    for person in people {
        println!(
            "{:>4}  {:<15} {:<15} {:<15} {:<12} {:>6}  {}",
            person.id.map(|id| id.to_string()).unwrap_or_default(),
            person.first_name,
            person.last_name,
            person.username,
            person.department.as_deref().unwrap_or("-"),
            person
                .performance_rating
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string()),
            person.email,
        );
    }
    println!("{} record(s)", people.len());
}
