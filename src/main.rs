//! sql-tutor: a SQL tutoring server and command-line client.

mod cli;

use std::sync::Arc;

use cli::{Cli, Command, OutputFormat};
use serde::Serialize;
use sql_tutor::app::Tutor;
use sql_tutor::client::{Feedback, Session, SubmissionState, TutorClient};
use sql_tutor::config::Config;
use sql_tutor::content::ContentStore;
use sql_tutor::error::{Result, TutorError};
use sql_tutor::logging;
use sql_tutor::query::ResultSet;
use sql_tutor::render::DisplayTable;
use sql_tutor::server::{self, CheckAnswerRequest};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    match &cli.log_file {
        Some(path) => logging::init_file_logging(path),
        None => logging::init_stderr_logging(),
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::Serve {
            host,
            port,
            database_url,
        } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(url) = database_url {
                config.database.url = url;
            }

            let tutor = Arc::new(Tutor::from_config(&config).await?);
            server::serve(tutor, &config.server.bind_address()).await
        }
        Command::Try {
            sql,
            server,
            format,
        } => {
            let mut session = Session::new();
            let submission = session.begin();
            let outcome = match server {
                Some(url) => match TutorClient::new(&url)?.submit_try(&submission, &sql).await? {
                    Some(outcome) => outcome,
                    None => return Ok(()),
                },
                None => {
                    let tutor = Tutor::from_config(&config).await?;
                    let outcome = tutor.try_query(&sql).await;
                    tutor.shutdown().await?;
                    outcome
                }
            };
            session.complete_try(submission.id, &outcome);
            print_outcome(&session, &outcome, format)?;
            print_truncation(outcome.result.as_ref(), format);
            Ok(())
        }
        Command::Check {
            question_id,
            sql,
            level,
            server,
            format,
        } => {
            let mut session = Session::new();
            let submission = session.begin();
            let outcome = match server {
                Some(url) => {
                    let request = CheckAnswerRequest {
                        question_id,
                        answer: sql,
                        level_id: level,
                    };
                    match TutorClient::new(&url)?
                        .submit_check(&submission, &request)
                        .await?
                    {
                        Some(outcome) => outcome,
                        None => return Ok(()),
                    }
                }
                None => {
                    let tutor = Tutor::from_config(&config).await?;
                    let outcome = tutor.evaluate(question_id, level, &sql).await;
                    tutor.shutdown().await?;
                    outcome?
                }
            };
            session.complete_check(submission.id, &outcome);
            print_outcome(&session, &outcome, format)?;
            if outcome.correct {
                print_truncation(outcome.result.as_ref(), format);
            }
            let score = session.score();
            if format == OutputFormat::Text {
                println!(
                    "Score: {} (level {}, {:.0}%)",
                    score.score,
                    score.level,
                    score.progress_percent()
                );
            }
            Ok(())
        }
        Command::Levels { server } => {
            let levels = match server {
                Some(url) => TutorClient::new(&url)?.levels().await?,
                None => load_content(&config)?.level_summaries(),
            };
            for level in levels {
                println!("{:>3}  {}  ({})", level.id, level.name, level.topics.join(", "));
                println!("     {}", level.description);
            }
            Ok(())
        }
        Command::Tutorials { server } => {
            let tutorials = match server {
                Some(url) => TutorClient::new(&url)?.tutorials().await?,
                None => load_content(&config)?.tutorial_summaries(),
            };
            for tutorial in tutorials {
                println!("{:>3}  {}", tutorial.id, tutorial.title);
                println!("     {}", tutorial.description);
            }
            Ok(())
        }
    }
}

/// Loads the config file, then applies environment overrides.
///
/// Precedence: CLI flags (applied by the caller) > environment > file > defaults.
fn load_config(cli: &Cli) -> Result<Config> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env_overrides()?;
    Ok(config)
}

fn load_content(config: &Config) -> Result<ContentStore> {
    ContentStore::load(config.content.dir.as_deref())
}

/// Prints the session's display state in the requested format.
fn print_outcome<T: Serialize>(session: &Session, outcome: &T, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(outcome)
            .map_err(|e| TutorError::internal(format!("Failed to encode output: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    match session.state() {
        SubmissionState::Displaying { feedback, table } => {
            match feedback {
                Some(Feedback::Correct(explanation)) => println!("Correct! {explanation}"),
                Some(Feedback::Wrong(reason)) => println!("Wrong answer. {reason}"),
                None => {}
            }
            print_table(table, format);
        }
        SubmissionState::ShowingError(message) => println!("Error: {message}"),
        SubmissionState::Idle | SubmissionState::AwaitingResponse(_) => {}
    }
    Ok(())
}

fn print_table(table: &DisplayTable, format: OutputFormat) {
    match format {
        OutputFormat::Html => println!("{}", table.to_html()),
        _ => print!("{table}"),
    }
}

fn print_truncation(result: Option<&ResultSet>, format: OutputFormat) {
    if format == OutputFormat::Json {
        return;
    }
    if let Some(message) = result
        .filter(|r| r.is_truncated())
        .and_then(|r| r.message.as_deref())
    {
        println!("{message}");
    }
}
