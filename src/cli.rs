//! Command-line argument parsing for the SQL tutor.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Output format for rendered results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Boxed plain-text table.
    #[default]
    Text,
    /// HTML table fragment.
    Html,
    /// The raw response envelope.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid output format: {s}. Expected: text, html, or json"
            )),
        }
    }
}

/// A SQL tutor: lessons, tutorials, and a try-it query sandbox.
#[derive(Parser, Debug)]
#[command(name = "sql-tutor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to bind
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Port to bind
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,

        /// Database URL (sqlite::memory:, sqlite:file.db, postgres://...)
        #[arg(long, value_name = "URL")]
        database_url: Option<String>,
    },

    /// Run a query in the try-it sandbox
    Try {
        /// SQL to run
        sql: String,

        /// Send to a running server instead of running locally
        #[arg(long, value_name = "URL")]
        server: Option<String>,

        /// Output format
        #[arg(long, value_name = "FORMAT", default_value = "text")]
        format: OutputFormat,
    },

    /// Check an answer to a lesson question
    Check {
        /// Question ID
        question_id: u32,

        /// Submitted SQL
        sql: String,

        /// Level the question belongs to
        #[arg(short, long, value_name = "LEVEL")]
        level: Option<u32>,

        /// Send to a running server instead of checking locally
        #[arg(long, value_name = "URL")]
        server: Option<String>,

        /// Output format
        #[arg(long, value_name = "FORMAT", default_value = "text")]
        format: OutputFormat,
    },

    /// List lesson levels
    Levels {
        /// Ask a running server instead of the local content
        #[arg(long, value_name = "URL")]
        server: Option<String>,
    },

    /// List tutorials
    Tutorials {
        /// Ask a running server instead of the local content
        #[arg(long, value_name = "URL")]
        server: Option<String>,
    },
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(sql_tutor::config::Config::default_path)
    }
}
