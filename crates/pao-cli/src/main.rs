//! PAO command-line interface.
//!
//! Generates migrations from a model manifest and applies them to the
//! embedded database.

mod commands;
mod config;
mod error;
mod formatter;
mod manifest;

use clap::{Parser, Subcommand};
use config::{GlobalArgs, Settings};
use error::CliError;
use formatter::OutputFormat;
use tracing_subscriber::EnvFilter;

/// Default log filter when RUST_LOG is unset.
const DEFAULT_LOG_FILTER: &str = "pao=info,pao_core=info";

/// PAO schema migrations
#[derive(Parser, Debug)]
#[command(name = "pao")]
#[command(version, about = "Generate and apply schema migrations")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Operator commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate migrations from the current models
    MakeMigrations {
        /// Rewrite the latest migration of each target in place
        #[arg(long)]
        overwrite: bool,
    },
    /// Create a blank migration
    NewMigration {
        /// Migration name, used as the file suffix
        name: String,
    },
    /// Apply all pending migrations
    Migrate {
        /// Delete the database before applying
        #[arg(long)]
        clean: bool,
    },
    /// Roll back the most recently applied migration
    MigrateRollback,
    /// List applied migrations
    ListMigrations {
        /// Output format
        #[arg(long, default_value = "json", value_enum)]
        format: OutputFormat,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String, CliError> {
    load_env(&cli.global)?;
    let settings = Settings::from_env(&cli.global);

    match cli.command {
        Command::MakeMigrations { overwrite } => commands::make_migrations(&settings, overwrite),
        Command::NewMigration { name } => commands::new_migration(&settings, &name),
        Command::Migrate { clean } => commands::migrate(&settings, clean),
        Command::MigrateRollback => commands::migrate_rollback(&settings),
        Command::ListMigrations { format } => commands::list_migrations(&settings, format),
    }
}

/// Load `.env` from the working directory, then the explicit env file.
fn load_env(args: &GlobalArgs) -> Result<(), CliError> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env");
    }
    if let Some(path) = &args.env_file {
        dotenvy::from_path(path).map_err(|source| CliError::EnvFile {
            path: path.clone(),
            source,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["pao", "--graph-name", "g", "make-migrations", "--overwrite"]);
        assert_eq!(cli.global.graph_name.as_deref(), Some("g"));
        assert!(matches!(cli.command, Command::MakeMigrations { overwrite: true }));

        let cli = Cli::parse_from(["pao", "list-migrations", "--format", "table", "--db-name", "x"]);
        assert_eq!(cli.global.db_name.as_deref(), Some("x"));
        assert!(matches!(
            cli.command,
            Command::ListMigrations {
                format: OutputFormat::Table
            }
        ));

        let cli = Cli::parse_from(["pao", "new-migration", "seed"]);
        assert!(matches!(cli.command, Command::NewMigration { ref name } if name == "seed"));
    }

    #[test]
    fn test_missing_env_file_is_an_error() {
        let args = GlobalArgs {
            env_file: Some("/nonexistent/pao.env".into()),
            ..Default::default()
        };
        assert!(matches!(load_env(&args), Err(CliError::EnvFile { .. })));
    }
}
