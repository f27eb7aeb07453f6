//! Command-line and environment configuration.

use crate::error::CliError;
use clap::Args;
use pao_core::{BuilderConfig, StorageConfig};
use std::path::PathBuf;

/// Environment variable naming the application directory.
pub const ENV_APP_DIR: &str = "PAO_APP_DIR";
/// Environment variable naming the migrations directory.
pub const ENV_MIGRATIONS_DIR: &str = "PAO_MIGRATIONS_DIR";
/// Environment variable naming the model manifest.
pub const ENV_MODELS_FILE: &str = "PAO_MODELS_FILE";
/// Environment variable naming the graph.
pub const ENV_GRAPH_NAME: &str = "PAO_GRAPH_NAME";
/// Environment variable naming the database directory.
pub const ENV_DB_PATH: &str = "PAO_DB_PATH";
/// Environment variable naming the database.
pub const ENV_DB_NAME: &str = "PAO_DB_NAME";

/// Default database directory.
pub const DEFAULT_DB_PATH: &str = "./data";

/// Default manifest file name inside the application directory.
pub const DEFAULT_MODELS_FILE: &str = "models.json";

/// Default migrations directory name inside the application directory.
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Env file to load before reading PAO_* variables
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Application directory holding models.json and migrations/ [env: PAO_APP_DIR]
    #[arg(long, global = true)]
    pub app_dir: Option<PathBuf>,

    /// Migrations directory [env: PAO_MIGRATIONS_DIR]
    #[arg(long, global = true)]
    pub migrations_dir: Option<PathBuf>,

    /// Model manifest file [env: PAO_MODELS_FILE]
    #[arg(long, global = true)]
    pub models: Option<PathBuf>,

    /// Name of the graph spanning all edge collections [env: PAO_GRAPH_NAME]
    #[arg(long, global = true)]
    pub graph_name: Option<String>,

    /// Directory holding databases [env: PAO_DB_PATH]
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Database name [env: PAO_DB_NAME]
    #[arg(long, global = true)]
    pub db_name: Option<String>,
}

/// Settings resolved from flags, then environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Application directory.
    pub app_dir: Option<PathBuf>,
    /// Explicit migrations directory.
    pub migrations_dir: Option<PathBuf>,
    /// Explicit model manifest.
    pub models_file: Option<PathBuf>,
    /// Graph name.
    pub graph_name: Option<String>,
    /// Database directory.
    pub db_path: PathBuf,
    /// Database name.
    pub db_name: Option<String>,
}

impl Settings {
    /// Resolve settings. Flags win over values returned by `lookup`.
    pub fn resolve(args: &GlobalArgs, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            app_dir: args.app_dir.clone().or_else(|| var(ENV_APP_DIR).map(PathBuf::from)),
            migrations_dir: args
                .migrations_dir
                .clone()
                .or_else(|| var(ENV_MIGRATIONS_DIR).map(PathBuf::from)),
            models_file: args
                .models
                .clone()
                .or_else(|| var(ENV_MODELS_FILE).map(PathBuf::from)),
            graph_name: args.graph_name.clone().or_else(|| var(ENV_GRAPH_NAME)),
            db_path: args
                .db_path
                .clone()
                .or_else(|| var(ENV_DB_PATH).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            db_name: args.db_name.clone().or_else(|| var(ENV_DB_NAME)),
        }
    }

    /// Resolve settings from the process environment.
    pub fn from_env(args: &GlobalArgs) -> Self {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    /// Migrations directory: explicit, or `migrations/` in the app dir.
    pub fn migrations_dir(&self) -> Result<PathBuf, CliError> {
        if let Some(dir) = &self.migrations_dir {
            return Ok(dir.clone());
        }
        self.app_dir
            .as_ref()
            .map(|app| app.join(DEFAULT_MIGRATIONS_DIR))
            .ok_or_else(|| missing(&format!("{ENV_APP_DIR} or {ENV_MIGRATIONS_DIR}")))
    }

    /// Model manifest: explicit, or `models.json` in the app dir.
    pub fn models_file(&self) -> Result<PathBuf, CliError> {
        if let Some(file) = &self.models_file {
            return Ok(file.clone());
        }
        self.app_dir
            .as_ref()
            .map(|app| app.join(DEFAULT_MODELS_FILE))
            .ok_or_else(|| missing(&format!("{ENV_APP_DIR} or {ENV_MODELS_FILE}")))
    }

    /// Builder configuration; requires a graph name.
    pub fn builder_config(&self, overwrite: bool) -> Result<BuilderConfig, CliError> {
        let graph_name = self
            .graph_name
            .clone()
            .ok_or_else(|| missing(ENV_GRAPH_NAME))?;
        Ok(BuilderConfig::new(self.migrations_dir()?, graph_name).with_overwrite(overwrite))
    }

    /// Storage configuration; requires a database name.
    pub fn storage_config(&self, clean: bool) -> Result<StorageConfig, CliError> {
        let name = self.db_name.clone().ok_or_else(|| missing(ENV_DB_NAME))?;
        Ok(StorageConfig::new(&self.db_path, name).with_clean(clean))
    }
}

fn missing(what: &str) -> CliError {
    CliError::Config(format!("{what} is required"))
}
