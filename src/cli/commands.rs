//! CLI command implementations
//!
//! `serve` follows a fixed lifecycle:
//! 1. Load and validate configuration
//! 2. Open the log transports
//! 3. Open the store session
//! 4. Serve HTTP until ctrl-c, draining in-flight requests
//! 5. Close the store session

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::http_server::{AppState, HttpServer, HttpServerConfig};
use crate::observability::{error_chain, LogConfig, Logger};
use crate::store::{MemorySession, PgSession, StoreSession};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// PostgreSQL connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub logging: LogConfig,
}

fn default_database_url() -> String {
    "postgres://postgres@localhost:5432/postgres".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            http: HttpServerConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, or the defaults when `path` is `None`
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let config = match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;
                serde_json::from_str(&content)
                    .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?
            }
            None => Config::default(),
        };

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.database_url.trim().is_empty() {
            return Err(CliError::config_error("database_url must not be empty"));
        }

        if self.logging.label.is_empty() {
            return Err(CliError::config_error("logging.label must not be empty"));
        }

        if self.logging.max_file_size_bytes == 0 {
            return Err(CliError::config_error(
                "logging.max_file_size_bytes must be > 0",
            ));
        }

        if self.logging.retention_days == 0 {
            return Err(CliError::config_error("logging.retention_days must be > 0"));
        }

        Ok(())
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve {
            config,
            database_url,
            in_memory,
        } => serve(config.as_deref(), database_url, in_memory),
        Command::CheckConfig { config } => check_config(config.as_deref()).map(|config| {
            println!("{}", config);
        }),
    }
}

/// Load and validate configuration, returning it as pretty JSON
pub fn check_config(config_path: Option<&Path>) -> CliResult<String> {
    let config = Config::load(config_path)?;
    Ok(serde_json::to_string_pretty(&config)?)
}

/// Serve the records API until ctrl-c
pub fn serve(
    config_path: Option<&Path>,
    database_url: Option<String>,
    in_memory: bool,
) -> CliResult<()> {
    let mut config = Config::load(config_path)?;
    if let Some(url) = database_url {
        config.database_url = url;
        config.validate()?;
    }

    let logger =
        Logger::init(&config.logging).map_err(|e| CliError::logging_failed(e.to_string()))?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(run_server(config, logger, in_memory))
}

async fn open_store(
    config: &Config,
    logger: &Logger,
    in_memory: bool,
) -> CliResult<Arc<dyn StoreSession>> {
    if in_memory {
        logger.info("Using in-memory store");
        return Ok(Arc::new(MemorySession::new()));
    }

    match PgSession::connect(&config.database_url).await {
        Ok(session) => {
            logger.info("Connected to database");
            Ok(Arc::new(session))
        }
        Err(e) => {
            let detail = error_chain(&e);
            logger.error(format_args!("Error connecting to database: {}", detail));
            Err(CliError::store_failed(detail))
        }
    }
}

async fn run_server(config: Config, logger: Logger, in_memory: bool) -> CliResult<()> {
    let store = open_store(&config, &logger, in_memory).await?;

    let state = AppState::new(Arc::clone(&store), logger.clone());
    let server = HttpServer::new(config.http.clone(), state);
    let served = server.start_with_shutdown(shutdown_signal(logger.clone())).await;

    if let Err(e) = store.close().await {
        logger.error(format_args!(
            "Error closing database session: {}",
            error_chain(&e)
        ));
    }
    logger.info("Server stopped");

    served.map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
}

async fn shutdown_signal(logger: Logger) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => logger.info("Shutdown signal received"),
        Err(e) => {
            logger.error(format_args!("Failed to listen for shutdown signal: {}", e));
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_config(temp_dir: &TempDir, value: serde_json::Value) -> std::path::PathBuf {
        let config_path = temp_dir.path().join("smms.json");
        fs::write(&config_path, value.to_string()).unwrap();
        config_path
    }

    #[test]
    fn test_config_defaults_without_file() {
        let config = Config::load(None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.http.port, 3000);
        assert_eq!(config.logging.retention_days, 14);
    }

    #[test]
    fn test_config_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(
            &temp_dir,
            json!({
                "database_url": "postgres://cars@db:5432/cars",
                "http": { "port": 8080 }
            }),
        );

        let config = Config::load(Some(config_path.as_path())).unwrap();
        assert_eq!(config.database_url, "postgres://cars@db:5432/cars");
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.logging, LogConfig::default());
    }

    #[test]
    fn test_config_rejects_zero_retention() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(&temp_dir, json!({"logging": {"retention_days": 0}}));

        let result = Config::load(Some(config_path.as_path()));
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_config_rejects_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("smms.json");
        fs::write(&config_path, "{ not json").unwrap();

        let err = Config::load(Some(config_path.as_path())).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
        assert!(err.message().contains("Invalid config JSON"));
    }

    #[test]
    fn test_config_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load(Some(temp_dir.path().join("absent.json").as_path()));
        assert_eq!(result.unwrap_err().code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_check_config_prints_effective_settings() {
        let output = check_config(None).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["http"]["port"], 3000);
        assert_eq!(parsed["logging"]["label"], "smms-logs");
    }

    #[tokio::test]
    async fn test_open_store_reports_connect_failure() {
        let config = Config {
            database_url: "not a database url".to_string(),
            ..Config::default()
        };
        let (logger, log) = Logger::capture("smms-logs");

        let err = match open_store(&config, &logger, false).await {
            Ok(_) => panic!("connect should fail"),
            Err(err) => err,
        };
        assert_eq!(err.code(), &CliErrorCode::StoreFailed);
        assert!(log.contents().contains("error: Error connecting to database"));
    }

    #[tokio::test]
    async fn test_open_store_in_memory() {
        let (logger, log) = Logger::capture("smms-logs");
        let store = open_store(&Config::default(), &logger, true).await.unwrap();
        assert!(store
            .query(crate::store::Statement::SelectAllRecords, &[])
            .await
            .unwrap()
            .rows
            .is_empty());
        assert!(log.contents().contains("info: Using in-memory store"));
    }
}
