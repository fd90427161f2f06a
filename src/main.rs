//! Student records server.
//!
//! Entry point for the student records service.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use student_records::catalog::Catalog;
use student_records::config::{DataSource, Environment};
use student_records::server::{init_metrics, init_tracing, App, AppState, ServerConfig};
use student_records::storage::{init_storage, seed_students, Database, SqliteStudentSource};
use student_records::students::{fixture_students, FixtureSource, StudentQueryResolver, StudentSource};
use student_records::Config;

/// Student records service with REST and WebSocket transports
#[derive(Parser, Debug)]
#[command(name = "student-records")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Host address to bind to
    #[arg(long, env = "STUDENT_RECORDS_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "STUDENT_RECORDS_PORT", default_value = "3000")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "STUDENT_RECORDS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "STUDENT_RECORDS_LOG_JSON")]
    log_json: bool,

    /// Where student records are read from
    #[arg(long, value_enum, default_value_t = DataSource::Fixtures)]
    data_source: DataSource,

    /// Data directory for the `SQLite` database
    #[arg(short, long, env = "STUDENT_RECORDS_DATA_DIR", default_value = "./data")]
    data_dir: std::path::PathBuf,

    /// Seed an empty database with the built-in roster
    #[arg(long)]
    seed: bool,

    /// Deployment environment
    #[arg(long, value_enum, env = "STUDENT_RECORDS_ENV", default_value_t = Environment::Production)]
    environment: Environment,

    /// Allowed CORS origins (comma separated); any origin when empty
    #[arg(long = "cors-origin", env = "STUDENT_RECORDS_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            log_level: cli.log_level,
            log_json: cli.log_json,
            data_source: cli.data_source,
            data_dir: cli.data_dir,
            seed: cli.seed,
            environment: cli.environment,
            cors_origins: cli.cors_origins,
        }
    }
}

fn open_source(config: &Config) -> anyhow::Result<Arc<dyn StudentSource>> {
    match config.data_source {
        DataSource::Fixtures => Ok(Arc::new(FixtureSource::standard())),
        DataSource::Sqlite => {
            std::fs::create_dir_all(&config.data_dir).with_context(|| {
                format!("failed to create data directory {}", config.data_dir.display())
            })?;

            let db = Database::open(config.database_path())
                .with_context(|| format!("failed to open {}", config.database_path().display()))?;
            init_storage(&db).context("failed to initialize storage")?;

            if config.seed {
                let inserted =
                    seed_students(&db, &fixture_students()).context("failed to seed students")?;
                tracing::info!(inserted, "Seeded student roster");
            }

            Ok(Arc::new(SqliteStudentSource::new(db)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from(Cli::parse());

    init_tracing(&config.log_level, config.log_json);

    tracing::info!(
        "Student records v{} starting...",
        env!("CARGO_PKG_VERSION")
    );
    tracing::debug!(?config, "Configuration loaded");

    config.validate()?;
    tracing::info!(addr = %config.server_addr(), "Configuration validated");

    let source = open_source(&config)?;
    tracing::info!(source = source.name(), "Student source ready");

    init_metrics();

    let resolver = StudentQueryResolver::new(Arc::new(Catalog::standard()), source);
    let app = App::new(
        ServerConfig::from(&config),
        AppState::new(resolver, config.environment),
    );
    app.run().await?;

    Ok(())
}
