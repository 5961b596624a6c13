use clap::{Parser, Subcommand};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;

use crate::config::Config;
use crate::models::NewEntry;
use crate::routes::export::ExportData;
use crate::service;

/// Configuration management database: entries tagged with name/value pairs.
///
/// Settings come from the environment (or a `.env` file): `DATABASE_URL`,
/// `CMDB_BIND`, `CMDB_CORS_ORIGINS`, `CMDB_MAX_CONNECTIONS`.
#[derive(Parser)]
#[command(name = "cmdb", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API (the default).
    Serve,

    /// Load entries from a JSON file.
    ///
    /// Accepts either a plain array of `{name, tags}` objects or a document
    /// produced by `export`. The whole file is applied in one transaction.
    Import {
        /// Path to the JSON file.
        file: PathBuf,
    },

    /// Write every entry, tagged or not, as JSON.
    Export {
        /// Destination file; stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportFile {
    Export(ExportData),
    Entries(Vec<NewEntry>),
}

impl ImportFile {
    fn into_entries(self) -> Vec<NewEntry> {
        match self {
            ImportFile::Export(data) => data.entries,
            ImportFile::Entries(entries) => entries,
        }
    }
}

pub fn parse_import(content: &str) -> Result<Vec<NewEntry>, Box<dyn Error>> {
    let entries = serde_json::from_str::<ImportFile>(content)?.into_entries();
    for entry in &entries {
        entry.validate()?;
    }
    Ok(entries)
}

pub async fn import_data(pool: &SqlitePool, file_path: &Path) -> Result<usize, Box<dyn Error>> {
    let content = fs::read_to_string(file_path)?;
    let entries = parse_import(&content)?;
    let imported = service::import_entries(pool, &entries).await?;
    println!("Imported {} entries", imported);
    Ok(imported)
}

pub async fn export_data(pool: &SqlitePool, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let export = ExportData::collect(pool).await?;
    let json = serde_json::to_string_pretty(&export)?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            println!("Exported {} entries to {}", export.entries.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub async fn serve(pool: SqlitePool, config: &Config) -> Result<(), Box<dyn Error>> {
    let app = crate::build_app(pool, &config.cors_origins);
    let listener = TcpListener::bind(config.bind).await?;

    tracing::info!("listening on {}", config.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}
