use clap::Parser;
use std::error::Error;

use cmdb::cli::{self, Cli, Command};
use cmdb::config::Config;
use cmdb::db;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    let config = Config::from_env()?;
    let pool = db::init_pool(&config.database_url, config.max_connections).await?;

    let result = match args.command.unwrap_or(Command::Serve) {
        Command::Serve => cli::serve(pool.clone(), &config).await,
        Command::Import { file } => cli::import_data(&pool, &file).await.map(|_| ()),
        Command::Export { output } => cli::export_data(&pool, output.as_deref()).await,
    };

    pool.close().await;
    result
}
