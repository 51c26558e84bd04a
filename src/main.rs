use adboard::cli::{self, Cli};
use adboard::config::Config;
use adboard::error::ApplicationError;
use adboard::logger;
use clap::Parser as _;
use dotenvy::dotenv;

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = logger::init(&config)?;

    cli::run(cli, config).await
}
