use clap::{Parser, Subcommand};
use snafu::ResultExt as _;
use tokio::net::TcpListener;

use crate::api::{self, App};
use crate::config::Config;
use crate::database::Backend;
use crate::error::*;
use crate::maintenance;
use crate::store::{MemoryStore, Store, SurrealStore};

#[derive(Debug, Parser)]
#[command(name = "adboard")]
#[command(about = "Classified ads backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP API
    Serve,
    /// Clear sessions and caches to fix authentication and CSRF errors
    #[command(name = "fix-auth")]
    FixAuth,
}

pub async fn run(cli: Cli, config: Config) -> Result<(), ApplicationError> {
    match cli.command {
        Command::Serve => serve(config).await,
        Command::FixAuth => maintenance::fix_auth(&config.storage, &mut std::io::stdout().lock())
            .context(MaintenanceSnafu),
    }
}

async fn serve(config: Config) -> Result<(), ApplicationError> {
    match config.database.backend {
        Backend::Memory => {
            tracing::warn!("running on the memory backend, data is lost on shutdown");
            listen(MemoryStore::new(), config).await
        }
        Backend::Surreal => {
            let database = config
                .database
                .connect()
                .await
                .context(ConnectDatabaseSnafu)?;

            listen(SurrealStore::new(database), config).await
        }
    }
}

async fn listen<S: Store>(store: S, config: Config) -> Result<(), ApplicationError> {
    let app = App::create(store, config.csrf).context(TemplatesSnafu)?;
    let router = api::router(app);

    let address = config.host;
    let listener = TcpListener::bind(address)
        .await
        .context(BindAddressSnafu { address })?;

    tracing::info!(%address, "listening");

    axum::serve(listener, router).await.context(WebServerSnafu)
}
