use std::path::PathBuf;

use clap::Parser;
use derive_more::From;
use thiserror::Error;

use crate::{
    api::TokenStore,
    app::{App, State},
    config::{Config, ConfigError},
    session_manager::SessionManager,
};

mod api;
mod app;
mod config;
mod page;
mod session_manager;
mod utils;

/// Track stair-climbing sessions from your terminal
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the directory containing `settings.toml`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured server URL for this run
    #[arg(short, long)]
    server: Option<String>,
}

#[derive(Debug, From, Error)]
enum Error {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Io(std::io::Error),
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    let mut config = Config::get(args.config)?;
    if let Some(server) = args.server {
        config.server.base_url = server;
    }

    let tokens = TokenStore::new();
    let backend = config.server.build(tokens.clone())?;
    let api = SessionManager::new(backend, tokens);

    App::new(State { config, api }).run()?;

    Ok(())
}
