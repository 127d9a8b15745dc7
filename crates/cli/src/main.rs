use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use folio_kernel::settings::Settings;

/// Folio book catalog service
#[derive(Debug, Parser)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Configuration directory; defaults to `FOLIO_CONFIG_DIR` or `./config`
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Environment overlay to load, e.g. `local` or `production`
    #[arg(long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Print the effective configuration
    Config,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        match (&self.config_dir, &self.env) {
            (None, None) => Settings::load(),
            (dir, env) => {
                let dir = match dir {
                    Some(dir) => dir.clone(),
                    None => std::env::current_dir()
                        .context("unable to resolve current directory")?
                        .join("config"),
                };
                let env = env.clone().unwrap_or_else(|| "local".to_string());
                Settings::load_from(&dir, &env)
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings().context("failed to load Folio settings")?;

    match cli.command {
        Command::Serve => folio_app::app::run(settings).await,
        Command::Migrate => folio_app::app::migrate(settings).await,
        Command::Config => {
            println!("{settings:#?}");
            Ok(())
        }
    }
}
