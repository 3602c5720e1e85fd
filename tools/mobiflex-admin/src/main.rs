//! MobiFlex catalog admin.
//!
//! Manages products in the hosted catalog store and follows the live change
//! stream the storefront subscribes to.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mobiflex_admin::commands::{self, UploadArgs};
use mobiflex_admin::rest_store::RestStore;
use mobiflex_common::config::{StoreConfig, DEFAULT_DATABASE_URL};

#[derive(Parser)]
#[command(name = "mobiflex-admin", about = "MobiFlex catalog admin")]
struct Cli {
    /// Realtime database root URL.
    #[arg(long, env = "MOBIFLEX_DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    /// Database secret or ID token, sent as `?auth=`.
    #[arg(long, env = "MOBIFLEX_DB_AUTH", hide_env_values = true)]
    auth: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the catalog.
    List {
        /// Case-insensitive name or description filter.
        #[arg(long, default_value = "")]
        search: String,
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Print one product by id.
    Show { id: String },
    /// Validate and append a product.
    Upload {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        rating: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        link: String,
        /// Repeat for each highlight line.
        #[arg(long = "highlight")]
        highlights: Vec<String>,
    },
    /// Append every entry of a static product.json file.
    Seed { file: PathBuf },
    /// Follow live changes, reprinting the catalog after each one.
    Watch {
        /// Case-insensitive name or description filter.
        #[arg(long, default_value = "")]
        search: String,
    },
}

impl Cli {
    fn store_config(&self) -> StoreConfig {
        StoreConfig {
            database_url: self.database_url.clone(),
            auth: self.auth.clone().filter(|a| !a.is_empty()),
            ..StoreConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = RestStore::new(cli.store_config());
    tracing::debug!(url = %store.config().database_url, "using catalog store");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::List { search, json } => {
            commands::list(&store, &search, json, &mut out).await?;
        }
        Command::Show { id } => {
            if !commands::show(&store, &id, &mut out).await? {
                out.flush()?;
                std::process::exit(1);
            }
        }
        Command::Upload {
            name,
            image,
            price,
            rating,
            description,
            link,
            highlights,
        } => {
            let args = UploadArgs {
                name,
                image,
                price,
                rating,
                description,
                link,
                highlights,
            };
            let id = commands::upload(&store, args, chrono::Utc::now()).await?;
            writeln!(out, "{id}")?;
        }
        Command::Seed { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let ids = commands::seed(&store, &text, chrono::Utc::now()).await?;
            writeln!(out, "seeded {} products", ids.len())?;
        }
        Command::Watch { search } => {
            let events = store
                .subscribe()
                .await
                .context("opening catalog stream")?;
            let published = commands::watch(events, &search, &mut out).await?;
            if published == 0 {
                bail!("catalog stream ended before any data arrived");
            }
        }
    }
    Ok(())
}
