mod account;
mod admin;
mod db;
mod shop;

use clap::{Parser, Subcommand};
use pyp_storefront::Storefront;
use tracing_subscriber::EnvFilter;

use crate::account::AuthCommands;
use crate::admin::AdminCommands;
use crate::db::DbCommands;
use crate::shop::ShopCommands;

#[derive(Debug, Parser)]
#[command(name = "pyp-cli")]
#[command(about = "Pick Your Pickle command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Browse the catalog, manage the cart and place orders
    Shop {
        #[command(subcommand)]
        command: ShopCommands,
    },
    /// Sign in, sign up and reset passwords
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Back-office actions
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Ask PickleBot a question
    Chat {
        /// The message to send
        message: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Db { command }) => db::run(command).await,
        Some(Commands::Shop { command }) => {
            let mut store = open_storefront().await?;
            shop::run(&mut store, command).await
        }
        Some(Commands::Auth { command }) => {
            let mut store = open_storefront().await?;
            account::run(&mut store, command).await
        }
        Some(Commands::Admin { command }) => {
            let mut store = open_storefront().await?;
            admin::run(&mut store, command).await
        }
        Some(Commands::Chat { message }) => {
            let mut store = open_storefront().await?;
            let reply = store.chat(&message).await?;
            println!("{reply}");
            Ok(())
        }
        None => {
            println!("pyp-cli ready; run with --help to list commands");
            Ok(())
        }
    }
}

/// Open the storefront and load the catalog. An unreachable API leaves the
/// built-in catalog in place, so browsing still works offline.
async fn open_storefront() -> anyhow::Result<Storefront> {
    let config = pyp_core::load_storefront_config()?;
    tracing::debug!(api = %config.api_base_url, state_dir = %config.state_dir.display(), "opening storefront");

    let mut store = Storefront::open(&config)?;
    if let Err(e) = store.refresh().await {
        eprintln!("warning: {}; showing the built-in catalog", e.user_message());
    }
    if let Err(e) = store.refresh_session().await {
        tracing::warn!(error = %e, "could not confirm the saved session");
    }
    Ok(store)
}

/// Print the notification the last action raised, if any.
fn print_notification(store: &Storefront) {
    if let Some(note) = store.notification() {
        match note.kind {
            pyp_storefront::NotificationKind::Success => println!("{}", note.message),
            pyp_storefront::NotificationKind::Error => eprintln!("error: {}", note.message),
        }
    }
}

/// Truncate `text` to `max` characters, appending `...` when cut.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}
