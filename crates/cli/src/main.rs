//! Midnight Magnolia CLI - a terminal front end for the cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the current cart (creates a checkout on first use)
//! magnolia show
//!
//! # Add two of a variant, then change the quantity of its line
//! magnolia add gid://shopify/ProductVariant/42 -q 2
//! magnolia update gid://shopify/CartLine/abc 3
//!
//! # Browse the catalog
//! magnolia products
//! magnolia products --handle magnolia-candle
//!
//! # Hand off to the hosted checkout
//! magnolia checkout
//! ```
//!
//! The checkout ID is kept in a session file between runs, so successive
//! commands work on the same cart.
//!
//! # Environment Variables
//!
//! - `MAGNOLIA_API_URL` - Storefront API base URL (default: `http://127.0.0.1:3000/`)
//! - `MAGNOLIA_SESSION_FILE` - Session file (default: `$XDG_DATA_HOME/magnolia/session.json`)
//! - `MAGNOLIA_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `RUST_LOG` - Log filter for stderr diagnostics (default: `warn`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use magnolia_cart::{
    CartConfig, CartSession, FileSessionStore, HttpCheckoutClient, MemorySessionStore,
    SessionStore,
};
use magnolia_core::{LineItemId, VariantId};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "magnolia")]
#[command(author, version, about = "Midnight Magnolia cart")]
struct Cli {
    /// Storefront API base URL
    #[arg(long, env = "MAGNOLIA_API_URL", global = true)]
    api_url: Option<String>,

    /// File that remembers the checkout between runs
    #[arg(long, env = "MAGNOLIA_SESSION_FILE", global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products, or show one by handle
    Products {
        /// Product handle
        #[arg(long)]
        handle: Option<String>,
    },
    #[command(flatten)]
    Cart(CartCommand),
}

#[derive(Subcommand)]
enum CartCommand {
    /// Show the cart contents and subtotal
    Show,
    /// Add a variant to the cart
    Add {
        /// Variant ID
        variant_id: String,

        /// Quantity (1-10)
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Set the quantity of a line item
    Update {
        /// Line item ID
        line_item_id: String,

        /// New quantity (1-10)
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line item
    Remove {
        /// Line item ID
        line_item_id: String,
    },
    /// Print the hosted checkout URL
    Checkout,
    /// Open or close the cart drawer and show the result
    Toggle,
}

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr so stdout stays clean for command output
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        commands::emit_error(&e);
        std::process::exit(1);
    }
}

fn load_config(api_url: Option<&str>) -> Result<CartConfig, CommandError> {
    let config = CartConfig::from_env()?;
    match api_url {
        Some(url) => Ok(config.with_api_url(url)?),
        None => Ok(config),
    }
}

fn session_store(path: Option<PathBuf>) -> Arc<dyn SessionStore> {
    match path.map(FileSessionStore::new).or_else(FileSessionStore::default_location) {
        Some(store) => {
            tracing::debug!(path = %store.path().display(), "Using session file");
            Arc::new(store)
        }
        None => {
            tracing::warn!("No session file location; the cart will not persist between runs");
            Arc::new(MemorySessionStore::new())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let config = load_config(cli.api_url.as_deref())?;
    let client = Arc::new(HttpCheckoutClient::new(&config)?);

    let output = match cli.command {
        // Catalog reads do not need (or create) a checkout
        Commands::Products { handle } => {
            commands::catalog::products(client.as_ref(), handle.as_deref()).await?
        }
        Commands::Cart(command) => {
            let session =
                CartSession::open(client.clone(), session_store(cli.session_file), &config).await;
            let output = run_cart(&session, &client, command).await;
            session.close();
            output?
        }
    };

    commands::emit(&output);
    Ok(())
}

async fn run_cart(
    session: &CartSession,
    client: &HttpCheckoutClient,
    command: CartCommand,
) -> Result<String, CommandError> {
    match command {
        CartCommand::Show => commands::cart::show(session),
        CartCommand::Add {
            variant_id,
            quantity,
        } => commands::cart::add(session, client, &VariantId::new(variant_id), quantity).await,
        CartCommand::Update {
            line_item_id,
            quantity,
        } => commands::cart::update(session, &LineItemId::new(line_item_id), quantity).await,
        CartCommand::Remove { line_item_id } => {
            commands::cart::remove(session, &LineItemId::new(line_item_id)).await
        }
        CartCommand::Checkout => commands::cart::checkout(session),
        CartCommand::Toggle => Ok(commands::cart::toggle(session)),
    }
}
