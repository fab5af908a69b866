//! Go Marketplace CLI - Inspect and edit the locally persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! gm-cart show
//!
//! # Add a product (adding it again bumps its quantity)
//! gm-cart add --id 1 --title "Cadeira Rivatti" --image-url https://cdn.example.test/1.png --price 400
//!
//! # Change a quantity
//! gm-cart increment 1
//! gm-cart decrement 1
//!
//! # Replay a cart screen button press
//! gm-cart press increment-1
//! ```
//!
//! # Commands
//!
//! - `show` - Print the cart and its totals
//! - `add` - Add a product
//! - `increment` / `decrement` - Change a line's quantity
//! - `press` - Dispatch a cart screen action id
//!
//! Configuration is read from the environment; see
//! [`go_marketplace_cart::config`].

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use go_marketplace_cart::CartAction;
use go_marketplace_core::ProductId;
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "gm-cart")]
#[command(author, version, about = "Go Marketplace cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart and its totals
    Show {
        /// Print the rendered cart as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a product to the cart
    Add {
        /// Catalog product id
        #[arg(long)]
        id: String,

        /// Product display name
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long)]
        image_url: String,

        /// Unit price in the store currency
        #[arg(long)]
        price: Decimal,
    },
    /// Raise a product's quantity by one
    Increment {
        /// Product id
        id: String,
    },
    /// Lower a product's quantity by one, removing it at zero
    Decrement {
        /// Product id
        id: String,
    },
    /// Dispatch a cart screen action id (`increment-<id>` or `decrement-<id>`)
    Press {
        /// Action id
        action: String,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout stays clean for the rendered cart
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "go_marketplace_cart=info,gm_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let config = go_marketplace_cart::CartConfig::from_env()?;
    let session = commands::Session::open(&config).await;

    match cli.command {
        Commands::Show { json } => session.show(json)?,
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => session.add(&id, title, image_url, price).await?,
        Commands::Increment { id } => {
            session
                .apply(&CartAction::Increment(ProductId::parse(&id)?))
                .await?;
        }
        Commands::Decrement { id } => {
            session
                .apply(&CartAction::Decrement(ProductId::parse(&id)?))
                .await?;
        }
        Commands::Press { action } => session.press(&action).await?,
    }
    Ok(())
}
