//! Verger CLI - drive a cart from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show the persisted cart
//! verger cart show
//!
//! # Add a variant (creates a cart on first use)
//! verger cart add gid://shopify/ProductVariant/123 -q 2
//!
//! # Change or remove a line
//! verger cart update gid://shopify/CartLine/abc 3
//! verger cart decrement gid://shopify/CartLine/abc
//! verger cart remove gid://shopify/CartLine/abc
//!
//! # Print the checkout URL and forget the cart
//! verger cart checkout
//!
//! # Talk to Shopify directly instead of a running storefront
//! verger --direct cart add gid://shopify/ProductVariant/123
//! ```
//!
//! The cart is kept in `shopify_cart.json` (see `--cart-file`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::cart::{CartCommand, Connection};

#[derive(Parser)]
#[command(name = "verger")]
#[command(author, version, about = "Verger cart tools")]
struct Cli {
    /// Storefront cart endpoint
    #[arg(
        long,
        global = true,
        env = "VERGER_CART_ENDPOINT",
        default_value = commands::cart::DEFAULT_ENDPOINT
    )]
    endpoint: String,

    /// File holding the persisted cart
    #[arg(
        long,
        global = true,
        env = "VERGER_CART_FILE",
        default_value = commands::cart::DEFAULT_CART_FILE
    )]
    cart_file: PathBuf,

    /// Call the Shopify Storefront API directly (reads `SHOPIFY_*` variables)
    #[arg(long, global = true)]
    direct: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the persisted cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the current cart
    Show,
    /// Start a new, empty cart
    Create,
    /// Add a variant
    Add {
        /// Variant ID (gid://shopify/ProductVariant/...)
        variant_id: String,

        /// Quantity to add
        #[arg(short, long)]
        quantity: Option<u32>,
    },
    /// Set a line's quantity (values below 1 become 1)
    Update {
        /// Cart line ID
        line_id: String,

        /// New quantity
        quantity: u32,
    },
    /// Add one to a line
    Increment {
        /// Cart line ID
        line_id: String,
    },
    /// Take one from a line, never below 1
    Decrement {
        /// Cart line ID
        line_id: String,
    },
    /// Remove a line
    Remove {
        /// Cart line ID
        line_id: String,
    },
    /// Print the checkout URL and clear the local cart
    Checkout,
}

impl From<CartAction> for CartCommand {
    fn from(action: CartAction) -> Self {
        match action {
            CartAction::Show => Self::Show,
            CartAction::Create => Self::Create,
            CartAction::Add {
                variant_id,
                quantity,
            } => Self::Add {
                variant_id,
                quantity,
            },
            CartAction::Update { line_id, quantity } => Self::Update { line_id, quantity },
            CartAction::Increment { line_id } => Self::Step { line_id, delta: 1 },
            CartAction::Decrement { line_id } => Self::Step { line_id, delta: -1 },
            CartAction::Remove { line_id } => Self::Remove { line_id },
            CartAction::Checkout => Self::Checkout,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "verger=info,verger_storefront=warn".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let connection = if cli.direct {
        Connection::Direct
    } else {
        Connection::Endpoint(cli.endpoint)
    };

    match cli.command {
        Commands::Cart { action } => {
            commands::cart::run(&connection, &cli.cart_file, action.into()).await?;
        }
    }
    Ok(())
}
