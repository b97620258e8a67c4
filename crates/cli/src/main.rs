//! Storefront cart CLI - inspect and edit the local cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! cart-cli show
//!
//! # Add one unit of product 3
//! cart-cli add 3
//!
//! # Set product 3 to four units
//! cart-cli update 3 4
//!
//! # Remove product 3
//! cart-cli remove 3
//! ```
//!
//! # Commands
//!
//! - `show` - Print line items, item count and subtotal
//! - `add` - Add one unit of a product
//! - `remove` - Remove a product
//! - `update` - Set the amount of a product already in the cart
//!
//! Configuration is read from the environment (see `storefront_cart::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use storefront_cart::ProductId;

mod commands;

#[derive(Parser)]
#[command(name = "cart-cli")]
#[command(author, version, about = "Storefront cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        product_id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        product_id: ProductId,
    },
    /// Set the amount of a product already in the cart
    Update {
        /// Product ID
        product_id: ProductId,

        /// New amount (zero or less is ignored)
        #[arg(allow_hyphen_values = true)]
        amount: i64,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storefront_cart=info,cart_cli=info,cart::notify=warn".into());

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let store = commands::open_store()?;

    match cli.command {
        Commands::Show => {}
        Commands::Add { product_id } => store.add_product(product_id).await,
        Commands::Remove { product_id } => store.remove_product(product_id).await,
        Commands::Update { product_id, amount } => {
            store
                .update_product_amount(storefront_cart::UpdateProductAmount { product_id, amount })
                .await;
        }
    }

    commands::print_cart(&store).await;
    Ok(())
}
