//! Xeno Armory CLI - terminal front-end for the armory storefront.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (persists the session for later commands)
//! armory login -u commander -p hunter2
//!
//! # Browse the catalog
//! armory catalog --category Plasma --search repeater
//!
//! # Cart and checkout
//! armory cart add 3 --quantity 2
//! armory cart set 3 1
//! armory checkout
//!
//! # Credits and history
//! armory topup 5000
//! armory orders
//!
//! # Inventory management (admin role required)
//! armory admin add --name "Gauss Rifle" --category Ballistic --price 4500 --stock 10
//! armory admin delete 3 --yes
//! ```
//!
//! # Commands
//!
//! - `login` / `register` / `logout` - session management
//! - `catalog` / `show` - product browsing and filtering
//! - `cart` - server-synchronized cart (show/add/set/remove)
//! - `checkout` / `orders` - order submission and history
//! - `topup` / `profile` - credits and account details
//! - `admin` - inventory CRUD and the order overview

#![cfg_attr(not(test), forbid(unsafe_code))]
// Terminal output is this binary's job.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, Subcommand};
use xeno_armory_client::config::ClientConfig;
use xeno_armory_client::{ArmoryClient, notify};
use xeno_armory_core::{Credits, WeaponId};

mod commands;

#[derive(Parser)]
#[command(name = "armory")]
#[command(author, version, about = "Xeno Armory storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session
    Login {
        /// Account name
        #[arg(short, long)]
        username: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Create a new account
    Register {
        /// Account name
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Sign out and forget the persisted session
    Logout,
    /// List the catalog, optionally filtered
    Catalog {
        /// Category to match exactly ("All" lists everything)
        #[arg(short, long)]
        category: Option<String>,

        /// Case-insensitive name search
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one weapon in detail
    Show {
        /// Weapon id
        id: i64,
    },
    /// Inspect or mutate the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Submit the current cart as an order
    Checkout,
    /// Show the order history
    Orders,
    /// Deposit credits
    Topup {
        /// Amount in whole credits
        amount: i64,
    },
    /// Show or update the profile
    Profile {
        /// New email address
        #[arg(long)]
        email: Option<String>,

        /// New shipping address
        #[arg(long)]
        address: Option<String>,

        /// Avatar image file to upload
        #[arg(long)]
        avatar: Option<std::path::PathBuf>,
    },
    /// Inventory management (admin role required)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the current cart (default)
    Show,
    /// Add a weapon to the cart
    Add {
        /// Weapon id
        id: i64,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a cart line to an absolute quantity (0 removes it)
    Set {
        /// Weapon id
        id: i64,

        /// Target quantity
        quantity: u32,
    },
    /// Remove a cart line
    Remove {
        /// Weapon id
        id: i64,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Register a new weapon
    Add {
        /// Weapon name
        #[arg(long)]
        name: String,

        /// Category (Melee, Plasma, Ballistic, ...)
        #[arg(long)]
        category: String,

        /// Price in whole credits
        #[arg(long)]
        price: i64,

        /// Initial stock
        #[arg(long)]
        stock: u32,

        /// Description
        #[arg(long, default_value = "")]
        description: String,

        /// Image file to upload
        #[arg(long)]
        image: Option<std::path::PathBuf>,
    },
    /// Update fields of an existing weapon
    Edit {
        /// Weapon id
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        price: Option<i64>,

        #[arg(long)]
        stock: Option<u32>,

        #[arg(long)]
        description: Option<String>,

        /// Replacement image file
        #[arg(long)]
        image: Option<std::path::PathBuf>,
    },
    /// Delete a weapon (requires --yes)
    Delete {
        /// Weapon id
        id: i64,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show every order in the system
    Orders,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let client = ArmoryClient::new(&config)?;

    // Subscribe before running the command so every toast it produces is
    // drained to stderr afterwards, like the on-screen toast layer.
    let notifications = client.notifier().subscribe();

    let outcome: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Login { username, password } => {
            commands::account::login(&client, &username, &password).await
        }
        Commands::Register {
            username,
            email,
            password,
        } => commands::account::register(&client, &username, &email, &password).await,
        Commands::Logout => {
            client.account().logout();
            Ok(())
        }
        Commands::Catalog { category, search } => {
            commands::catalog::list(&client, category, search).await
        }
        Commands::Show { id } => commands::catalog::show(&client, WeaponId::new(id)).await,
        Commands::Cart { action } => match action.unwrap_or(CartAction::Show) {
            CartAction::Show => commands::cart::show(&client).await,
            CartAction::Add { id, quantity } => {
                commands::cart::add(&client, WeaponId::new(id), quantity).await
            }
            CartAction::Set { id, quantity } => {
                commands::cart::set(&client, WeaponId::new(id), quantity).await
            }
            CartAction::Remove { id } => commands::cart::remove(&client, WeaponId::new(id)).await,
        },
        Commands::Checkout => commands::orders::checkout(&client).await,
        Commands::Orders => commands::orders::history(&client).await,
        Commands::Topup { amount } => {
            commands::account::topup(&client, Credits::new(amount)).await
        }
        Commands::Profile {
            email,
            address,
            avatar,
        } => commands::account::profile(&client, email, address, avatar).await,
        Commands::Admin { action } => match action {
            AdminAction::Add {
                name,
                category,
                price,
                stock,
                description,
                image,
            } => {
                commands::admin::add(
                    &client,
                    name,
                    category,
                    Credits::new(price),
                    stock,
                    description,
                    image,
                )
                .await
            }
            AdminAction::Edit {
                id,
                name,
                category,
                price,
                stock,
                description,
                image,
            } => {
                commands::admin::edit(
                    &client,
                    WeaponId::new(id),
                    name,
                    category,
                    price.map(Credits::new),
                    stock,
                    description,
                    image,
                )
                .await
            }
            AdminAction::Delete { id, yes } => {
                commands::admin::delete(&client, WeaponId::new(id), yes).await
            }
            AdminAction::Orders => commands::admin::orders(&client).await,
        },
    };

    drain_notifications(notifications);
    outcome
}

/// Print every toast the command produced, like the on-screen toast layer.
fn drain_notifications(mut rx: tokio::sync::broadcast::Receiver<notify::Event>) {
    while let Ok(event) = rx.try_recv() {
        if let notify::Event::Toast(toast) = event {
            let tag = match toast.severity {
                notify::Severity::Info => "info",
                notify::Severity::Success => "ok",
                notify::Severity::Error => "error",
            };
            eprintln!("[{tag}] {}", toast.message);
        }
    }
}
