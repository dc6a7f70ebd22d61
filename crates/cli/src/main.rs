//! Eazika CLI - inspect and edit a customer's cart, place orders.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart with totals
//! eazika cart show
//!
//! # Add two units of product 9 (price variant 1)
//! eazika cart add --product 9 --price-variant 1 --quantity 2
//!
//! # Change or remove a line item
//! eazika cart update 7 3
//! eazika cart remove 7
//!
//! # Place an order described by a YAML intent file
//! eazika checkout --intent order.yaml
//! ```
//!
//! # Environment Variables
//!
//! See `eazika_storefront::config`. `LOG_FORMAT=json` switches to JSON logs.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eazika_core::{LineItemId, PriceVariantId, ProductId};
use eazika_storefront::config::StorefrontConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "eazika")]
#[command(author, version, about = "Eazika cart and checkout tools")]
struct Cli {
    /// Catalog snapshot (YAML/JSON); overrides `EAZIKA_CATALOG_PATH`
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart (or a selection of it)
    Checkout {
        /// YAML file with address, payment and optional selection
        #[arg(short, long)]
        intent: PathBuf,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show line items, count and total
    Show,
    /// Add a product to the cart
    Add {
        /// Product reference
        #[arg(short, long)]
        product: i64,

        /// Price variant reference
        #[arg(long)]
        price_variant: i64,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a line item
    Remove {
        /// Line item id
        id: i64,
    },
    /// Set a line item's quantity (values below 1 are ignored)
    Update {
        /// Line item id
        id: i64,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove every line item
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "eazika_storefront=info,eazika_cli=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), commands::CliError> {
    let catalog = cli.catalog.or_else(|| config.catalog_path.clone());

    match cli.command {
        Commands::Cart { action } => {
            let session = commands::connect(&config, catalog.as_deref(), Vec::new()).await?;
            match action {
                CartAction::Show => commands::cart::show(&session).await,
                CartAction::Add {
                    product,
                    price_variant,
                    quantity,
                } => {
                    commands::cart::add(
                        &session,
                        ProductId::new(product),
                        PriceVariantId::new(price_variant),
                        quantity,
                    )
                    .await?;
                }
                CartAction::Remove { id } => {
                    commands::cart::remove(&session, LineItemId::new(id)).await?;
                }
                CartAction::Update { id, quantity } => {
                    commands::cart::update(&session, LineItemId::new(id), quantity).await?;
                }
                CartAction::Clear => commands::cart::clear(&session).await,
            }
        }
        Commands::Checkout { intent } => {
            commands::checkout::place_order(&config, catalog.as_deref(), &intent).await?;
        }
    }
    Ok(())
}
