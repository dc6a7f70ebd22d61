//! CLI command implementations.

pub mod cart;
pub mod checkout;

use std::path::Path;
use std::sync::Arc;

use eazika_storefront::cart::{CatalogError, ProductCatalogIndex};
use eazika_storefront::checkout::SavedInstrument;
use eazika_storefront::config::{StorefrontConfig, token_hint};
use eazika_storefront::gateway::HttpCartGateway;
use eazika_storefront::{CartError, CartSession};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// The catalog snapshot could not be loaded.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The cart engine rejected the operation.
    #[error("{}", .0.user_message())]
    Cart(#[from] CartError),

    /// The intent file could not be read.
    #[error("Failed to read intent file: {0}")]
    IntentRead(#[from] std::io::Error),

    /// The intent file is not valid YAML of the expected shape.
    #[error("Invalid intent file: {0}")]
    IntentParse(#[from] serde_yaml::Error),
}

/// Build a session against the configured backend.
pub async fn connect(
    config: &StorefrontConfig,
    catalog_path: Option<&Path>,
    saved_instruments: Vec<SavedInstrument>,
) -> Result<CartSession, CliError> {
    let catalog = match catalog_path {
        Some(path) => ProductCatalogIndex::load(path).await?,
        None => {
            tracing::warn!("No catalog configured; products will show as placeholders");
            ProductCatalogIndex::empty()
        }
    };

    match &config.api.access_token {
        Some(token) => tracing::debug!(
            api = %config.api.base_url,
            token = %token_hint(token),
            "Using customer token"
        ),
        None => tracing::warn!("EAZIKA_API_TOKEN not set; the backend will treat you as signed out"),
    }

    Ok(CartSession::new(
        Arc::new(HttpCartGateway::new(&config.api)),
        Arc::new(catalog),
        saved_instruments,
    ))
}
