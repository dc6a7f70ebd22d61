//! Product catalog index used for the display join.
//!
//! Built once from a catalog snapshot and never mutated. Lookups are total: a
//! product missing from the snapshot resolves to placeholder metadata with a
//! zero price.

use std::collections::HashMap;
use std::path::Path;

use eazika_core::{Price, ProductDisplayMetadata, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors loading a catalog snapshot.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The snapshot file could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot is not valid YAML/JSON of the expected shape.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// One product in a catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub product_ref: ProductId,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub price: Price,
}

/// A point-in-time copy of the product catalog.
///
/// Deserialises from YAML or JSON:
///
/// ```yaml
/// products:
///   - productRef: 1
///     name: Alphonso Mangoes (1kg)
///     imageUrl: https://cdn.eazika.com/p/1.jpg
///     price: 50
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub products: Vec<CatalogEntry>,
}

/// Immutable lookup from product reference to display metadata.
#[derive(Debug, Clone)]
pub struct ProductCatalogIndex {
    entries: HashMap<ProductId, ProductDisplayMetadata>,
    placeholder: ProductDisplayMetadata,
}

impl Default for ProductCatalogIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl ProductCatalogIndex {
    /// An index with no products; every lookup yields the placeholder.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            placeholder: ProductDisplayMetadata::placeholder(),
        }
    }

    /// Build the index from a snapshot. Later duplicates replace earlier ones.
    #[must_use]
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let entries = snapshot
            .products
            .into_iter()
            .map(|entry| {
                let metadata = ProductDisplayMetadata {
                    name: entry.name,
                    image_url: entry
                        .image_url
                        .filter(|url| !url.trim().is_empty())
                        .unwrap_or_else(|| ProductDisplayMetadata::PLACEHOLDER_IMAGE.to_string()),
                    unit_price: entry.price,
                };
                (entry.product_ref, metadata)
            })
            .collect();

        Self {
            entries,
            placeholder: ProductDisplayMetadata::placeholder(),
        }
    }

    /// Parse a YAML or JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid snapshot.
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let snapshot: CatalogSnapshot = serde_yaml::from_str(text)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Load a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = tokio::fs::read_to_string(path).await?;
        let index = Self::from_yaml_str(&text)?;
        debug!(products = index.len(), "Loaded catalog snapshot");
        Ok(index)
    }

    /// Display metadata for a product, or the placeholder on a miss.
    #[must_use]
    pub fn metadata(&self, product: ProductId) -> &ProductDisplayMetadata {
        self.entries.get(&product).unwrap_or(&self.placeholder)
    }

    /// Whether the product is in the snapshot.
    #[must_use]
    pub fn contains(&self, product: ProductId) -> bool {
        self.entries.contains_key(&product)
    }

    /// Number of products in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r"
products:
  - productRef: 1
    name: Alphonso Mangoes
    imageUrl: https://cdn.eazika.com/p/1.jpg
    price: 50
  - productRef: 2
    name: Basmati Rice
    price: '100.50'
";

    #[test]
    fn test_lookup_hit() {
        let index = ProductCatalogIndex::from_yaml_str(SNAPSHOT).unwrap();
        let mango = index.metadata(ProductId::new(1));
        assert_eq!(mango.name, "Alphonso Mangoes");
        assert_eq!(mango.unit_price, Price::from_units(50));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_missing_image_uses_placeholder_image() {
        let index = ProductCatalogIndex::from_yaml_str(SNAPSHOT).unwrap();
        let rice = index.metadata(ProductId::new(2));
        assert_eq!(rice.image_url, ProductDisplayMetadata::PLACEHOLDER_IMAGE);
        assert_eq!(rice.unit_price.to_string(), "100.50");
    }

    #[test]
    fn test_lookup_miss_returns_placeholder() {
        let index = ProductCatalogIndex::from_yaml_str(SNAPSHOT).unwrap();
        assert!(!index.contains(ProductId::new(99)));
        assert_eq!(
            index.metadata(ProductId::new(99)),
            &ProductDisplayMetadata::placeholder()
        );
    }

    #[test]
    fn test_json_snapshot_is_accepted() {
        let json = r#"{"products":[{"productRef":3,"name":"Ghee","price":450}]}"#;
        let index = ProductCatalogIndex::from_yaml_str(json).unwrap();
        assert_eq!(index.metadata(ProductId::new(3)).name, "Ghee");
    }

    #[test]
    fn test_duplicate_refs_last_wins() {
        let snapshot = CatalogSnapshot {
            products: vec![
                CatalogEntry {
                    product_ref: ProductId::new(1),
                    name: "Old".to_string(),
                    image_url: None,
                    price: Price::from_units(1),
                },
                CatalogEntry {
                    product_ref: ProductId::new(1),
                    name: "New".to_string(),
                    image_url: None,
                    price: Price::from_units(2),
                },
            ],
        };
        let index = ProductCatalogIndex::from_snapshot(snapshot);
        assert_eq!(index.len(), 1);
        assert_eq!(index.metadata(ProductId::new(1)).name, "New");
    }

    #[test]
    fn test_invalid_snapshot_is_parse_error() {
        let err = ProductCatalogIndex::from_yaml_str("products: 12").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let err = ProductCatalogIndex::load(Path::new("/nonexistent/catalog.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
