use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tradetrack_core::{ApiError, ProductId, format_inr};

/// Product as seen by the invoicing UI (read-only snapshot of catalog data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price in currency units.
    pub price: f64,
    /// Customs/tariff classification (HS code).
    pub classification_code: Option<String>,
    pub stock: Option<u64>,
    pub sku: Option<String>,
    /// Whether the product is offered in the invoice product selector.
    pub available_for_invoice: bool,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            classification_code: None,
            stock: None,
            sku: None,
            available_for_invoice: true,
        }
    }

    pub fn with_classification_code(mut self, code: impl Into<String>) -> Self {
        self.classification_code = Some(code.into());
        self
    }

    pub fn with_stock(mut self, stock: u64) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Label shown in the product selector (`"Widget - ₹1,200.00"`).
    pub fn option_label(&self) -> String {
        format!("{} - {}", self.name, format_inr(self.price))
    }
}

/// Resolve a product identifier against reference data.
///
/// Absence is an ordinary answer ("no product"), never an error.
pub trait ProductLookup {
    fn lookup(&self, id: ProductId) -> Option<&Product>;
}

/// Remote source of catalog data.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetch the catalog; `for_invoice` restricts it to invoice-selectable products.
    async fn fetch_products(&self, for_invoice: bool) -> Result<Vec<Product>, ApiError>;

    /// Fetch one product. A product that no longer exists is `Ok(None)`.
    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, ApiError>;
}

/// Read-only catalog snapshot held for the duration of an editing session.
///
/// Keeps the order the API returned (selector order) and an id index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductCatalog {
    products: Vec<Product>,
    by_id: HashMap<ProductId, usize>,
}

impl ProductCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        let mut by_id = HashMap::with_capacity(products.len());
        for (idx, product) in products.iter().enumerate() {
            if by_id.insert(product.id, idx).is_some() {
                tracing::warn!(product_id = %product.id, "duplicate product in catalog snapshot; keeping the last one");
            }
        }
        Self { products, by_id }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    /// Products offered in the invoice selector, in catalog order.
    pub fn selectable(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.available_for_invoice)
    }
}

impl ProductLookup for ProductCatalog {
    fn lookup(&self, id: ProductId) -> Option<&Product> {
        self.by_id.get(&id).map(|&idx| &self.products[idx])
    }
}

impl ProductLookup for [Product] {
    fn lookup(&self, id: ProductId) -> Option<&Product> {
        self.iter().find(|p| p.id == id)
    }
}

impl FromIterator<Product> for ProductCatalog {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
