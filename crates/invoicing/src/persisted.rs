use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use tradetrack_core::money::{or_zero, round_to_cents};
use tradetrack_core::{InvoiceId, ProductId, TAX_RATE, UserId};
use tradetrack_products::Product;

/// Immutable line of an invoice accepted by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceItem {
    pub product_id: ProductId,
    /// Product as resolved by the server, when it sent one.
    pub product: Option<Product>,
    pub quantity: f64,
    pub price: f64,
    /// Line total as computed by the server.
    pub line_total: f64,
}

impl InvoiceItem {
    /// Product name if resolved, otherwise the bare product id.
    pub fn description(&self) -> String {
        match &self.product {
            Some(product) => product.name.clone(),
            None => self.product_id.to_string(),
        }
    }
}

/// Invoice as stored by the API. Read-only from the client's point of view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedInvoice {
    pub id: InvoiceId,
    pub invoice_no: Option<String>,
    /// Creation time with the offset the server reported it in.
    pub created_at: DateTime<FixedOffset>,
    pub created_by: Option<UserId>,
    pub status: Option<String>,
    pub items: Vec<InvoiceItem>,
    /// Server subtotal, when reported.
    pub subtotal: Option<f64>,
    /// Server tax, when reported.
    pub tax: Option<f64>,
    pub total: f64,
}

impl PersistedInvoice {
    /// Invoice number for display (`"—"` when the server assigned none).
    pub fn display_number(&self) -> &str {
        self.invoice_no.as_deref().unwrap_or("—")
    }

    /// Server subtotal, or the sum of the server's line totals.
    pub fn effective_subtotal(&self) -> f64 {
        self.subtotal
            .unwrap_or_else(|| self.items.iter().map(|item| or_zero(item.line_total)).sum())
    }

    /// Server tax, or the flat rate on the subtotal rounded to cents.
    pub fn effective_tax(&self) -> f64 {
        self.tax
            .unwrap_or_else(|| round_to_cents(self.effective_subtotal() * TAX_RATE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn invoice(items: Vec<InvoiceItem>) -> PersistedInvoice {
        PersistedInvoice {
            id: InvoiceId::new(9),
            invoice_no: Some("INV-20261019101500123456".to_string()),
            created_at: Utc::now().fixed_offset(),
            created_by: Some(UserId::new(3)),
            status: Some("PAID".to_string()),
            items,
            subtotal: None,
            tax: None,
            total: 0.0,
        }
    }

    fn item(product: Option<Product>, quantity: f64, price: f64) -> InvoiceItem {
        InvoiceItem {
            product_id: ProductId::new(4),
            product,
            quantity,
            price,
            line_total: quantity * price,
        }
    }

    #[test]
    fn description_falls_back_to_product_id() {
        let named = item(Some(Product::new(ProductId::new(4), "Jute sack", 12.0)), 1.0, 12.0);
        assert_eq!(named.description(), "Jute sack");
        assert_eq!(item(None, 1.0, 12.0).description(), "4");
    }

    #[test]
    fn derives_missing_totals_from_items() {
        let inv = invoice(vec![item(None, 2.0, 10.25), item(None, 1.0, 5.0)]);
        assert_eq!(inv.effective_subtotal(), 25.5);
        assert_eq!(inv.effective_tax(), 3.06);
    }

    #[test]
    fn prefers_server_totals() {
        let mut inv = invoice(vec![item(None, 2.0, 10.0)]);
        inv.subtotal = Some(18.0);
        inv.tax = Some(2.0);
        assert_eq!(inv.effective_subtotal(), 18.0);
        assert_eq!(inv.effective_tax(), 2.0);
    }

    #[test]
    fn display_number_placeholder() {
        let mut inv = invoice(vec![]);
        inv.invoice_no = None;
        assert_eq!(inv.display_number(), "—");
    }
}
