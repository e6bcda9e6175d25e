//! Wire shapes of the REST API and their conversion into domain types.
//!
//! Decimal fields arrive either as JSON numbers or as strings (`"99.50"`);
//! both are accepted. Optional fields tolerate being absent or `null`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, Serializer};

use tradetrack_core::{InvoiceId, ProductId, UserId};
use tradetrack_invoicing::{InvoiceItem, PersistedInvoice, SubmissionPayload};
use tradetrack_products::Product;

pub(crate) mod decimal {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    fn parse<E: Error>(raw: Raw) -> Result<f64, E> {
        match raw {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid decimal '{s}'"))),
        }
    }

    pub fn required<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        parse(Raw::deserialize(d)?)
    }

    pub fn optional<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Option::<Raw>::deserialize(d)?.map(parse).transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductDto {
    pub id: ProductId,
    pub name: String,
    #[serde(deserialize_with = "decimal::required")]
    pub price: f64,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub stock: Option<u64>,
    #[serde(default)]
    pub hs_code: Option<String>,
    #[serde(default)]
    pub available_for_invoice: Option<bool>,
}

impl From<ProductDto> for Product {
    fn from(dto: ProductDto) -> Self {
        Product {
            id: dto.id,
            name: dto.name,
            price: dto.price,
            classification_code: dto.hs_code.filter(|c| !c.trim().is_empty()),
            stock: dto.stock,
            sku: dto.sku.filter(|s| !s.trim().is_empty()),
            available_for_invoice: dto.available_for_invoice.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvoiceItemDto {
    #[serde(default)]
    pub id: Option<u64>,
    pub product: ProductId,
    #[serde(default)]
    pub product_detail: Option<ProductDto>,
    #[serde(deserialize_with = "decimal::required")]
    pub quantity: f64,
    #[serde(deserialize_with = "decimal::required")]
    pub price: f64,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub line_total: Option<f64>,
}

impl From<InvoiceItemDto> for InvoiceItem {
    fn from(dto: InvoiceItemDto) -> Self {
        let line_total = dto.line_total.unwrap_or(dto.quantity * dto.price);
        InvoiceItem {
            product_id: dto.product,
            product: dto.product_detail.map(Product::from),
            quantity: dto.quantity,
            price: dto.price,
            line_total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvoiceDto {
    pub id: InvoiceId,
    #[serde(default)]
    pub invoice_no: Option<String>,
    #[serde(default)]
    pub created_by: Option<UserId>,
    /// Kept in the server's offset so printed dates match its calendar day.
    pub date: DateTime<FixedOffset>,
    #[serde(deserialize_with = "decimal::required")]
    pub total: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub items: Vec<InvoiceItemDto>,
    #[serde(default, deserialize_with = "decimal::optional")]
    pub subtotal: Option<f64>,
    #[serde(default, alias = "tax", deserialize_with = "decimal::optional")]
    pub tax_amount: Option<f64>,
}

impl From<InvoiceDto> for PersistedInvoice {
    fn from(dto: InvoiceDto) -> Self {
        PersistedInvoice {
            id: dto.id,
            invoice_no: dto.invoice_no.filter(|n| !n.is_empty()),
            created_at: dto.date,
            created_by: dto.created_by,
            status: dto.status,
            items: dto.items.into_iter().map(InvoiceItem::from).collect(),
            subtotal: dto.subtotal,
            tax: dto.tax_amount,
            total: dto.total,
        }
    }
}

/// Body of `POST /api/products/` and `PUT /api/products/<id>/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hs_code: Option<String>,
    /// Sent as a two-decimal string to match the backend's decimal field.
    #[serde(serialize_with = "price_text")]
    pub price: f64,
    pub stock: u64,
    pub available_for_invoice: bool,
}

impl ProductInput {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            sku: None,
            barcode: None,
            hs_code: None,
            price,
            stock: 0,
            available_for_invoice: true,
        }
    }
}

impl From<&Product> for ProductInput {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            sku: product.sku.clone(),
            barcode: None,
            hs_code: product.classification_code.clone(),
            price: product.price,
            stock: product.stock.unwrap_or(0),
            available_for_invoice: product.available_for_invoice,
        }
    }
}

fn price_text<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{value:.2}"))
}

/// List endpoints may or may not be paginated.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    Plain(Vec<T>),
    Page { results: Vec<T> },
}

impl<T> ListBody<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListBody::Plain(items) | ListBody::Page { results: items } => items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Body of `POST /api/invoices/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateInvoiceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub create_items: Vec<CreateInvoiceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateInvoiceItem {
    pub product: ProductId,
    /// The backend takes integer quantities; whole numbers go out as integers.
    #[serde(serialize_with = "quantity")]
    pub quantity: f64,
    pub price: f64,
}

fn quantity<S: Serializer>(value: &f64, s: S) -> Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT {
        s.serialize_i64(*value as i64)
    } else {
        s.serialize_f64(*value)
    }
}

impl From<&SubmissionPayload> for CreateInvoiceRequest {
    fn from(payload: &SubmissionPayload) -> Self {
        CreateInvoiceRequest {
            customer_name: payload.customer_name.clone(),
            note: payload.note.clone(),
            create_items: payload
                .lines
                .iter()
                .map(|line| CreateInvoiceItem {
                    product: line.product_id,
                    quantity: line.quantity,
                    price: line.unit_price,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tradetrack_invoicing::SubmissionLine;

    use super::*;

    #[test]
    fn product_price_as_string_or_number() {
        let a: ProductDto =
            serde_json::from_value(json!({"id": 1, "name": "Cotton bale", "price": "99.50"}))
                .unwrap();
        let b: ProductDto =
            serde_json::from_value(json!({"id": 1, "name": "Cotton bale", "price": 99.5})).unwrap();
        assert_eq!(a.price, 99.5);
        assert_eq!(a, b);
    }

    #[test]
    fn product_optional_fields_absent_or_null() {
        let dto: ProductDto = serde_json::from_value(json!({
            "id": 2, "name": "Tea chest", "price": "10.00",
            "sku": null, "stock": 40, "hs_code": "0902", "available_for_invoice": false
        }))
        .unwrap();
        let product = Product::from(dto);
        assert_eq!(product.sku, None);
        assert_eq!(product.stock, Some(40));
        assert_eq!(product.classification_code.as_deref(), Some("0902"));
        assert!(!product.available_for_invoice);

        let bare: ProductDto =
            serde_json::from_value(json!({"id": 3, "name": "Spice", "price": 1})).unwrap();
        assert!(Product::from(bare).available_for_invoice);
    }

    #[test]
    fn rejects_garbage_decimal() {
        let res: Result<ProductDto, _> =
            serde_json::from_value(json!({"id": 1, "name": "x", "price": "abc"}));
        assert!(res.is_err());
    }

    #[test]
    fn invoice_from_drf_body() {
        let dto: InvoiceDto = serde_json::from_value(json!({
            "id": 12,
            "invoice_no": "INV-20261019101500123456",
            "created_by": null,
            "date": "2026-10-19T10:15:00.123456Z",
            "total": "298.50",
            "status": "PAID",
            "items": [{
                "id": 31,
                "product": 5,
                "product_detail": {"id": 5, "name": "Basmati rice", "price": "99.50"},
                "quantity": 3,
                "price": "99.50",
                "line_total": "298.50"
            }]
        }))
        .unwrap();

        let invoice = PersistedInvoice::from(dto);
        assert_eq!(invoice.id, InvoiceId::new(12));
        assert_eq!(invoice.created_by, None);
        assert_eq!(invoice.total, 298.5);
        assert_eq!(invoice.items[0].description(), "Basmati rice");
        assert_eq!(invoice.effective_subtotal(), 298.5);
        assert_eq!(invoice.effective_tax(), 35.82);
    }

    #[test]
    fn invoice_date_keeps_server_offset() {
        let dto: InvoiceDto = serde_json::from_value(json!({
            "id": 13, "date": "2026-10-19T01:05:00+05:30", "total": 0
        }))
        .unwrap();
        let invoice = PersistedInvoice::from(dto);
        assert_eq!(invoice.created_at.format("%d/%m/%Y").to_string(), "19/10/2026");
        assert_eq!(invoice.created_at.offset().local_minus_utc(), 19_800);
    }

    #[test]
    fn product_input_shape() {
        let mut input = ProductInput::new("Saffron", 350.0);
        input.sku = Some("SAF-1".to_string());
        input.stock = 12;

        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "Saffron", "sku": "SAF-1", "price": "350.00",
                "stock": 12, "available_for_invoice": true
            })
        );
    }

    #[test]
    fn product_input_from_snapshot() {
        let dto: ProductDto = serde_json::from_value(json!({
            "id": 2, "name": "Tea chest", "price": "10.50", "stock": 4,
            "hs_code": "0902", "available_for_invoice": false
        }))
        .unwrap();
        let input = ProductInput::from(&Product::from(dto));
        assert_eq!(input.hs_code.as_deref(), Some("0902"));
        assert_eq!(input.stock, 4);
        assert!(!input.available_for_invoice);
        assert_eq!(serde_json::to_value(&input).unwrap()["price"], json!("10.50"));
    }

    #[test]
    fn paginated_and_plain_lists() {
        let plain: ListBody<TokenResponse> =
            serde_json::from_value(json!([{"token": "a"}])).unwrap();
        let page: ListBody<TokenResponse> =
            serde_json::from_value(json!({"count": 1, "results": [{"token": "b"}]})).unwrap();
        assert_eq!(plain.into_items()[0].token, "a");
        assert_eq!(page.into_items()[0].token, "b");
    }

    #[test]
    fn create_request_shape() {
        let payload = SubmissionPayload {
            customer_name: None,
            note: Some("Deliver by Friday".to_string()),
            lines: vec![
                SubmissionLine {
                    product_id: ProductId::new(1),
                    quantity: 2.0,
                    unit_price: 100.0,
                },
                SubmissionLine {
                    product_id: ProductId::new(2),
                    quantity: 1.5,
                    unit_price: 9.99,
                },
            ],
        };

        let body = serde_json::to_value(CreateInvoiceRequest::from(&payload)).unwrap();
        assert_eq!(
            body,
            json!({
                "note": "Deliver by Friday",
                "create_items": [
                    {"product": 1, "quantity": 2, "price": 100.0},
                    {"product": 2, "quantity": 1.5, "price": 9.99}
                ]
            })
        );
    }
}
