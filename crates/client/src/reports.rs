use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tradetrack_core::{InvoiceId, ProductId, UserId};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Optional inclusive date window for report queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ReportRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn all() -> Self {
        Self::default()
    }

    /// `start_date`/`end_date` query pairs for the dates that are set.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(start) = self.start {
            pairs.push(("start_date", start.format(DATE_FORMAT).to_string()));
        }
        if let Some(end) = self.end {
            pairs.push(("end_date", end.format(DATE_FORMAT).to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSales {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub total_quantity: u64,
    #[serde(default)]
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSales {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub total_sales: f64,
    #[serde(default)]
    pub invoice_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySales {
    pub year: i32,
    pub month: u32,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub sales: f64,
}

/// Body of `GET /api/reports/sales/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesReport {
    pub total_sales: f64,
    pub invoice_count: u64,
    #[serde(default)]
    pub sales_by_product: Vec<ProductSales>,
    #[serde(default)]
    pub sales_by_user: Vec<UserSales>,
    #[serde(default)]
    pub top_products: Vec<ProductSales>,
    #[serde(default)]
    pub monthly_sales_last_12: Vec<MonthlySales>,
    #[serde(default)]
    pub daily_sales_last_30: Vec<DailySales>,
}

impl SalesReport {
    /// Mean invoice value, zero when there are no invoices.
    pub fn average_invoice(&self) -> f64 {
        if self.invoice_count == 0 {
            0.0
        } else {
            self.total_sales / self.invoice_count as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub id: InvoiceId,
    #[serde(default)]
    pub invoice_no: Option<String>,
    pub date: DateTime<Utc>,
    /// Username of the creator.
    #[serde(default)]
    pub created_by: Option<String>,
    pub total: f64,
    #[serde(default)]
    pub item_count: u64,
}

/// Body of `GET /api/reports/invoices/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicesReport {
    pub invoices: Vec<InvoiceSummary>,
    pub count: u64,
}
