//! Printable projection of an invoice and the rendering seam.
//!
//! Projecting a draft or persisted invoice into a [`PrintableDocument`] is
//! pure. Turning the document into bytes (PDF, HTML, a print job) is the job
//! of an injected [`DocumentRenderer`].

use askama::Template;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use tradetrack_core::money::or_zero;
use tradetrack_core::{format_amount, format_inr};

use crate::draft::{DraftInvoice, InvoiceTotals};
use crate::persisted::PersistedInvoice;

/// Invoice number printed on drafts.
pub const DRAFT_NUMBER: &str = "DRAFT";

const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentHeader {
    pub invoice_no: String,
    pub date: String,
    pub bill_to: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRow {
    pub description: String,
    pub quantity: f64,
    pub price: f64,
    pub amount: f64,
}

/// Renderer-agnostic description of a printable invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintableDocument {
    pub header: DocumentHeader,
    pub rows: Vec<DocumentRow>,
    pub totals: InvoiceTotals,
}

impl PrintableDocument {
    /// Project the draft as it currently stands, dated `date`.
    pub fn from_draft(draft: &DraftInvoice, date: NaiveDate) -> Self {
        let rows = draft
            .lines()
            .iter()
            .map(|line| DocumentRow {
                description: line.description.clone(),
                quantity: or_zero(line.quantity),
                price: or_zero(line.unit_price),
                amount: line.display_total(),
            })
            .collect();

        let customer = draft.customer_name().trim();
        Self {
            header: DocumentHeader {
                invoice_no: DRAFT_NUMBER.to_string(),
                date: date.format(DATE_FORMAT).to_string(),
                bill_to: if customer.is_empty() { "—".to_string() } else { customer.to_string() },
                note: draft.note().map(str::to_string),
            },
            rows,
            totals: draft.totals(),
        }
    }

    /// Project an invoice accepted by the API, using its server-side amounts.
    ///
    /// The date is the calendar day in the offset the server reported.
    pub fn from_persisted(invoice: &PersistedInvoice) -> Self {
        let rows = invoice
            .items
            .iter()
            .map(|item| DocumentRow {
                description: item.description(),
                quantity: item.quantity,
                price: item.price,
                amount: item.line_total,
            })
            .collect();

        Self {
            header: DocumentHeader {
                invoice_no: invoice.display_number().to_string(),
                date: invoice.created_at.date_naive().format(DATE_FORMAT).to_string(),
                bill_to: invoice
                    .created_by
                    .map(|user| user.to_string())
                    .unwrap_or_else(|| "—".to_string()),
                note: None,
            },
            rows,
            totals: InvoiceTotals {
                subtotal: invoice.effective_subtotal(),
                tax: invoice.effective_tax(),
                total: invoice.total,
            },
        }
    }

    pub fn is_draft(&self) -> bool {
        self.header.invoice_no == DRAFT_NUMBER
    }

    /// File name for the exported document, safe on common filesystems.
    pub fn file_name(&self) -> String {
        let number = if self.header.invoice_no.is_empty() {
            "draft"
        } else {
            self.header.invoice_no.as_str()
        };
        let safe: String = number
            .chars()
            .map(|c| match c {
                '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                other => other,
            })
            .collect();
        format!("Invoice_{safe}.pdf")
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to render template: {0}")]
    Template(#[from] askama::Error),

    /// Reported by an external rendering engine.
    #[error("renderer failed: {0}")]
    Backend(String),
}

/// Capability that turns a [`PrintableDocument`] into an output artifact.
pub trait DocumentRenderer {
    type Output;

    fn render(&self, document: &PrintableDocument) -> Result<Self::Output, RenderError>;
}

/// Seller details printed at the top of every invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyLetterhead {
    pub name: String,
    pub address: String,
    pub tax_registration: String,
    pub contact: String,
    pub bank_details: String,
}

impl Default for CompanyLetterhead {
    fn default() -> Self {
        Self {
            name: "TradeTrack Exports Pvt. Ltd.".to_string(),
            address: "123 Business Park, Andheri East, Mumbai 400099".to_string(),
            tax_registration: "GSTIN: 27AAACT1234A1Z5".to_string(),
            contact: "Email: info@tradetrack.com | Phone: +91-22-12345678".to_string(),
            bank_details: "Bank: Axis Bank | A/C: 1234567890 | IFSC: AXIS0001234".to_string(),
        }
    }
}

/// Renders a self-contained HTML page suitable for the browser's print dialog.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    letterhead: CompanyLetterhead,
}

impl HtmlRenderer {
    pub fn new(letterhead: CompanyLetterhead) -> Self {
        Self { letterhead }
    }
}

struct HtmlRow<'a> {
    description: &'a str,
    quantity: f64,
    price: String,
    amount: String,
}

#[derive(Template)]
#[template(path = "invoice.html")]
struct InvoicePage<'a> {
    company: &'a CompanyLetterhead,
    header: &'a DocumentHeader,
    rows: Vec<HtmlRow<'a>>,
    note: &'a str,
    subtotal: String,
    tax: String,
    total: String,
}

impl<'a> InvoicePage<'a> {
    fn new(company: &'a CompanyLetterhead, document: &'a PrintableDocument) -> Self {
        let rows = document
            .rows
            .iter()
            .map(|row| HtmlRow {
                description: &row.description,
                quantity: row.quantity,
                price: format_inr(row.price),
                amount: format_inr(row.amount),
            })
            .collect();

        Self {
            company,
            header: &document.header,
            rows,
            note: document.header.note.as_deref().unwrap_or_default(),
            subtotal: format_amount(document.totals.subtotal),
            tax: format_amount(document.totals.tax),
            total: format_inr(document.totals.total),
        }
    }
}

impl DocumentRenderer for HtmlRenderer {
    type Output = String;

    fn render(&self, document: &PrintableDocument) -> Result<String, RenderError> {
        Ok(InvoicePage::new(&self.letterhead, document).render()?)
    }
}
