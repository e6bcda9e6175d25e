//! Invoicing module: the draft invoice line model.
//!
//! Everything here is deterministic domain logic over an in-memory draft
//! (no HTTP, no storage). Remote submission and product loading are reached
//! through the [`InvoiceGateway`] and [`tradetrack_products::ProductSource`]
//! traits, and printing through [`DocumentRenderer`].

pub mod document;
pub mod draft;
pub mod editor;
pub mod line;
pub mod payload;
pub mod persisted;
pub mod validation;

pub use document::{
    CompanyLetterhead, DocumentHeader, DocumentRenderer, DocumentRow, HtmlRenderer,
    PrintableDocument, RenderError,
};
pub use draft::{DraftInvoice, InvoiceTotals};
pub use editor::{
    Delivery, DraftId, EditorError, EditorState, InvoiceEditor, InvoiceGateway, Notice,
    NoticeKind, RequestKind, RequestTicket,
};
pub use line::{LineField, LineItem};
pub use payload::{SubmissionLine, SubmissionPayload};
pub use persisted::{InvoiceItem, PersistedInvoice};
pub use validation::{LineValidationError, ValidationMarks, validate_lines};
