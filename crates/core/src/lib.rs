//! `tradetrack-core` — shared building blocks for the invoicing workspace.
//!
//! This crate contains **pure** primitives (no IO): identifiers, the error
//! taxonomy shared by the model and the API client, and number handling.

pub mod error;
pub mod id;
pub mod money;

pub use error::{ApiError, DomainError, DomainResult, FieldErrors};
pub use id::{InvoiceId, ProductId, UserId};
pub use money::{TAX_RATE, compute_tax, compute_total, format_amount, format_inr};
