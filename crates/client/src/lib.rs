//! `tradetrack-client` — typed client for the TradeTrack REST API.
//!
//! Wraps the backend's auth, product, invoice and report endpoints. Every
//! call returns `Result<_, ApiError>`; nothing here panics on a bad response.

pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod reports;

pub use client::{ApiClient, LoginError};
pub use config::{ApiConfig, ConfigError};
pub use dto::ProductInput;
pub use error::classify_response;
pub use reports::{
    DailySales, InvoiceSummary, InvoicesReport, MonthlySales, ProductSales, ReportRange,
    SalesReport, UserSales,
};
