use serde::Serialize;

use tradetrack_core::ProductId;

/// One line of an invoice submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionLine {
    pub product_id: ProductId,
    pub quantity: f64,
    pub unit_price: f64,
}

/// Everything the API needs to create an invoice from a draft.
///
/// All-or-nothing: the payload is sent as a whole or not at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    pub customer_name: Option<String>,
    pub note: Option<String>,
    pub lines: Vec<SubmissionLine>,
}

impl SubmissionPayload {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
