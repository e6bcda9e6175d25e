//! Draft editing session: drives a draft from first edit to persisted invoice.
//!
//! States:
//!
//! - `Editing` → submit with invalid lines → `EditingWithErrors`
//! - `Editing`/`EditingWithErrors` → submit → `Submitting`
//! - `Submitting` → API accepts → `Submitted` (terminal)
//! - `Submitting` → API rejects → back to editing, draft untouched
//!
//! Network calls happen outside the editor. Each one is issued against a
//! [`RequestTicket`]; a result is only applied if its ticket is still the
//! pending one for this draft, so responses that arrive after the session
//! was closed (or superseded) are dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use tradetrack_core::{ApiError, ProductId};
use tradetrack_products::{Product, ProductCatalog, ProductLookup, ProductSource};

use crate::draft::DraftInvoice;
use crate::payload::SubmissionPayload;
use crate::persisted::PersistedInvoice;
use crate::validation::LineValidationError;

/// Remote endpoint that turns a submission into a persisted invoice.
#[async_trait]
pub trait InvoiceGateway: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<PersistedInvoice, ApiError>;
}

/// Identity of one editing session (one draft).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(Uuid);

impl DraftId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for DraftId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for DraftId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Submission,
    CatalogLoad,
}

/// Handle for one in-flight request issued by an editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    draft_id: DraftId,
    seq: u64,
    kind: RequestKind,
}

impl RequestTicket {
    pub fn draft_id(&self) -> DraftId {
        self.draft_id
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }
}

/// Whether a request result was applied to the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied,
    /// The ticket no longer matches the active request; the result was dropped.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    Editing,
    EditingWithErrors,
    Submitting,
    Submitted(PersistedInvoice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// User-visible message produced by the last operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EditorError {
    #[error(transparent)]
    Invalid(#[from] LineValidationError),

    #[error("a submission for this invoice is already in progress")]
    SubmissionInFlight,

    #[error("invoice has already been submitted")]
    AlreadySubmitted,

    #[error("editing session is closed")]
    Closed,

    #[error(transparent)]
    Rejected(#[from] ApiError),

    #[error("request result was discarded because the session moved on")]
    Stale,
}

/// One draft invoice and everything the editing page tracks around it.
#[derive(Debug)]
pub struct InvoiceEditor {
    id: DraftId,
    draft: DraftInvoice,
    catalog: ProductCatalog,
    state: EditorState,
    notice: Option<Notice>,
    next_seq: u64,
    pending_submission: Option<RequestTicket>,
    pending_catalog: Option<RequestTicket>,
    catalog_needs_refresh: bool,
    closed: bool,
}

impl Default for InvoiceEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceEditor {
    pub fn new() -> Self {
        Self::with_draft(DraftInvoice::new())
    }

    pub fn with_draft(draft: DraftInvoice) -> Self {
        Self {
            id: DraftId::new(),
            draft,
            catalog: ProductCatalog::empty(),
            state: EditorState::Editing,
            notice: None,
            next_seq: 0,
            pending_submission: None,
            pending_catalog: None,
            catalog_needs_refresh: true,
            closed: false,
        }
    }

    pub fn id(&self) -> DraftId {
        self.id
    }

    pub fn draft(&self) -> &DraftInvoice {
        &self.draft
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// True until a catalog has been loaded, and again after the server
    /// reported a referenced resource as gone.
    pub fn catalog_needs_refresh(&self) -> bool {
        self.catalog_needs_refresh
    }

    /// The accepted invoice, once submission succeeded.
    pub fn persisted(&self) -> Option<&PersistedInvoice> {
        match &self.state {
            EditorState::Submitted(invoice) => Some(invoice),
            _ => None,
        }
    }

    /// Apply an edit to the draft.
    ///
    /// Refused once the invoice was submitted or the session closed. Edits
    /// while a submission is in flight are allowed (last write wins); the
    /// payload already sent is unaffected.
    pub fn edit<R>(&mut self, edit: impl FnOnce(&mut DraftInvoice) -> R) -> Result<R, EditorError> {
        self.ensure_editable()?;
        let out = edit(&mut self.draft);
        if self.state == EditorState::EditingWithErrors && self.draft.marks().is_empty() {
            self.state = EditorState::Editing;
        }
        Ok(out)
    }

    /// Select a product for line `index` from the loaded catalog.
    pub fn select_product(&mut self, index: usize, id: Option<ProductId>) -> Result<bool, EditorError> {
        self.ensure_editable()?;
        let product: Option<Product> = id.and_then(|id| {
            let found = self.catalog.lookup(id).cloned();
            if found.is_none() {
                tracing::warn!(draft_id = %self.id, product_id = %id, "product not in catalog; clearing line");
            }
            found
        });
        self.edit(|draft| draft.select_product(index, product.as_ref()))
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Start loading the product catalog.
    pub fn begin_catalog_load(&mut self) -> Result<RequestTicket, EditorError> {
        if self.closed {
            return Err(EditorError::Closed);
        }
        let ticket = self.issue(RequestKind::CatalogLoad);
        self.pending_catalog = Some(ticket);
        Ok(ticket)
    }

    /// Apply the outcome of a catalog load.
    ///
    /// On failure the previous snapshot (possibly empty) stays in place and
    /// the error is posted as a notice; selections against the old snapshot
    /// resolve to "no product".
    pub fn complete_catalog_load(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<Product>, ApiError>,
    ) -> Delivery {
        if self.closed || self.pending_catalog != Some(ticket) {
            tracing::debug!(draft_id = %self.id, "dropping stale catalog result");
            return Delivery::Stale;
        }
        self.pending_catalog = None;

        match result {
            Ok(products) => {
                tracing::info!(draft_id = %self.id, products = products.len(), "catalog loaded");
                self.catalog = ProductCatalog::new(products);
                self.catalog_needs_refresh = false;
            }
            Err(err) => {
                tracing::warn!(draft_id = %self.id, error = %err, "failed to load products");
                self.notice = Some(Notice::error(err.user_message()));
            }
        }
        Delivery::Applied
    }

    /// Validate the draft and, if it passes, move to `Submitting`.
    ///
    /// Returns the ticket to complete the submission with and the payload to
    /// send. Validation failures mark the offending lines and never reach the
    /// network.
    pub fn begin_submit(&mut self) -> Result<(RequestTicket, SubmissionPayload), EditorError> {
        if self.state == EditorState::Submitting {
            return Err(EditorError::SubmissionInFlight);
        }
        self.ensure_editable()?;

        if let Err(err) = self.draft.validate() {
            self.state = EditorState::EditingWithErrors;
            self.notice = Some(Notice::error(err.to_string()));
            return Err(err.into());
        }

        let payload = self.draft.to_submission_payload();
        let ticket = self.issue(RequestKind::Submission);
        self.pending_submission = Some(ticket);
        self.state = EditorState::Submitting;
        self.notice = None;
        tracing::info!(draft_id = %self.id, lines = payload.lines.len(), "submitting invoice");
        Ok((ticket, payload))
    }

    /// Apply the API's answer to a submission.
    ///
    /// Failures leave the draft exactly as it was so the user can retry.
    pub fn complete_submit(
        &mut self,
        ticket: RequestTicket,
        result: Result<PersistedInvoice, ApiError>,
    ) -> Delivery {
        if self.closed || self.pending_submission != Some(ticket) {
            tracing::debug!(draft_id = %self.id, "dropping stale submission result");
            return Delivery::Stale;
        }
        self.pending_submission = None;

        match result {
            Ok(invoice) => {
                tracing::info!(draft_id = %self.id, invoice_id = %invoice.id, "invoice created");
                self.notice = Some(Notice::success("Invoice created"));
                self.state = EditorState::Submitted(invoice);
            }
            Err(err) => {
                tracing::warn!(draft_id = %self.id, error = %err, "invoice submission failed");
                if matches!(err, ApiError::NotFound { .. }) {
                    self.catalog_needs_refresh = true;
                }
                self.notice = Some(Notice::error(format!(
                    "Failed to create invoice: {}",
                    err.user_message()
                )));
                self.state = if self.draft.marks().is_empty() {
                    EditorState::Editing
                } else {
                    EditorState::EditingWithErrors
                };
            }
        }
        Delivery::Applied
    }

    /// Validate, submit through `gateway`, and apply the result.
    pub async fn submit<G>(&mut self, gateway: &G) -> Result<&PersistedInvoice, EditorError>
    where
        G: InvoiceGateway + ?Sized,
    {
        let (ticket, payload) = self.begin_submit()?;
        let result = gateway.submit(&payload).await;
        let failure = result.as_ref().err().cloned();

        if self.complete_submit(ticket, result) == Delivery::Stale {
            return Err(EditorError::Stale);
        }
        if let Some(err) = failure {
            return Err(EditorError::Rejected(err));
        }
        self.persisted().ok_or(EditorError::Stale)
    }

    /// Fetch the invoice-selectable catalog from `source` and apply it.
    pub async fn load_catalog<S>(&mut self, source: &S) -> Result<usize, EditorError>
    where
        S: ProductSource + ?Sized,
    {
        let ticket = self.begin_catalog_load()?;
        let result = source.fetch_products(true).await;
        let failure = result.as_ref().err().cloned();

        if self.complete_catalog_load(ticket, result) == Delivery::Stale {
            return Err(EditorError::Stale);
        }
        match failure {
            Some(err) => Err(EditorError::Rejected(err)),
            None => Ok(self.catalog.len()),
        }
    }

    /// Tear the session down (navigation away). Outstanding results are
    /// dropped when they arrive.
    pub fn close(&mut self) {
        if !self.closed {
            tracing::debug!(draft_id = %self.id, "closing editing session");
        }
        self.closed = true;
        self.pending_submission = None;
        self.pending_catalog = None;
    }

    fn ensure_editable(&self) -> Result<(), EditorError> {
        if self.closed {
            return Err(EditorError::Closed);
        }
        if matches!(self.state, EditorState::Submitted(_)) {
            return Err(EditorError::AlreadySubmitted);
        }
        Ok(())
    }

    fn issue(&mut self, kind: RequestKind) -> RequestTicket {
        self.next_seq += 1;
        RequestTicket {
            draft_id: self.id,
            seq: self.next_seq,
            kind,
        }
    }
}
