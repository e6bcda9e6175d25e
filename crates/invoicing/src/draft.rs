use serde::Serialize;

use tradetrack_core::ProductId;
use tradetrack_core::money::{compute_tax, compute_total};
use tradetrack_products::{Product, ProductLookup};

use crate::line::{LineField, LineItem};
use crate::payload::{SubmissionLine, SubmissionPayload};
use crate::validation::{LineValidationError, ValidationMarks, validate_lines};

/// Subtotal, tax and total of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

impl InvoiceTotals {
    /// Derive tax and total from a subtotal at the flat rate.
    pub fn from_subtotal(subtotal: f64) -> Self {
        let tax = compute_tax(subtotal);
        Self {
            subtotal,
            tax,
            total: compute_total(subtotal, tax),
        }
    }
}

/// An invoice being drafted in the current session.
///
/// Owns the ordered line items and the validation marks for them. Totals are
/// derived on every call and never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftInvoice {
    customer_name: String,
    note: Option<String>,
    lines: Vec<LineItem>,
    marks: ValidationMarks,
}

impl Default for DraftInvoice {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftInvoice {
    /// A draft as opened by the user: one blank line ready for input.
    pub fn new() -> Self {
        let mut draft = Self::empty();
        draft.add_line();
        draft
    }

    /// A draft with no lines at all.
    pub fn empty() -> Self {
        Self {
            customer_name: String::new(),
            note: None,
            lines: Vec::new(),
            marks: ValidationMarks::new(),
        }
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn set_customer_name(&mut self, name: impl Into<String>) {
        self.customer_name = name.into();
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Blank notes are stored as no note.
    pub fn set_note(&mut self, note: impl Into<String>) {
        let note = note.into();
        self.note = if note.trim().is_empty() { None } else { Some(note) };
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&LineItem> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn marks(&self) -> &ValidationMarks {
        &self.marks
    }

    pub fn is_marked(&self, index: usize) -> bool {
        self.marks.contains(index)
    }

    /// Append a blank line. Always succeeds.
    pub fn add_line(&mut self) -> usize {
        self.lines.push(LineItem::blank());
        self.lines.len() - 1
    }

    /// Remove the line at `index`. Out-of-range indices are ignored.
    pub fn remove_line(&mut self, index: usize) -> Option<LineItem> {
        if index >= self.lines.len() {
            tracing::debug!(index, len = self.lines.len(), "ignoring removal of missing line");
            return None;
        }
        let removed = self.lines.remove(index);
        self.marks.line_removed(index);
        Some(removed)
    }

    /// Set one field of the line at `index` from form input text.
    ///
    /// Numeric fields are coerced (non-numeric input becomes `NaN`). Clears
    /// the line's validation mark; it is checked again on submission.
    pub fn update_line(&mut self, index: usize, field: LineField, value: &str) -> bool {
        self.with_line(index, |line| line.set_field(field, value))
    }

    pub fn set_quantity(&mut self, index: usize, quantity: f64) -> bool {
        self.with_line(index, |line| line.quantity = quantity)
    }

    pub fn set_unit_price(&mut self, index: usize, unit_price: f64) -> bool {
        self.with_line(index, |line| line.unit_price = unit_price)
    }

    pub fn set_description(&mut self, index: usize, description: impl Into<String>) -> bool {
        let description = description.into();
        self.with_line(index, |line| line.description = description)
    }

    pub fn set_classification_code(&mut self, index: usize, code: impl Into<String>) -> bool {
        let code = code.into();
        self.with_line(index, |line| line.classification_code = code)
    }

    /// Bind the line at `index` to `product`, or unbind it with `None`.
    ///
    /// Description, classification code and price are always overwritten with
    /// the product's values (or reset), discarding earlier manual edits.
    pub fn select_product(&mut self, index: usize, product: Option<&Product>) -> bool {
        self.with_line(index, |line| line.apply_product(product))
    }

    /// Select by identifier through a catalog snapshot.
    ///
    /// An id the catalog does not know (stale or not loaded) resolves to
    /// "no product".
    pub fn select_product_by_id<L>(&mut self, index: usize, id: Option<ProductId>, catalog: &L) -> bool
    where
        L: ProductLookup + ?Sized,
    {
        let product = id.and_then(|id| {
            let found = catalog.lookup(id);
            if found.is_none() {
                tracing::warn!(product_id = %id, "selected product is not in the catalog snapshot");
            }
            found
        });
        self.select_product(index, product)
    }

    fn with_line(&mut self, index: usize, edit: impl FnOnce(&mut LineItem)) -> bool {
        let Some(line) = self.lines.get_mut(index) else {
            tracing::debug!(index, len = self.lines.len(), "ignoring edit of missing line");
            return false;
        };
        edit(line);
        self.marks.clear(index);
        true
    }

    /// Sum of line totals, counting non-numeric inputs as zero.
    pub fn subtotal(&self) -> f64 {
        self.lines.iter().map(LineItem::display_total).sum()
    }

    pub fn tax(&self, subtotal: f64) -> f64 {
        compute_tax(subtotal)
    }

    pub fn total(&self, subtotal: f64, tax: f64) -> f64 {
        compute_total(subtotal, tax)
    }

    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals::from_subtotal(self.subtotal())
    }

    /// Check every line before submission and record the outcome as marks.
    ///
    /// On success the marks are cleared and the number of valid lines is
    /// returned; on failure the marks are replaced by the invalid indices.
    pub fn validate(&mut self) -> Result<usize, LineValidationError> {
        match validate_lines(&self.lines) {
            Ok(valid) => {
                self.marks.clear_all();
                Ok(valid)
            }
            Err(err) => {
                self.marks = err.marks();
                tracing::debug!(invalid = self.marks.len(), lines = self.lines.len(), "draft failed validation");
                Err(err)
            }
        }
    }

    /// The submittable part of the draft.
    ///
    /// Only valid lines are included, even if [`DraftInvoice::validate`] was
    /// never called.
    pub fn to_submission_payload(&self) -> SubmissionPayload {
        let lines = self
            .lines
            .iter()
            .filter(|line| line.is_valid())
            .filter_map(|line| {
                line.product_ref.map(|product_id| SubmissionLine {
                    product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
            })
            .collect();

        let customer_name = self.customer_name.trim();
        SubmissionPayload {
            customer_name: (!customer_name.is_empty()).then(|| customer_name.to_string()),
            note: self.note.clone(),
            lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tradetrack_products::ProductCatalog;

    fn p1(price: f64) -> Product {
        Product::new(ProductId::new(1), "Cotton bale", price).with_classification_code("5201.00")
    }

    #[test]
    fn new_draft_starts_with_one_blank_line() {
        let draft = DraftInvoice::new();
        assert_eq!(draft.len(), 1);
        assert_eq!(draft.line(0), Some(&LineItem::blank()));
        assert!(DraftInvoice::empty().is_empty());
    }

    #[test]
    fn add_and_remove_lines() {
        let mut draft = DraftInvoice::empty();
        assert_eq!(draft.add_line(), 0);
        assert_eq!(draft.add_line(), 1);
        draft.set_description(1, "second");

        let removed = draft.remove_line(0).unwrap();
        assert_eq!(removed, LineItem::blank());
        assert_eq!(draft.len(), 1);
        assert_eq!(draft.line(0).unwrap().description, "second");
    }

    #[test]
    fn out_of_range_operations_are_no_ops() {
        let mut draft = DraftInvoice::new();
        let before = draft.clone();
        assert!(draft.remove_line(5).is_none());
        assert!(!draft.update_line(5, LineField::Quantity, "2"));
        assert!(!draft.select_product(5, Some(&p1(10.0))));
        assert_eq!(draft, before);
    }

    #[test]
    fn mixed_lines_scenario() {
        let mut draft = DraftInvoice::empty();
        draft.add_line();
        draft.add_line();
        draft.select_product(0, Some(&p1(100.0)));
        draft.set_quantity(0, 2.0);
        draft.set_quantity(1, 1.0);
        draft.set_unit_price(1, 50.0);

        let err = draft.validate().unwrap_err();
        assert_eq!(err, LineValidationError::InvalidLines([1].into_iter().collect()));
        assert!(draft.is_marked(1));
        assert_eq!(draft.subtotal(), 250.0);

        let payload = draft.to_submission_payload();
        assert_eq!(
            payload.lines,
            vec![SubmissionLine {
                product_id: ProductId::new(1),
                quantity: 2.0,
                unit_price: 100.0,
            }]
        );
    }

    #[test]
    fn fractional_price_scenario() {
        let mut draft = DraftInvoice::new();
        draft.select_product(0, Some(&p1(99.5)));
        draft.update_line(0, LineField::Quantity, "3");

        let totals = draft.totals();
        assert_eq!(totals.subtotal, 298.5);
        assert_eq!(totals.tax, 36.0);
        assert_eq!(totals.total, 334.5);
        assert_eq!(draft.tax(totals.subtotal), 36.0);
        assert_eq!(draft.total(totals.subtotal, totals.tax), 334.5);
        assert_eq!(draft.validate(), Ok(1));
    }

    #[test]
    fn empty_draft_is_invalid() {
        let mut draft = DraftInvoice::empty();
        assert_eq!(draft.validate(), Err(LineValidationError::Empty));
        assert!(draft.to_submission_payload().is_empty());
    }

    #[test]
    fn removing_a_line_keeps_marks_on_their_lines() {
        let mut draft = DraftInvoice::empty();
        for _ in 0..3 {
            draft.add_line();
        }
        draft.select_product(0, Some(&p1(10.0)));
        draft.select_product(2, Some(&p1(20.0)));
        draft.set_description(1, "needs a product");

        draft.validate().unwrap_err();
        assert!(draft.is_marked(1));

        draft.remove_line(0);
        assert_eq!(draft.line(0).unwrap().description, "needs a product");
        assert!(draft.is_marked(0));
        assert!(!draft.is_marked(1), "old line 2 must not inherit the stale mark");
    }

    #[test]
    fn editing_a_line_clears_its_mark_only() {
        let mut draft = DraftInvoice::empty();
        draft.add_line();
        draft.add_line();
        draft.validate().unwrap_err();
        assert!(draft.is_marked(0) && draft.is_marked(1));

        draft.update_line(0, LineField::Description, "x");
        assert!(!draft.is_marked(0));
        assert!(draft.is_marked(1));
    }

    #[test]
    fn infinite_quantity_text_is_non_numeric() {
        for raw in ["inf", "Infinity", "1e400"] {
            let mut draft = DraftInvoice::new();
            draft.select_product(0, Some(&p1(10.0)));
            draft.update_line(0, LineField::Quantity, raw);
            assert!(draft.line(0).unwrap().quantity.is_nan(), "{raw}");
            assert_eq!(draft.subtotal(), 0.0);
            assert_eq!(draft.totals().total, 0.0);
            assert!(draft.validate().is_err());
            assert!(draft.to_submission_payload().is_empty());
        }
    }

    #[test]
    fn infinite_values_set_directly_are_rejected() {
        let mut draft = DraftInvoice::new();
        draft.select_product(0, Some(&p1(10.0)));
        draft.set_quantity(0, f64::INFINITY);
        assert!(draft.validate().is_err());
        assert!(draft.to_submission_payload().is_empty());

        draft.set_quantity(0, 2.0);
        draft.set_unit_price(0, f64::NEG_INFINITY);
        assert!(draft.validate().is_err());
        assert!(draft.to_submission_payload().is_empty());
    }

    #[test]
    fn non_numeric_quantity_is_kept_and_rejected() {
        let mut draft = DraftInvoice::new();
        draft.select_product(0, Some(&p1(10.0)));
        draft.update_line(0, LineField::Quantity, "a few");
        assert!(draft.line(0).unwrap().quantity.is_nan());
        assert_eq!(draft.subtotal(), 0.0);
        assert!(draft.validate().is_err());
        assert!(draft.to_submission_payload().is_empty());
    }

    #[test]
    fn negative_price_is_accepted() {
        let mut draft = DraftInvoice::new();
        draft.select_product(0, Some(&p1(10.0)));
        draft.update_line(0, LineField::UnitPrice, "-25");
        assert_eq!(draft.validate(), Ok(1));
        assert_eq!(draft.to_submission_payload().lines[0].unit_price, -25.0);
    }

    #[test]
    fn select_then_deselect_leaves_no_residue() {
        let mut draft = DraftInvoice::new();
        draft.select_product(0, Some(&p1(100.0)));
        draft.select_product(0, None);
        let line = draft.line(0).unwrap();
        assert_eq!(line.product_ref, None);
        assert!(line.description.is_empty());
        assert!(line.classification_code.is_empty());
        assert_eq!(line.unit_price, 0.0);
    }

    #[test]
    fn selecting_unknown_id_resolves_to_no_product() {
        let catalog = ProductCatalog::new(vec![p1(100.0)]);
        let mut draft = DraftInvoice::new();
        draft.select_product_by_id(0, Some(ProductId::new(1)), &catalog);
        assert_eq!(draft.line(0).unwrap().unit_price, 100.0);

        draft.select_product_by_id(0, Some(ProductId::new(404)), &catalog);
        assert_eq!(draft.line(0).unwrap().product_ref, None);

        draft.select_product_by_id(0, Some(ProductId::new(1)), &ProductCatalog::empty());
        assert_eq!(draft.line(0).unwrap().product_ref, None);
    }

    #[test]
    fn payload_carries_header_fields() {
        let mut draft = DraftInvoice::new();
        draft.select_product(0, Some(&p1(10.0)));
        draft.set_customer_name("  ");
        draft.set_note("Ship by sea");
        let payload = draft.to_submission_payload();
        assert_eq!(payload.customer_name, None);
        assert_eq!(payload.note.as_deref(), Some("Ship by sea"));

        draft.set_customer_name("Acme Traders");
        assert_eq!(
            draft.to_submission_payload().customer_name.as_deref(),
            Some("Acme Traders")
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Remove(usize),
        Update(usize, LineField, String),
        Select(usize, bool),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let field = prop_oneof![
            Just(LineField::ProductRef),
            Just(LineField::Description),
            Just(LineField::Quantity),
            Just(LineField::UnitPrice),
        ];
        let value = prop_oneof![
            (-50i32..500).prop_map(|v| v.to_string()),
            (0.0f64..1_000.0).prop_map(|v| format!("{v:.2}")),
            Just(String::new()),
            Just("abc".to_string()),
        ];
        prop_oneof![
            Just(Op::Add),
            (0usize..8).prop_map(Op::Remove),
            (0usize..8, field, value).prop_map(|(i, f, v)| Op::Update(i, f, v)),
            (0usize..8, any::<bool>()).prop_map(|(i, s)| Op::Select(i, s)),
        ]
    }

    fn expected_subtotal(lines: &[LineItem]) -> f64 {
        lines
            .iter()
            .map(|l| {
                let q = if l.quantity.is_nan() { 0.0 } else { l.quantity };
                let p = if l.unit_price.is_nan() { 0.0 } else { l.unit_price };
                q * p
            })
            .sum()
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: subtotal always equals the NaN-as-zero sum over current lines,
        /// and totals never drift from subtotal + tax.
        #[test]
        fn subtotal_tracks_any_edit_sequence(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let product = p1(12.5);
            let mut draft = DraftInvoice::empty();
            for op in ops {
                match op {
                    Op::Add => { draft.add_line(); }
                    Op::Remove(i) => { draft.remove_line(i); }
                    Op::Update(i, f, v) => { draft.update_line(i, f, &v); }
                    Op::Select(i, some) => { draft.select_product(i, some.then_some(&product)); }
                }
            }

            let subtotal = draft.subtotal();
            prop_assert_eq!(subtotal, expected_subtotal(draft.lines()));
            let totals = draft.totals();
            prop_assert_eq!(totals.tax, (subtotal * 0.12 + 0.5).floor());
            prop_assert_eq!(totals.total, totals.subtotal + totals.tax);
        }

        /// Property: the payload never contains an unbound or non-positive line,
        /// whether or not validation ran.
        #[test]
        fn payload_never_contains_invalid_lines(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let product = p1(7.0);
            let mut draft = DraftInvoice::empty();
            for op in ops {
                match op {
                    Op::Add => { draft.add_line(); }
                    Op::Remove(i) => { draft.remove_line(i); }
                    Op::Update(i, f, v) => { draft.update_line(i, f, &v); }
                    Op::Select(i, some) => { draft.select_product(i, some.then_some(&product)); }
                }
            }

            let payload = draft.to_submission_payload();
            let valid = draft.lines().iter().filter(|l| l.is_valid()).count();
            prop_assert_eq!(payload.lines.len(), valid);
            for line in &payload.lines {
                prop_assert!(line.quantity.is_finite() && line.quantity > 0.0);
                prop_assert!(line.unit_price.is_finite());
            }
        }

        /// Property: a line is flagged iff it has no product, a non-positive
        /// quantity, or a non-numeric price.
        #[test]
        fn flags_exactly_the_invalid_lines(
            specs in prop::collection::vec((any::<bool>(), -3.0f64..5.0, prop_oneof![Just(f64::NAN), -100.0f64..100.0]), 1..12)
        ) {
            let mut draft = DraftInvoice::empty();
            for (i, (has_product, quantity, price)) in specs.iter().enumerate() {
                draft.add_line();
                if *has_product {
                    draft.select_product(i, Some(&p1(1.0)));
                }
                draft.set_quantity(i, *quantity);
                draft.set_unit_price(i, *price);
            }

            let expected: ValidationMarks = specs
                .iter()
                .enumerate()
                .filter(|(_, (has_product, quantity, price))| !*has_product || *quantity <= 0.0 || price.is_nan())
                .map(|(i, _)| i)
                .collect();

            match draft.validate() {
                Ok(count) => {
                    prop_assert!(expected.is_empty());
                    prop_assert_eq!(count, specs.len());
                }
                Err(err) => prop_assert_eq!(err.marks(), expected),
            }
        }
    }
}
