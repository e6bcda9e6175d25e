//! Line validation and the mark set used to highlight failing lines.

use std::collections::BTreeSet;

use thiserror::Error;

use tradetrack_core::DomainError;

use crate::line::LineItem;

/// Indices of lines flagged invalid by the last failed submission attempt.
///
/// Marks are advisory: editing a line clears its mark optimistically and the
/// authoritative check only happens again at submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationMarks(BTreeSet<usize>);

impl ValidationMarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    /// Marked indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn insert(&mut self, index: usize) -> bool {
        self.0.insert(index)
    }

    /// Remove the mark for `index`; returns whether it was set.
    pub fn clear(&mut self, index: usize) -> bool {
        self.0.remove(&index)
    }

    pub fn clear_all(&mut self) {
        self.0.clear();
    }

    /// Re-key marks after the line at `removed` was deleted.
    ///
    /// The removed line's mark is dropped; marks above it move down by one so
    /// they stay attached to the same lines.
    pub fn line_removed(&mut self, removed: usize) {
        self.0 = self
            .0
            .iter()
            .filter(|&&idx| idx != removed)
            .map(|&idx| if idx > removed { idx - 1 } else { idx })
            .collect();
    }
}

impl FromIterator<usize> for ValidationMarks {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Why a draft cannot be submitted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LineValidationError {
    #[error("Invoice must contain at least one line with a selected product, quantity and price.")]
    Empty,

    #[error("Invoice must contain at least one valid line. Please fix highlighted lines.")]
    InvalidLines(ValidationMarks),
}

impl LineValidationError {
    /// Lines to highlight (none for an empty invoice).
    pub fn marks(&self) -> ValidationMarks {
        match self {
            LineValidationError::Empty => ValidationMarks::new(),
            LineValidationError::InvalidLines(marks) => marks.clone(),
        }
    }
}

impl From<LineValidationError> for DomainError {
    fn from(err: LineValidationError) -> Self {
        DomainError::validation(err.to_string())
    }
}

/// Check every line; on success returns the number of valid lines.
///
/// Fails with every invalid index if any line is invalid, and with
/// [`LineValidationError::Empty`] if there is nothing to submit.
pub fn validate_lines(lines: &[LineItem]) -> Result<usize, LineValidationError> {
    let invalid: ValidationMarks = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.is_valid())
        .map(|(idx, _)| idx)
        .collect();

    if !invalid.is_empty() {
        return Err(LineValidationError::InvalidLines(invalid));
    }

    let valid = lines.len();
    if valid == 0 {
        return Err(LineValidationError::Empty);
    }
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradetrack_core::ProductId;

    fn valid_line() -> LineItem {
        LineItem {
            product_ref: Some(ProductId::new(1)),
            quantity: 1.0,
            unit_price: 10.0,
            ..LineItem::blank()
        }
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(validate_lines(&[]), Err(LineValidationError::Empty));
        assert!(LineValidationError::Empty.marks().is_empty());
    }

    #[test]
    fn reports_every_invalid_index() {
        let lines = vec![LineItem::blank(), valid_line(), LineItem::blank()];
        let err = validate_lines(&lines).unwrap_err();
        let marked: Vec<usize> = err.marks().iter().collect();
        assert_eq!(marked, vec![0, 2]);
    }

    #[test]
    fn counts_valid_lines() {
        assert_eq!(validate_lines(&[valid_line(), valid_line()]), Ok(2));
    }

    #[test]
    fn removal_shifts_higher_marks_down() {
        let mut marks: ValidationMarks = [1, 3, 4].into_iter().collect();
        marks.line_removed(3);
        let after: Vec<usize> = marks.iter().collect();
        assert_eq!(after, vec![1, 3]);

        marks.line_removed(0);
        let after: Vec<usize> = marks.iter().collect();
        assert_eq!(after, vec![0, 2]);
    }

    #[test]
    fn converts_into_domain_validation_error() {
        let err: DomainError = LineValidationError::Empty.into();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
