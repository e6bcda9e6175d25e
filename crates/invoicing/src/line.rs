use tradetrack_core::ProductId;
use tradetrack_core::money::{coerce_number, or_zero};
use tradetrack_products::Product;

/// One row of a draft invoice.
///
/// `quantity` and `unit_price` hold whatever the user typed, coerced to a
/// number; `NaN` means the input was not numeric and is rejected by
/// validation rather than corrected here.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub product_ref: Option<ProductId>,
    pub description: String,
    pub classification_code: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl Default for LineItem {
    fn default() -> Self {
        Self::blank()
    }
}

impl LineItem {
    /// A fresh line: no product, quantity 1, price 0.
    pub fn blank() -> Self {
        Self {
            product_ref: None,
            description: String::new(),
            classification_code: String::new(),
            quantity: 1.0,
            unit_price: 0.0,
        }
    }

    /// `quantity * unit_price`, computed on every read (never stored).
    ///
    /// Propagates `NaN`; use [`LineItem::display_total`] for rendering.
    pub fn line_total(&self) -> f64 {
        self.quantity * self.unit_price
    }

    /// Line total with non-numeric inputs counted as zero.
    pub fn display_total(&self) -> f64 {
        or_zero(self.quantity) * or_zero(self.unit_price)
    }

    /// A line can be submitted iff it references a product, has a positive
    /// finite quantity and a finite price. Negative prices are accepted.
    pub fn is_valid(&self) -> bool {
        self.product_ref.is_some()
            && self.quantity.is_finite()
            && self.quantity > 0.0
            && self.unit_price.is_finite()
    }

    /// Set one field from form input text.
    pub fn set_field(&mut self, field: LineField, value: &str) {
        match field {
            LineField::ProductRef => {
                self.product_ref = if value.trim().is_empty() {
                    None
                } else {
                    value.parse().ok()
                };
            }
            LineField::Description => self.description = value.to_string(),
            LineField::ClassificationCode => self.classification_code = value.to_string(),
            LineField::Quantity => self.quantity = coerce_number(value),
            LineField::UnitPrice => self.unit_price = coerce_number(value),
        }
    }

    /// Bind the line to `product` (or unbind it), overwriting description,
    /// classification code and price with the product's values.
    pub fn apply_product(&mut self, product: Option<&Product>) {
        match product {
            Some(p) => {
                self.product_ref = Some(p.id);
                self.description = p.name.clone();
                self.classification_code = p.classification_code.clone().unwrap_or_default();
                self.unit_price = p.price;
            }
            None => {
                self.product_ref = None;
                self.description.clear();
                self.classification_code.clear();
                self.unit_price = 0.0;
            }
        }
    }
}

/// Editable field of a [`LineItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineField {
    ProductRef,
    Description,
    ClassificationCode,
    Quantity,
    UnitPrice,
}

impl LineField {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineField::ProductRef => "product",
            LineField::Description => "description",
            LineField::ClassificationCode => "classification_code",
            LineField::Quantity => "quantity",
            LineField::UnitPrice => "unit_price",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, LineField::Quantity | LineField::UnitPrice)
    }
}
