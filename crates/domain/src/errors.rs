use thiserror::Error;

/// First rule an order broke, in validation order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid delivery email: {0}")]
    InvalidEmail(String),

    #[error("invalid payment amount: {0}")]
    NonPositiveAmount(i64),

    #[error("no items in order")]
    NoItems,

    #[error("invalid item at index {index}: {violation}")]
    InvalidItem {
        index: usize,
        violation: ItemViolation,
    },
}

impl ValidationError {
    /// Stable rule name, used as a log field and metric label.
    pub fn rule(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "missing_field",
            ValidationError::InvalidEmail(_) => "invalid_email",
            ValidationError::NonPositiveAmount(_) => "non_positive_amount",
            ValidationError::NoItems => "no_items",
            ValidationError::InvalidItem { .. } => "invalid_item",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemViolation {
    #[error("invalid chrt_id: {0}")]
    NonPositiveChrtId(i64),

    #[error("missing item track_number")]
    MissingTrackNumber,

    #[error("missing item name")]
    MissingName,

    #[error("invalid item price: {0}")]
    NonPositivePrice(i64),

    #[error("invalid item total_price: {0}")]
    NonPositiveTotalPrice(i64),

    #[error("missing item brand")]
    MissingBrand,
}
