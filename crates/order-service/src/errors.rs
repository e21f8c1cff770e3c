use domain::ValidationError;
use order_store::StoreError;
use std::fmt;
use thiserror::Error;

/// Stages a message moves through on its way into storage and cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    Received,
    Decoded,
    Validated,
    Persisted,
    Cached,
    Done,
}

impl ProcessingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStage::Received => "received",
            ProcessingStage::Decoded => "decoded",
            ProcessingStage::Validated => "validated",
            ProcessingStage::Persisted => "persisted",
            ProcessingStage::Cached => "cached",
            ProcessingStage::Done => "done",
        }
    }
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a message did not make it into storage
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("failed to decode order: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid order data (order_uid={order_uid:?}): {source}")]
    Validation {
        order_uid: String,
        #[source]
        source: ValidationError,
    },

    #[error("failed to save order {order_uid}: {source}")]
    Persistence {
        order_uid: String,
        #[source]
        source: StoreError,
    },
}

impl ProcessingError {
    /// The stage the message failed to reach
    pub fn stage(&self) -> ProcessingStage {
        match self {
            ProcessingError::Decode(_) => ProcessingStage::Decoded,
            ProcessingError::Validation { .. } => ProcessingStage::Validated,
            ProcessingError::Persistence { .. } => ProcessingStage::Persisted,
        }
    }

    /// Metric label for this failure
    pub fn outcome(&self) -> &'static str {
        match self {
            ProcessingError::Decode(_) => "decode_error",
            ProcessingError::Validation { .. } => "validation_error",
            ProcessingError::Persistence { .. } => "persistence_error",
        }
    }

    pub fn validation_error(&self) -> Option<&ValidationError> {
        match self {
            ProcessingError::Validation { source, .. } => Some(source),
            _ => None,
        }
    }
}
