//! Bill-of-materials editing.
//!
//! A composition can be edited in two lifecycles:
//!
//! - [`DraftComposition`]: the product does not exist yet, so every change is
//!   local and nothing reaches the service until the creation orchestrator
//!   runs.
//! - [`PersistedComposition`]: the product exists, so every change is an
//!   immediate remote call followed by a full product refresh.
//!
//! Both implement [`CompositionEditor`], which is what the views drive.

mod draft;
mod persisted;

pub use draft::{DraftComposition, DraftEntry};
pub use persisted::{PersistedComposition, UpsertMode};

use async_trait::async_trait;
use rust_decimal::Decimal;
use stockwright_api::RemoteError;
use thiserror::Error;

use crate::confirm::Confirm;

/// Errors raised by composition editors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error(
        "raw material {raw_material_id} is already part of this composition; edit its quantity instead"
    )]
    DuplicateEntry { raw_material_id: i64 },

    #[error("quantity must be greater than zero (got {0})")]
    InvalidQuantity(Decimal),

    #[error("no composition row at index {index} (composition has {len} rows)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("row {row} is not being edited")]
    NotEditing { row: usize },

    #[error("product {0} is not in the product list; refresh and try again")]
    UnknownProduct(i64),

    #[error("cancelled: the operator did not confirm")]
    NotConfirmed,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl CompositionError {
    /// Detected locally, before any remote call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateEntry { .. } | Self::InvalidQuantity(_) | Self::IndexOutOfRange { .. }
        )
    }
}

/// One displayed composition line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionRow {
    pub raw_material_id: i64,
    /// Only persisted rows carry the server-resolved name.
    pub raw_material_name: Option<String>,
    pub quantity: Decimal,
}

/// The row currently in edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowEdit {
    pub row: usize,
    pub raw_material_id: i64,
    /// Quantity at the moment editing began.
    pub quantity: Decimal,
}

/// Uniform editing capability over a draft or a persisted composition.
///
/// Rows are addressed by their position in [`Self::rows`]. At most one row is
/// in edit mode at a time; beginning an edit on another row moves edit mode.
#[async_trait]
pub trait CompositionEditor: Send {
    fn rows(&self) -> Vec<CompositionRow>;

    fn editing(&self) -> Option<RowEdit>;

    /// Add a material that is not yet in the composition.
    async fn add(&mut self, raw_material_id: i64, quantity: Decimal)
    -> Result<(), CompositionError>;

    /// Remove a row. Persisted editors ask `confirm` first.
    async fn remove(&mut self, row: usize, confirm: &dyn Confirm) -> Result<(), CompositionError>;

    fn begin_edit(&mut self, row: usize) -> Result<RowEdit, CompositionError>;

    /// Overwrite the edited row's quantity and leave edit mode. On failure
    /// the row stays in edit mode.
    async fn commit_edit(&mut self, row: usize, quantity: Decimal)
    -> Result<(), CompositionError>;

    fn cancel_edit(&mut self);
}

pub(crate) fn validate_quantity(quantity: Decimal) -> Result<(), CompositionError> {
    if quantity <= Decimal::ZERO {
        return Err(CompositionError::InvalidQuantity(quantity));
    }
    Ok(())
}

const _: () = {
    fn _assert_object_safe(_: &dyn CompositionEditor) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_local() {
        assert!(CompositionError::DuplicateEntry { raw_material_id: 1 }.is_validation());
        assert!(CompositionError::InvalidQuantity(Decimal::ZERO).is_validation());
        assert!(!CompositionError::NotConfirmed.is_validation());
        assert!(!CompositionError::Remote(RemoteError::Transport("x".into())).is_validation());
    }

    #[test]
    fn remote_error_message_passes_through() {
        let err = CompositionError::from(RemoteError::Status {
            status: 404,
            message: "Raw Material not found".into(),
        });
        assert_eq!(err.to_string(), "Raw Material not found");
    }

    #[test]
    fn quantity_must_be_positive() {
        assert!(validate_quantity(Decimal::ONE).is_ok());
        assert_eq!(
            validate_quantity(Decimal::NEGATIVE_ONE),
            Err(CompositionError::InvalidQuantity(Decimal::NEGATIVE_ONE))
        );
    }
}
