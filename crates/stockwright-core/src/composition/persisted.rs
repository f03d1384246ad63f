use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use stockwright_api::Gateway;
use stockwright_api::models::{AttachRequest, Product};

use super::{CompositionEditor, CompositionError, CompositionRow, RowEdit, validate_quantity};
use crate::confirm::{self, Confirm};
use crate::store::Store;

/// How an upsert treats an edge that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    /// Adding a material: refuse if the cached composition already lists it.
    New,
    /// Changing a quantity: overwrite whatever is there.
    Overwrite,
}

/// Remote-backed composition of an existing product.
///
/// Every change is one gateway call followed by a full product refresh. Reads
/// come from the [`Store`], so the rows always reflect the last completed
/// fetch rather than an in-flight change.
pub struct PersistedComposition {
    product_id: i64,
    gateway: Arc<dyn Gateway>,
    store: Store,
    /// Edit target, pinned to a material id once editing begins.
    editing: Option<i64>,
}

impl std::fmt::Debug for PersistedComposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedComposition")
            .field("product_id", &self.product_id)
            .field("editing", &self.editing)
            .finish_non_exhaustive()
    }
}

impl PersistedComposition {
    pub fn new(product_id: i64, gateway: Arc<dyn Gateway>, store: Store) -> Self {
        Self {
            product_id,
            gateway,
            store,
            editing: None,
        }
    }

    pub fn product_id(&self) -> i64 {
        self.product_id
    }

    /// The product as of the last completed fetch.
    pub fn product(&self) -> Option<Product> {
        self.store.product(self.product_id)
    }

    /// Create or overwrite the edge for `raw_material_id`.
    ///
    /// With [`UpsertMode::New`] the cached composition is checked first and a
    /// material it already lists is refused without a remote call. A failed
    /// call leaves the store untouched.
    pub async fn add_or_update(
        &mut self,
        raw_material_id: i64,
        quantity: Decimal,
        mode: UpsertMode,
    ) -> Result<(), CompositionError> {
        self.drop_stale_edit();
        validate_quantity(quantity)?;
        let product = self
            .product()
            .ok_or(CompositionError::UnknownProduct(self.product_id))?;
        if mode == UpsertMode::New && product.uses_material(raw_material_id) {
            return Err(CompositionError::DuplicateEntry { raw_material_id });
        }

        let request = AttachRequest {
            raw_material_id,
            quantity,
        };
        let result = self
            .gateway
            .attach_material(self.product_id, &request)
            .await;

        if let Err(err) = result {
            tracing::warn!(
                product_id = self.product_id,
                raw_material_id,
                error = %err,
                "attach failed"
            );
            return Err(err.into());
        }
        tracing::info!(
            product_id = self.product_id,
            raw_material_id,
            %quantity,
            ?mode,
            "composition edge saved"
        );
        self.refresh().await;
        self.drop_stale_edit();
        Ok(())
    }

    /// Detach `raw_material_id` after the operator confirms.
    pub async fn detach(
        &mut self,
        raw_material_id: i64,
        confirm: &dyn Confirm,
    ) -> Result<(), CompositionError> {
        self.drop_stale_edit();
        let product = self
            .product()
            .ok_or(CompositionError::UnknownProduct(self.product_id))?;
        let material = product
            .composition_entry(raw_material_id)
            .and_then(|c| c.raw_material_name.clone())
            .unwrap_or_else(|| format!("material {raw_material_id}"));
        let prompt = format!("Remove {material} from product {}?", product.code);
        if !confirm::ask(confirm, &prompt) {
            return Err(CompositionError::NotConfirmed);
        }

        let result = self
            .gateway
            .detach_material(self.product_id, raw_material_id)
            .await;

        if let Err(err) = result {
            tracing::warn!(
                product_id = self.product_id,
                raw_material_id,
                error = %err,
                "detach failed"
            );
            return Err(err.into());
        }
        tracing::info!(
            product_id = self.product_id,
            raw_material_id,
            "composition edge removed"
        );
        if self.editing == Some(raw_material_id) {
            self.editing = None;
        }
        self.refresh().await;
        Ok(())
    }

    /// Forget an edit whose material is no longer in the cached composition,
    /// so re-attaching it later does not reopen the edit.
    fn drop_stale_edit(&mut self) {
        let Some(raw_material_id) = self.editing else {
            return;
        };
        if !self.product().is_some_and(|p| p.uses_material(raw_material_id)) {
            tracing::debug!(
                product_id = self.product_id,
                raw_material_id,
                "edited material left the composition"
            );
            self.editing = None;
        }
    }

    fn material_at(&self, row: usize) -> Result<i64, CompositionError> {
        let product = self
            .product()
            .ok_or(CompositionError::UnknownProduct(self.product_id))?;
        product
            .composition
            .get(row)
            .map(|c| c.raw_material_id)
            .ok_or(CompositionError::IndexOutOfRange {
                index: row,
                len: product.composition.len(),
            })
    }

    // The mutation already succeeded; a failed refresh is recorded on the
    // store's product collection.
    async fn refresh(&self) {
        if let Err(err) = self.store.refresh_products(self.gateway.as_ref()).await {
            tracing::warn!(
                product_id = self.product_id,
                error = %err,
                "product refresh after composition change failed"
            );
        }
    }
}

#[async_trait]
impl CompositionEditor for PersistedComposition {
    fn rows(&self) -> Vec<CompositionRow> {
        self.product()
            .map(|p| {
                p.composition
                    .into_iter()
                    .map(|c| CompositionRow {
                        raw_material_id: c.raw_material_id,
                        raw_material_name: c.raw_material_name,
                        quantity: c.quantity,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn editing(&self) -> Option<RowEdit> {
        let raw_material_id = self.editing?;
        let product = self.product()?;
        product
            .composition
            .iter()
            .enumerate()
            .find(|(_, c)| c.raw_material_id == raw_material_id)
            .map(|(row, c)| RowEdit {
                row,
                raw_material_id,
                quantity: c.quantity,
            })
    }

    async fn add(
        &mut self,
        raw_material_id: i64,
        quantity: Decimal,
    ) -> Result<(), CompositionError> {
        self.add_or_update(raw_material_id, quantity, UpsertMode::New)
            .await
    }

    async fn remove(&mut self, row: usize, confirm: &dyn Confirm) -> Result<(), CompositionError> {
        let raw_material_id = self.material_at(row)?;
        self.detach(raw_material_id, confirm).await
    }

    fn begin_edit(&mut self, row: usize) -> Result<RowEdit, CompositionError> {
        let raw_material_id = self.material_at(row)?;
        self.editing = Some(raw_material_id);
        self.editing()
            .ok_or(CompositionError::NotEditing { row })
    }

    async fn commit_edit(
        &mut self,
        row: usize,
        quantity: Decimal,
    ) -> Result<(), CompositionError> {
        self.drop_stale_edit();
        let raw_material_id = match self.editing() {
            Some(edit) if edit.row == row => edit.raw_material_id,
            _ => return Err(CompositionError::NotEditing { row }),
        };
        self.add_or_update(raw_material_id, quantity, UpsertMode::Overwrite)
            .await?;
        self.editing = None;
        Ok(())
    }

    fn cancel_edit(&mut self) {
        self.editing = None;
    }
}
