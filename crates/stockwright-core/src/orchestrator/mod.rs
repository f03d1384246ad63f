//! Product creation: create the product, then attach its drafted materials
//! one at a time in draft order.
//!
//! There is no rollback. If an attach fails the product and every material
//! attached before it stay on the server, the remaining entries are never
//! sent, and the failure carries enough detail for the caller to show what
//! happened.

use stockwright_api::models::{AttachRequest, Product, ProductInput};
use stockwright_api::{Gateway, RemoteError};
use thiserror::Error;

use crate::composition::DraftComposition;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreationError {
    /// Nothing was created and no attach was attempted.
    #[error("could not create product: {0}")]
    CreateFailed(#[source] RemoteError),

    /// The product exists but its composition is incomplete.
    #[error(
        "product {} was created but attaching raw material {failed} failed: {source}",
        .product.code
    )]
    AttachFailed {
        product: Product,
        /// Materials attached before the failure, in order.
        attached: Vec<i64>,
        failed: i64,
        /// Drafted materials after the failed one.
        not_attempted: Vec<i64>,
        source: RemoteError,
    },
}

impl CreationError {
    /// The product id, if the create call itself succeeded.
    pub fn created_product_id(&self) -> Option<i64> {
        match self {
            Self::CreateFailed(_) => None,
            Self::AttachFailed { product, .. } => Some(product.id),
        }
    }
}

/// Create `input` and attach every entry of `draft` in order.
///
/// On success the draft is cleared and the product collection refreshed; the
/// returned product is the refreshed copy when available. If the create call
/// fails the draft is left intact. If an attach fails the product collection
/// is refreshed so the partial composition is visible, and the draft is left
/// for the caller to dispose of.
pub async fn run_creation(
    gateway: &dyn Gateway,
    store: &Store,
    input: &ProductInput,
    draft: &mut DraftComposition,
) -> Result<Product, CreationError> {
    let product = gateway
        .create_product(input)
        .await
        .map_err(CreationError::CreateFailed)?;
    tracing::info!(
        product_id = product.id,
        code = %product.code,
        materials = draft.len(),
        "product created"
    );

    let entries = draft.entries().to_vec();
    let mut attached = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let request = AttachRequest {
            raw_material_id: entry.raw_material_id,
            quantity: entry.quantity,
        };
        if let Err(source) = gateway.attach_material(product.id, &request).await {
            tracing::warn!(
                product_id = product.id,
                raw_material_id = entry.raw_material_id,
                position,
                error = %source,
                "attach failed; remaining materials not sent"
            );
            refresh_products(gateway, store, product.id).await;
            return Err(CreationError::AttachFailed {
                product,
                attached,
                failed: entry.raw_material_id,
                not_attempted: entries[position + 1..]
                    .iter()
                    .map(|e| e.raw_material_id)
                    .collect(),
                source,
            });
        }
        tracing::debug!(
            product_id = product.id,
            raw_material_id = entry.raw_material_id,
            position,
            "material attached"
        );
        attached.push(entry.raw_material_id);
    }

    draft.clear();
    refresh_products(gateway, store, product.id).await;
    Ok(store.product(product.id).unwrap_or(product))
}

async fn refresh_products(gateway: &dyn Gateway, store: &Store, product_id: i64) {
    if let Err(err) = store.refresh_products(gateway).await {
        tracing::warn!(product_id, error = %err, "product refresh after creation failed");
    }
}
