//! Material and product maintenance outside the composition editors.
//!
//! Every mutation is followed by a full refresh of the collection it affects.
//! Deletes go through the confirmation seam first.

use rust_decimal::Decimal;
use stockwright_api::models::{Product, ProductInput, RawMaterial, RawMaterialInput};
use stockwright_api::{Gateway, RemoteError};
use thiserror::Error;

use crate::confirm::{self, Confirm};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: Decimal },

    #[error("cancelled: the operator did not confirm")]
    NotConfirmed,

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

fn require_text(field: &'static str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::Blank { field });
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: Decimal) -> Result<(), CatalogError> {
    if value < Decimal::ZERO {
        return Err(CatalogError::Negative { field, value });
    }
    Ok(())
}

pub fn validate_material(input: &RawMaterialInput) -> Result<(), CatalogError> {
    require_text("code", &input.code)?;
    require_text("name", &input.name)?;
    require_non_negative("stock quantity", input.stock_quantity)
}

pub fn validate_product(input: &ProductInput) -> Result<(), CatalogError> {
    require_text("code", &input.code)?;
    require_text("name", &input.name)?;
    require_non_negative("value", input.value)
}

// -- Raw materials --

pub async fn create_material(
    gateway: &dyn Gateway,
    store: &Store,
    input: &RawMaterialInput,
) -> Result<RawMaterial, CatalogError> {
    validate_material(input)?;
    let material = gateway.create_material(input).await?;
    tracing::info!(material_id = material.id, code = %material.code, "raw material created");
    refresh_materials(gateway, store).await;
    Ok(material)
}

pub async fn update_material(
    gateway: &dyn Gateway,
    store: &Store,
    id: i64,
    input: &RawMaterialInput,
) -> Result<RawMaterial, CatalogError> {
    validate_material(input)?;
    let material = gateway.update_material(id, input).await?;
    tracing::info!(material_id = id, "raw material updated");
    refresh_materials(gateway, store).await;
    // Compositions display the material name.
    refresh_products(gateway, store).await;
    Ok(material)
}

pub async fn delete_material(
    gateway: &dyn Gateway,
    store: &Store,
    id: i64,
    confirm: &dyn Confirm,
) -> Result<(), CatalogError> {
    let label = store
        .material(id)
        .map(|m| format!("{} ({})", m.name, m.code))
        .unwrap_or_else(|| format!("raw material {id}"));
    if !confirm::ask(confirm, &format!("Delete {label}?")) {
        return Err(CatalogError::NotConfirmed);
    }
    gateway.delete_material(id).await?;
    tracing::info!(material_id = id, "raw material deleted");
    refresh_materials(gateway, store).await;
    refresh_products(gateway, store).await;
    Ok(())
}

// -- Products --

/// Change a product's base fields. The composition is not touched.
pub async fn update_product(
    gateway: &dyn Gateway,
    store: &Store,
    id: i64,
    input: &ProductInput,
) -> Result<Product, CatalogError> {
    validate_product(input)?;
    let product = gateway.update_product(id, input).await?;
    tracing::info!(product_id = id, "product updated");
    refresh_products(gateway, store).await;
    Ok(product)
}

pub async fn delete_product(
    gateway: &dyn Gateway,
    store: &Store,
    id: i64,
    confirm: &dyn Confirm,
) -> Result<(), CatalogError> {
    let label = store
        .product(id)
        .map(|p| format!("{} ({})", p.name, p.code))
        .unwrap_or_else(|| format!("product {id}"));
    if !confirm::ask(confirm, &format!("Delete {label}?")) {
        return Err(CatalogError::NotConfirmed);
    }
    gateway.delete_product(id).await?;
    tracing::info!(product_id = id, "product deleted");
    refresh_products(gateway, store).await;
    Ok(())
}

async fn refresh_materials(gateway: &dyn Gateway, store: &Store) {
    if let Err(err) = store.refresh_materials(gateway).await {
        tracing::warn!(error = %err, "material refresh after change failed");
    }
}

async fn refresh_products(gateway: &dyn Gateway, store: &Store) {
    if let Err(err) = store.refresh_products(gateway).await {
        tracing::warn!(error = %err, "product refresh after change failed");
    }
}
