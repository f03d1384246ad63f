//! The `Gateway` trait -- typed access to the persistence service.
//!
//! The trait is object-safe so callers hold it as `Arc<dyn Gateway>`; tests
//! substitute an in-memory implementation.

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::{
    AttachRequest, Product, ProductInput, ProductionSuggestion, RawMaterial, RawMaterialInput,
};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Every remote operation the front end issues.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// `GET /raw-materials`
    async fn list_materials(&self) -> RemoteResult<Vec<RawMaterial>>;

    /// `POST /raw-materials`
    async fn create_material(&self, input: &RawMaterialInput) -> RemoteResult<RawMaterial>;

    /// `PUT /raw-materials/{id}`
    async fn update_material(&self, id: i64, input: &RawMaterialInput)
    -> RemoteResult<RawMaterial>;

    /// `DELETE /raw-materials/{id}`
    async fn delete_material(&self, id: i64) -> RemoteResult<()>;

    /// `GET /products`, each product with its nested composition.
    async fn list_products(&self) -> RemoteResult<Vec<Product>>;

    /// `GET /products/{id}`
    async fn get_product(&self, id: i64) -> RemoteResult<Product>;

    /// `POST /products`
    async fn create_product(&self, input: &ProductInput) -> RemoteResult<Product>;

    /// `PUT /products/{id}`; base fields only, the composition is untouched.
    async fn update_product(&self, id: i64, input: &ProductInput) -> RemoteResult<Product>;

    /// `DELETE /products/{id}`
    async fn delete_product(&self, id: i64) -> RemoteResult<()>;

    /// `POST /products/{product_id}/raw-materials`
    ///
    /// Upsert: creates the edge when absent, overwrites its quantity otherwise.
    async fn attach_material(&self, product_id: i64, request: &AttachRequest)
    -> RemoteResult<()>;

    /// `DELETE /products/{product_id}/raw-materials/{raw_material_id}`
    async fn detach_material(&self, product_id: i64, raw_material_id: i64) -> RemoteResult<()>;

    /// `GET /production/suggestion`
    async fn production_suggestion(&self) -> RemoteResult<ProductionSuggestion>;
}

// Compile-time assertion: Gateway must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Gateway) {}
};
