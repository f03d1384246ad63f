use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;
use stockwright_api::RemoteError;
use stockwright_api::models::{
    AttachRequest, Product, ProductComposition, ProductInput, ProductionSuggestion, RawMaterial,
    RawMaterialInput,
};

#[derive(Debug, Default)]
struct BackendState {
    materials: BTreeMap<i64, RawMaterial>,
    products: BTreeMap<i64, Product>,
    next_material_id: i64,
    next_product_id: i64,
    next_edge_id: i64,
    suggestion: ProductionSuggestion,
}

/// In-memory model of the persistence service.
///
/// Follows the service's observable rules: ids are assigned on create,
/// product codes are unique (409 on reuse), attach is an upsert, unknown ids
/// are 404, and composition names are resolved server-side.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<BackendState>>,
}

fn not_found(what: &str) -> RemoteError {
    RemoteError::Status {
        status: 404,
        message: format!("{what} not found"),
    }
}

fn conflict(message: impl Into<String>) -> RemoteError {
    RemoteError::Status {
        status: 409,
        message: message.into(),
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -- Fixtures --

    pub fn seed_material(&self, code: &str, name: &str, stock: Decimal) -> RawMaterial {
        self.create_material(&RawMaterialInput {
            code: code.to_string(),
            name: name.to_string(),
            stock_quantity: stock,
        })
        .expect("seeding a material should succeed")
    }

    pub fn seed_product(&self, code: &str, name: &str, value: Decimal) -> Product {
        self.create_product(&ProductInput {
            code: code.to_string(),
            name: name.to_string(),
            value,
        })
        .expect("seeding a product should succeed")
    }

    pub fn set_suggestion(&self, suggestion: ProductionSuggestion) {
        self.lock().suggestion = suggestion;
    }

    pub fn product(&self, id: i64) -> Option<Product> {
        self.lock().products.get(&id).cloned()
    }

    pub fn product_by_code(&self, code: &str) -> Option<Product> {
        self.lock().products.values().find(|p| p.code == code).cloned()
    }

    pub fn product_count(&self) -> usize {
        self.lock().products.len()
    }

    // -- Operations (shared by FakeGateway and the stub server) --

    pub fn list_materials(&self) -> Vec<RawMaterial> {
        self.lock().materials.values().cloned().collect()
    }

    pub fn create_material(&self, input: &RawMaterialInput) -> Result<RawMaterial, RemoteError> {
        let mut state = self.lock();
        state.next_material_id += 1;
        let material = RawMaterial {
            id: state.next_material_id,
            code: input.code.clone(),
            name: input.name.clone(),
            stock_quantity: input.stock_quantity,
        };
        state.materials.insert(material.id, material.clone());
        Ok(material)
    }

    pub fn update_material(
        &self,
        id: i64,
        input: &RawMaterialInput,
    ) -> Result<RawMaterial, RemoteError> {
        let mut state = self.lock();
        let material = state
            .materials
            .get_mut(&id)
            .ok_or_else(|| not_found("Raw Material"))?;
        material.code = input.code.clone();
        material.name = input.name.clone();
        material.stock_quantity = input.stock_quantity;
        let updated = material.clone();
        for product in state.products.values_mut() {
            for edge in product.composition.iter_mut() {
                if edge.raw_material_id == id {
                    edge.raw_material_name = Some(updated.name.clone());
                }
            }
        }
        Ok(updated)
    }

    pub fn delete_material(&self, id: i64) -> Result<(), RemoteError> {
        let mut state = self.lock();
        if !state.materials.contains_key(&id) {
            return Err(not_found("Raw Material"));
        }
        if state.products.values().any(|p| p.uses_material(id)) {
            return Err(conflict("Raw Material is used by a product composition"));
        }
        state.materials.remove(&id);
        Ok(())
    }

    pub fn list_products(&self) -> Vec<Product> {
        self.lock().products.values().cloned().collect()
    }

    pub fn get_product(&self, id: i64) -> Result<Product, RemoteError> {
        self.product(id).ok_or_else(|| not_found("Product"))
    }

    pub fn create_product(&self, input: &ProductInput) -> Result<Product, RemoteError> {
        let mut state = self.lock();
        if state.products.values().any(|p| p.code == input.code) {
            return Err(conflict(format!(
                "Product code {} already exists",
                input.code
            )));
        }
        state.next_product_id += 1;
        let product = Product {
            id: state.next_product_id,
            code: input.code.clone(),
            name: input.name.clone(),
            value: input.value,
            composition: Vec::new(),
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    pub fn update_product(&self, id: i64, input: &ProductInput) -> Result<Product, RemoteError> {
        let mut state = self.lock();
        if state
            .products
            .values()
            .any(|p| p.id != id && p.code == input.code)
        {
            return Err(conflict(format!(
                "Product code {} already exists",
                input.code
            )));
        }
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| not_found("Product"))?;
        product.code = input.code.clone();
        product.name = input.name.clone();
        product.value = input.value;
        Ok(product.clone())
    }

    pub fn delete_product(&self, id: i64) -> Result<(), RemoteError> {
        self.lock()
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("Product"))
    }

    pub fn attach_material(
        &self,
        product_id: i64,
        request: &AttachRequest,
    ) -> Result<(), RemoteError> {
        let mut state = self.lock();
        if !state.products.contains_key(&product_id) {
            return Err(not_found("Product"));
        }
        let name = match state.materials.get(&request.raw_material_id) {
            Some(m) => m.name.clone(),
            None => return Err(not_found("Raw Material")),
        };
        state.next_edge_id += 1;
        let edge_id = state.next_edge_id;
        let Some(product) = state.products.get_mut(&product_id) else {
            return Err(not_found("Product"));
        };
        match product
            .composition
            .iter_mut()
            .find(|c| c.raw_material_id == request.raw_material_id)
        {
            Some(existing) => existing.quantity = request.quantity,
            None => product.composition.push(ProductComposition {
                id: Some(edge_id),
                raw_material_id: request.raw_material_id,
                raw_material_name: Some(name),
                quantity: request.quantity,
            }),
        }
        Ok(())
    }

    pub fn detach_material(&self, product_id: i64, raw_material_id: i64) -> Result<(), RemoteError> {
        let mut state = self.lock();
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or_else(|| not_found("Product"))?;
        product
            .composition
            .retain(|c| c.raw_material_id != raw_material_id);
        Ok(())
    }

    pub fn production_suggestion(&self) -> ProductionSuggestion {
        self.lock().suggestion.clone()
    }
}
