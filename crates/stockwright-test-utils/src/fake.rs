use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use stockwright_api::models::{
    AttachRequest, Product, ProductInput, ProductionSuggestion, RawMaterial, RawMaterialInput,
};
use stockwright_api::{Gateway, RemoteError};

use crate::backend::InMemoryBackend;

/// A gateway call as it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListMaterials,
    CreateMaterial { code: String },
    UpdateMaterial { id: i64 },
    DeleteMaterial { id: i64 },
    ListProducts,
    GetProduct { id: i64 },
    CreateProduct { code: String },
    UpdateProduct { id: i64 },
    DeleteProduct { id: i64 },
    Attach {
        product_id: i64,
        raw_material_id: i64,
        quantity: Decimal,
    },
    Detach {
        product_id: i64,
        raw_material_id: i64,
    },
    Suggestion,
}

/// Discriminant of [`Call`], used to target failures and filter the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    ListMaterials,
    CreateMaterial,
    UpdateMaterial,
    DeleteMaterial,
    ListProducts,
    GetProduct,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    Attach,
    Detach,
    Suggestion,
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::ListMaterials => CallKind::ListMaterials,
            Self::CreateMaterial { .. } => CallKind::CreateMaterial,
            Self::UpdateMaterial { .. } => CallKind::UpdateMaterial,
            Self::DeleteMaterial { .. } => CallKind::DeleteMaterial,
            Self::ListProducts => CallKind::ListProducts,
            Self::GetProduct { .. } => CallKind::GetProduct,
            Self::CreateProduct { .. } => CallKind::CreateProduct,
            Self::UpdateProduct { .. } => CallKind::UpdateProduct,
            Self::DeleteProduct { .. } => CallKind::DeleteProduct,
            Self::Attach { .. } => CallKind::Attach,
            Self::Detach { .. } => CallKind::Detach,
            Self::Suggestion => CallKind::Suggestion,
        }
    }

    /// Everything except list/get/suggestion reads.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self.kind(),
            CallKind::ListMaterials
                | CallKind::ListProducts
                | CallKind::GetProduct
                | CallKind::Suggestion
        )
    }
}

#[derive(Debug)]
struct FailureRule {
    kind: CallKind,
    /// 1-based occurrence to fail; `None` fails every occurrence.
    occurrence: Option<usize>,
    error: RemoteError,
}

/// Recording, failure-injecting [`Gateway`] over an [`InMemoryBackend`].
///
/// Every call yields to the scheduler once while "in flight" so that
/// overlapping calls would be observable through [`Self::max_in_flight`].
#[derive(Debug, Default)]
pub struct FakeGateway {
    backend: InMemoryBackend,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<Vec<FailureRule>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeGateway {
    pub fn new(backend: InMemoryBackend) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    pub fn backend(&self) -> &InMemoryBackend {
        &self.backend
    }

    /// Fail the `occurrence`-th (1-based) call of `kind` with `error`.
    pub fn fail_nth(&self, kind: CallKind, occurrence: usize, error: RemoteError) {
        self.lock_failures().push(FailureRule {
            kind,
            occurrence: Some(occurrence),
            error,
        });
    }

    /// Fail every call of `kind` with `error`.
    pub fn fail_all(&self, kind: CallKind, error: RemoteError) {
        self.lock_failures().push(FailureRule {
            kind,
            occurrence: None,
            error,
        });
    }

    /// All calls, in the order they were issued.
    pub fn calls(&self) -> Vec<Call> {
        self.lock_calls().clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<Call> {
        self.lock_calls()
            .iter()
            .filter(|c| c.kind() == kind)
            .cloned()
            .collect()
    }

    /// Mutating calls only, in issue order.
    pub fn mutations(&self) -> Vec<Call> {
        self.lock_calls()
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock_calls().clear();
    }

    /// Highest number of calls that were ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, Vec<FailureRule>> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call, simulate latency, and decide whether it fails.
    async fn issue(&self, call: Call) -> Result<(), RemoteError> {
        let kind = call.kind();
        let occurrence = {
            let mut calls = self.lock_calls();
            calls.push(call);
            calls.iter().filter(|c| c.kind() == kind).count()
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failures = self.lock_failures();
        let rule = failures.iter().find(|r| {
            r.kind == kind && r.occurrence.is_none_or(|n| n == occurrence)
        });
        match rule {
            Some(r) => Err(r.error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn list_materials(&self) -> Result<Vec<RawMaterial>, RemoteError> {
        self.issue(Call::ListMaterials).await?;
        Ok(self.backend.list_materials())
    }

    async fn create_material(&self, input: &RawMaterialInput) -> Result<RawMaterial, RemoteError> {
        self.issue(Call::CreateMaterial {
            code: input.code.clone(),
        })
        .await?;
        self.backend.create_material(input)
    }

    async fn update_material(
        &self,
        id: i64,
        input: &RawMaterialInput,
    ) -> Result<RawMaterial, RemoteError> {
        self.issue(Call::UpdateMaterial { id }).await?;
        self.backend.update_material(id, input)
    }

    async fn delete_material(&self, id: i64) -> Result<(), RemoteError> {
        self.issue(Call::DeleteMaterial { id }).await?;
        self.backend.delete_material(id)
    }

    async fn list_products(&self) -> Result<Vec<Product>, RemoteError> {
        self.issue(Call::ListProducts).await?;
        Ok(self.backend.list_products())
    }

    async fn get_product(&self, id: i64) -> Result<Product, RemoteError> {
        self.issue(Call::GetProduct { id }).await?;
        self.backend.get_product(id)
    }

    async fn create_product(&self, input: &ProductInput) -> Result<Product, RemoteError> {
        self.issue(Call::CreateProduct {
            code: input.code.clone(),
        })
        .await?;
        self.backend.create_product(input)
    }

    async fn update_product(&self, id: i64, input: &ProductInput) -> Result<Product, RemoteError> {
        self.issue(Call::UpdateProduct { id }).await?;
        self.backend.update_product(id, input)
    }

    async fn delete_product(&self, id: i64) -> Result<(), RemoteError> {
        self.issue(Call::DeleteProduct { id }).await?;
        self.backend.delete_product(id)
    }

    async fn attach_material(
        &self,
        product_id: i64,
        request: &AttachRequest,
    ) -> Result<(), RemoteError> {
        self.issue(Call::Attach {
            product_id,
            raw_material_id: request.raw_material_id,
            quantity: request.quantity,
        })
        .await?;
        self.backend.attach_material(product_id, request)
    }

    async fn detach_material(&self, product_id: i64, raw_material_id: i64) -> Result<(), RemoteError> {
        self.issue(Call::Detach {
            product_id,
            raw_material_id,
        })
        .await?;
        self.backend.detach_material(product_id, raw_material_id)
    }

    async fn production_suggestion(&self) -> Result<ProductionSuggestion, RemoteError> {
        self.issue(Call::Suggestion).await?;
        Ok(self.backend.production_suggestion())
    }
}
