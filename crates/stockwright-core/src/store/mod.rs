//! Process-wide cache of the remote material and product collections.
//!
//! The store is only ever written by fetch completions: every refresh is a
//! full list fetch whose result replaces the collection wholesale. Mutations
//! elsewhere in the crate go through the gateway and then ask the store to
//! refresh, so duplicate checks always see the last completed fetch.
//!
//! Fetches are versioned. Each one takes a ticket when it starts, and a
//! completion is applied only if no later-started fetch has completed first.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use stockwright_api::models::{Product, RawMaterial};
use stockwright_api::{Gateway, RemoteError};

/// One cached collection plus its fetch bookkeeping.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Arc<Vec<T>>,
    error: Option<String>,
    version: u64,
    fetched_at: Option<DateTime<Utc>>,
    next_ticket: u64,
    applied_ticket: u64,
    outstanding: usize,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            error: None,
            version: 0,
            fetched_at: None,
            next_ticket: 0,
            applied_ticket: 0,
            outstanding: 0,
        }
    }
}

impl<T> Collection<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True while any fetch for this collection is outstanding.
    pub fn is_loading(&self) -> bool {
        self.outstanding > 0
    }

    /// Message of the most recent failed list fetch, cleared by the next
    /// successful one.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of successful fetches applied so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    fn begin(&mut self) -> u64 {
        self.next_ticket += 1;
        self.outstanding += 1;
        self.next_ticket
    }

    /// Apply a completed fetch. Returns `false` when the result was stale.
    fn finish(&mut self, ticket: u64, result: Result<Vec<T>, &RemoteError>) -> bool {
        self.outstanding = self.outstanding.saturating_sub(1);
        if ticket <= self.applied_ticket {
            return false;
        }
        self.applied_ticket = ticket;
        match result {
            Ok(items) => {
                self.items = Arc::new(items);
                self.error = None;
                self.version += 1;
                self.fetched_at = Some(Utc::now());
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
        true
    }
}

#[derive(Debug, Default)]
struct StoreState {
    materials: Collection<RawMaterial>,
    products: Collection<Product>,
}

/// Cheap-to-clone handle to the shared cache.
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<StoreState>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    // -- Snapshots --

    pub fn materials(&self) -> Collection<RawMaterial> {
        self.read().materials.clone()
    }

    pub fn products(&self) -> Collection<Product> {
        self.read().products.clone()
    }

    pub fn product(&self, id: i64) -> Option<Product> {
        self.read()
            .products
            .items()
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn material(&self, id: i64) -> Option<RawMaterial> {
        self.read()
            .materials
            .items()
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    /// Display name of a material, if it is in the cache.
    pub fn material_name(&self, id: i64) -> Option<String> {
        self.material(id).map(|m| m.name)
    }

    // -- Refresh --

    /// Re-fetch the material list and replace the cached collection.
    pub async fn refresh_materials(&self, gateway: &dyn Gateway) -> Result<(), RemoteError> {
        self.refresh_with("materials", |s| &mut s.materials, gateway.list_materials())
            .await
    }

    /// Re-fetch the product list (with compositions) and replace the cache.
    pub async fn refresh_products(&self, gateway: &dyn Gateway) -> Result<(), RemoteError> {
        self.refresh_with("products", |s| &mut s.products, gateway.list_products())
            .await
    }

    async fn refresh_with<T>(
        &self,
        collection: &'static str,
        field: fn(&mut StoreState) -> &mut Collection<T>,
        fetch: impl Future<Output = Result<Vec<T>, RemoteError>>,
    ) -> Result<(), RemoteError> {
        let ticket = field(&mut self.write()).begin();
        let result = fetch.await;

        let mut state = self.write();
        let target = field(&mut state);
        match result {
            Ok(items) => {
                let count = items.len();
                if target.finish(ticket, Ok(items)) {
                    tracing::debug!(collection, ticket, count, "collection refreshed");
                } else {
                    tracing::debug!(collection, ticket, "discarded stale fetch result");
                }
                Ok(())
            }
            Err(err) => {
                let applied = target.finish(ticket, Err(&err));
                tracing::warn!(collection, ticket, applied, error = %err, "collection fetch failed");
                Err(err)
            }
        }
    }

    /// Refresh both collections, materials first. Both are attempted even if
    /// the first fails; the first error is returned.
    pub async fn refresh_all(&self, gateway: &dyn Gateway) -> Result<(), RemoteError> {
        let materials = self.refresh_materials(gateway).await;
        let products = self.refresh_products(gateway).await;
        materials.and(products)
    }
}
