//! Which editing context is active.
//!
//! The [`Workbench`] hosts the modal state machine:
//!
//! ```text
//!   Idle --open_create--> Creating --close / successful submit--> Idle
//!   Idle --open_editor(id)--> Editing(id) --close / delete(id)--> Idle
//!   Creating --submit, attach failed--> Editing(new id)
//! ```
//!
//! Each composition editor lives inside the state that owns it, so the draft
//! and the persisted editor can never be active at the same time.

use std::sync::Arc;

use stockwright_api::Gateway;
use stockwright_api::models::{Product, ProductInput};
use thiserror::Error;

use crate::catalog::{self, CatalogError};
use crate::composition::{CompositionEditor, DraftComposition, PersistedComposition};
use crate::confirm::Confirm;
use crate::orchestrator::{self, CreationError};
use crate::production::ProductionViewer;
use crate::store::Store;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("another dialog is already open; close it first")]
    ModalOpen,

    #[error("no product is being created")]
    NotCreating,

    #[error("product {0} is not in the product list")]
    UnknownProduct(i64),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Creation(#[from] CreationError),
}

/// State of the "new product" dialog.
#[derive(Debug, Default)]
pub struct CreateSession {
    pub input: ProductInput,
    pub draft: DraftComposition,
}

/// State of the "edit product" dialog.
#[derive(Debug)]
pub struct EditSession {
    pub editor: PersistedComposition,
}

impl EditSession {
    pub fn product_id(&self) -> i64 {
        self.editor.product_id()
    }
}

#[derive(Debug, Default)]
pub enum Modal {
    #[default]
    Idle,
    Creating(CreateSession),
    Editing(EditSession),
}

impl Modal {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Product id of the `Editing` target.
    pub fn editing_product(&self) -> Option<i64> {
        match self {
            Self::Editing(session) => Some(session.product_id()),
            _ => None,
        }
    }
}

/// Shared session state behind every view: the gateway, the store, the
/// active modal and the production plan.
pub struct Workbench {
    gateway: Arc<dyn Gateway>,
    store: Store,
    modal: Modal,
    selected: Option<i64>,
    production: ProductionViewer,
}

impl Workbench {
    pub fn new(gateway: Arc<dyn Gateway>, store: Store) -> Self {
        Self {
            gateway,
            store,
            modal: Modal::Idle,
            selected: None,
            production: ProductionViewer::new(),
        }
    }

    pub fn gateway(&self) -> &dyn Gateway {
        self.gateway.as_ref()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn modal(&self) -> &Modal {
        &self.modal
    }

    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    /// Highlight a product row without opening anything.
    pub fn select(&mut self, product_id: Option<i64>) {
        self.selected = product_id;
    }

    pub fn production(&self) -> &ProductionViewer {
        &self.production
    }

    pub fn production_mut(&mut self) -> &mut ProductionViewer {
        &mut self.production
    }

    /// Refresh the production plan through this workbench's gateway.
    pub async fn refresh_production(&mut self) {
        self.production.refresh(self.gateway.as_ref()).await;
    }

    // -- Transitions --

    pub fn open_create(&mut self) -> Result<&mut CreateSession, SelectionError> {
        if !self.modal.is_idle() {
            return Err(SelectionError::ModalOpen);
        }
        tracing::debug!("opening create dialog");
        self.modal = Modal::Creating(CreateSession::default());
        self.creation_mut().ok_or(SelectionError::NotCreating)
    }

    pub fn open_editor(&mut self, product_id: i64) -> Result<(), SelectionError> {
        if !self.modal.is_idle() {
            return Err(SelectionError::ModalOpen);
        }
        if self.store.product(product_id).is_none() {
            return Err(SelectionError::UnknownProduct(product_id));
        }
        tracing::debug!(product_id, "opening edit dialog");
        self.selected = Some(product_id);
        self.modal = Modal::Editing(self.edit_session(product_id));
        Ok(())
    }

    /// Close whichever dialog is open. Closing the create dialog discards
    /// its draft.
    pub fn close(&mut self) {
        if let Modal::Creating(session) = &self.modal {
            tracing::debug!(drafted = session.draft.len(), "create dialog cancelled");
        }
        self.modal = Modal::Idle;
    }

    pub fn creation_mut(&mut self) -> Option<&mut CreateSession> {
        match &mut self.modal {
            Modal::Creating(session) => Some(session),
            _ => None,
        }
    }

    pub fn edit_session_mut(&mut self) -> Option<&mut EditSession> {
        match &mut self.modal {
            Modal::Editing(session) => Some(session),
            _ => None,
        }
    }

    /// Read-only view of the open dialog's composition editor.
    pub fn editor(&self) -> Option<&dyn CompositionEditor> {
        match &self.modal {
            Modal::Idle => None,
            Modal::Creating(session) => Some(&session.draft),
            Modal::Editing(session) => Some(&session.editor),
        }
    }

    /// The composition editor of the open dialog, whichever kind it is.
    pub fn active_editor(&mut self) -> Option<&mut dyn CompositionEditor> {
        match &mut self.modal {
            Modal::Idle => None,
            Modal::Creating(session) => Some(&mut session.draft),
            Modal::Editing(session) => Some(&mut session.editor),
        }
    }

    /// Run the creation orchestrator for the open create dialog.
    ///
    /// - Success: the dialog closes and the new product is selected.
    /// - Create failed: the dialog stays open with its draft intact.
    /// - Attach failed: the product exists, so the draft is discarded and the
    ///   edit dialog opens on the new product.
    pub async fn submit_creation(&mut self) -> Result<Product, SelectionError> {
        let Modal::Creating(session) = &mut self.modal else {
            return Err(SelectionError::NotCreating);
        };
        catalog::validate_product(&session.input)?;

        let result = orchestrator::run_creation(
            self.gateway.as_ref(),
            &self.store,
            &session.input,
            &mut session.draft,
        )
        .await;

        match result {
            Ok(product) => {
                self.modal = Modal::Idle;
                self.selected = Some(product.id);
                Ok(product)
            }
            Err(err) => {
                if let Some(product_id) = err.created_product_id() {
                    self.selected = Some(product_id);
                    self.modal = Modal::Editing(self.edit_session(product_id));
                }
                Err(err.into())
            }
        }
    }

    pub async fn update_product(
        &mut self,
        product_id: i64,
        input: &ProductInput,
    ) -> Result<Product, SelectionError> {
        Ok(catalog::update_product(self.gateway.as_ref(), &self.store, product_id, input).await?)
    }

    /// Delete a product. If it is the edit target the dialog closes, and the
    /// selection is cleared if it pointed at it.
    pub async fn delete_product(
        &mut self,
        product_id: i64,
        confirm: &dyn Confirm,
    ) -> Result<(), SelectionError> {
        catalog::delete_product(self.gateway.as_ref(), &self.store, product_id, confirm).await?;
        if self.modal.editing_product() == Some(product_id) {
            self.modal = Modal::Idle;
        }
        if self.selected == Some(product_id) {
            self.selected = None;
        }
        Ok(())
    }

    fn edit_session(&self, product_id: i64) -> EditSession {
        EditSession {
            editor: PersistedComposition::new(
                product_id,
                Arc::clone(&self.gateway),
                self.store.clone(),
            ),
        }
    }
}
