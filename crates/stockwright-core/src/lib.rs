//! Composition draft/synchronization engine for the inventory front end.
//!
//! - [`store`]: process-wide mirror of the remote material and product lists.
//! - [`composition`]: one editing interface over an unsaved draft and over an
//!   existing product's remote composition.
//! - [`orchestrator`]: create a product, then attach its drafted materials in
//!   order.
//! - [`selection`]: which product/modal is active, and therefore which editor.
//! - [`catalog`]: plain material/product CRUD with refresh-after-mutation.
//! - [`production`]: display state for the external production suggestion.

pub mod catalog;
pub mod composition;
pub mod confirm;
pub mod orchestrator;
pub mod production;
pub mod selection;
pub mod store;

pub use confirm::{Acknowledged, Confirm, Declined};
pub use store::Store;
