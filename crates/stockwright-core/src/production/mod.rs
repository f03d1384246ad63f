//! Display state for the production suggestion.
//!
//! The suggestion is computed by the service; this module only fetches it on
//! first display or on an explicit refresh and tracks what to show.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use stockwright_api::models::{ProductionSuggestion, SuggestionItem};
use stockwright_api::{Gateway, RemoteError};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlanState {
    #[default]
    NotLoaded,
    Loading,
    Loaded {
        suggestion: ProductionSuggestion,
        fetched_at: DateTime<Utc>,
    },
    Failed(String),
}

/// What the plan view should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanView<'a> {
    NotLoaded,
    /// Shown in place of the table.
    Loading,
    Failed(&'a str),
    /// The service found nothing producible with current stock.
    NoProductionPossible,
    Table {
        items: &'a [SuggestionItem],
        total_value: Decimal,
    },
}

#[derive(Debug, Default)]
pub struct ProductionViewer {
    state: PlanState,
}

impl ProductionViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PlanState {
        &self.state
    }

    /// The refresh control is disabled while a fetch is in flight.
    pub fn is_refresh_enabled(&self) -> bool {
        !matches!(self.state, PlanState::Loading)
    }

    pub fn view(&self) -> PlanView<'_> {
        match &self.state {
            PlanState::NotLoaded => PlanView::NotLoaded,
            PlanState::Loading => PlanView::Loading,
            PlanState::Failed(message) => PlanView::Failed(message),
            PlanState::Loaded { suggestion, .. } if suggestion.is_empty() => {
                PlanView::NoProductionPossible
            }
            PlanState::Loaded { suggestion, .. } => PlanView::Table {
                items: &suggestion.items,
                total_value: suggestion.total_value,
            },
        }
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            PlanState::Loaded { fetched_at, .. } => Some(*fetched_at),
            _ => None,
        }
    }

    /// Enter the loading state. Returns `false` if a fetch is already running.
    pub fn begin_refresh(&mut self) -> bool {
        if !self.is_refresh_enabled() {
            return false;
        }
        self.state = PlanState::Loading;
        true
    }

    pub fn finish_refresh(&mut self, result: Result<ProductionSuggestion, RemoteError>) {
        self.state = match result {
            Ok(suggestion) => {
                tracing::debug!(items = suggestion.items.len(), "production suggestion loaded");
                PlanState::Loaded {
                    suggestion,
                    fetched_at: Utc::now(),
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "production suggestion fetch failed");
                PlanState::Failed(err.to_string())
            }
        };
    }

    /// Fetch the suggestion. No-op while a fetch is already in flight.
    pub async fn refresh(&mut self, gateway: &dyn Gateway) {
        if !self.begin_refresh() {
            return;
        }
        let result = gateway.production_suggestion().await;
        self.finish_refresh(result);
    }

    /// Fetch on first display only.
    pub async fn ensure_loaded(&mut self, gateway: &dyn Gateway) {
        if self.state == PlanState::NotLoaded {
            self.refresh(gateway).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(code: &str) -> SuggestionItem {
        SuggestionItem {
            product_code: code.to_string(),
            product_name: format!("{code} name"),
            quantity: 4,
            subtotal: Decimal::from(200),
        }
    }

    #[test]
    fn empty_suggestion_is_an_explicit_state() {
        let mut viewer = ProductionViewer::new();
        assert!(viewer.begin_refresh());
        viewer.finish_refresh(Ok(ProductionSuggestion::default()));
        assert_eq!(viewer.view(), PlanView::NoProductionPossible);
    }

    #[test]
    fn loaded_suggestion_renders_as_table() {
        let mut viewer = ProductionViewer::new();
        viewer.begin_refresh();
        viewer.finish_refresh(Ok(ProductionSuggestion {
            items: vec![item("P1")],
            total_value: Decimal::from(200),
        }));
        match viewer.view() {
            PlanView::Table { items, total_value } => {
                assert_eq!(items.len(), 1);
                assert_eq!(total_value, Decimal::from(200));
            }
            other => panic!("unexpected view {other:?}"),
        }
        assert!(viewer.fetched_at().is_some());
    }

    #[test]
    fn refresh_is_disabled_while_loading() {
        let mut viewer = ProductionViewer::new();
        assert!(viewer.begin_refresh());
        assert!(!viewer.is_refresh_enabled());
        assert_eq!(viewer.view(), PlanView::Loading);
        assert!(!viewer.begin_refresh());
    }

    #[test]
    fn failure_is_surfaced_and_refresh_reenabled() {
        let mut viewer = ProductionViewer::new();
        viewer.begin_refresh();
        viewer.finish_refresh(Err(RemoteError::Transport("connection refused".into())));
        match viewer.view() {
            PlanView::Failed(msg) => assert!(msg.contains("connection refused")),
            other => panic!("unexpected view {other:?}"),
        }
        assert!(viewer.is_refresh_enabled());
    }
}
