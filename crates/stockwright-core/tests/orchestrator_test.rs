//! Tests for the product creation orchestrator.

use std::sync::Arc;

use rust_decimal::Decimal;
use stockwright_api::RemoteError;
use stockwright_api::models::ProductInput;
use stockwright_core::Store;
use stockwright_core::composition::DraftComposition;
use stockwright_core::orchestrator::{CreationError, run_creation};
use stockwright_test_utils::{Call, CallKind, FakeGateway, InMemoryBackend, dec};

fn chair() -> ProductInput {
    ProductInput {
        code: "P1".to_string(),
        name: "Chair".to_string(),
        value: dec(50),
    }
}

fn gateway_with_materials(n: usize) -> (Arc<FakeGateway>, Vec<i64>) {
    let backend = InMemoryBackend::new();
    let ids = (1..=n)
        .map(|i| {
            backend
                .seed_material(&format!("M{i}"), &format!("Material {i}"), dec(100))
                .id
        })
        .collect();
    (Arc::new(FakeGateway::new(backend)), ids)
}

fn attach_calls(gateway: &FakeGateway) -> Vec<i64> {
    gateway
        .calls_of(CallKind::Attach)
        .into_iter()
        .map(|c| match c {
            Call::Attach {
                raw_material_id, ..
            } => raw_material_id,
            other => panic!("unexpected call {other:?}"),
        })
        .collect()
}

#[tokio::test]
async fn empty_draft_issues_exactly_one_create() {
    let (gateway, _) = gateway_with_materials(0);
    let store = Store::new();
    let mut draft = DraftComposition::new();

    let product = run_creation(gateway.as_ref(), &store, &chair(), &mut draft)
        .await
        .unwrap();

    assert_eq!(
        gateway.mutations(),
        vec![Call::CreateProduct {
            code: "P1".to_string()
        }]
    );
    assert!(gateway.calls_of(CallKind::Attach).is_empty());
    assert_eq!(product.code, "P1");
    assert!(store.product(product.id).is_some());
}

#[tokio::test]
async fn attaches_run_in_draft_order_one_at_a_time() {
    let (gateway, ids) = gateway_with_materials(4);
    let store = Store::new();
    let mut draft = DraftComposition::new();
    // Deliberately not in id order.
    for (id, qty) in [(ids[2], 3), (ids[0], 1), (ids[3], 4), (ids[1], 2)] {
        draft.add(id, dec(qty)).unwrap();
    }

    let product = run_creation(gateway.as_ref(), &store, &chair(), &mut draft)
        .await
        .unwrap();

    let mutations = gateway.mutations();
    assert_eq!(mutations.len(), 1 + 4);
    assert_eq!(mutations[0].kind(), CallKind::CreateProduct);
    assert_eq!(attach_calls(&gateway), vec![ids[2], ids[0], ids[3], ids[1]]);
    assert_eq!(gateway.max_in_flight(), 1);

    assert!(draft.is_empty(), "draft is cleared on success");
    assert_eq!(product.composition.len(), 4);
}

#[tokio::test]
async fn create_failure_attaches_nothing_and_keeps_the_draft() {
    let (gateway, ids) = gateway_with_materials(2);
    gateway.fail_all(
        CallKind::CreateProduct,
        RemoteError::Status {
            status: 409,
            message: "Product code P1 already exists".to_string(),
        },
    );
    let store = Store::new();
    let mut draft = DraftComposition::new();
    draft.add(ids[0], dec(1)).unwrap();
    draft.add(ids[1], dec(2)).unwrap();

    let err = run_creation(gateway.as_ref(), &store, &chair(), &mut draft)
        .await
        .unwrap_err();

    assert!(matches!(err, CreationError::CreateFailed(ref e) if e.is_conflict()));
    assert!(err.to_string().contains("Product code P1 already exists"));
    assert_eq!(err.created_product_id(), None);
    assert!(gateway.calls_of(CallKind::Attach).is_empty());
    assert_eq!(draft.len(), 2);
    assert_eq!(gateway.backend().product_count(), 0);
}

#[tokio::test]
async fn attach_failure_stops_the_sequence_without_rollback() {
    let (gateway, ids) = gateway_with_materials(3);
    gateway.fail_nth(
        CallKind::Attach,
        2,
        RemoteError::Transport("connection reset".to_string()),
    );
    let store = Store::new();
    let mut draft = DraftComposition::new();
    for id in &ids {
        draft.add(*id, dec(1)).unwrap();
    }

    let err = run_creation(gateway.as_ref(), &store, &chair(), &mut draft)
        .await
        .unwrap_err();

    // Calls 1 and 2 were issued, call 3 never was.
    assert_eq!(attach_calls(&gateway), vec![ids[0], ids[1]]);
    match &err {
        CreationError::AttachFailed {
            product,
            attached,
            failed,
            not_attempted,
            ..
        } => {
            assert_eq!(product.code, "P1");
            assert_eq!(attached, &vec![ids[0]]);
            assert_eq!(*failed, ids[1]);
            assert_eq!(not_attempted, &vec![ids[2]]);
        }
        other => panic!("unexpected error {other:?}"),
    }

    // The product and the first material stay on the server and the store
    // shows the partial composition.
    let id = err.created_product_id().unwrap();
    let cached = store.product(id).unwrap();
    assert_eq!(cached.composition.len(), 1);
    assert_eq!(cached.composition[0].raw_material_id, ids[0]);
    assert_eq!(draft.len(), 3, "the orchestrator leaves the draft to the caller");
}

#[tokio::test]
async fn chair_scenario() {
    let backend = InMemoryBackend::new();
    let wood = backend.seed_material("M1", "Wood", dec(100));
    let gateway = Arc::new(FakeGateway::new(backend));
    let store = Store::new();
    let mut draft = DraftComposition::new();
    draft.add(wood.id, dec(2)).unwrap();

    run_creation(gateway.as_ref(), &store, &chair(), &mut draft)
        .await
        .unwrap();

    let mutations = gateway.mutations();
    assert_eq!(mutations.len(), 2);
    assert_eq!(
        mutations[0],
        Call::CreateProduct {
            code: "P1".to_string()
        }
    );
    assert!(matches!(
        mutations[1],
        Call::Attach { raw_material_id, quantity, .. }
            if raw_material_id == wood.id && quantity == dec(2)
    ));

    let products = store.products();
    let p1 = products
        .items()
        .iter()
        .find(|p| p.code == "P1")
        .expect("P1 is in the store");
    assert_eq!(p1.name, "Chair");
    assert_eq!(p1.composition.len(), 1);
    assert_eq!(p1.composition[0].raw_material_id, wood.id);
    assert_eq!(p1.composition[0].quantity, Decimal::from(2));
    assert_eq!(p1.composition[0].raw_material_name.as_deref(), Some("Wood"));
}

#[tokio::test]
async fn refresh_failure_after_success_still_reports_success() {
    let (gateway, ids) = gateway_with_materials(1);
    gateway.fail_all(
        CallKind::ListProducts,
        RemoteError::Transport("timed out".to_string()),
    );
    let store = Store::new();
    let mut draft = DraftComposition::new();
    draft.add(ids[0], dec(1)).unwrap();

    let product = run_creation(gateway.as_ref(), &store, &chair(), &mut draft)
        .await
        .unwrap();

    assert_eq!(product.code, "P1");
    assert!(draft.is_empty());
    assert!(store.products().error().unwrap().contains("timed out"));
}
