//! Material and product maintenance with refresh-after-mutation.

use std::sync::Arc;

use stockwright_api::models::{AttachRequest, ProductInput, RawMaterialInput};
use stockwright_core::catalog::{self, CatalogError};
use stockwright_core::{Acknowledged, Declined, Store};
use stockwright_test_utils::{CallKind, FakeGateway, InMemoryBackend, dec};

async fn setup() -> (Arc<FakeGateway>, Store) {
    let backend = InMemoryBackend::new();
    let wood = backend.seed_material("M1", "Wood", dec(100));
    backend.seed_material("M2", "Glue", dec(5));
    let chair = backend.seed_product("P1", "Chair", dec(50));
    backend
        .attach_material(
            chair.id,
            &AttachRequest {
                raw_material_id: wood.id,
                quantity: dec(2),
            },
        )
        .unwrap();
    let gateway = Arc::new(FakeGateway::new(backend));
    let store = Store::new();
    store.refresh_all(gateway.as_ref()).await.unwrap();
    gateway.clear_calls();
    (gateway, store)
}

#[tokio::test]
async fn created_material_appears_after_refresh() {
    let (gateway, store) = setup().await;
    let input = RawMaterialInput {
        code: "M3".to_string(),
        name: "Varnish".to_string(),
        stock_quantity: dec(12),
    };

    let material = catalog::create_material(gateway.as_ref(), &store, &input)
        .await
        .unwrap();

    assert!(material.is_persisted());
    assert_eq!(store.material_name(material.id).as_deref(), Some("Varnish"));
    assert_eq!(store.materials().len(), 3);
}

#[tokio::test]
async fn renaming_a_material_refreshes_composition_names() {
    let (gateway, store) = setup().await;
    let input = RawMaterialInput {
        code: "M1".to_string(),
        name: "Oak".to_string(),
        stock_quantity: dec(100),
    };

    catalog::update_material(gateway.as_ref(), &store, 1, &input)
        .await
        .unwrap();

    let chair = store.product(1).unwrap();
    assert_eq!(
        chair.composition[0].raw_material_name.as_deref(),
        Some("Oak")
    );
}

#[tokio::test]
async fn declined_material_delete_issues_no_call() {
    let (gateway, store) = setup().await;

    let err = catalog::delete_material(gateway.as_ref(), &store, 2, &Declined)
        .await
        .unwrap_err();

    assert_eq!(err, CatalogError::NotConfirmed);
    assert!(gateway.calls().is_empty());
    assert_eq!(store.materials().len(), 2);
}

#[tokio::test]
async fn conflict_message_is_shown_verbatim() {
    let (gateway, store) = setup().await;
    let version = store.materials().version();

    let err = catalog::delete_material(gateway.as_ref(), &store, 1, &Acknowledged)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Raw Material is used by a product composition"
    );
    assert_eq!(store.materials().version(), version);
    assert_eq!(store.materials().len(), 2);
}

#[tokio::test]
async fn deleting_an_unused_material_refreshes_both_collections() {
    let (gateway, store) = setup().await;

    catalog::delete_material(gateway.as_ref(), &store, 2, &Acknowledged)
        .await
        .unwrap();

    assert!(store.material(2).is_none());
    let kinds: Vec<CallKind> = gateway.calls().iter().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            CallKind::DeleteMaterial,
            CallKind::ListMaterials,
            CallKind::ListProducts
        ]
    );
}

#[tokio::test]
async fn updating_base_fields_keeps_the_composition() {
    let (gateway, store) = setup().await;
    let input = ProductInput {
        code: "P1".to_string(),
        name: "Armchair".to_string(),
        value: dec(80),
    };

    catalog::update_product(gateway.as_ref(), &store, 1, &input)
        .await
        .unwrap();

    let chair = store.product(1).unwrap();
    assert_eq!(chair.name, "Armchair");
    assert_eq!(chair.value, dec(80));
    assert_eq!(chair.composition.len(), 1);
}

#[tokio::test]
async fn invalid_input_is_rejected_locally() {
    let (gateway, store) = setup().await;
    let input = ProductInput {
        code: String::new(),
        name: "Nameless".to_string(),
        value: dec(1),
    };

    let err = catalog::update_product(gateway.as_ref(), &store, 1, &input)
        .await
        .unwrap_err();

    assert_eq!(err, CatalogError::Blank { field: "code" });
    assert!(gateway.calls().is_empty());
}
