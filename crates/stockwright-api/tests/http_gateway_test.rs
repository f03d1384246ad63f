//! End-to-end tests for `HttpGateway` against the axum stub server.

use std::time::Duration;

use rust_decimal::Decimal;
use stockwright_api::models::{
    AttachRequest, ProductInput, ProductionSuggestion, RawMaterialInput, SuggestionItem,
};
use stockwright_api::{ApiConfig, Gateway, HttpGateway, RemoteError};
use stockwright_test_utils::{InMemoryBackend, dec, spawn_stub_server};

fn gateway_for(base_url: &str) -> HttpGateway {
    HttpGateway::new(ApiConfig::new(base_url).with_timeout(Duration::from_secs(5)))
        .expect("client should build")
}

fn chair() -> ProductInput {
    ProductInput {
        code: "P1".to_string(),
        name: "Chair".to_string(),
        value: dec(50),
    }
}

#[tokio::test]
async fn material_lifecycle_over_http() {
    let backend = InMemoryBackend::new();
    let server = spawn_stub_server(backend.clone()).await;
    let gw = gateway_for(&server.base_url);

    let created = gw
        .create_material(&RawMaterialInput {
            code: "M1".to_string(),
            name: "Wood".to_string(),
            stock_quantity: dec(100),
        })
        .await
        .unwrap();
    assert!(created.is_persisted());
    assert_eq!(created.stock_quantity, dec(100));

    let updated = gw
        .update_material(
            created.id,
            &RawMaterialInput {
                code: "M1".to_string(),
                name: "Oak".to_string(),
                stock_quantity: dec(80),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Oak");

    let listed = gw.list_materials().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Oak");

    gw.delete_material(created.id).await.unwrap();
    assert!(gw.list_materials().await.unwrap().is_empty());
}

#[tokio::test]
async fn product_composition_round_trip_over_http() {
    let backend = InMemoryBackend::new();
    let wood = backend.seed_material("M1", "Wood", dec(100));
    let server = spawn_stub_server(backend.clone()).await;
    let gw = gateway_for(&server.base_url);

    let product = gw.create_product(&chair()).await.unwrap();
    assert!(product.composition.is_empty());

    gw.attach_material(
        product.id,
        &AttachRequest {
            raw_material_id: wood.id,
            quantity: dec(2),
        },
    )
    .await
    .unwrap();

    // Upsert: same material again overwrites.
    gw.attach_material(
        product.id,
        &AttachRequest {
            raw_material_id: wood.id,
            quantity: Decimal::new(35, 1),
        },
    )
    .await
    .unwrap();

    let fetched = gw.get_product(product.id).await.unwrap();
    assert_eq!(fetched.composition.len(), 1);
    let edge = &fetched.composition[0];
    assert_eq!(edge.raw_material_id, wood.id);
    assert_eq!(edge.raw_material_name.as_deref(), Some("Wood"));
    assert_eq!(edge.quantity, Decimal::new(35, 1));

    gw.detach_material(product.id, wood.id).await.unwrap();
    let products = gw.list_products().await.unwrap();
    assert!(products[0].composition.is_empty());

    gw.delete_product(product.id).await.unwrap();
    assert!(gw.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_product_changes_base_fields_only() {
    let backend = InMemoryBackend::new();
    let wood = backend.seed_material("M1", "Wood", dec(100));
    let seeded = backend.seed_product("P1", "Chair", dec(50));
    backend
        .attach_material(
            seeded.id,
            &AttachRequest {
                raw_material_id: wood.id,
                quantity: dec(2),
            },
        )
        .unwrap();
    let server = spawn_stub_server(backend.clone()).await;
    let gw = gateway_for(&server.base_url);

    let updated = gw
        .update_product(
            seeded.id,
            &ProductInput {
                code: "P1".to_string(),
                name: "Armchair".to_string(),
                value: dec(75),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Armchair");
    assert_eq!(updated.value, dec(75));
    assert_eq!(updated.composition.len(), 1);
}

#[tokio::test]
async fn not_found_carries_service_message() {
    let server = spawn_stub_server(InMemoryBackend::new()).await;
    let gw = gateway_for(&server.base_url);

    let err = gw.get_product(42).await.unwrap_err();
    assert!(err.is_not_found(), "expected 404, got {err:?}");
    assert_eq!(err.to_string(), "Product not found");
}

#[tokio::test]
async fn duplicate_code_is_conflict() {
    let backend = InMemoryBackend::new();
    backend.seed_product("P1", "Chair", dec(50));
    let server = spawn_stub_server(backend).await;
    let gw = gateway_for(&server.base_url);

    let err = gw.create_product(&chair()).await.unwrap_err();
    assert!(err.is_conflict(), "expected 409, got {err:?}");
    assert!(err.to_string().contains("P1"));
}

#[tokio::test]
async fn suggestion_is_passed_through() {
    let backend = InMemoryBackend::new();
    backend.set_suggestion(ProductionSuggestion {
        items: vec![SuggestionItem {
            product_code: "P1".to_string(),
            product_name: "Chair".to_string(),
            quantity: 3,
            subtotal: dec(150),
        }],
        total_value: dec(150),
    });
    let server = spawn_stub_server(backend).await;
    let gw = gateway_for(&server.base_url);

    let suggestion = gw.production_suggestion().await.unwrap();
    assert_eq!(suggestion.items.len(), 1);
    assert_eq!(suggestion.items[0].quantity, 3);
    assert_eq!(suggestion.total_value, dec(150));
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
    // Bind and immediately drop a listener so the port is very likely closed.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let gw = gateway_for(&format!("http://127.0.0.1:{port}/api"));

    let err = gw.list_products().await.unwrap_err();
    assert!(
        matches!(err, RemoteError::Transport(_)),
        "expected transport error, got {err:?}"
    );
}
