//! Integration tests for the `stockwright` binary.
//!
//! Each test serves an in-memory backend over HTTP and runs the compiled
//! binary against it with an isolated config directory.

use std::process::Output;

use stockwright_api::models::{AttachRequest, ProductionSuggestion, SuggestionItem};
use stockwright_test_utils::{InMemoryBackend, StubServer, dec, spawn_stub_server};
use tempfile::TempDir;
use tokio::process::Command;

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

struct Harness {
    backend: InMemoryBackend,
    server: StubServer,
    config_home: TempDir,
}

async fn harness() -> Harness {
    let backend = InMemoryBackend::new();
    let server = spawn_stub_server(backend.clone()).await;
    Harness {
        backend,
        server,
        config_home: TempDir::new().expect("failed to create temp dir"),
    }
}

impl Harness {
    async fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_stockwright"))
            .args(args)
            .arg("--api-url")
            .arg(&self.server.base_url)
            .env("XDG_CONFIG_HOME", self.config_home.path())
            .env_remove("STOCKWRIGHT_API_URL")
            .env_remove("RUST_LOG")
            .output()
            .await
            .expect("failed to run stockwright")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed\nstdout: {}\nstderr: {}",
        stdout(output),
        stderr(output)
    );
}

// -----------------------------------------------------------------------
// Materials
// -----------------------------------------------------------------------

#[tokio::test]
async fn material_add_then_list() {
    let h = harness().await;

    let out = h
        .run(&["material", "add", "--code", "M1", "--name", "Wood", "--stock", "120.5"])
        .await;
    assert_success(&out);
    assert!(stdout(&out).contains("Raw material M1 created"));

    let out = h.run(&["material", "list"]).await;
    assert_success(&out);
    let text = stdout(&out);
    assert!(text.contains("Wood"), "list output: {text}");
    assert!(text.contains("120.5"), "list output: {text}");
    assert_eq!(h.backend.list_materials().len(), 1);
}

#[tokio::test]
async fn material_delete_with_yes_skips_prompt() {
    let h = harness().await;
    let glue = h.backend.seed_material("M9", "Glue", dec(3));

    let out = h
        .run(&["material", "delete", &glue.id.to_string(), "--yes"])
        .await;
    assert_success(&out);
    assert!(h.backend.list_materials().is_empty());
}

#[tokio::test]
async fn negative_stock_is_rejected_locally() {
    let h = harness().await;
    let out = h
        .run(&["material", "add", "--code", "M1", "--name", "Wood", "--stock=-1"])
        .await;
    assert!(!out.status.success());
    assert!(h.backend.list_materials().is_empty());
}

// -----------------------------------------------------------------------
// Products
// -----------------------------------------------------------------------

#[tokio::test]
async fn product_create_attaches_materials_in_order() {
    let h = harness().await;
    let wood = h.backend.seed_material("M1", "Wood", dec(100));
    let screws = h.backend.seed_material("M2", "Screws", dec(500));

    let out = h
        .run(&[
            "product",
            "create",
            "--code",
            "P1",
            "--name",
            "Chair",
            "--value",
            "150",
            "--material",
            &format!("{}:2", wood.id),
            "--material",
            &format!("{}:8", screws.id),
        ])
        .await;
    assert_success(&out);
    assert!(stdout(&out).contains("(2 raw materials)"), "{}", stdout(&out));

    let chair = h.backend.product_by_code("P1").expect("product created");
    let ids: Vec<i64> = chair.composition.iter().map(|c| c.raw_material_id).collect();
    assert_eq!(ids, vec![wood.id, screws.id]);

    let out = h.run(&["product", "show", &chair.id.to_string()]).await;
    assert_success(&out);
    let text = stdout(&out);
    assert!(text.contains("Product: Chair (P1)"), "show output: {text}");
    assert!(text.contains("Screws"), "show output: {text}");
}

#[tokio::test]
async fn show_reports_the_service_message_for_a_missing_product() {
    let h = harness().await;
    let out = h.run(&["product", "show", "42"]).await;
    assert!(!out.status.success());
    let err = stderr(&out);
    assert!(err.contains("could not load product 42"), "stderr: {err}");
    assert!(err.contains("not found"), "stderr: {err}");
}

#[tokio::test]
async fn duplicate_material_flags_are_refused_before_any_call() {
    let h = harness().await;
    let wood = h.backend.seed_material("M1", "Wood", dec(100));
    let spec = format!("{}:2", wood.id);

    let out = h
        .run(&[
            "product", "create", "--code", "P1", "--name", "Chair", "--value", "150",
            "--material", &spec, "--material", &spec,
        ])
        .await;
    assert!(!out.status.success());
    assert_eq!(h.backend.product_count(), 0);
}

#[tokio::test]
async fn duplicate_product_code_fails() {
    let h = harness().await;
    h.backend.seed_product("P1", "Stool", dec(20));

    let out = h
        .run(&["product", "create", "--code", "P1", "--name", "Chair", "--value", "150"])
        .await;
    assert!(!out.status.success());
    assert_eq!(h.backend.product_count(), 1);
}

#[tokio::test]
async fn set_quantity_and_detach() {
    let h = harness().await;
    let wood = h.backend.seed_material("M1", "Wood", dec(100));
    let stool = h.backend.seed_product("P0", "Stool", dec(20));
    h.backend
        .attach_material(
            stool.id,
            &AttachRequest {
                raw_material_id: wood.id,
                quantity: dec(2),
            },
        )
        .unwrap();
    let id = stool.id.to_string();
    let material = wood.id.to_string();

    let out = h
        .run(&["product", "set-quantity", &id, "--material", &material, "--quantity", "3"])
        .await;
    assert_success(&out);
    let composition = h.backend.product(stool.id).unwrap().composition;
    assert_eq!(composition[0].quantity, dec(3));

    let out = h
        .run(&["product", "detach", &id, "--material", &material, "--yes"])
        .await;
    assert_success(&out);
    assert!(h.backend.product(stool.id).unwrap().composition.is_empty());
}

#[tokio::test]
async fn product_delete_with_yes() {
    let h = harness().await;
    let stool = h.backend.seed_product("P0", "Stool", dec(20));

    let out = h
        .run(&["product", "delete", &stool.id.to_string(), "-y"])
        .await;
    assert_success(&out);
    assert_eq!(h.backend.product_count(), 0);
}

// -----------------------------------------------------------------------
// Plan
// -----------------------------------------------------------------------

#[tokio::test]
async fn plan_reports_when_nothing_can_be_built() {
    let h = harness().await;
    let out = h.run(&["plan"]).await;
    assert_success(&out);
    assert!(stdout(&out).contains("No production possible with the current stock."));
}

#[tokio::test]
async fn plan_prints_items_and_total() {
    let h = harness().await;
    h.backend.set_suggestion(ProductionSuggestion {
        items: vec![SuggestionItem {
            product_code: "P1".to_string(),
            product_name: "Chair".to_string(),
            quantity: 4,
            subtotal: dec(600),
        }],
        total_value: dec(600),
    });

    let out = h.run(&["plan"]).await;
    assert_success(&out);
    let text = stdout(&out);
    assert!(text.contains("Chair"), "plan output: {text}");
    assert!(text.contains("600"), "plan output: {text}");
}

// -----------------------------------------------------------------------
// Config
// -----------------------------------------------------------------------

#[tokio::test]
async fn init_writes_config_and_refuses_to_clobber() {
    let h = harness().await;

    let out = h.run(&["init"]).await;
    assert_success(&out);
    let path = h.config_home.path().join("stockwright").join("config.toml");
    let written = std::fs::read_to_string(&path).expect("config written");
    assert!(written.contains(&h.server.base_url), "config: {written}");

    let out = h.run(&["init"]).await;
    assert!(!out.status.success());
    assert!(stderr(&out).contains("--force"));

    let out = h.run(&["init", "--force"]).await;
    assert_success(&out);
}

#[tokio::test]
async fn unreachable_api_is_reported() {
    let h = harness().await;
    let out = Command::new(env!("CARGO_BIN_EXE_stockwright"))
        .args(["material", "list", "--api-url", "http://127.0.0.1:9/api"])
        .env("XDG_CONFIG_HOME", h.config_home.path())
        .output()
        .await
        .expect("failed to run stockwright");
    assert!(!out.status.success());
    assert!(stderr(&out).contains("could not load inventory"));
}
