use std::net::SocketAddr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use stockwright_api::RemoteError;
use stockwright_api::models::{AttachRequest, ProductInput, RawMaterialInput};
use tokio::task::JoinHandle;

use crate::backend::InMemoryBackend;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

struct StubError(RemoteError);

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let status = self
            .0
            .status()
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({ "message": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

impl From<RemoteError> for StubError {
    fn from(err: RemoteError) -> Self {
        Self(err)
    }
}

type StubResult = Result<Response, StubError>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn build_router(backend: InMemoryBackend) -> Router {
    Router::new()
        .route("/api/raw-materials", get(list_materials).post(create_material))
        .route(
            "/api/raw-materials/{id}",
            delete(delete_material).put(update_material),
        )
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/products/{id}/raw-materials", post(attach_material))
        .route(
            "/api/products/{id}/raw-materials/{raw_material_id}",
            delete(detach_material),
        )
        .route("/api/production/suggestion", get(suggestion))
        .with_state(backend)
}

/// A running stub server. The task is aborted when this is dropped.
pub struct StubServer {
    /// Base URL including the `/api` prefix.
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve `backend` over HTTP on an ephemeral localhost port.
pub async fn spawn_stub_server(backend: InMemoryBackend) -> StubServer {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("failed to bind stub server");
    let addr = listener.local_addr().expect("stub server has no address");
    let app = build_router(backend);
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    StubServer {
        base_url: format!("http://{addr}/api"),
        handle,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_materials(State(backend): State<InMemoryBackend>) -> StubResult {
    Ok(Json(backend.list_materials()).into_response())
}

async fn create_material(
    State(backend): State<InMemoryBackend>,
    Json(input): Json<RawMaterialInput>,
) -> StubResult {
    let created = backend.create_material(&input)?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn update_material(
    State(backend): State<InMemoryBackend>,
    Path(id): Path<i64>,
    Json(input): Json<RawMaterialInput>,
) -> StubResult {
    Ok(Json(backend.update_material(id, &input)?).into_response())
}

async fn delete_material(State(backend): State<InMemoryBackend>, Path(id): Path<i64>) -> StubResult {
    backend.delete_material(id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn list_products(State(backend): State<InMemoryBackend>) -> StubResult {
    Ok(Json(backend.list_products()).into_response())
}

async fn get_product(State(backend): State<InMemoryBackend>, Path(id): Path<i64>) -> StubResult {
    Ok(Json(backend.get_product(id)?).into_response())
}

async fn create_product(
    State(backend): State<InMemoryBackend>,
    Json(input): Json<ProductInput>,
) -> StubResult {
    let created = backend.create_product(&input)?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn update_product(
    State(backend): State<InMemoryBackend>,
    Path(id): Path<i64>,
    Json(input): Json<ProductInput>,
) -> StubResult {
    Ok(Json(backend.update_product(id, &input)?).into_response())
}

async fn delete_product(State(backend): State<InMemoryBackend>, Path(id): Path<i64>) -> StubResult {
    backend.delete_product(id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn attach_material(
    State(backend): State<InMemoryBackend>,
    Path(id): Path<i64>,
    Json(request): Json<AttachRequest>,
) -> StubResult {
    backend.attach_material(id, &request)?;
    Ok(StatusCode::OK.into_response())
}

async fn detach_material(
    State(backend): State<InMemoryBackend>,
    Path((id, raw_material_id)): Path<(i64, i64)>,
) -> StubResult {
    backend.detach_material(id, raw_material_id)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn suggestion(State(backend): State<InMemoryBackend>) -> StubResult {
    Ok(Json(backend.production_suggestion()).into_response())
}
