//! JSON/HTTP implementation of [`Gateway`] on top of `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::error::RemoteError;
use crate::gateway::{Gateway, RemoteResult};
use crate::models::{
    AttachRequest, Product, ProductInput, ProductionSuggestion, RawMaterial, RawMaterialInput,
};

/// Error body shapes the service is known to produce.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    details: Option<String>,
}

/// Gateway that talks to the persistence service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    config: ApiConfig,
}

impl HttpGateway {
    /// Build a gateway whose client enforces `config.timeout` on every call.
    pub fn new(config: ApiConfig) -> RemoteResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.config.url(path))
    }

    /// Send a request and turn any non-success status into [`RemoteError::Status`].
    async fn send(&self, builder: RequestBuilder) -> RemoteResult<Response> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        tracing::debug!(%method, path, "remote call");
        let response = self.client.execute(request).await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "remote call failed in transport");
            RemoteError::from(e)
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let err = status_error(response).await;
        tracing::warn!(%method, path, error = %err, "remote call rejected");
        Err(err)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> RemoteResult<T> {
        let response = self.send(builder).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn execute(&self, builder: RequestBuilder) -> RemoteResult<()> {
        self.send(builder).await.map(|_| ())
    }
}

/// Build a [`RemoteError::Status`] carrying the service's own message.
async fn status_error(response: Response) -> RemoteError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    RemoteError::Status {
        status: status.as_u16(),
        message,
    }
}

fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(parsed) => {
            let message = parsed.message.or(parsed.error)?;
            Some(match parsed.details {
                Some(details) if !details.is_empty() => format!("{message}: {details}"),
                _ => message,
            })
        }
        Err(_) => Some(trimmed.to_string()),
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_materials(&self) -> RemoteResult<Vec<RawMaterial>> {
        let path = "/raw-materials";
        self.fetch(self.request(Method::GET, path))
            .await
    }

    async fn create_material(&self, input: &RawMaterialInput) -> RemoteResult<RawMaterial> {
        let path = "/raw-materials";
        let builder = self.request(Method::POST, path).json(input);
        self.fetch(builder).await
    }

    async fn update_material(
        &self,
        id: i64,
        input: &RawMaterialInput,
    ) -> RemoteResult<RawMaterial> {
        let path = format!("/raw-materials/{id}");
        let builder = self.request(Method::PUT, &path).json(input);
        self.fetch(builder).await
    }

    async fn delete_material(&self, id: i64) -> RemoteResult<()> {
        let path = format!("/raw-materials/{id}");
        self.execute(self.request(Method::DELETE, &path))
            .await
    }

    async fn list_products(&self) -> RemoteResult<Vec<Product>> {
        let path = "/products";
        self.fetch(self.request(Method::GET, path))
            .await
    }

    async fn get_product(&self, id: i64) -> RemoteResult<Product> {
        let path = format!("/products/{id}");
        self.fetch(self.request(Method::GET, &path))
            .await
    }

    async fn create_product(&self, input: &ProductInput) -> RemoteResult<Product> {
        let path = "/products";
        let builder = self.request(Method::POST, path).json(input);
        self.fetch(builder).await
    }

    async fn update_product(&self, id: i64, input: &ProductInput) -> RemoteResult<Product> {
        let path = format!("/products/{id}");
        let builder = self.request(Method::PUT, &path).json(input);
        self.fetch(builder).await
    }

    async fn delete_product(&self, id: i64) -> RemoteResult<()> {
        let path = format!("/products/{id}");
        self.execute(self.request(Method::DELETE, &path))
            .await
    }

    async fn attach_material(
        &self,
        product_id: i64,
        request: &AttachRequest,
    ) -> RemoteResult<()> {
        let path = format!("/products/{product_id}/raw-materials");
        let builder = self.request(Method::POST, &path).json(request);
        self.execute(builder).await
    }

    async fn detach_material(&self, product_id: i64, raw_material_id: i64) -> RemoteResult<()> {
        let path = format!("/products/{product_id}/raw-materials/{raw_material_id}");
        self.execute(self.request(Method::DELETE, &path))
            .await
    }

    async fn production_suggestion(&self) -> RemoteResult<ProductionSuggestion> {
        let path = "/production/suggestion";
        self.fetch(self.request(Method::GET, path))
            .await
    }
}
