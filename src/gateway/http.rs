//! HTTP collaborators: object storage for proofs and the create-order function.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use super::{object_name, OrderId, OrderService, ProofStorage};
use crate::config::ClientConfig;
use crate::domain::aggregates::OrderRequest;
use crate::domain::value_objects::ProofOfPayment;
use crate::{Result, StorefrontError};

/// Shared client, base URL and credentials for the backend.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StorefrontError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let builder = self.client.post(self.url(path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key).header("apikey", key),
            None => builder,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpProofStorage {
    backend: HttpBackend,
    bucket: String,
}

impl HttpProofStorage {
    pub fn new(backend: HttpBackend, bucket: &str) -> Self {
        Self { backend, bucket: bucket.to_string() }
    }
}

#[async_trait]
impl ProofStorage for HttpProofStorage {
    #[tracing::instrument(skip_all, fields(bucket = %self.bucket, bytes = proof.len()))]
    async fn store(&self, proof: &ProofOfPayment) -> Result<String> {
        let name = object_name(proof);
        let response = self
            .backend
            .post(&format!("storage/v1/object/{}/{}", self.bucket, name))
            .header(CONTENT_TYPE, proof.media_type())
            .header("x-upsert", "false")
            .body(proof.bytes().to_vec())
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await?;
            return Err(StorefrontError::Upload(message.unwrap_or_else(|| format!("storage responded with {}", status))));
        }
        Ok(self.backend.url(&format!("storage/v1/object/public/{}/{}", self.bucket, name)))
    }
}

#[derive(Clone, Debug)]
pub struct HttpOrderService {
    backend: HttpBackend,
}

impl HttpOrderService {
    pub fn new(backend: HttpBackend) -> Self { Self { backend } }
}

#[derive(Deserialize)]
struct CreatedBody {
    #[serde(rename = "orderId")]
    order_id: Option<String>,
}

#[async_trait]
impl OrderService for HttpOrderService {
    #[tracing::instrument(skip_all, fields(items = request.cart_items.len()))]
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderId> {
        let response = self
            .backend
            .post("functions/v1/create-order")
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await?;
            return Err(StorefrontError::Remote(message.unwrap_or_else(|| format!("order service responded with {}", status))));
        }
        let body = response.bytes().await.map_err(transport)?;
        let created: CreatedBody = serde_json::from_slice(&body)
            .map_err(|e| StorefrontError::Remote(format!("malformed order response: {}", e)))?;
        created
            .order_id
            .filter(|id| !id.trim().is_empty())
            .map(OrderId::new)
            .ok_or_else(|| StorefrontError::Remote("order response did not include an order id".into()))
    }
}

fn transport(err: reqwest::Error) -> StorefrontError {
    StorefrontError::Network(err.to_string())
}

/// `{"error": ..}` or `{"message": ..}` from an error response, if present.
async fn error_message(response: Response) -> Result<Option<String>> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        message: Option<String>,
    }
    let status = response.status();
    let body = response.bytes().await.map_err(transport)?;
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .filter(|m| !m.trim().is_empty());
    if message.is_none() && status == StatusCode::NOT_FOUND {
        return Ok(Some("endpoint not found".to_string()));
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::domain::aggregates::{Cart, Checkout, DeliveryMethod, OrderForm};
    use crate::gateway::OrderGateway;
    use crate::server::mailer::LogMailer;
    use crate::server::repository::InMemoryOrderRepository;
    use crate::server::{router, AppState};
    use axum::body::Bytes;
    use axum::extract::{Path, State};
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Uploads = Arc<Mutex<Vec<(String, String, String, usize)>>>;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    fn config(base: &str) -> ClientConfig {
        ClientConfig::from_lookup(|key| match key {
            "STOREFRONT_BACKEND_URL" => Some(base.to_string()),
            "STOREFRONT_API_KEY" => Some("anon-key".to_string()),
            "STOREFRONT_REQUEST_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn storage_app(uploads: Uploads) -> Router {
        async fn upload(
            State(uploads): State<Uploads>,
            Path((bucket, name)): Path<(String, String)>,
            headers: HeaderMap,
            body: Bytes,
        ) -> Json<serde_json::Value> {
            let media = headers.get("content-type").and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
            let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or_default();
            assert_eq!(auth, "Bearer anon-key");
            uploads.lock().unwrap().push((bucket, name.clone(), media, body.len()));
            Json(serde_json::json!({ "Key": name }))
        }
        Router::new().route("/storage/v1/object/:bucket/:name", post(upload)).with_state(uploads)
    }

    fn order_state(repo: Arc<InMemoryOrderRepository>) -> AppState {
        AppState {
            orders: repo,
            mailer: Arc::new(LogMailer),
            catalog: Arc::new(Catalog::seeded().unwrap()),
            notify_recipient: "orders@goat.example".to_string(),
        }
    }

    #[tokio::test]
    async fn test_storage_upload() {
        let uploads = Uploads::default();
        let base = spawn(storage_app(uploads.clone())).await;
        let storage = HttpProofStorage::new(HttpBackend::new(&config(&base)).unwrap(), "order-proofs");
        let proof = ProofOfPayment::new("slip.png", "image/png", vec![7; 64]).unwrap();

        let url = storage.store(&proof).await.unwrap();
        let recorded = uploads.lock().unwrap().clone();
        assert_eq!(recorded.len(), 1);
        let (bucket, name, media, len) = &recorded[0];
        assert_eq!(bucket, "order-proofs");
        assert_eq!(media, "image/png");
        assert_eq!(*len, 64);
        assert_eq!(url, format!("{}/storage/v1/object/public/order-proofs/{}", base, name));
    }

    #[tokio::test]
    async fn test_storage_rejection_is_upload_error() {
        let app = Router::new().route(
            "/storage/v1/object/:bucket/:name",
            post(|| async { (axum::http::StatusCode::FORBIDDEN, Json(serde_json::json!({ "message": "row-level security policy" }))) }),
        );
        let base = spawn(app).await;
        let storage = HttpProofStorage::new(HttpBackend::new(&config(&base)).unwrap(), "order-proofs");
        let proof = ProofOfPayment::new("slip.pdf", "application/pdf", vec![1]).unwrap();
        let err = storage.store(&proof).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Upload(ref m) if m == "row-level security policy"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let orders = HttpOrderService::new(HttpBackend::new(&config(&base)).unwrap());
        let lines = {
            let mut cart = Cart::default();
            cart.add_item(Catalog::seeded().unwrap().get("c1").unwrap(), None);
            cart.lines().to_vec()
        };
        let form = OrderForm::new("Sipho", "0820000000", DeliveryMethod::Pickup, "");
        let request = OrderRequest::assemble(&lines, &form).unwrap();
        let err = orders.create_order(&request).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Network(_)));
    }

    #[tokio::test]
    async fn test_error_payload_is_remote_error() {
        let app = Router::new().route(
            "/functions/v1/create-order",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": "relation \"orders\" does not exist" }))) }),
        );
        let base = spawn(app).await;
        let orders = HttpOrderService::new(HttpBackend::new(&config(&base)).unwrap());
        let catalog = Catalog::seeded().unwrap();
        let mut cart = Cart::default();
        cart.add_item(catalog.get("t1").unwrap(), None);
        let request = OrderRequest::assemble(cart.lines(), &OrderForm::new("Sipho", "082", DeliveryMethod::Pickup, "")).unwrap();

        let err = orders.create_order(&request).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Remote(ref m) if m.contains("does not exist")));
    }

    #[tokio::test]
    async fn test_missing_order_id_is_remote_error() {
        let app = Router::new().route("/functions/v1/create-order", post(|| async { Json(serde_json::json!({ "success": true })) }));
        let base = spawn(app).await;
        let orders = HttpOrderService::new(HttpBackend::new(&config(&base)).unwrap());
        let catalog = Catalog::seeded().unwrap();
        let mut cart = Cart::default();
        cart.add_item(catalog.get("t1").unwrap(), None);
        let request = OrderRequest::assemble(cart.lines(), &OrderForm::new("Sipho", "082", DeliveryMethod::Pickup, "")).unwrap();

        let err = orders.create_order(&request).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Remote(ref m) if m.contains("order id")));
    }

    #[tokio::test]
    async fn test_checkout_against_order_service() {
        let uploads = Uploads::default();
        let repo = Arc::new(InMemoryOrderRepository::default());
        let app = storage_app(uploads.clone()).merge(router(order_state(repo.clone())));
        let base = spawn(app).await;
        let gateway = OrderGateway::from_config(&config(&base)).unwrap();

        let catalog = Catalog::seeded().unwrap();
        let mut cart = Cart::default();
        let h1 = cart.add_item(catalog.get("h1").unwrap(), None).id();
        cart.add_item(catalog.get("c1").unwrap(), None);
        cart.set_quantity(h1, 3);

        let mut checkout = Checkout::new();
        checkout.open().unwrap();
        checkout.set_full_name("Naledi Khumalo").unwrap();
        checkout.set_contact_number("+27 83 000 1111").unwrap();
        checkout.advance().unwrap();
        checkout.set_delivery_method(DeliveryMethod::Delivery).unwrap();
        checkout.set_address("9 Main Road, Durban").unwrap();
        checkout.advance().unwrap();
        checkout.attach_proof("pop.jpeg", "image/jpeg", vec![1, 2, 3]).unwrap();

        let order_id = tokio::time::timeout(Duration::from_secs(10), checkout.submit(&mut cart, &gateway))
            .await
            .unwrap()
            .unwrap();

        assert!(cart.is_empty());
        assert!(!checkout.is_open());
        let stored = repo.orders();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id.to_string(), order_id.as_str());
        assert_eq!(stored[0].total_amount, rust_decimal::Decimal::new(149996, 2));
        assert_eq!(stored[0].items.len(), 2);
        assert_eq!(stored[0].customer_address, "9 Main Road, Durban");
        assert!(stored[0].proof_of_payment_url.as_deref().unwrap().contains("/storage/v1/object/public/order-proofs/"));
        assert_eq!(uploads.lock().unwrap().len(), 1);
    }
}
