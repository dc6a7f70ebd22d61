//! REST implementation of [`RemoteCartGateway`].
//!
//! Talks to the storefront backend's `/customers/*` endpoints with `reqwest`,
//! authenticating with a bearer token when one is configured.

use std::sync::Arc;

use async_trait::async_trait;
use eazika_core::{CartLineItem, LineItemId, NewLineItem};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use super::{GatewayError, OrderRequest, PlacedOrder, RemoteCartGateway};
use crate::config::CartApiConfig;

const ADD_TO_CART: &str = "/customers/add-to-cart";
const GET_CART: &str = "/customers/get-cart";
const UPDATE_CART_ITEM: &str = "/customers/update-cart-item";
const REMOVE_CART_ITEM: &str = "/customers/remove-cart-item";
const CLEAR_CART: &str = "/customers/clear-cart";
const CREATE_ORDER: &str = "/customers/create-order";

/// Client for the storefront backend cart API.
///
/// Cheaply cloneable; all clones share one connection pool.
#[derive(Clone)]
pub struct HttpCartGateway {
    inner: Arc<HttpCartGatewayInner>,
}

struct HttpCartGatewayInner {
    client: reqwest::Client,
    base_url: Url,
    access_token: Option<SecretString>,
}

#[derive(Serialize)]
struct QuantityUpdate {
    quantity: u32,
}

impl HttpCartGateway {
    /// Create a new gateway client.
    #[must_use]
    pub fn new(config: &CartApiConfig) -> Self {
        Self {
            inner: Arc::new(HttpCartGatewayInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                access_token: config.access_token.clone(),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}{path}",
            self.inner.base_url.as_str().trim_end_matches('/')
        )
    }

    /// Send a request and return the body of a successful response.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<String, GatewayError> {
        let request_id = Uuid::new_v4();
        let mut request = request.header("X-Request-Id", request_id.to_string());
        if let Some(token) = &self.inner.access_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(%request_id, status = %status, "Backend responded");

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(GatewayError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(GatewayError::Unauthorized);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(response.url().path().to_string()));
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                %request_id,
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl RemoteCartGateway for HttpCartGateway {
    #[instrument(skip(self), fields(product = %item.product_ref))]
    async fn create_line_item(&self, item: NewLineItem) -> Result<CartLineItem, GatewayError> {
        let request = self.inner.client.post(self.url(ADD_TO_CART)).json(&item);
        let body = self.execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self))]
    async fn list_line_items(&self) -> Result<Vec<CartLineItem>, GatewayError> {
        let request = self.inner.client.get(self.url(GET_CART));
        let body = self.execute(request).await?;

        // Anything other than an array is an empty cart
        match serde_json::from_str::<serde_json::Value>(&body)? {
            value @ serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
            other => {
                debug!(kind = ?other, "Cart response was not an array");
                Ok(Vec::new())
            }
        }
    }

    #[instrument(skip(self), fields(item_id = %id))]
    async fn update_line_item(
        &self,
        id: LineItemId,
        quantity: u32,
    ) -> Result<CartLineItem, GatewayError> {
        let request = self
            .inner
            .client
            .put(self.url(&format!("{UPDATE_CART_ITEM}/{id}")))
            .json(&QuantityUpdate { quantity });
        let body = self.execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self), fields(item_id = %id))]
    async fn delete_line_item(&self, id: LineItemId) -> Result<(), GatewayError> {
        let request = self
            .inner
            .client
            .delete(self.url(&format!("{REMOVE_CART_ITEM}/{id}")));
        self.execute(request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear_all(&self) -> Result<(), GatewayError> {
        let request = self.inner.client.delete(self.url(CLEAR_CART));
        self.execute(request).await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(address_id = %request.address_id, items = request.items.len()))]
    async fn create_order(&self, request: &OrderRequest) -> Result<PlacedOrder, GatewayError> {
        let http_request = self.inner.client.post(self.url(CREATE_ORDER)).json(request);
        let body = self.execute(http_request).await?;
        Ok(serde_json::from_str(&body)?)
    }
}
