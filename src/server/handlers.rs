use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;
use super::error::ApiError;
use super::mailer::order_notification;
use super::repository::NewOrder;
use super::AppState;
use crate::domain::aggregates::{Category, OrderRequest, Product};
use crate::ValidationError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub success: bool,
    pub order_id: String,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "goat-storefront" }))
}

pub async fn list_products(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let Query(params) = params?;
    let category = match params.category.as_deref().map(str::trim) {
        None | Some("") | Some("All") => None,
        Some(raw) => Some(raw.parse::<Category>().map_err(|e| ApiError::bad_request(e.to_string()))?),
    };
    let products = state.catalog.filter_by_category(category).into_iter().cloned().collect();
    Ok(Json(products))
}

#[tracing::instrument(skip_all)]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<Json<OrderCreated>, ApiError> {
    let Json(request) = payload?;
    if request.cart_items.is_empty() {
        return Err(ApiError::bad_request(ValidationError::EmptyCart.to_string()));
    }
    request.validate()?;

    let order = NewOrder::from_request(&request)?;
    if order.total_amount != request.total_amount {
        tracing::warn!(
            order_id = %order.id,
            claimed = %request.total_amount,
            computed = %order.total_amount,
            "order total did not match its items, using the computed total"
        );
    }

    state.orders.insert(&order).await?;
    tracing::info!(order_id = %order.id, items = order.items.len(), total = %order.total_amount, "order created");

    let email = order_notification(&order, &state.notify_recipient);
    if let Err(e) = state.mailer.send(&email).await {
        tracing::warn!(order_id = %order.id, error = %e, "order notification failed");
    }

    Ok(Json(OrderCreated { success: true, order_id: order.id.to_string() }))
}
