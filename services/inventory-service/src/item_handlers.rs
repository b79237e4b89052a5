use crate::app::AppState;
use crate::item_model::{ConsumeRequest, CreateItemRequest, InventoryItem, ItemPatch, ReorderRequest};
use crate::item_service::InventoryError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{http::StatusCode, Json};
use common_http_errors::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self { success: true, data: Some(data), message: message.into() })
    }
}

type ItemResponse = Json<ApiResponse<InventoryItem>>;

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Validation { code, message } => ApiError::BadRequest { code, trace_id: None, message: Some(message) },
            InventoryError::NotFound(_) => ApiError::not_found("item_not_found", err.to_string()),
            InventoryError::InsufficientStock { .. } => ApiError::bad_request("insufficient_stock", err.to_string()),
            InventoryError::Conflict(_) => ApiError::Conflict { code: "concurrent_modification", trace_id: None, message: Some(err.to_string()) },
            InventoryError::Storage(e) => {
                error!(error = %e, "Inventory storage failure");
                ApiError::internal(e, None)
            }
        }
    }
}

// Identifiers that do not parse can never resolve to a record.
fn parse_item_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::from(InventoryError::NotFound(Uuid::nil())))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request("invalid_body", rejection.body_text()))
}

pub async fn list_items(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Vec<InventoryItem>>>> {
    let items = state.inventory.list().await?;
    tracing::debug!(count = items.len(), "Listed inventory items");
    Ok(ApiResponse::ok(items, "All inventory items retrieved successfully"))
}

pub async fn get_item(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ItemResponse> {
    let item = state.inventory.get(parse_item_id(&id)?).await?;
    Ok(ApiResponse::ok(item, "Inventory item retrieved successfully"))
}

pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, ItemResponse)> {
    let item = state.inventory.create(json_body(payload)?).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(item, "Inventory item created successfully")))
}

pub async fn use_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ConsumeRequest>, JsonRejection>,
) -> ApiResult<ItemResponse> {
    let body = json_body(payload)?;
    let id = parse_item_id(&id)?;
    let outcome = state.inventory.consume(id, body.quantity_used).await?;
    Ok(ApiResponse::ok(outcome.item, outcome.message))
}

pub async fn reorder_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> ApiResult<ItemResponse> {
    let body = json_body(payload)?;
    let id = parse_item_id(&id)?;
    let outcome = state.inventory.reorder(id, body.quantity_to_add).await?;
    Ok(ApiResponse::ok(outcome.item, outcome.message))
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ItemPatch>, JsonRejection>,
) -> ApiResult<ItemResponse> {
    let patch = json_body(payload)?;
    let id = parse_item_id(&id)?;
    let outcome = state.inventory.edit(id, patch).await?;
    Ok(ApiResponse::ok(outcome.item, outcome.message))
}

pub async fn delete_item(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<ItemResponse> {
    let removed = state.inventory.delete(parse_item_id(&id)?).await?;
    Ok(ApiResponse::ok(removed, "Inventory item deleted successfully"))
}
