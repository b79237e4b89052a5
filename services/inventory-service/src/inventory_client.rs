use std::time::Instant;

use common_http_errors::ErrorBody;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::item_handlers::ApiResponse;
use crate::item_model::{CreateItemRequest, InventoryItem, ItemPatch};
use crate::stock_view::{InventoryView, ItemChange, Notice};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: StatusCode, code: String, message: String },
    #[error("response carried no data")]
    MissingData,
}

impl ClientError {
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Confirmed<T> {
    pub data: T,
    pub message: String,
}

#[derive(Clone)]
pub struct InventoryClient {
    http: Client,
    base_url: String,
}

impl InventoryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn item_url(&self, id: Uuid) -> String {
        format!("{}/{id}", self.base_url)
    }

    pub async fn list_items(&self) -> Result<Confirmed<Vec<InventoryItem>>, ClientError> {
        decode(self.http.get(&self.base_url).send().await?).await
    }

    pub async fn get_item(&self, id: Uuid) -> Result<Confirmed<InventoryItem>, ClientError> {
        decode(self.http.get(self.item_url(id)).send().await?).await
    }

    pub async fn create_item(&self, request: &CreateItemRequest) -> Result<Confirmed<InventoryItem>, ClientError> {
        self.send_json(self.http.post(&self.base_url), request).await
    }

    pub async fn use_item(&self, id: Uuid, quantity_used: f64) -> Result<Confirmed<InventoryItem>, ClientError> {
        let url = format!("{}/use", self.item_url(id));
        self.send_json(self.http.post(url), &json!({ "quantityUsed": quantity_used })).await
    }

    pub async fn reorder_item(&self, id: Uuid, quantity_to_add: f64) -> Result<Confirmed<InventoryItem>, ClientError> {
        let url = format!("{}/reorder", self.item_url(id));
        self.send_json(self.http.post(url), &json!({ "quantityToAdd": quantity_to_add })).await
    }

    pub async fn update_item(&self, id: Uuid, patch: &ItemPatch) -> Result<Confirmed<InventoryItem>, ClientError> {
        self.send_json(self.http.put(self.item_url(id)), patch).await
    }

    pub async fn delete_item(&self, id: Uuid) -> Result<Confirmed<InventoryItem>, ClientError> {
        decode(self.http.delete(self.item_url(id)).send().await?).await
    }

    async fn send_json<B, T>(&self, req: reqwest::RequestBuilder, body: &B) -> Result<Confirmed<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        decode(req.json(body).send().await?).await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<Confirmed<T>, ClientError> {
    let status = resp.status();
    if status.is_success() {
        let body: ApiResponse<T> = resp.json().await?;
        let data = body.data.ok_or(ClientError::MissingData)?;
        return Ok(Confirmed { data, message: body.message });
    }
    let text = resp.text().await?;
    let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.code, body.message),
        Err(_) => (
            "unknown".to_string(),
            status.canonical_reason().unwrap_or("Request failed").to_string(),
        ),
    };
    debug!(%status, %code, "Inventory request rejected");
    Err(ClientError::Api { status, code, message })
}

pub struct InventorySession {
    client: InventoryClient,
    pub view: InventoryView,
    pub error: Option<String>,
    pub notice: Option<Notice>,
}

impl InventorySession {
    pub fn new(client: InventoryClient) -> Self {
        Self { client, view: InventoryView::default(), error: None, notice: None }
    }

    pub async fn load(&mut self) -> Result<(), ClientError> {
        let listed = self.settle(self.client.list_items().await)?;
        self.view.replace_all(listed.data);
        Ok(())
    }

    pub async fn add(&mut self, request: &CreateItemRequest, now: Instant) -> Result<InventoryItem, ClientError> {
        let created = self.settle(self.client.create_item(request).await)?;
        self.confirm(format!("{} added successfully", created.data.item_name), now);
        self.view.apply(ItemChange::Created(created.data.clone()));
        Ok(created.data)
    }

    pub async fn use_item(&mut self, id: Uuid, quantity_used: f64, now: Instant) -> Result<InventoryItem, ClientError> {
        let used = self.settle(self.client.use_item(id, quantity_used).await)?;
        self.confirm(used.message, now);
        self.view.apply(ItemChange::Replaced(used.data.clone()));
        Ok(used.data)
    }

    pub async fn reorder(&mut self, id: Uuid, quantity_to_add: f64, now: Instant) -> Result<InventoryItem, ClientError> {
        let reordered = self.settle(self.client.reorder_item(id, quantity_to_add).await)?;
        self.confirm(reordered.message, now);
        self.view.apply(ItemChange::Replaced(reordered.data.clone()));
        Ok(reordered.data)
    }

    pub async fn update(&mut self, id: Uuid, patch: &ItemPatch, now: Instant) -> Result<InventoryItem, ClientError> {
        let updated = self.settle(self.client.update_item(id, patch).await)?;
        self.confirm(format!("{} updated successfully", updated.data.item_name), now);
        self.view.apply(ItemChange::Replaced(updated.data.clone()));
        Ok(updated.data)
    }

    pub async fn delete(&mut self, id: Uuid, now: Instant) -> Result<(), ClientError> {
        self.settle(self.client.delete_item(id).await)?;
        self.confirm("Item deleted successfully", now);
        self.view.apply(ItemChange::Deleted(id));
        Ok(())
    }

    pub fn tick(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|n| !n.is_visible(now)) {
            self.notice = None;
        }
    }

    fn confirm(&mut self, text: impl Into<String>, now: Instant) {
        self.notice = Some(Notice::success(text, now));
    }

    fn settle<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        match result {
            Ok(value) => {
                self.error = None;
                Ok(value)
            }
            Err(err) => {
                warn!(error = %err, "Inventory request failed");
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }
}
