use crate::item_model::{InventoryItem, ItemDraft};
use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("stored record {id} is malformed: {reason}")]
    Corrupt { id: Uuid, reason: String },
    #[error("item {0} already exists")]
    DuplicateId(Uuid),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn insert(&self, draft: ItemDraft) -> StoreResult<InventoryItem>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<InventoryItem>>;

    async fn list(&self) -> StoreResult<Vec<InventoryItem>>;

    /// Conditional replace. `Ok(None)` means the record is gone or its version moved on.
    async fn replace_if_version(&self, expected_version: i64, draft: ItemDraft) -> StoreResult<Option<InventoryItem>>;

    async fn remove(&self, id: Uuid) -> StoreResult<Option<InventoryItem>>;

    async fn collections(&self) -> StoreResult<Vec<String>>;
}

pub const MEMORY_COLLECTION: &str = "inventories";

#[derive(Default)]
pub struct MemoryItemStore {
    items: RwLock<Vec<InventoryItem>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn insert(&self, draft: ItemDraft) -> StoreResult<InventoryItem> {
        let mut items = self.items.write().await;
        if items.iter().any(|i| i.id == draft.id) {
            return Err(StoreError::DuplicateId(draft.id));
        }
        let now = Utc::now();
        let item = stamp(draft, now, now, 1);
        items.push(item.clone());
        Ok(item)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<InventoryItem>> {
        Ok(self.items.read().await.iter().find(|i| i.id == id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<InventoryItem>> {
        Ok(self.items.read().await.clone())
    }

    async fn replace_if_version(&self, expected_version: i64, draft: ItemDraft) -> StoreResult<Option<InventoryItem>> {
        let mut items = self.items.write().await;
        let Some(slot) = items.iter_mut().find(|i| i.id == draft.id) else {
            return Ok(None);
        };
        if slot.version != expected_version {
            return Ok(None);
        }
        let updated = stamp(draft, slot.created_at, Utc::now(), expected_version + 1);
        *slot = updated.clone();
        Ok(Some(updated))
    }

    async fn remove(&self, id: Uuid) -> StoreResult<Option<InventoryItem>> {
        let mut items = self.items.write().await;
        Ok(items.iter().position(|i| i.id == id).map(|idx| items.remove(idx)))
    }

    async fn collections(&self) -> StoreResult<Vec<String>> {
        Ok(vec![MEMORY_COLLECTION.to_string()])
    }
}

fn stamp(draft: ItemDraft, created_at: chrono::DateTime<Utc>, updated_at: chrono::DateTime<Utc>, version: i64) -> InventoryItem {
    InventoryItem {
        id: draft.id,
        item_name: draft.item_name,
        category: draft.category,
        quantity_available: draft.quantity_available,
        unit_of_measurement: draft.unit_of_measurement,
        reorder_level: draft.reorder_level,
        stock_status: draft.stock_status,
        supplier: draft.supplier,
        price: draft.price,
        last_restocked_date: draft.last_restocked_date,
        created_at,
        updated_at,
        version,
    }
}
