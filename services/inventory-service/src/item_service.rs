use crate::item_model::{
    Category, CreateItemRequest, InventoryItem, ItemDraft, ItemPatch, Unit,
};
use crate::item_store::{ItemStore, StoreError};
use chrono::{DateTime, Utc};
use common_observability::InventoryMetrics;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("{message}")]
    Validation { code: &'static str, message: String },
    #[error("Inventory item not found")]
    NotFound(Uuid),
    #[error("Insufficient quantity. Available: {available} {unit}, Requested: {requested} {unit}")]
    InsufficientStock { available: f64, requested: f64, unit: Unit },
    #[error("Inventory item {0} was modified concurrently; retry the operation")]
    Conflict(Uuid),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl InventoryError {
    fn validation(code: &'static str, message: impl Into<String>) -> Self {
        InventoryError::Validation { code, message: message.into() }
    }
}

pub type InventoryResult<T> = Result<T, InventoryError>;

#[derive(Debug, Clone)]
pub struct Outcome {
    pub item: InventoryItem,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldChanges {
    pub item_name: Option<String>,
    pub category: Option<Category>,
    pub quantity_available: Option<f64>,
    pub unit_of_measurement: Option<Unit>,
    pub reorder_level: Option<f64>,
    pub supplier: Option<Option<String>>,
    pub price: Option<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Edit(FieldChanges),
    Consume { quantity_used: f64 },
    Reorder { quantity_to_add: f64 },
}

impl Mutation {
    pub fn edit(patch: ItemPatch) -> InventoryResult<Self> {
        let item_name = patch.item_name.as_deref().map(item_name).transpose()?;
        let category = patch
            .category
            .as_deref()
            .map(|c| c.parse::<Category>().map_err(|e| InventoryError::validation("invalid_category", e.to_string())))
            .transpose()?;
        let unit_of_measurement = patch
            .unit_of_measurement
            .as_deref()
            .map(|u| u.parse::<Unit>().map_err(|e| InventoryError::validation("invalid_unit", e.to_string())))
            .transpose()?;
        let quantity_available = patch.quantity_available.map(|q| non_negative("quantityAvailable", q)).transpose()?;
        let reorder_level = patch.reorder_level.map(|r| non_negative("reorderLevel", r)).transpose()?;
        let price = match patch.price {
            Some(Some(p)) => Some(Some(non_negative("price", p)?)),
            other => other,
        };
        Ok(Mutation::Edit(FieldChanges {
            item_name,
            category,
            quantity_available,
            unit_of_measurement,
            reorder_level,
            supplier: patch.supplier.map(|s| s.and_then(optional_text)),
            price,
        }))
    }

    pub fn consume(quantity_used: Option<f64>) -> InventoryResult<Self> {
        match quantity_used {
            Some(q) if q.is_finite() && q > 0.0 => Ok(Mutation::Consume { quantity_used: q }),
            _ => Err(InventoryError::validation("invalid_quantity", "Please provide valid quantityUsed")),
        }
    }

    pub fn reorder(quantity_to_add: Option<f64>) -> InventoryResult<Self> {
        match quantity_to_add {
            Some(q) if q.is_finite() && q > 0.0 => Ok(Mutation::Reorder { quantity_to_add: q }),
            _ => Err(InventoryError::validation("invalid_quantity", "Please provide valid quantityToAdd")),
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Mutation::Edit(_) => "edit",
            Mutation::Consume { .. } => "consume",
            Mutation::Reorder { .. } => "reorder",
        }
    }

    fn apply(&self, draft: &mut ItemDraft, now: DateTime<Utc>) -> InventoryResult<()> {
        match self {
            Mutation::Edit(changes) => {
                if let Some(name) = &changes.item_name { draft.item_name = name.clone(); }
                if let Some(category) = changes.category { draft.category = category; }
                if let Some(q) = changes.quantity_available { draft.quantity_available = q; }
                if let Some(unit) = changes.unit_of_measurement { draft.unit_of_measurement = unit; }
                if let Some(r) = changes.reorder_level { draft.reorder_level = r; }
                if let Some(supplier) = &changes.supplier { draft.supplier = supplier.clone(); }
                if let Some(price) = changes.price { draft.price = price; }
            }
            Mutation::Consume { quantity_used } => {
                if draft.quantity_available < *quantity_used {
                    return Err(InventoryError::InsufficientStock {
                        available: draft.quantity_available,
                        requested: *quantity_used,
                        unit: draft.unit_of_measurement,
                    });
                }
                draft.quantity_available = (draft.quantity_available - quantity_used).max(0.0);
            }
            Mutation::Reorder { quantity_to_add } => {
                let restocked = draft.quantity_available + quantity_to_add;
                if !restocked.is_finite() {
                    return Err(InventoryError::validation(
                        "invalid_quantity",
                        format!("Reorder would exceed the maximum quantity for {}", draft.item_name),
                    ));
                }
                draft.quantity_available = restocked;
                draft.last_restocked_date = Some(now);
            }
        }
        Ok(())
    }

    fn confirmation(&self, item: &InventoryItem) -> String {
        match self {
            Mutation::Edit(_) => "Inventory item updated successfully".to_string(),
            Mutation::Consume { quantity_used } => format!(
                "{} quantity reduced by {} {}",
                item.item_name, quantity_used, item.unit_of_measurement
            ),
            Mutation::Reorder { quantity_to_add } => format!(
                "{} reordered successfully. Added {} {}",
                item.item_name, quantity_to_add, item.unit_of_measurement
            ),
        }
    }
}

fn item_name(raw: &str) -> InventoryResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InventoryError::validation("invalid_item_name", "itemName must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn non_negative(field: &'static str, value: f64) -> InventoryResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(InventoryError::validation("invalid_quantity", format!("{field} must be a non-negative number")))
    }
}

fn optional_text(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub item_name: String,
    pub category: Category,
    pub quantity_available: f64,
    pub unit_of_measurement: Unit,
    pub reorder_level: f64,
    pub supplier: Option<String>,
    pub price: Option<f64>,
}

impl TryFrom<CreateItemRequest> for NewItem {
    type Error = InventoryError;

    fn try_from(req: CreateItemRequest) -> Result<Self, Self::Error> {
        let (Some(name), Some(category), Some(quantity), Some(unit), Some(reorder)) = (
            req.item_name.filter(|n| !n.trim().is_empty()),
            req.category.filter(|c| !c.is_empty()),
            req.quantity_available,
            req.unit_of_measurement.filter(|u| !u.is_empty()),
            req.reorder_level,
        ) else {
            return Err(InventoryError::validation("missing_fields", "Please provide all required fields"));
        };
        Ok(NewItem {
            item_name: item_name(&name)?,
            category: category
                .parse()
                .map_err(|e: crate::item_model::UnknownVariant| InventoryError::validation("invalid_category", e.to_string()))?,
            quantity_available: non_negative("quantityAvailable", quantity)?,
            unit_of_measurement: unit
                .parse()
                .map_err(|e: crate::item_model::UnknownVariant| InventoryError::validation("invalid_unit", e.to_string()))?,
            reorder_level: non_negative("reorderLevel", reorder)?,
            supplier: req.supplier.and_then(optional_text),
            price: req.price.map(|p| non_negative("price", p)).transpose()?,
        })
    }
}

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn ItemStore>,
    metrics: Arc<InventoryMetrics>,
    max_attempts: u32,
}

impl InventoryService {
    pub fn new(store: Arc<dyn ItemStore>, metrics: Arc<InventoryMetrics>) -> Self {
        Self { store, metrics, max_attempts: DEFAULT_MAX_ATTEMPTS }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub async fn list(&self) -> InventoryResult<Vec<InventoryItem>> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: Uuid) -> InventoryResult<InventoryItem> {
        self.store.get(id).await?.ok_or(InventoryError::NotFound(id))
    }

    pub async fn create(&self, request: CreateItemRequest) -> InventoryResult<InventoryItem> {
        let new_item = NewItem::try_from(request)?;
        // lastRestockedDate stays null until the first reorder.
        let mut draft = ItemDraft {
            id: Uuid::new_v4(),
            item_name: new_item.item_name,
            category: new_item.category,
            quantity_available: new_item.quantity_available,
            unit_of_measurement: new_item.unit_of_measurement,
            reorder_level: new_item.reorder_level,
            stock_status: crate::item_model::StockStatus::Available,
            supplier: new_item.supplier,
            price: new_item.price,
            last_restocked_date: None,
        };
        draft.refresh_status();
        let item = self.store.insert(draft).await?;
        self.metrics.record_mutation("create");
        info!(item_id = %item.id, item_name = %item.item_name, status = %item.stock_status, "Inventory item created");
        Ok(item)
    }

    pub async fn edit(&self, id: Uuid, patch: ItemPatch) -> InventoryResult<Outcome> {
        self.mutate(id, Mutation::edit(patch)?).await
    }

    pub async fn consume(&self, id: Uuid, quantity_used: Option<f64>) -> InventoryResult<Outcome> {
        self.mutate(id, Mutation::consume(quantity_used)?).await
    }

    pub async fn reorder(&self, id: Uuid, quantity_to_add: Option<f64>) -> InventoryResult<Outcome> {
        self.mutate(id, Mutation::reorder(quantity_to_add)?).await
    }

    /// Load, apply, re-derive status, conditional replace. A lost race restarts
    /// from a fresh read, so quantity checks always see the latest value.
    pub async fn mutate(&self, id: Uuid, mutation: Mutation) -> InventoryResult<Outcome> {
        for attempt in 1..=self.max_attempts {
            let current = self.store.get(id).await?.ok_or(InventoryError::NotFound(id))?;
            let mut draft = current.draft();
            if let Err(err) = mutation.apply(&mut draft, Utc::now()) {
                if matches!(err, InventoryError::InsufficientStock { .. }) {
                    self.metrics.insufficient_stock.inc();
                }
                return Err(err);
            }
            draft.refresh_status();
            match self.store.replace_if_version(current.version, draft).await? {
                Some(item) => {
                    self.metrics.record_mutation(mutation.operation());
                    info!(
                        item_id = %id,
                        operation = mutation.operation(),
                        quantity = item.quantity_available,
                        status = %item.stock_status,
                        "Inventory item mutated"
                    );
                    let message = mutation.confirmation(&item);
                    return Ok(Outcome { item, message });
                }
                None => {
                    self.metrics.mutation_conflicts.inc();
                    debug!(item_id = %id, attempt, operation = mutation.operation(), "Conditional replace lost a race; retrying");
                }
            }
        }
        warn!(item_id = %id, attempts = self.max_attempts, operation = mutation.operation(), "Giving up after repeated write conflicts");
        Err(InventoryError::Conflict(id))
    }

    pub async fn delete(&self, id: Uuid) -> InventoryResult<InventoryItem> {
        let removed = self.store.remove(id).await?.ok_or(InventoryError::NotFound(id))?;
        self.metrics.record_mutation("delete");
        info!(item_id = %id, item_name = %removed.item_name, "Inventory item deleted");
        Ok(removed)
    }

    pub async fn collections(&self) -> InventoryResult<Vec<String>> {
        Ok(self.store.collections().await?)
    }
}
