use crate::item_model::{InventoryItem, ItemDraft, UnknownVariant};
use crate::item_store::{ItemStore, StoreError, StoreResult};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{query, query_scalar, PgPool, Row};
use uuid::Uuid;

macro_rules! item_columns {
    () => {
        "id, item_name, category, quantity_available, unit_of_measurement, reorder_level, stock_status, supplier, price, last_restocked_date, created_at, updated_at, version"
    };
}

pub(crate) const ITEM_COLUMNS: &str = item_columns!();

pub(crate) const INSERT_ITEM_SQL: &str = concat!(
    "INSERT INTO inventories (",
    item_columns!(),
    ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now(), now(), 1) RETURNING ",
    item_columns!()
);

// Single-statement check-and-set: the row only changes if nobody wrote it since it was read.
pub(crate) const REPLACE_ITEM_SQL: &str = concat!(
    "UPDATE inventories SET item_name = $3, category = $4, quantity_available = $5, unit_of_measurement = $6, ",
    "reorder_level = $7, stock_status = $8, supplier = $9, price = $10, last_restocked_date = $11, ",
    "updated_at = now(), version = version + 1 WHERE id = $1 AND version = $2 RETURNING ",
    item_columns!()
);

pub(crate) const LIST_TABLES_SQL: &str =
    "SELECT table_name::text FROM information_schema.tables WHERE table_schema = 'public' ORDER BY table_name";

#[derive(Clone)]
pub struct PgItemStore {
    db: PgPool,
}

impl PgItemStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }
}

fn item_from_row(row: &PgRow) -> StoreResult<InventoryItem> {
    let id: Uuid = row.try_get("id")?;
    let corrupt = |reason: String| StoreError::Corrupt { id, reason };
    let category: String = row.try_get("category")?;
    let unit: String = row.try_get("unit_of_measurement")?;
    let status: String = row.try_get("stock_status")?;
    Ok(InventoryItem {
        id,
        item_name: row.try_get("item_name")?,
        category: category.parse().map_err(|e: UnknownVariant| corrupt(e.to_string()))?,
        quantity_available: row.try_get("quantity_available")?,
        unit_of_measurement: unit.parse().map_err(|e: UnknownVariant| corrupt(e.to_string()))?,
        reorder_level: row.try_get("reorder_level")?,
        stock_status: status.parse().map_err(|e: UnknownVariant| corrupt(e.to_string()))?,
        supplier: row.try_get("supplier")?,
        price: row.try_get("price")?,
        last_restocked_date: row.try_get("last_restocked_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        version: row.try_get("version")?,
    })
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn insert(&self, draft: ItemDraft) -> StoreResult<InventoryItem> {
        let row = query(INSERT_ITEM_SQL)
            .bind(draft.id)
            .bind(draft.item_name.as_str())
            .bind(draft.category.as_str())
            .bind(draft.quantity_available)
            .bind(draft.unit_of_measurement.as_str())
            .bind(draft.reorder_level)
            .bind(draft.stock_status.as_str())
            .bind(draft.supplier.as_deref())
            .bind(draft.price)
            .bind(draft.last_restocked_date)
            .fetch_one(&self.db)
            .await
            .map_err(|err| {
                if matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation()) {
                    StoreError::DuplicateId(draft.id)
                } else {
                    StoreError::Database(err)
                }
            })?;
        item_from_row(&row)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<InventoryItem>> {
        let row = query(&format!("SELECT {ITEM_COLUMNS} FROM inventories WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<InventoryItem>> {
        let rows = query(&format!("SELECT {ITEM_COLUMNS} FROM inventories ORDER BY created_at, id"))
            .fetch_all(&self.db)
            .await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn replace_if_version(&self, expected_version: i64, draft: ItemDraft) -> StoreResult<Option<InventoryItem>> {
        let row = query(REPLACE_ITEM_SQL)
            .bind(draft.id)
            .bind(expected_version)
            .bind(draft.item_name.as_str())
            .bind(draft.category.as_str())
            .bind(draft.quantity_available)
            .bind(draft.unit_of_measurement.as_str())
            .bind(draft.reorder_level)
            .bind(draft.stock_status.as_str())
            .bind(draft.supplier.as_deref())
            .bind(draft.price)
            .bind(draft.last_restocked_date)
            .fetch_optional(&self.db)
            .await?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn remove(&self, id: Uuid) -> StoreResult<Option<InventoryItem>> {
        let row = query(&format!("DELETE FROM inventories WHERE id = $1 RETURNING {ITEM_COLUMNS}"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn collections(&self) -> StoreResult<Vec<String>> {
        Ok(query_scalar::<_, String>(LIST_TABLES_SQL).fetch_all(&self.db).await?)
    }
}
