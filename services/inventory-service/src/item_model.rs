use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Grains,
    Vegetables,
    Dairy,
    Beverages,
    Spices,
    Oils,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Grains,
        Category::Vegetables,
        Category::Dairy,
        Category::Beverages,
        Category::Spices,
        Category::Oils,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Grains => "Grains",
            Category::Vegetables => "Vegetables",
            Category::Dairy => "Dairy",
            Category::Beverages => "Beverages",
            Category::Spices => "Spices",
            Category::Oils => "Oils",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Liters,
    Packets,
    Pieces,
    Grams,
    Ml,
}

impl Unit {
    pub const ALL: [Unit; 6] = [Unit::Kg, Unit::Liters, Unit::Packets, Unit::Pieces, Unit::Grams, Unit::Ml];

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Liters => "liters",
            Unit::Packets => "packets",
            Unit::Pieces => "pieces",
            Unit::Grams => "grams",
            Unit::Ml => "ml",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    Available,
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl StockStatus {
    pub const ALL: [StockStatus; 3] = [StockStatus::Available, StockStatus::LowStock, StockStatus::OutOfStock];

    pub fn derive(quantity_available: f64, reorder_level: f64) -> Self {
        if quantity_available <= 0.0 {
            StockStatus::OutOfStock
        } else if quantity_available <= reorder_level {
            StockStatus::LowStock
        } else {
            StockStatus::Available
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Available => "Available",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            StockStatus::Available => "available",
            StockStatus::LowStock => "low-stock",
            StockStatus::OutOfStock => "out-of-stock",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub field: &'static str,
    pub value: String,
    pub expected: Vec<&'static str>,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {} '{}'. Expected one of: {}", self.field, self.value, self.expected.join(", "))
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                field: "category",
                value: s.to_string(),
                expected: Category::ALL.iter().map(Category::as_str).collect(),
            })
    }
}

impl FromStr for Unit {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::ALL
            .into_iter()
            .find(|u| u.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                field: "unitOfMeasurement",
                value: s.to_string(),
                expected: Unit::ALL.iter().map(Unit::as_str).collect(),
            })
    }
}

impl FromStr for StockStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StockStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                field: "stockStatus",
                value: s.to_string(),
                expected: StockStatus::ALL.iter().map(StockStatus::as_str).collect(),
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub id: Uuid,
    pub item_name: String,
    pub category: Category,
    pub quantity_available: f64,
    pub unit_of_measurement: Unit,
    pub reorder_level: f64,
    pub stock_status: StockStatus,
    pub supplier: Option<String>,
    pub price: Option<f64>,
    pub last_restocked_date: Option<DateTime<Utc>>,
}

impl ItemDraft {
    pub(crate) fn refresh_status(&mut self) {
        self.stock_status = StockStatus::derive(self.quantity_available, self.reorder_level);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub item_name: String,
    pub category: Category,
    pub quantity_available: f64,
    pub unit_of_measurement: Unit,
    pub reorder_level: f64,
    pub stock_status: StockStatus,
    pub supplier: Option<String>,
    pub price: Option<f64>,
    pub last_restocked_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl InventoryItem {
    pub fn draft(&self) -> ItemDraft {
        ItemDraft {
            id: self.id,
            item_name: self.item_name.clone(),
            category: self.category,
            quantity_available: self.quantity_available,
            unit_of_measurement: self.unit_of_measurement,
            reorder_level: self.reorder_level,
            stock_status: self.stock_status,
            supplier: self.supplier.clone(),
            price: self.price,
            last_restocked_date: self.last_restocked_date,
        }
    }

    pub fn status_is_consistent(&self) -> bool {
        self.stock_status == StockStatus::derive(self.quantity_available, self.reorder_level)
    }
}

/// Body of `POST /items`. Every field is optional at the wire level so that a
/// missing field yields a validation failure instead of a JSON rejection.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_available: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reorder_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Body of `PUT /items/{id}`. Absent fields keep their prior value; `supplier`
/// and `price` may be cleared with an explicit `null`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_available: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reorder_level: Option<f64>,
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub supplier: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub price: Option<Option<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeRequest {
    #[serde(default)]
    pub quantity_used: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    #[serde(default)]
    pub quantity_to_add: Option<f64>,
}

// Present-with-null becomes Some(None); absence is handled by `default`.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_rule_boundaries() {
        assert_eq!(StockStatus::derive(0.0, 5.0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::derive(0.0, 0.0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::derive(0.5, 5.0), StockStatus::LowStock);
        assert_eq!(StockStatus::derive(5.0, 5.0), StockStatus::LowStock);
        assert_eq!(StockStatus::derive(5.01, 5.0), StockStatus::Available);
        assert_eq!(StockStatus::derive(1.0, 0.0), StockStatus::Available);
    }

    #[test]
    fn status_rule_is_idempotent() {
        for (q, r) in [(0.0, 1.0), (3.0, 3.0), (10.0, 2.0)] {
            let first = StockStatus::derive(q, r);
            assert_eq!(first, StockStatus::derive(q, r));
        }
    }

    #[test]
    fn status_serializes_with_display_labels() {
        assert_eq!(serde_json::to_string(&StockStatus::LowStock).unwrap(), "\"Low Stock\"");
        assert_eq!(serde_json::to_string(&StockStatus::OutOfStock).unwrap(), "\"Out of Stock\"");
        assert_eq!("Out of Stock".parse::<StockStatus>().unwrap(), StockStatus::OutOfStock);
    }

    #[test]
    fn units_use_lowercase_wire_names() {
        assert_eq!(serde_json::to_string(&Unit::Liters).unwrap(), "\"liters\"");
        assert_eq!("ml".parse::<Unit>().unwrap(), Unit::Ml);
        assert!("Kg".parse::<Unit>().is_err());
    }

    #[test]
    fn unknown_category_lists_expected_values() {
        let err = "Meat".parse::<Category>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid category 'Meat'. Expected one of: Grains, Vegetables, Dairy, Beverages, Spices, Oils"
        );
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: ItemPatch = serde_json::from_str(r#"{"supplier": null}"#).unwrap();
        assert_eq!(patch.supplier, Some(None));
        assert_eq!(patch.price, None);

        let patch: ItemPatch = serde_json::from_str(r#"{"price": 2.5}"#).unwrap();
        assert_eq!(patch.price, Some(Some(2.5)));
        assert_eq!(patch.supplier, None);
    }

    #[test]
    fn patch_ignores_stock_status_from_caller() {
        let patch: ItemPatch =
            serde_json::from_str(r#"{"stockStatus": "Available", "reorderLevel": 3}"#).unwrap();
        assert_eq!(patch.reorder_level, Some(3.0));
    }

    #[test]
    fn item_serializes_camel_case() {
        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4(),
            item_name: "Rice".into(),
            category: Category::Grains,
            quantity_available: 10.0,
            unit_of_measurement: Unit::Kg,
            reorder_level: 5.0,
            stock_status: StockStatus::Available,
            supplier: None,
            price: None,
            last_restocked_date: None,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["itemName"], "Rice");
        assert_eq!(value["unitOfMeasurement"], "kg");
        assert_eq!(value["stockStatus"], "Available");
        assert!(value["lastRestockedDate"].is_null());
        assert!(item.status_is_consistent());
    }
}
