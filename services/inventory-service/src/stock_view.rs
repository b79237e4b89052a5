use crate::item_model::{Category, InventoryItem, StockStatus};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const ALL_CATEGORIES: &str = "All";
pub const NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn options() -> Vec<CategoryFilter> {
        std::iter::once(CategoryFilter::All)
            .chain(Category::ALL.into_iter().map(CategoryFilter::Only))
            .collect()
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Only(c) => c.as_str(),
        }
    }

    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => *c == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = crate::item_model::UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ALL_CATEGORIES {
            return Ok(CategoryFilter::All);
        }
        s.parse().map(CategoryFilter::Only)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewFilter {
    pub search: String,
    pub category: CategoryFilter,
}

impl ViewFilter {
    pub fn matches(&self, item: &InventoryItem) -> bool {
        let needle = self.search.to_lowercase();
        item.item_name.to_lowercase().contains(&needle) && self.category.matches(item.category)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub total: usize,
    pub available: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
}

impl StockSummary {
    pub fn of(items: &[InventoryItem]) -> Self {
        items.iter().fold(StockSummary { total: items.len(), ..Default::default() }, |mut acc, item| {
            match item.stock_status {
                StockStatus::Available => acc.available += 1,
                StockStatus::LowStock => acc.low_stock += 1,
                StockStatus::OutOfStock => acc.out_of_stock += 1,
            }
            acc
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDisplay {
    pub id: Uuid,
    pub is_low_stock: bool,
    pub is_out_of_stock: bool,
    pub css_class: &'static str,
    pub badge_class: &'static str,
    pub can_use: bool,
}

impl ItemDisplay {
    pub fn of(item: &InventoryItem) -> Self {
        let is_out_of_stock = item.quantity_available <= 0.0;
        let is_low_stock = item.quantity_available <= item.reorder_level;
        let css_class = if is_out_of_stock {
            "out-of-stock"
        } else if is_low_stock {
            "low-stock"
        } else {
            "available"
        };
        Self {
            id: item.id,
            is_low_stock,
            is_out_of_stock,
            css_class,
            badge_class: item.stock_status.slug(),
            can_use: !is_out_of_stock,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemChange {
    Created(InventoryItem),
    Replaced(InventoryItem),
    Deleted(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    expires_at: Instant,
}

impl Notice {
    pub fn success(text: impl Into<String>, now: Instant) -> Self {
        Self { text: format!("✓ {}", text.into()), expires_at: now + NOTICE_TTL }
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Clone, Default)]
pub struct InventoryView {
    items: Vec<InventoryItem>,
    pub filter: ViewFilter,
}

impl InventoryView {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self { items, filter: ViewFilter::default() }
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn replace_all(&mut self, items: Vec<InventoryItem>) {
        self.items = items;
    }

    pub fn visible(&self) -> Vec<&InventoryItem> {
        self.items.iter().filter(|item| self.filter.matches(item)).collect()
    }

    /// Counts over the whole list, ignoring the active filter.
    pub fn summary(&self) -> StockSummary {
        StockSummary::of(&self.items)
    }

    pub fn apply(&mut self, change: ItemChange) {
        match change {
            ItemChange::Created(item) => self.items.push(item),
            ItemChange::Replaced(item) => {
                if let Some(slot) = self.items.iter_mut().find(|i| i.id == item.id) {
                    *slot = item;
                }
            }
            ItemChange::Deleted(id) => self.items.retain(|i| i.id != id),
        }
    }
}
