use prometheus::{IntCounter, IntCounterVec, Registry};

#[derive(Clone)]
pub struct InventoryMetrics {
    pub registry: Registry,
    pub item_mutations_total: IntCounterVec,
    pub mutation_conflicts: IntCounter,
    pub insufficient_stock: IntCounter,
    pub http_errors_total: IntCounterVec,
}

impl InventoryMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let item_mutations_total = IntCounterVec::new(
            prometheus::Opts::new(
                "inventory_item_mutations_total",
                "Successful inventory item mutations by operation"
            ),
            &["operation"]
        ).unwrap();
        let mutation_conflicts = IntCounter::new(
            "inventory_mutation_conflicts_total",
            "Conditional writes rejected because the item changed since it was read",
        ).unwrap();
        let insufficient_stock = IntCounter::new(
            "inventory_insufficient_stock_total",
            "Consume requests rejected for exceeding available quantity",
        ).unwrap();
        let http_errors_total = IntCounterVec::new(
            prometheus::Opts::new(
                "http_errors_total",
                "Count of HTTP error responses emitted (status >= 400)"
            ),
            &["service", "code", "status"]
        ).unwrap();
        let _ = registry.register(Box::new(item_mutations_total.clone()));
        let _ = registry.register(Box::new(mutation_conflicts.clone()));
        let _ = registry.register(Box::new(insufficient_stock.clone()));
        let _ = registry.register(Box::new(http_errors_total.clone()));
        InventoryMetrics { registry, item_mutations_total, mutation_conflicts, insufficient_stock, http_errors_total }
    }

    pub fn record_mutation(&self, operation: &str) {
        self.item_mutations_total.with_label_values(&[operation]).inc();
    }
}

impl Default for InventoryMetrics {
    fn default() -> Self { Self::new() }
}
