pub mod app;
pub mod config;
pub mod inventory_client;
pub mod item_handlers;
pub mod item_model;
pub mod item_service;
pub mod item_store;
pub mod pg_item_store;
pub mod stock_view;

pub use crate::app::{build_router, build_state, AppState};
pub use crate::config::ServiceConfig;
