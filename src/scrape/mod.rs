// src/scrape/mod.rs
mod context;
mod controller;
mod report;
mod strategy;

pub use context::MenuContext;
pub use controller::{Controller, ItemOutcome};
pub use report::{RestaurantReport, RestaurantSummary, RunReport};
pub use strategy::{Interaction, OpenStrategy, activate, close_panel, dismiss_modals, open_item};
