// src/specs/mod.rs
//! # Page-reading module
//!
//! Everything that knows *what the menu site's markup means* lives here, kept
//! apart from the code that decides when to click and where to go.
//!
//! ## What lives here
//! - `nutrition`: turns a captured nutrition panel into the 14 tracked fields.
//!   Tolerant by construction; unreadable fields stay 0 and the parse never fails.
//! - `menu`: reads rows and links of the item table (section headers, item names,
//!   item ids from `data-itemid`/`onclick`).
//!
//! ## What does **not** live here
//! - Browser interaction and fallback cascades (`scrape`).
//! - Validation, deduplication or persistence.
//!
//! ## Conventions
//! - Case-insensitive matching on visible text; markup noise is stripped first
//!   via `core::vischars`.
//! - Testable offline against captured fragments (`tests/fixtures`).
//!
//! In short: **`specs` knows how to read the pages.**
pub mod menu;
pub mod nutrition;

pub use menu::ItemLink;
pub use nutrition::{NutritionParser, ParsedNutrition, RawNutritionFragment};
