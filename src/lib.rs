// src/lib.rs

#[macro_use]
pub mod macros;

#[doc(hidden)]
pub use tracing as __tracing;

pub mod browser;
pub mod config;
pub mod core;
pub mod csv;
pub mod data;
pub mod dedup;
pub mod error;
pub mod log;
pub mod progress;
pub mod runner;
pub mod scrape;
pub mod section;
pub mod specs;
pub mod store;
pub mod validate;

#[cfg(feature = "cli")]
pub mod cli;
