// src/error.rs
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures reported by the injected browser capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrowserError {
    #[error("no element matches `{0}`")]
    NotFound(String),

    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    #[error("interaction failed: {0}")]
    Interaction(String),

    #[error("element `{0}` is no longer attached to the page")]
    Stale(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Restaurant-level (structural) failures. Item-level problems never surface here.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("restaurant `{0}` not found on the landing page")]
    RestaurantNotFound(String),

    #[error("could not activate restaurant `{name}`: {source}")]
    RestaurantActivation { name: String, source: BrowserError },

    #[error("lost the menu for `{restaurant}` and could not navigate back: {source}")]
    NavigationLost { restaurant: String, source: BrowserError },

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("store JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot parse config {}: {source}", .path.display())]
    Parse { path: PathBuf, source: serde_json::Error },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which part of a menu walk failed without stopping the restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MealPeriod,
    Tab,
    Rows,
    Links,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::MealPeriod => "meal period selection",
            Stage::Tab => "menu tab selection",
            Stage::Rows => "row discovery",
            Stage::Links => "item link discovery",
        })
    }
}

/// A non-structural failure inside one restaurant: logged, counted, skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{stage} failed for `{item}`: {reason}")]
pub struct ItemError {
    pub stage: Stage,
    pub item: String,
    pub reason: String,
}

impl ItemError {
    pub fn new(stage: Stage, item: impl Into<String>, reason: impl ToString) -> Self {
        Self { stage, item: item.into(), reason: reason.to_string() }
    }
}
