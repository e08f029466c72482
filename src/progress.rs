// src/progress.rs
use crate::scrape::RestaurantSummary;

/// Lightweight progress reporting for a scrape run.
/// Frontends implement this to surface status; every hook defaults to a no-op.
pub trait Progress {
    /// Called at the start with the number of restaurants to visit.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    fn restaurant_started(&mut self, _name: &str) {}

    fn restaurant_done(&mut self, _name: &str, _summary: &RestaurantSummary) {}

    fn restaurant_failed(&mut self, _name: &str, _error: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
