// src/runner.rs
use crate::browser::Browser;
use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::progress::Progress;
use crate::scrape::{Controller, RunReport};
use crate::store::RecordStore;

/// Scrape every configured restaurant, then hand the records to `store` and flush it.
///
/// Restaurant failures end up in the report; only store failures are returned as errors.
pub fn run<B: Browser + ?Sized>(
    browser: &mut B,
    config: &ScrapeConfig,
    store: &mut dyn RecordStore,
    progress: &mut dyn Progress,
) -> Result<RunReport, ScrapeError> {
    if config.restaurants.is_empty() {
        progress.log("No restaurants configured; nothing to do.");
        return Ok(RunReport::default());
    }

    let mut controller = Controller::new(browser, config);
    let report = controller.run(&config.restaurants, progress);
    let records = controller.into_records();

    progress.log(&format!("Saving {} records…", records.len()));
    for rec in records {
        store.upsert(rec)?;
    }
    store.flush()?;
    Ok(report)
}
