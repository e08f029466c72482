// src/browser/mod.rs
//! Browser seam.
//!
//! The traversal only ever talks to the menu site through [`Browser`]: navigation,
//! element lookup, clicks, page-function calls, script evaluation and plain fetches.
//! Every call is synchronous and bounded by the timeout it is given. Element handles
//! are only valid for the page they were read from; a handle from a page that has
//! since been navigated away from yields [`BrowserError::Stale`].
//!
//! `replay` provides a scripted implementation driven by a JSON site snapshot, used
//! by the CLI for offline runs and by the integration tests.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::BrowserError;

pub mod replay;
pub use replay::{ReplayBrowser, SiteSnapshot};

/// A located element: an opaque id plus what was visible at lookup time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementHandle {
    pub id: String,
    pub text: String,
    pub attrs: BTreeMap<String, String>,
}

impl ElementHandle {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|k| k.eq_ignore_ascii_case(class)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickMode {
    Normal,
    /// Skip actionability checks (overlays, visibility).
    Force,
}

#[cfg_attr(test, mockall::automock)]
pub trait Browser {
    fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError>;
    fn back(&mut self, timeout: Duration) -> Result<(), BrowserError>;
    fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), BrowserError>;
    fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<ElementHandle, BrowserError>;
    /// All matches on the current page, in document order. No match is an empty list.
    fn query(&mut self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError>;
    fn query_within(&mut self, parent: &ElementHandle, selector: &str) -> Result<Vec<ElementHandle>, BrowserError>;
    fn click(&mut self, element: &ElementHandle, mode: ClickMode, timeout: Duration) -> Result<(), BrowserError>;
    /// Invoke a named page function with the element as its argument.
    fn call_function(&mut self, function: &str, element: &ElementHandle, timeout: Duration) -> Result<(), BrowserError>;
    fn evaluate(&mut self, script: &str) -> Result<(), BrowserError>;
    fn inner_html(&mut self, selector: &str) -> Result<String, BrowserError>;
    /// GET `url` in the page's session and return the body.
    fn fetch(&mut self, url: &str, timeout: Duration) -> Result<String, BrowserError>;
}
