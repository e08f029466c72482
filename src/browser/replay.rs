// src/browser/replay.rs
//! Scripted browser over a JSON site snapshot.
//!
//! A snapshot lists pages by name, each mapping selectors to the elements they
//! match, plus `global` elements present on every page (modal and panel close
//! buttons). Elements may carry an action for a click and for a page-function call:
//! navigate to another page, open the nutrition panel with some markup, or close it.
//! `obscured` elements only yield to a forced click; `broken` ones fail every
//! interaction. Handles are tied to the page generation they were read in.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Browser, ClickMode, ElementHandle};
use crate::error::{BrowserError, ConfigError};

type Elements = BTreeMap<String, Vec<ElementSnapshot>>;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSnapshot {
    /// URL → page name.
    pub urls: BTreeMap<String, String>,
    /// URL → body, for direct fetches.
    pub fetch: BTreeMap<String, String>,
    pub pages: BTreeMap<String, PageSnapshot>,
    pub global: Elements,
    /// History navigation fails; forces the re-navigation path.
    pub back_disabled: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSnapshot {
    pub elements: Elements,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSnapshot {
    pub text: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Elements,
    pub on_click: Option<Action>,
    pub on_call: Option<Action>,
    pub obscured: bool,
    pub broken: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Navigate { page: String },
    OpenPanel { selector: String, html: String },
    ClosePanel,
}

impl SiteSnapshot {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }
}

struct Panel {
    selector: String,
    html: String,
}

pub struct ReplayBrowser {
    site: SiteSnapshot,
    page: Option<String>,
    history: Vec<String>,
    generation: u64,
    panel: Option<Panel>,
    registry: HashMap<String, ElementSnapshot>,
    journal: Vec<String>,
}

impl ReplayBrowser {
    pub fn new(site: SiteSnapshot) -> Self {
        Self {
            site,
            page: None,
            history: Vec::new(),
            generation: 0,
            panel: None,
            registry: HashMap::new(),
            journal: Vec::new(),
        }
    }

    /// Every interaction so far, one line each (`navigate <url>`, `click <id>`, ...).
    pub fn journal(&self) -> &[String] { &self.journal }

    pub fn current_page(&self) -> Option<&str> { self.page.as_deref() }

    fn enter(&mut self, page: String, push: bool) -> Result<(), BrowserError> {
        if !self.site.pages.contains_key(&page) {
            return Err(BrowserError::NotFound(format!("page {page}")));
        }
        if push {
            if let Some(prev) = self.page.take() { self.history.push(prev); }
        }
        self.page = Some(page);
        self.generation += 1;
        self.registry.clear();
        self.panel = None;
        Ok(())
    }

    fn lookup(&self, handle: &ElementHandle) -> Result<ElementSnapshot, BrowserError> {
        let generation = handle.id.split(':').next().and_then(|g| g.parse::<u64>().ok());
        if generation != Some(self.generation) {
            return Err(BrowserError::Stale(handle.id.clone()));
        }
        self.registry
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| BrowserError::NotFound(handle.id.clone()))
    }

    fn register(&mut self, path: String, snap: &ElementSnapshot) -> ElementHandle {
        let id = format!("{}:{}", self.generation, path);
        self.registry.insert(id.clone(), snap.clone());
        ElementHandle { id, text: snap.text.clone(), attrs: snap.attrs.clone() }
    }

    fn matches(&self, selector: &str) -> Vec<(String, ElementSnapshot)> {
        let mut out = Vec::new();
        for (scope, elems) in [("global", self.site.global.get(selector)), ("page", self.page_elements(selector))] {
            for (i, e) in elems.into_iter().flatten().enumerate() {
                out.push((format!("{scope}/{selector}/{i}"), e.clone()));
            }
        }
        out
    }

    fn page_elements(&self, selector: &str) -> Option<&Vec<ElementSnapshot>> {
        let page = self.page.as_ref()?;
        self.site.pages.get(page)?.elements.get(selector)
    }

    fn run(&mut self, action: Option<Action>) -> Result<(), BrowserError> {
        match action {
            None => Ok(()),
            Some(Action::Navigate { page }) => self.enter(page, true),
            Some(Action::OpenPanel { selector, html }) => {
                self.panel = Some(Panel { selector, html });
                Ok(())
            }
            Some(Action::ClosePanel) => {
                self.panel = None;
                Ok(())
            }
        }
    }

    fn panel_matches(&self, selector: &str) -> bool {
        self.panel.as_ref().is_some_and(|p| p.selector == selector)
    }
}

impl Browser for ReplayBrowser {
    fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), BrowserError> {
        self.journal.push(format!("navigate {url}"));
        let page = self.site.urls.get(url).cloned()
            .ok_or_else(|| BrowserError::NotFound(format!("url {url}")))?;
        self.enter(page, true)
    }

    fn back(&mut self, _timeout: Duration) -> Result<(), BrowserError> {
        self.journal.push(s!("back"));
        if self.site.back_disabled {
            return Err(BrowserError::Interaction(s!("history navigation unavailable")));
        }
        let prev = self.history.pop()
            .ok_or_else(|| BrowserError::Interaction(s!("no history entry")))?;
        self.enter(prev, false)
    }

    fn wait_for_network_idle(&mut self, _timeout: Duration) -> Result<(), BrowserError> { Ok(()) }

    fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> Result<ElementHandle, BrowserError> {
        if self.panel_matches(selector) {
            let snap = ElementSnapshot::default();
            return Ok(self.register(format!("panel/{selector}"), &snap));
        }
        self.query(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::Timeout { what: s!(selector), after: timeout })
    }

    fn query(&mut self, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        let found = self.matches(selector);
        Ok(found.iter().map(|(path, snap)| self.register(path.clone(), snap)).collect())
    }

    fn query_within(&mut self, parent: &ElementHandle, selector: &str) -> Result<Vec<ElementHandle>, BrowserError> {
        let node = self.lookup(parent)?;
        let base = parent.id.split_once(':').map(|(_, p)| p.to_string()).unwrap_or_default();
        let kids = node.children.get(selector).cloned().unwrap_or_default();
        Ok(kids
            .iter()
            .enumerate()
            .map(|(i, k)| self.register(format!("{base}>{selector}/{i}"), k))
            .collect())
    }

    fn click(&mut self, element: &ElementHandle, mode: ClickMode, timeout: Duration) -> Result<(), BrowserError> {
        self.journal.push(format!("click {} {:?}", element.id, mode));
        let node = self.lookup(element)?;
        if node.broken {
            return Err(BrowserError::Interaction(format!("{} is detached", element.id)));
        }
        if node.obscured && mode == ClickMode::Normal {
            return Err(BrowserError::Timeout { what: format!("click {}", element.id), after: timeout });
        }
        self.run(node.on_click)
    }

    fn call_function(&mut self, function: &str, element: &ElementHandle, _timeout: Duration) -> Result<(), BrowserError> {
        self.journal.push(format!("call {function} {}", element.id));
        let node = self.lookup(element)?;
        if node.broken {
            return Err(BrowserError::Interaction(format!("{function} threw on {}", element.id)));
        }
        self.run(node.on_call)
    }

    fn evaluate(&mut self, script: &str) -> Result<(), BrowserError> {
        self.journal.push(format!("evaluate {}", script.len()));
        Ok(())
    }

    fn inner_html(&mut self, selector: &str) -> Result<String, BrowserError> {
        if let Some(p) = self.panel.as_ref().filter(|p| p.selector == selector) {
            return Ok(p.html.clone());
        }
        self.matches(selector)
            .into_iter()
            .next()
            .map(|(_, e)| e.text)
            .ok_or_else(|| BrowserError::NotFound(s!(selector)))
    }

    fn fetch(&mut self, url: &str, _timeout: Duration) -> Result<String, BrowserError> {
        self.journal.push(format!("fetch {url}"));
        self.site.fetch.get(url).cloned().ok_or_else(|| BrowserError::NotFound(format!("url {url}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = r##"{
        "urls": { "https://menu.test": "home" },
        "global": { "#close": [ { "on_click": { "kind": "close_panel" } } ] },
        "pages": {
            "home": { "elements": {
                "a.go": [ { "text": "Go", "on_click": { "kind": "navigate", "page": "next" } } ],
                "a.cover": [ { "text": "Hidden", "obscured": true,
                               "on_click": { "kind": "open_panel", "selector": "#panel", "html": "<b>ok</b>" } } ]
            } },
            "next": { "elements": {
                "tr": [ { "text": "row", "children": { "a": [ { "text": "Item" } ] } } ]
            } }
        }
    }"##;

    fn browser() -> ReplayBrowser {
        let mut b = ReplayBrowser::new(SiteSnapshot::from_json(SITE).unwrap());
        b.navigate("https://menu.test", Duration::ZERO).unwrap();
        b
    }

    #[test]
    fn navigation_invalidates_handles() {
        let mut b = browser();
        let go = b.query("a.go").unwrap().remove(0);
        b.click(&go, ClickMode::Normal, Duration::ZERO).unwrap();
        assert_eq!(b.current_page(), Some("next"));
        assert!(matches!(b.click(&go, ClickMode::Normal, Duration::ZERO), Err(BrowserError::Stale(_))));

        b.back(Duration::ZERO).unwrap();
        assert_eq!(b.current_page(), Some("home"));
    }

    #[test]
    fn obscured_needs_force_and_panel_round_trip() {
        let mut b = browser();
        let el = b.query("a.cover").unwrap().remove(0);
        let t = Duration::from_millis(5);
        assert!(matches!(b.click(&el, ClickMode::Normal, t), Err(BrowserError::Timeout { .. })));
        b.click(&el, ClickMode::Force, t).unwrap();
        b.wait_for_selector("#panel", t).unwrap();
        assert_eq!(b.inner_html("#panel").unwrap(), "<b>ok</b>");

        let close = b.query("#close").unwrap().remove(0);
        b.click(&close, ClickMode::Normal, t).unwrap();
        assert!(matches!(b.wait_for_selector("#panel", t), Err(BrowserError::Timeout { .. })));
    }

    #[test]
    fn children_are_scoped_to_parent() {
        let mut b = browser();
        let go = b.query("a.go").unwrap().remove(0);
        b.click(&go, ClickMode::Normal, Duration::ZERO).unwrap();
        let row = b.query("tr").unwrap().remove(0);
        let items = b.query_within(&row, "a").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "Item");
        assert!(b.query("a").unwrap().is_empty());
    }

    #[test]
    fn unknown_url_is_not_found() {
        let mut b = browser();
        assert!(matches!(b.navigate("https://other.test", Duration::ZERO), Err(BrowserError::NotFound(_))));
        assert!(matches!(b.fetch("https://other.test", Duration::ZERO), Err(BrowserError::NotFound(_))));
    }
}
