// src/scrape/strategy.rs
//! Interaction cascades.
//!
//! Opening an item panel or activating a navigation entry is done by trying an
//! ordered list of ways to do it and stopping at the first that works. Failures
//! and timeouts only advance the cascade; exhausting it is reported to the caller,
//! which decides whether that is fatal (restaurant) or not (item).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::{Browser, ClickMode, ElementHandle};
use crate::config::ScrapeConfig;
use crate::error::BrowserError;
use crate::specs::{ItemLink, RawNutritionFragment};

/// Ways to get at an item's nutrition panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenStrategy {
    /// GET the nutrition endpoint directly. Needs a known item id.
    ApiFetch,
    /// Call the page's item function on the link.
    ScriptCall,
    Click,
    ForcedClick,
}

impl OpenStrategy {
    pub const DEFAULT_ORDER: [OpenStrategy; 4] =
        [OpenStrategy::ApiFetch, OpenStrategy::ScriptCall, OpenStrategy::Click, OpenStrategy::ForcedClick];
}

/// Ways to activate a navigation element (restaurant, meal period, tab).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interaction { Click, ForcedClick, Function }

pub const RESTAURANT_ORDER: &[Interaction] = &[Interaction::ForcedClick, Interaction::Function, Interaction::Click];
pub const MEAL_PERIOD_ORDER: &[Interaction] = &[Interaction::Function, Interaction::Click, Interaction::ForcedClick];
pub const TAB_ORDER: &[Interaction] = &[Interaction::Click, Interaction::ForcedClick];

/// Try each interaction in `order`; the first success wins. Exhaustion returns the last error.
pub fn activate<B: Browser + ?Sized>(
    browser: &mut B,
    el: &ElementHandle,
    order: &[Interaction],
    nav_function: &str,
    timeout: Duration,
) -> Result<Interaction, BrowserError> {
    let mut last = BrowserError::Unsupported(s!("no interaction configured"));
    for how in order {
        let res = match how {
            Interaction::Click => browser.click(el, ClickMode::Normal, timeout),
            Interaction::ForcedClick => browser.click(el, ClickMode::Force, timeout),
            Interaction::Function => browser.call_function(nav_function, el, timeout),
        };
        match res {
            Ok(()) => return Ok(*how),
            Err(e) => {
                logd!("{:?} on `{}` failed: {}", how, el.text, e);
                last = e;
            }
        }
    }
    Err(last)
}

/// Run the configured open cascade for one item. `None` once every strategy failed.
pub fn open_item<B: Browser + ?Sized>(
    browser: &mut B,
    cfg: &ScrapeConfig,
    item: &ItemLink,
) -> Option<(RawNutritionFragment, OpenStrategy)> {
    for strategy in &cfg.strategies {
        match attempt(browser, cfg, item, *strategy) {
            Ok(Some(fragment)) => {
                logd!("{}: opened via {:?}", item.name, strategy);
                return Some((fragment, *strategy));
            }
            Ok(None) => {}
            Err(e) => logd!("{}: {:?} failed: {}", item.name, strategy, e),
        }
    }
    None
}

/// `Ok(None)` when the strategy doesn't apply to this item.
fn attempt<B: Browser + ?Sized>(
    browser: &mut B,
    cfg: &ScrapeConfig,
    item: &ItemLink,
    strategy: OpenStrategy,
) -> Result<Option<RawNutritionFragment>, BrowserError> {
    let t = &cfg.timeouts;
    match strategy {
        OpenStrategy::ApiFetch => {
            let Some(url) = item.item_id.and_then(|id| cfg.nutrition_url(id)) else { return Ok(None) };
            let body = browser.fetch(&url, t.panel())?;
            if body.trim().is_empty() {
                return Err(BrowserError::Interaction(format!("empty response from {url}")));
            }
            Ok(Some(RawNutritionFragment::new(body)))
        }
        OpenStrategy::ScriptCall => {
            browser.call_function(&cfg.selectors.item_function, &item.handle, t.element())?;
            capture_panel(browser, cfg).map(Some)
        }
        OpenStrategy::Click => {
            browser.click(&item.handle, ClickMode::Normal, t.element())?;
            capture_panel(browser, cfg).map(Some)
        }
        OpenStrategy::ForcedClick => {
            browser.click(&item.handle, ClickMode::Force, t.element())?;
            capture_panel(browser, cfg).map(Some)
        }
    }
}

fn capture_panel<B: Browser + ?Sized>(browser: &mut B, cfg: &ScrapeConfig) -> Result<RawNutritionFragment, BrowserError> {
    let panel = &cfg.selectors.nutrition_panel;
    browser.wait_for_selector(panel, cfg.timeouts.panel())?;
    let html = browser.inner_html(panel);
    close_panel(browser, cfg);
    Ok(RawNutritionFragment::new(html?))
}

/// Best-effort; a panel left open is only logged.
pub fn close_panel<B: Browser + ?Sized>(browser: &mut B, cfg: &ScrapeConfig) {
    let res = browser.query(&cfg.selectors.panel_close).and_then(|found| match found.first() {
        Some(btn) => browser.click(btn, ClickMode::Normal, cfg.timeouts.close()),
        None => Ok(()),
    });
    if let Err(e) = res {
        logd!("closing nutrition panel failed: {}", e);
    }
}

/// Click every visible modal close button. Failures are ignored.
pub fn dismiss_modals<B: Browser + ?Sized>(browser: &mut B, cfg: &ScrapeConfig) {
    for sel in &cfg.selectors.modal_close {
        let Ok(found) = browser.query(sel) else { continue };
        for btn in found {
            if browser.click(&btn, ClickMode::Normal, cfg.timeouts.close()).is_ok() {
                logd!("dismissed modal via `{}`", sel);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::MockBrowser;

    fn link(id: Option<u64>) -> ItemLink {
        ItemLink {
            handle: ElementHandle { id: s!("1:item"), text: s!("Scrambled Eggs"), ..ElementHandle::default() },
            name: s!("Scrambled Eggs"),
            item_id: id,
        }
    }

    fn timeout(what: &str) -> BrowserError {
        BrowserError::Timeout { what: s!(what), after: Duration::from_millis(5) }
    }

    #[test]
    fn api_fetch_short_circuits_when_id_known() {
        let cfg = ScrapeConfig::default();
        let mut b = MockBrowser::new();
        b.expect_fetch()
            .times(1)
            .returning(|_, _| Ok(s!("<p>Calories 140</p>")));

        let (frag, how) = open_item(&mut b, &cfg, &link(Some(202))).unwrap();
        assert_eq!(how, OpenStrategy::ApiFetch);
        assert!(frag.html.contains("140"));
    }

    #[test]
    fn falls_through_to_forced_click() {
        let cfg = ScrapeConfig::default();
        let mut b = MockBrowser::new();
        b.expect_call_function().times(1).returning(|_, _, _| Err(BrowserError::Interaction(s!("threw"))));
        b.expect_click()
            .withf(|_, mode, _| *mode == ClickMode::Normal)
            .times(1)
            .returning(|_, _, _| Err(timeout("click")));
        b.expect_click()
            .withf(|_, mode, _| *mode == ClickMode::Force)
            .times(1)
            .returning(|_, _, _| Ok(()));
        b.expect_wait_for_selector().times(1).returning(|_, _| Ok(ElementHandle::default()));
        b.expect_inner_html().times(1).returning(|_| Ok(s!("<p>Protein 7g</p>")));
        b.expect_query().returning(|_| Ok(Vec::new()));

        let (frag, how) = open_item(&mut b, &cfg, &link(None)).unwrap();
        assert_eq!(how, OpenStrategy::ForcedClick);
        assert_eq!(frag.html, "<p>Protein 7g</p>");
    }

    #[test]
    fn exhausted_cascade_is_none() {
        let cfg = ScrapeConfig::default();
        let mut b = MockBrowser::new();
        b.expect_fetch().returning(|_, _| Err(BrowserError::NotFound(s!("404"))));
        b.expect_call_function().returning(|_, _, _| Ok(()));
        b.expect_click().returning(|_, _, _| Ok(()));
        b.expect_wait_for_selector().returning(|_, _| Err(timeout("#nutritionLabel")));

        assert!(open_item(&mut b, &cfg, &link(Some(9))).is_none());
    }

    #[test]
    fn strategy_order_is_configurable() {
        let cfg = ScrapeConfig { strategies: vec![OpenStrategy::Click], ..ScrapeConfig::default() };
        let mut b = MockBrowser::new();
        b.expect_click().times(1).returning(|_, _, _| Err(timeout("click")));
        // no fetch expectation: ApiFetch must not run even with an id
        assert!(open_item(&mut b, &cfg, &link(Some(5))).is_none());
    }

    #[test]
    fn activation_stops_at_first_success() {
        let mut b = MockBrowser::new();
        b.expect_click()
            .withf(|_, mode, _| *mode == ClickMode::Force)
            .times(1)
            .returning(|_, _, _| Err(BrowserError::Interaction(s!("detached"))));
        b.expect_call_function().times(1).returning(|_, _, _| Ok(()));

        let el = ElementHandle::default();
        let how = activate(&mut b, &el, RESTAURANT_ORDER, "nav", Duration::from_millis(5)).unwrap();
        assert_eq!(how, Interaction::Function);
    }

    #[test]
    fn activation_exhaustion_returns_last_error() {
        let mut b = MockBrowser::new();
        b.expect_click().returning(|_, _, _| Err(BrowserError::Interaction(s!("nope"))));
        let el = ElementHandle::default();
        let err = activate(&mut b, &el, TAB_ORDER, "nav", Duration::ZERO).unwrap_err();
        assert_eq!(err, BrowserError::Interaction(s!("nope")));
    }
}
