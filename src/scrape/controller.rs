// src/scrape/controller.rs
//! Menu traversal.
//!
//! restaurant → meal periods (or one flat "All Day" period) → default view and
//! each menu tab → rows → item links → open/parse/validate/dedup.
//!
//! Only restaurant-level problems are errors: the restaurant isn't listed, can't
//! be activated, or the menu is lost and can't be re-entered. Anything below that
//! is logged, counted in the summary and skipped.

use crate::browser::{Browser, ElementHandle};
use crate::config::ScrapeConfig;
use crate::data::NutrientRecord;
use crate::dedup::{DedupOutcome, Deduplicator, ItemIdentity};
use crate::error::{BrowserError, ItemError, ScrapeError, Stage};
use crate::progress::Progress;
use crate::section::SectionResolver;
use crate::specs::menu::{clean_label, item_link, section_label};
use crate::specs::{ItemLink, NutritionParser, RawNutritionFragment};
use crate::validate::{NutritionValidator, Rejection, Verdict};

use super::context::MenuContext;
use super::report::{RestaurantReport, RestaurantSummary, RunReport};
use super::strategy::{self, MEAL_PERIOD_ORDER, RESTAURANT_ORDER, TAB_ORDER};

/// What happened to one item link.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemOutcome {
    New { placeholder: bool, has_nutrition: bool },
    Duplicate,
    SectionUpgraded { from: String, to: String },
    Rejected(Vec<Rejection>),
    /// An earlier placeholder opened this time and now has real values.
    PlaceholderFilled { has_nutrition: bool },
    /// An earlier placeholder opened this time and failed validation; its row is dropped.
    PlaceholderRejected(Vec<Rejection>),
}

pub struct Controller<'a, B: Browser + ?Sized> {
    browser: &'a mut B,
    cfg: &'a ScrapeConfig,
    parser: NutritionParser,
    validator: NutritionValidator,
    resolver: SectionResolver,
    dedup: Deduplicator,
}

impl<'a, B: Browser + ?Sized> Controller<'a, B> {
    pub fn new(browser: &'a mut B, cfg: &'a ScrapeConfig) -> Self {
        Self {
            browser,
            cfg,
            parser: NutritionParser::new(cfg.selectors.calorie_classes.clone()),
            validator: NutritionValidator::new(cfg.validation.clone()),
            resolver: SectionResolver::new(&cfg.section_priorities),
            dedup: Deduplicator::new(),
        }
    }

    pub fn records(&self) -> &[NutrientRecord] { self.dedup.records() }
    pub fn into_records(self) -> Vec<NutrientRecord> { self.dedup.into_records() }

    /// Visit every restaurant in order. A failed restaurant never stops the others.
    pub fn run(&mut self, restaurants: &[String], progress: &mut dyn Progress) -> RunReport {
        let mut report = RunReport::default();
        progress.begin(restaurants.len());

        for name in restaurants {
            progress.restaurant_started(name);
            match self.scrape_restaurant(name) {
                Ok(summary) => {
                    logf!(
                        "{}: {} items ({} with nutrition, {} rejected, {} duplicates, {} placeholders)",
                        name, summary.items_found, summary.items_with_nutrition,
                        summary.rejected, summary.duplicates, summary.placeholders
                    );
                    progress.restaurant_done(name, &summary);
                    report.restaurants.push(RestaurantReport::Done(summary));
                }
                Err(error) => {
                    loge!("{}: {}", name, error);
                    progress.restaurant_failed(name, &error.to_string());
                    report.restaurants.push(RestaurantReport::Failed { name: name.clone(), error });
                }
            }
        }

        logf!("{}", report.summary_line());
        progress.finish();
        report
    }

    pub fn scrape_restaurant(&mut self, name: &str) -> Result<RestaurantSummary, ScrapeError> {
        let mut summary = RestaurantSummary::new(name);
        let mut ctx = MenuContext::new(name, &self.cfg.default_section);

        self.enter_restaurant(name)?;
        let periods = self.meal_period_labels();

        if periods.is_empty() {
            logf!("{}: no meal periods found, reading the menu as `{}`", name, self.cfg.all_day_label);
            summary.flat_fallback = true;
            ctx.enter_meal_period(&self.cfg.all_day_label);
            self.walk_views(&mut ctx, &mut summary);
            return Ok(summary);
        }

        logd!("{}: meal periods {:?}", name, periods);
        for (i, label) in periods.iter().enumerate() {
            let el = if i == 0 { self.find_meal_period(label) } else { self.return_to_periods(name, label)? };
            let Some(el) = el else {
                logw!("{}: meal period `{}` disappeared", name, label);
                summary.errors.push(ItemError::new(Stage::MealPeriod, label.as_str(), "not listed after returning"));
                continue;
            };

            let t = self.cfg.timeouts.element();
            if let Err(e) = strategy::activate(&mut *self.browser, &el, MEAL_PERIOD_ORDER, &self.cfg.selectors.nav_function, t) {
                logw!("{}: cannot select meal period `{}`: {}", name, label, e);
                summary.errors.push(ItemError::new(Stage::MealPeriod, label.as_str(), e));
                continue;
            }
            self.settle();

            ctx.enter_meal_period(label);
            summary.meal_periods += 1;
            self.walk_views(&mut ctx, &mut summary);
        }
        Ok(summary)
    }

    /* ---------------- navigation ---------------- */

    fn settle(&mut self) {
        if let Err(e) = self.browser.wait_for_network_idle(self.cfg.timeouts.network_idle()) {
            logd!("network did not go idle: {}", e);
        }
    }

    /// Land on the root page and activate `name`.
    fn enter_restaurant(&mut self, name: &str) -> Result<(), ScrapeError> {
        self.browser.navigate(&self.cfg.base_url, self.cfg.timeouts.navigation())?;
        self.settle();
        strategy::dismiss_modals(&mut *self.browser, self.cfg);

        let selector = self.cfg.restaurant_selector(name);
        let link = self
            .browser
            .wait_for_selector(&selector, self.cfg.timeouts.element())
            .map_err(|e| {
                logd!("restaurant lookup `{}`: {}", selector, e);
                ScrapeError::RestaurantNotFound(s!(name))
            })?;

        let t = self.cfg.timeouts.element();
        let how = strategy::activate(&mut *self.browser, &link, RESTAURANT_ORDER, &self.cfg.selectors.nav_function, t)
            .map_err(|source| ScrapeError::RestaurantActivation { name: s!(name), source })?;
        logd!("{}: activated via {:?}", name, how);

        self.settle();
        strategy::dismiss_modals(&mut *self.browser, self.cfg);
        Ok(())
    }

    /// Meal-period entries from the first selector that matches anything.
    fn meal_period_elements(&mut self) -> Vec<ElementHandle> {
        for sel in &self.cfg.selectors.meal_periods {
            match self.browser.query(sel) {
                Ok(found) if !found.is_empty() => return found,
                Ok(_) => {}
                Err(e) => logd!("meal period selector `{}`: {}", sel, e),
            }
        }
        Vec::new()
    }

    fn meal_period_labels(&mut self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for el in self.meal_period_elements() {
            let label = clean_label(&el.text);
            if !label.is_empty() && !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels
    }

    fn find_meal_period(&mut self, label: &str) -> Option<ElementHandle> {
        self.meal_period_elements().into_iter().find(|el| clean_label(&el.text) == label)
    }

    /// Back to the meal-period list: history first, then a full re-entry from the root.
    fn return_to_periods(&mut self, restaurant: &str, label: &str) -> Result<Option<ElementHandle>, ScrapeError> {
        match self.browser.back(self.cfg.timeouts.navigation()) {
            Ok(()) => {
                self.settle();
                if let Some(el) = self.find_meal_period(label) {
                    return Ok(Some(el));
                }
                logd!("{}: meal periods not visible after going back; re-entering", restaurant);
            }
            Err(e) => logw!("{}: back navigation failed ({}); re-entering from the root", restaurant, e),
        }

        self.enter_restaurant(restaurant).map_err(|e| ScrapeError::NavigationLost {
            restaurant: s!(restaurant),
            source: match e {
                ScrapeError::Browser(b) | ScrapeError::RestaurantActivation { source: b, .. } => b,
                other => BrowserError::NotFound(other.to_string()),
            },
        })?;
        Ok(self.find_meal_period(label))
    }

    /* ---------------- menu walking ---------------- */

    /// Default view, then every menu tab. Section headers don't carry across views.
    fn walk_views(&mut self, ctx: &mut MenuContext, summary: &mut RestaurantSummary) {
        let cfg = self.cfg;
        ctx.reset_sections();
        self.walk_rows(ctx, summary);

        let tab_sel = &cfg.selectors.menu_tabs;
        let tabs = self.browser.query(tab_sel).map(|t| t.len()).unwrap_or(0);
        for i in 0..tabs {
            // handles go stale after every tab switch, so look the tab up again
            let Some(tab) = self.browser.query(tab_sel).ok().and_then(|t| t.into_iter().nth(i)) else {
                logd!("menu tab {} no longer present", i);
                break;
            };
            let label = clean_label(&tab.text);
            let t = cfg.timeouts.element();
            if let Err(e) = strategy::activate(&mut *self.browser, &tab, TAB_ORDER, &cfg.selectors.nav_function, t) {
                logw!("{}: cannot open menu tab `{}`: {}", ctx.restaurant, label, e);
                summary.errors.push(ItemError::new(Stage::Tab, label, e));
                continue;
            }
            self.settle();
            logd!("{}: menu tab `{}`", ctx.restaurant, label);
            ctx.reset_sections();
            self.walk_rows(ctx, summary);
        }
    }

    fn walk_rows(&mut self, ctx: &mut MenuContext, summary: &mut RestaurantSummary) {
        let cfg = self.cfg;
        let script = &cfg.selectors.expand_rows_script;
        if !script.trim().is_empty() {
            if let Err(e) = self.browser.evaluate(script) {
                logd!("expand rows script failed: {}", e);
            }
        }

        let rows = match self.browser.query(&cfg.selectors.item_rows) {
            Ok(rows) => rows,
            Err(e) => {
                logw!("{}/{}: cannot read item rows: {}", ctx.restaurant, ctx.meal_period, e);
                summary.errors.push(ItemError::new(Stage::Rows, ctx.meal_period.as_str(), e));
                return;
            }
        };

        for row in rows {
            if let Some(label) = section_label(&row, &cfg.selectors.section_row_class) {
                ctx.push_section(&label, &self.resolver);
                continue;
            }
            let links = match self.browser.query_within(&row, &cfg.selectors.item_links) {
                Ok(links) => links,
                Err(e) => {
                    logw!("{}: unreadable item row: {}", ctx.restaurant, e);
                    summary.errors.push(ItemError::new(Stage::Links, row.text.as_str(), e));
                    continue;
                }
            };
            for link in links.into_iter().filter_map(item_link) {
                match self.capture_item(ctx, &link) {
                    ItemOutcome::New { placeholder, has_nutrition } => {
                        summary.items_found += 1;
                        summary.placeholders += usize::from(placeholder);
                        summary.items_with_nutrition += usize::from(has_nutrition);
                    }
                    ItemOutcome::Duplicate => summary.duplicates += 1,
                    ItemOutcome::SectionUpgraded { .. } => summary.section_upgrades += 1,
                    ItemOutcome::Rejected(_) => {
                        summary.items_found += 1;
                        summary.rejected += 1;
                    }
                    ItemOutcome::PlaceholderFilled { has_nutrition } => {
                        summary.placeholders = summary.placeholders.saturating_sub(1);
                        summary.items_with_nutrition += usize::from(has_nutrition);
                    }
                    ItemOutcome::PlaceholderRejected(_) => {
                        summary.placeholders = summary.placeholders.saturating_sub(1);
                        summary.rejected += 1;
                    }
                }
            }
        }
    }

    /// Open → parse → validate → dedup for one item link. Never fails: an item that
    /// can't be opened is recorded with zero nutrients, and reopened on its next
    /// sighting. Rejected items are never reopened.
    pub fn capture_item(&mut self, ctx: &MenuContext, link: &ItemLink) -> ItemOutcome {
        let identity = ItemIdentity::for_item(link.item_id, &link.name, &ctx.restaurant, &ctx.meal_period, &ctx.section);
        let retry = self.dedup.is_placeholder(&identity);
        if self.dedup.contains(&identity) && !retry {
            return self.sighting(&identity, &ctx.section);
        }

        strategy::dismiss_modals(&mut *self.browser, self.cfg);
        let (fragment, placeholder) = match strategy::open_item(&mut *self.browser, self.cfg, link) {
            Some((fragment, _)) => (fragment, false),
            None if retry => {
                logd!("{}: still cannot be opened", link.name);
                return self.sighting(&identity, &ctx.section);
            }
            None => {
                logw!("{}: every open strategy failed, storing a placeholder", link.name);
                (RawNutritionFragment::empty(), true)
            }
        };

        let parsed = self.parser.parse(&fragment);
        if !placeholder && parsed.fields_recovered == 0 {
            logw!("{}: panel opened but no nutrition fields were readable", link.name);
        }

        if let Verdict::Reject(why) = self.validator.check(&parsed.nutrients, &link.name, &ctx.section) {
            let reasons: Vec<String> = why.iter().map(ToString::to_string).collect();
            logw!("{}: rejected ({})", link.name, reasons.join("; "));
            self.dedup.reject(identity);
            return if retry { ItemOutcome::PlaceholderRejected(why) } else { ItemOutcome::Rejected(why) };
        }

        if retry {
            let has_nutrition = parsed.nutrients.calories > 0.0;
            self.dedup.fill(&identity, parsed.nutrients, parsed.fields_recovered, &ctx.section, &self.resolver);
            logf!("{}: placeholder replaced ({} fields)", link.name, parsed.fields_recovered);
            return ItemOutcome::PlaceholderFilled { has_nutrition };
        }

        let record = NutrientRecord {
            name: link.name.clone(),
            restaurant: ctx.restaurant.clone(),
            meal_period: ctx.meal_period.clone(),
            section: ctx.section.clone(),
            item_id: link.item_id,
            nutrients: parsed.nutrients,
            fields_recovered: parsed.fields_recovered,
        };
        let has_nutrition = record.has_nutrition();
        let outcome = if placeholder {
            self.dedup.observe_placeholder(identity, record, &self.resolver)
        } else {
            self.dedup.observe(identity, record, &self.resolver)
        };
        match outcome {
            DedupOutcome::New => ItemOutcome::New { placeholder, has_nutrition },
            DedupOutcome::SectionUpgraded { from, to } => ItemOutcome::SectionUpgraded { from, to },
            DedupOutcome::DuplicateIgnored | DedupOutcome::PlaceholderFilled => ItemOutcome::Duplicate,
        }
    }

    /// A known item seen again: at most a section move.
    fn sighting(&mut self, identity: &ItemIdentity, section: &str) -> ItemOutcome {
        match self.dedup.observe_section(identity, section, &self.resolver) {
            DedupOutcome::SectionUpgraded { from, to } => ItemOutcome::SectionUpgraded { from, to },
            _ => ItemOutcome::Duplicate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::MockBrowser;
    use crate::data::Nutrients;

    fn link(name: &str, id: Option<u64>) -> ItemLink {
        ItemLink { handle: ElementHandle { id: s!("1:x"), text: s!(name), ..ElementHandle::default() }, name: s!(name), item_id: id }
    }

    fn ctx(section: &str) -> MenuContext {
        let mut c = MenuContext::new("The Skillet", "General");
        c.enter_meal_period("Lunch");
        c.section = s!(section);
        c
    }

    fn quiet_browser() -> MockBrowser {
        let mut b = MockBrowser::new();
        b.expect_query().returning(|_| Ok(Vec::new()));
        b
    }

    #[test]
    fn exhausted_cascade_records_a_placeholder() {
        let cfg = ScrapeConfig { strategies: vec![strategy::OpenStrategy::Click], ..ScrapeConfig::default() };
        let mut b = quiet_browser();
        b.expect_click().returning(|_, _, _| Err(BrowserError::Interaction(s!("detached"))));

        let mut c = Controller::new(&mut b, &cfg);
        let out = c.capture_item(&ctx("Entrees"), &link("Ghost Item", None));
        assert_eq!(out, ItemOutcome::New { placeholder: true, has_nutrition: false });

        let rec = &c.records()[0];
        assert_eq!(rec.fields_recovered, 0);
        assert_eq!(rec.nutrients, Nutrients::default());
    }

    #[test]
    fn known_items_are_not_reopened() {
        let cfg = ScrapeConfig::default();
        let mut b = quiet_browser();
        b.expect_fetch()
            .times(1)
            .returning(|_, _| Ok(s!("<p>Calories 250</p><p>Total Fat 5g</p><p>Total Carbohydrate 2g</p><p>Protein 30g</p>")));

        let mut c = Controller::new(&mut b, &cfg);
        let chicken = link("Chicken Breast", Some(101));
        assert_eq!(c.capture_item(&ctx("Entrees"), &chicken), ItemOutcome::New { placeholder: false, has_nutrition: true });
        // second sighting: no fetch, lower priority section is ignored
        assert_eq!(c.capture_item(&ctx("General"), &chicken), ItemOutcome::Duplicate);
        assert_eq!(c.records()[0].section, "Entrees");
    }

    #[test]
    fn rejected_items_are_not_stored() {
        let cfg = ScrapeConfig::default();
        let mut b = quiet_browser();
        b.expect_fetch()
            .returning(|_, _| Ok(s!("<p>Calories 900</p><p>Total Fat 40g</p><p>Total Carbohydrate 60g</p><p>Protein 80g</p>")));

        let mut c = Controller::new(&mut b, &cfg);
        let out = c.capture_item(&ctx("Desserts"), &link("Chocolate Cake", Some(303)));
        assert!(matches!(out, ItemOutcome::Rejected(ref why) if matches!(why[0], Rejection::DessertProtein { .. })));
        assert!(c.records().is_empty());
    }

    #[test]
    fn rejection_is_final_across_sightings() {
        let cfg = ScrapeConfig::default();
        let mut b = quiet_browser();
        b.expect_fetch()
            .times(1)
            .returning(|_, _| Ok(s!("<p>Calories 900</p><p>Total Fat 40g</p><p>Total Carbohydrate 60g</p><p>Protein 80g</p>")));

        let mut c = Controller::new(&mut b, &cfg);
        let cake = link("Chocolate Cake", Some(303));
        assert!(matches!(c.capture_item(&ctx("Desserts"), &cake), ItemOutcome::Rejected(_)));
        assert_eq!(c.capture_item(&ctx("General"), &cake), ItemOutcome::Duplicate);
        assert!(c.records().is_empty());
    }

    #[test]
    fn placeholder_is_reopened_on_next_sighting() {
        let cfg = ScrapeConfig { strategies: vec![strategy::OpenStrategy::Click], ..ScrapeConfig::default() };
        let mut b = quiet_browser();
        b.expect_click()
            .withf(|el, _, _| el.id == "1:broken")
            .returning(|_, _, _| Err(BrowserError::Interaction(s!("detached"))));
        b.expect_click()
            .withf(|el, _, _| el.id == "1:ok")
            .times(1)
            .returning(|_, _, _| Ok(()));
        b.expect_wait_for_selector().times(1).returning(|_, _| Ok(ElementHandle::default()));
        b.expect_inner_html()
            .times(1)
            .returning(|_| Ok(s!("<p>Calories 120</p><p>Total Fat 4g</p><p>Total Carbohydrate 15g</p><p>Protein 6g</p>")));

        let mut broken = link("Soup", Some(9));
        broken.handle.id = s!("1:broken");
        let mut ok = link("Soup", Some(9));
        ok.handle.id = s!("1:ok");

        let mut c = Controller::new(&mut b, &cfg);
        assert_eq!(c.capture_item(&ctx("Entrees"), &broken), ItemOutcome::New { placeholder: true, has_nutrition: false });
        assert_eq!(c.capture_item(&ctx("Entrees Two"), &ok), ItemOutcome::PlaceholderFilled { has_nutrition: true });
        // filled: no more opening
        assert_eq!(c.capture_item(&ctx("Entrees"), &broken), ItemOutcome::Duplicate);

        assert_eq!(c.records().len(), 1);
        let soup = &c.records()[0];
        assert_eq!(soup.nutrients.calories, 120.0);
        assert_eq!(soup.fields_recovered, 4);
        assert_eq!(soup.section, "Entrees");
    }

    #[test]
    fn still_unopenable_placeholder_stays_a_duplicate() {
        let cfg = ScrapeConfig { strategies: vec![strategy::OpenStrategy::Click], ..ScrapeConfig::default() };
        let mut b = quiet_browser();
        b.expect_click().times(2).returning(|_, _, _| Err(BrowserError::Interaction(s!("detached"))));

        let mut c = Controller::new(&mut b, &cfg);
        let ghost = link("Ghost Item", Some(77));
        assert_eq!(c.capture_item(&ctx("General"), &ghost), ItemOutcome::New { placeholder: true, has_nutrition: false });
        assert_eq!(c.capture_item(&ctx("General"), &ghost), ItemOutcome::Duplicate);
        assert_eq!(c.records().len(), 1);
    }

    #[test]
    fn same_id_is_new_at_another_restaurant() {
        let cfg = ScrapeConfig::default();
        let mut b = quiet_browser();
        b.expect_fetch()
            .times(2)
            .returning(|_, _| Ok(s!("<p>Calories 250</p><p>Total Fat 5g</p><p>Total Carbohydrate 2g</p><p>Protein 30g</p>")));

        let mut c = Controller::new(&mut b, &cfg);
        let chicken = link("Chicken Breast", Some(101));
        let mut elsewhere = MenuContext::new("Grab & Go", "General");
        elsewhere.enter_meal_period("All Day");

        assert_eq!(c.capture_item(&ctx("Entrees"), &chicken), ItemOutcome::New { placeholder: false, has_nutrition: true });
        assert_eq!(c.capture_item(&elsewhere, &chicken), ItemOutcome::New { placeholder: false, has_nutrition: true });
        let places: Vec<_> = c.records().iter().map(|r| r.restaurant.as_str()).collect();
        assert_eq!(places, vec!["The Skillet", "Grab & Go"]);
    }

    #[test]
    fn missing_restaurant_is_structural() {
        let cfg = ScrapeConfig::default();
        let mut b = quiet_browser();
        b.expect_navigate().returning(|_, _| Ok(()));
        b.expect_wait_for_network_idle().returning(|_| Ok(()));
        b.expect_wait_for_selector()
            .returning(|sel, t| Err(BrowserError::Timeout { what: s!(sel), after: t }));

        let mut c = Controller::new(&mut b, &cfg);
        let err = c.scrape_restaurant("Nowhere Cafe").unwrap_err();
        assert!(matches!(err, ScrapeError::RestaurantNotFound(ref n) if n == "Nowhere Cafe"));
    }
}
