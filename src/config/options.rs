// src/config/options.rs
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::consts::*;
use crate::error::ConfigError;
use crate::scrape::OpenStrategy;

/// Everything a run needs to know about the target site and its data.
/// Loaded once at startup; read-only for the rest of the run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub restaurants: Vec<String>,
    /// URL template with an `{item_id}` placeholder. `None` disables the API strategy.
    pub nutrition_endpoint: Option<String>,
    pub all_day_label: String,
    /// Section used for items that appear before any section heading.
    pub default_section: String,
    pub timeouts: Timeouts,
    pub selectors: Selectors,
    /// Item-open cascade, tried in order.
    pub strategies: Vec<OpenStrategy>,
    pub section_priorities: SectionPriorities,
    pub validation: ValidationLimits,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: s!(BASE_URL),
            restaurants: Vec::new(),
            nutrition_endpoint: Some(s!(NUTRITION_ENDPOINT)),
            all_day_label: s!(ALL_DAY_LABEL),
            default_section: s!(DEFAULT_SECTION),
            timeouts: Timeouts::default(),
            selectors: Selectors::default(),
            strategies: OpenStrategy::DEFAULT_ORDER.to_vec(),
            section_priorities: SectionPriorities::default(),
            validation: ValidationLimits::default(),
        }
    }
}

impl ScrapeConfig {
    /// Load from `path`, or from `menu_scrape.json` in the working directory when
    /// present, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let cfg = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(CONFIG_FILE).is_file() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_json(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategies.is_empty() {
            return Err(ConfigError::Invalid(s!("strategies must list at least one item-open strategy")));
        }
        if self.section_priorities.upgrade_margin < 0 {
            return Err(ConfigError::Invalid(s!("section_priorities.upgrade_margin must be >= 0")));
        }
        let v = &self.validation;
        if !(v.calorie_ratio_min > 0.0 && v.calorie_ratio_min < v.calorie_ratio_max) {
            return Err(ConfigError::Invalid(format!(
                "calorie ratio band [{}, {}] is empty",
                v.calorie_ratio_min, v.calorie_ratio_max
            )));
        }
        if self.selectors.item_rows.trim().is_empty() || self.selectors.item_links.trim().is_empty() {
            return Err(ConfigError::Invalid(s!("item_rows and item_links selectors are required")));
        }
        Ok(())
    }

    /// Selector locating the landing-page link for `restaurant`.
    pub fn restaurant_selector(&self, restaurant: &str) -> String {
        self.selectors.restaurant.replace("{name}", restaurant)
    }

    /// Direct nutrition URL for `item_id`, if an endpoint is configured.
    pub fn nutrition_url(&self, item_id: u64) -> Option<String> {
        self.nutrition_endpoint
            .as_deref()
            .map(|tmpl| tmpl.replace("{item_id}", &item_id.to_string()))
    }
}

/* ---------------- Timeouts ---------------- */

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub navigation_ms: u64,
    pub network_idle_ms: u64,
    pub element_ms: u64,
    pub panel_ms: u64,
    pub close_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation_ms: NAVIGATION_MS,
            network_idle_ms: NETWORK_IDLE_MS,
            element_ms: ELEMENT_MS,
            panel_ms: PANEL_MS,
            close_ms: CLOSE_MS,
        }
    }
}

impl Timeouts {
    pub fn navigation(&self) -> Duration { Duration::from_millis(self.navigation_ms) }
    pub fn network_idle(&self) -> Duration { Duration::from_millis(self.network_idle_ms) }
    pub fn element(&self) -> Duration { Duration::from_millis(self.element_ms) }
    pub fn panel(&self) -> Duration { Duration::from_millis(self.panel_ms) }
    pub fn close(&self) -> Duration { Duration::from_millis(self.close_ms) }
}

/* ---------------- Selectors ---------------- */

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// `{name}` is replaced by the restaurant name.
    pub restaurant: String,
    /// Page function used to activate restaurants and meal periods.
    pub nav_function: String,
    /// Page function that opens an item's nutrition panel.
    pub item_function: String,
    /// Tried in order; the first one that matches anything wins.
    pub meal_periods: Vec<String>,
    pub menu_tabs: String,
    /// Evaluated before rows are read. Empty disables it.
    pub expand_rows_script: String,
    pub item_rows: String,
    pub section_row_class: String,
    pub item_links: String,
    pub nutrition_panel: String,
    pub panel_close: String,
    pub modal_close: Vec<String>,
    pub calorie_classes: Vec<String>,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            restaurant: s!(RESTAURANT_SELECTOR),
            nav_function: s!(NAV_FUNCTION),
            item_function: s!(ITEM_FUNCTION),
            meal_periods: MEAL_PERIOD_SELECTORS.iter().map(|s| s!(*s)).collect(),
            menu_tabs: s!(MENU_TAB_SELECTOR),
            expand_rows_script: s!(EXPAND_ROWS_SCRIPT),
            item_rows: s!(ITEM_ROW_SELECTOR),
            section_row_class: s!(SECTION_ROW_CLASS),
            item_links: s!(ITEM_LINK_SELECTOR),
            nutrition_panel: s!(NUTRITION_PANEL),
            panel_close: s!(PANEL_CLOSE),
            modal_close: MODAL_CLOSE_SELECTORS.iter().map(|s| s!(*s)).collect(),
            calorie_classes: CALORIE_CLASSES.iter().map(|s| s!(*s)).collect(),
        }
    }
}

/* ---------------- Section priorities ---------------- */

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRule {
    pub pattern: String,
    pub priority: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionPriorities {
    pub rules: Vec<PriorityRule>,
    /// Upper bound for the length-based priority of unmatched labels.
    pub fallback_cap: i32,
    /// A new section must beat the stored one by more than this to replace it.
    pub upgrade_margin: i32,
}

impl Default for SectionPriorities {
    fn default() -> Self {
        Self {
            rules: SECTION_PRIORITIES
                .iter()
                .map(|(pattern, priority)| PriorityRule { pattern: s!(*pattern), priority: *priority })
                .collect(),
            fallback_cap: SECTION_FALLBACK_CAP,
            upgrade_margin: SECTION_UPGRADE_MARGIN,
        }
    }
}

/* ---------------- Validation limits ---------------- */

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassLimits {
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbs_g: f64,
    pub sodium_mg: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    pub single: ClassLimits,
    pub composite: ClassLimits,
    pub calorie_ratio_min: f64,
    pub calorie_ratio_max: f64,
    pub dessert_protein_max_g: f64,
    pub composite_keywords: Vec<String>,
    pub composite_section_keywords: Vec<String>,
    pub dessert_keywords: Vec<String>,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            single: ClassLimits { protein_g: 100.0, fat_g: 90.0, carbs_g: 200.0, sodium_mg: 4000.0 },
            composite: ClassLimits { protein_g: 150.0, fat_g: 120.0, carbs_g: 300.0, sodium_mg: 6000.0 },
            calorie_ratio_min: 0.4,
            calorie_ratio_max: 2.5,
            dessert_protein_max_g: 50.0,
            composite_keywords: COMPOSITE_KEYWORDS.iter().map(|s| s!(*s)).collect(),
            composite_section_keywords: COMPOSITE_SECTION_KEYWORDS.iter().map(|s| s!(*s)).collect(),
            dessert_keywords: DESSERT_KEYWORDS.iter().map(|s| s!(*s)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ScrapeConfig::from_json(
            r#"{ "restaurants": ["The Skillet"], "timeouts": { "panel_ms": 250 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.restaurants, vec![s!("The Skillet")]);
        assert_eq!(cfg.timeouts.panel(), Duration::from_millis(250));
        assert_eq!(cfg.timeouts.element_ms, ELEMENT_MS);
        assert_eq!(cfg.section_priorities.upgrade_margin, SECTION_UPGRADE_MARGIN);
        assert_eq!(cfg.strategies, OpenStrategy::DEFAULT_ORDER.to_vec());
        cfg.validate().unwrap();
    }

    #[test]
    fn strategies_parse_snake_case() {
        let cfg = ScrapeConfig::from_json(r#"{ "strategies": ["forced_click", "api_fetch"] }"#).unwrap();
        assert_eq!(cfg.strategies, vec![OpenStrategy::ForcedClick, OpenStrategy::ApiFetch]);
    }

    #[test]
    fn rejects_empty_strategy_list_and_bad_band() {
        let mut cfg = ScrapeConfig::default();
        cfg.strategies.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let mut cfg = ScrapeConfig::default();
        cfg.validation.calorie_ratio_min = 3.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn templates_expand() {
        let cfg = ScrapeConfig::default();
        assert_eq!(cfg.restaurant_selector("The Skillet"), "a[title='The Skillet'][data-type='UN']");
        assert!(cfg.nutrition_url(42).unwrap().contains("itemID=42&"));

        let cfg = ScrapeConfig { nutrition_endpoint: None, ..ScrapeConfig::default() };
        assert_eq!(cfg.nutrition_url(42), None);
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = ScrapeConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"));
    }
}
