// src/config/consts.rs

// Site defaults (NetNutrition-style menu)
pub const BASE_URL: &str = "https://netnutrition.cbord.com/nn-prod/Duke";
pub const NUTRITION_ENDPOINT: &str =
    "https://netnutrition.cbord.com/nn-prod/Duke/Nutrition/GetItemNutrition?itemID={item_id}&type=html";
pub const ALL_DAY_LABEL: &str = "All Day";
pub const DEFAULT_SECTION: &str = "General";

// Selectors
pub const RESTAURANT_SELECTOR: &str = "a[title='{name}'][data-type='UN']";
pub const NAV_FUNCTION: &str = "NetNutrition.UI.handleNavBarSelection";
pub const ITEM_FUNCTION: &str = "NetNutrition.UI.getItemNutritionLabel";
pub const MEAL_PERIOD_SELECTORS: &[&str] = &[
    "a[href*='menuid']",
    "a:has-text('Breakfast'), a:has-text('All Day'), a:has-text('Specialty'), a:has-text('Lunch'), a:has-text('Dinner')",
];
pub const MENU_TAB_SELECTOR: &str = "a.cbo_nn_menuLink";
pub const EXPAND_ROWS_SCRIPT: &str =
    "document.querySelectorAll('#itemPanel table tbody tr td div').forEach(btn => btn.click())";
pub const ITEM_ROW_SELECTOR: &str = "#itemPanel table tbody tr";
pub const SECTION_ROW_CLASS: &str = "cbo_nn_itemGroupRow";
pub const ITEM_LINK_SELECTOR: &str = "a.cbo_nn_itemHover";
pub const NUTRITION_PANEL: &str = "#nutritionLabel";
pub const PANEL_CLOSE: &str = "#btn_nn_nutrition_close";
pub const MODAL_CLOSE_SELECTORS: &[&str] = &["#cbo_nn_mobileDisclaimer button.close", "button.close"];
pub const CALORIE_CLASSES: &[&str] = &["inline-div-right", "bold-text", "font-22"];

// Timeouts (ms)
pub const NAVIGATION_MS: u64 = 30_000;
pub const NETWORK_IDLE_MS: u64 = 10_000;
pub const ELEMENT_MS: u64 = 5_000;
pub const PANEL_MS: u64 = 5_000;
pub const CLOSE_MS: u64 = 1_000;

// Section priorities
pub const SECTION_PRIORITIES: &[(&str, i32)] = &[
    ("entrees", 100),
    ("entree", 100),
    ("mains", 100),
    ("main", 100),
    ("sides", 75),
    ("side", 75),
    ("toppings", 40),
    ("add-ons", 40),
    ("addons", 40),
    ("extras", 40),
    ("general", 10),
];
pub const SECTION_FALLBACK_CAP: i32 = 50;
pub const SECTION_UPGRADE_MARGIN: i32 = 10;

// Validation keywords
pub const COMPOSITE_KEYWORDS: &[&str] = &[
    "combo", "platter", "plate", "meal", "bundle", "with", "family style", "feast",
];
pub const COMPOSITE_SECTION_KEYWORDS: &[&str] = &["combo", "platter", "meal", "value meal"];
pub const DESSERT_KEYWORDS: &[&str] = &[
    "cookie", "cake", "pie", "brownie", "cupcake", "muffin", "donut", "doughnut", "pastry",
    "ice cream", "pudding", "tart", "cheesecake", "gelato", "sundae", "cobbler", "churro",
];

// Local files
pub const CONFIG_FILE: &str = "menu_scrape.json";
pub const DEBUG_LOG_FILE: &str = ".store/debug.log";
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DEFAULT_FILE: &str = "items";
