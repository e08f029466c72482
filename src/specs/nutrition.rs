// src/specs/nutrition.rs
//
// Nutrition panel → Nutrients.
//
// Fields are read off the panel's visible text with label-then-number proximity
// rules: a label variant, a short gap with no letters in it, a number, then the
// field's unit. Variants are tried in order and the first hit wins; each field is
// independent of the others. Calories first try the dedicated big-number element
// and only then fall back to the same label scan.

use crate::core::{html, visible_text};
use crate::data::{Nutrient, Nutrients, Unit};

/// Longest run of non-letter characters allowed between a label and its number.
const MAX_GAP: usize = 12;

/// Text/markup captured from one item's nutrition panel. Empty when every
/// interaction strategy failed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawNutritionFragment {
    pub html: String,
}

impl RawNutritionFragment {
    pub fn new(html: impl Into<String>) -> Self { Self { html: html.into() } }
    pub fn empty() -> Self { Self::default() }
    pub fn is_empty(&self) -> bool { self.html.trim().is_empty() }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedNutrition {
    pub nutrients: Nutrients,
    /// Fields with a matching rule (a recovered 0 still counts).
    pub fields_recovered: u8,
}

struct LabelRule {
    nutrient: Nutrient,
    labels: &'static [&'static str],
}

const RULES: &[LabelRule] = &[
    LabelRule { nutrient: Nutrient::Calories, labels: &["Calories", "Energy"] },
    LabelRule { nutrient: Nutrient::TotalFat, labels: &["Total Fat", "Fat, total"] },
    LabelRule { nutrient: Nutrient::SaturatedFat, labels: &["Saturated Fat", "Sat. Fat", "Sat Fat"] },
    LabelRule { nutrient: Nutrient::TransFat, labels: &["Trans Fat", "Trans. Fat", "Trans Fatty Acid"] },
    LabelRule { nutrient: Nutrient::Cholesterol, labels: &["Cholesterol", "Chol."] },
    LabelRule { nutrient: Nutrient::Sodium, labels: &["Sodium"] },
    LabelRule {
        nutrient: Nutrient::TotalCarbs,
        labels: &["Total Carbohydrates", "Total Carbohydrate", "Total Carbs", "Total Carb.", "Carbohydrates"],
    },
    LabelRule { nutrient: Nutrient::DietaryFiber, labels: &["Dietary Fiber", "Fiber"] },
    LabelRule { nutrient: Nutrient::TotalSugars, labels: &["Total Sugars", "Sugars"] },
    LabelRule { nutrient: Nutrient::AddedSugars, labels: &["Added Sugars", "Includes", "Incl."] },
    LabelRule { nutrient: Nutrient::Protein, labels: &["Protein"] },
    LabelRule { nutrient: Nutrient::Calcium, labels: &["Calcium", "Calc."] },
    LabelRule { nutrient: Nutrient::Iron, labels: &["Iron"] },
    LabelRule { nutrient: Nutrient::Potassium, labels: &["Potassium", "Potas."] },
];

#[derive(Clone, Debug)]
pub struct NutritionParser {
    calorie_classes: Vec<String>,
}

impl Default for NutritionParser {
    fn default() -> Self {
        Self::new(crate::config::consts::CALORIE_CLASSES.iter().map(|c| s!(*c)).collect())
    }
}

impl NutritionParser {
    pub fn new(calorie_classes: Vec<String>) -> Self { Self { calorie_classes } }

    /// Never fails: anything that can't be read stays 0 and is left out of
    /// `fields_recovered`.
    pub fn parse(&self, fragment: &RawNutritionFragment) -> ParsedNutrition {
        let mut out = ParsedNutrition::default();
        if fragment.is_empty() { return out; }

        let text = visible_text(&fragment.html);
        let lc = html::to_lower(&text);

        for rule in RULES {
            let found = match rule.nutrient {
                Nutrient::Calories => self.calories_from_locator(&fragment.html)
                    .or_else(|| scan_rule(&text, &lc, rule)),
                _ => scan_rule(&text, &lc, rule),
            };
            if let Some(v) = found {
                out.nutrients.set(rule.nutrient, v);
                out.fields_recovered += 1;
            }
        }
        logd!("parsed nutrition panel: {}/14 fields", out.fields_recovered);
        out
    }

    fn calories_from_locator(&self, fragment_html: &str) -> Option<f64> {
        let inner = html::inner_of_first_with_classes(fragment_html, &self.calorie_classes)?;
        let text = visible_text(&inner);
        let start = text.find(|c: char| c.is_ascii_digit())?;
        read_number(&text[start..]).map(|(v, _)| v)
    }
}

fn scan_rule(text: &str, lc: &str, rule: &LabelRule) -> Option<f64> {
    let unit = rule.nutrient.unit();
    rule.labels.iter().find_map(|label| scan_label(text, lc, label, unit))
}

/// First occurrence of `label` (whole word, case-insensitive) followed by a number
/// carrying `unit`. Later occurrences are tried when an earlier one doesn't fit.
fn scan_label(text: &str, lc: &str, label: &str, unit: Unit) -> Option<f64> {
    let needle = html::to_lower(label);
    let mut from = 0usize;

    while let Some(rel) = lc[from..].find(&needle) {
        let at = from + rel;
        let after = at + needle.len();
        from = after;

        let boundary_before = lc[..at].chars().next_back().is_none_or(|c| !c.is_alphanumeric());
        let last_is_word = needle.chars().next_back().is_some_and(|c| c.is_alphanumeric());
        let boundary_after = !last_is_word
            || lc[after..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        if !boundary_before || !boundary_after { continue; }

        if let Some(v) = number_after(&text[after..], unit) {
            return Some(v);
        }
    }
    None
}

/// Skip a short letter-free gap, read a number, then require the unit token.
fn number_after(rest: &str, unit: Unit) -> Option<f64> {
    let mut gap = 0usize;
    for (i, ch) in rest.char_indices() {
        if ch.is_ascii_digit() {
            let (value, used) = read_number(&rest[i..])?;
            return unit_follows(&rest[i + used..], unit).then_some(value);
        }
        if ch.is_alphabetic() || gap >= MAX_GAP { return None; }
        gap += 1;
    }
    None
}

fn unit_follows(rest: &str, unit: Unit) -> bool {
    let suffix = unit.suffix();
    let t = rest.trim_start();
    // calories carry no unit token; a percentage is never a calorie count
    if suffix.is_empty() { return !t.starts_with('%'); }
    let Some(tail) = t.get(..suffix.len()) else { return false };
    if !tail.eq_ignore_ascii_case(suffix) { return false; }
    t[suffix.len()..].chars().next().is_none_or(|c| !c.is_alphanumeric())
}

/// Digits with optional thousands commas and one decimal point.
/// Returns the value and the number of bytes consumed.
fn read_number(s: &str) -> Option<(f64, usize)> {
    let b = s.as_bytes();
    let mut digits = String::new();
    let mut i = 0usize;
    let mut seen_dot = false;
    while i < b.len() {
        match b[i] {
            d @ b'0'..=b'9' => { digits.push(d as char); i += 1; }
            b',' if i + 1 < b.len() && b[i + 1].is_ascii_digit() && !seen_dot && !digits.is_empty() => i += 1,
            b'.' if !seen_dot && i + 1 < b.len() && b[i + 1].is_ascii_digit() && !digits.is_empty() => {
                seen_dot = true;
                digits.push('.');
                i += 1;
            }
            _ => break,
        }
    }
    if digits.is_empty() { return None; }
    digits.parse::<f64>().ok().map(|v| (v, i))
}
