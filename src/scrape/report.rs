// src/scrape/report.rs
use crate::error::{ItemError, ScrapeError};

/// Counts for one restaurant. Duplicate observations are not "found" items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestaurantSummary {
    pub name: String,
    pub items_found: usize,
    pub items_with_nutrition: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub section_upgrades: usize,
    /// Recorded with zero nutrients after every open strategy failed.
    pub placeholders: usize,
    pub meal_periods: usize,
    /// No meal periods were found; the menu was read as one flat period.
    pub flat_fallback: bool,
    pub errors: Vec<ItemError>,
}

impl RestaurantSummary {
    pub fn new(name: &str) -> Self {
        Self { name: s!(name), ..Self::default() }
    }
}

#[derive(Debug)]
pub enum RestaurantReport {
    Done(RestaurantSummary),
    Failed { name: String, error: ScrapeError },
}

impl RestaurantReport {
    pub fn name(&self) -> &str {
        match self {
            RestaurantReport::Done(s) => &s.name,
            RestaurantReport::Failed { name, .. } => name,
        }
    }

    pub fn summary(&self) -> Option<&RestaurantSummary> {
        match self {
            RestaurantReport::Done(s) => Some(s),
            RestaurantReport::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub restaurants: Vec<RestaurantReport>,
}

impl RunReport {
    fn total(&self, f: impl Fn(&RestaurantSummary) -> usize) -> usize {
        self.restaurants.iter().filter_map(RestaurantReport::summary).map(f).sum()
    }

    pub fn items_found(&self) -> usize { self.total(|s| s.items_found) }
    pub fn items_with_nutrition(&self) -> usize { self.total(|s| s.items_with_nutrition) }
    pub fn rejected(&self) -> usize { self.total(|s| s.rejected) }
    pub fn duplicates(&self) -> usize { self.total(|s| s.duplicates) }
    pub fn section_upgrades(&self) -> usize { self.total(|s| s.section_upgrades) }
    pub fn placeholders(&self) -> usize { self.total(|s| s.placeholders) }
    pub fn item_errors(&self) -> usize { self.total(|s| s.errors.len()) }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &ScrapeError)> {
        self.restaurants.iter().filter_map(|r| match r {
            RestaurantReport::Failed { name, error } => Some((name.as_str(), error)),
            RestaurantReport::Done(_) => None,
        })
    }

    pub fn get(&self, name: &str) -> Option<&RestaurantReport> {
        self.restaurants.iter().find(|r| r.name() == name)
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Summary: {}/{} items had nutrition data, {} rejected",
            self.items_with_nutrition(),
            self.items_found(),
            self.rejected()
        )
    }
}
