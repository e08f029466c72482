// src/dedup.rs
//! Item deduplication.
//!
//! Items are identified by the site's numeric id (scoped to the restaurant) when
//! one is known, else by the composite of (normalized name, restaurant, meal
//! period, section). The composite fallback can merge distinct dishes sharing a
//! name and can keep one dish twice when it appears under two sections; both are
//! accepted.
//!
//! The first successful parse fixes the nutrition values. A placeholder (stored
//! after every open strategy failed) is not a successful parse: it stays open for
//! a later sighting to fill in. A rejection is final. Apart from that, later
//! observations only ever move the stored section, and only when the section
//! resolver says so.

use std::collections::{HashMap, HashSet};

use crate::core::sanitize::normalize_key;
use crate::data::{NutrientRecord, Nutrients};
use crate::section::SectionResolver;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ItemIdentity {
    Stable { restaurant: String, id: u64 },
    Composite { name: String, restaurant: String, meal_period: String, section: String },
}

impl ItemIdentity {
    pub fn for_item(item_id: Option<u64>, name: &str, restaurant: &str, meal_period: &str, section: &str) -> Self {
        match item_id {
            Some(id) => ItemIdentity::Stable { restaurant: s!(restaurant), id },
            None => ItemIdentity::Composite {
                name: normalize_key(name),
                restaurant: s!(restaurant),
                meal_period: s!(meal_period),
                section: s!(section),
            },
        }
    }

    pub fn of(record: &NutrientRecord) -> Self {
        Self::for_item(record.item_id, &record.name, &record.restaurant, &record.meal_period, &record.section)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DedupOutcome {
    New,
    DuplicateIgnored,
    SectionUpgraded { from: String, to: String },
    /// A stored placeholder got real values.
    PlaceholderFilled,
}

#[derive(Debug, Default)]
pub struct Deduplicator {
    records: Vec<NutrientRecord>,
    index: HashMap<ItemIdentity, usize>,
    placeholders: HashSet<ItemIdentity>,
    rejected: HashSet<ItemIdentity>,
}

impl Deduplicator {
    pub fn new() -> Self { Self::default() }

    /// Stored, placeholder or rejected: anything a later sighting must not count as new.
    pub fn contains(&self, identity: &ItemIdentity) -> bool {
        self.index.contains_key(identity) || self.rejected.contains(identity)
    }

    pub fn is_placeholder(&self, identity: &ItemIdentity) -> bool {
        self.placeholders.contains(identity)
    }

    pub fn is_rejected(&self, identity: &ItemIdentity) -> bool {
        self.rejected.contains(identity)
    }

    /// Record a validated observation.
    pub fn observe(&mut self, identity: ItemIdentity, record: NutrientRecord, resolver: &SectionResolver) -> DedupOutcome {
        if self.rejected.contains(&identity) {
            return DedupOutcome::DuplicateIgnored;
        }
        if self.index.contains_key(&identity) {
            return self.observe_section(&identity, &record.section, resolver);
        }
        self.index.insert(identity, self.records.len());
        self.records.push(record);
        DedupOutcome::New
    }

    /// Store a zero-valued record for an item nothing could open. A later
    /// [`fill`](Self::fill) or [`reject`](Self::reject) settles it.
    pub fn observe_placeholder(&mut self, identity: ItemIdentity, record: NutrientRecord, resolver: &SectionResolver) -> DedupOutcome {
        let outcome = self.observe(identity.clone(), record, resolver);
        if outcome == DedupOutcome::New {
            self.placeholders.insert(identity);
        }
        outcome
    }

    /// Replace a placeholder's values with a successful parse seen under `section`.
    /// Anything that isn't a placeholder is left alone.
    pub fn fill(
        &mut self,
        identity: &ItemIdentity,
        nutrients: Nutrients,
        fields_recovered: u8,
        section: &str,
        resolver: &SectionResolver,
    ) -> DedupOutcome {
        if !self.placeholders.remove(identity) {
            return DedupOutcome::DuplicateIgnored;
        }
        let Some(&ix) = self.index.get(identity) else { return DedupOutcome::DuplicateIgnored };
        self.observe_section(identity, section, resolver);
        let stored = &mut self.records[ix];
        stored.nutrients = nutrients;
        stored.fields_recovered = fields_recovered;
        logd!("placeholder for {} filled ({} fields)", stored.name, fields_recovered);
        DedupOutcome::PlaceholderFilled
    }

    /// Mark `identity` as rejected for the rest of the run. A stored placeholder
    /// for it is dropped.
    pub fn reject(&mut self, identity: ItemIdentity) {
        if self.placeholders.remove(&identity) {
            if let Some(ix) = self.index.remove(&identity) {
                self.records.remove(ix);
                for slot in self.index.values_mut() {
                    if *slot > ix { *slot -= 1; }
                }
            }
        }
        self.rejected.insert(identity);
    }

    /// An already-known item seen again under `section`. Unknown identities are ignored.
    pub fn observe_section(&mut self, identity: &ItemIdentity, section: &str, resolver: &SectionResolver) -> DedupOutcome {
        let Some(&ix) = self.index.get(identity) else { return DedupOutcome::DuplicateIgnored };
        let stored = &mut self.records[ix];
        if resolver.should_replace(&stored.section, section) {
            let from = std::mem::replace(&mut stored.section, s!(section));
            logd!("section upgrade for {}: {} -> {}", stored.name, from, section);
            return DedupOutcome::SectionUpgraded { from, to: s!(section) };
        }
        DedupOutcome::DuplicateIgnored
    }

    pub fn len(&self) -> usize { self.records.len() }
    pub fn is_empty(&self) -> bool { self.records.is_empty() }
    pub fn records(&self) -> &[NutrientRecord] { &self.records }
    pub fn into_records(self) -> Vec<NutrientRecord> { self.records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Nutrients;

    fn rec(name: &str, section: &str, id: Option<u64>, cal: f64) -> NutrientRecord {
        NutrientRecord {
            name: s!(name),
            restaurant: s!("The Skillet"),
            meal_period: s!("Lunch"),
            section: s!(section),
            item_id: id,
            nutrients: Nutrients { calories: cal, ..Nutrients::default() },
            fields_recovered: 1,
        }
    }

    #[test]
    fn stable_id_keeps_best_section_and_first_values() {
        let r = SectionResolver::default();
        let mut d = Deduplicator::new();
        let first = rec("Chicken Breast", "Entrees", Some(101), 250.0);
        assert_eq!(d.observe(ItemIdentity::of(&first), first, &r), DedupOutcome::New);

        let again = rec("Chicken Breast", "General", Some(101), 999.0);
        assert_eq!(d.observe(ItemIdentity::of(&again), again, &r), DedupOutcome::DuplicateIgnored);
        assert_eq!(d.records()[0].section, "Entrees");
        assert_eq!(d.records()[0].nutrients.calories, 250.0);
    }

    #[test]
    fn higher_priority_section_upgrades_in_place() {
        let r = SectionResolver::default();
        let mut d = Deduplicator::new();
        let first = rec("Garden Salad", "General", Some(404), 120.0);
        let id = ItemIdentity::of(&first);
        d.observe(id.clone(), first, &r);
        assert_eq!(
            d.observe_section(&id, "Entrees", &r),
            DedupOutcome::SectionUpgraded { from: s!("General"), to: s!("Entrees") }
        );
        assert_eq!(d.len(), 1);
        assert_eq!(d.records()[0].section, "Entrees");
    }

    #[test]
    fn identical_occurrence_is_idempotent() {
        let r = SectionResolver::default();
        let mut d = Deduplicator::new();
        for _ in 0..2 {
            let x = rec("Hash  Browns", "Sides", None, 150.0);
            d.observe(ItemIdentity::of(&x), x, &r);
        }
        assert_eq!(d.len(), 1);
        assert!(d.contains(&ItemIdentity::for_item(None, "hash browns", "The Skillet", "Lunch", "Sides")));
    }

    #[test]
    fn composite_key_keeps_sections_apart() {
        let r = SectionResolver::default();
        let mut d = Deduplicator::new();
        let a = rec("Rice", "Sides", None, 200.0);
        let b = rec("Rice", "Entrees", None, 200.0);
        assert_eq!(d.observe(ItemIdentity::of(&a), a, &r), DedupOutcome::New);
        assert_eq!(d.observe(ItemIdentity::of(&b), b, &r), DedupOutcome::New);
        assert_eq!(d.into_records().len(), 2);
    }

    #[test]
    fn same_id_at_two_restaurants_is_two_items() {
        let r = SectionResolver::default();
        let mut d = Deduplicator::new();
        let a = rec("Chicken Breast", "Entrees", Some(101), 250.0);
        let mut b = a.clone();
        b.restaurant = s!("Grab & Go");
        assert_eq!(d.observe(ItemIdentity::of(&a), a, &r), DedupOutcome::New);
        assert_eq!(d.observe(ItemIdentity::of(&b), b, &r), DedupOutcome::New);
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn placeholder_is_filled_once() {
        let r = SectionResolver::default();
        let mut d = Deduplicator::new();
        let mut soup = rec("Soup", "General", Some(9), 0.0);
        soup.fields_recovered = 0;
        let id = ItemIdentity::of(&soup);
        assert_eq!(d.observe_placeholder(id.clone(), soup, &r), DedupOutcome::New);
        assert!(d.is_placeholder(&id));

        let filled = Nutrients { calories: 120.0, protein: 6.0, ..Nutrients::default() };
        assert_eq!(d.fill(&id, filled, 2, "Entrees", &r), DedupOutcome::PlaceholderFilled);
        assert!(!d.is_placeholder(&id));
        assert_eq!(d.records()[0].nutrients, filled);
        assert_eq!(d.records()[0].fields_recovered, 2);
        assert_eq!(d.records()[0].section, "Entrees");

        // a second fill is a plain duplicate: first successful parse wins
        let other = Nutrients { calories: 999.0, ..Nutrients::default() };
        assert_eq!(d.fill(&id, other, 1, "Entrees", &r), DedupOutcome::DuplicateIgnored);
        assert_eq!(d.records()[0].nutrients.calories, 120.0);
    }

    #[test]
    fn rejection_is_final_and_drops_placeholder() {
        let r = SectionResolver::default();
        let mut d = Deduplicator::new();
        let keep = rec("Rice", "Sides", None, 200.0);
        d.observe(ItemIdentity::of(&keep), keep, &r);
        let mut cake = rec("Chocolate Cake", "Desserts", Some(303), 0.0);
        cake.fields_recovered = 0;
        let id = ItemIdentity::of(&cake);
        d.observe_placeholder(id.clone(), cake.clone(), &r);
        let tail = rec("Soup", "General", Some(9), 90.0);
        let tail_id = ItemIdentity::of(&tail);
        d.observe(tail_id.clone(), tail, &r);

        d.reject(id.clone());
        assert!(d.contains(&id));
        assert!(d.is_rejected(&id));
        assert_eq!(d.len(), 2);
        assert_eq!(d.observe(id, cake, &r), DedupOutcome::DuplicateIgnored);
        assert_eq!(d.len(), 2);
        // indexes after the removed row still point at the right record
        assert_eq!(d.observe_section(&tail_id, "Entrees", &r), DedupOutcome::SectionUpgraded { from: s!("General"), to: s!("Entrees") });
        assert_eq!(d.records()[1].name, "Soup");
        assert_eq!(d.records()[1].section, "Entrees");
    }
}
