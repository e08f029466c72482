// src/section.rs
//! Section priorities.
//!
//! The same dish often shows up under several headings ("Entrees", "General",
//! "Sides"). Each label gets a priority: the best configured substring rule that
//! matches its normalized form, or, for unknown labels, its length capped at the
//! fallback cap. A stored section only moves when a new label beats it by more
//! than the upgrade margin.

use crate::config::SectionPriorities;
use crate::core::sanitize::normalize_key;
use crate::specs::menu::clean_label;

#[derive(Clone, Debug)]
pub struct SectionResolver {
    rules: Vec<(String, i32)>,
    fallback_cap: i32,
    upgrade_margin: i32,
}

impl SectionResolver {
    pub fn new(cfg: &SectionPriorities) -> Self {
        Self {
            rules: cfg
                .rules
                .iter()
                .map(|r| (normalize_key(&r.pattern), r.priority))
                .filter(|(p, _)| !p.is_empty())
                .collect(),
            fallback_cap: cfg.fallback_cap,
            upgrade_margin: cfg.upgrade_margin,
        }
    }

    pub fn priority(&self, label: &str) -> i32 {
        let key = normalize_key(label);
        if key.is_empty() { return 0; }

        // "add-ons" and "addons" must both hit the same rule
        let squashed: String = key.chars().filter(|c| *c != ' ').collect();
        let best = self
            .rules
            .iter()
            .filter(|(pattern, _)| {
                key.contains(pattern.as_str()) || squashed.contains(&pattern.replace(' ', ""))
            })
            .map(|(_, p)| *p)
            .max();

        best.unwrap_or_else(|| (key.chars().count() as i32).min(self.fallback_cap))
    }

    /// True when `candidate` should replace the `stored` section.
    pub fn should_replace(&self, stored: &str, candidate: &str) -> bool {
        self.priority(candidate) > self.priority(stored) + self.upgrade_margin
    }

    /// Most recent non-blank label, cleaned.
    pub fn current_section(&self, seen: &[String]) -> Option<String> {
        seen.iter().rev().map(|l| clean_label(l)).find(|l| !l.is_empty())
    }
}

impl Default for SectionResolver {
    fn default() -> Self { Self::new(&SectionPriorities::default()) }
}
