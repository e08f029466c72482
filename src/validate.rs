// src/validate.rs
//! Plausibility checks for parsed nutrition.
//!
//! Items are classed as single components or composite meals (combos, platters,
//! "with" sides) from their name and section; composite meals get wider ceilings.
//! A record is rejected when a macro or sodium exceeds its class ceiling, when the
//! stated calories disagree with 4p + 4c + 9f beyond the configured ratio band, or
//! when a dessert claims more protein than any dessert plausibly has. Every failed
//! check is reported, not just the first.

use std::fmt;

use crate::config::{ClassLimits, ValidationLimits};
use crate::core::sanitize::{contains_keyword, normalize_key};
use crate::data::Nutrients;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MealClass { Single, Composite }

#[derive(Clone, Debug, PartialEq)]
pub enum Rejection {
    ProteinCeiling { grams: f64, limit: f64 },
    FatCeiling { grams: f64, limit: f64 },
    CarbsCeiling { grams: f64, limit: f64 },
    SodiumCeiling { mg: f64, limit: f64 },
    CalorieMismatch { calories: f64, expected: f64, ratio: f64 },
    DessertProtein { grams: f64, limit: f64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ProteinCeiling { grams, limit } => write!(f, "protein {grams}g over {limit}g"),
            Rejection::FatCeiling { grams, limit } => write!(f, "fat {grams}g over {limit}g"),
            Rejection::CarbsCeiling { grams, limit } => write!(f, "carbs {grams}g over {limit}g"),
            Rejection::SodiumCeiling { mg, limit } => write!(f, "sodium {mg}mg over {limit}mg"),
            Rejection::CalorieMismatch { calories, expected, ratio } => {
                write!(f, "calories {calories} vs {expected:.0} from macros (ratio {ratio:.2})")
            }
            Rejection::DessertProtein { grams, limit } => write!(f, "dessert with {grams}g protein (max {limit}g)"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    Accept(MealClass),
    Reject(Vec<Rejection>),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool { matches!(self, Verdict::Accept(_)) }
}

#[derive(Clone, Debug)]
pub struct NutritionValidator {
    limits: ValidationLimits,
}

impl NutritionValidator {
    pub fn new(limits: ValidationLimits) -> Self { Self { limits } }

    pub fn classify(&self, name: &str, section: &str) -> MealClass {
        let name = normalize_key(name);
        let section = normalize_key(section);
        let by_name = self.limits.composite_keywords.iter().any(|k| contains_keyword(&name, k));
        let by_section = self.limits.composite_section_keywords.iter().any(|k| contains_keyword(&section, k));
        if by_name || by_section { MealClass::Composite } else { MealClass::Single }
    }

    pub fn is_dessert(&self, name: &str) -> bool {
        let name = normalize_key(name);
        self.limits.dessert_keywords.iter().any(|k| contains_keyword(&name, k))
    }

    pub fn check(&self, n: &Nutrients, name: &str, section: &str) -> Verdict {
        let class = self.classify(name, section);
        let ClassLimits { protein_g, fat_g, carbs_g, sodium_mg } = match class {
            MealClass::Single => self.limits.single,
            MealClass::Composite => self.limits.composite,
        };

        let mut why = Vec::new();
        if self.is_dessert(name) && n.protein > self.limits.dessert_protein_max_g {
            why.push(Rejection::DessertProtein { grams: n.protein, limit: self.limits.dessert_protein_max_g });
        }
        if n.protein > protein_g { why.push(Rejection::ProteinCeiling { grams: n.protein, limit: protein_g }); }
        if n.total_fat > fat_g { why.push(Rejection::FatCeiling { grams: n.total_fat, limit: fat_g }); }
        if n.total_carbs > carbs_g { why.push(Rejection::CarbsCeiling { grams: n.total_carbs, limit: carbs_g }); }
        if n.sodium > sodium_mg { why.push(Rejection::SodiumCeiling { mg: n.sodium, limit: sodium_mg }); }

        let expected = n.estimated_calories();
        if expected > 0.0 {
            let ratio = n.calories / expected;
            if ratio < self.limits.calorie_ratio_min || ratio > self.limits.calorie_ratio_max {
                why.push(Rejection::CalorieMismatch { calories: n.calories, expected, ratio });
            }
        }

        if why.is_empty() { Verdict::Accept(class) } else { Verdict::Reject(why) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v() -> NutritionValidator { NutritionValidator::new(ValidationLimits::default()) }

    fn n(cal: f64, p: f64, f: f64, c: f64) -> Nutrients {
        Nutrients { calories: cal, protein: p, total_fat: f, total_carbs: c, ..Nutrients::default() }
    }

    #[test]
    fn plain_chicken_breast_is_accepted() {
        // 4*30 + 4*2 + 9*5 = 173; 250/173 ≈ 1.45
        assert_eq!(v().check(&n(250.0, 30.0, 5.0, 2.0), "Chicken Breast", "Entrees"), Verdict::Accept(MealClass::Single));
    }

    #[test]
    fn dessert_protein_rule() {
        let verdict = v().check(&n(900.0, 80.0, 40.0, 60.0), "Chocolate Cake", "Desserts");
        let Verdict::Reject(why) = verdict else { panic!("expected rejection") };
        assert!(why.iter().any(|r| matches!(r, Rejection::DessertProtein { .. })));
        // 80g is under the single-item protein ceiling; only the dessert rule fires
        assert_eq!(why.len(), 1);
    }

    #[test]
    fn composite_meals_get_wider_ceilings() {
        let big = n(1500.0, 120.0, 60.0, 100.0);
        assert!(!v().check(&big, "Steak", "Entrees").is_accepted());
        assert_eq!(v().check(&big, "Steak Platter", "Entrees"), Verdict::Accept(MealClass::Composite));
        assert_eq!(v().check(&big, "Steak", "Value Meals"), Verdict::Accept(MealClass::Composite));
        assert_eq!(v().classify("Burger with Fries", "Grill"), MealClass::Composite);
    }

    #[test]
    fn calorie_band_is_enforced_only_with_an_estimate() {
        let verdict = v().check(&n(10.0, 30.0, 5.0, 2.0), "Chicken Breast", "Entrees");
        assert!(matches!(verdict, Verdict::Reject(ref r) if matches!(r[0], Rejection::CalorieMismatch { .. })));

        // no macros: nothing to compare against
        assert!(v().check(&n(120.0, 0.0, 0.0, 0.0), "Black Coffee", "Drinks").is_accepted());
        assert!(v().check(&Nutrients::default(), "Ghost", "General").is_accepted());
    }

    #[test]
    fn sodium_ceiling_by_class() {
        let mut salty = n(250.0, 30.0, 5.0, 2.0);
        salty.sodium = 5000.0;
        assert!(!v().check(&salty, "Ramen", "Soups").is_accepted());
        assert!(v().check(&salty, "Ramen Combo", "Soups").is_accepted());
    }

    #[test]
    fn band_edges_are_inclusive() {
        // expected = 100 → 40 and 250 sit exactly on the band edges
        assert!(v().check(&n(40.0, 25.0, 0.0, 0.0), "Tofu", "Sides").is_accepted());
        assert!(v().check(&n(250.0, 25.0, 0.0, 0.0), "Tofu", "Sides").is_accepted());
    }
}
