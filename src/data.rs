// src/data.rs
//
// Canonical per-item nutrition data.
//
// - Nutrient:       the 14 tracked fields, with column names and units.
// - Nutrients:      one value per field; never negative.
// - NutrientRecord: a validated, deduplicated item observation with its menu context.
// - RecordKey:      (name, restaurant, meal period, section), the storage key.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit { Kcal, Gram, Milligram }

impl Unit {
    pub fn suffix(self) -> &'static str {
        match self { Unit::Kcal => "", Unit::Gram => "g", Unit::Milligram => "mg" }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Calories,
    TotalFat,
    SaturatedFat,
    TransFat,
    Cholesterol,
    Sodium,
    TotalCarbs,
    DietaryFiber,
    TotalSugars,
    AddedSugars,
    Protein,
    Calcium,
    Iron,
    Potassium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 14] = [
        Nutrient::Calories,
        Nutrient::TotalFat,
        Nutrient::SaturatedFat,
        Nutrient::TransFat,
        Nutrient::Cholesterol,
        Nutrient::Sodium,
        Nutrient::TotalCarbs,
        Nutrient::DietaryFiber,
        Nutrient::TotalSugars,
        Nutrient::AddedSugars,
        Nutrient::Protein,
        Nutrient::Calcium,
        Nutrient::Iron,
        Nutrient::Potassium,
    ];

    /// Column name used by every store format.
    pub fn column(self) -> &'static str {
        match self {
            Nutrient::Calories => "calories",
            Nutrient::TotalFat => "total_fat",
            Nutrient::SaturatedFat => "saturated_fat",
            Nutrient::TransFat => "trans_fat",
            Nutrient::Cholesterol => "cholesterol",
            Nutrient::Sodium => "sodium",
            Nutrient::TotalCarbs => "total_carbs",
            Nutrient::DietaryFiber => "dietary_fiber",
            Nutrient::TotalSugars => "total_sugars",
            Nutrient::AddedSugars => "added_sugars",
            Nutrient::Protein => "protein",
            Nutrient::Calcium => "calcium",
            Nutrient::Iron => "iron",
            Nutrient::Potassium => "potassium",
        }
    }

    pub fn unit(self) -> Unit {
        match self {
            Nutrient::Calories => Unit::Kcal,
            Nutrient::Cholesterol
            | Nutrient::Sodium
            | Nutrient::Calcium
            | Nutrient::Iron
            | Nutrient::Potassium => Unit::Milligram,
            _ => Unit::Gram,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nutrients {
    pub calories: f64,
    pub total_fat: f64,
    pub saturated_fat: f64,
    pub trans_fat: f64,
    pub cholesterol: f64,
    pub sodium: f64,
    pub total_carbs: f64,
    pub dietary_fiber: f64,
    pub total_sugars: f64,
    pub added_sugars: f64,
    pub protein: f64,
    pub calcium: f64,
    pub iron: f64,
    pub potassium: f64,
}

impl Nutrients {
    pub fn get(&self, n: Nutrient) -> f64 {
        match n {
            Nutrient::Calories => self.calories,
            Nutrient::TotalFat => self.total_fat,
            Nutrient::SaturatedFat => self.saturated_fat,
            Nutrient::TransFat => self.trans_fat,
            Nutrient::Cholesterol => self.cholesterol,
            Nutrient::Sodium => self.sodium,
            Nutrient::TotalCarbs => self.total_carbs,
            Nutrient::DietaryFiber => self.dietary_fiber,
            Nutrient::TotalSugars => self.total_sugars,
            Nutrient::AddedSugars => self.added_sugars,
            Nutrient::Protein => self.protein,
            Nutrient::Calcium => self.calcium,
            Nutrient::Iron => self.iron,
            Nutrient::Potassium => self.potassium,
        }
    }

    /// Negative, NaN and infinite values are stored as 0.
    pub fn set(&mut self, n: Nutrient, value: f64) {
        let v = if value.is_finite() && value > 0.0 { value } else { 0.0 };
        let slot = match n {
            Nutrient::Calories => &mut self.calories,
            Nutrient::TotalFat => &mut self.total_fat,
            Nutrient::SaturatedFat => &mut self.saturated_fat,
            Nutrient::TransFat => &mut self.trans_fat,
            Nutrient::Cholesterol => &mut self.cholesterol,
            Nutrient::Sodium => &mut self.sodium,
            Nutrient::TotalCarbs => &mut self.total_carbs,
            Nutrient::DietaryFiber => &mut self.dietary_fiber,
            Nutrient::TotalSugars => &mut self.total_sugars,
            Nutrient::AddedSugars => &mut self.added_sugars,
            Nutrient::Protein => &mut self.protein,
            Nutrient::Calcium => &mut self.calcium,
            Nutrient::Iron => &mut self.iron,
            Nutrient::Potassium => &mut self.potassium,
        };
        *slot = v;
    }

    /// 4·protein + 4·carbs + 9·fat.
    pub fn estimated_calories(&self) -> f64 {
        4.0 * self.protein + 4.0 * self.total_carbs + 9.0 * self.total_fat
    }

    pub fn is_all_zero(&self) -> bool {
        Nutrient::ALL.iter().all(|n| self.get(*n) == 0.0)
    }
}

/// Storage key: one row per (name, restaurant, meal period, section).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub name: String,
    pub restaurant: String,
    pub meal_period: String,
    pub section: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NutrientRecord {
    pub name: String,
    pub restaurant: String,
    pub meal_period: String,
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<u64>,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    /// How many of the 14 fields the parser actually found.
    #[serde(default)]
    pub fields_recovered: u8,
}

impl NutrientRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            name: self.name.clone(),
            restaurant: self.restaurant.clone(),
            meal_period: self.meal_period.clone(),
            section: self.section.clone(),
        }
    }

    /// Usable nutrition: the calorie count was recovered and is non-zero.
    pub fn has_nutrition(&self) -> bool {
        self.nutrients.calories > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps_to_non_negative() {
        let mut n = Nutrients::default();
        n.set(Nutrient::Sodium, -5.0);
        n.set(Nutrient::Protein, f64::NAN);
        n.set(Nutrient::Iron, 1.5);
        assert_eq!(n.sodium, 0.0);
        assert_eq!(n.protein, 0.0);
        assert_eq!(n.get(Nutrient::Iron), 1.5);
    }

    #[test]
    fn every_nutrient_round_trips_through_get_set() {
        let mut n = Nutrients::default();
        for (i, field) in Nutrient::ALL.iter().enumerate() {
            n.set(*field, i as f64 + 1.0);
        }
        for (i, field) in Nutrient::ALL.iter().enumerate() {
            assert_eq!(n.get(*field), i as f64 + 1.0, "{}", field.column());
        }
    }

    #[test]
    fn units_follow_label_conventions() {
        assert_eq!(Nutrient::Sodium.unit(), Unit::Milligram);
        assert_eq!(Nutrient::Potassium.unit().suffix(), "mg");
        assert_eq!(Nutrient::TransFat.unit().suffix(), "g");
        assert_eq!(Nutrient::Calories.unit(), Unit::Kcal);
    }

    #[test]
    fn json_is_flat() {
        let rec = NutrientRecord {
            name: s!("Chicken Breast"),
            restaurant: s!("The Skillet"),
            meal_period: s!("Lunch"),
            section: s!("Entrees"),
            item_id: Some(101),
            nutrients: Nutrients { calories: 250.0, protein: 30.0, ..Nutrients::default() },
            fields_recovered: 2,
        };
        let v: serde_json::Value = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["calories"], 250.0);
        assert_eq!(v["item_id"], 101);
        let back: NutrientRecord = serde_json::from_value(v).unwrap();
        assert_eq!(back, rec);
    }
}
