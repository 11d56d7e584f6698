//! Structured catalog attributes for products
//!
//! Each block is optional on the product and every field inside defaults, so a
//! missing or partial document reads as an explicit empty value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Allergens declared for a product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllergenInfo {
    pub contains: Vec<Allergen>,
    pub may_contain: Vec<Allergen>,
    pub notes: Option<String>,
}

impl AllergenInfo {
    pub fn is_empty(&self) -> bool {
        self.contains.is_empty() && self.may_contain.is_empty() && self.notes.is_none()
    }
}

/// Major food allergens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Allergen {
    Gluten,
    Crustaceans,
    Eggs,
    Fish,
    Peanuts,
    Soy,
    Milk,
    TreeNuts,
    Celery,
    Mustard,
    Sesame,
    Sulphites,
    Lupin,
    Molluscs,
}

/// Nutrition facts per serving
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionInfo {
    pub serving_size: Option<String>,
    pub calories_kcal: Option<Decimal>,
    pub protein_g: Option<Decimal>,
    pub carbohydrates_g: Option<Decimal>,
    pub sugar_g: Option<Decimal>,
    pub fat_g: Option<Decimal>,
    pub saturated_fat_g: Option<Decimal>,
    pub fiber_g: Option<Decimal>,
    pub sodium_mg: Option<Decimal>,
}

/// Social media presence of a product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialMediaLinks {
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub tiktok: Option<String>,
    pub hashtags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_documents_fill_defaults() {
        let allergens: AllergenInfo = serde_json::from_str(r#"{"contains":["milk"]}"#).unwrap();
        assert_eq!(allergens.contains, vec![Allergen::Milk]);
        assert!(allergens.may_contain.is_empty());

        let empty: AllergenInfo = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());

        let nutrition: NutritionInfo = serde_json::from_str(r#"{"calories_kcal":"250"}"#).unwrap();
        assert_eq!(nutrition.calories_kcal, Some(Decimal::from(250)));
        assert_eq!(nutrition.fat_g, None);
    }

    #[test]
    fn test_unknown_allergen_rejected() {
        assert!(serde_json::from_str::<AllergenInfo>(r#"{"contains":["glitter"]}"#).is_err());
    }
}
