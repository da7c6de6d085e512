use indexmap::IndexMap;
use serde::Deserialize;

use crate::finding::Category;

pub const DEFAULT_WEIGHT: f32 = 1.0;

/// Static category -> weight mapping driving the scoring stage. Loaded once
/// at startup and never mutated at request time. Categories absent from the
/// table weigh `DEFAULT_WEIGHT`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    weights: IndexMap<String, f32>,
}

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(Category, f32)]) -> Self {
        let weights = pairs
            .iter()
            .map(|(category, weight)| (category.as_str().to_string(), *weight))
            .collect();
        Self { weights }
    }

    pub fn weight(&self, category: Category) -> f32 {
        self.weights
            .get(category.as_str())
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn contract_default() -> Self {
        Self::from_pairs(&[
            (Category::Legal, 1.2),
            (Category::Financial, 1.0),
            (Category::Operational, 0.8),
            (Category::Compliance, 1.0),
            (Category::DataProtection, 1.1),
        ])
    }

    pub fn compliance_default() -> Self {
        Self::from_pairs(&[
            (Category::Legal, 1.0),
            (Category::Financial, 0.9),
            (Category::Operational, 0.8),
            (Category::Compliance, 1.2),
            (Category::DataProtection, 1.2),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_category_defaults_to_one() {
        let table = WeightTable::new();
        assert_eq!(table.weight(Category::Legal), 1.0);
    }

    #[test]
    fn explicit_weight_wins() {
        let table = WeightTable::from_pairs(&[(Category::Financial, 0.5)]);
        assert_eq!(table.weight(Category::Financial), 0.5);
        assert_eq!(table.weight(Category::Legal), DEFAULT_WEIGHT);
    }

    #[test]
    fn deserializes_from_toml_map() {
        let table: WeightTable = toml::from_str("legal = 1.5\ncompliance = 0.7\n").unwrap();
        assert_eq!(table.weight(Category::Legal), 1.5);
        assert_eq!(table.weight(Category::Compliance), 0.7);
        assert_eq!(table.weight(Category::Operational), DEFAULT_WEIGHT);
    }
}
