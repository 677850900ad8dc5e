use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Inclusive lower and upper bound for a value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
}

impl ReferenceRange {
    /// Build a range only when both bounds are present; half a range counts as no range
    pub fn from_bounds(min: Option<f64>, max: Option<f64>) -> Option<Self> {
        match (min, max) {
            (Some(min), Some(max)) => Some(Self { min, max }),
            _ => None,
        }
    }
}

/// Catalog entry describing one kind of lab measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct MeasurementDefinition {
    /// Catalog identifier
    pub id: i64,

    /// Unique abbreviation, e.g. "Hb" or "GPT"
    pub code: String,

    /// German display name
    pub name_de: String,

    /// English display name
    pub name_en: String,

    pub description_de: String,
    pub description_en: String,

    /// Unit the value is reported in, e.g. "g/dl"
    pub unit: String,

    /// Grouping label such as "Leberwerte" or "Nierenwerte"
    pub category: String,

    pub min_male: Option<f64>,
    pub max_male: Option<f64>,
    pub min_female: Option<f64>,
    pub max_female: Option<f64>,

    /// Sex-independent range
    pub min_normal: Option<f64>,
    pub max_normal: Option<f64>,

    /// Values strictly below this are critically low
    pub critical_low: Option<f64>,

    /// Values strictly above this are critically high
    pub critical_high: Option<f64>,

    /// What an elevated value may indicate
    pub high_meaning_de: Option<String>,
    pub high_meaning_en: Option<String>,

    /// What a lowered value may indicate
    pub low_meaning_de: Option<String>,
    pub low_meaning_en: Option<String>,

    /// Position within the category
    pub sort_order: i32,
}

impl MeasurementDefinition {
    pub fn male_range(&self) -> Option<ReferenceRange> {
        ReferenceRange::from_bounds(self.min_male, self.max_male)
    }

    pub fn female_range(&self) -> Option<ReferenceRange> {
        ReferenceRange::from_bounds(self.min_female, self.max_female)
    }

    pub fn normal_range(&self) -> Option<ReferenceRange> {
        ReferenceRange::from_bounds(self.min_normal, self.max_normal)
    }
}

/// Definitions of one category, in catalog order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CatalogCategory {
    pub name: String,
    pub definitions: Vec<MeasurementDefinition>,
}

impl CatalogCategory {
    /// Group definitions that arrive sorted by category into one entry per category
    pub fn group(definitions: Vec<MeasurementDefinition>) -> Vec<CatalogCategory> {
        let mut categories: Vec<CatalogCategory> = Vec::new();
        for definition in definitions {
            match categories.last_mut() {
                Some(current) if current.name == definition.category => current.definitions.push(definition),
                _ => categories.push(CatalogCategory {
                    name: definition.category.clone(),
                    definitions: vec![definition],
                }),
            }
        }
        categories
    }
}
