use serde::{Deserialize, Serialize};

/// Storage model for a catalog entry describing one kind of lab measurement
///
/// The bundled seed file deserializes straight into this type; its `id` is
/// assigned by the backend on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementDefinitionRecord {
    /// Row identifier
    #[serde(default)]
    pub id: i64,

    /// Unique abbreviation, e.g. "Hb" or "GPT"
    pub code: String,

    /// German display name
    pub name_de: String,

    /// English display name
    pub name_en: String,

    #[serde(default)]
    pub description_de: String,

    #[serde(default)]
    pub description_en: String,

    /// Unit the value is reported in
    pub unit: String,

    /// Grouping label such as "Leberwerte"
    pub category: String,

    #[serde(default)]
    pub min_male: Option<f64>,
    #[serde(default)]
    pub max_male: Option<f64>,
    #[serde(default)]
    pub min_female: Option<f64>,
    #[serde(default)]
    pub max_female: Option<f64>,
    #[serde(default)]
    pub min_normal: Option<f64>,
    #[serde(default)]
    pub max_normal: Option<f64>,
    #[serde(default)]
    pub critical_low: Option<f64>,
    #[serde(default)]
    pub critical_high: Option<f64>,

    #[serde(default)]
    pub high_meaning_de: Option<String>,
    #[serde(default)]
    pub high_meaning_en: Option<String>,
    #[serde(default)]
    pub low_meaning_de: Option<String>,
    #[serde(default)]
    pub low_meaning_en: Option<String>,

    /// Position within the category
    #[serde(default)]
    pub sort_order: i32,
}
