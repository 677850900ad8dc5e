//! Reference range evaluation
//!
//! Classifies one value against the range of its catalog entry. The function is
//! total: a definition without a usable range classifies everything as NORMAL.

use crate::entities::{MeasurementDefinition, ReferenceRange, Sex, Status};

/// Pick the range that applies to `sex`
///
/// A sex-specific range wins when both of its bounds are present, otherwise the
/// sex-independent range is used. `Sex::Unspecified` only ever gets the latter.
pub fn applicable_range(definition: &MeasurementDefinition, sex: Sex) -> Option<ReferenceRange> {
    let specific = match sex {
        Sex::Male => definition.male_range(),
        Sex::Female => definition.female_range(),
        Sex::Unspecified => None,
    };
    specific.or_else(|| definition.normal_range())
}

/// Classify `value` against `definition` for the given sex
///
/// Critical thresholds are checked before the range. Values equal to a bound are in range.
pub fn classify(value: f64, definition: &MeasurementDefinition, sex: Sex) -> Status {
    let range = match applicable_range(definition, sex) {
        Some(range) => range,
        None => return Status::Normal,
    };

    if definition.critical_low.map_or(false, |limit| value < limit) {
        return Status::CriticalLow;
    }
    if definition.critical_high.map_or(false, |limit| value > limit) {
        return Status::CriticalHigh;
    }

    if value < range.min {
        Status::Low
    } else if value > range.max {
        Status::High
    } else {
        Status::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> MeasurementDefinition {
        MeasurementDefinition {
            id: 1,
            code: "X".to_string(),
            name_de: "Testwert".to_string(),
            name_en: "Test value".to_string(),
            description_de: String::new(),
            description_en: String::new(),
            unit: "mg/dl".to_string(),
            category: "Testgruppe".to_string(),
            min_male: None,
            max_male: None,
            min_female: None,
            max_female: None,
            min_normal: None,
            max_normal: None,
            critical_low: None,
            critical_high: None,
            high_meaning_de: None,
            high_meaning_en: None,
            low_meaning_de: None,
            low_meaning_en: None,
            sort_order: 0,
        }
    }

    fn normal_only(min: f64, max: f64) -> MeasurementDefinition {
        MeasurementDefinition {
            min_normal: Some(min),
            max_normal: Some(max),
            ..definition()
        }
    }

    #[test]
    fn test_sex_independent_range() {
        let def = normal_only(70.0, 100.0);
        for sex in [Sex::Male, Sex::Female, Sex::Unspecified] {
            assert_eq!(classify(85.0, &def, sex), Status::Normal);
            assert_eq!(classify(69.9, &def, sex), Status::Low);
            assert_eq!(classify(100.1, &def, sex), Status::High);
        }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let def = normal_only(70.0, 100.0);
        assert_eq!(classify(70.0, &def, Sex::Male), Status::Normal);
        assert_eq!(classify(100.0, &def, Sex::Male), Status::Normal);
        assert_eq!(classify(70.0 - 1e-9, &def, Sex::Male), Status::Low);
    }

    #[test]
    fn test_critical_thresholds_take_precedence() {
        let def = MeasurementDefinition {
            critical_low: Some(40.0),
            critical_high: Some(400.0),
            ..normal_only(70.0, 100.0)
        };
        assert_eq!(classify(401.0, &def, Sex::Male), Status::CriticalHigh);
        assert_eq!(classify(10_000.0, &def, Sex::Male), Status::CriticalHigh);
        assert_eq!(classify(400.0, &def, Sex::Male), Status::High);
        assert_eq!(classify(39.0, &def, Sex::Male), Status::CriticalLow);
        assert_eq!(classify(40.0, &def, Sex::Male), Status::Low);
    }

    #[test]
    fn test_sex_specific_ranges() {
        let def = MeasurementDefinition {
            min_male: Some(13.5),
            max_male: Some(17.5),
            min_female: Some(12.0),
            max_female: Some(16.0),
            ..definition()
        };
        assert_eq!(classify(13.0, &def, Sex::Male), Status::Low);
        assert_eq!(classify(13.0, &def, Sex::Female), Status::Normal);
        assert_eq!(classify(17.0, &def, Sex::Male), Status::Normal);
        assert_eq!(classify(17.0, &def, Sex::Female), Status::High);
    }

    #[test]
    fn test_falls_back_to_normal_range() {
        let def = MeasurementDefinition {
            min_male: Some(0.7),
            max_male: Some(1.3),
            ..normal_only(0.5, 1.1)
        };
        assert_eq!(applicable_range(&def, Sex::Male), Some(ReferenceRange { min: 0.7, max: 1.3 }));
        assert_eq!(applicable_range(&def, Sex::Female), Some(ReferenceRange { min: 0.5, max: 1.1 }));
        assert_eq!(applicable_range(&def, Sex::Unspecified), Some(ReferenceRange { min: 0.5, max: 1.1 }));
        assert_eq!(classify(1.2, &def, Sex::Female), Status::High);
    }

    #[test]
    fn test_half_specified_range_is_ignored() {
        let def = MeasurementDefinition {
            min_male: Some(10.0),
            ..normal_only(1.0, 5.0)
        };
        assert_eq!(classify(7.0, &def, Sex::Male), Status::High);
    }

    #[test]
    fn test_no_range_is_always_normal() {
        let def = MeasurementDefinition {
            critical_high: Some(10.0),
            ..definition()
        };
        for value in [-100.0, 0.0, 11.0, 1e9] {
            assert_eq!(classify(value, &def, Sex::Male), Status::Normal);
        }

        let sex_only = MeasurementDefinition {
            min_male: Some(1.0),
            max_male: Some(2.0),
            ..definition()
        };
        assert_eq!(classify(5.0, &sex_only, Sex::Unspecified), Status::Normal);
    }
}
