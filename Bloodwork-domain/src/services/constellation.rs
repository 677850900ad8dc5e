//! Constellation analysis
//!
//! Recognises patterns spanning several values of one test event. The rule set is
//! closed and matches category labels and codes of the bundled catalog exactly.

use crate::entities::{ClassifiedMeasurement, ConstellationFinding, Severity, Status};

pub const LIVER_CATEGORY: &str = "Leberwerte";
pub const DIABETES_CATEGORY: &str = "Diabetes";
pub const KIDNEY_CATEGORY: &str = "Nierenwerte";
pub const BLOOD_COUNT_CATEGORY: &str = "Kleines Blutbild";

const GLUCOSE_THRESHOLD: f64 = 126.0;
const GLUCOSE_SEVERE: f64 = 200.0;
const HBA1C_THRESHOLD: f64 = 6.5;
const HBA1C_SEVERE: f64 = 9.0;
const GFR_THRESHOLD: f64 = 60.0;
const GFR_SEVERE: f64 = 30.0;
const LIVER_WARNING_COUNT: usize = 3;

type Rule = fn(&[ClassifiedMeasurement]) -> Option<ConstellationFinding>;

/// Evaluation order of the rules, which is also the order of the findings
const RULES: [Rule; 4] = [liver_rule, diabetes_rule, kidney_rule, anemia_rule];

/// Run every rule over the values of one test event
pub fn analyze(measurements: &[ClassifiedMeasurement]) -> Vec<ConstellationFinding> {
    RULES.iter().filter_map(|rule| rule(measurements)).collect()
}

fn in_category<'a>(
    measurements: &'a [ClassifiedMeasurement],
    category: &'static str,
) -> impl Iterator<Item = &'a ClassifiedMeasurement> + 'a {
    measurements.iter().filter(move |m| m.category == category)
}

fn find_code<'a>(
    measurements: &'a [ClassifiedMeasurement],
    category: &'static str,
    code: &str,
    predicate: impl Fn(&ClassifiedMeasurement) -> bool,
) -> Option<&'a ClassifiedMeasurement> {
    in_category(measurements, category).find(|m| m.code == code && predicate(m))
}

fn finding(
    title: &str,
    description: &str,
    severity: Severity,
    affected_codes: Vec<String>,
    recommendations: &[&str],
) -> ConstellationFinding {
    ConstellationFinding {
        title: title.to_string(),
        description: description.to_string(),
        severity,
        affected_codes,
        recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
    }
}

fn liver_rule(measurements: &[ClassifiedMeasurement]) -> Option<ConstellationFinding> {
    let elevated: Vec<&ClassifiedMeasurement> = in_category(measurements, LIVER_CATEGORY)
        .filter(|m| m.status.is_elevated())
        .collect();
    if elevated.is_empty() {
        return None;
    }

    let severity = if elevated.iter().any(|m| m.status == Status::CriticalHigh) {
        Severity::Critical
    } else if elevated.len() >= LIVER_WARNING_COUNT {
        Severity::Warning
    } else {
        Severity::Info
    };

    Some(finding(
        "Erhöhte Leberwerte",
        "Mehrere Leberwerte sind erhöht. Dies kann auf eine Leberschädigung hinweisen.",
        severity,
        elevated.iter().map(|m| m.code.clone()).collect(),
        &[
            "Alkoholkonsum reduzieren",
            "Medikamente überprüfen",
            "Weitere Leberuntersuchung erwägen",
            "Rücksprache mit dem Arzt",
        ],
    ))
}

fn diabetes_rule(measurements: &[ClassifiedMeasurement]) -> Option<ConstellationFinding> {
    let glucose = find_code(measurements, DIABETES_CATEGORY, "GLU", |m| m.value > GLUCOSE_THRESHOLD);
    let hba1c = find_code(measurements, DIABETES_CATEGORY, "HbA1c", |m| m.value > HBA1C_THRESHOLD);
    if glucose.is_none() && hba1c.is_none() {
        return None;
    }

    let severity = if hba1c.map_or(false, |m| m.value > HBA1C_SEVERE) {
        Severity::Critical
    } else if glucose.map_or(false, |m| m.value > GLUCOSE_SEVERE) {
        Severity::Warning
    } else {
        Severity::Info
    };

    Some(finding(
        "Diabetesverdacht",
        "Die Blutzuckerwerte deuten auf einen möglichen Diabetes hin.",
        severity,
        [glucose, hba1c].iter().flatten().map(|m| m.code.clone()).collect(),
        &[
            "Diabetologische Abklärung",
            "Ernährungsberatung",
            "Gewichtskontrolle",
            "Regelmäßige Blutzuckermessung",
        ],
    ))
}

fn kidney_rule(measurements: &[ClassifiedMeasurement]) -> Option<ConstellationFinding> {
    let creatinine = find_code(measurements, KIDNEY_CATEGORY, "CREA", |m| m.status != Status::Normal);
    let gfr = find_code(measurements, KIDNEY_CATEGORY, "GFR", |m| m.value < GFR_THRESHOLD);
    if creatinine.is_none() && gfr.is_none() {
        return None;
    }

    // INFO only when creatinine is off but GFR is still at or above the threshold
    let severity = match gfr {
        Some(m) if m.value < GFR_SEVERE => Severity::Critical,
        Some(_) => Severity::Warning,
        None => Severity::Info,
    };

    Some(finding(
        "Eingeschränkte Nierenfunktion",
        "Die Nierenwerte zeigen eine mögliche Funktionseinschränkung.",
        severity,
        [creatinine, gfr].iter().flatten().map(|m| m.code.clone()).collect(),
        &[
            "Nephrologische Kontrolle",
            "Blutdruckkontrolle",
            "Medikamente überprüfen",
            "Trinkmenge anpassen",
        ],
    ))
}

fn anemia_rule(measurements: &[ClassifiedMeasurement]) -> Option<ConstellationFinding> {
    let is_low = |m: &ClassifiedMeasurement| m.status == Status::Low;
    let hemoglobin = find_code(measurements, BLOOD_COUNT_CATEGORY, "Hb", is_low);
    let erythrocytes = find_code(measurements, BLOOD_COUNT_CATEGORY, "RBC", is_low);
    let hematocrit = find_code(measurements, BLOOD_COUNT_CATEGORY, "Hkt", is_low);

    let fires = hemoglobin.is_some() || (erythrocytes.is_some() && hematocrit.is_some());
    if !fires {
        return None;
    }

    Some(finding(
        "Anämie-Verdacht",
        "Die Blutwerte deuten auf eine mögliche Blutarmut hin.",
        Severity::Warning,
        [hemoglobin, erythrocytes, hematocrit]
            .iter()
            .flatten()
            .map(|m| m.code.clone())
            .collect(),
        &[
            "Eisenstatus prüfen",
            "Vitamin B12 und Folsäure bestimmen",
            "Stuhltest auf okkultes Blut",
            "Hämatologische Abklärung",
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(category: &str, code: &str, value: f64, status: Status) -> ClassifiedMeasurement {
        ClassifiedMeasurement::new(category, code, value, status)
    }

    fn codes(finding: &ConstellationFinding) -> Vec<&str> {
        finding.affected_codes.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_empty_input_has_no_findings() {
        assert!(analyze(&[]).is_empty());
    }

    #[test]
    fn test_normal_values_have_no_findings() {
        let values = vec![
            m(LIVER_CATEGORY, "GPT", 30.0, Status::Normal),
            m(DIABETES_CATEGORY, "GLU", 90.0, Status::Normal),
            m(KIDNEY_CATEGORY, "CREA", 0.9, Status::Normal),
            m(KIDNEY_CATEGORY, "GFR", 95.0, Status::Normal),
            m(BLOOD_COUNT_CATEGORY, "Hb", 14.5, Status::Normal),
        ];
        assert!(analyze(&values).is_empty());
    }

    #[test]
    fn test_liver_severity_by_count_and_criticality() {
        let one = vec![m(LIVER_CATEGORY, "GPT", 80.0, Status::High)];
        let findings = analyze(&one);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert_eq!(findings[0].recommendations.len(), 4);

        let three = vec![
            m(LIVER_CATEGORY, "GOT", 70.0, Status::High),
            m(LIVER_CATEGORY, "ALB", 4.0, Status::Normal),
            m(LIVER_CATEGORY, "GPT", 80.0, Status::High),
            m(LIVER_CATEGORY, "GGT", 90.0, Status::High),
        ];
        let findings = analyze(&three);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(codes(&findings[0]), vec!["GOT", "GPT", "GGT"]);

        let critical = vec![
            m(LIVER_CATEGORY, "GPT", 80.0, Status::High),
            m(LIVER_CATEGORY, "GOT", 900.0, Status::CriticalHigh),
        ];
        assert_eq!(analyze(&critical)[0].severity, Severity::Critical);
    }

    #[test]
    fn test_liver_ignores_low_values_and_other_categories() {
        let values = vec![
            m(LIVER_CATEGORY, "ALB", 2.0, Status::Low),
            m(LIVER_CATEGORY, "CHE", 1.0, Status::CriticalLow),
            m("Pankreas", "LIP", 300.0, Status::High),
        ];
        assert!(analyze(&values).is_empty());
    }

    #[test]
    fn test_diabetes_severities() {
        let glucose = analyze(&[m(DIABETES_CATEGORY, "GLU", 130.0, Status::High)]);
        assert_eq!(glucose[0].severity, Severity::Info);
        assert_eq!(codes(&glucose[0]), vec!["GLU"]);

        let high_glucose = analyze(&[m(DIABETES_CATEGORY, "GLU", 210.0, Status::High)]);
        assert_eq!(high_glucose[0].severity, Severity::Warning);

        let hba1c = analyze(&[m(DIABETES_CATEGORY, "HbA1c", 9.5, Status::High)]);
        assert_eq!(hba1c[0].severity, Severity::Critical);
        assert_eq!(codes(&hba1c[0]), vec!["HbA1c"]);
    }

    #[test]
    fn test_diabetes_thresholds_are_strict_and_glucose_listed_first() {
        let at_threshold = vec![
            m(DIABETES_CATEGORY, "GLU", 126.0, Status::High),
            m(DIABETES_CATEGORY, "HbA1c", 6.5, Status::High),
        ];
        assert!(analyze(&at_threshold).is_empty());

        let both = vec![
            m(DIABETES_CATEGORY, "HbA1c", 7.0, Status::High),
            m(DIABETES_CATEGORY, "GLU", 150.0, Status::High),
        ];
        let findings = analyze(&both);
        assert_eq!(codes(&findings[0]), vec!["GLU", "HbA1c"]);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_diabetes_requires_category_and_exact_code() {
        let values = vec![
            m("Sonstiges", "GLU", 300.0, Status::High),
            m(DIABETES_CATEGORY, "glu", 300.0, Status::High),
        ];
        assert!(analyze(&values).is_empty());
    }

    #[test]
    fn test_kidney_severities() {
        let creatinine_only = analyze(&[
            m(KIDNEY_CATEGORY, "CREA", 1.5, Status::High),
            m(KIDNEY_CATEGORY, "GFR", 75.0, Status::Low),
        ]);
        assert_eq!(creatinine_only[0].severity, Severity::Info);
        assert_eq!(codes(&creatinine_only[0]), vec!["CREA"]);

        let moderate = analyze(&[m(KIDNEY_CATEGORY, "GFR", 45.0, Status::Low)]);
        assert_eq!(moderate[0].severity, Severity::Warning);
        assert_eq!(codes(&moderate[0]), vec!["GFR"]);

        let severe = analyze(&[
            m(KIDNEY_CATEGORY, "GFR", 20.0, Status::Low),
            m(KIDNEY_CATEGORY, "CREA", 3.2, Status::High),
        ]);
        assert_eq!(severe[0].severity, Severity::Critical);
        assert_eq!(codes(&severe[0]), vec!["CREA", "GFR"]);
    }

    #[test]
    fn test_anemia_rule() {
        let hb_low = analyze(&[
            m(BLOOD_COUNT_CATEGORY, "Hb", 11.0, Status::Low),
            m(BLOOD_COUNT_CATEGORY, "RBC", 4.8, Status::Normal),
            m(BLOOD_COUNT_CATEGORY, "Hkt", 42.0, Status::Normal),
        ]);
        assert_eq!(hb_low.len(), 1);
        assert_eq!(hb_low[0].severity, Severity::Warning);
        assert_eq!(codes(&hb_low[0]), vec!["Hb"]);

        let rbc_and_hkt = analyze(&[
            m(BLOOD_COUNT_CATEGORY, "Hkt", 35.0, Status::Low),
            m(BLOOD_COUNT_CATEGORY, "Hb", 14.0, Status::Normal),
            m(BLOOD_COUNT_CATEGORY, "RBC", 3.9, Status::Low),
        ]);
        assert_eq!(codes(&rbc_and_hkt[0]), vec!["RBC", "Hkt"]);

        let rbc_only = analyze(&[
            m(BLOOD_COUNT_CATEGORY, "Hb", 14.0, Status::Normal),
            m(BLOOD_COUNT_CATEGORY, "RBC", 3.9, Status::Low),
        ]);
        assert!(rbc_only.is_empty());
    }

    #[test]
    fn test_anemia_ignores_critical_low() {
        let values = vec![m(BLOOD_COUNT_CATEGORY, "Hb", 6.0, Status::CriticalLow)];
        assert!(analyze(&values).is_empty());
    }

    #[test]
    fn test_findings_follow_rule_order() {
        let values = vec![
            m(BLOOD_COUNT_CATEGORY, "Hb", 11.0, Status::Low),
            m(KIDNEY_CATEGORY, "GFR", 50.0, Status::Low),
            m(DIABETES_CATEGORY, "GLU", 140.0, Status::High),
            m(LIVER_CATEGORY, "GPT", 80.0, Status::High),
        ];
        let first = analyze(&values);
        let titles: Vec<&str> = first.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Erhöhte Leberwerte", "Diabetesverdacht", "Eingeschränkte Nierenfunktion", "Anämie-Verdacht"]
        );
        assert_eq!(analyze(&values), first);
    }
}
