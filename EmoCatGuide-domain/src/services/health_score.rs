//! Health score from extracted vital stats.
//!
//! Every report starts at 100. Each flagged metric costs 5, 10 or 15 points by
//! grade (A, B, C), blood pressure is graded as a pair, and having several of
//! high glucose, high LDL and high blood pressure costs extra. The score never
//! drops below 1.

use serde_json::{Map, Value};
use tracing::debug;

use crate::entities::Gender;
use crate::services::health_standards::HealthStandards;

pub const MAX_SCORE: i32 = 100;
pub const MIN_SCORE: i32 = 1;

/// Deduction grade for a single finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    A,
    B,
    C,
}

impl Grade {
    pub fn deduction(self) -> i32 {
        match self {
            Grade::A => 5,
            Grade::B => 10,
            Grade::C => 15,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
        }
    }

    fn parse(letter: &str) -> Option<Self> {
        match letter.trim() {
            "A" => Some(Grade::A),
            "B" => Some(Grade::B),
            "C" => Some(Grade::C),
            _ => None,
        }
    }
}

/// Numeric reading of a reported value.
/// Dipstick results map to 0 (negative) through 3 (`++++`).
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let text = s.trim().to_lowercase();
            match text.as_str() {
                "負" | "negative" | "(-)" | "-" => Some(0.0),
                "+/-" | "+" => Some(1.0),
                "++" | "+++" => Some(2.0),
                "++++" => Some(3.0),
                _ => text.parse::<f64>().ok(),
            }
        }
        _ => None,
    }
}

fn numeric_stat(vital_stats: &Map<String, Value>, key: &str) -> Option<f64> {
    vital_stats.get(key).and_then(numeric_value)
}

/// Grade A when the value falls outside the reference.
/// Unparseable references yield no grade.
fn reference_grade(reference: &str, value: f64) -> Option<Grade> {
    if let Some((lower, upper)) = reference.split_once('-') {
        let lower = lower.trim().parse::<f64>().ok()?;
        let upper = upper.trim().parse::<f64>().ok()?;
        return (!(lower <= value && value <= upper)).then_some(Grade::A);
    }
    if let Some(upper) = reference.strip_prefix('<') {
        let upper = upper.trim().parse::<f64>().ok()?;
        return (value >= upper).then_some(Grade::A);
    }
    if let Some(lower) = reference.strip_prefix('>') {
        let lower = lower.trim().parse::<f64>().ok()?;
        return (value <= lower).then_some(Grade::A);
    }
    None
}

/// Built-in bands for metrics whose standard defines no grades
fn fallback_grade(key: &str, value: f64) -> Option<Grade> {
    let banded = |start: f64, a_max: f64, b_max: f64| {
        if value < start {
            None
        } else if value <= a_max {
            Some(Grade::A)
        } else if value <= b_max {
            Some(Grade::B)
        } else {
            Some(Grade::C)
        }
    };

    match key {
        "glucose" => banded(100.0, 126.0, 180.0),
        "ldl_cholesterol" => banded(130.0, 160.0, 200.0),
        // BMI bands are half-open
        "bmi" if value >= 24.0 => Some(if value < 27.0 {
            Grade::A
        } else if value < 30.0 {
            Grade::B
        } else {
            Grade::C
        }),
        "alt" => banded(41.0, 80.0, 200.0),
        "ast" => banded(31.0, 80.0, 200.0),
        "creatinine" => banded(1.3, 2.0, 3.0),
        "uric_acid" => banded(7.0, 8.0, 10.0),
        "urine_protein" => match value {
            v if v == 1.0 => Some(Grade::A),
            v if v == 2.0 => Some(Grade::B),
            v if v == 3.0 => Some(Grade::C),
            _ => None,
        },
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn blood_pressure_grade(systolic: Option<f64>, diastolic: Option<f64>) -> Option<Grade> {
    let sys = systolic.unwrap_or(f64::NEG_INFINITY);
    let dia = diastolic.unwrap_or(f64::NEG_INFINITY);
    if sys >= 160.0 || dia >= 100.0 {
        Some(Grade::C)
    } else if sys >= 140.0 || dia >= 90.0 {
        Some(Grade::B)
    } else if sys >= 130.0 || dia >= 80.0 {
        Some(Grade::A)
    } else {
        None
    }
}

/// Score a report's vital stats. Unset gender is treated as female.
pub fn calculate_health_score(
    vital_stats: &Map<String, Value>,
    gender: Option<Gender>,
    standards: &HealthStandards,
) -> (u8, Vec<String>) {
    let gender = gender.unwrap_or(Gender::Female);
    let mut score = MAX_SCORE;
    let mut warnings = Vec::new();

    for (key, value) in vital_stats {
        let standard = match standards.get(key) {
            Some(standard) if !value.is_null() => standard,
            _ => continue,
        };
        let reference = standard.reference_for(gender);

        // Qualitative tests only pass on a negative result
        if reference.contains("(-)") {
            if numeric_value(value) != Some(0.0) {
                score -= 5;
                warnings.push(format!("{} outside normal range ({})", standard.name, display_value(value)));
            }
            continue;
        }

        let numeric = match numeric_value(value) {
            Some(numeric) => numeric,
            None => continue,
        };

        let mut grade = reference_grade(reference, numeric);

        match standard.grades_for(gender) {
            Some(bands) => {
                if let Some(letter) = bands
                    .iter()
                    .find(|(_, (lower, upper))| *lower <= numeric && numeric <= *upper)
                    .map(|(letter, _)| letter)
                {
                    grade = Grade::parse(letter);
                }
            },
            None if grade.is_none() => grade = fallback_grade(key, numeric),
            None => {}
        }

        if let Some(grade) = grade {
            score -= grade.deduction();
            warnings.push(format!("{} is grade {} ({})", standard.name, grade.as_str(), display_value(value)));
        }
    }

    let systolic = numeric_stat(vital_stats, "blood_pressure_systolic");
    let diastolic = numeric_stat(vital_stats, "blood_pressure_diastolic");
    let pressure = match (systolic, diastolic) {
        (Some(sys), Some(dia)) => blood_pressure_grade(systolic, diastolic)
            .map(|grade| (grade, format!("Blood pressure is grade {} ({}/{} mmHg)", grade.as_str(), sys, dia))),
        (Some(sys), None) => blood_pressure_grade(systolic, None)
            .map(|grade| (grade, format!("Systolic blood pressure is grade {} ({} mmHg)", grade.as_str(), sys))),
        (None, Some(dia)) => blood_pressure_grade(None, diastolic)
            .map(|grade| (grade, format!("Diastolic blood pressure is grade {} ({} mmHg)", grade.as_str(), dia))),
        (None, None) => None,
    };
    if let Some((grade, message)) = pressure {
        score -= grade.deduction();
        warnings.push(message);
    }

    let high_glucose = numeric_stat(vital_stats, "glucose").is_some_and(|v| v >= 100.0);
    let high_ldl = numeric_stat(vital_stats, "ldl_cholesterol").is_some_and(|v| v >= 130.0);
    let high_pressure = systolic.is_some_and(|v| v >= 130.0) || diastolic.is_some_and(|v| v >= 80.0);
    let highs = [high_glucose, high_ldl, high_pressure].iter().filter(|high| **high).count();

    match highs {
        1 => {
            score -= 5;
            warnings.push("One of the three highs (glucose, LDL, blood pressure): extra 5 points deducted".to_string());
        },
        2 => {
            score -= 10;
            warnings.push("Two of the three highs (glucose, LDL, blood pressure): extra 10 points deducted".to_string());
        },
        3 => {
            score -= 15;
            warnings.push("All three highs (glucose, LDL, blood pressure): extra 15 points deducted".to_string());
        },
        _ => {}
    }

    let score = score.max(MIN_SCORE);
    debug!("Health score: {}, warnings: {:?}", score, warnings);

    // Clamped to 1..=100
    (score as u8, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::health_standards::default_standards;
    use serde_json::json;

    fn score(stats: Value, gender: Option<Gender>) -> (u8, Vec<String>) {
        calculate_health_score(stats.as_object().unwrap(), gender, &default_standards())
    }

    #[test]
    fn test_numeric_value() {
        assert_eq!(numeric_value(&json!(5)), Some(5.0));
        assert_eq!(numeric_value(&json!("6.5")), Some(6.5));
        assert_eq!(numeric_value(&json!("負")), Some(0.0));
        assert_eq!(numeric_value(&json!(" Negative ")), Some(0.0));
        assert_eq!(numeric_value(&json!("+/-")), Some(1.0));
        assert_eq!(numeric_value(&json!("+++")), Some(2.0));
        assert_eq!(numeric_value(&json!("++++")), Some(3.0));
        assert_eq!(numeric_value(&json!("trace")), None);
        assert_eq!(numeric_value(&Value::Null), None);
    }

    #[test]
    fn test_reference_grade() {
        assert_eq!(reference_grade("70-99", 85.0), None);
        assert_eq!(reference_grade("70-99", 99.5), Some(Grade::A));
        assert_eq!(reference_grade("<130", 130.0), Some(Grade::A));
        assert_eq!(reference_grade("<130", 129.0), None);
        assert_eq!(reference_grade(">40", 40.0), Some(Grade::A));
        assert_eq!(reference_grade(">40", 41.0), None);
        assert_eq!(reference_grade("about 5", 9.0), None);
        assert_eq!(reference_grade("", 9.0), None);
    }

    #[test]
    fn test_all_normal_scores_100() {
        let (score, warnings) = score(json!({
            "glucose": 90,
            "ldl_cholesterol": 100,
            "hdl_cholesterol": 60,
            "HBsAg": "(-)",
            "urine_ob": "negative",
            "blood_pressure_systolic": 118,
            "blood_pressure_diastolic": 76,
            "egfr": null
        }), Some(Gender::Male));
        assert_eq!(score, 100);
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn test_out_of_range_is_grade_a() {
        // Glucose 110: out of range (A), plus one high
        let (score, warnings) = score(json!({ "glucose": 110 }), None);
        assert_eq!(score, 90);
        assert_eq!(warnings[0], "Fasting glucose is grade A (110)");
        assert!(warnings[1].starts_with("One of the three highs"));
    }

    #[test]
    fn test_grade_bands_override_range_grade() {
        // Triglycerides 250 is outside <150 but the B band matches
        let (score, warnings) = score(json!({ "triglycerides": 250 }), Some(Gender::Female));
        assert_eq!(score, 90);
        assert_eq!(warnings, vec!["Triglycerides is grade B (250)".to_string()]);
    }

    #[test]
    fn test_fallbacks_skipped_when_bands_exist() {
        // HbA1c 5.5 is in range and matches no band
        let (score, _) = score(json!({ "hemoglobin_a1c": 5.5 }), None);
        assert_eq!(score, 100);
    }

    #[test]
    fn test_gendered_reference() {
        // HDL 45: fine for men (>40), low for women (>50)
        assert_eq!(score(json!({ "hdl_cholesterol": 45 }), Some(Gender::Male)).0, 100);
        assert_eq!(score(json!({ "hdl_cholesterol": 45 }), Some(Gender::Female)).0, 95);
        assert_eq!(score(json!({ "hdl_cholesterol": 45 }), None).0, 95);
    }

    #[test]
    fn test_qualitative_findings() {
        let (score, warnings) = score(json!({ "HBsAg": "(+)", "urine_ob": "+" }), None);
        assert_eq!(score, 90);
        assert!(warnings.contains(&"Hepatitis B surface antigen outside normal range ((+))".to_string()));
        assert!(warnings.contains(&"Urine occult blood outside normal range (+)".to_string()));
    }

    #[test]
    fn test_urine_protein_dipstick() {
        assert_eq!(score(json!({ "urine_protein": "+" }), None).0, 95);
        assert_eq!(score(json!({ "urine_protein": "++" }), None).0, 90);
        assert_eq!(score(json!({ "urine_protein": "++++" }), None).0, 85);
        assert_eq!(score(json!({ "urine_protein": "-" }), None).0, 100);
    }

    #[test]
    fn test_blood_pressure() {
        let (score_pair, warnings) = score(json!({
            "blood_pressure_systolic": 165,
            "blood_pressure_diastolic": 85
        }), None);
        // C for the pair, plus one high
        assert_eq!(score_pair, 80);
        assert_eq!(warnings[0], "Blood pressure is grade C (165/85 mmHg)");

        let (score_sys, warnings) = score(json!({ "blood_pressure_systolic": 145 }), None);
        assert_eq!(score_sys, 85);
        assert_eq!(warnings[0], "Systolic blood pressure is grade B (145 mmHg)");

        let (score_dia, warnings) = score(json!({ "blood_pressure_diastolic": "82" }), None);
        assert_eq!(score_dia, 90);
        assert_eq!(warnings[0], "Diastolic blood pressure is grade A (82 mmHg)");
    }

    #[test]
    fn test_three_highs() {
        let (score, warnings) = score(json!({
            "glucose": 105,
            "ldl_cholesterol": 135,
            "blood_pressure_systolic": 132
        }), None);
        // glucose A, ldl A, blood pressure A, three highs
        assert_eq!(score, 100 - 5 - 5 - 5 - 15);
        assert!(warnings.last().unwrap().starts_with("All three highs"));
    }

    #[test]
    fn test_score_never_below_one() {
        let (score, warnings) = score(json!({
            "glucose": 300,
            "ldl_cholesterol": 250,
            "bmi": 35,
            "alt": 250,
            "ast": 250,
            "creatinine": 4.0,
            "uric_acid": 12,
            "triglycerides": 800,
            "total_cholesterol": 320,
            "egfr": 20,
            "HBsAg": "+",
            "urine_ob": "+++",
            "urine_glucose": "++",
            "blood_pressure_systolic": 190,
            "blood_pressure_diastolic": 120
        }), None);
        assert_eq!(score, 1);
        assert!(warnings.len() > 10);
    }

    #[test]
    fn test_unknown_and_non_numeric_stats_are_ignored() {
        let (score, warnings) = score(json!({
            "whisker_length": 999,
            "wbc": "pending"
        }), None);
        assert_eq!(score, 100);
        assert!(warnings.is_empty());
    }
}
