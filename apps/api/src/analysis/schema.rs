//! The fixed JSON schema the analysis model must answer with, and its validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::AnalysisError;

/// Keys that must be present in every response. Nullable keys may hold `null`,
/// but a missing key means the model did not follow the schema.
pub const REQUIRED_KEYS: &[&str] = &[
    "first_name",
    "last_name",
    "email",
    "phone",
    "candidate_strengths",
    "candidate_weaknesses",
    "risk_factor",
    "reward_factor",
    "overall_fit_rating",
    "justification_for_rating",
    "skills",
];

const MIN_SCORE: f64 = 1.0;
const MAX_SCORE: f64 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredFactor {
    pub score: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillInsight {
    pub name: String,
    #[serde(default)]
    pub proficiency: Option<String>,
    #[serde(default)]
    pub years: Option<f64>,
}

/// A validated analysis of one resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub candidate_strengths: Vec<String>,
    pub candidate_weaknesses: Vec<String>,
    pub risk_factor: ScoredFactor,
    pub reward_factor: ScoredFactor,
    pub overall_fit_rating: f64,
    pub justification_for_rating: String,
    pub skills: Vec<SkillInsight>,
}

/// Checks a raw model response against the schema and converts it.
pub fn parse_analysis(value: Value) -> Result<AnalysisResponse, AnalysisError> {
    let object = value
        .as_object()
        .ok_or_else(|| AnalysisError::Schema("response is not a JSON object".to_string()))?;

    if let Some(missing) = REQUIRED_KEYS.iter().find(|key| !object.contains_key(**key)) {
        return Err(AnalysisError::MissingField(*missing));
    }

    let analysis: AnalysisResponse =
        serde_json::from_value(value).map_err(|e| AnalysisError::Schema(e.to_string()))?;

    check_score("risk_factor.score", analysis.risk_factor.score)?;
    check_score("reward_factor.score", analysis.reward_factor.score)?;
    check_score("overall_fit_rating", analysis.overall_fit_rating)?;

    if analysis.skills.iter().any(|s| s.name.trim().is_empty()) {
        return Err(AnalysisError::Schema("skill with an empty name".to_string()));
    }

    Ok(analysis.cleaned())
}

fn check_score(field: &'static str, value: f64) -> Result<(), AnalysisError> {
    if value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value) {
        Ok(())
    } else {
        Err(AnalysisError::ScoreOutOfRange { field, value })
    }
}

impl AnalysisResponse {
    /// Trims strings and turns blank optional values into `None`.
    fn cleaned(mut self) -> Self {
        fn blank_to_none(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        self.first_name = blank_to_none(self.first_name);
        self.last_name = blank_to_none(self.last_name);
        self.email = blank_to_none(self.email).map(|e| e.to_lowercase());
        self.phone = blank_to_none(self.phone);
        self.candidate_strengths.retain(|s| !s.trim().is_empty());
        self.candidate_weaknesses.retain(|s| !s.trim().is_empty());
        for skill in &mut self.skills {
            skill.name = skill.name.trim().to_string();
            skill.proficiency = blank_to_none(skill.proficiency.take());
        }
        self
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn valid_response() -> Value {
        json!({
            "first_name": "John",
            "last_name": "Doe",
            "email": "John@Example.com",
            "phone": null,
            "candidate_strengths": ["10 years commercial wiring", "OSHA 30 certified"],
            "candidate_weaknesses": ["No PLC experience"],
            "risk_factor": {"score": 3, "explanation": "Stable tenure"},
            "reward_factor": {"score": 8, "explanation": "Strong field leadership"},
            "overall_fit_rating": 7.5,
            "justification_for_rating": "Meets core requirements",
            "skills": [
                {"name": "Electrical wiring", "proficiency": "expert", "years": 10},
                {"name": "Blueprint reading", "proficiency": null, "years": null}
            ]
        })
    }

    #[test]
    fn test_valid_response_parses() {
        let analysis = parse_analysis(valid_response()).unwrap();
        assert_eq!(analysis.first_name.as_deref(), Some("John"));
        assert_eq!(analysis.email.as_deref(), Some("john@example.com"));
        assert_eq!(analysis.skills.len(), 2);
        assert_eq!(analysis.skills[0].years, Some(10.0));
        assert!((analysis.overall_fit_rating - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_each_missing_key_is_reported() {
        for key in REQUIRED_KEYS {
            let mut value = valid_response();
            value.as_object_mut().unwrap().remove(*key);
            match parse_analysis(value) {
                Err(AnalysisError::MissingField(field)) => assert_eq!(field, *key),
                other => panic!("expected MissingField({key}), got {other:?}"),
            }
        }
    }

    #[test]
    fn test_null_nullable_keys_accepted() {
        let mut value = valid_response();
        value["email"] = Value::Null;
        value["first_name"] = Value::Null;
        let analysis = parse_analysis(value).unwrap();
        assert!(analysis.email.is_none());
        assert!(analysis.first_name.is_none());
    }

    #[test]
    fn test_wrong_type_is_schema_error() {
        let mut value = valid_response();
        value["candidate_strengths"] = json!("not a list");
        assert!(matches!(parse_analysis(value), Err(AnalysisError::Schema(_))));
    }

    #[test]
    fn test_score_out_of_range_rejected() {
        let mut value = valid_response();
        value["risk_factor"]["score"] = json!(11);
        assert!(matches!(
            parse_analysis(value),
            Err(AnalysisError::ScoreOutOfRange {
                field: "risk_factor.score",
                ..
            })
        ));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            parse_analysis(json!(["a", "b"])),
            Err(AnalysisError::Schema(_))
        ));
    }

    #[test]
    fn test_blank_skill_name_rejected() {
        let mut value = valid_response();
        value["skills"] = json!([{"name": "  "}]);
        assert!(matches!(parse_analysis(value), Err(AnalysisError::Schema(_))));
    }
}
