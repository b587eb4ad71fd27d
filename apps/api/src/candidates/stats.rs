//! Database overview: totals, score distributions and the most common skills.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

const TOP_SKILLS: usize = 10;

/// Skills counted across resume texts, trades first.
const SKILL_VOCABULARY: &[&str] = &[
    "Welding", "Electrical", "HVAC", "Plumbing", "Pipefitting", "Carpentry", "PLC",
    "SCADA", "OSHA", "AutoCAD", "Blueprint", "Forklift", "CNC", "Millwright",
    "Python", "Java", "JavaScript", "TypeScript", "React", "Angular", "Vue", "Node.js",
    "AWS", "Azure", "GCP", "Docker", "Kubernetes", "SQL", "PostgreSQL", "MongoDB",
    "Redis", "Git", "Linux", "HTML", "CSS", "Machine Learning", "AI", "Data Science",
    "TensorFlow", "PyTorch", "Django", "Flask", "Spring Boot", "REST API", "GraphQL",
    "Microservices", "Agile", "Scrum", "DevOps", "CI/CD", "Jenkins", "Terraform",
    "Ansible", "Elasticsearch",
];

static SKILL_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    SKILL_VOCABULARY
        .iter()
        .filter_map(|skill| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(skill)))
                .ok()
                .map(|re| (*skill, re))
        })
        .collect()
});

#[derive(Debug, Serialize, FromRow)]
pub struct FitDistribution {
    pub high_fit: i64,
    pub medium_fit: i64,
    pub low_fit: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct RiskDistribution {
    pub low_risk: i64,
    pub medium_risk: i64,
    pub high_risk: i64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct SkillCount {
    pub skill: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CandidateStatistics {
    pub total_candidates: i64,
    pub fit_distribution: FitDistribution,
    pub risk_distribution: RiskDistribution,
    pub recent_uploads: i64,
    pub common_skills: Vec<SkillCount>,
}

#[derive(FromRow)]
struct Counts {
    total_candidates: i64,
    recent_uploads: i64,
    #[sqlx(flatten)]
    fit: FitDistribution,
    #[sqlx(flatten)]
    risk: RiskDistribution,
}

/// Counts resumes mentioning each vocabulary skill, most common first.
/// A resume counts once per skill.
pub fn count_common_skills<'a>(texts: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<SkillCount> {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for text in texts {
        for (skill, re) in SKILL_PATTERNS.iter() {
            if re.is_match(text) {
                *counts.entry(*skill).or_default() += 1;
            }
        }
    }

    let mut sorted: Vec<SkillCount> = counts
        .into_iter()
        .map(|(skill, count)| SkillCount {
            skill: skill.to_string(),
            count,
        })
        .collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.skill.cmp(&b.skill)));
    sorted.truncate(limit);
    sorted
}

pub async fn candidate_statistics(pool: &PgPool) -> Result<CandidateStatistics, sqlx::Error> {
    let counts = sqlx::query_as::<_, Counts>(
        r#"
        SELECT
            COUNT(*) AS total_candidates,
            COUNT(*) FILTER (WHERE upload_date >= NOW() - INTERVAL '30 days') AS recent_uploads,
            COUNT(*) FILTER (WHERE overall_fit_rating >= 8) AS high_fit,
            COUNT(*) FILTER (WHERE overall_fit_rating >= 6 AND overall_fit_rating < 8) AS medium_fit,
            COUNT(*) FILTER (WHERE overall_fit_rating < 6) AS low_fit,
            COUNT(*) FILTER (WHERE risk_factor_score <= 3) AS low_risk,
            COUNT(*) FILTER (WHERE risk_factor_score > 3 AND risk_factor_score <= 6) AS medium_risk,
            COUNT(*) FILTER (WHERE risk_factor_score > 6) AS high_risk
        FROM resume_analyses
        "#,
    )
    .fetch_one(pool)
    .await?;

    let texts: Vec<String> = sqlx::query_scalar("SELECT resume_text FROM resume_analyses")
        .fetch_all(pool)
        .await?;
    let common_skills = count_common_skills(texts.iter().map(String::as_str), TOP_SKILLS);

    Ok(CandidateStatistics {
        total_candidates: counts.total_candidates,
        fit_distribution: counts.fit,
        risk_distribution: counts.risk,
        recent_uploads: counts.recent_uploads,
        common_skills,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_compiles() {
        assert_eq!(SKILL_PATTERNS.len(), SKILL_VOCABULARY.len());
    }

    #[test]
    fn test_counts_once_per_resume() {
        let texts = [
            "Welding, welding and more WELDING. OSHA 30.",
            "TIG welding; HVAC service",
            "Office manager",
        ];
        let counts = count_common_skills(texts, 10);
        assert_eq!(
            counts[0],
            SkillCount {
                skill: "Welding".to_string(),
                count: 2
            }
        );
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn test_word_boundaries() {
        // "Java" must not match inside "JavaScript"; "AI" must not match "maintain".
        let counts = count_common_skills(["JavaScript developer who can maintain things"], 10);
        let names: Vec<&str> = counts.iter().map(|c| c.skill.as_str()).collect();
        assert_eq!(names, vec!["JavaScript"]);
    }

    #[test]
    fn test_limit_and_tie_order() {
        let counts = count_common_skills(["Python Docker Git"], 2);
        let names: Vec<&str> = counts.iter().map(|c| c.skill.as_str()).collect();
        assert_eq!(names, vec!["Docker", "Git"]);
    }
}
