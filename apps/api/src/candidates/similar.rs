//! Similar candidates: overlap of strength vocabulary plus closeness of fit rating.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::models::analysis::ResumeAnalysisRow;

pub const DEFAULT_SIMILAR_LIMIT: usize = 5;
const MIN_SIMILARITY: f64 = 0.1;

#[derive(Debug, Serialize)]
pub struct SimilarCandidate {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub filename: String,
    pub overall_fit_rating: Option<f64>,
    pub similarity_score: f64,
    pub strengths: Vec<String>,
}

fn strength_words(strengths: &[String]) -> HashSet<String> {
    strengths
        .iter()
        .flat_map(|s| s.split_whitespace())
        .map(str::to_lowercase)
        .collect()
}

/// Mean of word overlap (relative to the reference) and rating closeness.
pub fn similarity(reference: &ResumeAnalysisRow, other: &ResumeAnalysisRow) -> f64 {
    let reference_words = strength_words(&reference.candidate_strengths);
    let other_words = strength_words(&other.candidate_strengths);
    let overlap = reference_words.intersection(&other_words).count() as f64
        / reference_words.len().max(1) as f64;

    let rating = match (reference.overall_fit_rating, other.overall_fit_rating) {
        (Some(a), Some(b)) => (1.0 - (a - b).abs() / 10.0).max(0.0),
        _ => 0.0,
    };

    (overlap + rating) / 2.0
}

/// Ranks `candidates` against `reference`. Candidates without strengths are skipped,
/// as is the reference itself.
pub fn rank_similar(
    reference: &ResumeAnalysisRow,
    candidates: Vec<ResumeAnalysisRow>,
    limit: usize,
) -> Vec<SimilarCandidate> {
    let mut scored: Vec<(f64, ResumeAnalysisRow)> = candidates
        .into_iter()
        .filter(|c| c.id != reference.id && !c.candidate_strengths.is_empty())
        .map(|c| (similarity(reference, &c), c))
        .filter(|(score, _)| *score > MIN_SIMILARITY)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.truncate(limit);

    scored
        .into_iter()
        .map(|(score, c)| SimilarCandidate {
            id: c.id,
            name: c.display_name(),
            email: c.email,
            filename: c.filename,
            overall_fit_rating: c.overall_fit_rating,
            similarity_score: (score * 100.0).round() / 100.0,
            strengths: c.candidate_strengths,
        })
        .collect()
}
