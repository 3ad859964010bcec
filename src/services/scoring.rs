use std::collections::BTreeMap;

use crate::models::question::QuestionType;

/// A per-question score tagged with the dimensions it rolls up into.
#[derive(Debug, Clone)]
pub struct ScoredQuestion {
    pub question_id: u32,
    pub category: String,
    pub question_type: QuestionType,
    pub score: u8,
}

#[derive(Debug, Clone)]
pub struct AggregateScores {
    pub overall: u8,
    pub by_category: BTreeMap<String, u8>,
    pub by_type: BTreeMap<QuestionType, u8>,
}

/// Arithmetic mean rounded to the nearest integer, ties rounding up.
pub fn mean_rounded(values: &[u8]) -> u8 {
    if values.is_empty() {
        return 0;
    }
    let sum: u32 = values.iter().map(|v| u32::from(*v)).sum();
    let n = values.len() as u32;
    ((2 * sum + n) / (2 * n)) as u8
}

/// Rolls per-question scores into category means, type means and the overall
/// mean. Every category and type present in the input appears as a key, even
/// with a single question behind it.
pub fn aggregate(scored: &[ScoredQuestion]) -> AggregateScores {
    let mut per_category: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    let mut per_type: BTreeMap<QuestionType, Vec<u8>> = BTreeMap::new();
    let mut all = Vec::with_capacity(scored.len());

    for sq in scored {
        per_category.entry(sq.category.clone()).or_default().push(sq.score);
        per_type.entry(sq.question_type).or_default().push(sq.score);
        all.push(sq.score);
    }

    AggregateScores {
        overall: mean_rounded(&all),
        by_category: per_category
            .into_iter()
            .map(|(k, v)| (k, mean_rounded(&v)))
            .collect(),
        by_type: per_type
            .into_iter()
            .map(|(k, v)| (k, mean_rounded(&v)))
            .collect(),
    }
}
