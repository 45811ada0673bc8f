use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use rayon::prelude::*;

use crate::models::CatalogEntry;

/// Queries shorter than this return the catalog untouched.
pub const MIN_QUERY_LEN: usize = 2;

/// Score floor per query character; matches scoring below it are noise
/// (characters scattered across a long name) and are dropped.
const SCORE_FLOOR_PER_CHAR: i64 = 4;

/// Typo-tolerant name index over one catalog snapshot. Built once per catalog
/// replacement, queried on every settled keystroke.
pub struct FuzzyIndex {
    names: Vec<String>,
}

impl FuzzyIndex {
    pub fn build(entries: &[CatalogEntry]) -> Self {
        Self {
            names: entries.iter().map(|e| e.name.to_lowercase()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Indices into the indexed catalog, best match first. Sub-minimum
    /// queries pass the whole catalog through order-preserving; ties keep
    /// catalog order so identical inputs always produce identical output.
    pub fn query(&self, text: &str) -> Vec<usize> {
        let q = text.trim().to_lowercase();
        if q.chars().count() < MIN_QUERY_LEN {
            return (0..self.names.len()).collect();
        }
        let floor = q.chars().count() as i64 * SCORE_FLOOR_PER_CHAR;
        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, usize)> = self
            .names
            .par_iter()
            .enumerate()
            .filter_map(|(i, name)| {
                matcher
                    .fuzzy_match(name, &q)
                    .filter(|score| *score >= floor)
                    .map(|score| (score, i))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.into_iter().map(|(_, i)| i).collect()
    }
}
