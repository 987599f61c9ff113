//! Similarity scoring — character-alignment ratio blended with keyterm
//! overlap.
//!
//! The lexical ratio tolerates paraphrasing; the overlap term rewards exact
//! vocabulary matches that character alignment under-weights on long texts.
//! Weights live in constants.rs (0.7 lexical / 0.3 overlap).

use std::collections::HashMap;

use rusqlite::Connection;

use crate::constants::{LEXICAL_WEIGHT, MIN_TERM_LENGTH, TERM_OVERLAP_WEIGHT};
use crate::processing::keyterms;
use crate::scenario::{ScenarioMatch, TermType};
use crate::storage::scenarios::ScenarioStore;
use crate::HindsightResult;

/// Longest matching block between `a[alo..ahi]` and `b[blo..bhi]`.
/// Returns (start in a, start in b, length) of the earliest longest match.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &c) in b.iter().enumerate().take(bhi).skip(blo) {
        b2j.entry(c).or_default().push(j);
    }

    let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0usize);
    // j2len[j] = length of the longest match ending at a[i], b[j]
    let mut j2len: HashMap<usize, usize> = HashMap::new();
    for (i, &c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut new_j2len: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(&c) {
            for &j in positions {
                let k = if j > blo {
                    j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                new_j2len.insert(j, k);
                if k > bestsize {
                    besti = i + 1 - k;
                    bestj = j + 1 - k;
                    bestsize = k;
                }
            }
        }
        j2len = new_j2len;
    }
    (besti, bestj, bestsize)
}

/// Total characters covered by the longest-common-matching-block alignment
/// (Ratcliff/Obershelp): take the longest match, then recurse on the pieces
/// left of it and right of it.
fn total_matched(a: &[char], b: &[char]) -> usize {
    let mut queue = vec![(0usize, a.len(), 0usize, b.len())];
    let mut matched = 0;
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k > 0 {
            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
    }
    matched
}

/// Normalized resemblance ratio between two strings, in [0, 1].
///
/// Twice the matched character count divided by the combined length.
/// 1.0 for identical strings (two empty strings included), 0.0 when no
/// block of length >= 1 matches. Callers fold case beforehand.
pub fn lexical_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let combined = a.len() + b.len();
    if combined == 0 {
        return 1.0;
    }
    2.0 * total_matched(&a, &b) as f64 / combined as f64
}

pub struct SimilarityEngine;

impl SimilarityEngine {
    /// Score every stored scenario against `query` and return those at or
    /// above `threshold`, best first; equal scores order by ascending id so
    /// results never depend on storage iteration order.
    pub fn find_similar(
        conn: &Connection,
        query: &str,
        threshold: f64,
    ) -> HindsightResult<Vec<ScenarioMatch>> {
        let query_terms = keyterms::extract(query, MIN_TERM_LENGTH);
        let query_folded = query.to_lowercase();

        let mut matches = Vec::new();
        for scenario in ScenarioStore::list_all(conn)? {
            let lexical = lexical_ratio(&query_folded, &scenario.user_query.to_lowercase());

            let stored_terms = ScenarioStore::keyterms_for(conn, scenario.id, TermType::Query)?;
            // The denominator is the query's term count only: a long stored
            // query with many extra terms is not penalized (known asymmetry,
            // preserved).
            let overlap = if query_terms.is_empty() {
                0.0
            } else {
                query_terms.intersection(&stored_terms).count() as f64 / query_terms.len() as f64
            };

            let score = LEXICAL_WEIGHT * lexical + TERM_OVERLAP_WEIGHT * overlap;
            if score >= threshold {
                matches.push(ScenarioMatch { scenario, score });
            }
        }

        matches.sort_by(|x, y| {
            y.score
                .partial_cmp(&x.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(x.scenario.id.cmp(&y.scenario.id))
        });

        tracing::debug!(
            query_len = query.len(),
            threshold = threshold,
            matches = matches.len(),
            "Similarity scan complete"
        );
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::scenarios::ScenarioStore;
    use crate::test_helpers::{setup_db, ScenarioBuilder};

    #[test]
    fn test_ratio_identical_strings() {
        assert_eq!(lexical_ratio("strawberry", "strawberry"), 1.0);
    }

    #[test]
    fn test_ratio_both_empty() {
        assert_eq!(lexical_ratio("", ""), 1.0);
    }

    #[test]
    fn test_ratio_disjoint_strings() {
        assert_eq!(lexical_ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_ratio_known_value() {
        // Matching blocks of "abcd" vs "bcde" cover "bcd": 2*3/8.
        assert!((lexical_ratio("abcd", "bcde") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_counts_all_blocks() {
        // "ab" and "cd" both match around the gap: 2*4/10.
        let r = lexical_ratio("abxcd", "abycd");
        assert!((r - 8.0 / 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_find_similar_scores_and_ranks() {
        let conn = setup_db();
        ScenarioStore::insert(
            &conn,
            &ScenarioBuilder::new()
                .query("How many r's are in strawberry?")
                .build(),
        )
        .unwrap();
        ScenarioStore::insert(
            &conn,
            &ScenarioBuilder::new()
                .query("What is the tallest mountain on Earth?")
                .build(),
        )
        .unwrap();

        let matches =
            SimilarityEngine::find_similar(&conn, "How many r letters does strawberry have?", 0.35)
                .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].scenario.id, 1);
        assert!(matches[0].score >= 0.35);
    }

    #[test]
    fn test_find_similar_empty_query_uses_lexical_only() {
        let conn = setup_db();
        ScenarioStore::insert(&conn, &ScenarioBuilder::new().query("abc").build()).unwrap();
        // No extractable terms: overlap contributes 0, lexical alone decides.
        let matches = SimilarityEngine::find_similar(&conn, "abc", 0.5).unwrap();
        assert_eq!(matches.len(), 1);
        assert!((matches[0].score - LEXICAL_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_find_similar_threshold_monotonicity() {
        let conn = setup_db();
        for query in [
            "How many r's are in strawberry?",
            "How do I count letters in a word?",
            "Counting r occurrences in strawberry",
        ] {
            ScenarioStore::insert(&conn, &ScenarioBuilder::new().query(query).build()).unwrap();
        }

        let query = "How many r letters does strawberry have?";
        let loose = SimilarityEngine::find_similar(&conn, query, 0.2).unwrap();
        let strict = SimilarityEngine::find_similar(&conn, query, 0.5).unwrap();

        let loose_ids: Vec<i64> = loose.iter().map(|m| m.scenario.id).collect();
        for m in &strict {
            assert!(loose_ids.contains(&m.scenario.id));
        }
    }

    #[test]
    fn test_find_similar_is_deterministic() {
        let conn = setup_db();
        for query in ["counting letters", "counting words", "counting lines"] {
            ScenarioStore::insert(&conn, &ScenarioBuilder::new().query(query).build()).unwrap();
        }

        let first: Vec<(i64, f64)> = SimilarityEngine::find_similar(&conn, "counting things", 0.1)
            .unwrap()
            .iter()
            .map(|m| (m.scenario.id, m.score))
            .collect();
        let second: Vec<(i64, f64)> = SimilarityEngine::find_similar(&conn, "counting things", 0.1)
            .unwrap()
            .iter()
            .map(|m| (m.scenario.id, m.score))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_find_similar_ties_break_by_id() {
        let conn = setup_db();
        // Two identical stored queries score identically.
        ScenarioStore::insert(&conn, &ScenarioBuilder::new().query("counting letters").build())
            .unwrap();
        ScenarioStore::insert(&conn, &ScenarioBuilder::new().query("counting letters").build())
            .unwrap();

        let matches = SimilarityEngine::find_similar(&conn, "counting letters", 0.1).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].scenario.id, 1);
        assert_eq!(matches[1].scenario.id, 2);
    }
}
