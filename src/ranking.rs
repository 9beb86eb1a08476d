//! Candidate ranking
//!
//! Orders search results by how well their title matches the user's query,
//! using a partial-substring similarity: the shorter string is slid across
//! the longer one and the best local match wins. Searching "breaking bad"
//! therefore scores "Breaking Bad (2023)" as a perfect match.

use crate::metadata_retrieval::SeriesCandidate;
use rapidfuzz::distance::indel;

/// Number of candidates kept after ranking unless told otherwise.
pub const DEFAULT_TOP_N: usize = 10;

/// Ranks candidates by descending title similarity and keeps the best `top_n`.
///
/// The sort is stable: candidates with equal scores keep their original
/// relative order.
pub fn rank(query: &str, candidates: &[SeriesCandidate], top_n: usize) -> Vec<SeriesCandidate> {
    let mut scored: Vec<(f64, &SeriesCandidate)> = candidates
        .iter()
        .map(|candidate| (partial_ratio(query, &candidate.title), candidate))
        .collect();

    // `sort_by` is stable
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(top_n)
        .map(|(_, candidate)| candidate.clone())
        .collect()
}

/// Case-insensitive partial similarity of two strings, in `0.0..=100.0`.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    if a.len() == b.len() {
        // Equal lengths have no natural "shorter" side
        return best_window_ratio(&a, &b).max(best_window_ratio(&b, &a));
    }

    if a.len() < b.len() {
        best_window_ratio(&a, &b)
    } else {
        best_window_ratio(&b, &a)
    }
}

/// Best `ratio` of `needle` against every window of `haystack` with the
/// needle's length, including windows that overhang either end.
fn best_window_ratio(needle: &[char], haystack: &[char]) -> f64 {
    let m = needle.len() as isize;
    let n = haystack.len() as isize;
    let mut best = 0.0f64;

    for start in (1 - m)..n {
        let from = start.max(0) as usize;
        let to = (start + m).min(n) as usize;
        let score = ratio(needle, &haystack[from..to]);

        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }

    best
}

/// Normalized indel similarity scaled to `0.0..=100.0`.
fn ratio(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }

    100.0 * indel::normalized_similarity(a.iter().copied(), b.iter().copied())
}
