//! Approximate question matching
//!
//! Scores a free-text query against every known question with the
//! Ratcliff/Obershelp "gestalt" ratio and keeps the best candidates at or
//! above a similarity threshold.
//!
//! The ratio is `2 * M / T`, where `T` is the combined length of both strings
//! and `M` the number of characters in matching blocks. Blocks are found by
//! taking the longest common substring and recursing on the unmatched text to
//! its left and right.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

/// Similarity a candidate needs to count as a match unless configured otherwise
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Errors from building a matcher
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("similarity threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("match limit must be at least 1")]
    InvalidLimit,
}

/// A candidate that cleared the threshold
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch<'a> {
    pub candidate: &'a str,
    /// Position in the candidate list
    pub index: usize,
    pub score: f64,
}

/// Character positions of one side of a comparison
struct Sequence {
    chars: Vec<char>,
    positions: HashMap<char, Vec<usize>>,
    counts: HashMap<char, usize>,
}

impl Sequence {
    fn new(s: &str) -> Self {
        let chars: Vec<char> = s.chars().collect();
        let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
        let mut counts: HashMap<char, usize> = HashMap::new();
        for (j, c) in chars.iter().enumerate() {
            positions.entry(*c).or_default().push(j);
            *counts.entry(*c).or_default() += 1;
        }
        Self {
            chars,
            positions,
            counts,
        }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }
}

/// Longest block `a[i..i+k] == b[j..j+k]` inside the given windows.
///
/// Among equally long blocks the one starting earliest in `a` wins, then the
/// one starting earliest in `b`.
fn longest_match(
    a: &[char],
    b: &Sequence,
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // run length of the match ending at (i - 1, j), keyed by j
    let mut prev: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: HashMap<usize, usize> = HashMap::new();
        if let Some(js) = b.positions.get(c) {
            for &j in js {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = j.checked_sub(1).and_then(|p| prev.get(&p)).copied().unwrap_or(0) + 1;
                next.insert(j, k);
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }
        }
        prev = next;
    }

    (best_i, best_j, best_k)
}

/// Total size of all matching blocks between `a` and `b`
fn matching_characters(a: &[char], b: &Sequence) -> usize {
    let mut total = 0;
    let mut pending = vec![((0, a.len()), (0, b.len()))];

    while let Some(((alo, ahi), (blo, bhi))) = pending.pop() {
        let (i, j, k) = longest_match(a, b, (alo, ahi), (blo, bhi));
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            pending.push(((alo, i), (blo, j)));
        }
        if i + k < ahi && j + k < bhi {
            pending.push(((i + k, ahi), (j + k, bhi)));
        }
    }

    total
}

fn ratio_of(matches: usize, total_len: usize) -> f64 {
    if total_len == 0 {
        1.0
    } else {
        2.0 * matches as f64 / total_len as f64
    }
}

/// Upper bound from lengths alone
fn length_bound(a_len: usize, b_len: usize) -> f64 {
    ratio_of(a_len.min(b_len), a_len + b_len)
}

/// Upper bound from shared characters, ignoring order
fn overlap_bound(a: &[char], b: &Sequence) -> f64 {
    let mut available = b.counts.clone();
    let mut shared = 0;
    for c in a {
        if let Some(n) = available.get_mut(c) {
            if *n > 0 {
                *n -= 1;
                shared += 1;
            }
        }
    }
    ratio_of(shared, a.len() + b.len())
}

/// Similarity of `a` and `b` in `[0, 1]`; identical strings score 1.0
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b = Sequence::new(b);
    ratio_of(matching_characters(&a, &b), a.len() + b.len())
}

/// Every candidate scoring at least `threshold` against `query`, best first.
///
/// Equal scores keep candidate order, so the earliest candidate wins a tie.
/// At most `limit` matches are returned.
pub fn find_close_matches<'a, T: AsRef<str>>(
    query: &str,
    candidates: &'a [T],
    threshold: f64,
    limit: usize,
) -> Vec<ScoredMatch<'a>> {
    let query_seq = Sequence::new(query);
    let mut matches = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        let candidate = candidate.as_ref();
        let chars: Vec<char> = candidate.chars().collect();

        if length_bound(chars.len(), query_seq.len()) < threshold
            || overlap_bound(&chars, &query_seq) < threshold
        {
            continue;
        }

        let score = ratio_of(
            matching_characters(&chars, &query_seq),
            chars.len() + query_seq.len(),
        );
        if score >= threshold {
            matches.push(ScoredMatch {
                candidate,
                index,
                score,
            });
        }
    }

    // stable: ties stay in candidate order
    matches.sort_by(|x, y| y.score.total_cmp(&x.score));
    matches.truncate(limit);
    matches
}

/// The single best candidate at or above `threshold`, if any
pub fn find_best_match<'a, T: AsRef<str>>(
    query: &str,
    candidates: &'a [T],
    threshold: f64,
) -> Option<&'a str> {
    let best = find_close_matches(query, candidates, threshold, 1)
        .into_iter()
        .next();
    match &best {
        Some(m) => debug!(query, candidate = m.candidate, score = m.score, "Best match"),
        None => debug!(query, threshold, "No candidate cleared the threshold"),
    }
    best.map(|m| m.candidate)
}

/// Configured matching policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matcher {
    threshold: f64,
    limit: usize,
}

impl Matcher {
    pub fn new(threshold: f64) -> Result<Self, MatchError> {
        Self::with_limit(threshold, 1)
    }

    pub fn with_limit(threshold: f64, limit: usize) -> Result<Self, MatchError> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(MatchError::InvalidThreshold(threshold));
        }
        if limit == 0 {
            return Err(MatchError::InvalidLimit);
        }
        Ok(Self { threshold, limit })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn best_match<'a, T: AsRef<str>>(&self, query: &str, candidates: &'a [T]) -> Option<&'a str> {
        find_best_match(query, candidates, self.threshold)
    }

    pub fn close_matches<'a, T: AsRef<str>>(
        &self,
        query: &str,
        candidates: &'a [T],
    ) -> Vec<ScoredMatch<'a>> {
        find_close_matches(query, candidates, self.threshold, self.limit)
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            limit: 1,
        }
    }
}
