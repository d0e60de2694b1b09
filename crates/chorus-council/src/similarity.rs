//! # Textual Similarity Scorer
//!
//! Gestalt pattern matching (Ratcliff/Obershelp) between two strings.
//!
//! ## Algorithm
//!
//! 1. Find the longest common contiguous block of `a` and `b`.
//! 2. Recurse on the unmatched regions to the left and to the right of it.
//! 3. Sum the sizes of every block found (`M`) and compute:
//!
//! ```text
//! ratio = 2 * M / (len(a) + len(b))
//! ```
//!
//! Lengths are counted in Unicode scalar values, not bytes.
//!
//! | Input | Ratio |
//! |-------|-------|
//! | identical strings (including two empty ones) | 1.0 |
//! | no character in common | 0.0 |
//! | one side empty, other not | 0.0 |
//!
//! ## Popular Characters
//!
//! When `b` has at least [`POPULAR_MIN_LEN`] characters, any character
//! occurring in more than `len(b) / 100 + 1` positions of `b` is "popular"
//! and cannot seed a matching block. A block found from other characters
//! still extends through popular ones on either side. This is the same
//! heuristic Python's `difflib.SequenceMatcher` applies by default, so
//! scores agree with it on long responses too. The ratio is therefore not
//! symmetric once `b` is long:
//!
//! ```text
//! similarity("b" + "a" * 10, "a" * 200) == 0.0      // 'a' is popular in b
//! similarity("a" * 200, "b" + "a" * 10) == 20 / 211 // b is short
//! ```
//!
//! ## References
//!
//! - Ratcliff, J. W. & Metzener, D. (1988). "Pattern Matching: The Gestalt
//!   Approach". *Dr. Dobb's Journal*, 13(7).

use std::collections::HashMap;

/// Length of `b` from which popular characters stop seeding matches.
pub const POPULAR_MIN_LEN: usize = 200;

/// Computes the normalized similarity ratio of two strings.
///
/// Returns a value in `[0.0, 1.0]`. Deterministic, infallible and free of
/// side effects.
///
/// # Example
///
/// ```rust
/// use chorus_council::similarity;
///
/// assert_eq!(similarity("consensus", "consensus"), 1.0);
/// assert_eq!(similarity("abc", "xyz"), 0.0);
/// assert!((similarity("abcd", "bcde") - 0.75).abs() < 1e-9);
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matching_characters(&a, &b);
    2.0 * matched as f64 / total as f64
}

/// Total size of all matching blocks between `a` and `b`.
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let positions = index_positions(b);
    let mut matched = 0;

    // Explicit work queue instead of recursion; long responses would
    // otherwise nest deeply.
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, &positions, (alo, ahi), (blo, bhi));
        if size == 0 {
            continue;
        }

        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Maps each character of `b` to its ascending positions, leaving out
/// popular characters.
fn index_positions(b: &[char]) -> HashMap<char, Vec<usize>> {
    let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        positions.entry(*c).or_default().push(j);
    }

    if b.len() >= POPULAR_MIN_LEN {
        let limit = b.len() / 100 + 1;
        positions.retain(|_, js| js.len() <= limit);
    }
    positions
}

/// Longest block `a[i..i+size] == b[j..j+size]` inside the given ranges.
///
/// Ties resolve to the block starting earliest in `a`, then earliest in `b`.
/// The winner is then widened over equal neighbours, which only changes
/// anything when popular characters were left out of `positions`.
fn longest_match(
    a: &[char],
    b: &[char],
    positions: &HashMap<char, Vec<usize>>,
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

    // run_ending_at[j] = length of the common run ending at (i - 1, j)
    let mut run_ending_at: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: HashMap<usize, usize> = HashMap::new();

        if let Some(js) = positions.get(c) {
            for &j in js {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }

                let run = j
                    .checked_sub(1)
                    .and_then(|prev| run_ending_at.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next.insert(j, run);

                if run > best_size {
                    best_i = i + 1 - run;
                    best_j = j + 1 - run;
                    best_size = run;
                }
            }
        }

        run_ending_at = next;
    }

    while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
        best_i -= 1;
        best_j -= 1;
        best_size += 1;
    }
    while best_i + best_size < ahi
        && best_j + best_size < bhi
        && a[best_i + best_size] == b[best_j + best_size]
    {
        best_size += 1;
    }

    (best_i, best_j, best_size)
}
