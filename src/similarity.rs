//! Matching-blocks similarity (Ratcliff/Obershelp).
//!
//! `ratio(a, b)` returns `2*M / T` where `M` is the total size of the
//! matching blocks found by recursively taking the longest common
//! contiguous block and `T` is the combined length of both sequences.
//! The block search follows difflib's `SequenceMatcher` with no junk
//! predicate and auto-junk enabled: when `b` has 200 or more elements,
//! any element occurring more than `len(b)/100 + 1` times is left out of
//! the index used to seed matches. The cross-check threshold is tuned
//! against exactly this measure, so it must not be swapped for another one.
//!
//! Sequences are compared as Unicode scalar values.

use std::collections::HashMap;

/// Below this length of `b` the popularity heuristic is off.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Similarity used by the cross-checker: case-insensitive `ratio`, and
/// `0.0` whenever either side has no content.
pub fn content_similarity(text1: &str, text2: &str) -> f64 {
    if text1.trim().is_empty() || text2.trim().is_empty() {
        return 0.0;
    }
    ratio(&text1.to_lowercase(), &text2.to_lowercase())
}

/// Raw matching-blocks ratio in `[0.0, 1.0]`. Two empty strings score `1.0`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matches = SequenceMatcher::new(&a, &b).matching_characters();
    2.0 * matches as f64 / total as f64
}

/// A matched block: `a[a_start..a_start+size] == b[b_start..b_start+size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Block {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

struct SequenceMatcher<'s> {
    a: &'s [char],
    b: &'s [char],
    /// Positions of each element of `b`, ascending, minus popular elements.
    b2j: HashMap<char, Vec<usize>>,
}

impl<'s> SequenceMatcher<'s> {
    fn new(a: &'s [char], b: &'s [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        let n = b.len();
        if n >= AUTOJUNK_MIN_LEN {
            let ntest = n / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= ntest);
        }

        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` x `b[blo..bhi]`.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    /// The block is then widened over equal neighbours, which lets it
    /// absorb popular elements that were left out of the index.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let (a, b) = (self.a, self.b);
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);

        // j2len[j] = length of the match ending at a[i-1], b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut new_j2len: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = if j > 0 { j2len.get(&(j - 1)).copied().unwrap_or(0) } else { 0 };
                    let k = prev + 1;
                    new_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = new_j2len;
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

        Block { a_start: best_i, b_start: best_j, size: best_size }
    }

    /// All matching blocks, ordered by position.
    fn matching_blocks(&self) -> Vec<Block> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.size == 0 {
                continue;
            }
            let (i, j, k) = (block.a_start, block.b_start, block.size);
            blocks.push(block);
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        blocks.sort();
        blocks
    }

    fn matching_characters(&self) -> usize {
        self.matching_blocks().iter().map(|b| b.size).sum()
    }
}

/// Matching blocks between two strings, for diagnostics.
pub fn matching_blocks(a: &str, b: &str) -> Vec<Block> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    SequenceMatcher::new(&a, &b).matching_blocks()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
