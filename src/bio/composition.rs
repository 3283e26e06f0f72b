//! Base composition of a single nucleotide sequence
//!
//! Everything here is a pure function of the input bytes, so the same code
//! backs single-record queries and bulk aggregation.

use serde::{Deserialize, Serialize};

/// Symbols a sequence may consist of to be considered valid
pub const VALID_BASES: &[u8] = b"ATCGN";

/// Occurrence counts for the recognised bases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseCounts {
    pub a: u64,
    pub t: u64,
    pub c: u64,
    pub g: u64,
    pub n: u64,
}

impl BaseCounts {
    pub fn total(&self) -> u64 {
        self.a + self.t + self.c + self.g + self.n
    }

    /// Elementwise `self - other`
    pub fn delta(&self, other: &BaseCounts) -> BaseDelta {
        BaseDelta {
            a: self.a as i64 - other.a as i64,
            t: self.t as i64 - other.t as i64,
            c: self.c as i64 - other.c as i64,
            g: self.g as i64 - other.g as i64,
            n: self.n as i64 - other.n as i64,
        }
    }
}

impl std::ops::Add for BaseCounts {
    type Output = BaseCounts;

    fn add(self, rhs: BaseCounts) -> BaseCounts {
        BaseCounts {
            a: self.a + rhs.a,
            t: self.t + rhs.t,
            c: self.c + rhs.c,
            g: self.g + rhs.g,
            n: self.n + rhs.n,
        }
    }
}

impl std::ops::AddAssign for BaseCounts {
    fn add_assign(&mut self, rhs: BaseCounts) {
        *self = *self + rhs;
    }
}

/// Signed per-base difference between two records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseDelta {
    pub a: i64,
    pub t: i64,
    pub c: i64,
    pub g: i64,
    pub n: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub counts: BaseCounts,
    /// Total number of symbols, recognised or not
    pub length: usize,
    pub gc_content: f64,
    pub valid: bool,
}

impl Composition {
    /// Percentage breakdown in the form `A:25.0%, T:25.0%, C:25.0%, G:25.0%, N:0.0%`
    pub fn percentages(&self) -> String {
        if self.length == 0 {
            return "A:0%, T:0%, C:0%, G:0%, N:0%".to_string();
        }

        let pct = |count: u64| count as f64 * 100.0 / self.length as f64;
        format!(
            "A:{:.1}%, T:{:.1}%, C:{:.1}%, G:{:.1}%, N:{:.1}%",
            pct(self.counts.a),
            pct(self.counts.t),
            pct(self.counts.c),
            pct(self.counts.g),
            pct(self.counts.n)
        )
    }
}

/// Analyze a symbol sequence.
///
/// Counting is case-sensitive on purpose: the parser uppercases sequence lines
/// before they get here, while validity is judged case-insensitively.
pub fn analyze(sequence: &[u8]) -> Composition {
    let counts = count_bases(sequence);
    let length = sequence.len();

    Composition {
        counts,
        length,
        gc_content: gc_percentage(counts.g + counts.c, length),
        valid: is_valid_sequence(sequence),
    }
}

pub fn count_bases(sequence: &[u8]) -> BaseCounts {
    let mut counts = BaseCounts::default();

    for &base in sequence {
        match base {
            b'A' => counts.a += 1,
            b'T' => counts.t += 1,
            b'C' => counts.c += 1,
            b'G' => counts.g += 1,
            b'N' => counts.n += 1,
            _ => {}
        }
    }

    counts
}

pub fn gc_content(sequence: &[u8]) -> f64 {
    let counts = count_bases(sequence);
    gc_percentage(counts.g + counts.c, sequence.len())
}

pub fn is_valid_sequence(sequence: &[u8]) -> bool {
    !sequence.is_empty()
        && sequence
            .iter()
            .all(|&b| VALID_BASES.contains(&b.to_ascii_uppercase()))
}

fn gc_percentage(gc: u64, length: usize) -> f64 {
    if length == 0 {
        0.0
    } else {
        gc as f64 / length as f64 * 100.0
    }
}
