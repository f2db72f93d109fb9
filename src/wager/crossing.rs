//! Crossing / Joda-Cut combination generator.
//!
//! Expands a short digit sequence into every ordered 2-digit pair (digits
//! may pair with themselves). The Joda-Cut view drops same-digit pairs
//! such as `"22"`. Generation is pure and cheap; the form calls it on
//! every keystroke, so invalid input yields an empty set instead of an
//! error.

use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Shortest digit sequence that produces combinations.
pub const MIN_SEQUENCE_LEN: usize = 2;

/// Longest digit sequence accepted.
pub const MAX_SEQUENCE_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Combination types
// ---------------------------------------------------------------------------

/// Which view of the generated set a combination belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombinationClass {
    Crossing,
    JodaCut,
}

/// One generated 2-digit number with its per-unit stake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
    pub digits: String,
    pub stake: Decimal,
    pub class: CombinationClass,
}

impl Combination {
    /// A "Joda" pair: both digits equal.
    pub fn is_joda(&self) -> bool {
        let bytes = self.digits.as_bytes();
        bytes.len() == 2 && bytes[0] == bytes[1]
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.digits, self.stake)
    }
}

/// Result of one generation: the full Crossing list and its Joda-Cut subset.
///
/// Both lists are sorted ascending by digit string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CombinationSet {
    stake: Decimal,
    crossing: Vec<Combination>,
    joda_cut: Vec<Combination>,
}

impl CombinationSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.crossing.is_empty()
    }

    /// Per-unit stake every combination carries (zero for an empty set).
    pub fn stake(&self) -> Decimal {
        self.stake
    }

    pub fn crossing(&self) -> &[Combination] {
        &self.crossing
    }

    pub fn joda_cut(&self) -> &[Combination] {
        &self.joda_cut
    }

    /// The selection that would be submitted given the Joda-Cut toggle.
    pub fn active(&self, joda_cut: bool) -> &[Combination] {
        if joda_cut {
            &self.joda_cut
        } else {
            &self.crossing
        }
    }

    // `generate` only builds sets whose crossing total fits in a Decimal,
    // and the Joda-Cut selection is never larger.
    pub fn crossing_total(&self) -> Decimal {
        Decimal::from(self.crossing.len()) * self.stake
    }

    pub fn joda_cut_total(&self) -> Decimal {
        Decimal::from(self.joda_cut.len()) * self.stake
    }

    /// Total stake of the active selection.
    pub fn total(&self, joda_cut: bool) -> Decimal {
        Decimal::from(self.active(joda_cut).len()) * self.stake
    }

    /// Digit strings of the active selection, in display order.
    pub fn numbers(&self, joda_cut: bool) -> Vec<String> {
        self.active(joda_cut)
            .iter()
            .map(|c| c.digits.clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Whether `sequence` is 2–4 ASCII decimal digits.
pub fn is_valid_sequence(sequence: &str) -> bool {
    (MIN_SEQUENCE_LEN..=MAX_SEQUENCE_LEN).contains(&sequence.len())
        && sequence.bytes().all(|b| b.is_ascii_digit())
}

/// Generate the Crossing and Joda-Cut combinations for `sequence`.
///
/// Returns an empty set when the sequence is not 2–4 digits, the stake is
/// not positive, or the total stake would overflow. Identical inputs
/// always produce identical output.
pub fn generate(sequence: &str, stake: Decimal) -> CombinationSet {
    if !is_valid_sequence(sequence) || stake <= Decimal::ZERO {
        return CombinationSet::empty();
    }

    let digits: Vec<char> = sequence.chars().collect();

    // BTreeSet both collapses duplicate pairs and yields ascending order.
    let pairs: BTreeSet<String> = digits
        .iter()
        .flat_map(|a| digits.iter().map(move |b| format!("{a}{b}")))
        .collect();

    let crossing: Vec<Combination> = pairs
        .into_iter()
        .map(|digits| Combination {
            digits,
            stake,
            class: CombinationClass::Crossing,
        })
        .collect();

    if Decimal::from(crossing.len()).checked_mul(stake).is_none() {
        return CombinationSet::empty();
    }

    let joda_cut: Vec<Combination> = crossing
        .iter()
        .filter(|c| !c.is_joda())
        .map(|c| Combination {
            class: CombinationClass::JodaCut,
            ..c.clone()
        })
        .collect();

    CombinationSet {
        stake,
        crossing,
        joda_cut,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
