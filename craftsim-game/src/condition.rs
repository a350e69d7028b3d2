//! Per-turn craft conditions and the table that drives random transitions.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::params::ParamsError;

/// Number of distinct conditions.
pub const CONDITION_COUNT: usize = 10;

/// Per-turn "weather" that alters success rates, costs, or potency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Condition {
    #[default]
    Normal,
    Good,
    Excellent,
    Poor,
    Centered,
    Sturdy,
    Pliant,
    Malleable,
    Primed,
    GoodOmen,
}

impl Condition {
    /// All conditions in table order.
    pub const ALL: [Self; CONDITION_COUNT] = [
        Self::Normal,
        Self::Good,
        Self::Excellent,
        Self::Poor,
        Self::Centered,
        Self::Sturdy,
        Self::Pliant,
        Self::Malleable,
        Self::Primed,
        Self::GoodOmen,
    ];

    /// Position of this condition in a transition table.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
            Self::Poor => "Poor",
            Self::Centered => "Centered",
            Self::Sturdy => "Sturdy",
            Self::Pliant => "Pliant",
            Self::Malleable => "Malleable",
            Self::Primed => "Primed",
            Self::GoodOmen => "Good Omen",
        }
    }

    /// Good or Excellent, the conditions that unlock gated actions.
    #[must_use]
    pub const fn is_good_or_better(self) -> bool {
        matches!(self, Self::Good | Self::Excellent)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Probabilities of rolling each condition, indexed by [`Condition::index`].
///
/// Entry 0 (Normal) is implicit: it always holds whatever share the other
/// entries leave over. Tables may be shorter than [`CONDITION_COUNT`]; missing
/// trailing entries have probability zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionTable {
    weights: SmallVec<[f64; CONDITION_COUNT]>,
}

impl ConditionTable {
    /// Build a table from raw weights; the first entry is replaced by the remainder.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError`] if the table is empty, longer than the number of
    /// conditions, holds values outside `[0, 1]`, or sums above 1.
    pub fn new(weights: &[f64]) -> Result<Self, ParamsError> {
        let mut table = Self {
            weights: SmallVec::from_slice(weights),
        };
        table.normalize_remainder();
        table.validate()?;
        Ok(table)
    }

    /// Standard table for non-expert recipes: Good and Excellent only.
    #[must_use]
    pub fn normal(level: u32) -> Self {
        let good = if level >= 63 { 0.25 } else { 0.2 };
        let mut table = Self {
            weights: SmallVec::from_slice(&[1.0, good, 0.04]),
        };
        table.normalize_remainder();
        table
    }

    /// Expert relic table (tier 1).
    #[must_use]
    pub fn relic_tier1() -> Self {
        let mut table = Self {
            weights: SmallVec::from_slice(&[1.0, 0.03, 0.0, 0.0, 0.12, 0.12, 0.12, 0.0, 0.0, 0.12]),
        };
        table.normalize_remainder();
        table
    }

    /// Probability of rolling `condition`.
    #[must_use]
    pub fn probability(&self, condition: Condition) -> f64 {
        self.weights.get(condition.index()).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Pick the condition selected by a uniform roll in `[0, 1)`.
    ///
    /// Non-normal entries are consumed in table order; a roll that survives all
    /// of them lands on Normal.
    #[must_use]
    pub fn pick(&self, roll: f64) -> Condition {
        let mut remaining = roll;
        for (index, weight) in self.weights.iter().enumerate().skip(1) {
            remaining -= weight;
            if remaining < 0.0 {
                return Condition::from_index(index).unwrap_or(Condition::Normal);
            }
        }
        Condition::Normal
    }

    /// # Errors
    ///
    /// Returns [`ParamsError`] describing the first violated table invariant.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.weights.is_empty() || self.weights.len() > CONDITION_COUNT {
            return Err(ParamsError::ConditionTableLength {
                len: self.weights.len(),
                max: CONDITION_COUNT,
            });
        }
        for (index, weight) in self.weights.iter().enumerate().skip(1) {
            if !weight.is_finite() || !(0.0..=1.0).contains(weight) {
                return Err(ParamsError::ConditionProbability {
                    condition: Condition::from_index(index).unwrap_or_default(),
                    value: *weight,
                });
            }
        }
        let total = self.special_share();
        if total > 1.0 + f64::EPSILON {
            return Err(ParamsError::ConditionTableSum { total });
        }
        Ok(())
    }

    fn special_share(&self) -> f64 {
        self.weights.iter().skip(1).sum()
    }

    pub(crate) fn normalize_remainder(&mut self) {
        let remainder = (1.0 - self.special_share()).max(0.0);
        if let Some(first) = self.weights.first_mut() {
            *first = remainder;
        }
    }
}

impl Default for ConditionTable {
    fn default() -> Self {
        Self::relic_tier1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_table_grows_good_share_at_63() {
        let low = ConditionTable::normal(50);
        let high = ConditionTable::normal(63);
        assert!((low.probability(Condition::Good) - 0.2).abs() < f64::EPSILON);
        assert!((high.probability(Condition::Good) - 0.25).abs() < f64::EPSILON);
        assert!((high.probability(Condition::Normal) - 0.71).abs() < 1e-9);
        assert!(high.probability(Condition::Pliant).abs() < f64::EPSILON);
    }

    #[test]
    fn pick_walks_entries_in_order() {
        let table = ConditionTable::relic_tier1();
        assert_eq!(table.pick(0.0), Condition::Good);
        assert_eq!(table.pick(0.029), Condition::Good);
        assert_eq!(table.pick(0.05), Condition::Centered);
        assert_eq!(table.pick(0.16), Condition::Sturdy);
        assert_eq!(table.pick(0.28), Condition::Pliant);
        assert_eq!(table.pick(0.40), Condition::GoodOmen);
        assert_eq!(table.pick(0.52), Condition::Normal);
        assert_eq!(table.pick(0.999), Condition::Normal);
    }

    #[test]
    fn rejects_overfull_tables() {
        let err = ConditionTable::new(&[1.0, 0.6, 0.6]).unwrap_err();
        assert!(matches!(err, ParamsError::ConditionTableSum { .. }));
        let err = ConditionTable::new(&[1.0, -0.1]).unwrap_err();
        assert!(matches!(
            err,
            ParamsError::ConditionProbability {
                condition: Condition::Good,
                ..
            }
        ));
        assert!(ConditionTable::new(&[]).is_err());
        assert!(ConditionTable::new(&[0.0; 11]).is_err());
    }

    #[test]
    fn new_recomputes_normal_share() {
        let table = ConditionTable::new(&[0.0, 0.5]).unwrap();
        assert!((table.probability(Condition::Normal) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn table_round_trips_as_plain_list() {
        let json = serde_json::to_string(&ConditionTable::normal(90)).unwrap();
        assert!(json.starts_with('['));
        let back: ConditionTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ConditionTable::normal(90));
    }
}
