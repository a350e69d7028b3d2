//! Batch driver: many independent seeded attempts folded into one summary.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::condition::{CONDITION_COUNT, Condition};
use crate::constants::MAX_ATTEMPT_STEPS;
use crate::numbers::{percent, ratio, usize_to_u64};
use crate::seed::derive_attempt_seed;
use crate::session::CraftSession;
use crate::simulator::Simulator;
use crate::solver::CraftPolicy;
use crate::state::{CraftStatus, StepState};

/// Empirical from→to counts of condition changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTally {
    counts: [[u64; CONDITION_COUNT]; CONDITION_COUNT],
}

impl TransitionTally {
    pub fn record(&mut self, from: Condition, to: Condition) {
        self.counts[from.index()][to.index()] += 1;
    }

    /// Record every condition roll along a trajectory. Steps whose action
    /// keeps the condition did not roll and are skipped.
    pub fn observe(&mut self, steps: &[StepState]) {
        for pair in steps.windows(2) {
            let [from, to] = pair else { continue };
            match from.action {
                Some(action) if !action.keeps_condition() => self.record(from.condition, to.condition),
                _ => {}
            }
        }
    }

    pub fn merge(&mut self, other: &Self) {
        for (row, other_row) in self.counts.iter_mut().zip(&other.counts) {
            for (count, other_count) in row.iter_mut().zip(other_row) {
                *count += other_count;
            }
        }
    }

    #[must_use]
    pub const fn count(&self, from: Condition, to: Condition) -> u64 {
        self.counts[from.index()][to.index()]
    }

    #[must_use]
    pub fn total_from(&self, from: Condition) -> u64 {
        self.counts[from.index()].iter().sum()
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Observed probability of `to` following `from`.
    #[must_use]
    pub fn frequency(&self, from: Condition, to: Condition) -> f64 {
        ratio(self.count(from, to), self.total_from(from))
    }
}

/// Outcome of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: usize,
    pub seed: u64,
    pub status: CraftStatus,
    /// The policy picked an action the engine rejected before the craft ended.
    pub stalled: bool,
    pub steps: u32,
    pub final_progress: u32,
    pub final_quality: u32,
    pub fingerprint: u64,
    #[serde(skip)]
    pub transitions: TransitionTally,
}

/// Play one attempt from `seed` with `policy` until it ends or stalls.
#[must_use]
pub fn run_attempt<P: CraftPolicy + ?Sized>(
    sim: &Simulator,
    policy: &P,
    attempt: usize,
    seed: u64,
) -> AttemptRecord {
    let mut session = CraftSession::new(sim, seed);
    let status = session.solve_rest(policy, MAX_ATTEMPT_STEPS);
    let applied = session.history().len() - 1;
    if !status.is_terminal() && applied >= MAX_ATTEMPT_STEPS {
        log::warn!(
            "attempt {attempt} (seed {seed}) hit the {MAX_ATTEMPT_STEPS}-step cap with {} still choosing",
            policy.name()
        );
    }
    let mut transitions = TransitionTally::default();
    transitions.observe(session.history());
    let last = session.current();
    AttemptRecord {
        attempt,
        seed,
        status,
        stalled: !status.is_terminal(),
        steps: u32::try_from(applied).unwrap_or(u32::MAX),
        final_progress: last.progress,
        final_quality: last.quality,
        fingerprint: session.fingerprint(),
        transitions,
    }
}

/// Seeds for a batch: derived from a base seed, or listed explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedPlan {
    Derived { base_seed: u64, attempts: usize },
    Explicit(Vec<u64>),
}

impl SeedPlan {
    #[must_use]
    pub fn seeds(&self) -> Vec<u64> {
        match self {
            Self::Derived {
                base_seed,
                attempts,
            } => (0..*attempts)
                .map(|attempt| derive_attempt_seed(*base_seed, usize_to_u64(attempt)))
                .collect(),
            Self::Explicit(seeds) => seeds.clone(),
        }
    }
}

/// Aggregated results of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub attempts: usize,
    pub status_counts: BTreeMap<CraftStatus, usize>,
    pub stalled: usize,
    pub average_yield: f64,
    pub average_steps: f64,
    pub records: Vec<AttemptRecord>,
    pub transitions: TransitionTally,
}

impl BatchSummary {
    /// Fold per-attempt records, kept in the order given.
    #[must_use]
    pub fn from_records(records: Vec<AttemptRecord>) -> Self {
        let mut status_counts: BTreeMap<CraftStatus, usize> =
            CraftStatus::ALL.iter().map(|status| (*status, 0)).collect();
        let mut transitions = TransitionTally::default();
        let mut yield_total = 0_u64;
        let mut steps_total = 0_u64;
        let mut stalled = 0;
        for record in &records {
            *status_counts.entry(record.status).or_default() += 1;
            if record.stalled {
                stalled += 1;
            }
            yield_total += u64::from(record.status.yield_points());
            steps_total += u64::from(record.steps);
            transitions.merge(&record.transitions);
        }
        let attempts = records.len();
        let n = usize_to_u64(attempts);
        Self {
            attempts,
            status_counts,
            stalled,
            average_yield: ratio(yield_total, n),
            average_steps: ratio(steps_total, n),
            records,
            transitions,
        }
    }

    #[must_use]
    pub fn count(&self, status: CraftStatus) -> usize {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn percent(&self, status: CraftStatus) -> f64 {
        percent(
            usize_to_u64(self.count(status)),
            usize_to_u64(self.attempts),
        )
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        CraftStatus::ALL
            .iter()
            .filter(|status| status.is_success())
            .map(|status| self.count(*status))
            .sum()
    }

    #[must_use]
    pub fn success_rate(&self) -> f64 {
        percent(
            usize_to_u64(self.success_count()),
            usize_to_u64(self.attempts),
        )
    }

    /// Per-status histogram, used to compare runs.
    #[must_use]
    pub fn histogram(&self) -> Vec<(CraftStatus, usize)> {
        self.status_counts
            .iter()
            .map(|(status, count)| (*status, *count))
            .collect()
    }

    /// Mean final quality across all attempts.
    #[must_use]
    pub fn average_quality(&self) -> f64 {
        let total: u64 = self
            .records
            .iter()
            .map(|record| u64::from(record.final_quality))
            .sum();
        ratio(total, usize_to_u64(self.attempts))
    }
}

/// Run every attempt in `plan` and summarize.
#[must_use]
pub fn run_batch<P: CraftPolicy + Sync + ?Sized>(
    sim: &Simulator,
    policy: &P,
    plan: &SeedPlan,
) -> BatchSummary {
    let seeds = plan.seeds();
    log::debug!("running {} attempts with {}", seeds.len(), policy.name());

    #[cfg(feature = "parallel")]
    let records: Vec<AttemptRecord> = seeds
        .par_iter()
        .enumerate()
        .map(|(attempt, seed)| run_attempt(sim, policy, attempt, *seed))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let records: Vec<AttemptRecord> = seeds
        .iter()
        .enumerate()
        .map(|(attempt, seed)| run_attempt(sim, policy, attempt, *seed))
        .collect();

    BatchSummary::from_records(records)
}

/// Keep solving fresh derived seeds until an attempt does not succeed.
///
/// Returns `None` when all `max_attempts` attempts succeed.
#[must_use]
pub fn solve_until_failure<P: CraftPolicy + ?Sized>(
    sim: &Simulator,
    policy: &P,
    base_seed: u64,
    max_attempts: usize,
) -> Option<AttemptRecord> {
    (0..max_attempts)
        .map(|attempt| {
            let seed = derive_attempt_seed(base_seed, usize_to_u64(attempt));
            run_attempt(sim, policy, attempt, seed)
        })
        .find(|record| !record.status.is_success())
}
