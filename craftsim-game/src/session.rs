//! A cursor over one craft attempt: its rng, seed and step history.

use crate::action::Action;
use crate::seed::CraftRng;
use crate::simulator::Simulator;
use crate::solver::{CraftPolicy, Recommendation};
use crate::state::{CraftStatus, ExecuteResult, ForcedResult, StepState, trajectory_fingerprint};

/// Cursor over one seeded craft attempt.
///
/// The history always holds at least the initial step; the last entry is the
/// current step, and every earlier entry carries the action that was applied
/// to it and whether that action succeeded.
#[derive(Debug, Clone)]
pub struct CraftSession<'a> {
    sim: &'a Simulator,
    rng: CraftRng,
    seed: u64,
    history: Vec<StepState>,
}

impl<'a> CraftSession<'a> {
    /// Start a fresh attempt from `seed`.
    #[must_use]
    pub fn new(sim: &'a Simulator, seed: u64) -> Self {
        let mut rng = CraftRng::from_seed(seed);
        let initial = sim.initial_state(&mut rng);
        Self {
            sim,
            rng,
            seed,
            history: vec![initial],
        }
    }

    /// Throw away the history and start over from `seed`.
    pub fn restart(&mut self, seed: u64) {
        *self = Self::new(self.sim, seed);
    }

    /// Apply `action` to the current step.
    ///
    /// A rejected action leaves the history unchanged.
    pub fn execute(&mut self, action: Action, forced: ForcedResult) -> ExecuteResult {
        let current = self.current();
        let (result, next) = self.sim.apply(&current, action, forced, &mut self.rng);
        if result != ExecuteResult::CannotUse {
            if let Some(last) = self.history.last_mut() {
                last.record_outcome(action, result == ExecuteResult::Succeeded);
            }
            self.history.push(next);
        }
        result
    }

    /// Ask `policy` for an action and apply it.
    pub fn solve_next<P: CraftPolicy + ?Sized>(
        &mut self,
        policy: &P,
    ) -> (Recommendation, ExecuteResult) {
        let rec = policy.recommend(self.sim, &self.current());
        let result = self.execute(rec.action, ForcedResult::Random);
        (rec, result)
    }

    /// Let `policy` play until the craft ends, an action is rejected, or
    /// `max_steps` actions have been applied. Returns the final status.
    pub fn solve_rest<P: CraftPolicy + ?Sized>(&mut self, policy: &P, max_steps: usize) -> CraftStatus {
        for _ in 0..max_steps {
            if self.status().is_terminal() {
                break;
            }
            let (rec, result) = self.solve_next(policy);
            if result == ExecuteResult::CannotUse {
                log::debug!(
                    "{} stalled at step {} on {rec}",
                    policy.name(),
                    self.current().index
                );
                break;
            }
        }
        self.status()
    }

    #[must_use]
    pub fn current(&self) -> StepState {
        // History is never empty.
        self.history[self.history.len() - 1]
    }

    #[must_use]
    pub fn status(&self) -> CraftStatus {
        self.sim.status(&self.current())
    }

    #[must_use]
    pub fn history(&self) -> &[StepState] {
        &self.history
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn simulator(&self) -> &'a Simulator {
        self.sim
    }

    /// Number of values drawn from the attempt generator so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.rng.draws()
    }

    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        trajectory_fingerprint(&self.history)
    }
}
