//! Heuristic next-action solver.
//!
//! The solver infers a phase from each step (opener, Muscle Memory burst,
//! pre-quality build-up, quality rounds, finishers) and picks one action. It
//! keeps no state between calls; everything it knows comes from the step, the
//! engine's derived quantities and its [`SolverConfig`].
mod config;
mod finish;
mod mid;
mod opener;

use serde::Serialize;
use std::fmt;

use rand::Rng;

use crate::action::Action;
use crate::constants::MAX_ATTEMPT_STEPS;
use crate::simulator::Simulator;
use crate::state::{ExecuteResult, ForcedResult, StepState};

pub use config::{ConfigValue, SolverConfig, SolverConfigError, TUNABLES, Tunable, TunableKind};

/// CP of one Byregot's Blessing, reserved by several budget checks.
const BYREGOT_CP: i64 = 24;

/// Action chosen by a policy, with a short tag naming the branch that chose it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Recommendation {
    pub action: Action,
    pub rationale: &'static str,
}

impl Recommendation {
    #[must_use]
    pub const fn new(action: Action, rationale: &'static str) -> Self {
        Self { action, rationale }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.action, self.rationale)
    }
}

/// Policy interface for automated crafting.
pub trait CraftPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick the next action for `step`.
    fn recommend(&self, sim: &Simulator, step: &StepState) -> Recommendation;
}

/// The built-in phase-based heuristic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    #[must_use]
    pub const fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Recommended next action for `step`.
    #[must_use]
    pub fn solve_next(&self, sim: &Simulator, step: &StepState) -> Recommendation {
        Context {
            sim,
            cfg: &self.config,
            step,
        }
        .next()
    }

    /// Keep applying recommendations until the engine rejects one, returning
    /// the last accepted step.
    pub fn solve<R: Rng + ?Sized>(&self, sim: &Simulator, step: StepState, rng: &mut R) -> StepState {
        let mut current = step;
        for _ in 0..MAX_ATTEMPT_STEPS {
            let rec = self.solve_next(sim, &current);
            let (result, next) = sim.apply(&current, rec.action, ForcedResult::Random, rng);
            if result == ExecuteResult::CannotUse {
                break;
            }
            current = next;
        }
        current
    }
}

impl CraftPolicy for Solver {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn recommend(&self, sim: &Simulator, step: &StepState) -> Recommendation {
        self.solve_next(sim, step)
    }
}

/// Everything one decision needs, bundled to keep helper signatures short.
struct Context<'a> {
    sim: &'a Simulator,
    cfg: &'a SolverConfig,
    step: &'a StepState,
}

impl Context<'_> {
    fn next(&self) -> Recommendation {
        if self.step.index == 1 {
            return self.opener();
        }
        if self.step.muscle_memory_left > 0 {
            return Recommendation::new(self.muscle_memory_burst(), "mume");
        }

        let remaining_progress =
            i64::from(self.sim.params().progress) - i64::from(self.step.progress);
        let base = i64::from(self.sim.base_progress());
        let est_basic_synth = base * 120 / 100;
        let est_careful_synth = base * 180 / 100;
        let reserved_cp_for_progress = if remaining_progress <= est_basic_synth {
            0
        } else {
            7
        };
        let progress_deficit = remaining_progress - est_careful_synth;
        let cp_for_quality = self.cp() - reserved_cp_for_progress;

        if let Some(rec) = self.finish_quality(cp_for_quality) {
            return rec;
        }

        let params = self.sim.params();
        let is_mid = self.step.quality < params.top_quality()
            && (self.step.quality < params.min_quality() || cp_for_quality >= BYREGOT_CP);
        if is_mid {
            let rec = self.mid(progress_deficit, cp_for_quality);
            if self.step.remaining_cp >= self.sim.cp_cost(self.step, rec.action) {
                return rec;
            }
            if let Some(action) = self.emergency_restore_cp() {
                return Recommendation::new(action, "mid: emergency cp");
            }
        }

        let rationale = if is_mid { "finish emergency" } else { "finish" };
        Recommendation::new(self.finish_progress(), rationale)
    }

    fn cp(&self) -> i64 {
        i64::from(self.step.remaining_cp)
    }

    fn cp_cost(&self, action: Action) -> i64 {
        i64::from(self.sim.cp_cost(self.step, action))
    }

    fn dura_cost(&self, action: Action) -> u32 {
        self.sim.durability_cost(self.step, action)
    }

    fn progress_of(&self, action: Action) -> i64 {
        i64::from(self.sim.progress_gain(self.step, action))
    }

    fn effective_durability(&self) -> u32 {
        self.step.effective_durability()
    }

    /// Swap a progress action for Final Appraisal if it would end the craft.
    fn safe_craft_action(&self, action: Action) -> Action {
        if self.sim.will_finish_craft(self.step, action) {
            Action::FinalAppraisal
        } else {
            action
        }
    }

    /// Tricks if usable, else Heart and Soul, else (optionally) a Careful
    /// Observation to fish for Good.
    fn emergency_restore_cp(&self) -> Option<Action> {
        if self.sim.can_use(self.step, Action::TricksOfTheTrade) {
            return Some(Action::TricksOfTheTrade);
        }
        if self.step.heart_and_soul_available {
            return Some(Action::HeartAndSoul);
        }
        if self.cfg.emergency_cp_bait_good && self.step.careful_observation_left > 0 {
            return Some(Action::CarefulObservation);
        }
        None
    }
}
