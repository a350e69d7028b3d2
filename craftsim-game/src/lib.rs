//! Craftsim Engine
//!
//! Platform-agnostic crafting minigame simulation: a deterministic
//! state-transition engine, a phase-based heuristic solver and a batch driver
//! for estimating outcome statistics over many seeded attempts.
//! This crate performs no I/O; callers supply parameters and seeds.

pub mod action;
pub mod batch;
pub mod condition;
pub mod constants;
pub mod numbers;
pub mod params;
pub mod seed;
pub mod session;
pub mod simulator;
pub mod solver;
pub mod state;

// Re-export commonly used types
pub use action::Action;
pub use batch::{
    AttemptRecord, BatchSummary, SeedPlan, TransitionTally, run_attempt, run_batch,
    solve_until_failure,
};
pub use condition::{Condition, ConditionTable};
pub use params::{CraftParameters, CraftParametersBuilder, LevelBasis, ParamsError, RecipePreset};
pub use seed::{CraftRng, derive_attempt_seed};
pub use session::CraftSession;
pub use simulator::Simulator;
pub use solver::{
    ConfigValue, CraftPolicy, Recommendation, Solver, SolverConfig, SolverConfigError, Tunable,
    TunableKind,
};
pub use state::{CraftStatus, ExecuteResult, ForcedResult, StepState, trajectory_fingerprint};
