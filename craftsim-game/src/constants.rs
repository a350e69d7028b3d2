//! Centralized rule constants for the crafting engine.
//!
//! These values define the deterministic math of the simulation. Keeping
//! them together means a rules change is a reviewed code change rather than
//! something scattered through the engine and solver.

// Inner Quiet --------------------------------------------------------------
pub const IQ_MAX_STACKS: u32 = 10;
pub(crate) const IQ_QUALITY_PCT_PER_STACK: u64 = 10;

// Resource restoration -----------------------------------------------------
pub(crate) const TRICKS_CP_RESTORE: u32 = 20;
pub(crate) const MASTERS_MEND_RESTORE: u32 = 30;
pub(crate) const MANIPULATION_RESTORE: u32 = 5;

// Buff durations -----------------------------------------------------------
pub(crate) const WASTE_NOT_DURATION: u32 = 4;
pub(crate) const WASTE_NOT_2_DURATION: u32 = 8;
pub(crate) const MANIPULATION_DURATION: u32 = 8;
pub(crate) const GREAT_STRIDES_DURATION: u32 = 3;
pub(crate) const INNOVATION_DURATION: u32 = 4;
pub(crate) const VENERATION_DURATION: u32 = 4;
pub(crate) const MUSCLE_MEMORY_DURATION: u32 = 5;
pub(crate) const FINAL_APPRAISAL_DURATION: u32 = 5;
pub(crate) const PRIMED_EXTRA_DURATION: u32 = 2;

// Specialist charges -------------------------------------------------------
pub(crate) const SPECIALIST_OBSERVATION_CHARGES: u32 = 3;

// Success rates (percent) --------------------------------------------------
pub(crate) const FOCUSED_UNCOMBOED_RATE_PCT: u32 = 50;
pub(crate) const RAPID_RATE_PCT: u32 = 50;
pub(crate) const HASTY_RATE_PCT: u32 = 60;
pub(crate) const CENTERED_RATE_BONUS_PCT: u32 = 25;

// Condition multipliers (percent) ------------------------------------------
pub(crate) const MALLEABLE_PROGRESS_PCT: u64 = 150;
pub(crate) const GOOD_QUALITY_PCT: u64 = 150;
pub(crate) const GOOD_SPLENDOROUS_QUALITY_PCT: u64 = 175;
pub(crate) const EXCELLENT_QUALITY_PCT: u64 = 400;
pub(crate) const POOR_QUALITY_PCT: u64 = 50;

// Buff multipliers (percent bonus on top of 100) ---------------------------
pub(crate) const MUSCLE_MEMORY_BONUS_PCT: u64 = 100;
pub(crate) const VENERATION_BONUS_PCT: u64 = 50;
pub(crate) const GREAT_STRIDES_BONUS_PCT: u64 = 100;
pub(crate) const INNOVATION_BONUS_PCT: u64 = 50;

// Base rate formula --------------------------------------------------------
pub(crate) const BASE_PROGRESS_FLAT: u32 = 2;
pub(crate) const BASE_QUALITY_FLAT: u32 = 35;

// Trained Eye gate ---------------------------------------------------------
pub(crate) const TRAINED_EYE_LEVEL_MARGIN: u32 = 10;

// Batch driver -------------------------------------------------------------
/// Hard cap on turns per attempt; real crafts end long before this.
pub const MAX_ATTEMPT_STEPS: usize = 256;
