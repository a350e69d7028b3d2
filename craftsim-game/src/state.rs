//! Per-turn craft snapshot and outcome classification.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::action::Action;
use crate::condition::Condition;
use crate::params::CraftParameters;

/// Terminal or in-progress classification of a craft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CraftStatus {
    InProgress,
    FailedDurability,
    FailedMinQuality,
    SucceededTier1,
    SucceededTier2,
    SucceededTier3,
}

impl CraftStatus {
    pub const ALL: [Self; 6] = [
        Self::InProgress,
        Self::FailedDurability,
        Self::FailedMinQuality,
        Self::SucceededTier1,
        Self::SucceededTier2,
        Self::SucceededTier3,
    ];

    /// Classify a snapshot against the recipe thresholds.
    #[must_use]
    pub fn classify(params: &CraftParameters, step: &StepState) -> Self {
        let [q1, q2, q3] = params.quality_thresholds;
        if step.progress < params.progress {
            if step.durability > 0 {
                Self::InProgress
            } else {
                Self::FailedDurability
            }
        } else if step.quality < q1 {
            Self::FailedMinQuality
        } else if step.quality < q2 {
            Self::SucceededTier1
        } else if step.quality < q3 {
            Self::SucceededTier2
        } else {
            Self::SucceededTier3
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(
            self,
            Self::SucceededTier1 | Self::SucceededTier2 | Self::SucceededTier3
        )
    }

    /// Yield points: 1/2/3 for the success tiers, 0 otherwise.
    #[must_use]
    pub const fn yield_points(self) -> u32 {
        match self {
            Self::SucceededTier1 => 1,
            Self::SucceededTier2 => 2,
            Self::SucceededTier3 => 3,
            Self::InProgress | Self::FailedDurability | Self::FailedMinQuality => 0,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InProgress => "In progress",
            Self::FailedDurability => "Failed: durability",
            Self::FailedMinQuality => "Failed: min quality",
            Self::SucceededTier1 => "Success: tier 1",
            Self::SucceededTier2 => "Success: tier 2",
            Self::SucceededTier3 => "Success: tier 3",
        }
    }
}

impl fmt::Display for CraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of asking the engine to apply an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecuteResult {
    /// The action was rejected; the state is unchanged.
    CannotUse,
    /// The action was legal but its success roll failed.
    Failed,
    Succeeded,
}

/// Override for the success roll, used by manual tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ForcedResult {
    #[default]
    Random,
    ForceSuccess,
    ForceFail,
}

/// All mutable craft variables at one turn boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    /// 1-based turn number.
    pub index: u32,
    pub progress: u32,
    pub quality: u32,
    pub durability: u32,
    pub remaining_cp: u32,
    pub condition: Condition,
    pub iq_stacks: u32,
    pub waste_not_left: u32,
    pub manipulation_left: u32,
    pub great_strides_left: u32,
    pub innovation_left: u32,
    pub veneration_left: u32,
    pub muscle_memory_left: u32,
    pub final_appraisal_left: u32,
    pub careful_observation_left: u32,
    pub heart_and_soul_active: bool,
    pub heart_and_soul_available: bool,
    pub prev_combo_action: Option<Action>,
    /// Pending uniform draw compared against the next action's success rate.
    pub action_success_roll: f64,
    /// Pending uniform draw used for the next condition transition.
    pub next_state_roll: f64,
    /// Action executed from this step, once known.
    pub action: Option<Action>,
    pub action_succeeded: bool,
}

impl StepState {
    /// Fresh craft state with full resources and the given pending rolls.
    #[must_use]
    pub const fn initial(params: &CraftParameters, success_roll: f64, state_roll: f64) -> Self {
        Self {
            index: 1,
            progress: 0,
            quality: 0,
            durability: params.durability,
            remaining_cp: params.max_cp,
            condition: Condition::Normal,
            iq_stacks: 0,
            waste_not_left: 0,
            manipulation_left: 0,
            great_strides_left: 0,
            innovation_left: 0,
            veneration_left: 0,
            muscle_memory_left: 0,
            final_appraisal_left: 0,
            careful_observation_left: if params.specialist {
                crate::constants::SPECIALIST_OBSERVATION_CHARGES
            } else {
                0
            },
            heart_and_soul_active: false,
            heart_and_soul_available: params.specialist,
            prev_combo_action: None,
            action_success_roll: success_roll,
            next_state_roll: state_roll,
            action: None,
            action_succeeded: false,
        }
    }

    /// Copy of this step with the condition overridden.
    #[must_use]
    pub const fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// Remember which action was executed from this step.
    pub const fn record_outcome(&mut self, action: Action, succeeded: bool) {
        self.action = Some(action);
        self.action_succeeded = succeeded;
    }

    /// Durability plus the repair still owed by Manipulation.
    #[must_use]
    pub const fn effective_durability(&self) -> u32 {
        self.durability + self.manipulation_left * crate::constants::MANIPULATION_RESTORE
    }

    fn hash_into(&self, hasher: &mut impl Hasher) {
        for value in [
            self.index,
            self.progress,
            self.quality,
            self.durability,
            self.remaining_cp,
            self.iq_stacks,
            self.waste_not_left,
            self.manipulation_left,
            self.great_strides_left,
            self.innovation_left,
            self.veneration_left,
            self.muscle_memory_left,
            self.final_appraisal_left,
            self.careful_observation_left,
        ] {
            hasher.write_u32(value);
        }
        hasher.write_usize(self.condition.index());
        hasher.write_u8(u8::from(self.heart_and_soul_active));
        hasher.write_u8(u8::from(self.heart_and_soul_available));
        hasher.write_u32(action_tag(self.prev_combo_action));
        hasher.write_u64(self.action_success_roll.to_bits());
        hasher.write_u64(self.next_state_roll.to_bits());
        hasher.write_u32(action_tag(self.action));
        hasher.write_u8(u8::from(self.action_succeeded));
    }
}

fn action_tag(action: Option<Action>) -> u32 {
    action.map_or(0, |action| action as u32 + 1)
}

/// Stable 64-bit digest of a sequence of snapshots.
#[must_use]
pub fn trajectory_fingerprint(steps: &[StepState]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    for step in steps {
        step.hash_into(&mut hasher);
    }
    hasher.finish()
}
