//! The craft state-transition engine.
//!
//! `Simulator` is a pure function of `(parameters, step, action, rng)`: it never
//! mutates the step it is given and only touches the generator after an action
//! has been accepted, so every produced [`StepState`] can be replayed.
use rand::Rng;

use crate::action::Action;
use crate::condition::Condition;
use crate::constants::{
    CENTERED_RATE_BONUS_PCT, EXCELLENT_QUALITY_PCT, FINAL_APPRAISAL_DURATION,
    FOCUSED_UNCOMBOED_RATE_PCT, GOOD_QUALITY_PCT, GOOD_SPLENDOROUS_QUALITY_PCT,
    GREAT_STRIDES_BONUS_PCT, GREAT_STRIDES_DURATION, HASTY_RATE_PCT, INNOVATION_BONUS_PCT,
    INNOVATION_DURATION, IQ_MAX_STACKS, IQ_QUALITY_PCT_PER_STACK, MALLEABLE_PROGRESS_PCT,
    MANIPULATION_DURATION, MANIPULATION_RESTORE, MASTERS_MEND_RESTORE, MUSCLE_MEMORY_BONUS_PCT,
    MUSCLE_MEMORY_DURATION, POOR_QUALITY_PCT, PRIMED_EXTRA_DURATION, RAPID_RATE_PCT,
    TRAINED_EYE_LEVEL_MARGIN, TRICKS_CP_RESTORE, VENERATION_BONUS_PCT, VENERATION_DURATION,
    WASTE_NOT_2_DURATION, WASTE_NOT_DURATION,
};
use crate::numbers::saturate_u32;
use crate::params::{CraftParameters, ParamsError};
use crate::state::{CraftStatus, ExecuteResult, ForcedResult, StepState};

const PCT: u64 = 100;

/// Deterministic craft engine bound to one set of parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulator {
    params: CraftParameters,
}

impl Simulator {
    /// # Errors
    ///
    /// Returns [`ParamsError`] when the parameters fail validation.
    pub fn new(params: CraftParameters) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self { params })
    }

    #[must_use]
    pub const fn params(&self) -> &CraftParameters {
        &self.params
    }

    /// Starting snapshot with both pending rolls drawn from `rng`.
    pub fn initial_state<R: Rng + ?Sized>(&self, rng: &mut R) -> StepState {
        let success_roll = rng.r#gen::<f64>();
        let state_roll = rng.r#gen::<f64>();
        StepState::initial(&self.params, success_roll, state_roll)
    }

    #[must_use]
    pub fn status(&self, step: &StepState) -> CraftStatus {
        CraftStatus::classify(&self.params, step)
    }

    #[must_use]
    pub fn base_progress(&self) -> u32 {
        self.params.base_progress()
    }

    #[must_use]
    pub fn base_quality(&self) -> u32 {
        self.params.base_quality()
    }

    /// Whether `action` passes its eligibility rules from `step`.
    ///
    /// CP affordability is checked separately by [`Simulator::apply`].
    #[must_use]
    pub fn can_use(&self, step: &StepState, action: Action) -> bool {
        self.eligibility(step, action).is_ok()
    }

    fn eligibility(&self, step: &StepState, action: Action) -> Result<(), &'static str> {
        let ok = if action.requires_good_condition() {
            step.condition.is_good_or_better() || step.heart_and_soul_active
        } else if action.blocked_by_waste_not() {
            step.waste_not_left == 0
        } else if action.requires_first_step() && step.index != 1 {
            false
        } else {
            match action {
                Action::TrainedFinesse => step.iq_stacks == IQ_MAX_STACKS,
                Action::ByregotsBlessing => step.iq_stacks > 0,
                Action::TrainedEye => {
                    !self.params.expert
                        && self.params.level
                            >= self.params.craft_level.saturating_add(TRAINED_EYE_LEVEL_MARGIN)
                }
                Action::CarefulObservation => step.careful_observation_left > 0,
                Action::HeartAndSoul => step.heart_and_soul_available,
                _ => true,
            }
        };
        if ok {
            Ok(())
        } else {
            Err(rejection_reason(action))
        }
    }

    /// Probability that `action` succeeds from `step`, boosted under Centered.
    #[must_use]
    pub fn success_rate(&self, step: &StepState, action: Action) -> f64 {
        f64::from(self.success_rate_pct(step, action)) / 100.0
    }

    fn success_rate_pct(&self, step: &StepState, action: Action) -> u32 {
        let focused_rate = if step.prev_combo_action == Some(Action::Observe) {
            100
        } else {
            FOCUSED_UNCOMBOED_RATE_PCT
        };
        let rate = match action {
            Action::FocusedSynthesis | Action::FocusedTouch => focused_rate,
            Action::RapidSynthesis => RAPID_RATE_PCT,
            Action::HastyTouch => HASTY_RATE_PCT,
            Action::BasicSynthesis
            | Action::CarefulSynthesis
            | Action::Groundwork
            | Action::IntensiveSynthesis
            | Action::PrudentSynthesis
            | Action::MuscleMemory
            | Action::BasicTouch
            | Action::StandardTouch
            | Action::AdvancedTouch
            | Action::PreparatoryTouch
            | Action::PreciseTouch
            | Action::PrudentTouch
            | Action::TrainedFinesse
            | Action::Reflect
            | Action::ByregotsBlessing
            | Action::TrainedEye
            | Action::DelicateSynthesis
            | Action::Veneration
            | Action::Innovation
            | Action::GreatStrides
            | Action::TricksOfTheTrade
            | Action::MastersMend
            | Action::Manipulation
            | Action::WasteNot
            | Action::WasteNot2
            | Action::Observe
            | Action::CarefulObservation
            | Action::FinalAppraisal
            | Action::HeartAndSoul => 100,
        };
        if step.condition == Condition::Centered {
            rate + CENTERED_RATE_BONUS_PCT
        } else {
            rate
        }
    }

    /// CP spent by `action` from `step`, including combo and Pliant discounts.
    #[must_use]
    pub fn cp_cost(&self, step: &StepState, action: Action) -> u32 {
        let cost = match action {
            Action::CarefulSynthesis => 7,
            Action::FocusedSynthesis => 5,
            Action::Groundwork => 18,
            Action::IntensiveSynthesis => 6,
            Action::PrudentSynthesis => 18,
            Action::MuscleMemory => 6,
            Action::BasicTouch => 18,
            Action::StandardTouch => {
                if step.prev_combo_action == Some(Action::BasicTouch) {
                    18
                } else {
                    32
                }
            }
            Action::AdvancedTouch => {
                if step.prev_combo_action == Some(Action::StandardTouch) {
                    18
                } else {
                    46
                }
            }
            Action::FocusedTouch => 18,
            Action::PreparatoryTouch => 40,
            Action::PreciseTouch => 18,
            Action::PrudentTouch => 25,
            Action::TrainedFinesse => 32,
            Action::Reflect => 6,
            Action::ByregotsBlessing => 24,
            Action::TrainedEye => 250,
            Action::DelicateSynthesis => 32,
            Action::Veneration => 18,
            Action::Innovation => 18,
            Action::GreatStrides => 32,
            Action::MastersMend => 88,
            Action::Manipulation => 96,
            Action::WasteNot => 56,
            Action::WasteNot2 => 98,
            Action::Observe => 7,
            Action::FinalAppraisal => 1,
            Action::BasicSynthesis
            | Action::RapidSynthesis
            | Action::HastyTouch
            | Action::TricksOfTheTrade
            | Action::CarefulObservation
            | Action::HeartAndSoul => 0,
        };
        if step.condition == Condition::Pliant {
            halve_round_up(cost)
        } else {
            cost
        }
    }

    /// Durability spent by `action` from `step`, after Waste Not and Sturdy.
    #[must_use]
    pub fn durability_cost(&self, step: &StepState, action: Action) -> u32 {
        let mut cost = match action {
            Action::BasicSynthesis
            | Action::CarefulSynthesis
            | Action::RapidSynthesis
            | Action::FocusedSynthesis
            | Action::IntensiveSynthesis
            | Action::MuscleMemory
            | Action::BasicTouch
            | Action::StandardTouch
            | Action::AdvancedTouch
            | Action::HastyTouch
            | Action::FocusedTouch
            | Action::PreciseTouch
            | Action::Reflect
            | Action::ByregotsBlessing
            | Action::DelicateSynthesis => 10,
            Action::Groundwork | Action::PreparatoryTouch => 20,
            Action::PrudentSynthesis | Action::PrudentTouch => 5,
            Action::TrainedFinesse
            | Action::TrainedEye
            | Action::Veneration
            | Action::Innovation
            | Action::GreatStrides
            | Action::TricksOfTheTrade
            | Action::MastersMend
            | Action::Manipulation
            | Action::WasteNot
            | Action::WasteNot2
            | Action::Observe
            | Action::CarefulObservation
            | Action::FinalAppraisal
            | Action::HeartAndSoul => 0,
        };
        if step.waste_not_left > 0 {
            cost = halve_round_up(cost);
        }
        if step.condition == Condition::Sturdy {
            cost = halve_round_up(cost);
        }
        cost
    }

    fn progress_potency(&self, step: &StepState, action: Action) -> u32 {
        let level = self.params.level;
        match action {
            Action::BasicSynthesis => {
                if level >= 31 {
                    120
                } else {
                    100
                }
            }
            Action::CarefulSynthesis => {
                if level >= 82 {
                    180
                } else {
                    150
                }
            }
            Action::RapidSynthesis => {
                if level >= 63 {
                    500
                } else {
                    250
                }
            }
            Action::FocusedSynthesis => 200,
            Action::Groundwork => {
                let full = if level >= 86 { 360 } else { 300 };
                if step.durability >= self.durability_cost(step, action) {
                    full
                } else {
                    full / 2
                }
            }
            Action::IntensiveSynthesis => 400,
            Action::PrudentSynthesis => 180,
            Action::MuscleMemory => 300,
            Action::DelicateSynthesis => 100,
            Action::BasicTouch
            | Action::StandardTouch
            | Action::AdvancedTouch
            | Action::HastyTouch
            | Action::FocusedTouch
            | Action::PreparatoryTouch
            | Action::PreciseTouch
            | Action::PrudentTouch
            | Action::TrainedFinesse
            | Action::Reflect
            | Action::ByregotsBlessing
            | Action::TrainedEye
            | Action::Veneration
            | Action::Innovation
            | Action::GreatStrides
            | Action::TricksOfTheTrade
            | Action::MastersMend
            | Action::Manipulation
            | Action::WasteNot
            | Action::WasteNot2
            | Action::Observe
            | Action::CarefulObservation
            | Action::FinalAppraisal
            | Action::HeartAndSoul => 0,
        }
    }

    fn quality_potency(step: &StepState, action: Action) -> u32 {
        match action {
            Action::BasicTouch
            | Action::HastyTouch
            | Action::PrudentTouch
            | Action::TrainedFinesse
            | Action::Reflect
            | Action::DelicateSynthesis => 100,
            Action::StandardTouch => 125,
            Action::AdvancedTouch | Action::FocusedTouch | Action::PreciseTouch => 150,
            Action::PreparatoryTouch => 200,
            Action::ByregotsBlessing => byregot_potency(step.iq_stacks),
            Action::BasicSynthesis
            | Action::CarefulSynthesis
            | Action::RapidSynthesis
            | Action::FocusedSynthesis
            | Action::Groundwork
            | Action::IntensiveSynthesis
            | Action::PrudentSynthesis
            | Action::MuscleMemory
            | Action::TrainedEye
            | Action::Veneration
            | Action::Innovation
            | Action::GreatStrides
            | Action::TricksOfTheTrade
            | Action::MastersMend
            | Action::Manipulation
            | Action::WasteNot
            | Action::WasteNot2
            | Action::Observe
            | Action::CarefulObservation
            | Action::FinalAppraisal
            | Action::HeartAndSoul => 0,
        }
    }

    /// Progress a successful `action` would add from `step`.
    #[must_use]
    pub fn progress_gain(&self, step: &StepState, action: Action) -> u32 {
        let potency = u64::from(self.progress_potency(step, action));
        if potency == 0 {
            return 0;
        }
        let mut buff_pct = PCT;
        if step.muscle_memory_left > 0 {
            buff_pct += MUSCLE_MEMORY_BONUS_PCT;
        }
        if step.veneration_left > 0 {
            buff_pct += VENERATION_BONUS_PCT;
        }
        let condition_pct = if step.condition == Condition::Malleable {
            MALLEABLE_PROGRESS_PCT
        } else {
            PCT
        };
        let raw = u64::from(self.base_progress())
            .saturating_mul(condition_pct)
            .saturating_mul(potency)
            .saturating_mul(buff_pct);
        saturate_u32(raw / (PCT * PCT * PCT))
    }

    /// Quality a successful `action` would add from `step`.
    #[must_use]
    pub fn quality_gain(&self, step: &StepState, action: Action) -> u32 {
        let potency = u64::from(Self::quality_potency(step, action));
        if potency == 0 {
            return 0;
        }
        let mut buff_pct = PCT;
        if step.great_strides_left > 0 {
            buff_pct += GREAT_STRIDES_BONUS_PCT;
        }
        if step.innovation_left > 0 {
            buff_pct += INNOVATION_BONUS_PCT;
        }
        self.scaled_quality(
            self.quality_condition_pct(step.condition),
            potency,
            u64::from(step.iq_stacks),
            buff_pct,
        )
    }

    /// Quality formula with explicit multipliers, all in percent.
    #[must_use]
    pub fn scaled_quality(&self, condition_pct: u64, potency: u64, iq_stacks: u64, buff_pct: u64) -> u32 {
        let iq_pct = PCT + IQ_QUALITY_PCT_PER_STACK * iq_stacks;
        let raw = u64::from(self.base_quality())
            .saturating_mul(condition_pct)
            .saturating_mul(potency)
            .saturating_mul(iq_pct)
            .saturating_mul(buff_pct);
        saturate_u32(raw / (PCT * PCT * PCT * PCT))
    }

    /// Quality multiplier of `condition`, in percent.
    #[must_use]
    pub const fn quality_condition_pct(&self, condition: Condition) -> u64 {
        match condition {
            Condition::Good => {
                if self.params.splendorous {
                    GOOD_SPLENDOROUS_QUALITY_PCT
                } else {
                    GOOD_QUALITY_PCT
                }
            }
            Condition::Excellent => EXCELLENT_QUALITY_PCT,
            Condition::Poor => POOR_QUALITY_PCT,
            _ => PCT,
        }
    }

    /// Would a successful `action` complete the progress bar right now.
    #[must_use]
    pub fn will_finish_craft(&self, step: &StepState, action: Action) -> bool {
        step.final_appraisal_left == 0
            && step.progress.saturating_add(self.progress_gain(step, action)) >= self.params.progress
    }

    /// Next step of the Basic/Standard/Advanced touch chain.
    #[must_use]
    pub const fn next_touch_combo(step: &StepState) -> Action {
        match step.prev_combo_action {
            Some(Action::BasicTouch) => Action::StandardTouch,
            Some(Action::StandardTouch) => Action::AdvancedTouch,
            _ => Action::BasicTouch,
        }
    }

    /// Condition that follows `step`, using its pending condition roll.
    #[must_use]
    pub fn next_condition(&self, step: &StepState) -> Condition {
        match step.condition {
            Condition::Good if !self.params.expert => Condition::Normal,
            Condition::Excellent => Condition::Poor,
            Condition::Poor => Condition::Normal,
            Condition::GoodOmen => Condition::Good,
            _ => self.params.conditions.pick(step.next_state_roll),
        }
    }

    /// Apply `action` to `step`, producing the outcome and the next snapshot.
    ///
    /// On [`ExecuteResult::CannotUse`] the returned state equals `step` and the
    /// generator is left untouched.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        step: &StepState,
        action: Action,
        forced: ForcedResult,
        rng: &mut R,
    ) -> (ExecuteResult, StepState) {
        let status = self.status(step);
        if status.is_terminal() {
            log::debug!("rejecting {action} at step {}: craft already ended ({status})", step.index);
            return (ExecuteResult::CannotUse, *step);
        }
        if let Err(reason) = self.eligibility(step, action) {
            log::debug!("rejecting {action} at step {}: {reason}", step.index);
            return (ExecuteResult::CannotUse, *step);
        }
        let cp_cost = self.cp_cost(step, action);
        let Some(cp_left) = step.remaining_cp.checked_sub(cp_cost) else {
            log::debug!(
                "rejecting {action} at step {}: needs {cp_cost} cp, {} left",
                step.index,
                step.remaining_cp
            );
            return (ExecuteResult::CannotUse, *step);
        };

        let success = match forced {
            ForcedResult::ForceSuccess => true,
            ForcedResult::ForceFail => false,
            ForcedResult::Random => step.action_success_roll < self.success_rate(step, action),
        };

        let mut next = *step;
        next.index = step.index + 1;
        if success {
            next.progress = step.progress.saturating_add(self.progress_gain(step, action));
            next.quality = step.quality.saturating_add(self.quality_gain(step, action));
            next.iq_stacks = Self::next_iq(step, &next, action);
        }

        let quality_changed = next.quality != step.quality;
        let progress_changed = next.progress != step.progress;
        let reached_target = next.progress >= self.params.progress;
        next.waste_not_left = match action {
            Action::WasteNot => fresh_duration(step, WASTE_NOT_DURATION),
            Action::WasteNot2 => fresh_duration(step, WASTE_NOT_2_DURATION),
            _ => carried_duration(step.waste_not_left, action, false),
        };
        next.manipulation_left = if action == Action::Manipulation {
            fresh_duration(step, MANIPULATION_DURATION)
        } else {
            carried_duration(step.manipulation_left, action, false)
        };
        next.great_strides_left = if action == Action::GreatStrides {
            fresh_duration(step, GREAT_STRIDES_DURATION)
        } else {
            carried_duration(step.great_strides_left, action, quality_changed)
        };
        next.innovation_left = if action == Action::Innovation {
            fresh_duration(step, INNOVATION_DURATION)
        } else {
            carried_duration(step.innovation_left, action, false)
        };
        next.veneration_left = if action == Action::Veneration {
            fresh_duration(step, VENERATION_DURATION)
        } else {
            carried_duration(step.veneration_left, action, false)
        };
        next.muscle_memory_left = if action == Action::MuscleMemory {
            fresh_duration(step, MUSCLE_MEMORY_DURATION)
        } else {
            carried_duration(step.muscle_memory_left, action, progress_changed)
        };
        next.final_appraisal_left = if action == Action::FinalAppraisal {
            fresh_duration(step, FINAL_APPRAISAL_DURATION)
        } else {
            carried_duration(step.final_appraisal_left, action, reached_target)
        };
        if action == Action::CarefulObservation {
            next.careful_observation_left = step.careful_observation_left.saturating_sub(1);
        }
        next.heart_and_soul_active = action == Action::HeartAndSoul
            || (step.heart_and_soul_active
                && (step.condition.is_good_or_better() || !action.requires_good_condition()));
        next.heart_and_soul_available =
            step.heart_and_soul_available && action != Action::HeartAndSoul;
        next.prev_combo_action = Some(action);

        if step.final_appraisal_left > 0 && next.progress >= self.params.progress {
            next.progress = self.params.progress - 1;
        }
        if action == Action::TrainedEye {
            next.quality = self.params.quality_max;
        }

        next.remaining_cp = if action == Action::TricksOfTheTrade {
            (cp_left + TRICKS_CP_RESTORE).min(self.params.max_cp)
        } else {
            cp_left
        };

        next.durability = step
            .durability
            .saturating_sub(self.durability_cost(step, action));
        if next.durability > 0 {
            let mut repair = 0;
            if action == Action::MastersMend {
                repair += MASTERS_MEND_RESTORE;
            }
            if step.manipulation_left > 0 && !action.is_turn_free() {
                repair += MANIPULATION_RESTORE;
            }
            next.durability = (next.durability + repair).min(self.params.durability);
        }

        next.condition = if action.keeps_condition() {
            step.condition
        } else {
            self.next_condition(step)
        };
        next.action_success_roll = rng.r#gen::<f64>();
        next.next_state_roll = rng.r#gen::<f64>();
        next.action = None;
        next.action_succeeded = false;

        log::trace!(
            "step {} {action} ({}) -> progress {} quality {} durability {} cp {} {}",
            step.index,
            if success { "ok" } else { "failed" },
            next.progress,
            next.quality,
            next.durability,
            next.remaining_cp,
            next.condition
        );
        let result = if success {
            ExecuteResult::Succeeded
        } else {
            ExecuteResult::Failed
        };
        (result, next)
    }

    fn next_iq(step: &StepState, next: &StepState, action: Action) -> u32 {
        if action == Action::ByregotsBlessing {
            return 0;
        }
        let mut stacks = step.iq_stacks;
        if next.quality != step.quality {
            stacks += 1;
        }
        if action.grants_bonus_iq() {
            stacks += 1;
        }
        stacks.min(IQ_MAX_STACKS)
    }
}

/// Byregot's Blessing potency at the given Inner Quiet stacks.
#[must_use]
pub const fn byregot_potency(iq_stacks: u32) -> u32 {
    100 + 20 * iq_stacks
}

const fn halve_round_up(cost: u32) -> u32 {
    cost - cost / 2
}

const fn fresh_duration(step: &StepState, base: u32) -> u32 {
    if matches!(step.condition, Condition::Primed) {
        base + PRIMED_EXTRA_DURATION
    } else {
        base
    }
}

const fn carried_duration(previous: u32, action: Action, consumed: bool) -> u32 {
    if consumed || previous == 0 {
        0
    } else if action.is_turn_free() {
        previous
    } else {
        previous - 1
    }
}

const fn rejection_reason(action: Action) -> &'static str {
    match action {
        Action::IntensiveSynthesis | Action::PreciseTouch | Action::TricksOfTheTrade => {
            "needs Good/Excellent or Heart and Soul"
        }
        Action::PrudentSynthesis | Action::PrudentTouch => "blocked by Waste Not",
        Action::MuscleMemory | Action::Reflect => "only usable on the first step",
        Action::TrainedFinesse => "needs full Inner Quiet",
        Action::ByregotsBlessing => "needs Inner Quiet",
        Action::TrainedEye => "needs first step on a low-level non-expert recipe",
        Action::CarefulObservation => "no Careful Observation charges left",
        Action::HeartAndSoul => "Heart and Soul already used",
        _ => "not usable",
    }
}
