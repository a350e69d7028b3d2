//! Mid-craft phases: Inner Quiet build-up, starting quality rounds and the
//! quality rounds themselves, plus the durability management they share.
use super::{BYREGOT_CP, Context, Recommendation};
use crate::action::Action;
use crate::condition::Condition;
use crate::constants::{IQ_MAX_STACKS, MANIPULATION_RESTORE, MASTERS_MEND_RESTORE};

/// Rough CP price of one "half combo" (half an Innovation plus Observe and Focused Touch).
const HALF_COMBO_CP: i64 = 34;
const GREAT_STRIDES_CP: i64 = 32;
const INNOVATION_CP: i64 = 18;
const OBSERVE_CP: i64 = 7;
const FINESSE_CP: i64 = 32;
const MASTERS_MEND_CP: i64 = 88;
const PLIANT_MASTERS_MEND_CP: i64 = 44;

impl Context<'_> {
    pub(super) fn mid(&self, progress_deficit: i64, cp: i64) -> Recommendation {
        // Great Strides for the closer, and Innovation again unless it will last.
        let reserved_for_finisher = BYREGOT_CP
            + GREAT_STRIDES_CP
            + if self.step.innovation_left > 2 {
                0
            } else {
                INNOVATION_CP
            };
        if self.step.iq_stacks < IQ_MAX_STACKS
            || (progress_deficit > 0 && self.cfg.mid_finish_progress_before_quality)
        {
            self.mid_pre_quality(progress_deficit, cp)
        } else if self.step.great_strides_left == 0 && self.step.innovation_left == 0 {
            self.mid_start_quality(progress_deficit, cp, reserved_for_finisher)
        } else {
            self.mid_quality(cp, reserved_for_finisher)
        }
    }

    fn mid_pre_quality(&self, progress_deficit: i64, cp: i64) -> Recommendation {
        let step = self.step;
        let cfg = self.cfg;
        let veneration_active = progress_deficit > 0 && step.veneration_left > 0;
        let observe_on_low_dura = if veneration_active {
            cfg.mid_keep_high_dura_veneration
        } else {
            cfg.mid_keep_high_dura_unbuffed
        };
        let allow_intensive = if veneration_active {
            cfg.mid_allow_intensive_veneration
        } else {
            cfg.mid_allow_intensive_unbuffed
        };
        let allow_precise = cfg.mid_allow_precise
            && (!observe_on_low_dura || step.manipulation_left > 0 || step.durability > 25);

        if progress_deficit > 0
            && let Some(action) = self.high_priority_progress(allow_intensive)
        {
            return Recommendation::new(
                self.safe_craft_action(action),
                "mid pre quality: high-prio progress",
            );
        }
        if step.iq_stacks < IQ_MAX_STACKS
            && let Some(action) = self.high_priority_iq(allow_precise)
        {
            return Recommendation::new(action, "mid pre quality: high-prio iq");
        }
        if step.condition == Condition::Good {
            return Recommendation::new(
                Action::TricksOfTheTrade,
                "mid pre quality: high-prio tricks",
            );
        }

        if let Some(action) =
            self.durability_pre_quality(cp, observe_on_low_dura, progress_deficit > 0)
        {
            return Recommendation::new(action, "mid pre quality: durability");
        }

        if step.condition == Condition::GoodOmen
            && cfg.mid_allow_veneration_good_omen
            && cfg.mid_allow_intensive_veneration
            && progress_deficit > self.progress_of(Action::IntensiveSynthesis)
        {
            return Recommendation::new(Action::Veneration, "mid pre quality: good omen vene");
        }

        if step.iq_stacks < IQ_MAX_STACKS && !veneration_active {
            if step.iq_stacks >= cfg.mid_min_iq_for_hs_precise
                && step.iq_stacks < IQ_MAX_STACKS - 1
                && step.durability > self.dura_cost(Action::PreciseTouch)
            {
                if self.sim.can_use(step, Action::PreciseTouch) {
                    return Recommendation::new(Action::PreciseTouch, "mid pre quality: iq");
                }
                if step.heart_and_soul_available {
                    return Recommendation::new(Action::HeartAndSoul, "mid pre quality: iq");
                }
            }
            if step.durability > self.dura_cost(Action::PrudentTouch) {
                return Recommendation::new(Action::PrudentTouch, "mid pre quality: iq");
            }
        } else {
            if cfg.mid_allow_veneration_after_iq
                && step.veneration_left == 0
                && progress_deficit > self.progress_of(Action::RapidSynthesis)
                && step.effective_durability() > 20
            {
                return Recommendation::new(Action::Veneration, "mid pre quality: progress");
            }
            if progress_deficit <= self.progress_of(Action::PrudentSynthesis)
                && step.durability > self.dura_cost(Action::PrudentSynthesis)
            {
                return Recommendation::new(
                    self.safe_craft_action(Action::PrudentSynthesis),
                    "mid pre quality: progress",
                );
            }
            if step.durability > self.dura_cost(Action::RapidSynthesis) {
                return Recommendation::new(
                    self.safe_craft_action(Action::RapidSynthesis),
                    "mid pre quality: progress",
                );
            }
        }
        Recommendation::new(Action::Observe, "mid pre quality: no options")
    }

    fn mid_start_quality(&self, progress_deficit: i64, cp: i64, reserved: i64) -> Recommendation {
        let step = self.step;
        let cfg = self.cfg;
        if progress_deficit > 0
            && let Some(action) = self.high_priority_progress(true)
        {
            return Recommendation::new(
                self.safe_craft_action(action),
                "mid start quality: high-prio progress",
            );
        }
        if step.condition == Condition::Good {
            return Recommendation::new(
                Action::TricksOfTheTrade,
                "mid start quality: high-prio tricks",
            );
        }
        if cfg.mid_observe_good_omen_for_tricks && step.condition == Condition::GoodOmen {
            return Recommendation::new(
                Action::Observe,
                "mid start quality: good omen -> high-prio tricks",
            );
        }

        if let Some(action) = self.durability_start_quality(cp) {
            return Recommendation::new(action, "mid start quality: durability");
        }

        if step.condition == Condition::GoodOmen
            && cfg.mid_allow_veneration_good_omen
            && progress_deficit > self.progress_of(Action::IntensiveSynthesis)
        {
            return Recommendation::new(Action::Veneration, "mid start quality: good omen vene");
        }

        let free_cp = cp - BYREGOT_CP;
        let cp_for_quality = cp - reserved;
        let effective_dura = self.effective_durability();
        if effective_dura <= 10
            && cp_for_quality < MASTERS_MEND_CP + INNOVATION_CP + 4 * FINESSE_CP
        {
            // Not even enough durability for Byregot, and no CP for a proper repair.
            if step.condition != Condition::Pliant && free_cp >= PLIANT_MASTERS_MEND_CP + OBSERVE_CP
            {
                return Recommendation::new(Action::Observe, "mid start quality: critical dura");
            }
            if self.dura_cost(Action::ByregotsBlessing) < step.durability {
                return Recommendation::new(
                    Action::ByregotsBlessing,
                    "mid start quality: critical dura & sturdy",
                );
            }
            if free_cp >= self.cp_cost(Action::GreatStrides) {
                return Recommendation::new(Action::GreatStrides, "mid start quality: critical dura");
            }
            if free_cp >= self.cp_cost(Action::Innovation) {
                return Recommendation::new(Action::Innovation, "mid start quality: critical dura");
            }
            if free_cp >= self.cp_cost(Action::Observe) {
                return Recommendation::new(
                    Action::Observe,
                    "mid start quality: critical dura & emergency cp",
                );
            }
            if step.careful_observation_left > 0 {
                return Recommendation::new(
                    Action::CarefulObservation,
                    "mid start quality: critical dura & emergency cp",
                );
            }
            return Recommendation::new(
                Action::ByregotsBlessing,
                "mid start quality: critical dura & emergency cp",
            );
        }

        if cfg.mid_gs_before_inno
            && step.condition != Condition::Primed
            && (step.condition == Condition::Pliant || effective_dura > 20)
            && free_cp >= self.cp_cost(Action::GreatStrides) + INNOVATION_CP + OBSERVE_CP + 18
        {
            return Recommendation::new(Action::GreatStrides, "mid start quality");
        }
        Recommendation::new(Action::Innovation, "mid start quality")
    }

    fn mid_quality(&self, cp: i64, reserved: i64) -> Recommendation {
        let step = self.step;
        let cfg = self.cfg;
        let free_cp = cp - reserved;
        let effective_dura = self.effective_durability();
        let next_step_dura = step.durability
            + if step.manipulation_left > 0 {
                MANIPULATION_RESTORE
            } else {
                0
            };

        if step.innovation_left == 0 {
            // Great Strides without Innovation: get Innovation up unless the
            // condition says otherwise.
            if step.condition == Condition::Pliant
                && let Some(action) = self.durability_quality_pliant(free_cp)
            {
                return Recommendation::new(action, "mid quality gs-only: durability");
            }
            if step.condition == Condition::Good
                && self.can_use_safely_in_finisher(Action::PreciseTouch, free_cp)
            {
                return Recommendation::new(Action::PreciseTouch, "mid quality gs-only: utilize good");
            }
            if step.prev_combo_action == Some(Action::Observe)
                && self.can_use_safely_in_finisher(Action::FocusedTouch, free_cp)
            {
                return Recommendation::new(
                    Action::FocusedTouch,
                    "mid quality gs-only: after observe?",
                );
            }
            if step.great_strides_left == 1 {
                if self.can_use_safely_in_finisher(Action::PrudentTouch, free_cp) {
                    return Recommendation::new(
                        Action::PrudentTouch,
                        "mid quality gs-only last chance",
                    );
                }
                if free_cp >= self.cp_cost(Action::TrainedFinesse) {
                    return Recommendation::new(
                        Action::TrainedFinesse,
                        "mid quality gs-only last chance",
                    );
                }
            }
            return Recommendation::new(Action::Innovation, "mid quality: gs->inno");
        }

        if step.condition == Condition::Good {
            if cfg.mid_allow_good_prep
                && step.great_strides_left > 0
                && self.can_use_safely_in_finisher(Action::PreparatoryTouch, free_cp)
            {
                return Recommendation::new(Action::PreparatoryTouch, "mid quality: gs+inno+good");
            }
            if self.can_use_safely_in_finisher(Action::PreciseTouch, free_cp) {
                return Recommendation::new(Action::PreciseTouch, "mid quality: good");
            }
        }

        if step.condition == Condition::Sturdy
            && cfg.mid_allow_sturdy_prep
            && step.prev_combo_action != Some(Action::Observe)
            && self.can_use_safely_in_finisher(Action::PreparatoryTouch, free_cp)
        {
            return Recommendation::new(Action::PreparatoryTouch, "mid quality: sturdy");
        }

        if step.condition == Condition::Pliant
            && step.great_strides_left != 1
            && let Some(action) = self.durability_quality_pliant(free_cp)
        {
            return Recommendation::new(action, "mid quality: durability");
        }

        if step.condition == Condition::GoodOmen
            && step.great_strides_left == 0
            && step.innovation_left > 1
            && next_step_dura > 10
            && effective_dura > 20
            && free_cp >= GREAT_STRIDES_CP + 18
        {
            return Recommendation::new(Action::GreatStrides, "mid quality: good omen gs");
        }

        if step.prev_combo_action == Some(Action::Observe)
            && self.can_use_safely_in_finisher(Action::FocusedTouch, free_cp)
        {
            return Recommendation::new(Action::FocusedTouch, "mid quality");
        }

        if step.innovation_left != 1
            && step.great_strides_left != 1
            && next_step_dura > 10
            && effective_dura > 20
            && free_cp >= self.cp_cost(Action::Observe) + 18
        {
            return Recommendation::new(Action::Observe, "mid quality: focused");
        }

        if self.can_use_safely_in_finisher(Action::PrudentTouch, free_cp) {
            return Recommendation::new(Action::PrudentTouch, "mid quality: alt");
        }
        if free_cp >= self.cp_cost(Action::TrainedFinesse) {
            return Recommendation::new(Action::TrainedFinesse, "mid quality: alt");
        }

        if let Some(action) = self.emergency_restore_cp() {
            return Recommendation::new(action, "mid quality: emergency cp");
        }
        if self.can_use_safely_in_finisher(Action::HastyTouch, free_cp) {
            return Recommendation::new(Action::HastyTouch, "mid quality: emergency hasty");
        }

        if step.great_strides_left == 0 && cp >= self.cp_cost(Action::GreatStrides) + BYREGOT_CP {
            return Recommendation::new(Action::GreatStrides, "mid quality: emergency gs+byregot");
        }
        if !step.condition.is_good_or_better() && step.durability > 10 {
            if step.great_strides_left != 1
                && step.innovation_left != 1
                && cp >= self.cp_cost(Action::Observe) + BYREGOT_CP
            {
                return Recommendation::new(
                    Action::Observe,
                    "mid quality: emergency byregot bait good",
                );
            }
            if cfg.finisher_bait_good_byregot && step.careful_observation_left > 0 {
                return Recommendation::new(
                    Action::CarefulObservation,
                    "mid quality: emergency byregot bait good",
                );
            }
        }
        Recommendation::new(Action::ByregotsBlessing, "mid quality: emergency byregot")
    }

    fn durability_pre_quality(
        &self,
        cp: i64,
        observe_on_low_dura: bool,
        want_progress: bool,
    ) -> Option<Action> {
        let step = self.step;
        let max_dura = self.sim.params().durability;
        if step.manipulation_left > 0 && step.durability + MANIPULATION_RESTORE > max_dura {
            return None;
        }

        if step.condition == Condition::Pliant {
            if step.manipulation_left <= 1 && cp >= self.cp_cost(Action::Manipulation) {
                return Some(Action::Manipulation);
            }
            let manip_tick = if step.manipulation_left > 0 {
                MANIPULATION_RESTORE
            } else {
                0
            };
            if step.durability + MASTERS_MEND_RESTORE + manip_tick <= max_dura
                && cp >= self.cp_cost(Action::MastersMend)
            {
                return Some(Action::MastersMend);
            }
            return None;
        }

        if self.cfg.mid_primed_manip_pre_quality
            && step.condition == Condition::Primed
            && step.manipulation_left == 0
            && cp >= self.cp_cost(Action::Manipulation)
        {
            return Some(Action::Manipulation);
        }

        let critical_threshold = if step.condition == Condition::Sturdy {
            5
        } else {
            10
        };
        let observable = match step.condition {
            Condition::Normal | Condition::Good | Condition::GoodOmen | Condition::Primed => true,
            Condition::Malleable => !want_progress,
            _ => false,
        };
        let low_threshold = if observe_on_low_dura && observable {
            if step.manipulation_left > 0 { 20 } else { 25 }
        } else {
            critical_threshold
        };
        if step.durability <= low_threshold {
            if step.condition == Condition::Good {
                return Some(Action::TricksOfTheTrade);
            }
            if step.manipulation_left > 0 {
                return Some(Action::Observe);
            }
            if self.cfg.mid_bait_pliant_with_observe_pre_quality && self.can_roll_pliant() {
                return Some(Action::Observe);
            }
            if step.durability <= critical_threshold {
                return Some(Action::Manipulation);
            }
        }
        None
    }

    /// Observing for Pliant only pays off when the table can roll it.
    fn can_roll_pliant(&self) -> bool {
        self.sim.params().conditions.probability(Condition::Pliant) > 0.0
    }

    fn durability_start_quality(&self, cp: i64) -> Option<Action> {
        let step = self.step;
        let effective_dura = self.effective_durability();
        if effective_dura > self.sim.params().durability {
            return None;
        }

        if step.condition == Condition::Pliant {
            return self.durability_quality_pliant(cp);
        }

        if self.cfg.mid_primed_manip_after_iq
            && step.condition == Condition::Primed
            && step.manipulation_left == 0
            && cp >= self.cp_cost(Action::Manipulation) + estimate_cp_to_use_durability(effective_dura, 5)
        {
            return Some(Action::Manipulation);
        }

        if effective_dura <= 10 {
            // Budget for a full-price Master's Mend, Innovation, Great Strides and Byregot.
            let free_cp = cp - (MASTERS_MEND_CP + INNOVATION_CP + GREAT_STRIDES_CP + BYREGOT_CP);
            if self.cfg.mid_bait_pliant_with_observe_after_iq
                && self.can_roll_pliant()
                && free_cp >= OBSERVE_CP
            {
                return Some(Action::Observe);
            }
            if free_cp >= INNOVATION_CP + 4 * FINESSE_CP {
                return None;
            }
            if step.manipulation_left <= 1 && cp >= self.cp_cost(Action::Manipulation) + BYREGOT_CP {
                return Some(Action::Manipulation);
            }
            if cp >= self.cp_cost(Action::MastersMend) + BYREGOT_CP {
                return Some(Action::MastersMend);
            }
        }
        None
    }

    fn durability_quality_pliant(&self, cp: i64) -> Option<Action> {
        let step = self.step;
        let effective_dura = self.effective_durability();
        if step.manipulation_left <= 1
            && cp >= self.cp_cost(Action::Manipulation) + estimate_cp_to_use_durability(effective_dura, 4)
        {
            return Some(Action::Manipulation);
        }
        if effective_dura + MASTERS_MEND_RESTORE <= self.sim.params().durability
            && cp >= self.cp_cost(Action::MastersMend) + estimate_cp_to_use_durability(effective_dura, 3)
        {
            return Some(Action::MastersMend);
        }
        None
    }

    /// Progress actions worth taking on a favourable condition.
    fn high_priority_progress(&self, allow_intensive: bool) -> Option<Action> {
        let step = self.step;
        if step.condition == Condition::Good
            && allow_intensive
            && step.durability > self.dura_cost(Action::IntensiveSynthesis)
        {
            return Some(Action::IntensiveSynthesis);
        }
        if matches!(
            step.condition,
            Condition::Centered | Condition::Sturdy | Condition::Malleable
        ) && step.durability > self.dura_cost(Action::RapidSynthesis)
        {
            return Some(Action::RapidSynthesis);
        }
        None
    }

    /// Inner Quiet actions worth taking on a favourable condition.
    fn high_priority_iq(&self, allow_precise: bool) -> Option<Action> {
        let step = self.step;
        let cfg = self.cfg;
        if step.condition.is_good_or_better()
            && allow_precise
            && step.durability > self.dura_cost(Action::PreciseTouch)
        {
            return Some(Action::PreciseTouch);
        }
        if step.condition == Condition::Centered
            && cfg.mid_allow_centered_hasty
            && step.durability > self.dura_cost(Action::HastyTouch)
        {
            return Some(Action::HastyTouch);
        }
        if step.condition == Condition::Sturdy
            && cfg.mid_allow_sturdy_precise
            && (step.heart_and_soul_active || step.heart_and_soul_available)
            && step.durability > self.dura_cost(Action::PreciseTouch)
        {
            return Some(if step.heart_and_soul_active {
                Action::PreciseTouch
            } else {
                Action::HeartAndSoul
            });
        }
        if step.condition == Condition::Sturdy && step.durability > self.dura_cost(Action::HastyTouch)
        {
            return Some(if cfg.mid_allow_sturdy_hasty {
                Action::HastyTouch
            } else {
                crate::simulator::Simulator::next_touch_combo(step)
            });
        }
        None
    }
}

/// CP needed to spend current durability on half combos, plus `extra_half_combos` more.
fn estimate_cp_to_use_durability(effective_dura: u32, extra_half_combos: i64) -> i64 {
    if effective_dura <= 10 {
        return 0;
    }
    // 11-20 durability covers no half combo, 21-30 covers one, and so on.
    let current_half_combos = if effective_dura <= 20 {
        0
    } else {
        i64::from((effective_dura + 9) / 10)
    };
    HALF_COMBO_CP * (current_half_combos + extra_half_combos)
}

#[cfg(test)]
mod tests {
    use super::estimate_cp_to_use_durability;
    use crate::action::Action;
    use crate::condition::{Condition, ConditionTable};
    use crate::params::CraftParameters;
    use crate::simulator::Simulator;
    use crate::solver::{Solver, SolverConfig};
    use crate::state::StepState;

    fn mid_step(sim: &Simulator, condition: Condition) -> StepState {
        let mut step = StepState::initial(sim.params(), 0.5, 0.5).with_condition(condition);
        step.index = 8;
        step.progress = 2000;
        step.quality = 1500;
        step.iq_stacks = 4;
        step.durability = 40;
        step.remaining_cp = 500;
        step.heart_and_soul_available = false;
        step
    }

    fn relic() -> Simulator {
        Simulator::new(CraftParameters::relic_preset()).unwrap()
    }

    #[test]
    fn durability_estimate_counts_half_combos() {
        assert_eq!(estimate_cp_to_use_durability(10, 4), 0);
        assert_eq!(estimate_cp_to_use_durability(20, 4), 136);
        assert_eq!(estimate_cp_to_use_durability(25, 3), 34 * 6);
        assert_eq!(estimate_cp_to_use_durability(40, 0), 34 * 4);
    }

    #[test]
    fn favourable_conditions_take_priority_before_quality() {
        let sim = relic();
        let solver = Solver::default();
        let sturdy = mid_step(&sim, Condition::Sturdy);
        let rec = solver.solve_next(&sim, &sturdy);
        assert_eq!(rec.action, Action::RapidSynthesis);
        assert_eq!(rec.rationale, "mid pre quality: high-prio progress");

        let good = mid_step(&sim, Condition::Good);
        let rec = solver.solve_next(&sim, &good);
        assert_eq!(rec.action, Action::PreciseTouch);

        let centered = mid_step(&sim, Condition::Centered);
        assert_eq!(solver.solve_next(&sim, &centered).action, Action::RapidSynthesis);
    }

    #[test]
    fn pliant_is_spent_on_repairs() {
        let sim = relic();
        let solver = Solver::default();
        let mut step = mid_step(&sim, Condition::Pliant);
        step.durability = 20;
        let rec = solver.solve_next(&sim, &step);
        assert_eq!(rec.action, Action::Manipulation);
        assert_eq!(rec.rationale, "mid pre quality: durability");

        step.manipulation_left = 5;
        assert_eq!(solver.solve_next(&sim, &step).action, Action::MastersMend);
    }

    #[test]
    fn low_durability_observes_to_bait_pliant() {
        let sim = relic();
        let solver = Solver::default();
        let mut step = mid_step(&sim, Condition::Normal);
        step.durability = 25;
        assert_eq!(solver.solve_next(&sim, &step).action, Action::Observe);

        let no_bait = Solver::new(SolverConfig {
            mid_keep_high_dura_unbuffed: false,
            mid_bait_pliant_with_observe_pre_quality: false,
            ..SolverConfig::default()
        });
        step.durability = 10;
        assert_eq!(no_bait.solve_next(&sim, &step).action, Action::Manipulation);
    }

    #[test]
    fn pliant_bait_is_skipped_when_the_table_never_rolls_it() {
        let params = CraftParameters {
            conditions: ConditionTable::normal(90),
            ..CraftParameters::relic_preset()
        };
        let sim = Simulator::new(params).unwrap();
        assert!(sim.params().conditions.probability(Condition::Pliant) <= 0.0);
        let solver = Solver::new(SolverConfig {
            mid_keep_high_dura_unbuffed: false,
            ..SolverConfig::default()
        });
        assert!(solver.config().mid_bait_pliant_with_observe_pre_quality);
        let mut step = mid_step(&sim, Condition::Normal);
        step.durability = 10;
        assert_eq!(solver.solve_next(&sim, &step).action, Action::Manipulation);
    }

    #[test]
    fn normal_turns_build_inner_quiet_with_prudent_touch() {
        let sim = relic();
        let solver = Solver::default();
        let step = mid_step(&sim, Condition::Normal);
        let rec = solver.solve_next(&sim, &step);
        assert_eq!(rec.action, Action::PrudentTouch);
        assert_eq!(rec.rationale, "mid pre quality: iq");
    }

    #[test]
    fn full_inner_quiet_starts_quality_rounds() {
        let sim = relic();
        let solver = Solver::default();
        let mut step = mid_step(&sim, Condition::Normal);
        step.iq_stacks = 10;
        step.progress = 6300;
        let rec = solver.solve_next(&sim, &step);
        assert_eq!(rec.action, Action::GreatStrides);
        assert_eq!(rec.rationale, "mid start quality");

        step.great_strides_left = 3;
        let rec = solver.solve_next(&sim, &step);
        assert_eq!(rec.action, Action::Innovation);
        assert_eq!(rec.rationale, "mid quality: gs->inno");

        step.innovation_left = 4;
        step.great_strides_left = 2;
        let rec = solver.solve_next(&sim, &step);
        assert_eq!(rec.action, Action::Observe);
        step.prev_combo_action = Some(Action::Observe);
        assert_eq!(solver.solve_next(&sim, &step).action, Action::FocusedTouch);
    }
}
