//! Closing the craft: cash Inner Quiet into Byregot's Blessing, then push
//! progress over the line.
use super::{BYREGOT_CP, Context, Recommendation};
use crate::action::Action;
use crate::condition::Condition;
use crate::constants::{
    GREAT_STRIDES_BONUS_PCT, INNOVATION_BONUS_PCT, MANIPULATION_RESTORE, MASTERS_MEND_RESTORE,
};
use crate::simulator::byregot_potency;

const PCT: u64 = 100;

impl Context<'_> {
    /// Byregot's Blessing, optionally primed with one buff, when it alone
    /// reaches the top quality tier.
    pub(super) fn finish_quality(&self, cp: i64) -> Option<Recommendation> {
        let step = self.step;
        if step.iq_stacks == 0 {
            return None;
        }
        let missing =
            i64::from(self.sim.params().top_quality()) - i64::from(step.quality);
        if missing <= 0 {
            return None;
        }
        if step.durability <= self.dura_cost(Action::ByregotsBlessing)
            || cp < self.cp_cost(Action::ByregotsBlessing)
        {
            return None;
        }

        if missing <= i64::from(self.sim.quality_gain(step, Action::ByregotsBlessing)) {
            return Some(Recommendation::new(Action::ByregotsBlessing, "fq: immediate"));
        }

        // The buff step itself moves Good Omen to Good.
        let potency = u64::from(byregot_potency(step.iq_stacks));
        let iq = u64::from(step.iq_stacks);
        let next_condition_pct = if step.condition == Condition::GoodOmen {
            self.sim.quality_condition_pct(Condition::Good)
        } else {
            PCT
        };
        let both_buffs = PCT + GREAT_STRIDES_BONUS_PCT + INNOVATION_BONUS_PCT;
        let strides_only = PCT + GREAT_STRIDES_BONUS_PCT;
        let reachable = |condition_pct: u64, buff_pct: u64| {
            missing <= i64::from(self.sim.scaled_quality(condition_pct, potency, iq, buff_pct))
        };

        if step.great_strides_left > 1 && step.innovation_left == 0 {
            if cp >= self.cp_cost(Action::Innovation) + BYREGOT_CP
                && reachable(next_condition_pct, both_buffs)
            {
                return Some(Recommendation::new(Action::Innovation, "fq: inno->byregot"));
            }
        } else if step.great_strides_left == 0
            && cp >= self.cp_cost(Action::GreatStrides) + BYREGOT_CP
        {
            let buff_pct = if step.innovation_left > 1 {
                both_buffs
            } else {
                strides_only
            };
            if reachable(next_condition_pct, buff_pct) {
                return Some(Recommendation::new(Action::GreatStrides, "fq: gs->byregot"));
            }
            if step.innovation_left <= 1
                && cp >= self.cp_cost(Action::GreatStrides) + self.cp_cost(Action::Innovation) + BYREGOT_CP
                && reachable(PCT, both_buffs)
            {
                return Some(Recommendation::new(
                    Action::GreatStrides,
                    "fq: gs->inno->byregot",
                ));
            }
        }
        None
    }

    /// Finish the progress bar with whatever CP is left.
    pub(super) fn finish_progress(&self) -> Action {
        let step = self.step;
        let cp = self.cp();
        let target = self.sim.params().progress;

        if step.condition.is_good_or_better() {
            return if self.can_use_synth(Action::IntensiveSynthesis) {
                Action::IntensiveSynthesis
            } else {
                Action::TricksOfTheTrade
            };
        }

        if step.condition == Condition::Pliant {
            // Half-price repairs, but only with enough CP left for Careful Synthesis after.
            if step.manipulation_left <= 1
                && cp >= self.cp_cost(Action::Manipulation) + 4 * 12
            {
                return Action::Manipulation;
            }
            let manip_tick = if step.manipulation_left > 0 {
                MANIPULATION_RESTORE
            } else {
                0
            };
            if step.durability + MASTERS_MEND_RESTORE + manip_tick <= self.sim.params().durability
                && cp >= self.cp_cost(Action::MastersMend) + 3 * 12
            {
                return Action::MastersMend;
            }
            if cp >= self.cp_cost(Action::Veneration) && step.veneration_left <= 1 {
                return Action::Veneration;
            }
            if self.can_use_synth(Action::PrudentSynthesis) {
                return Action::PrudentSynthesis;
            }
        }

        if step.condition == Condition::GoodOmen
            && cp >= self.cp_cost(Action::Veneration) + self.cp_cost(Action::IntensiveSynthesis)
            && step.veneration_left <= 1
        {
            return Action::Veneration;
        }

        if step.condition == Condition::Malleable
            && self.can_afford_synth(Action::IntensiveSynthesis)
            && (step.heart_and_soul_available || step.heart_and_soul_active)
        {
            let fallback = if cp >= self.cp_cost(Action::CarefulSynthesis) {
                Action::CarefulSynthesis
            } else {
                Action::BasicSynthesis
            };
            if step.progress.saturating_add(self.sim.progress_gain(step, fallback)) < target {
                return if step.heart_and_soul_active {
                    Action::IntensiveSynthesis
                } else {
                    Action::HeartAndSoul
                };
            }
        }

        if step.prev_combo_action == Some(Action::Observe)
            && self.can_use_synth(Action::FocusedSynthesis)
        {
            return Action::FocusedSynthesis;
        }

        if matches!(
            step.condition,
            Condition::Normal | Condition::Pliant | Condition::Centered | Condition::Primed
        ) && step.manipulation_left > 0
            && step.durability <= 10
            && cp >= self.cp_cost(Action::Observe) + self.cp_cost(Action::FocusedSynthesis)
        {
            return Action::Observe;
        }

        if self.can_use_synth(Action::CarefulSynthesis) {
            return Action::CarefulSynthesis;
        }
        if self.can_use_synth(Action::PrudentSynthesis) {
            return Action::PrudentSynthesis;
        }
        if self.dura_cost(Action::RapidSynthesis) < step.durability {
            return Action::RapidSynthesis;
        }
        if step.progress.saturating_add(self.sim.progress_gain(step, Action::BasicSynthesis)) >= target {
            return Action::BasicSynthesis;
        }

        if cp >= self.cp_cost(Action::IntensiveSynthesis)
            && (self.sim.can_use(step, Action::IntensiveSynthesis) || step.heart_and_soul_available)
        {
            return if self.sim.can_use(step, Action::IntensiveSynthesis) {
                Action::IntensiveSynthesis
            } else {
                Action::HeartAndSoul
            };
        }
        Action::RapidSynthesis
    }

    /// Usable right now and [`Self::can_afford_synth`].
    fn can_use_synth(&self, action: Action) -> bool {
        self.sim.can_use(self.step, action) && self.can_afford_synth(action)
    }

    /// Affordable and either leaves durability or completes the craft.
    /// Condition gating is left to the caller.
    fn can_afford_synth(&self, action: Action) -> bool {
        let step = self.step;
        if self.cp() < self.cp_cost(action) {
            return false;
        }
        step.durability > self.dura_cost(action)
            || step.progress.saturating_add(self.sim.progress_gain(step, action))
                >= self.sim.params().progress
    }

    /// Affordable from `cp` and keeps the craft above 10 effective durability.
    pub(super) fn can_use_safely_in_finisher(&self, action: Action, cp: i64) -> bool {
        let dura_cost = self.dura_cost(action);
        self.step.durability > dura_cost
            && self.effective_durability() - dura_cost > 10
            && cp >= self.cp_cost(action)
    }
}

#[cfg(test)]
mod tests {
    use crate::action::Action;
    use crate::condition::Condition;
    use crate::params::CraftParameters;
    use crate::simulator::Simulator;
    use crate::solver::Solver;
    use crate::state::StepState;

    fn relic() -> Simulator {
        Simulator::new(CraftParameters::relic_preset()).unwrap()
    }

    fn late_step(sim: &Simulator, condition: Condition) -> StepState {
        let mut step = StepState::initial(sim.params(), 0.5, 0.5).with_condition(condition);
        step.index = 20;
        step.progress = 6300;
        step.quality = 14000;
        step.iq_stacks = 10;
        step.durability = 30;
        step.remaining_cp = 200;
        step
    }

    #[test]
    fn byregot_fires_when_it_reaches_the_top_tier() {
        let sim = relic();
        let step = late_step(&sim, Condition::Normal);
        let rec = Solver::default().solve_next(&sim, &step);
        assert_eq!(rec.action, Action::ByregotsBlessing);
        assert_eq!(rec.rationale, "fq: immediate");
    }

    #[test]
    fn great_strides_primes_byregot() {
        let sim = relic();
        let mut step = late_step(&sim, Condition::Normal);
        // Byregot alone adds 1560; with Great Strides 3120.
        step.quality = 12500;
        let rec = Solver::default().solve_next(&sim, &step);
        assert_eq!(rec.action, Action::GreatStrides);
        assert_eq!(rec.rationale, "fq: gs->byregot");

        step.great_strides_left = 3;
        step.quality = 11500;
        let rec = Solver::default().solve_next(&sim, &step);
        assert_eq!(rec.action, Action::Innovation);
        assert_eq!(rec.rationale, "fq: inno->byregot");
    }

    #[test]
    fn finished_quality_moves_to_progress() {
        let sim = relic();
        let mut step = late_step(&sim, Condition::Normal);
        step.quality = 15000;
        let rec = Solver::default().solve_next(&sim, &step);
        assert_eq!(rec.action, Action::CarefulSynthesis);
        assert_eq!(rec.rationale, "finish");

        step = step.with_condition(Condition::Good);
        assert_eq!(
            Solver::default().solve_next(&sim, &step).action,
            Action::IntensiveSynthesis
        );
    }

    #[test]
    fn malleable_finisher_arms_heart_and_soul_for_intensive() {
        let sim = relic();
        let mut step = late_step(&sim, Condition::Malleable);
        step.progress = 5000;
        step.quality = 15000;
        assert!(step.heart_and_soul_available);
        assert!(!sim.can_use(&step, Action::IntensiveSynthesis));
        assert_eq!(
            Solver::default().solve_next(&sim, &step).action,
            Action::HeartAndSoul
        );

        step.heart_and_soul_available = false;
        step.heart_and_soul_active = true;
        assert_eq!(
            Solver::default().solve_next(&sim, &step).action,
            Action::IntensiveSynthesis
        );
    }

    #[test]
    fn broke_finisher_falls_back_to_free_progress() {
        let sim = relic();
        let mut step = late_step(&sim, Condition::Normal);
        step.quality = 15000;
        step.remaining_cp = 0;
        assert_eq!(
            Solver::default().solve_next(&sim, &step).action,
            Action::RapidSynthesis
        );
        step.durability = 10;
        step.progress = 6400;
        assert_eq!(
            Solver::default().solve_next(&sim, &step).action,
            Action::BasicSynthesis
        );
    }
}
