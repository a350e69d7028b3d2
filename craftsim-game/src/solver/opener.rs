//! First step and the Muscle Memory burst that follows it.
use super::{Context, Recommendation};
use crate::action::Action;
use crate::condition::Condition;

impl Context<'_> {
    pub(super) fn opener(&self) -> Recommendation {
        let action = if self.cfg.use_reflect_opener {
            Action::Reflect
        } else {
            Action::MuscleMemory
        };
        Recommendation::new(action, "opener")
    }

    /// Convert the Muscle Memory buff into progress; CP and durability are not
    /// a concern this early.
    pub(super) fn muscle_memory_burst(&self) -> Action {
        let step = self.step;
        let cfg = self.cfg;
        let mume_left = step.muscle_memory_left;
        let last_chance = mume_left == 1;
        let can_manip = mume_left > cfg.mume_min_steps_for_manip && step.manipulation_left == 0;
        let can_vene = mume_left > cfg.mume_min_steps_for_vene && step.veneration_left == 0;

        match step.condition {
            Condition::Pliant => {
                if can_manip {
                    return Action::Manipulation;
                }
                if can_vene {
                    return Action::Veneration;
                }
            }
            Condition::Primed if cfg.mume_primed_manip => {
                if can_vene {
                    return Action::Veneration;
                }
                if can_manip {
                    return Action::Manipulation;
                }
            }
            Condition::Centered => return Action::RapidSynthesis,
            Condition::Sturdy => {
                return self.mume_synth(cfg.mume_intensive_last_resort && last_chance);
            }
            Condition::Malleable => {
                return self.mume_synth(
                    cfg.mume_intensive_malleable || (cfg.mume_intensive_last_resort && last_chance),
                );
            }
            Condition::Good if cfg.mume_intensive_good => return Action::IntensiveSynthesis,
            _ => {}
        }

        if can_vene {
            return Action::Veneration;
        }
        if cfg.mume_allow_observe
            && mume_left > 1
            && step.durability < self.sim.params().durability
        {
            return Action::Observe;
        }
        self.mume_synth(cfg.mume_intensive_last_resort && last_chance)
    }

    /// Rapid Synthesis, or Intensive (unlocking it with Heart and Soul) when asked.
    fn mume_synth(&self, intensive: bool) -> Action {
        if !intensive {
            Action::RapidSynthesis
        } else if self.sim.can_use(self.step, Action::IntensiveSynthesis) {
            Action::IntensiveSynthesis
        } else if self.step.heart_and_soul_available {
            Action::HeartAndSoul
        } else {
            Action::RapidSynthesis
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::action::Action;
    use crate::condition::Condition;
    use crate::params::CraftParameters;
    use crate::simulator::Simulator;
    use crate::solver::{Solver, SolverConfig};
    use crate::state::StepState;

    fn burst_step(sim: &Simulator, mume_left: u32, condition: Condition) -> StepState {
        let mut step = StepState::initial(sim.params(), 0.5, 0.5).with_condition(condition);
        step.index = 2;
        step.muscle_memory_left = mume_left;
        step
    }

    #[test]
    fn pliant_prefers_manipulation_then_veneration() {
        let sim = Simulator::new(CraftParameters::relic_preset()).unwrap();
        let solver = Solver::default();
        let step = burst_step(&sim, 5, Condition::Pliant);
        assert_eq!(solver.solve_next(&sim, &step).action, Action::Manipulation);

        let mut manipulated = step;
        manipulated.manipulation_left = 6;
        assert_eq!(solver.solve_next(&sim, &manipulated).action, Action::Veneration);

        let late = burst_step(&sim, 2, Condition::Pliant);
        assert_eq!(solver.solve_next(&sim, &late).action, Action::Veneration);
    }

    #[test]
    fn conditions_steer_the_burst() {
        let sim = Simulator::new(CraftParameters::relic_preset()).unwrap();
        let solver = Solver::default();
        let centered = burst_step(&sim, 1, Condition::Centered);
        assert_eq!(solver.solve_next(&sim, &centered).action, Action::RapidSynthesis);

        let good = burst_step(&sim, 4, Condition::Good);
        assert_eq!(solver.solve_next(&sim, &good).action, Action::IntensiveSynthesis);

        let mut normal = burst_step(&sim, 4, Condition::Normal);
        assert_eq!(solver.solve_next(&sim, &normal).action, Action::Veneration);
        normal.veneration_left = 3;
        assert_eq!(solver.solve_next(&sim, &normal).action, Action::RapidSynthesis);
    }

    #[test]
    fn last_turn_forces_intensive_through_heart_and_soul() {
        let sim = Simulator::new(CraftParameters::relic_preset()).unwrap();
        let solver = Solver::default();
        let mut step = burst_step(&sim, 1, Condition::Normal);
        step.veneration_left = 2;
        assert_eq!(solver.solve_next(&sim, &step).action, Action::HeartAndSoul);
        step.heart_and_soul_available = false;
        step.heart_and_soul_active = true;
        assert_eq!(solver.solve_next(&sim, &step).action, Action::IntensiveSynthesis);

        let relaxed = Solver::new(SolverConfig {
            mume_intensive_last_resort: false,
            ..SolverConfig::default()
        });
        let step = burst_step(&sim, 1, Condition::Sturdy);
        assert_eq!(relaxed.solve_next(&sim, &step).action, Action::RapidSynthesis);
    }
}
