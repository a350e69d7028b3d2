use craftsim_game::constants::IQ_MAX_STACKS;
use craftsim_game::{
    Action, Condition, CraftParameters, CraftRng, CraftStatus, ExecuteResult, ForcedResult,
    Simulator, StepState, trajectory_fingerprint,
};
use proptest::prelude::*;

fn relic() -> Simulator {
    Simulator::new(CraftParameters::relic_preset()).unwrap()
}

fn mid_craft(sim: &Simulator, condition: Condition) -> StepState {
    let mut step = StepState::initial(sim.params(), 0.0, 0.5).with_condition(condition);
    step.index = 6;
    step.heart_and_soul_available = false;
    step
}

/// Apply `actions` in order, returning every (result, before, after) triple.
fn play(
    sim: &Simulator,
    seed: u64,
    actions: &[usize],
) -> Vec<(Action, ExecuteResult, StepState, StepState)> {
    let mut rng = CraftRng::from_seed(seed);
    let mut step = sim.initial_state(&mut rng);
    let mut out = Vec::with_capacity(actions.len());
    for index in actions {
        let action = Action::ALL[index % Action::ALL.len()];
        let (result, next) = sim.apply(&step, action, ForcedResult::Random, &mut rng);
        out.push((action, result, step, next));
        step = next;
    }
    out
}

#[test]
fn final_appraisal_clamps_progress_below_target() {
    let sim = relic();
    let mut rng = CraftRng::from_seed(1);
    let mut step = mid_craft(&sim, Condition::Normal);
    step.progress = sim.params().progress - 10;
    step.final_appraisal_left = 3;
    let (result, next) = sim.apply(
        &step,
        Action::RapidSynthesis,
        ForcedResult::ForceSuccess,
        &mut rng,
    );
    assert_eq!(result, ExecuteResult::Succeeded);
    assert_eq!(next.progress, sim.params().progress - 1);
    assert_eq!(next.final_appraisal_left, 0);
    assert_eq!(sim.status(&next), CraftStatus::InProgress);
}

#[test]
fn favourable_condition_actions_are_gated() {
    let sim = relic();
    let mut rng = CraftRng::from_seed(2);
    let step = mid_craft(&sim, Condition::Normal);
    for action in [
        Action::IntensiveSynthesis,
        Action::PreciseTouch,
        Action::TricksOfTheTrade,
    ] {
        let (result, next) = sim.apply(&step, action, ForcedResult::Random, &mut rng);
        assert_eq!(result, ExecuteResult::CannotUse, "{action}");
        assert_eq!(next, step);
    }
    assert_eq!(rng.draws(), 0);

    let mut charged = step;
    charged.heart_and_soul_active = true;
    let (result, _) = sim.apply(
        &charged,
        Action::PreciseTouch,
        ForcedResult::Random,
        &mut rng,
    );
    assert_ne!(result, ExecuteResult::CannotUse);
}

#[test]
fn trained_finesse_needs_full_inner_quiet() {
    let sim = relic();
    let mut rng = CraftRng::from_seed(3);
    let mut step = mid_craft(&sim, Condition::Normal);
    step.iq_stacks = IQ_MAX_STACKS - 1;
    let (result, _) = sim.apply(&step, Action::TrainedFinesse, ForcedResult::Random, &mut rng);
    assert_eq!(result, ExecuteResult::CannotUse);

    step.iq_stacks = IQ_MAX_STACKS;
    let (result, next) = sim.apply(&step, Action::TrainedFinesse, ForcedResult::Random, &mut rng);
    assert_eq!(result, ExecuteResult::Succeeded);
    assert_eq!(next.durability, step.durability);
    assert_eq!(next.iq_stacks, IQ_MAX_STACKS);
    assert!(next.quality > step.quality);
}

#[test]
fn terminal_states_reject_everything() {
    let sim = relic();
    let mut rng = CraftRng::from_seed(4);
    let mut broken = mid_craft(&sim, Condition::Good);
    broken.durability = 0;
    let mut finished = mid_craft(&sim, Condition::Normal);
    finished.progress = sim.params().progress;
    for step in [broken, finished] {
        assert!(sim.status(&step).is_terminal());
        for action in Action::ALL {
            let (result, next) = sim.apply(&step, action, ForcedResult::ForceSuccess, &mut rng);
            assert_eq!(result, ExecuteResult::CannotUse);
            assert_eq!(next, step);
        }
    }
    assert_eq!(rng.draws(), 0);
}

#[test]
fn byregot_resets_inner_quiet() {
    let sim = relic();
    let mut rng = CraftRng::from_seed(5);
    let mut step = mid_craft(&sim, Condition::Normal);
    step.iq_stacks = 7;
    let (_, next) = sim.apply(&step, Action::ByregotsBlessing, ForcedResult::Random, &mut rng);
    assert_eq!(next.iq_stacks, 0);
}

#[test]
fn failed_rolls_still_spend_resources() {
    let sim = relic();
    let mut rng = CraftRng::from_seed(6);
    let step = mid_craft(&sim, Condition::Normal);
    let (result, next) = sim.apply(&step, Action::HastyTouch, ForcedResult::ForceFail, &mut rng);
    assert_eq!(result, ExecuteResult::Failed);
    assert_eq!(next.quality, step.quality);
    assert_eq!(next.durability, step.durability - 10);
    assert_eq!(next.index, step.index + 1);
}

#[test]
fn quality_thresholds_classify_finished_crafts() {
    let sim = relic();
    let mut step = mid_craft(&sim, Condition::Normal);
    step.progress = sim.params().progress;
    let [q1, q2, q3] = sim.params().quality_thresholds;
    for (quality, status) in [
        (q1 - 1, CraftStatus::FailedMinQuality),
        (q1, CraftStatus::SucceededTier1),
        (q2, CraftStatus::SucceededTier2),
        (q3, CraftStatus::SucceededTier3),
    ] {
        step.quality = quality;
        assert_eq!(sim.status(&step), status);
    }
}

#[test]
fn great_strides_is_spent_by_any_quality_gain() {
    let sim = relic();
    let mut rng = CraftRng::from_seed(7);
    let mut step = mid_craft(&sim, Condition::Normal);
    step.great_strides_left = 3;

    let (_, touched) = sim.apply(&step, Action::BasicTouch, ForcedResult::ForceSuccess, &mut rng);
    assert!(touched.quality > step.quality);
    assert_eq!(touched.great_strides_left, 0);

    let (_, synthed) = sim.apply(&step, Action::BasicSynthesis, ForcedResult::ForceSuccess, &mut rng);
    assert_eq!(synthed.great_strides_left, 2);

    let (result, missed) = sim.apply(&step, Action::HastyTouch, ForcedResult::ForceFail, &mut rng);
    assert_eq!(result, ExecuteResult::Failed);
    assert_eq!(missed.great_strides_left, 2);
}

#[test]
fn prudent_actions_wait_for_waste_not_to_expire() {
    let sim = relic();
    let mut rng = CraftRng::from_seed(8);
    let mut step = mid_craft(&sim, Condition::Normal);
    step.waste_not_left = 2;
    for action in [Action::PrudentTouch, Action::PrudentSynthesis] {
        assert!(action.blocked_by_waste_not());
        let (result, next) = sim.apply(&step, action, ForcedResult::ForceSuccess, &mut rng);
        assert_eq!(result, ExecuteResult::CannotUse, "{action}");
        assert_eq!(next, step);
    }

    step.waste_not_left = 0;
    for action in [Action::PrudentTouch, Action::PrudentSynthesis] {
        let (result, next) = sim.apply(&step, action, ForcedResult::ForceSuccess, &mut rng);
        assert_eq!(result, ExecuteResult::Succeeded, "{action}");
        assert_eq!(next.durability, step.durability - 5);
    }
}

#[test]
fn conditions_scale_quality_and_progress() {
    let sim = relic();
    let mut rng = CraftRng::from_seed(9);
    let normal = mid_craft(&sim, Condition::Normal);
    let base_touch = sim.quality_gain(&normal, Action::BasicTouch);
    assert_eq!(base_touch, sim.base_quality());

    for (condition, expected) in [
        (Condition::Excellent, base_touch * 4),
        (Condition::Poor, base_touch / 2),
        (Condition::Malleable, base_touch),
    ] {
        let step = mid_craft(&sim, condition);
        let (_, next) = sim.apply(&step, Action::BasicTouch, ForcedResult::ForceSuccess, &mut rng);
        assert_eq!(next.quality - step.quality, expected, "{condition}");
    }

    // Basic Synthesis is 120 potency at level 90; Malleable adds half again.
    let base_synth = sim.progress_gain(&normal, Action::BasicSynthesis);
    assert_eq!(base_synth, sim.base_progress() * 120 / 100);
    let malleable = mid_craft(&sim, Condition::Malleable);
    let (_, next) = sim.apply(&malleable, Action::BasicSynthesis, ForcedResult::ForceSuccess, &mut rng);
    assert_eq!(next.progress, sim.base_progress() * 150 * 120 / 10_000);
    let (_, next) = sim.apply(&normal, Action::BasicSynthesis, ForcedResult::ForceSuccess, &mut rng);
    assert_eq!(next.progress, base_synth);
}

#[test]
fn manipulation_repairs_from_the_following_turn() {
    let sim = relic();
    let mut rng = CraftRng::from_seed(10);
    let mut step = mid_craft(&sim, Condition::Normal);
    step.durability = 40;

    let (_, cast) = sim.apply(&step, Action::Manipulation, ForcedResult::ForceSuccess, &mut rng);
    assert_eq!(cast.durability, 40);
    assert_eq!(cast.manipulation_left, 8);

    let cast = cast.with_condition(Condition::Normal);
    let (_, synthed) = sim.apply(&cast, Action::BasicSynthesis, ForcedResult::ForceSuccess, &mut rng);
    assert_eq!(synthed.durability, 40 - 10 + 5);
    assert_eq!(synthed.manipulation_left, 7);

    let synthed = synthed.with_condition(Condition::Normal);
    let (_, observed) = sim.apply(&synthed, Action::Observe, ForcedResult::ForceSuccess, &mut rng);
    assert_eq!(observed.durability, 40);

    let mut full = observed.with_condition(Condition::Normal);
    full.durability = sim.params().durability;
    let (_, capped) = sim.apply(&full, Action::Observe, ForcedResult::ForceSuccess, &mut rng);
    assert_eq!(capped.durability, sim.params().durability);
}

#[test]
fn trained_eye_only_opens_low_level_crafts() {
    let basic = Simulator::new(CraftParameters::basic_preset()).unwrap();
    let mut rng = CraftRng::from_seed(11);
    let opening = StepState::initial(basic.params(), 0.5, 0.5);
    assert_eq!(opening.index, 1);
    let (result, next) = basic.apply(&opening, Action::TrainedEye, ForcedResult::Random, &mut rng);
    assert_eq!(result, ExecuteResult::Succeeded);
    assert_eq!(next.quality, basic.params().quality_max);

    let mut later = opening;
    later.index = 2;
    let (result, _) = basic.apply(&later, Action::TrainedEye, ForcedResult::Random, &mut rng);
    assert_eq!(result, ExecuteResult::CannotUse);

    let sim = relic();
    let expert_opening = StepState::initial(sim.params(), 0.5, 0.5);
    let (result, _) = sim.apply(&expert_opening, Action::TrainedEye, ForcedResult::Random, &mut rng);
    assert_eq!(result, ExecuteResult::CannotUse);
}

#[test]
fn huge_stats_saturate_instead_of_overflowing() {
    let params = CraftParameters {
        control: u32::MAX,
        craftsmanship: u32::MAX,
        quality_divider: 1,
        progress_divider: 1,
        ..CraftParameters::relic_preset()
    };
    let sim = Simulator::new(params).unwrap();
    let mut rng = CraftRng::from_seed(12);
    let mut step = mid_craft(&sim, Condition::Excellent);
    step.iq_stacks = IQ_MAX_STACKS;
    step.great_strides_left = 3;
    step.innovation_left = 4;
    step.quality = 1;
    assert_eq!(sim.quality_gain(&step, Action::ByregotsBlessing), u32::MAX);
    let (result, next) = sim.apply(&step, Action::ByregotsBlessing, ForcedResult::ForceSuccess, &mut rng);
    assert_eq!(result, ExecuteResult::Succeeded);
    assert_eq!(next.quality, u32::MAX);
}

proptest! {
    #[test]
    fn prop_resources_and_stacks_stay_in_bounds(
        seed in any::<u64>(),
        actions in proptest::collection::vec(0..33usize, 1..60)
    ) {
        let sim = relic();
        let params = sim.params();
        for (action, result, before, after) in play(&sim, seed, &actions) {
            prop_assert!(after.iq_stacks <= IQ_MAX_STACKS);
            prop_assert!(after.durability <= params.durability);
            prop_assert!(after.remaining_cp <= params.max_cp);
            match result {
                ExecuteResult::CannotUse => prop_assert_eq!(after, before),
                ExecuteResult::Succeeded if action == Action::ByregotsBlessing => {
                    prop_assert_eq!(after.iq_stacks, 0);
                }
                ExecuteResult::Succeeded | ExecuteResult::Failed => {
                    prop_assert_eq!(after.index, before.index + 1);
                    prop_assert!(after.remaining_cp <= before.remaining_cp || action == Action::TricksOfTheTrade);
                }
            }
        }
    }

    #[test]
    fn prop_turn_free_actions_freeze_timers(
        seed in any::<u64>(),
        actions in proptest::collection::vec(0..33usize, 1..60)
    ) {
        let sim = relic();
        for (action, result, before, after) in play(&sim, seed, &actions) {
            if result == ExecuteResult::CannotUse {
                continue;
            }
            if action.is_turn_free() {
                prop_assert_eq!(after.waste_not_left, before.waste_not_left);
                prop_assert_eq!(after.manipulation_left, before.manipulation_left);
                prop_assert_eq!(after.great_strides_left, before.great_strides_left);
                prop_assert_eq!(after.innovation_left, before.innovation_left);
                prop_assert_eq!(after.veneration_left, before.veneration_left);
                prop_assert_eq!(after.muscle_memory_left, before.muscle_memory_left);
                prop_assert_eq!(after.durability, before.durability);
            } else {
                let ticks = [
                    (Action::WasteNot, before.waste_not_left, after.waste_not_left),
                    (Action::Manipulation, before.manipulation_left, after.manipulation_left),
                    (Action::Innovation, before.innovation_left, after.innovation_left),
                    (Action::Veneration, before.veneration_left, after.veneration_left),
                ];
                for (refresh, was, now) in ticks {
                    let refreshed = action == refresh || (refresh == Action::WasteNot && action == Action::WasteNot2);
                    if was > 0 && !refreshed {
                        prop_assert_eq!(now, was - 1);
                    }
                }
            }
        }
    }

    #[test]
    fn prop_status_matches_progress_and_durability(
        seed in any::<u64>(),
        actions in proptest::collection::vec(0..33usize, 1..60)
    ) {
        let sim = relic();
        for (_, result, _, after) in play(&sim, seed, &actions) {
            if result == ExecuteResult::CannotUse {
                continue;
            }
            let running = after.progress < sim.params().progress && after.durability > 0;
            prop_assert_eq!(sim.status(&after) == CraftStatus::InProgress, running);
        }
    }

    #[test]
    fn prop_identical_seeds_replay_identically(
        seed in any::<u64>(),
        actions in proptest::collection::vec(0..33usize, 1..40)
    ) {
        let sim = relic();
        let first: Vec<StepState> = play(&sim, seed, &actions).into_iter().map(|(_, _, _, s)| s).collect();
        let second: Vec<StepState> = play(&sim, seed, &actions).into_iter().map(|(_, _, _, s)| s).collect();
        prop_assert_eq!(trajectory_fingerprint(&first), trajectory_fingerprint(&second));
        prop_assert_eq!(first, second);
    }
}
