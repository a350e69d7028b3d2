use anyhow::Result;
use colored::Colorize;
use craftsim_game::{CraftSession, ExecuteResult, Simulator, Solver, StepState};
use std::io::Write;

/// Active timers as `Name(n)` tokens, skipping expired ones.
fn active_buffs(step: &StepState) -> String {
    let timers = [
        ("MuMe", step.muscle_memory_left),
        ("Vene", step.veneration_left),
        ("Inno", step.innovation_left),
        ("GS", step.great_strides_left),
        ("Manip", step.manipulation_left),
        ("WN", step.waste_not_left),
        ("FA", step.final_appraisal_left),
    ];
    let mut parts: Vec<String> = timers
        .iter()
        .filter(|(_, left)| *left > 0)
        .map(|(name, left)| format!("{name}({left})"))
        .collect();
    if step.heart_and_soul_active {
        parts.push("H&S".to_string());
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(" ")
    }
}

/// Play and print one attempt step by step.
pub fn trace_attempt(
    out: &mut dyn Write,
    sim: &Simulator,
    solver: &Solver,
    seed: u64,
    max_steps: usize,
) -> Result<()> {
    let params = sim.params();
    let mut session = CraftSession::new(sim, seed);
    let title = format!("🔍 Trace for seed {seed}");
    writeln!(out, "{}", title.as_str().bright_cyan().bold())?;
    writeln!(
        out,
        "{:>3} {:>11} {:>13} {:>5} {:>4} {:<10} {:>2}  {:<28} {:<24} result",
        "#", "progress", "quality", "dura", "cp", "condition", "iq", "buffs", "action"
    )?;

    for _ in 0..max_steps {
        if session.status().is_terminal() {
            break;
        }
        let step = session.current();
        let (rec, result) = session.solve_next(solver);
        let outcome = match result {
            ExecuteResult::Succeeded => "ok".green(),
            ExecuteResult::Failed => "failed".red(),
            ExecuteResult::CannotUse => "rejected".yellow().bold(),
        };
        writeln!(
            out,
            "{:>3} {:>5}/{:<5} {:>6}/{:<6} {:>5} {:>4} {:<10} {:>2}  {:<28} {:<24} {outcome}",
            step.index,
            step.progress,
            params.progress,
            step.quality,
            params.top_quality(),
            step.durability,
            step.remaining_cp,
            step.condition.label(),
            step.iq_stacks,
            active_buffs(&step),
            format!("{} [{}]", rec.action, rec.rationale)
        )?;
        if result == ExecuteResult::CannotUse {
            break;
        }
    }

    let last = session.current();
    writeln!(
        out,
        "{} after {} steps: progress {}/{}, quality {}, durability {}, cp {} (fingerprint {:016x})",
        session.status().label().bold(),
        session.history().len() - 1,
        last.progress,
        params.progress,
        last.quality,
        last.durability,
        last.remaining_cp,
        session.fingerprint()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use craftsim_game::CraftParameters;

    #[test]
    fn buffs_render_only_active_timers() {
        let params = CraftParameters::relic_preset();
        let mut step = StepState::initial(&params, 0.5, 0.5);
        assert_eq!(active_buffs(&step), "-");
        step.innovation_left = 3;
        step.manipulation_left = 7;
        step.heart_and_soul_active = true;
        assert_eq!(active_buffs(&step), "Inno(3) Manip(7) H&S");
    }

    #[test]
    fn trace_prints_opener_and_final_status() {
        colored::control::set_override(false);
        let sim = Simulator::new(CraftParameters::relic_preset()).unwrap();
        let mut buf = Vec::new();
        trace_attempt(&mut buf, &sim, &Solver::default(), 12, 256).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Trace for seed 12"));
        assert!(text.contains("Muscle Memory [opener]"));
        assert!(text.contains("fingerprint"));
    }
}
