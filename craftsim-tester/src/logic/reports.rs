use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use craftsim_game::{BatchSummary, Condition, CraftStatus, TransitionTally};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

/// Run metadata printed alongside the summary.
#[derive(Debug, Clone, Serialize)]
pub struct ReportContext {
    pub recipe: String,
    pub policy: &'static str,
    pub generated_at: DateTime<Utc>,
    #[serde(skip)]
    pub elapsed: Duration,
    #[serde(skip)]
    pub verbose: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    context: &'a ReportContext,
    success_rate: f64,
    summary: &'a BatchSummary,
}

fn status_colored(status: CraftStatus, text: &str) -> ColoredString {
    match status {
        CraftStatus::SucceededTier3 => text.bright_green().bold(),
        CraftStatus::SucceededTier2 | CraftStatus::SucceededTier1 => text.green(),
        CraftStatus::FailedDurability | CraftStatus::FailedMinQuality => text.red(),
        CraftStatus::InProgress => text.yellow(),
    }
}

pub fn generate_console_report(
    out: &mut dyn Write,
    summary: &BatchSummary,
    context: &ReportContext,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Craft Batch Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "======================".cyan())?;
    writeln!(out, "Recipe: {}", context.recipe)?;
    writeln!(out, "Policy: {}", context.policy)?;
    writeln!(out, "Attempts: {}", summary.attempts)?;
    writeln!(out)?;

    for status in CraftStatus::ALL {
        let line = format!(
            "{:<22} {:>6} ({:>5.1}%)",
            status.label(),
            summary.count(status),
            summary.percent(status)
        );
        writeln!(out, "{}", status_colored(status, &line))?;
    }
    if summary.stalled > 0 {
        let line = format!("Stalled (policy action rejected): {}", summary.stalled);
        writeln!(out, "{}", line.as_str().yellow())?;
    }
    writeln!(out)?;
    writeln!(out, "Success rate: {:.1}%", summary.success_rate())?;
    writeln!(out, "Average yield: {:.3}", summary.average_yield)?;
    writeln!(out, "Average steps: {:.2}", summary.average_steps)?;
    writeln!(out, "Average quality: {:.0}", summary.average_quality())?;
    writeln!(out, "Elapsed: {:?}", context.elapsed)?;

    if context.verbose {
        writeln!(out)?;
        writeln!(out, "{}", "🎲 Observed condition transitions".bright_yellow().bold())?;
        write_transition_rows(out, &summary.transitions, false)?;
        writeln!(out)?;
        writeln!(out, "{}", "Attempts".bold())?;
        for record in &summary.records {
            let line = format!(
                "  #{:<4} seed {:<20} {:<22} steps {:>3} quality {:>6} fp {:016x}",
                record.attempt,
                record.seed,
                record.status.label(),
                record.steps,
                record.final_quality,
                record.fingerprint
            );
            writeln!(out, "{}", status_colored(record.status, &line))?;
        }
    }
    Ok(())
}

pub fn generate_json_report(
    out: &mut dyn Write,
    summary: &BatchSummary,
    context: &ReportContext,
) -> Result<()> {
    let report = JsonReport {
        context,
        success_rate: summary.success_rate(),
        summary,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    summary: &BatchSummary,
    context: &ReportContext,
) -> Result<()> {
    writeln!(out, "# Craftsim Batch Results\n")?;
    writeln!(out, "- **Recipe**: {}", context.recipe)?;
    writeln!(out, "- **Policy**: {}", context.policy)?;
    writeln!(out, "- **Generated**: {}", context.generated_at.to_rfc3339())?;
    writeln!(out, "- **Attempts**: {}", summary.attempts)?;
    writeln!(out, "- **Success rate**: {:.1}%", summary.success_rate())?;
    writeln!(out, "- **Average yield**: {:.3}", summary.average_yield)?;
    writeln!(out, "- **Average steps**: {:.2}", summary.average_steps)?;
    writeln!(out, "- **Stalled**: {}\n", summary.stalled)?;

    writeln!(out, "## Outcomes\n")?;
    writeln!(out, "| Status | Count | Share |")?;
    writeln!(out, "|---|---:|---:|")?;
    for status in CraftStatus::ALL {
        writeln!(
            out,
            "| {} | {} | {:.1}% |",
            status.label(),
            summary.count(status),
            summary.percent(status)
        )?;
    }

    if summary.transitions.total() > 0 {
        writeln!(out, "\n## Condition transitions\n")?;
        write_transition_rows(out, &summary.transitions, true)?;
    }
    Ok(())
}

/// One row per observed source condition with the share of each successor.
fn write_transition_rows(out: &mut dyn Write, tally: &TransitionTally, markdown: bool) -> Result<()> {
    let header: Vec<&str> = Condition::ALL.iter().map(|c| c.label()).collect();
    if markdown {
        writeln!(out, "| From | n | {} |", header.join(" | "))?;
        writeln!(out, "|---|---:|{}", "---:|".repeat(header.len()))?;
    }
    for from in Condition::ALL {
        let total = tally.total_from(from);
        if total == 0 {
            continue;
        }
        let cells: Vec<String> = Condition::ALL
            .iter()
            .map(|to| format!("{:.3}", tally.frequency(from, *to)))
            .collect();
        if markdown {
            writeln!(out, "| {} | {total} | {} |", from.label(), cells.join(" | "))?;
        } else {
            let shares: Vec<String> = Condition::ALL
                .iter()
                .filter(|to| tally.count(from, **to) > 0)
                .map(|to| format!("{} {:.1}%", to.label(), tally.frequency(from, *to) * 100.0))
                .collect();
            writeln!(out, "  {:<10} (n={total}): {}", from.label(), shares.join(", "))?;
        }
    }
    Ok(())
}
