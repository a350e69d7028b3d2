mod logic;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use craftsim_game::constants::MAX_ATTEMPT_STEPS;
use craftsim_game::{CraftPolicy, RecipePreset, SeedPlan, Solver, run_batch};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    ReportContext, build_simulator, default_config_json, load_recipe, load_solver_config,
    resolve_seed_plan, trace_attempt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colorized summary for humans
    Console,
    /// Machine-readable summary with per-attempt records
    Json,
    /// Markdown tables for pasting into notes
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    /// Level 90 expert relic recipe
    Relic,
    /// Plain non-expert recipe
    Basic,
}

impl From<PresetArg> for RecipePreset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::Relic => Self::Relic,
            PresetArg::Basic => Self::Basic,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "craftsim-tester", version)]
#[command(about = "Batch runner and step tracer for the crafting solver")]
struct Args {
    /// Recipe parameters as a JSON file (overrides --preset)
    #[arg(long)]
    recipe: Option<PathBuf>,

    /// Built-in recipe to use when no --recipe file is given
    #[arg(long, value_enum, default_value_t = PresetArg::Relic)]
    preset: PresetArg,

    /// Solver settings as a flat JSON key/value record
    #[arg(long)]
    solver_config: Option<PathBuf>,

    /// Number of attempts to run with derived seeds
    #[arg(long, default_value_t = 1000)]
    attempts: usize,

    /// Base seed that attempt seeds are derived from
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Explicit seeds to run (comma-separated), replacing derived ones
    #[arg(long)]
    seeds: Option<String>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Trace a single attempt step by step instead of running a batch
    #[arg(long)]
    trace: bool,

    /// Print the default solver settings as flat JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    if args.output.is_some() {
        colored::control::set_override(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;

    if args.dump_config {
        writeln!(output_target.writer(), "{}", default_config_json()?)?;
        output_target.flush_inner()?;
        return Ok(());
    }

    let preset = RecipePreset::from(args.preset);
    let params = load_recipe(args.recipe.as_deref(), preset)?;
    let config = load_solver_config(args.solver_config.as_deref())?;
    let sim = build_simulator(params)?;
    let solver = Solver::new(config);
    let plan = resolve_seed_plan(args.seeds.as_deref(), args.seed, args.attempts)?;

    if args.trace {
        let seed = trace_seed(&plan);
        trace_attempt(
            output_target.writer(),
            &sim,
            &solver,
            seed,
            MAX_ATTEMPT_STEPS,
        )?;
        output_target.flush_inner()?;
        return Ok(());
    }

    announce_banner(&args);
    let start_time = Instant::now();
    let summary = run_batch(&sim, &solver, &plan);
    let context = ReportContext {
        recipe: recipe_label(&args, preset),
        policy: solver.name(),
        generated_at: Utc::now(),
        elapsed: start_time.elapsed(),
        verbose: args.verbose,
    };
    log::info!(
        "{} attempts finished in {:?}",
        summary.attempts,
        context.elapsed
    );

    let out = output_target.writer();
    match args.report {
        ReportFormat::Console => logic::reports::generate_console_report(out, &summary, &context)?,
        ReportFormat::Json => logic::reports::generate_json_report(out, &summary, &context)?,
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(out, &summary, &context)?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

/// First seed of the plan: the explicit one, or attempt 0 of the derived run.
fn trace_seed(plan: &SeedPlan) -> u64 {
    match plan {
        SeedPlan::Explicit(seeds) => seeds.first().copied().unwrap_or_default(),
        SeedPlan::Derived { base_seed, .. } => craftsim_game::derive_attempt_seed(*base_seed, 0),
    }
}

fn recipe_label(args: &Args, preset: RecipePreset) -> String {
    args.recipe.as_ref().map_or_else(
        || preset.key().to_string(),
        |path| path.display().to_string(),
    )
}

fn announce_banner(args: &Args) {
    // Keep machine-readable reports clean on stdout.
    if args.report != ReportFormat::Console {
        return;
    }
    eprintln!("{}", "🧪 Craftsim Batch Tester".bright_cyan().bold());
    eprintln!("{}", "========================".cyan());
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
