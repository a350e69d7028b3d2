pub mod presets;
pub mod reports;
pub mod seeds;
pub mod trace;

pub use presets::{build_simulator, default_config_json, load_recipe, load_solver_config};
pub use reports::ReportContext;
pub use seeds::resolve_seed_plan;
pub use trace::trace_attempt;
