use anyhow::{Context, Result};
use craftsim_game::{CraftParameters, RecipePreset, Simulator, SolverConfig};
use std::fs;
use std::path::Path;

/// Recipe from a JSON file when given, otherwise the named preset.
pub fn load_recipe(path: Option<&Path>, preset: RecipePreset) -> Result<CraftParameters> {
    let Some(path) = path else {
        log::debug!("using built-in {preset} recipe");
        return Ok(preset.parameters());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read recipe {}", path.display()))?;
    CraftParameters::from_json(&json)
        .with_context(|| format!("invalid recipe {}", path.display()))
}

/// Solver settings from a flat JSON record, or the defaults.
pub fn load_solver_config(path: Option<&Path>) -> Result<SolverConfig> {
    let Some(path) = path else {
        return Ok(SolverConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read solver config {}", path.display()))?;
    SolverConfig::from_json(&json)
        .with_context(|| format!("invalid solver config {}", path.display()))
}

pub fn build_simulator(params: CraftParameters) -> Result<Simulator> {
    Simulator::new(params).context("recipe parameters rejected")
}

/// Default settings as a pretty flat JSON record.
pub fn default_config_json() -> Result<String> {
    serde_json::to_string_pretty(&SolverConfig::default().to_flat())
        .context("failed to serialize solver config")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(label: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "craftsim-presets-{label}-{}",
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_paths_fall_back_to_defaults() {
        let recipe = load_recipe(None, RecipePreset::Basic).unwrap();
        assert_eq!(recipe, CraftParameters::basic_preset());
        assert_eq!(load_solver_config(None).unwrap(), SolverConfig::default());
    }

    #[test]
    fn recipe_files_are_validated() {
        let mut params = CraftParameters::relic_preset();
        params.quality_thresholds = [3, 2, 1];
        let path = temp_file("bad-recipe", &serde_json::to_string(&params).unwrap());
        let err = load_recipe(Some(&path), RecipePreset::Relic).unwrap_err();
        assert!(format!("{err:#}").contains("quality"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn dumped_config_loads_back() {
        let json = default_config_json().unwrap();
        let path = temp_file("config", &json);
        assert_eq!(
            load_solver_config(Some(&path)).unwrap(),
            SolverConfig::default()
        );
        let _ = fs::remove_file(path);
    }
}
