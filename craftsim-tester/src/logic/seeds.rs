use anyhow::{Result, bail};
use craftsim_game::SeedPlan;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse a comma-separated seed list. Negative values are folded onto their
/// magnitude so seeds copied from other tools still work.
pub fn parse_seed_list(list: &str) -> Result<Vec<u64>> {
    let mut seeds = Vec::new();
    for token in split_csv(list) {
        if let Ok(value) = token.parse::<u64>() {
            seeds.push(value);
            continue;
        }
        if let Ok(value) = token.parse::<i64>() {
            seeds.push(value.unsigned_abs());
            continue;
        }
        bail!("Unrecognized seed token: {token}");
    }
    if seeds.is_empty() {
        bail!("--seeds was given but contains no seeds");
    }
    Ok(seeds)
}

/// Explicit seeds win over the derived plan.
pub fn resolve_seed_plan(seeds: Option<&str>, base_seed: u64, attempts: usize) -> Result<SeedPlan> {
    match seeds {
        Some(list) => Ok(SeedPlan::Explicit(parse_seed_list(list)?)),
        None => Ok(SeedPlan::Derived {
            base_seed,
            attempts,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" 1, ,22,  333 ");
        assert_eq!(parts, vec!["1", "22", "333"]);
    }

    #[test]
    fn parses_mixed_sign_seeds() {
        assert_eq!(parse_seed_list("7, -8,18446744073709551615").unwrap(), vec![
            7,
            8,
            u64::MAX
        ]);
    }

    #[test]
    fn rejects_garbage_and_empty_lists() {
        assert!(parse_seed_list("12,abc").is_err());
        assert!(parse_seed_list(" , ").is_err());
    }

    #[test]
    fn explicit_seeds_override_derivation() {
        let plan = resolve_seed_plan(Some("4,5"), 1, 100).unwrap();
        assert_eq!(plan, SeedPlan::Explicit(vec![4, 5]));
        let plan = resolve_seed_plan(None, 1, 3).unwrap();
        assert_eq!(plan.seeds().len(), 3);
    }
}
