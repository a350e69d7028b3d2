//! Static per-craft configuration: crafter stats, recipe numbers and the
//! condition transition table.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::condition::{Condition, ConditionTable};
use crate::numbers::saturate_u32;

const DEFAULT_MODIFIER: u32 = 100;

/// Errors raised when craft parameters violate their invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("{field} must be greater than zero")]
    ZeroDivider { field: &'static str },
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u32,
        value: u32,
    },
    #[error("quality thresholds must be non-decreasing (got {thresholds:?})")]
    QualityThresholds { thresholds: [u32; 3] },
    #[error("condition table must hold between 1 and {max} entries (got {len})")]
    ConditionTableLength { len: usize, max: usize },
    #[error("probability for {condition} must be within [0, 1] (got {value})")]
    ConditionProbability { condition: Condition, value: f64 },
    #[error("condition probabilities sum to {total:.4}, above 1")]
    ConditionTableSum { total: f64 },
    #[error("failed to parse craft parameters: {0}")]
    Parse(String),
}

/// Which level the crafter is compared against when deciding whether the
/// recipe's progress/quality modifiers apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelBasis {
    /// Compare against the recipe's class-job level.
    #[default]
    ClassJobLevel,
    /// Compare against the recipe's internal recipe level, falling back to
    /// the class-job level when none is supplied.
    RecipeLevel,
}

/// Built-in recipe setups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipePreset {
    /// Level 90 expert relic recipe with the relic condition table.
    #[default]
    Relic,
    /// Plain non-expert recipe with only Good/Excellent procs.
    Basic,
}

impl RecipePreset {
    pub const ALL: [Self; 2] = [Self::Relic, Self::Basic];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Relic => "relic",
            Self::Basic => "basic",
        }
    }

    #[must_use]
    pub fn parameters(self) -> CraftParameters {
        match self {
            Self::Relic => CraftParameters::relic_preset(),
            Self::Basic => CraftParameters::basic_preset(),
        }
    }
}

impl fmt::Display for RecipePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Crafter and recipe numbers for one craft attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftParameters {
    pub craftsmanship: u32,
    pub control: u32,
    pub max_cp: u32,
    pub level: u32,
    #[serde(default)]
    pub specialist: bool,
    #[serde(default)]
    pub splendorous: bool,

    #[serde(default)]
    pub expert: bool,
    /// Recipe class-job level.
    pub craft_level: u32,
    /// Internal recipe level, only consulted under [`LevelBasis::RecipeLevel`].
    #[serde(default)]
    pub recipe_level: Option<u32>,
    pub durability: u32,
    pub progress: u32,
    pub progress_divider: u32,
    #[serde(default = "default_modifier")]
    pub progress_modifier: u32,
    pub quality_divider: u32,
    #[serde(default = "default_modifier")]
    pub quality_modifier: u32,
    pub quality_max: u32,
    /// Breakpoints for the three success tiers, ascending.
    pub quality_thresholds: [u32; 3],

    #[serde(default)]
    pub conditions: ConditionTable,
    #[serde(default)]
    pub level_basis: LevelBasis,
}

const fn default_modifier() -> u32 {
    DEFAULT_MODIFIER
}

impl Default for CraftParameters {
    fn default() -> Self {
        Self::relic_preset()
    }
}

impl CraftParameters {
    /// Level 90 specialist on a tier-1 expert relic recipe.
    #[must_use]
    pub fn relic_preset() -> Self {
        Self {
            craftsmanship: 4065,
            control: 4054,
            max_cp: 723,
            level: 90,
            specialist: true,
            splendorous: true,
            expert: true,
            craft_level: 90,
            recipe_level: None,
            durability: 60,
            progress: 6600,
            progress_divider: 180,
            progress_modifier: DEFAULT_MODIFIER,
            quality_divider: 180,
            quality_modifier: DEFAULT_MODIFIER,
            quality_max: 15368,
            quality_thresholds: [7500, 11250, 15000],
            conditions: ConditionTable::relic_tier1(),
            level_basis: LevelBasis::ClassJobLevel,
        }
    }

    /// Level 90 crafter on an ordinary level 80 recipe.
    ///
    /// Its condition table never rolls Pliant, so the solver's Pliant baiting
    /// stays off here.
    #[must_use]
    pub fn basic_preset() -> Self {
        Self {
            craftsmanship: 3200,
            control: 3100,
            max_cp: 560,
            level: 90,
            specialist: false,
            splendorous: false,
            expert: false,
            craft_level: 80,
            recipe_level: None,
            durability: 80,
            progress: 3000,
            progress_divider: 130,
            progress_modifier: 80,
            quality_divider: 115,
            quality_modifier: 70,
            quality_max: 6000,
            quality_thresholds: [3000, 4500, 6000],
            conditions: ConditionTable::normal(90),
            level_basis: LevelBasis::ClassJobLevel,
        }
    }

    /// Start a builder seeded with the relic preset.
    #[must_use]
    pub fn builder() -> CraftParametersBuilder {
        CraftParametersBuilder::default()
    }

    /// Parse and validate parameters from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ParamsError::Parse`] on malformed JSON, or the first
    /// validation failure.
    pub fn from_json(json: &str) -> Result<Self, ParamsError> {
        let mut params: Self =
            serde_json::from_str(json).map_err(|err| ParamsError::Parse(err.to_string()))?;
        params.conditions.normalize_remainder();
        params.validate()?;
        Ok(params)
    }

    /// Validate invariants.
    ///
    /// # Errors
    ///
    /// Returns `ParamsError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.progress_divider == 0 {
            return Err(ParamsError::ZeroDivider {
                field: "progress_divider",
            });
        }
        if self.quality_divider == 0 {
            return Err(ParamsError::ZeroDivider {
                field: "quality_divider",
            });
        }
        if self.progress == 0 {
            return Err(ParamsError::MinViolation {
                field: "progress",
                min: 1,
                value: self.progress,
            });
        }
        if self.durability == 0 {
            return Err(ParamsError::MinViolation {
                field: "durability",
                min: 1,
                value: self.durability,
            });
        }
        let [q1, q2, q3] = self.quality_thresholds;
        if q1 > q2 || q2 > q3 {
            return Err(ParamsError::QualityThresholds {
                thresholds: self.quality_thresholds,
            });
        }
        self.conditions.validate()
    }

    /// Whether the recipe modifiers scale the base rates.
    #[must_use]
    pub fn modifiers_apply(&self) -> bool {
        let reference = match self.level_basis {
            LevelBasis::ClassJobLevel => self.craft_level,
            LevelBasis::RecipeLevel => self.recipe_level.unwrap_or(self.craft_level),
        };
        self.level <= reference
    }

    /// Progress gained per 100 potency before buffs and conditions.
    #[must_use]
    pub fn base_progress(&self) -> u32 {
        self.base_rate(
            self.craftsmanship,
            self.progress_divider,
            crate::constants::BASE_PROGRESS_FLAT,
            self.progress_modifier,
        )
    }

    /// Quality gained per 100 potency before buffs and conditions.
    #[must_use]
    pub fn base_quality(&self) -> u32 {
        self.base_rate(
            self.control,
            self.quality_divider,
            crate::constants::BASE_QUALITY_FLAT,
            self.quality_modifier,
        )
    }

    /// `stat * 10 / divider + flat`, scaled by `modifier` percent when the
    /// recipe modifiers apply. Saturates instead of overflowing.
    fn base_rate(&self, stat: u32, divider: u32, flat: u32, modifier: u32) -> u32 {
        let base = u64::from(stat) * 10 / u64::from(divider.max(1)) + u64::from(flat);
        let scaled = if self.modifiers_apply() {
            base.saturating_mul(u64::from(modifier)) / 100
        } else {
            base
        };
        saturate_u32(scaled)
    }

    /// Quality needed for the lowest success tier.
    #[must_use]
    pub const fn min_quality(&self) -> u32 {
        self.quality_thresholds[0]
    }

    /// Quality needed for the top success tier.
    #[must_use]
    pub const fn top_quality(&self) -> u32 {
        self.quality_thresholds[2]
    }
}

/// Fluent construction with validation at [`CraftParametersBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct CraftParametersBuilder {
    params: CraftParameters,
}

macro_rules! builder_setters {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            #[must_use]
            pub fn $name(mut self, value: $ty) -> Self {
                self.params.$name = value;
                self
            }
        )*
    };
}

impl CraftParametersBuilder {
    builder_setters! {
        craftsmanship: u32,
        control: u32,
        max_cp: u32,
        level: u32,
        specialist: bool,
        splendorous: bool,
        expert: bool,
        craft_level: u32,
        durability: u32,
        progress: u32,
        progress_divider: u32,
        progress_modifier: u32,
        quality_divider: u32,
        quality_modifier: u32,
        quality_max: u32,
        quality_thresholds: [u32; 3],
        conditions: ConditionTable,
        level_basis: LevelBasis,
    }

    #[must_use]
    pub const fn recipe_level(mut self, value: u32) -> Self {
        self.params.recipe_level = Some(value);
        self
    }

    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn build(self) -> Result<CraftParameters, ParamsError> {
        self.params.validate()?;
        Ok(self.params)
    }
}
