//! Tunable switches and thresholds for the heuristic solver.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors raised while loading a solver configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolverConfigError {
    #[error("unknown solver setting `{key}`")]
    UnknownKey { key: String },
    #[error("solver setting `{key}` expects a {expected} value")]
    TypeMismatch { key: String, expected: TunableKind },
    #[error("solver setting `{key}` must be at most {max} (got {value})")]
    OutOfRange { key: String, max: u32, value: u32 },
    #[error("failed to parse solver settings: {0}")]
    Parse(String),
}

/// A single value in the flat key/value form of [`SolverConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(u32),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TunableKind {
    Bool,
    Int,
}

impl fmt::Display for TunableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bool => "boolean",
            Self::Int => "integer",
        })
    }
}

/// Public description of one tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tunable {
    pub key: &'static str,
    pub kind: TunableKind,
    pub description: &'static str,
}

trait TunableValue: Sized + Copy {
    const KIND: TunableKind;
    fn into_value(self) -> ConfigValue;
    fn from_value(key: &str, value: ConfigValue) -> Result<Self, SolverConfigError>;
}

impl TunableValue for bool {
    const KIND: TunableKind = TunableKind::Bool;

    fn into_value(self) -> ConfigValue {
        ConfigValue::Bool(self)
    }

    fn from_value(key: &str, value: ConfigValue) -> Result<Self, SolverConfigError> {
        match value {
            ConfigValue::Bool(value) => Ok(value),
            ConfigValue::Int(_) => Err(SolverConfigError::TypeMismatch {
                key: key.to_string(),
                expected: Self::KIND,
            }),
        }
    }
}

impl TunableValue for u32 {
    const KIND: TunableKind = TunableKind::Int;

    fn into_value(self) -> ConfigValue {
        ConfigValue::Int(self)
    }

    fn from_value(key: &str, value: ConfigValue) -> Result<Self, SolverConfigError> {
        match value {
            ConfigValue::Int(value) => Ok(value),
            ConfigValue::Bool(_) => Err(SolverConfigError::TypeMismatch {
                key: key.to_string(),
                expected: Self::KIND,
            }),
        }
    }
}

macro_rules! solver_tunables {
    ($( #[doc = $doc:literal] $name:ident: $ty:ty = $default:expr; )*) => {
        /// Every switch and threshold the solver consults.
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct SolverConfig {
            $(
                #[doc = $doc]
                pub $name: $ty,
            )*
        }

        impl Default for SolverConfig {
            fn default() -> Self {
                Self {
                    $( $name: $default, )*
                }
            }
        }

        /// All tunables in declaration order.
        pub const TUNABLES: &[Tunable] = &[
            $(
                Tunable {
                    key: stringify!($name),
                    kind: <$ty as TunableValue>::KIND,
                    description: $doc,
                },
            )*
        ];

        impl SolverConfig {
            /// Flat key/value form, suitable for any persistence format.
            #[must_use]
            pub fn to_flat(&self) -> BTreeMap<String, ConfigValue> {
                let mut flat = BTreeMap::new();
                $(
                    flat.insert(stringify!($name).to_string(), self.$name.into_value());
                )*
                flat
            }

            fn set(&mut self, key: &str, value: ConfigValue) -> Result<(), SolverConfigError> {
                match key {
                    $(
                        stringify!($name) => {
                            self.$name = <$ty as TunableValue>::from_value(key, value)?;
                        }
                    )*
                    _ => {
                        return Err(SolverConfigError::UnknownKey {
                            key: key.to_string(),
                        });
                    }
                }
                Ok(())
            }
        }
    };
}

solver_tunables! {
    /// Open with Reflect (banks Inner Quiet) instead of Muscle Memory (banks progress).
    use_reflect_opener: bool = false;
    /// Spend Muscle Memory on Intensive Synthesis (400p) rather than Rapid (500p) when Good procs.
    mume_intensive_good: bool = true;
    /// Under Malleable during Muscle Memory, use Intensive (forcing via Heart and Soul) rather than Rapid.
    mume_intensive_malleable: bool = false;
    /// On the last Muscle Memory turn, use Intensive (forcing via Heart and Soul) unless Centered.
    mume_intensive_last_resort: bool = true;
    /// Use Manipulation on Primed during Muscle Memory once Veneration is up.
    mume_primed_manip: bool = false;
    /// Observe on unfavourable turns during Muscle Memory instead of spending durability on plain Rapids.
    mume_allow_observe: bool = false;
    /// Manipulation is only used during Muscle Memory when more than this many turns remain on it.
    mume_min_steps_for_manip: u32 = 2;
    /// Veneration is only used during Muscle Memory when more than this many turns remain on it.
    mume_min_steps_for_vene: u32 = 1;
    /// Minimum Inner Quiet stacks before spending Heart and Soul on Precise Touch (10 disables).
    mid_min_iq_for_hs_precise: u32 = 10;
    /// On low durability before Inner Quiet is full, Observe to bait Pliant instead of a full-price Manipulation.
    mid_bait_pliant_with_observe_pre_quality: bool = true;
    /// On low durability after Inner Quiet is full, Observe to bait Pliant instead of full-price repairs or Innovation plus Finesse.
    mid_bait_pliant_with_observe_after_iq: bool = true;
    /// Use Manipulation on Primed before Inner Quiet is full.
    mid_primed_manip_pre_quality: bool = true;
    /// Use Manipulation on Primed after Inner Quiet is full, if enough CP remains to use the durability well.
    mid_primed_manip_after_iq: bool = true;
    /// Allow Observe on unfavourable turns to conserve durability while no buffs are active.
    mid_keep_high_dura_unbuffed: bool = true;
    /// Allow Observe on unfavourable turns to conserve durability while Veneration is active.
    mid_keep_high_dura_veneration: bool = false;
    /// Use Veneration on Good Omen while the progress deficit exceeds one Intensive Synthesis.
    mid_allow_veneration_good_omen: bool = true;
    /// Use Veneration after Inner Quiet is full while the progress deficit exceeds one Rapid Synthesis.
    mid_allow_veneration_after_iq: bool = true;
    /// Spend Good on Intensive Synthesis for progress while no buffs are active.
    mid_allow_intensive_unbuffed: bool = false;
    /// Spend Good on Intensive Synthesis for progress while Veneration is active.
    mid_allow_intensive_veneration: bool = false;
    /// Spend Good on Precise Touch while more Inner Quiet is needed.
    mid_allow_precise: bool = true;
    /// Treat Sturdy plus Heart and Soul plus Precise Touch as a good Inner Quiet move.
    mid_allow_sturdy_precise: bool = false;
    /// Treat Centered Hasty Touch (85% success) as a good Inner Quiet move.
    mid_allow_centered_hasty: bool = true;
    /// Treat Sturdy Hasty Touch as a good Inner Quiet move; otherwise continue the touch combo.
    mid_allow_sturdy_hasty: bool = true;
    /// Use Preparatory Touch under Good with Great Strides and Innovation, durability permitting.
    mid_allow_good_prep: bool = true;
    /// Use Preparatory Touch under Sturdy with Innovation, durability permitting.
    mid_allow_sturdy_prep: bool = true;
    /// Start quality rounds with Great Strides before Innovation.
    mid_gs_before_inno: bool = true;
    /// With full Inner Quiet, finish the progress deficit before starting quality rounds.
    mid_finish_progress_before_quality: bool = true;
    /// Observe on Good Omen where the following Good would otherwise go to Tricks of the Trade.
    mid_observe_good_omen_for_tricks: bool = false;
    /// Spend Careful Observation charges trying to bait Good for Byregot's Blessing.
    finisher_bait_good_byregot: bool = true;
    /// Spend Careful Observation charges trying to bait Good for Tricks of the Trade when CP runs dry.
    emergency_cp_bait_good: bool = false;
}

const MAX_MUME_STEPS: u32 = 5;

impl SolverConfig {
    /// Build a configuration from a flat record, defaulting missing keys.
    ///
    /// # Errors
    ///
    /// Returns [`SolverConfigError`] on unknown keys, type mismatches or
    /// out-of-range integers.
    pub fn from_flat(flat: &BTreeMap<String, ConfigValue>) -> Result<Self, SolverConfigError> {
        let mut config = Self::default();
        for (key, value) in flat {
            config.set(key, *value)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a flat JSON object of settings.
    ///
    /// # Errors
    ///
    /// Returns [`SolverConfigError::Parse`] on malformed JSON, or any error
    /// from [`SolverConfig::from_flat`].
    pub fn from_json(json: &str) -> Result<Self, SolverConfigError> {
        let flat: BTreeMap<String, ConfigValue> =
            serde_json::from_str(json).map_err(|err| SolverConfigError::Parse(err.to_string()))?;
        Self::from_flat(&flat)
    }

    /// # Errors
    ///
    /// Returns [`SolverConfigError::OutOfRange`] for integer settings beyond their bounds.
    pub fn validate(&self) -> Result<(), SolverConfigError> {
        let bounds = [
            ("mume_min_steps_for_manip", self.mume_min_steps_for_manip, MAX_MUME_STEPS),
            ("mume_min_steps_for_vene", self.mume_min_steps_for_vene, MAX_MUME_STEPS),
            (
                "mid_min_iq_for_hs_precise",
                self.mid_min_iq_for_hs_precise,
                crate::constants::IQ_MAX_STACKS,
            ),
        ];
        for (key, value, max) in bounds {
            if value > max {
                return Err(SolverConfigError::OutOfRange {
                    key: key.to_string(),
                    max,
                    value,
                });
            }
        }
        Ok(())
    }
}
