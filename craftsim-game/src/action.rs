//! Crafting actions
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every action a crafter can perform during a synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    BasicSynthesis,
    CarefulSynthesis,
    RapidSynthesis,
    FocusedSynthesis,
    Groundwork,
    IntensiveSynthesis,
    PrudentSynthesis,
    MuscleMemory,

    BasicTouch,
    StandardTouch,
    AdvancedTouch,
    HastyTouch,
    FocusedTouch,
    PreparatoryTouch,
    PreciseTouch,
    PrudentTouch,
    TrainedFinesse,
    Reflect,

    ByregotsBlessing,
    TrainedEye,
    DelicateSynthesis,

    Veneration,
    Innovation,
    GreatStrides,
    TricksOfTheTrade,
    MastersMend,
    Manipulation,
    WasteNot,
    WasteNot2,
    Observe,
    CarefulObservation,
    FinalAppraisal,
    HeartAndSoul,
}

impl Action {
    /// All actions in declaration order.
    pub const ALL: [Self; 33] = [
        Self::BasicSynthesis,
        Self::CarefulSynthesis,
        Self::RapidSynthesis,
        Self::FocusedSynthesis,
        Self::Groundwork,
        Self::IntensiveSynthesis,
        Self::PrudentSynthesis,
        Self::MuscleMemory,
        Self::BasicTouch,
        Self::StandardTouch,
        Self::AdvancedTouch,
        Self::HastyTouch,
        Self::FocusedTouch,
        Self::PreparatoryTouch,
        Self::PreciseTouch,
        Self::PrudentTouch,
        Self::TrainedFinesse,
        Self::Reflect,
        Self::ByregotsBlessing,
        Self::TrainedEye,
        Self::DelicateSynthesis,
        Self::Veneration,
        Self::Innovation,
        Self::GreatStrides,
        Self::TricksOfTheTrade,
        Self::MastersMend,
        Self::Manipulation,
        Self::WasteNot,
        Self::WasteNot2,
        Self::Observe,
        Self::CarefulObservation,
        Self::FinalAppraisal,
        Self::HeartAndSoul,
    ];

    /// Human readable name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BasicSynthesis => "Basic Synthesis",
            Self::CarefulSynthesis => "Careful Synthesis",
            Self::RapidSynthesis => "Rapid Synthesis",
            Self::FocusedSynthesis => "Focused Synthesis",
            Self::Groundwork => "Groundwork",
            Self::IntensiveSynthesis => "Intensive Synthesis",
            Self::PrudentSynthesis => "Prudent Synthesis",
            Self::MuscleMemory => "Muscle Memory",
            Self::BasicTouch => "Basic Touch",
            Self::StandardTouch => "Standard Touch",
            Self::AdvancedTouch => "Advanced Touch",
            Self::HastyTouch => "Hasty Touch",
            Self::FocusedTouch => "Focused Touch",
            Self::PreparatoryTouch => "Preparatory Touch",
            Self::PreciseTouch => "Precise Touch",
            Self::PrudentTouch => "Prudent Touch",
            Self::TrainedFinesse => "Trained Finesse",
            Self::Reflect => "Reflect",
            Self::ByregotsBlessing => "Byregot's Blessing",
            Self::TrainedEye => "Trained Eye",
            Self::DelicateSynthesis => "Delicate Synthesis",
            Self::Veneration => "Veneration",
            Self::Innovation => "Innovation",
            Self::GreatStrides => "Great Strides",
            Self::TricksOfTheTrade => "Tricks of the Trade",
            Self::MastersMend => "Master's Mend",
            Self::Manipulation => "Manipulation",
            Self::WasteNot => "Waste Not",
            Self::WasteNot2 => "Waste Not II",
            Self::Observe => "Observe",
            Self::CarefulObservation => "Careful Observation",
            Self::FinalAppraisal => "Final Appraisal",
            Self::HeartAndSoul => "Heart and Soul",
        }
    }

    /// Utility actions that neither consume a turn for buff timers nor
    /// trigger Manipulation repair.
    #[must_use]
    pub const fn is_turn_free(self) -> bool {
        matches!(
            self,
            Self::CarefulObservation | Self::FinalAppraisal | Self::HeartAndSoul
        )
    }

    /// Utility actions that leave the current condition in place.
    #[must_use]
    pub const fn keeps_condition(self) -> bool {
        matches!(self, Self::FinalAppraisal | Self::HeartAndSoul)
    }

    /// Actions gated behind Good/Excellent condition (or an active Heart and Soul).
    #[must_use]
    pub const fn requires_good_condition(self) -> bool {
        matches!(
            self,
            Self::IntensiveSynthesis | Self::PreciseTouch | Self::TricksOfTheTrade
        )
    }

    /// Actions only usable on the very first step of a craft.
    #[must_use]
    pub const fn requires_first_step(self) -> bool {
        matches!(self, Self::MuscleMemory | Self::Reflect | Self::TrainedEye)
    }

    /// Actions that grant one extra Inner Quiet stack on success.
    #[must_use]
    pub const fn grants_bonus_iq(self) -> bool {
        matches!(
            self,
            Self::PreciseTouch | Self::PreparatoryTouch | Self::Reflect
        )
    }

    /// Actions rejected while a Waste Not buff is running.
    #[must_use]
    pub const fn blocked_by_waste_not(self) -> bool {
        matches!(self, Self::PrudentSynthesis | Self::PrudentTouch)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
