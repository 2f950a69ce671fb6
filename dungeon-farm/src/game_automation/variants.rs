//! Built-in bot variants and their state tables
//!
//! A variant is data only: a closed state enum plus a `ProfileSpec` listing
//! which template means which state and what to do about it. The engine in
//! `fsm` is the same for all of them.

use super::config::{BindingSpec, ProfileSpec};
use super::match_image::RegionSpec;
use super::types::UiState;
use crate::input::{Action, KeyCode};
use clap::ValueEnum;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BotVariant {
    Kanamia,
    Tina,
    /// Towering Ruin, hard difficulty
    Towering,
}

impl BotVariant {
    /// Sub-directory of the asset root holding this variant's templates
    pub fn asset_subdir(&self) -> &'static str {
        match self {
            BotVariant::Kanamia => "kanamia",
            BotVariant::Tina => "tina",
            BotVariant::Towering => "towering",
        }
    }

    pub fn builtin_profile(&self) -> ProfileSpec {
        match self {
            BotVariant::Kanamia | BotVariant::Tina => queue_dungeon_profile(),
            BotVariant::Towering => towering_profile(),
        }
    }
}

/// Screens of the plain queue → confirm → dungeon → leave loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum QueueDungeonState {
    Idle,
    Queueing,
    Matching,
    Confirming,
    InDungeon,
    Leaving,
    Unknown,
}

impl UiState for QueueDungeonState {
    const UNKNOWN: Self = QueueDungeonState::Unknown;
}

/// Screens of the Towering Ruin run, including the party and captain prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ToweringState {
    EntrancePrompt,
    SelectDifficulty,
    MatchReady,
    Matching,
    DeclineCaptain,
    ConfirmMatch,
    InDungeon,
    Victory,
    LeaveDungeon,
    PartyLeave,
    PartyConfirm,
    Unknown,
}

impl UiState for ToweringState {
    const UNKNOWN: Self = ToweringState::Unknown;
}

fn queue_dungeon_profile() -> ProfileSpec {
    use QueueDungeonState as S;
    ProfileSpec {
        tick_interval_ms: 250,
        default_threshold: Some(0.8),
        bindings: vec![
            // The confirm dialog is drawn on top of the queue widget
            BindingSpec::new("btn_confirm_match.png", S::Confirming, 1)
                .threshold(0.88)
                .action(Action::click_match(800)),
            BindingSpec::new("btn_leave_dungeon.png", S::Leaving, 2)
                .threshold(0.85)
                .action(Action::click_match(1000)),
            BindingSpec::new("hud_dungeon.png", S::InDungeon, 3).action(Action::click_in_place(0)),
            BindingSpec::new("lbl_matching.png", S::Matching, 4)
                .region(RegionSpec::named("lower_right_cluster")),
            BindingSpec::new("btn_match.png", S::Queueing, 5)
                .threshold(0.88)
                .action(Action::click_match(600)),
            BindingSpec::new("f_prompt.png", S::Idle, 6)
                .threshold(0.55)
                .action(Action::press(KeyCode::Char('f'), 1000)),
        ],
    }
}

fn towering_profile() -> ProfileSpec {
    use ToweringState as S;
    let matching_label = |region| {
        BindingSpec::new("lbl_matching.png", S::Matching, 8)
            .threshold(0.37)
            .region(region)
    };
    ProfileSpec {
        tick_interval_ms: 120,
        default_threshold: Some(0.8),
        bindings: vec![
            BindingSpec::new("btn_confirm_match.png", S::ConfirmMatch, 1)
                .threshold(0.88)
                .action(Action::click_match(800)),
            BindingSpec::new("btn_confirm_party.png", S::PartyConfirm, 2)
                .threshold(0.90)
                .action(Action::click_match(800)),
            BindingSpec::new("btn_decline_cpt.png", S::DeclineCaptain, 3)
                .threshold(0.80)
                .action(Action::click_match(600)),
            BindingSpec::new("btn_leave_dungeon.png", S::LeaveDungeon, 4)
                .threshold(0.85)
                .action(Action::click_match(1000)),
            BindingSpec::new("lbl_victory.png", S::Victory, 5).threshold(0.90),
            BindingSpec::new("btn_leave_icon.png", S::PartyLeave, 6)
                .threshold(0.90)
                .action(Action::click_match(600)),
            BindingSpec::new("btn_towering_hard.png", S::SelectDifficulty, 7)
                .threshold(0.85)
                .action(Action::click_match(1000)),
            // "Matching..." sits in one of two places depending on the client version
            matching_label(RegionSpec::fraction(0.50, 0.62, 0.40, 0.08)),
            matching_label(RegionSpec::fraction(0.56, 0.86, 0.36, 0.10)),
            BindingSpec::new("btn_match.png", S::MatchReady, 9)
                .threshold(0.88)
                .action(Action::click_match(600)),
            BindingSpec::new("hud_dungeon.png", S::InDungeon, 10)
                .threshold(0.80)
                .action(Action::click_in_place(0)),
            BindingSpec::new("f_towering.png", S::EntrancePrompt, 11)
                .threshold(0.55)
                .action(Action::press(KeyCode::Char('f'), 1000)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_state_names_parse_back() {
        for state in QueueDungeonState::iter() {
            assert_eq!(QueueDungeonState::from_str(&state.to_string()), Ok(state));
        }
        for state in ToweringState::iter() {
            assert_eq!(ToweringState::from_str(&state.to_string()), Ok(state));
        }
        assert_eq!(
            "IN_DUNGEON".parse::<QueueDungeonState>(),
            Ok(QueueDungeonState::InDungeon)
        );
        assert_eq!(ToweringState::DeclineCaptain.to_string(), "decline_captain");
    }

    #[test]
    fn test_builtin_profiles_name_known_states() {
        for spec in queue_dungeon_profile().bindings {
            assert!(spec.state.parse::<QueueDungeonState>().is_ok(), "{}", spec.state);
        }
        for spec in towering_profile().bindings {
            assert!(spec.state.parse::<ToweringState>().is_ok(), "{}", spec.state);
        }
    }

    #[test]
    fn test_towering_thresholds() {
        let profile = BotVariant::Towering.builtin_profile();
        let threshold = |file: &str| {
            profile
                .bindings
                .iter()
                .find(|b| b.template == file)
                .and_then(|b| b.threshold)
        };
        assert_eq!(threshold("f_towering.png"), Some(0.55));
        assert_eq!(threshold("lbl_matching.png"), Some(0.37));
        assert_eq!(threshold("btn_confirm_party.png"), Some(0.90));
        assert_eq!(profile.tick_interval_ms, 120);
        assert_eq!(
            profile
                .bindings
                .iter()
                .filter(|b| b.template == "lbl_matching.png")
                .count(),
            2
        );
    }

    #[test]
    fn test_unknown_is_never_bound() {
        for variant in [BotVariant::Kanamia, BotVariant::Tina, BotVariant::Towering] {
            assert!(
                variant
                    .builtin_profile()
                    .bindings
                    .iter()
                    .all(|b| b.state != "unknown")
            );
        }
    }
}
