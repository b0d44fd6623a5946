// SPDX-License-Identifier: MIT OR Apache-2.0
//! Closed-set lexical rules for intent classification and parameter
//! keyword matching (§4.2).

use dgw_core::{Action, Direction, RotationDirection};

/// Keyword → [`Action`] table, checked in declaration order (first match
/// wins) against the normalized, tokenized utterance.
const ACTION_KEYWORDS: &[(&[&str], Action)] = &[
    (&["緊急停止", "止まれ", "ストップ", "emergency"], Action::EmergencyStop),
    (&["接続", "つなげ", "connect"], Action::Connect),
    (&["切断", "disconnect"], Action::Disconnect),
    (&["離陸", "飛び立", "takeoff"], Action::Takeoff),
    (&["着陸", "降り", "land"], Action::Land),
    (&["回転", "回って", "回れ", "turn", "rotate"], Action::Rotate),
    (&["高度", "上昇", "下降", "altitude"], Action::AltitudeSet),
    (&["写真", "撮影", "photo", "picture"], Action::Photo),
    (&["録画開始", "動画開始", "start recording"], Action::VideoStart),
    (&["録画終了", "動画終了", "stop recording"], Action::VideoStop),
    (&["状態", "ステータス", "status"], Action::StatusQuery),
    (&["ヘルプ", "help"], Action::Help),
    (&["進", "下が", "移動", "move"], Action::Move),
];

/// Classify a single clause's tokens into an [`Action`]. Returns
/// [`Action::Unknown`] when no keyword matches.
#[must_use]
pub fn classify_action(clause: &str) -> Action {
    for (keywords, action) in ACTION_KEYWORDS {
        if keywords.iter().any(|kw| clause.contains(kw)) {
            return *action;
        }
    }
    Action::Unknown
}

/// Byte offsets where each declared action keyword's earliest occurrence
/// starts in `text`, sorted and deduplicated. Used by [`crate::tokenize`] to
/// find clause boundaries between chained `-て`/`-で` verb forms that carry
/// no conjunction word at all.
#[must_use]
pub(crate) fn action_keyword_starts(text: &str) -> Vec<usize> {
    let mut starts: Vec<usize> = ACTION_KEYWORDS
        .iter()
        .flat_map(|(keywords, _)| keywords.iter().filter_map(|kw| text.find(kw)))
        .collect();
    starts.sort_unstable();
    starts.dedup();
    starts
}

const DIRECTION_KEYWORDS: &[(&[&str], Direction)] = &[
    (&["前"], Direction::Forward),
    (&["後"], Direction::Back),
    (&["左"], Direction::Left),
    (&["右"], Direction::Right),
    (&["上昇", "上に", "上へ"], Direction::Up),
    (&["下降", "下に", "下へ"], Direction::Down),
];

/// Extract a movement [`Direction`] from a clause, if any keyword matches.
#[must_use]
pub fn extract_direction(clause: &str) -> Option<Direction> {
    DIRECTION_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| clause.contains(kw)))
        .map(|(_, dir)| *dir)
}

const ROTATION_KEYWORDS: &[(&[&str], RotationDirection)] = &[
    (&["時計回り", "右回り", "clockwise"], RotationDirection::Clockwise),
    (
        &["反時計回り", "左回り", "counterclockwise", "counter-clockwise"],
        RotationDirection::CounterClockwise,
    ),
];

/// Extract a [`RotationDirection`] from a clause, if any keyword matches.
#[must_use]
pub fn extract_rotation_direction(clause: &str) -> Option<RotationDirection> {
    ROTATION_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| clause.contains(kw)))
        .map(|(_, dir)| *dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_takeoff() {
        assert_eq!(classify_action("ドローンを離陸させて"), Action::Takeoff);
    }

    #[test]
    fn classifies_unknown_for_gibberish() {
        assert_eq!(classify_action("今日はいい天気ですね"), Action::Unknown);
    }

    #[test]
    fn emergency_stop_takes_priority_over_move() {
        // "止まれ" alone should not be misread as a move/land blend.
        assert_eq!(classify_action("止まれ"), Action::EmergencyStop);
    }

    #[test]
    fn extracts_forward_direction() {
        assert_eq!(extract_direction("前に進んで"), Some(Direction::Forward));
    }

    #[test]
    fn extracts_rotation_direction() {
        assert_eq!(
            extract_rotation_direction("時計回りに回転して"),
            Some(RotationDirection::Clockwise)
        );
    }

    #[test]
    fn no_direction_returns_none() {
        assert_eq!(extract_direction("離陸して"), None);
    }
}
