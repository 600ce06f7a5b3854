//! What the presentation layer renders. Rebuilt from the session on demand.

use chess::{MoveDescriptor, StaticReport};
use serde::Serialize;

use crate::cursor::SteppingCursor;
use crate::pv::{OpponentResponse, PvDisplay};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowColor {
    Green,
    Red,
    Brown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arrow {
    pub from: String,
    pub to: String,
    pub color: ArrowColor,
}

impl Arrow {
    pub fn for_candidate(candidate: &MoveDescriptor) -> Self {
        Self {
            from: candidate.from.clone(),
            to: candidate.to.clone(),
            color: ArrowColor::Green,
        }
    }

    /// Forcing replies (captures and checks) are drawn red.
    pub fn for_response(response: &OpponentResponse) -> Self {
        let color = if response.is_capture || response.is_check_or_mate {
            ArrowColor::Red
        } else {
            ArrowColor::Brown
        };
        Self {
            from: response.from.clone(),
            to: response.to.clone(),
            color,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub revision: u64,
    pub board_fen: String,
    pub fen_input: String,
    pub fen_error: Option<String>,
    pub turn: String,
    pub engine_ready: bool,
    pub status: String,
    pub analyzing: bool,
    pub checking_responses: bool,
    pub progress: String,
    pub evaluation: String,
    pub lines: Vec<PvDisplay>,
    pub probe_lines: Vec<PvDisplay>,
    pub responses: Vec<OpponentResponse>,
    pub candidate: Option<MoveDescriptor>,
    pub candidate_error: Option<String>,
    pub cursor: SteppingCursor,
    pub report: StaticReport,
    pub arrows: Vec<Arrow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(is_capture: bool, is_check_or_mate: bool) -> OpponentResponse {
        OpponentResponse {
            rank: 1,
            from: "d7".to_string(),
            to: "d5".to_string(),
            san: "d5".to_string(),
            is_capture,
            is_check_or_mate,
        }
    }

    #[test]
    fn test_response_arrow_colors() {
        assert_eq!(Arrow::for_response(&response(false, false)).color, ArrowColor::Brown);
        assert_eq!(Arrow::for_response(&response(true, false)).color, ArrowColor::Red);
        assert_eq!(Arrow::for_response(&response(false, true)).color, ArrowColor::Red);
    }

    #[test]
    fn test_arrow_serializes_lowercase() {
        let json = serde_json::to_string(&Arrow::for_response(&response(true, false))).unwrap();
        assert_eq!(json, r#"{"from":"d7","to":"d5","color":"red"}"#);
    }
}
