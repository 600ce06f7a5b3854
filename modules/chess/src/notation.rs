use std::fmt;

use crate::position::{GamePosition, MoveSpec};
use crate::RulesError;

/// SAN rendering of an engine line. `failed_at` holds the first engine move
/// that could not be replayed; everything after it is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanLine {
    pub moves: Vec<String>,
    pub failed_at: Option<String>,
}

impl SanLine {
    pub fn is_complete(&self) -> bool {
        self.failed_at.is_none()
    }
}

impl fmt::Display for SanLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.moves.clone();
        if let Some(token) = &self.failed_at {
            parts.push(format!("?({})", token));
        }
        write!(f, "{}", parts.join(" "))
    }
}

pub fn uci_line_to_san(base: &GamePosition, moves: &[String]) -> SanLine {
    let mut line = SanLine::default();
    let mut pos = base.clone();

    for token in moves {
        match pos.play(&MoveSpec::Uci(token.clone())) {
            Ok((next, mv)) => {
                line.moves.push(mv.san);
                pos = next;
            }
            Err(e) => {
                log::warn!("Stopped converting line at '{}' from {}: {}", token, base.fen(), e);
                line.failed_at = Some(token.clone());
                break;
            }
        }
    }

    line
}

/// Plays SAN moves in order from `base`.
pub fn replay_san(base: &GamePosition, san_moves: &[String]) -> Result<GamePosition, RulesError> {
    san_moves.iter().try_fold(base.clone(), |pos, san| {
        pos.play(&MoveSpec::San(san.clone())).map(|(next, _)| next)
    })
}
