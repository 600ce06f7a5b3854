pub mod notation;
pub mod position;
pub mod report;

pub use notation::{replay_san, uci_line_to_san, SanLine};
pub use position::{validate, GamePosition, MoveDescriptor, MoveSpec, Side};
pub use report::{turn_text, AttackedPiece, StaticReport, CENTER_SQUARES};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),
    #[error("Illegal position: {0}")]
    IllegalPosition(String),
    #[error("Malformed move: {0}")]
    MalformedMove(String),
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
}
