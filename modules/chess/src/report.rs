//! Engine-free facts about a position, recomputed whenever the board changes.

use serde::Serialize;
use shakmaty::{Position, Square};

use crate::position::GamePosition;

pub const CENTER_SQUARES: [Square; 4] = [Square::E4, Square::D4, Square::E5, Square::D5];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackedPiece {
    pub square: String,
    /// Lowercase piece letter (`p`, `n`, `b`, `r`, `q`, `k`).
    pub piece: char,
    pub defended: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaticReport {
    /// Pieces of the side to move that the opponent attacks.
    pub attacked: Vec<AttackedPiece>,
    /// Center squares the side to move attacks.
    pub controlled_center: Vec<String>,
}

impl StaticReport {
    pub fn of(position: &GamePosition) -> Self {
        let us = position.side_to_move();
        let them = us.opponent();
        let board = position.chess().board();

        let mut attacked: Vec<AttackedPiece> = board
            .by_color(us.into())
            .into_iter()
            .filter(|sq| position.is_square_attacked(*sq, them))
            .filter_map(|sq| {
                board.piece_at(sq).map(|piece| AttackedPiece {
                    square: sq.to_string(),
                    piece: piece.role.char(),
                    defended: position.is_square_attacked(sq, us),
                })
            })
            .collect();
        attacked.sort_by(|a, b| a.square.cmp(&b.square));

        let controlled_center = CENTER_SQUARES
            .iter()
            .filter(|sq| position.is_square_attacked(**sq, us))
            .map(|sq| sq.to_string())
            .collect();

        Self { attacked, controlled_center }
    }
}

pub fn turn_text(position: &GamePosition) -> String {
    format!("{} to play", position.side_to_move())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_position_is_quiet() {
        let report = StaticReport::of(&GamePosition::starting());
        assert!(report.attacked.is_empty());
        assert!(report.controlled_center.is_empty());
        assert_eq!(turn_text(&GamePosition::starting()), "White to play");
    }

    #[test]
    fn test_attacked_undefended_pawn() {
        // 1. e4 d5
        let pos = GamePosition::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2")
            .unwrap();
        let report = StaticReport::of(&pos);
        assert_eq!(
            report.attacked,
            vec![AttackedPiece { square: "e4".to_string(), piece: 'p', defended: false }]
        );
        assert_eq!(report.controlled_center, vec!["d5"]);
    }

    #[test]
    fn test_defended_piece() {
        // 1. e4 d5 2. Nc3: e4 is now covered by the knight
        let pos = GamePosition::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/2N5/PPPP1PPP/R1BQKBNR b KQkq - 1 2")
            .unwrap();
        assert_eq!(turn_text(&pos), "Black to play");
        let report = StaticReport::of(&pos);
        // Black's d5 pawn is hit by e4 and covered by the queen.
        assert_eq!(
            report.attacked,
            vec![AttackedPiece { square: "d5".to_string(), piece: 'p', defended: true }]
        );
        assert_eq!(report.controlled_center, vec!["e4", "d5"]);
    }
}
