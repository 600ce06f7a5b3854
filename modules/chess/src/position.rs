use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, Position, Role, Square};

use crate::RulesError;

/// Validates a FEN and returns its canonical form.
pub fn validate(text: &str) -> Result<String, RulesError> {
    GamePosition::from_fen(text).map(|pos| pos.fen)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "White"),
            Side::Black => write!(f, "Black"),
        }
    }
}

/// A legal position together with its canonical FEN. Two positions are equal
/// when their canonical FENs are.
#[derive(Debug, Clone)]
pub struct GamePosition {
    pos: Chess,
    fen: String,
}

impl PartialEq for GamePosition {
    fn eq(&self, other: &Self) -> bool {
        self.fen == other.fen
    }
}

impl Eq for GamePosition {}

impl Serialize for GamePosition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.fen)
    }
}

impl Default for GamePosition {
    fn default() -> Self {
        Self::starting()
    }
}

impl GamePosition {
    pub fn starting() -> Self {
        Self::from_chess(Chess::default())
    }

    pub fn from_fen(text: &str) -> Result<Self, RulesError> {
        let fen: Fen = text
            .trim()
            .parse()
            .map_err(|e| RulesError::InvalidFen(format!("{}", e)))?;
        let pos: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|e| RulesError::IllegalPosition(e.to_string()))?;
        Ok(Self::from_chess(pos))
    }

    fn from_chess(pos: Chess) -> Self {
        let fen = Fen::from_position(pos.clone(), EnPassantMode::Legal).to_string();
        Self { pos, fen }
    }

    pub fn fen(&self) -> &str {
        &self.fen
    }

    pub fn side_to_move(&self) -> Side {
        self.pos.turn().into()
    }

    pub fn is_square_attacked(&self, square: Square, by: Side) -> bool {
        let board = self.pos.board();
        board.attacks_to(square, by.into(), board.occupied()).any()
    }

    pub(crate) fn chess(&self) -> &Chess {
        &self.pos
    }

    /// Plays a move and describes it. The receiver is left untouched.
    pub fn play(&self, spec: &MoveSpec) -> Result<(GamePosition, MoveDescriptor), RulesError> {
        let m = self.resolve(spec)?;
        // Castling is reported king-to-destination (e1g1), not king-takes-rook.
        let uci = UciMove::from_move(&m, CastlingMode::Standard).to_string();
        if uci.len() < 4 {
            return Err(RulesError::IllegalMove(spec.to_string()));
        }

        let mut next = self.pos.clone();
        let san = SanPlus::from_move_and_play_unchecked(&mut next, &m).to_string();
        let descriptor = MoveDescriptor {
            san,
            from: uci[0..2].to_string(),
            to: uci[2..4].to_string(),
            is_capture: m.is_capture(),
            is_check: next.is_check(),
            is_checkmate: next.is_checkmate(),
            uci,
        };
        Ok((Self::from_chess(next), descriptor))
    }

    fn resolve(&self, spec: &MoveSpec) -> Result<Move, RulesError> {
        match spec {
            MoveSpec::Uci(token) => self.resolve_uci(token),
            MoveSpec::San(text) => self.resolve_san(text),
            MoveSpec::Squares { from, to } => self.resolve_squares(from, to),
            MoveSpec::Text(text) => self.resolve_san(text).or_else(|san_err| {
                if (4..=5).contains(&text.trim().len()) {
                    self.resolve_uci(text.trim()).map_err(|_| san_err)
                } else {
                    Err(san_err)
                }
            }),
        }
    }

    fn resolve_uci(&self, token: &str) -> Result<Move, RulesError> {
        if !(4..=5).contains(&token.len()) {
            return Err(RulesError::MalformedMove(token.to_string()));
        }
        let uci: UciMove = token
            .parse()
            .map_err(|_| RulesError::MalformedMove(token.to_string()))?;
        uci.to_move(&self.pos)
            .map_err(|_| RulesError::IllegalMove(token.to_string()))
    }

    fn resolve_san(&self, text: &str) -> Result<Move, RulesError> {
        let text = text.trim();
        let san: SanPlus = text
            .parse()
            .map_err(|_| RulesError::MalformedMove(text.to_string()))?;
        san.san
            .to_move(&self.pos)
            .map_err(|_| RulesError::IllegalMove(text.to_string()))
    }

    /// Board drag-and-drop: promotions always become a queen.
    fn resolve_squares(&self, from: &str, to: &str) -> Result<Move, RulesError> {
        let from_sq = parse_square(from)?;
        let to_sq = parse_square(to)?;
        let plain = UciMove::Normal { from: from_sq, to: to_sq, promotion: None };
        plain.to_move(&self.pos).or_else(|_| {
            UciMove::Normal { from: from_sq, to: to_sq, promotion: Some(Role::Queen) }
                .to_move(&self.pos)
                .map_err(|_| RulesError::IllegalMove(format!("{}{}", from, to)))
        })
    }
}

fn parse_square(text: &str) -> Result<Square, RulesError> {
    text.trim()
        .parse()
        .map_err(|_| RulesError::InvalidSquare(text.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveSpec {
    /// Engine notation, `e2e4` or `e7e8q`.
    Uci(String),
    San(String),
    Squares { from: String, to: String },
    /// Free text typed by a user: SAN, falling back to engine notation.
    Text(String),
}

impl fmt::Display for MoveSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveSpec::Uci(s) | MoveSpec::San(s) | MoveSpec::Text(s) => write!(f, "{}", s),
            MoveSpec::Squares { from, to } => write!(f, "{}{}", from, to),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDescriptor {
    pub uci: String,
    pub san: String,
    pub from: String,
    pub to: String,
    pub is_capture: bool,
    pub is_check: bool,
    pub is_checkmate: bool,
}

impl MoveDescriptor {
    pub fn is_check_or_mate(&self) -> bool {
        self.is_check || self.is_checkmate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_starting_position_fen() {
        assert_eq!(GamePosition::starting().fen(), START);
        assert_eq!(GamePosition::starting().side_to_move(), Side::White);
    }

    #[test]
    fn test_validate_trims_and_canonicalises() {
        let canonical = validate(&format!("  {}  ", START)).unwrap();
        assert_eq!(canonical, START);
        assert_eq!(validate(&canonical).unwrap(), canonical);
    }

    #[test]
    fn test_validate_drops_unusable_en_passant_square() {
        let canonical =
            validate("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        assert_eq!(canonical, "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        assert_eq!(validate(&canonical).unwrap(), canonical);
    }

    #[test]
    fn test_validate_rejects_garbage() {
        assert!(matches!(validate("not a fen"), Err(RulesError::InvalidFen(_))));
        assert!(matches!(validate(""), Err(RulesError::InvalidFen(_))));
    }

    #[test]
    fn test_validate_rejects_missing_king() {
        assert!(matches!(
            validate("8/8/8/8/8/8/8/7k w - - 0 1"),
            Err(RulesError::IllegalPosition(_))
        ));
    }

    #[test]
    fn test_play_uci() {
        let (next, mv) = GamePosition::starting().play(&MoveSpec::Uci("g1f3".into())).unwrap();
        assert_eq!(mv.san, "Nf3");
        assert_eq!(mv.from, "g1");
        assert_eq!(mv.to, "f3");
        assert!(!mv.is_capture);
        assert_eq!(next.side_to_move(), Side::Black);
    }

    #[test]
    fn test_play_rejects_bad_uci_length() {
        let pos = GamePosition::starting();
        assert!(matches!(
            pos.play(&MoveSpec::Uci("e2e4e5".into())),
            Err(RulesError::MalformedMove(_))
        ));
        assert!(matches!(
            pos.play(&MoveSpec::Uci("e2".into())),
            Err(RulesError::MalformedMove(_))
        ));
    }

    #[test]
    fn test_play_illegal_uci() {
        let pos = GamePosition::starting();
        assert!(matches!(
            pos.play(&MoveSpec::Uci("e2e5".into())),
            Err(RulesError::IllegalMove(_))
        ));
    }

    #[test]
    fn test_text_accepts_san_and_uci() {
        let pos = GamePosition::starting();
        let (_, by_san) = pos.play(&MoveSpec::Text("Nc3".into())).unwrap();
        let (_, by_uci) = pos.play(&MoveSpec::Text("b1c3".into())).unwrap();
        assert_eq!(by_san, by_uci);
        assert!(pos.play(&MoveSpec::Text("Qh5".into())).is_err());
    }

    #[test]
    fn test_squares_promote_to_queen() {
        let pos = GamePosition::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        let (_, mv) = pos
            .play(&MoveSpec::Squares { from: "e7".into(), to: "e8".into() })
            .unwrap();
        assert_eq!(mv.uci, "e7e8q");
        assert!(mv.san.starts_with("e8=Q"));
    }

    #[test]
    fn test_squares_invalid_square() {
        let pos = GamePosition::starting();
        assert!(matches!(
            pos.play(&MoveSpec::Squares { from: "z9".into(), to: "e4".into() }),
            Err(RulesError::InvalidSquare(_))
        ));
    }

    #[test]
    fn test_engine_castling_notation() {
        let pos = GamePosition::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let (_, mv) = pos.play(&MoveSpec::Uci("e1g1".into())).unwrap();
        assert_eq!(mv.san, "O-O");
        assert_eq!(mv.uci, "e1g1");
        assert_eq!(mv.to, "g1");
    }

    #[test]
    fn test_capture_and_check_flags() {
        // 1. e4 d5 2. exd5 Qxd5 3. Nc3 Qe5+
        let pos = GamePosition::from_fen("rnb1kbnr/ppp1pppp/8/3q4/8/2N5/PPPP1PPP/R1BQKBNR b KQkq - 1 3")
            .unwrap();
        let (_, check) = pos.play(&MoveSpec::Uci("d5e5".into())).unwrap();
        assert_eq!(check.san, "Qe5+");
        assert!(check.is_check);
        assert!(!check.is_checkmate);
        assert!(check.is_check_or_mate());

        let pos = GamePosition::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2")
            .unwrap();
        let (_, capture) = pos.play(&MoveSpec::Uci("e4d5".into())).unwrap();
        assert_eq!(capture.san, "exd5");
        assert!(capture.is_capture);
        assert!(!capture.is_check_or_mate());
    }

    #[test]
    fn test_checkmate_flag() {
        // Fool's mate
        let pos = GamePosition::from_fen("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq g3 0 2")
            .unwrap();
        let (next, mv) = pos.play(&MoveSpec::San("Qh4#".into())).unwrap();
        assert_eq!(mv.san, "Qh4#");
        assert!(mv.is_checkmate);
        assert_eq!(next.side_to_move(), Side::White);
    }

    #[test]
    fn test_square_attacks() {
        let pos = GamePosition::starting();
        assert!(pos.is_square_attacked(Square::F3, Side::White));
        assert!(!pos.is_square_attacked(Square::E4, Side::White));
        assert!(pos.is_square_attacked(Square::F6, Side::Black));
    }
}
