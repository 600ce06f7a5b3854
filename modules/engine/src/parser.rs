use std::fmt;

use serde::{Deserialize, Serialize};

pub fn parse_uci_line(line: &str) -> Option<EngineEvent> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return None;
    }

    match parts[0] {
        "id" => {
            if parts.len() >= 3 {
                match parts[1] {
                    "name" => Some(EngineEvent::IdName(parts[2..].join(" "))),
                    "author" => Some(EngineEvent::IdAuthor(parts[2..].join(" "))),
                    _ => Some(EngineEvent::Unknown(line.to_string())),
                }
            } else {
                Some(EngineEvent::Unknown(line.to_string()))
            }
        }
        "uciok" => Some(EngineEvent::HandshakeAck),
        "readyok" => Some(EngineEvent::ReadyAck),
        "bestmove" => {
            if parts.len() >= 2 {
                let best_move = parts[1].to_string();
                let ponder = if parts.len() >= 4 && parts[2] == "ponder" {
                    Some(parts[3].to_string())
                } else {
                    None
                };
                Some(EngineEvent::BestMove { best_move, ponder })
            } else {
                // Some engines print a bare `bestmove` when there is nothing to play.
                Some(EngineEvent::BestMove { best_move: String::new(), ponder: None })
            }
        }
        "info" => Some(EngineEvent::Info(parse_info(&parts[1..]))),
        _ => Some(EngineEvent::Unknown(line.to_string())),
    }
}

fn parse_info(parts: &[&str]) -> InfoLine {
    let mut info = InfoLine::default();

    let mut i = 0;
    while i < parts.len() {
        match parts[i] {
            "depth" => {
                info.depth = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "seldepth" => {
                info.seldepth = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "nodes" => {
                info.nodes = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "multipv" => {
                info.multipv = parts.get(i + 1).and_then(|v| v.parse().ok());
                i += 2;
            }
            "score" => {
                if i + 2 < parts.len() {
                    let value = parts[i + 2].parse::<i32>().ok();
                    info.score = match parts[i + 1] {
                        "cp" => value.map(Score::Centipawns),
                        "mate" => value.map(Score::Mate),
                        _ => None,
                    };
                    i += 3;
                } else {
                    i += 1;
                }
            }
            "pv" => {
                info.pv = Some(parts[i + 1..].iter().map(|m| m.to_string()).collect());
                break;
            }
            "string" => {
                info.string = Some(parts[i + 1..].join(" "));
                break;
            }
            _ => {
                i += 1;
            }
        }
    }

    info
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    IdName(String),
    IdAuthor(String),
    /// `uciok`
    HandshakeAck,
    /// `readyok`
    ReadyAck,
    Info(InfoLine),
    BestMove { best_move: String, ponder: Option<String> },
    Unknown(String),
}

/// One `info` line. Every field is optional because engines only print what
/// changed since the previous line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoLine {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub nodes: Option<u64>,
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    pub pv: Option<Vec<String>>,
    pub string: Option<String>,
}

impl InfoLine {
    /// `(rank, score, moves)` when the line carries a complete ranked variation.
    pub fn pv_entry(&self) -> Option<(u32, Score, &[String])> {
        match (self.multipv, self.score, self.pv.as_deref()) {
            (Some(rank), Some(score), Some(moves)) => Some((rank, score, moves)),
            _ => None,
        }
    }

    pub fn progress_text(&self) -> String {
        let depth = self.depth.map_or_else(|| "N/A".to_string(), |d| d.to_string());
        let nodes = self.nodes.map_or_else(|| "N/A".to_string(), |n| n.to_string());
        format!("Depth: {}, Nodes: {}", depth, nodes)
    }
}

/// Engine evaluation from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Centipawns(cp) => {
                let pawns = *cp as f64 / 100.0;
                if *cp > 0 {
                    write!(f, "+{:.2}", pawns)
                } else {
                    write!(f, "{:.2}", pawns)
                }
            }
            Self::Mate(n) => write!(f, "M{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(line: &str) -> InfoLine {
        match parse_uci_line(line) {
            Some(EngineEvent::Info(info)) => info,
            other => panic!("Expected Info, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_uciok() {
        let msg = parse_uci_line("uciok").unwrap();
        assert!(matches!(msg, EngineEvent::HandshakeAck));
    }

    #[test]
    fn test_parse_readyok() {
        let msg = parse_uci_line("readyok").unwrap();
        assert!(matches!(msg, EngineEvent::ReadyAck));
    }

    #[test]
    fn test_parse_blank_line() {
        assert!(parse_uci_line("   ").is_none());
    }

    #[test]
    fn test_parse_bestmove() {
        let msg = parse_uci_line("bestmove e2e4 ponder e7e5").unwrap();
        if let EngineEvent::BestMove { best_move, ponder } = msg {
            assert_eq!(best_move, "e2e4");
            assert_eq!(ponder, Some("e7e5".to_string()));
        } else {
            panic!("Expected BestMove");
        }
    }

    #[test]
    fn test_parse_bestmove_without_ponder() {
        let msg = parse_uci_line("bestmove g1f3").unwrap();
        assert_eq!(
            msg,
            EngineEvent::BestMove { best_move: "g1f3".to_string(), ponder: None }
        );
    }

    #[test]
    fn test_parse_info() {
        let info = info("info depth 12 seldepth 17 multipv 2 score cp 35 nodes 12345 pv e2e4 e7e5 g1f3");
        assert_eq!(info.depth, Some(12));
        assert_eq!(info.seldepth, Some(17));
        assert_eq!(info.multipv, Some(2));
        assert_eq!(info.nodes, Some(12345));
        assert_eq!(info.score, Some(Score::Centipawns(35)));
        assert_eq!(info.pv, Some(vec!["e2e4".to_string(), "e7e5".to_string(), "g1f3".to_string()]));
    }

    #[test]
    fn test_parse_info_mate() {
        let info = info("info depth 12 multipv 1 score mate 3 pv e2e4 e7e5");
        assert_eq!(info.score, Some(Score::Mate(3)));
        let (rank, score, moves) = info.pv_entry().unwrap();
        assert_eq!(rank, 1);
        assert_eq!(score, Score::Mate(3));
        assert_eq!(moves, ["e2e4", "e7e5"]);
    }

    #[test]
    fn test_parse_info_bound_is_skipped() {
        let info = info("info depth 20 multipv 1 score cp -12 upperbound nodes 900 pv d2d4");
        assert_eq!(info.score, Some(Score::Centipawns(-12)));
        assert_eq!(info.nodes, Some(900));
        assert!(info.pv_entry().is_some());
    }

    #[test]
    fn test_info_without_multipv_is_progress_only() {
        let info = info("info depth 5 nodes 1000 score cp 20 pv e2e4");
        assert!(info.pv_entry().is_none());
        assert_eq!(info.progress_text(), "Depth: 5, Nodes: 1000");
    }

    #[test]
    fn test_info_currmove_has_no_pv() {
        let info = info("info depth 9 currmove e2e4 currmovenumber 1");
        assert!(info.pv_entry().is_none());
        assert_eq!(info.progress_text(), "Depth: 9, Nodes: N/A");
    }

    #[test]
    fn test_info_string_swallows_rest() {
        let info = info("info string NNUE evaluation using nn-5af11540bbfe.nnue pv e2e4");
        assert_eq!(
            info.string.as_deref(),
            Some("NNUE evaluation using nn-5af11540bbfe.nnue pv e2e4")
        );
        assert!(info.pv.is_none());
    }

    #[test]
    fn test_malformed_numbers_are_ignored() {
        let info = info("info depth x multipv y score cp z pv e2e4");
        assert_eq!(info.depth, None);
        assert_eq!(info.multipv, None);
        assert_eq!(info.score, None);
    }

    #[test]
    fn test_parse_id() {
        let msg = parse_uci_line("id name Stockfish 16").unwrap();
        if let EngineEvent::IdName(name) = msg {
            assert_eq!(name, "Stockfish 16");
        } else {
            panic!("Expected IdName");
        }
    }

    #[test]
    fn test_score_formatting() {
        assert_eq!(Score::Centipawns(137).to_string(), "+1.37");
        assert_eq!(Score::Centipawns(-50).to_string(), "-0.50");
        assert_eq!(Score::Centipawns(25).to_string(), "+0.25");
        assert_eq!(Score::Centipawns(0).to_string(), "0.00");
        assert_eq!(Score::Mate(5).to_string(), "M5");
        assert_eq!(Score::Mate(-2).to_string(), "M-2");
    }
}
