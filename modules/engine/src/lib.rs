use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

pub mod parser;
pub mod process;
pub mod uci;

pub use parser::{parse_uci_line, EngineEvent, InfoLine, Score};
pub use process::{EngineConfig, EngineOutput, InstanceId, OutputKind, ProcessEngine, ProcessLauncher};
pub use uci::{EngineOptions, SessionState, UciSession};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Engine process not running")]
    NotRunning,
    #[error("Failed to start engine '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Limits for a single `go` command. Exactly one of the two is normally set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoParams {
    pub depth: Option<u32>,
    pub movetime_ms: Option<u32>,
}

impl GoParams {
    pub fn depth(depth: u32) -> Self {
        Self { depth: Some(depth), movetime_ms: None }
    }

    pub fn movetime(ms: u32) -> Self {
        Self { depth: None, movetime_ms: Some(ms) }
    }

    pub fn to_command(&self) -> String {
        let mut cmd = "go".to_string();
        if let Some(depth) = self.depth {
            cmd.push_str(&format!(" depth {}", depth));
        }
        if let Some(time) = self.movetime_ms {
            cmd.push_str(&format!(" movetime {}", time));
        }
        cmd
    }
}

pub fn position_command(fen: &str) -> String {
    format!("position fen {}", fen)
}

pub fn multipv_command(lines: u32) -> String {
    format!("setoption name MultiPV value {}", lines)
}

/// A live engine instance. Sending never waits for a reply; everything the
/// engine prints arrives on the channel handed to the [`Launcher`], stamped
/// with [`Engine::id`].
#[async_trait]
pub trait Engine: Send {
    fn id(&self) -> InstanceId;
    fn send(&self, command: &str) -> Result<(), EngineError>;
    /// Polite `quit`, a short grace period, then a forced kill.
    async fn shutdown(&mut self) -> Result<(), EngineError>;
}

pub trait Launcher: Send + Sync {
    fn launch(&self, events: UnboundedSender<EngineOutput>) -> Result<Box<dyn Engine>, EngineError>;
}
