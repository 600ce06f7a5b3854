//! Initialization handshake of a UCI engine.
//!
//! `uci` -> `uciok` -> options -> `isready` -> `readyok`. The session only
//! decides which commands to send next; writing them is the caller's job.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Uninitialized,
    AwaitingUciOk,
    ConfiguringOptions,
    AwaitingReadyOk,
    Ready,
}

/// Options sent once after `uciok`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    pub use_nnue: bool,
    pub threads: u32,
    pub hash_mb: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            use_nnue: true,
            threads: 4,
            hash_mb: 128,
        }
    }
}

impl EngineOptions {
    pub fn commands(&self) -> Vec<String> {
        vec![
            format!("setoption name Use NNUE value {}", self.use_nnue),
            format!("setoption name Threads value {}", self.threads),
            format!("setoption name Hash value {}", self.hash_mb),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct UciSession {
    state: SessionState,
    options: EngineOptions,
}

impl UciSession {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            state: SessionState::Uninitialized,
            options,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn begin(&mut self) -> Vec<String> {
        self.state = SessionState::AwaitingUciOk;
        vec!["uci".to_string()]
    }

    /// Commands to send in answer to `uciok`, empty when it was not expected.
    pub fn on_handshake_ack(&mut self) -> Vec<String> {
        if self.state != SessionState::AwaitingUciOk {
            log::warn!("Ignoring uciok in state {:?}", self.state);
            return Vec::new();
        }

        self.state = SessionState::ConfiguringOptions;
        let mut commands = self.options.commands();
        commands.push("isready".to_string());
        self.state = SessionState::AwaitingReadyOk;
        commands
    }

    /// Returns true exactly once, on the `readyok` that completes the handshake.
    pub fn on_ready_ack(&mut self) -> bool {
        if self.state != SessionState::AwaitingReadyOk {
            log::debug!("Ignoring readyok in state {:?}", self.state);
            return false;
        }
        self.state = SessionState::Ready;
        true
    }

    pub fn reset(&mut self) {
        self.state = SessionState::Uninitialized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_handshake() {
        let mut session = UciSession::new(EngineOptions::default());
        assert_eq!(session.state(), SessionState::Uninitialized);

        assert_eq!(session.begin(), vec!["uci"]);
        assert_eq!(session.state(), SessionState::AwaitingUciOk);

        let commands = session.on_handshake_ack();
        assert_eq!(
            commands,
            vec![
                "setoption name Use NNUE value true",
                "setoption name Threads value 4",
                "setoption name Hash value 128",
                "isready",
            ]
        );
        assert_eq!(session.state(), SessionState::AwaitingReadyOk);

        assert!(session.on_ready_ack());
        assert!(session.is_ready());
    }

    #[test]
    fn test_unexpected_acks_are_ignored() {
        let mut session = UciSession::new(EngineOptions::default());
        assert!(session.on_handshake_ack().is_empty());
        assert!(!session.on_ready_ack());
        assert_eq!(session.state(), SessionState::Uninitialized);

        session.begin();
        session.on_handshake_ack();
        assert!(session.on_ready_ack());
        assert!(!session.on_ready_ack());
        assert!(session.on_handshake_ack().is_empty());
        assert!(session.is_ready());
    }

    #[test]
    fn test_custom_options() {
        let options = EngineOptions { use_nnue: false, threads: 1, hash_mb: 16 };
        let mut session = UciSession::new(options);
        session.begin();
        let commands = session.on_handshake_ack();
        assert_eq!(commands[0], "setoption name Use NNUE value false");
        assert_eq!(commands[1], "setoption name Threads value 1");
        assert_eq!(commands[2], "setoption name Hash value 16");
    }

    #[test]
    fn test_reset() {
        let mut session = UciSession::new(EngineOptions::default());
        session.begin();
        session.on_handshake_ack();
        session.on_ready_ack();
        session.reset();
        assert_eq!(session.state(), SessionState::Uninitialized);
    }
}
