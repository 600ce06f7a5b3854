//! Coordinator between a chess analysis UI and a UCI engine process.

pub mod config;
pub mod cursor;
pub mod error;
pub mod mode;
pub mod pv;
pub mod session;
pub mod state;

pub use config::AnalysisConfig;
pub use cursor::SteppingCursor;
pub use error::SessionError;
pub use mode::{AnalysisMode, Generation, ModeKind, ModeTracker, SearchRequest};
pub use pv::{OpponentResponse, PvDisplay, PvLine, PvSet, ResponseSet};
pub use session::AnalysisSession;
pub use state::{Arrow, ArrowColor, SessionSnapshot};
