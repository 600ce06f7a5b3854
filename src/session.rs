//! The engine-session coordinator.
//!
//! [`AnalysisSession`] owns the engine handle and every piece of analysis
//! state. It is driven from a single task: engine output goes through
//! [`AnalysisSession::handle_output`], user actions through the `submit_*`,
//! `select_line` and `advance_step` methods. Nothing here returns an error to
//! the caller; problems end up in the status and error texts of the snapshot.

use std::sync::Arc;

use chess::{
    replay_san, turn_text, uci_line_to_san, GamePosition, MoveDescriptor, MoveSpec, StaticReport,
};
use engine::{
    parse_uci_line, Engine, EngineEvent, EngineOptions, EngineOutput, InfoLine, InstanceId, Launcher,
    OutputKind, UciSession,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::cursor::SteppingCursor;
use crate::error::SessionError;
use crate::mode::{AnalysisMode, ModeKind, ModeTracker, SearchRequest, PRIMARY_LINES, PROBE_LINES};
use crate::pv::{OpponentResponse, PvLine, PvSet, ResponseSet};
use crate::state::{Arrow, SessionSnapshot};

const STATUS_LOADING: &str = "Loading engine...";
const STATUS_INITIALIZING: &str = "Engine ready. Initializing...";
const STATUS_INITIALIZED: &str = "Engine initialized and ready.";
const STATUS_ANALYZING: &str = "Analyzing...";
const STATUS_READY: &str = "Engine ready.";
const STATUS_UNLOADED: &str = "Engine unloaded.";
const INVALID_FEN: &str = "Invalid FEN.";

pub struct AnalysisSession {
    launcher: Arc<dyn Launcher>,
    events: UnboundedSender<EngineOutput>,
    engine: Option<Box<dyn Engine>>,
    protocol: UciSession,
    tracker: ModeTracker,
    primary: PvSet,
    probe: PvSet,
    responses: ResponseSet,
    cursor: SteppingCursor,
    board: GamePosition,
    report: StaticReport,
    fen_input: String,
    fen_error: Option<String>,
    candidate: Option<MoveDescriptor>,
    candidate_error: Option<String>,
    status: String,
    progress: String,
    evaluation: String,
    revision: u64,
}

impl AnalysisSession {
    /// `events` is the sending half of the channel whose receiver feeds
    /// [`AnalysisSession::handle_output`].
    pub fn new(launcher: Arc<dyn Launcher>, events: UnboundedSender<EngineOutput>, options: EngineOptions) -> Self {
        let board = GamePosition::starting();
        Self {
            launcher,
            events,
            engine: None,
            protocol: UciSession::new(options),
            tracker: ModeTracker::new(),
            primary: PvSet::with_cap(PRIMARY_LINES),
            probe: PvSet::with_cap(PROBE_LINES),
            responses: ResponseSet::with_cap(PROBE_LINES),
            cursor: SteppingCursor::default(),
            report: StaticReport::of(&board),
            fen_input: board.fen().to_string(),
            board,
            fen_error: None,
            candidate: None,
            candidate_error: None,
            status: STATUS_LOADING.to_string(),
            progress: String::new(),
            evaluation: String::new(),
            revision: 0,
        }
    }

    /// Starts a fresh engine, replacing any existing one. A launch failure is
    /// reported in the status text and not retried.
    pub async fn start(&mut self) {
        self.teardown().await;

        match self.launcher.launch(self.events.clone()) {
            Ok(engine) => {
                log::info!("Engine {:?} launched", engine.id());
                self.engine = Some(engine);
                self.status = STATUS_LOADING.to_string();
                let commands = self.protocol.begin();
                self.send_all(&commands);
            }
            Err(e) => {
                log::error!("Error creating engine: {}", e);
                self.status = format!("Error creating engine: {}.", e);
            }
        }
        self.touch();
    }

    pub async fn stop(&mut self) {
        if self.engine.is_none() {
            return;
        }
        self.teardown().await;
        self.status = STATUS_UNLOADED.to_string();
        self.touch();
    }

    async fn teardown(&mut self) {
        self.protocol.reset();
        self.tracker.reset();
        self.progress.clear();
        if let Some(mut engine) = self.engine.take() {
            if let Err(e) = engine.shutdown().await {
                log::warn!("Engine {:?} did not shut down cleanly: {}", engine.id(), e);
            }
        }
    }

    async fn fail(&mut self, reason: &str) {
        log::error!("Engine failure: {}", reason);
        self.teardown().await;
        self.status = format!("Engine error: {}.", reason);
        self.touch();
    }

    pub fn engine_id(&self) -> Option<InstanceId> {
        self.engine.as_ref().map(|e| e.id())
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_some() && self.protocol.is_ready()
    }

    pub fn mode(&self) -> &AnalysisMode {
        self.tracker.mode()
    }

    /// Bumped on every change of published state.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn send(&self, command: &str) -> Result<(), SessionError> {
        let engine = self.engine.as_ref().ok_or(SessionError::NotReady)?;
        engine.send(command)?;
        Ok(())
    }

    fn send_all(&self, commands: &[String]) {
        for command in commands {
            if let Err(e) = self.send(command) {
                log::error!("Failed to send '{}': {}", command, e);
            }
        }
    }

    fn issue(&self, request: &SearchRequest) -> Result<(), SessionError> {
        if request.supersedes {
            self.send("stop")?;
        }
        for command in &request.commands {
            self.send(command)?;
        }
        Ok(())
    }

    pub async fn handle_output(&mut self, output: EngineOutput) {
        if self.engine_id() != Some(output.instance) {
            log::trace!("Dropping output of stale engine {:?}", output.instance);
            return;
        }

        match output.kind {
            OutputKind::Line(line) => self.handle_line(&line),
            OutputKind::Exited => self.fail("engine process exited").await,
            OutputKind::Fault(reason) => self.fail(&reason).await,
        }
    }

    fn handle_line(&mut self, line: &str) {
        let Some(event) = parse_uci_line(line) else {
            return;
        };

        match event {
            EngineEvent::HandshakeAck => {
                let commands = self.protocol.on_handshake_ack();
                if !commands.is_empty() {
                    self.status = STATUS_INITIALIZING.to_string();
                    self.send_all(&commands);
                    self.touch();
                }
            }
            EngineEvent::ReadyAck => {
                if self.protocol.on_ready_ack() {
                    self.status = STATUS_INITIALIZED.to_string();
                    self.report = StaticReport::of(&self.board);
                    self.touch();
                }
            }
            EngineEvent::Info(info) => self.handle_info(info),
            EngineEvent::BestMove { best_move, .. } => self.handle_bestmove(&best_move),
            EngineEvent::IdName(name) => log::info!("Engine name: {}", name),
            EngineEvent::IdAuthor(author) => log::debug!("Engine author: {}", author),
            EngineEvent::Unknown(other) => log::debug!("Unhandled engine output: {}", other),
        }
    }

    fn handle_info(&mut self, info: InfoLine) {
        if !self.protocol.is_ready() || self.tracker.is_idle() {
            log::debug!("Unhandled info line in {:?}: {:?}", self.tracker.mode().kind(), info);
            return;
        }
        if !self.tracker.accepts_output() {
            log::trace!("Dropping info of superseded search");
            return;
        }
        if let Some(text) = &info.string {
            log::debug!("Engine says: {}", text);
            return;
        }

        let mut changed = false;
        match self.tracker.mode() {
            AnalysisMode::PrimaryAnalysis { base, .. } => {
                let progress = info.progress_text();
                if progress != self.progress {
                    self.progress = progress;
                    changed = true;
                }
                if let Some((rank, score, moves)) = info.pv_entry() {
                    changed |= self.primary.upsert(PvLine {
                        rank,
                        score,
                        moves: moves.to_vec(),
                        base: base.clone(),
                    });
                    let evaluation = score.to_string();
                    if rank == 1 && evaluation != self.evaluation {
                        self.evaluation = evaluation;
                        changed = true;
                    }
                }
            }
            AnalysisMode::ResponseProbe { base, .. } => {
                if let Some((rank, score, moves)) = info.pv_entry() {
                    changed |= self.probe.upsert(PvLine {
                        rank,
                        score,
                        moves: moves.to_vec(),
                        base: base.clone(),
                    });
                    if let Some(reply) = moves
                        .first()
                        .and_then(|first| OpponentResponse::from_line(rank, base, first))
                    {
                        changed |= self.responses.upsert(reply);
                    }
                }
            }
            AnalysisMode::Idle => {}
        }

        if changed {
            self.touch();
        }
    }

    fn handle_bestmove(&mut self, best_move: &str) {
        if let Some(finished) = self.tracker.finish_search() {
            log::info!("{:?} finished, best move {}", finished.kind(), best_move);
            self.status = STATUS_READY.to_string();
            self.progress.clear();
            self.touch();
        }
    }

    fn start_primary(&mut self, base: GamePosition) -> Result<(), SessionError> {
        if !self.is_ready() {
            return Err(SessionError::NotReady);
        }
        let request = self.tracker.begin_primary(base)?;

        self.primary.clear();
        self.probe.clear();
        self.responses.clear();
        self.cursor.reset();
        self.candidate = None;
        self.candidate_error = None;
        self.evaluation.clear();
        self.progress = "Starting...".to_string();
        self.status = STATUS_ANALYZING.to_string();

        self.issue(&request)
    }

    fn start_probe(&mut self, base: GamePosition, preceding: MoveDescriptor) -> Result<(), SessionError> {
        let status = format!("Checking responses to {}...", preceding.san);
        let request = self.tracker.begin_probe(base, preceding)?;
        self.status = status;
        self.issue(&request)
    }

    fn analyse(&mut self, base: GamePosition) {
        let fen = base.fen().to_string();
        if let Err(e) = self.start_primary(base) {
            log::warn!("Not analysing {}: {}", fen, e);
        }
    }

    fn set_board(&mut self, position: GamePosition) {
        self.report = StaticReport::of(&position);
        self.board = position;
    }

    fn probe_running(&self) -> bool {
        self.tracker.mode().kind() == ModeKind::ResponseProbe
    }

    /// Validates `text` as a position, shows it and analyses it. Invalid
    /// input only sets the FEN error; the board is kept.
    pub fn submit_position(&mut self, text: &str) {
        if self.probe_running() {
            log::debug!("Position ignored while checking responses");
            return;
        }

        self.candidate = None;
        self.candidate_error = None;
        self.probe.clear();
        self.responses.clear();

        match GamePosition::from_fen(text) {
            Ok(position) => {
                self.fen_input = position.fen().to_string();
                self.fen_error = None;
                self.set_board(position.clone());
                self.analyse(position);
            }
            Err(e) => {
                log::info!("Rejected position {:?}: {}", text, e);
                self.fen_input = text.to_string();
                self.fen_error = Some(INVALID_FEN.to_string());
                self.report = StaticReport::default();
            }
        }
        self.touch();
    }

    /// A piece dragged on the board. Returns false when the move is illegal.
    pub fn submit_board_move(&mut self, from: &str, to: &str) -> bool {
        if self.probe_running() {
            log::debug!("Board move ignored while checking responses");
            return false;
        }

        let spec = MoveSpec::Squares { from: from.to_string(), to: to.to_string() };
        match self.board.play(&spec) {
            Ok((next, mv)) => {
                log::info!("Board move {}", mv.san);
                self.fen_input = next.fen().to_string();
                self.fen_error = None;
                self.set_board(next.clone());
                self.analyse(next);
                self.touch();
                true
            }
            Err(e) => {
                log::debug!("Rejected board move {}-{}: {}", from, to, e);
                false
            }
        }
    }

    /// Plays `text` (SAN or engine notation) on the shown board and asks the
    /// engine for the best replies to it.
    pub fn submit_candidate_move(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() || !self.tracker.is_idle() || !self.is_ready() {
            log::debug!("Candidate move {:?} ignored", text);
            return;
        }

        self.candidate = None;
        self.candidate_error = None;
        self.probe.clear();
        self.responses.clear();

        match self.board.play(&MoveSpec::Text(text.to_string())) {
            Ok((after, mv)) => {
                log::info!("Candidate {} leads to {}", mv.san, after.fen());
                self.candidate = Some(mv.clone());
                if let Err(e) = self.start_probe(after, mv) {
                    log::warn!("Cannot check responses: {}", e);
                }
            }
            Err(e) => {
                log::debug!("Rejected candidate {:?}: {}", text, e);
                self.candidate_error = Some(format!("Invalid: \"{}\"", text));
            }
        }
        self.touch();
    }

    /// Selects (or deselects) a PV line and shows its starting position.
    pub fn select_line(&mut self, index: usize) {
        if !self.tracker.is_idle() {
            return;
        }
        let Some(base) = self.primary.get(index).map(|line| line.base.clone()) else {
            log::debug!("No line {} to select", index);
            return;
        };

        self.cursor.select(index);
        self.set_board(base);
        self.touch();
    }

    /// Reveals the next move of the selected line on the board.
    pub fn advance_step(&mut self) {
        if !self.tracker.is_idle() {
            return;
        }
        let Some(line) = self.cursor.selected().and_then(|index| self.primary.get(index)) else {
            return;
        };
        let base = line.base.clone();
        let moves = line.moves.clone();

        if !self.cursor.advance(moves.len()) {
            return;
        }
        self.touch();

        let san = uci_line_to_san(&base, &moves[..self.cursor.revealed()]);
        if let Some(token) = &san.failed_at {
            log::error!("Cannot step to move {} of line: '{}' does not replay", self.cursor.revealed(), token);
            return;
        }
        match replay_san(&base, &san.moves) {
            Ok(position) => self.set_board(position),
            Err(e) => log::error!("Cannot step through line: {}", e),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let kind = self.tracker.mode().kind();
        let mut arrows: Vec<Arrow> = self.candidate.iter().map(Arrow::for_candidate).collect();
        arrows.extend(self.responses.responses().iter().map(Arrow::for_response));

        SessionSnapshot {
            revision: self.revision,
            board_fen: self.board.fen().to_string(),
            fen_input: self.fen_input.clone(),
            fen_error: self.fen_error.clone(),
            turn: turn_text(&self.board),
            engine_ready: self.is_ready(),
            status: self.status.clone(),
            analyzing: kind == ModeKind::PrimaryAnalysis,
            checking_responses: kind == ModeKind::ResponseProbe,
            progress: self.progress.clone(),
            evaluation: self.evaluation.clone(),
            lines: self.primary.displays(),
            probe_lines: self.probe.displays(),
            responses: self.responses.responses().to_vec(),
            candidate: self.candidate.clone(),
            candidate_error: self.candidate_error.clone(),
            cursor: self.cursor,
            report: self.report.clone(),
            arrows,
        }
    }
}
