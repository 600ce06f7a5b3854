use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::{Engine, EngineError, Launcher};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Identity of one engine process. Output from any other instance than the
/// one currently held by the coordinator is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(u64);

impl InstanceId {
    pub fn next() -> Self {
        Self(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOutput {
    pub instance: InstanceId,
    pub kind: OutputKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputKind {
    Line(String),
    /// stdout reached EOF.
    Exited,
    Fault(String),
}

impl EngineOutput {
    pub fn line(instance: InstanceId, line: impl Into<String>) -> Self {
        Self { instance, kind: OutputKind::Line(line.into()) }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub path: String,
    pub args: Vec<String>,
    pub shutdown_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: "stockfish".to_string(),
            args: Vec::new(),
            shutdown_grace: Duration::from_millis(100),
        }
    }
}

pub struct ProcessEngine {
    id: InstanceId,
    child: Child,
    commands: UnboundedSender<String>,
    shutdown_grace: Duration,
}

impl ProcessEngine {
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: &EngineConfig, events: UnboundedSender<EngineOutput>) -> Result<Self, EngineError> {
        let mut child = Command::new(&config.path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn { path: config.path.clone(), source })?;

        let stdin = child.stdin.take().ok_or(EngineError::NotRunning)?;
        let stdout = child.stdout.take().ok_or(EngineError::NotRunning)?;

        let id = InstanceId::next();
        let (commands, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(write_commands(id, stdin, command_rx));
        tokio::spawn(read_output(id, stdout, events));

        log::info!("Started engine {:?} from '{}'", id, config.path);

        Ok(Self {
            id,
            child,
            commands,
            shutdown_grace: config.shutdown_grace,
        })
    }
}

async fn write_commands(id: InstanceId, mut stdin: ChildStdin, mut commands: mpsc::UnboundedReceiver<String>) {
    while let Some(cmd) = commands.recv().await {
        log::debug!("engine {:?} <- {}", id, cmd);
        let result = async {
            stdin.write_all(format!("{}\n", cmd).as_bytes()).await?;
            stdin.flush().await
        }
        .await;
        if let Err(e) = result {
            log::error!("Failed to write to engine {:?}: {}", id, e);
            break;
        }
    }
}

async fn read_output(id: InstanceId, stdout: ChildStdout, events: UnboundedSender<EngineOutput>) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        let kind = match lines.next_line().await {
            Ok(Some(line)) => OutputKind::Line(line.trim().to_string()),
            Ok(None) => OutputKind::Exited,
            Err(e) => OutputKind::Fault(e.to_string()),
        };
        let last = !matches!(kind, OutputKind::Line(_));
        if events.send(EngineOutput { instance: id, kind }).is_err() || last {
            break;
        }
    }
}

#[async_trait]
impl Engine for ProcessEngine {
    fn id(&self) -> InstanceId {
        self.id
    }

    fn send(&self, command: &str) -> Result<(), EngineError> {
        self.commands
            .send(command.to_string())
            .map_err(|_| EngineError::NotRunning)
    }

    async fn shutdown(&mut self) -> Result<(), EngineError> {
        if let Err(e) = self.send("quit") {
            log::warn!("Could not send quit to engine {:?}: {}", self.id, e);
        }
        tokio::time::sleep(self.shutdown_grace).await;

        // Kill even if quit went through; an already exited child is fine.
        if let Err(e) = self.child.start_kill() {
            log::debug!("Engine {:?} already gone: {}", self.id, e);
        }
        self.child.wait().await?;
        log::info!("Engine {:?} stopped", self.id);
        Ok(())
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        // Best effort to kill the child process
        let _ = self.child.start_kill();
    }
}

/// Starts a [`ProcessEngine`] per call from a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    config: EngineConfig,
}

impl ProcessLauncher {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self, events: UnboundedSender<EngineOutput>) -> Result<Box<dyn Engine>, EngineError> {
        Ok(Box::new(ProcessEngine::spawn(&self.config, events)?))
    }
}
