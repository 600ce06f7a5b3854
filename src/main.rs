use std::sync::Arc;

use analysis::{AnalysisConfig, AnalysisSession};
use engine::ProcessLauncher;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Line-oriented stand-in for the board UI: reads commands from stdin and
/// prints the session snapshot as JSON whenever it changes.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = AnalysisConfig::from_env();
    log::info!("Using engine at {}", config.engine.path);

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let launcher = Arc::new(ProcessLauncher::new(config.engine.clone()));
    let mut session = AnalysisSession::new(launcher, events_tx, config.options.clone());
    session.start().await;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut printed = None;

    loop {
        tokio::select! {
            Some(output) = events_rx.recv() => {
                session.handle_output(output).await;
            }
            line = stdin.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_command(&mut session, &line).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        log::error!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                break;
            }
        }

        if printed != Some(session.revision()) {
            printed = Some(session.revision());
            print_snapshot(&session);
        }
    }

    session.stop().await;
    print_snapshot(&session);
}

/// Returns false when the driver should exit.
async fn handle_command(session: &mut AnalysisSession, line: &str) -> bool {
    let line = line.trim();
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "" => {}
        "fen" => session.submit_position(rest),
        "move" => {
            let mut squares = rest.split_whitespace();
            match (squares.next(), squares.next()) {
                (Some(from), Some(to)) => {
                    if !session.submit_board_move(from, to) {
                        eprintln!("Illegal move {}-{}", from, to);
                    }
                }
                _ => eprintln!("Usage: move <from> <to>"),
            }
        }
        "candidate" => session.submit_candidate_move(rest),
        "select" => match rest.parse::<usize>() {
            Ok(index) => session.select_line(index),
            Err(_) => eprintln!("Usage: select <line index>"),
        },
        "step" => session.advance_step(),
        "restart" => session.start().await,
        "state" => print_snapshot(session),
        "quit" => return false,
        other => eprintln!("Unknown command: {}", other),
    }
    true
}

fn print_snapshot(session: &AnalysisSession) {
    match serde_json::to_string(&session.snapshot()) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize snapshot: {}", e),
    }
}
