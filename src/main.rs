use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use tally::kernel::{Clock, Engine, Reply, ScanScheduler, Session, SystemClock};
use tally::patterns::{PatternAccess, PatternStore, RenderTarget};
use tally::store::{InMemoryTaskStore, TaskStore};
use tally::EngineConfig;

/// Which numbered list the user last saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    None,
    Suggestion,
    Candidate,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::var("TALLY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("tally.toml"));
    let config = EngineConfig::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let tasks = match std::env::var("TALLY_DATA") {
        Ok(path) => InMemoryTaskStore::load_json(&PathBuf::from(&path))
            .with_context(|| format!("loading tasks from {path}"))?,
        Err(_) => InMemoryTaskStore::new(),
    };
    tracing::info!(tasks = tasks.tasks().len(), "tally starting");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let engine = Engine::new(tasks, PatternStore::new(&config.patterns)).shared();

    let cancel = CancellationToken::new();
    let (reports_tx, mut reports_rx) = mpsc::channel(16);
    let (scheduler, task_counts) = ScanScheduler::new(engine.clone(), clock.clone(), &config.scan);
    let scheduler = tokio::spawn(scheduler.with_reports(reports_tx).run(cancel.clone()));

    // Surface new inline suggestions as they appear.
    let printer_engine = engine.clone();
    tokio::spawn(async move {
        while let Some((_, report)) = reports_rx.recv().await {
            if !report.changed {
                continue;
            }
            let engine = printer_engine.lock().await;
            for pattern in engine.patterns.active_patterns() {
                let marker = match pattern.render_target {
                    RenderTarget::Inline => "?",
                    RenderTarget::Toast => "i",
                };
                println!("[{marker}] {} ({})", pattern.description, pattern.id);
            }
        }
    });

    let mut session = Session::new(config.intent.clone(), clock.clone());
    let mut choice = Choice::None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("tally – sag „Hilfe“, um zu sehen, was ich kann. „:quit“ beendet.");

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let mut guard = engine.lock().await;
        let state = &mut *guard;
        let lowered = input.to_lowercase();

        let reply = match lowered.as_str() {
            ":quit" | ":q" => break,
            ":stats" => {
                println!("{}", serde_json::to_string_pretty(&state.telemetry.snapshot())?);
                continue;
            }
            "ja" | "j" | "yes" | "y" | "ok" => session.confirm(state),
            "nein" | "n" | "no" | "abbrechen" | "cancel" => session.cancel(state),
            _ => {
                if let Some(id) = input.strip_prefix(":accept ") {
                    session.accept_pattern_suggestion(id.trim(), None, state)
                } else if let Some(id) = input.strip_prefix(":dismiss ") {
                    let dismissed = session.dismiss_pattern_suggestion(id.trim(), false, state);
                    println!("{}", if dismissed { "Ausgeblendet." } else { "Unbekannter Vorschlag." });
                    continue;
                } else {
                    match (input.parse::<usize>(), choice) {
                        (Ok(n), Choice::Suggestion) if n > 0 => session.choose_suggestion(n - 1, state),
                        (Ok(n), Choice::Candidate) if n > 0 => session.choose_candidate(n - 1, state),
                        _ => session.handle_input(input, state),
                    }
                }
            }
        };

        choice = match &reply {
            Reply::Suggestions { .. } => Choice::Suggestion,
            Reply::Candidates { .. } => Choice::Candidate,
            _ if session.has_pending() => choice,
            _ => Choice::None,
        };
        println!("{}", reply.text());

        let changed_count = match &reply {
            Reply::Executed { result } if result.success => Some(state.tasks.tasks().len()),
            _ => None,
        };
        drop(guard);
        if let Some(count) = changed_count {
            let _ = task_counts.send(count).await;
        }
    }

    cancel.cancel();
    scheduler.await.context("scan scheduler panicked")?;
    Ok(())
}
