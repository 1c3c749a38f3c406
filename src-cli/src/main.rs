use clap::Parser;
use lessonplayer_core::{event_to_json, Command, Event, PracticeSession, SessionConfig};
use lessonplayer_infra_media_headless::HeadlessMediaProvider;
use lessonplayer_infra_storage_fs::FsStorage;
use lessonplayer_ports::media::{BackendKind, MediaProvider};
use lessonplayer_ports::storage::StoragePort;
use parking_lot::Mutex;
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const TICK: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(version, about = "Practice player driven by JSON commands on stdin")]
struct Arguments {
    /// Directory holding settings.json, library.json and presets.json.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Use the basic player even when the pitch-decoupled engine is enabled.
    #[arg(long)]
    basic_only: bool,

    /// Simulate a pitch-decoupled engine that fails to start.
    #[arg(long)]
    no_native_engine: bool,

    /// Move the simulated media clock in real time instead of on `Advance`.
    #[arg(long)]
    realtime: bool,

    /// Accept item keys that do not name an existing file.
    #[arg(long)]
    allow_missing_files: bool,
}

/// Host-side lines understood next to the session commands.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", content = "payload")]
enum HostCommand {
    Advance { ms: u64 },
    Quit,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum InputLine {
    Session(Command),
    Host(HostCommand),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Arguments::parse();
    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => FsStorage::default_base_dir()?,
    };
    let storage = Arc::new(FsStorage::new(data_dir));
    let settings = match storage.load_settings() {
        Ok(settings) => settings,
        Err(err) => {
            warn!(error = %err, "could not read settings; using defaults");
            Default::default()
        }
    };

    let mut config = SessionConfig::from(&settings);
    if args.basic_only {
        config.backend_preference = BackendKind::Basic;
    }

    let provider = HeadlessMediaProvider::new(!args.no_native_engine)
        .require_files(!args.allow_missing_files);
    info!(
        available = provider.probe_pitch_decoupled(),
        "pitch-decoupled engine probe"
    );

    let data_dir = storage.base_dir().display().to_string();
    let session = PracticeSession::new(&provider, storage, config, settings.volume)?;
    info!(backend = ?session.backend_kind(), %data_dir, "session ready");
    let session = Arc::new(Mutex::new(session));
    let running = Arc::new(AtomicBool::new(true));

    let ticker = {
        let session = session.clone();
        let provider = provider.clone();
        let running = running.clone();
        let realtime = args.realtime;
        std::thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                if realtime {
                    provider.advance(TICK.as_millis() as u64);
                }
                let events = {
                    let mut session = session.lock();
                    session.tick();
                    session.drain_events()
                };
                emit_all(&events);
                std::thread::sleep(TICK);
            }
        })
    };

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<InputLine>(line) {
            Ok(InputLine::Session(command)) => {
                let events = {
                    let mut session = session.lock();
                    if let Err(err) = session.handle_command(command) {
                        warn!(error = %err, "command failed");
                    }
                    session.drain_events()
                };
                emit_all(&events);
            }
            Ok(InputLine::Host(HostCommand::Advance { ms })) => provider.advance(ms),
            Ok(InputLine::Host(HostCommand::Quit)) => break,
            Err(err) => warn!(error = %err, line, "unrecognised input line"),
        }
    }

    running.store(false, Ordering::Relaxed);
    if ticker.join().is_err() {
        warn!("ticker thread panicked");
    }
    Ok(())
}

fn emit_all(events: &[Event]) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for event in events {
        match event_to_json(event) {
            Ok(json) => {
                let _ = writeln!(out, "{json}");
            }
            Err(err) => warn!(error = %err, "could not encode event"),
        }
    }
    let _ = out.flush();
}
