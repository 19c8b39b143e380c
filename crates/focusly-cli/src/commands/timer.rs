use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use focusly_core::storage::SettingsProvider;
use focusly_core::timer::Step;
use focusly_core::{
    CommandPlayer, Config, Database, Event, PomodoroConfig, PomodoroEngine, Schedule,
    SilentPlayer, SoundEffect, SoundError, SoundPlayer, TimerDriver, TimerSnapshot,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a session in the terminal, reading commands from stdin
    Run {
        /// Use this user's stored settings instead of the config file
        #[arg(long)]
        user: Option<String>,
        /// Continue into the next phase without waiting for `start`
        #[arg(long)]
        auto_continue: bool,
        /// Start the first phase immediately
        #[arg(long)]
        start: bool,
        /// Tick period in milliseconds
        #[arg(long, default_value_t = 1000, hide = true)]
        tick_ms: u64,
    },
    /// Print the phase plan of a session as JSON
    Plan {
        /// Use this user's stored settings instead of the config file
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    config: &'a PomodoroConfig,
    steps: &'a [Step],
    focus_count: usize,
    long_break_count: usize,
    total_duration_min: u64,
}

/// Rings the terminal bell; the only alert available without a player command.
struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play(&self, effect: SoundEffect, volume: f64) -> Result<(), SoundError> {
        if volume <= 0.0 {
            return Ok(());
        }
        let mut err = std::io::stderr();
        err.write_all(b"\x07")
            .and_then(|_| err.flush())
            .map_err(|e| SoundError::Unavailable(e.to_string()))?;
        tracing::trace!(%effect, "terminal bell");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Toggle,
    Start,
    Pause,
    Skip,
    Reset,
    Status,
    Help,
    Quit,
    Unknown,
}

impl Input {
    fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" => Input::Toggle,
            "s" | "start" => Input::Start,
            "p" | "pause" => Input::Pause,
            "k" | "skip" => Input::Skip,
            "r" | "reset" | "new" => Input::Reset,
            "t" | "status" => Input::Status,
            "h" | "help" | "?" => Input::Help,
            "q" | "quit" | "exit" => Input::Quit,
            _ => Input::Unknown,
        }
    }
}

const HELP: &str = "commands: start (s), pause (p), skip (k), reset (r), status (t), quit (q); enter toggles";

fn load_settings(user: Option<&str>) -> Result<(PomodoroConfig, Config), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let pomodoro = match user {
        Some(user) => {
            let db = Database::open()?;
            db.for_user(user).pomodoro_config()?
        }
        None => config.pomodoro_config()?,
    };
    Ok((pomodoro, config))
}

fn sound_player(config: &Config) -> Arc<dyn SoundPlayer> {
    if !config.sound.enabled {
        return Arc::new(SilentPlayer);
    }
    match config.sound.command.as_deref().and_then(CommandPlayer::from_command_line) {
        Some(player) => Arc::new(player),
        None => Arc::new(TerminalBell),
    }
}

fn clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn describe(event: &Event) -> String {
    match event {
        Event::TimerStarted {
            phase,
            current_round,
            remaining_secs,
            ..
        } => format!(
            "started: {} (round {current_round}), {} left",
            phase.name(),
            clock(*remaining_secs)
        ),
        Event::TimerPaused { remaining_secs, .. } => {
            format!("paused at {}", clock(*remaining_secs))
        }
        Event::PhaseCompleted {
            from,
            to,
            current_round,
            skipped,
            ..
        } => format!(
            "{} {} -> {} (round {current_round})",
            from.name(),
            if *skipped { "skipped" } else { "finished" },
            to.name()
        ),
        Event::SessionFinished { rounds, .. } => {
            format!("session complete: {rounds} rounds done, reset to start a new one")
        }
        Event::TimerReset { .. } => "reset to round 1".to_string(),
    }
}

fn render(snapshot: &TimerSnapshot) -> String {
    if snapshot.is_finished() {
        return "session complete".to_string();
    }
    const WIDTH: usize = 20;
    let filled = (snapshot.progress_fraction * WIDTH as f64).round() as usize;
    format!(
        "{:<5} {}  {}  [{}{}]{}",
        snapshot.phase.label(),
        snapshot.clock(),
        snapshot.round_label(),
        "#".repeat(filled.min(WIDTH)),
        "-".repeat(WIDTH - filled.min(WIDTH)),
        if snapshot.is_running { "" } else { "  (paused)" }
    )
}

struct Output {
    live: bool,
}

impl Output {
    fn line(&self, text: &str) {
        if self.live {
            print!("\r\x1b[2K");
        }
        println!("{text}");
    }

    fn status(&self, snapshot: &TimerSnapshot) {
        if self.live {
            print!("\r\x1b[2K{}", render(snapshot));
            let _ = std::io::stdout().flush();
        }
    }

    fn drain(&self, events: &mut broadcast::Receiver<Event>) {
        loop {
            match events.try_recv() {
                Ok(event) => self.line(&describe(&event)),
                Err(TryRecvError::Lagged(n)) => tracing::warn!(missed = n, "event stream lagged"),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }
}

async fn session(mut driver: TimerDriver, start_now: bool) -> Result<(), Box<dyn std::error::Error>> {
    let out = Output {
        live: std::io::stdout().is_terminal(),
    };
    let mut events = driver.subscribe();
    let mut snapshots = driver.watch();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    out.line(HELP);
    if start_now {
        driver.start();
    }
    out.drain(&mut events);
    out.status(&driver.snapshot());

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Input::parse(&line) {
                    Input::Toggle => { driver.toggle(); }
                    Input::Start => {
                        if driver.start().is_none() && driver.snapshot().is_finished() {
                            out.line("session complete, reset to start a new one");
                        }
                    }
                    Input::Pause => { driver.pause(); }
                    Input::Skip => { driver.skip(); }
                    Input::Reset => { driver.reset(); }
                    Input::Status => out.line(&serde_json::to_string(&driver.snapshot())?),
                    Input::Help => out.line(HELP),
                    Input::Quit => break,
                    Input::Unknown => out.line(&format!("unknown command '{}'; {HELP}", line.trim())),
                }
                out.drain(&mut events);
                out.status(&driver.snapshot());
            }
            event = events.recv() => match event {
                Ok(event) => {
                    out.line(&describe(&event));
                    out.status(&driver.snapshot());
                }
                Err(RecvError::Lagged(n)) => tracing::warn!(missed = n, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
            changed = snapshots.changed(), if out.live => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                out.status(&snapshot);
            }
        }
    }

    if out.live {
        println!();
    }
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run {
            user,
            auto_continue,
            start,
            tick_ms,
        } => {
            let (pomodoro, config) = load_settings(user.as_deref())?;
            let engine = PomodoroEngine::new(pomodoro, sound_player(&config))?
                .with_auto_continue(auto_continue || config.timer.auto_continue);
            let driver = TimerDriver::new(engine).with_period(Duration::from_millis(tick_ms.max(1)));

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(session(driver, start))?;
        }
        TimerAction::Plan { user } => {
            let (pomodoro, _) = load_settings(user.as_deref())?;
            let plan = Schedule::plan(&pomodoro);
            let out = PlanOutput {
                focus_count: plan.focus_count(),
                long_break_count: plan.long_break_count(),
                total_duration_min: plan.total_duration_min(),
                config: &pomodoro,
                steps: &plan.steps,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}
