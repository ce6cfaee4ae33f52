//! Fixed-rate host loop for the timer scheduler
//!
//! This binary:
//! 1. Creates a scheduler on the system clock
//! 2. Registers a handful of demo timers
//! 3. Runs the frame loop, feeding each frame's delta to the scheduler
//!
//! Keys:
//! - `f` - Toggle focus (suspend / resume)
//! - `l` - Show scheduler state
//! - `q` or Ctrl-C - Quit
//! - `h` or `?` - Show help
//!
//! Environment:
//! - `TARGET_FPS` (default 60)
//! - `RUN_SECONDS` (default 0 = until quit)
//! - `FRAMES_PER_TICK` (default 1)
//! - `SUSPEND_AT_SECONDS` / `SUSPEND_FOR_SECONDS` - simulate a focus loss

use std::rc::Rc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use rgb_timer::prelude::*;
use tracing::info;

/// Commands that can be sent from the input thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Focus,
    List,
    Quit,
    Help,
}

/// Runner settings read from the environment.
#[derive(Debug)]
struct RunnerConfig {
    target_fps: f64,
    run_for: Option<Duration>,
    frames_per_tick: u32,
    suspend_at: Option<Duration>,
    suspend_for: Duration,
}

impl RunnerConfig {
    fn from_env() -> Self {
        let run_seconds: f64 = env_or("RUN_SECONDS", 0.0);
        Self {
            target_fps: env_or("TARGET_FPS", 60.0_f64).max(1.0),
            run_for: secs(run_seconds),
            frames_per_tick: env_or("FRAMES_PER_TICK", 1),
            suspend_at: std::env::var("SUSPEND_AT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .and_then(secs),
            suspend_for: secs(env_or("SUSPEND_FOR_SECONDS", 2.0)).unwrap_or(Duration::ZERO),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn secs(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value)
        .ok()
        .filter(|d| !d.is_zero())
}

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rgb_timer_runner=info".parse()?)
                .add_directive("rgb_timer=info".parse()?),
        )
        .init();

    let config = RunnerConfig::from_env();
    info!("Starting timer runner: {:?}", config);

    let mut scheduler = Scheduler::with_config(
        SchedulerConfig::new().with_frames_per_tick(config.frames_per_tick),
        SystemClock::new(),
    );
    register_demo_timers(&mut scheduler)?;
    info!("Registered {} timer(s)", scheduler.len());

    // Set up command input channel
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

    // Spawn input thread
    thread::spawn(move || {
        input_thread(cmd_tx);
    });

    // Enable raw mode for keyboard input
    terminal::enable_raw_mode().ok();

    let target_delta = Duration::from_secs_f64(1.0 / config.target_fps);
    let started = Instant::now();
    let mut suspend_at = config.suspend_at;
    let mut resume_at: Option<Instant> = None;
    let mut frame: u64 = 0;
    let mut running = true;

    while running {
        let start = Instant::now();

        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                Command::Focus => {
                    let focused = scheduler.is_suspended();
                    info!("Focus {}", if focused { "gained" } else { "lost" });
                    scheduler.on_focus_changed(focused);
                }
                Command::List => {
                    info!(
                        "Frame {} | elapsed {:?} | {} timer(s) | suspended: {}",
                        frame,
                        scheduler.elapsed(),
                        scheduler.len(),
                        scheduler.is_suspended()
                    );
                }
                Command::Quit => {
                    info!("Shutting down...");
                    running = false;
                }
                Command::Help => {
                    info!("Keys: f = toggle focus, l = list, q = quit, h = help");
                }
            }
        }

        let run_time = started.elapsed();

        // Simulated focus loss
        if suspend_at.is_some_and(|at| run_time >= at) {
            suspend_at = None;
            info!("Simulating focus loss for {:?}", config.suspend_for);
            scheduler.on_focus_changed(false);
            resume_at = Some(Instant::now() + config.suspend_for);
        }
        if resume_at.is_some_and(|at| Instant::now() >= at) {
            resume_at = None;
            info!("Simulated focus regained");
            scheduler.on_focus_changed(true);
        }

        scheduler.update();
        frame += 1;

        if config.run_for.is_some_and(|limit| run_time >= limit) {
            info!("Run time elapsed after {} frame(s)", frame);
            running = false;
        }

        // Sleep to maintain target FPS
        let elapsed = start.elapsed();
        if elapsed < target_delta {
            std::thread::sleep(target_delta - elapsed);
        }
    }

    // Cleanup
    terminal::disable_raw_mode().ok();
    scheduler.clear();

    Ok(())
}

fn register_demo_timers(scheduler: &mut Scheduler) -> eyre::Result<()> {
    // Owner of the blink timer; released when the round completes.
    let round_owner = Rc::new(());
    let blink_target = Rc::downgrade(&round_owner);

    scheduler.register_interval(
        TimerBuilder::new(1.0)
            .countdown(10)
            .on_interval(|scheduler, id| {
                if let Some(Countdown::Remaining(left)) = scheduler.countdown(id) {
                    info!("Round: {} second(s) left", left);
                }
            })
            .on_complete(move |_, _| {
                drop(round_owner);
                info!("Round over");
            }),
    )?;

    scheduler.register_interval(
        TimerBuilder::new(0.5)
            .repeat_forever()
            .target(blink_target)
            .on_interval(|_, id| tracing::debug!("{} blink", id)),
    )?;

    scheduler.register_frame_interval(
        TimerBuilder::new(120.0)
            .repeat_forever()
            .on_interval(|scheduler, _| {
                info!(
                    "Heartbeat: {} timer(s), server time {:?}",
                    scheduler.len(),
                    scheduler.external_time()
                );
            }),
    )?;

    scheduler.register_interval(
        TimerBuilder::new(2.5).on_interval(|scheduler, _| {
            scheduler.set_external_time(Duration::from_secs(1_700_000_000));
            info!("Synced external time base");
        }),
    )?;

    Ok(())
}

fn input_thread(tx: mpsc::Sender<Command>) {
    loop {
        if !event::poll(Duration::from_millis(50)).unwrap_or(false) {
            continue;
        }
        let Ok(Event::Key(key)) = event::read() else {
            continue;
        };
        let Some(cmd) = command_for_key(key) else {
            continue;
        };
        if tx.send(cmd).is_err() || cmd == Command::Quit {
            break;
        }
    }
}

fn command_for_key(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return (key.code == KeyCode::Char('c')).then_some(Command::Quit);
    }
    match key.code {
        KeyCode::Char('f' | 'F') => Some(Command::Focus),
        KeyCode::Char('l' | 'L') => Some(Command::List),
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('h' | 'H' | '?') => Some(Command::Help),
        _ => None,
    }
}
