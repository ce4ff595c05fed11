//! Phase timing helpers and the one-second tick loop.

use crate::engine::{CompletionEvent, Engine};
use crate::models::{
    Phase, SettingsError, SettingsUpdate, TimerSettings, TimerState, TimerStatus,
};
use crate::stats::TimerStats;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

pub const SECS_PER_MINUTE: u32 = 60;
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Duration of `phase` under `settings`, in seconds.
pub fn phase_duration_secs(phase: Phase, settings: &TimerSettings) -> u32 {
    let minutes = match phase {
        Phase::Focus => settings.focus_minutes,
        Phase::ShortBreak => settings.short_break_minutes,
        Phase::LongBreak => settings.long_break_minutes,
    };
    minutes.saturating_mul(SECS_PER_MINUTE)
}

/// The phase that follows `current`.
///
/// `completed_before` is the number of focus sessions completed before the
/// one that is finishing now.
pub fn next_phase(current: Phase, completed_before: u32, settings: &TimerSettings) -> Phase {
    match current {
        Phase::Focus => {
            let cycle = settings.sessions_until_long_break.max(1);
            if completed_before % cycle == cycle - 1 {
                Phase::LongBreak
            } else {
                Phase::ShortBreak
            }
        }
        Phase::ShortBreak | Phase::LongBreak => Phase::Focus,
    }
}

/// Formats time in MM:SS format. Minutes are not capped at 59.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Rounded percentage (0 to 100) of `total` already elapsed.
pub fn progress_percent(time_left: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let elapsed = total.saturating_sub(time_left);
    (f64::from(elapsed) / f64::from(total) * 100.0).round() as u32
}

/// Formats the one-line title shown while the timer is visible.
pub fn format_title(state: &TimerState) -> String {
    let emoji = state.phase.info().emoji;
    match state.status {
        TimerStatus::Running => format!("{} {}", emoji, format_clock(state.time_left_seconds)),
        TimerStatus::Paused => format!("⏸ {}", format_clock(state.time_left_seconds)),
        TimerStatus::Idle | TimerStatus::Completed => emoji.to_string(),
    }
}

/// Message sent from the timer thread to the main thread.
#[derive(Debug, Clone)]
pub enum TimerMessage {
    /// Timer state has changed, UI needs update.
    StateChanged { title: String },
    /// A phase completed, trigger sound.
    Completed(CompletionEvent),
}

fn lock(engine: &Mutex<Engine>) -> MutexGuard<'_, Engine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A background thread ticking the engine once per interval.
struct Ticker {
    cancel: Sender<()>,
    alive: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn spawn(engine: Arc<Mutex<Engine>>, tx: Sender<TimerMessage>, interval: Duration) -> Self {
        let (cancel, cancelled) = mpsc::channel();
        let alive = Arc::new(AtomicBool::new(true));
        let thread_alive = Arc::clone(&alive);
        let handle = thread::spawn(move || {
            run_timer_loop(&engine, &tx, &cancelled, &thread_alive, interval);
        });
        Self {
            cancel,
            alive,
            handle,
        }
    }

    /// Only meaningful while the engine lock is held: the loop flips this
    /// under the same lock when it decides to stop.
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Stops the thread and waits for it, so no tick can follow.
    fn cancel(self) {
        let _ = self.cancel.send(());
        if self.handle.join().is_err() {
            warn!("timer thread panicked");
        }
    }
}

/// Runs the timer loop, ticking once per interval until cancelled or until
/// the engine stops running. Sends messages to the main thread via `tx`.
fn run_timer_loop(
    engine: &Mutex<Engine>,
    tx: &Sender<TimerMessage>,
    cancelled: &Receiver<()>,
    alive: &AtomicBool,
    interval: Duration,
) {
    loop {
        match cancelled.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        let (title, completion, running) = {
            let mut engine = lock(engine);
            engine.roll_over_day();
            let completion = engine.tick();
            let running = engine.state().is_running();
            if !running {
                alive.store(false, Ordering::Release);
            }
            (format_title(engine.state()), completion, running)
        };

        if let Some(event) = completion {
            let _ = tx.send(TimerMessage::Completed(event));
        }
        let _ = tx.send(TimerMessage::StateChanged { title });

        if !running {
            debug!("timer stopped ticking");
            break;
        }
    }
}

/// Owns the engine and the single tick thread that drives it.
///
/// Every intent goes through the controller, which starts a ticker when the
/// engine enters `Running` and cancels it when it leaves. Dropping the
/// controller cancels any pending ticks.
pub struct TimerController {
    engine: Arc<Mutex<Engine>>,
    tx: Sender<TimerMessage>,
    interval: Duration,
    ticker: Option<Ticker>,
}

impl TimerController {
    pub fn new(engine: Engine, tx: Sender<TimerMessage>) -> Self {
        Self::with_interval(engine, tx, TICK_INTERVAL)
    }

    pub fn with_interval(engine: Engine, tx: Sender<TimerMessage>, interval: Duration) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            tx,
            interval,
            ticker: None,
        }
    }

    pub fn start(&mut self) {
        self.dispatch(Engine::start_timer);
    }

    pub fn pause(&mut self) {
        self.dispatch(Engine::pause_timer);
    }

    pub fn reset(&mut self) {
        self.dispatch(Engine::reset_timer);
    }

    pub fn skip(&mut self) {
        self.dispatch(Engine::skip_phase);
    }

    pub fn update_settings(&mut self, update: SettingsUpdate) -> Vec<SettingsError> {
        self.dispatch(|engine| engine.update_settings(update))
    }

    pub fn reset_statistics(&mut self) {
        self.dispatch(Engine::reset_statistics);
    }

    /// Copies of the current state and statistics.
    pub fn snapshot(&self) -> (TimerState, TimerStats) {
        let engine = lock(&self.engine);
        (engine.state().clone(), engine.stats().clone())
    }

    pub fn settings(&self) -> TimerSettings {
        lock(&self.engine).settings().clone()
    }

    /// Returns true if a tick thread is scheduled.
    pub fn is_ticking(&self) -> bool {
        let _engine = lock(&self.engine);
        self.ticker.as_ref().is_some_and(Ticker::is_alive)
    }

    /// Cancels the tick thread, if any.
    pub fn shutdown(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel();
        }
    }

    fn dispatch<R>(&mut self, intent: impl FnOnce(&mut Engine) -> R) -> R {
        let (result, running, ticking) = {
            let mut engine = lock(&self.engine);
            let result = intent(&mut *engine);
            let ticking = self.ticker.as_ref().is_some_and(Ticker::is_alive);
            (result, engine.state().is_running(), ticking)
        };

        match (running, ticking) {
            (true, true) => {}
            (true, false) => {
                self.shutdown();
                debug!("scheduling timer ticks");
                self.ticker = Some(Ticker::spawn(
                    Arc::clone(&self.engine),
                    self.tx.clone(),
                    self.interval,
                ));
            }
            (false, _) => self.shutdown(),
        }

        result
    }
}

impl Drop for TimerController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
