//! Data models for the pomodoro engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timer::{next_phase, phase_duration_secs, progress_percent, SECS_PER_MINUTE};

/// Smallest accepted duration for any phase, in minutes.
pub const MIN_DURATION_MINUTES: u32 = 1;
/// Largest accepted duration for any phase, in minutes. Keeps the phase
/// length in seconds within `u32`.
pub const MAX_DURATION_MINUTES: u32 = u32::MAX / SECS_PER_MINUTE;
/// Smallest accepted number of focus sessions per long-break cycle.
pub const MIN_SESSIONS_UNTIL_LONG_BREAK: u32 = 1;

/// The kind of interval currently counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Focus,
    ShortBreak,
    LongBreak,
}

/// Display metadata for a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseInfo {
    pub label: &'static str,
    pub emoji: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

impl Phase {
    pub fn info(self) -> PhaseInfo {
        match self {
            Self::Focus => PhaseInfo {
                label: "Focus",
                emoji: "🍅",
                color: "red",
                description: "Time to concentrate on your work",
            },
            Self::ShortBreak => PhaseInfo {
                label: "Short Break",
                emoji: "☕",
                color: "green",
                description: "Take a quick breather",
            },
            Self::LongBreak => PhaseInfo {
                label: "Long Break",
                emoji: "🌴",
                color: "blue",
                description: "Take a proper rest",
            },
        }
    }

    pub fn is_break(self) -> bool {
        matches!(self, Self::ShortBreak | Self::LongBreak)
    }
}

/// Whether and how the countdown is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
    /// Transient: set for the instant a phase reaches zero, before the
    /// transition into the next phase is resolved.
    Completed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        field: &'static str,
        min: u32,
        value: u32,
    },
    #[error("{field} must be at most {max}, got {value}")]
    AboveMaximum {
        field: &'static str,
        max: u32,
        value: u32,
    },
}

/// Accepts `value` for `field` if it lies within `min..=max`.
fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<u32, SettingsError> {
    if value < min {
        Err(SettingsError::BelowMinimum { field, min, value })
    } else if value > max {
        Err(SettingsError::AboveMaximum { field, max, value })
    } else {
        Ok(value)
    }
}

/// User-configurable settings for the pomodoro timer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerSettings {
    /// Duration of a focus session in minutes.
    pub focus_minutes: u32,
    /// Duration of a short break in minutes.
    pub short_break_minutes: u32,
    /// Duration of a long break in minutes.
    pub long_break_minutes: u32,
    /// Number of focus sessions per long-break cycle.
    pub sessions_until_long_break: u32,
    /// Start breaks automatically when a focus session ends.
    pub auto_start_breaks: bool,
    /// Start focus sessions automatically when a break ends.
    pub auto_start_focus: bool,
    /// Whether to show system notifications.
    pub notifications_enabled: bool,
    /// Whether to play sounds on phase completion.
    pub sound_enabled: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            sessions_until_long_break: 4,
            auto_start_breaks: false,
            auto_start_focus: false,
            notifications_enabled: true,
            sound_enabled: true,
        }
    }
}

/// A partial settings edit. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub focus_minutes: Option<u32>,
    pub short_break_minutes: Option<u32>,
    pub long_break_minutes: Option<u32>,
    pub sessions_until_long_break: Option<u32>,
    pub auto_start_breaks: Option<bool>,
    pub auto_start_focus: Option<bool>,
    pub notifications_enabled: Option<bool>,
    pub sound_enabled: Option<bool>,
}

impl TimerSettings {
    /// Checks every numeric field against its range, reporting the first violation.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_range("focusMinutes", self.focus_minutes, MIN_DURATION_MINUTES, MAX_DURATION_MINUTES)?;
        check_range(
            "shortBreakMinutes",
            self.short_break_minutes,
            MIN_DURATION_MINUTES,
            MAX_DURATION_MINUTES,
        )?;
        check_range(
            "longBreakMinutes",
            self.long_break_minutes,
            MIN_DURATION_MINUTES,
            MAX_DURATION_MINUTES,
        )?;
        check_range(
            "sessionsUntilLongBreak",
            self.sessions_until_long_break,
            MIN_SESSIONS_UNTIL_LONG_BREAK,
            u32::MAX,
        )?;
        Ok(())
    }

    /// Returns these settings with `update` merged in.
    ///
    /// Out-of-range fields are rejected individually: the previous value is
    /// kept and the rejection is reported, while the remaining fields of the
    /// same update still apply.
    pub fn merged(&self, update: &SettingsUpdate) -> (TimerSettings, Vec<SettingsError>) {
        let mut next = self.clone();
        let mut rejected = Vec::new();

        apply_in_range(
            &mut next.focus_minutes,
            update.focus_minutes,
            "focusMinutes",
            (MIN_DURATION_MINUTES, MAX_DURATION_MINUTES),
            &mut rejected,
        );
        apply_in_range(
            &mut next.short_break_minutes,
            update.short_break_minutes,
            "shortBreakMinutes",
            (MIN_DURATION_MINUTES, MAX_DURATION_MINUTES),
            &mut rejected,
        );
        apply_in_range(
            &mut next.long_break_minutes,
            update.long_break_minutes,
            "longBreakMinutes",
            (MIN_DURATION_MINUTES, MAX_DURATION_MINUTES),
            &mut rejected,
        );
        apply_in_range(
            &mut next.sessions_until_long_break,
            update.sessions_until_long_break,
            "sessionsUntilLongBreak",
            (MIN_SESSIONS_UNTIL_LONG_BREAK, u32::MAX),
            &mut rejected,
        );

        if let Some(value) = update.auto_start_breaks {
            next.auto_start_breaks = value;
        }
        if let Some(value) = update.auto_start_focus {
            next.auto_start_focus = value;
        }
        if let Some(value) = update.notifications_enabled {
            next.notifications_enabled = value;
        }
        if let Some(value) = update.sound_enabled {
            next.sound_enabled = value;
        }

        (next, rejected)
    }
}

fn apply_in_range(
    target: &mut u32,
    value: Option<u32>,
    field: &'static str,
    (min, max): (u32, u32),
    rejected: &mut Vec<SettingsError>,
) {
    if let Some(value) = value {
        match check_range(field, value, min, max) {
            Ok(value) => *target = value,
            Err(error) => rejected.push(error),
        }
    }
}

/// The timer's full state: phase, status, countdown and session bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub phase: Phase,
    pub status: TimerStatus,
    pub time_left_seconds: u32,
    pub total_seconds: u32,
    /// Counts focus entries, starting at 1.
    pub current_session_number: u32,
    /// Counts focus completions, including skipped ones.
    pub completed_sessions_count: u32,
    pub settings: TimerSettings,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(TimerSettings::default())
    }
}

impl TimerState {
    /// Creates an idle state at the start of the first focus session.
    pub fn new(settings: TimerSettings) -> Self {
        let total = phase_duration_secs(Phase::Focus, &settings);
        Self {
            phase: Phase::Focus,
            status: TimerStatus::Idle,
            time_left_seconds: total,
            total_seconds: total,
            current_session_number: 1,
            completed_sessions_count: 0,
            settings,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == TimerStatus::Idle
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn is_paused(&self) -> bool {
        self.status == TimerStatus::Paused
    }

    pub fn is_completed(&self) -> bool {
        self.status == TimerStatus::Completed
    }

    /// Rounded percentage (0 to 100) of the current phase already elapsed.
    pub fn progress_percent(&self) -> u32 {
        progress_percent(self.time_left_seconds, self.total_seconds)
    }

    /// Returns true if the state could have been produced by the engine.
    pub fn is_consistent(&self) -> bool {
        self.settings.validate().is_ok()
            && self.total_seconds > 0
            && self.time_left_seconds <= self.total_seconds
            && self.current_session_number >= 1
    }

    /// Returns a copy suitable for resuming after a reload: never ticking.
    pub fn rehydrated(mut self) -> Self {
        self.status = TimerStatus::Idle;
        self
    }

    /// Sets the countdown back to the full duration of the current phase.
    pub fn rewind(&mut self) {
        let total = phase_duration_secs(self.phase, &self.settings);
        self.total_seconds = total;
        self.time_left_seconds = total;
    }

    /// Completes the current phase and moves to the next one, returning it.
    ///
    /// Updates the session counters and the countdown but leaves `status`
    /// to the caller.
    pub fn advance(&mut self) -> Phase {
        let completed = self.phase;
        let next = next_phase(completed, self.completed_sessions_count, &self.settings);

        if completed == Phase::Focus {
            self.completed_sessions_count = self.completed_sessions_count.saturating_add(1);
        }
        if next == Phase::Focus {
            self.current_session_number = self.current_session_number.saturating_add(1);
        }

        self.phase = next;
        self.rewind();
        next
    }

    /// Replaces the settings and retimes the current phase.
    ///
    /// An idle timer picks up the new duration immediately. A running or
    /// paused countdown keeps its remaining time, only clamped so it never
    /// exceeds the new total.
    pub fn apply_settings(&mut self, settings: TimerSettings) {
        self.settings = settings;
        let total = phase_duration_secs(self.phase, &self.settings);
        self.total_seconds = total;
        if self.is_idle() {
            self.time_left_seconds = total;
        } else {
            self.time_left_seconds = self.time_left_seconds.min(total);
        }
    }
}
