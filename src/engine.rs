//! The pomodoro state machine and its side effects.
//!
//! ```text
//! Idle ──start──▶ Running ──pause──▶ Paused ──start──▶ Running
//!   ▲               │ tick reaches zero
//!   └── next phase ◀┘ (Running again when auto-start applies)
//! ```
//!
//! Reset and skip are accepted from any status and always land in `Idle`.
//! Every mutation is persisted through the [`Store`]; persistence failures
//! never block a transition.

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use crate::models::{Phase, SettingsError, SettingsUpdate, TimerSettings, TimerState, TimerStatus};
use crate::notifications::{completion_message, Notifier};
use crate::persistence::{load_record, save_record, Store, SETTINGS_KEY, STATE_KEY, STATS_KEY};
use crate::stats::TimerStats;
use crate::timer::next_phase;

/// Emitted when a phase counts down to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEvent {
    pub completed: Phase,
    pub next: Phase,
    /// Focus sessions completed so far, including this one.
    pub completed_sessions: u32,
    /// Whether the next phase started running on its own.
    pub auto_started: bool,
}

pub struct Engine {
    state: TimerState,
    stats: TimerStats,
    store: Box<dyn Store>,
    notifier: Box<dyn Notifier>,
    notification_permission: bool,
}

impl Engine {
    /// Restores the engine from `store`, falling back to defaults.
    ///
    /// A restored timer is always idle, whatever status it was saved with.
    pub fn load(store: impl Store + 'static, notifier: impl Notifier + 'static) -> Self {
        let store: Box<dyn Store> = Box::new(store);

        let mut stats: TimerStats = load_record(store.as_ref(), STATS_KEY).unwrap_or_default();
        stats.roll_over(today());
        let state = load_state(store.as_ref());
        debug!(phase = ?state.phase, time_left = state.time_left_seconds, "engine loaded");

        let mut engine = Self {
            state,
            stats,
            store,
            notifier: Box::new(notifier),
            notification_permission: false,
        };
        if engine.state.settings.notifications_enabled {
            engine.request_notification_permission();
        }
        engine
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.state.settings
    }

    pub fn stats(&self) -> &TimerStats {
        &self.stats
    }

    /// The permission answer cached from the last request.
    pub fn notification_permission(&self) -> bool {
        self.notification_permission
    }

    /// Idle or Paused → Running. Ignored otherwise.
    pub fn start_timer(&mut self) {
        match self.state.status {
            TimerStatus::Idle | TimerStatus::Paused => {
                self.set_status(TimerStatus::Running);
                self.persist_state();
            }
            TimerStatus::Running | TimerStatus::Completed => {
                debug!(status = ?self.state.status, "ignoring start");
            }
        }
    }

    /// Running → Paused. Ignored otherwise.
    pub fn pause_timer(&mut self) {
        if self.state.is_running() {
            self.set_status(TimerStatus::Paused);
            self.persist_state();
        } else {
            debug!(status = ?self.state.status, "ignoring pause");
        }
    }

    /// Returns to Idle with the full duration of the current phase.
    pub fn reset_timer(&mut self) {
        self.set_status(TimerStatus::Idle);
        self.state.rewind();
        self.persist_state();
    }

    /// Completes the current phase immediately and waits in Idle.
    ///
    /// Session counters advance as for a natural completion, but no
    /// notification is shown and no statistics are recorded.
    pub fn skip_phase(&mut self) {
        let skipped = self.state.phase;
        let next = self.state.advance();
        self.set_status(TimerStatus::Idle);
        info!(?skipped, ?next, "phase skipped");
        self.persist_state();
    }

    /// Advances the countdown by one second.
    ///
    /// Does nothing unless the timer is running. Returns the completion
    /// when the phase reaches zero.
    pub fn tick(&mut self) -> Option<CompletionEvent> {
        if !self.state.is_running() {
            return None;
        }

        if self.state.time_left_seconds > 1 {
            self.state.time_left_seconds -= 1;
            self.persist_state();
            return None;
        }

        self.state.time_left_seconds = 0;
        self.state.status = TimerStatus::Completed;
        Some(self.complete_phase())
    }

    fn complete_phase(&mut self) -> CompletionEvent {
        let completed = self.state.phase;
        let settings = self.state.settings.clone();
        let next = next_phase(completed, self.state.completed_sessions_count, &settings);

        self.notify_completion(completed, next);

        if completed == Phase::Focus {
            self.stats
                .record_completed_focus_session(settings.focus_minutes, today());
            self.persist_stats();
        }

        self.state.advance();

        let auto_start = if next == Phase::Focus {
            settings.auto_start_focus
        } else {
            settings.auto_start_breaks
        };
        let status = if auto_start {
            TimerStatus::Running
        } else {
            TimerStatus::Idle
        };
        self.set_status(status);
        self.persist_state();

        info!(
            ?completed,
            ?next,
            completed_sessions = self.state.completed_sessions_count,
            auto_start,
            "phase complete"
        );

        CompletionEvent {
            completed,
            next,
            completed_sessions: self.state.completed_sessions_count,
            auto_started: auto_start,
        }
    }

    /// Merges `update` into the settings and retimes the current phase.
    ///
    /// Invalid fields are dropped and returned; the rest of the update applies.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> Vec<SettingsError> {
        let was_enabled = self.state.settings.notifications_enabled;
        let (settings, rejected) = self.state.settings.merged(&update);
        for error in &rejected {
            warn!(%error, "rejected settings field");
        }

        self.state.apply_settings(settings);
        save_record(self.store.as_ref(), SETTINGS_KEY, &self.state.settings);
        self.persist_state();

        if !was_enabled && self.state.settings.notifications_enabled {
            self.request_notification_permission();
        }

        rejected
    }

    /// Zeroes all statistics.
    pub fn reset_statistics(&mut self) {
        self.stats = TimerStats::default();
        self.persist_stats();
        info!("statistics reset");
    }

    /// Clears today's counters once the date has changed.
    pub fn roll_over_day(&mut self) {
        if self.stats.roll_over(today()) {
            debug!("statistics rolled over to a new day");
            self.persist_stats();
        }
    }

    fn request_notification_permission(&mut self) {
        self.notification_permission = self.notifier.request_permission();
        if !self.notification_permission {
            warn!("notification permission not granted");
        }
    }

    fn notify_completion(&self, completed: Phase, next: Phase) {
        if !self.state.settings.notifications_enabled || !self.notification_permission {
            return;
        }
        let message = completion_message(completed, next, &self.state.settings);
        self.notifier.show(&message.title, &message.body);
    }

    fn set_status(&mut self, status: TimerStatus) {
        if self.state.status != status {
            debug!(from = ?self.state.status, to = ?status, "status change");
            self.state.status = status;
        }
    }

    fn persist_state(&self) {
        save_record(self.store.as_ref(), STATE_KEY, &self.state);
    }

    fn persist_stats(&self) {
        save_record(self.store.as_ref(), STATS_KEY, &self.stats);
    }
}

/// Restores the timer state. A valid `timer-settings` record wins over the
/// settings embedded in `timer-state`.
fn load_state(store: &dyn Store) -> TimerState {
    let settings = load_record::<TimerSettings>(store, SETTINGS_KEY)
        .filter(|settings| settings.validate().is_ok());

    if let Some(state) = load_record::<TimerState>(store, STATE_KEY) {
        if state.is_consistent() {
            let mut state = state.rehydrated();
            if let Some(settings) = settings.filter(|settings| *settings != state.settings) {
                debug!("settings record is newer than saved state, retiming");
                state.apply_settings(settings);
            }
            return state;
        }
        warn!("persisted timer state is inconsistent, starting fresh");
    }

    TimerState::new(settings.unwrap_or_default())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::RecordingNotifier;
    use crate::persistence::{DatabaseError, MemoryStore};
    use crate::timer::phase_duration_secs;

    fn create_test_engine() -> Engine {
        Engine::load(MemoryStore::new(), RecordingNotifier::new(true))
    }

    fn quiet_settings() -> SettingsUpdate {
        SettingsUpdate {
            focus_minutes: Some(1),
            ..SettingsUpdate::default()
        }
    }

    fn run_to_completion(engine: &mut Engine) -> Option<CompletionEvent> {
        for _ in 0..engine.state().time_left_seconds {
            if let Some(event) = engine.tick() {
                return Some(event);
            }
        }
        None
    }

    fn assert_clock_invariant(engine: &Engine) {
        let state = engine.state();
        assert!(state.time_left_seconds <= state.total_seconds);
        assert_eq!(
            state.total_seconds,
            phase_duration_secs(state.phase, &state.settings)
        );
    }

    struct FailingStore;

    impl Store for FailingStore {
        fn load(&self, _key: &str) -> Result<Option<String>, DatabaseError> {
            Err(DatabaseError::DirectoryCreation)
        }

        fn save(&self, _key: &str, _value: &str) -> Result<(), DatabaseError> {
            Err(DatabaseError::DirectoryCreation)
        }
    }

    /// Accepts every write except the timer state.
    struct StateWriteFailingStore(MemoryStore);

    impl Store for StateWriteFailingStore {
        fn load(&self, key: &str) -> Result<Option<String>, DatabaseError> {
            self.0.load(key)
        }

        fn save(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
            if key == STATE_KEY {
                return Err(DatabaseError::DirectoryCreation);
            }
            self.0.save(key, value)
        }
    }

    #[test]
    fn test_engine_initial_state() {
        let engine = create_test_engine();
        let state = engine.state();
        assert_eq!(state.phase, Phase::Focus);
        assert!(state.is_idle());
        assert_eq!(state.time_left_seconds, 1500);
        assert_eq!(state.current_session_number, 1);
        assert_eq!(state.completed_sessions_count, 0);
        assert_eq!(engine.stats(), &TimerStats::default());
    }

    #[test]
    fn test_start_and_tick() {
        let mut engine = create_test_engine();
        engine.start_timer();
        assert!(engine.state().is_running());

        engine.tick();
        assert_eq!(engine.state().time_left_seconds, 1499);
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let mut engine = create_test_engine();
        engine.start_timer();
        engine.tick();
        let before = engine.state().clone();

        engine.start_timer();
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn test_tick_ignored_unless_running() {
        let mut engine = create_test_engine();
        assert_eq!(engine.tick(), None);
        assert_eq!(engine.state().time_left_seconds, 1500);
    }

    #[test]
    fn test_pause_freezes_countdown() {
        let mut engine = create_test_engine();
        engine.start_timer();
        for _ in 0..10 {
            engine.tick();
        }

        engine.pause_timer();
        assert!(engine.state().is_paused());
        let paused_at = engine.state().time_left_seconds;

        for _ in 0..5 {
            assert_eq!(engine.tick(), None);
        }
        assert_eq!(engine.state().time_left_seconds, paused_at);

        engine.start_timer();
        engine.tick();
        assert_eq!(engine.state().time_left_seconds, paused_at - 1);
    }

    #[test]
    fn test_pause_only_from_running() {
        let mut engine = create_test_engine();
        engine.pause_timer();
        assert!(engine.state().is_idle());
    }

    #[test]
    fn test_reset_restores_phase_duration() {
        let mut engine = create_test_engine();
        engine.start_timer();
        for _ in 0..10 {
            engine.tick();
        }

        engine.reset_timer();

        assert!(engine.state().is_idle());
        assert_eq!(engine.state().time_left_seconds, 1500);
        assert_eq!(engine.state().phase, Phase::Focus);
        assert_eq!(engine.state().completed_sessions_count, 0);
    }

    #[test]
    fn test_focus_completes_into_short_break() {
        let mut engine = create_test_engine();
        engine.update_settings(quiet_settings());
        engine.start_timer();

        let mut completion = None;
        for _ in 0..60 {
            if let Some(event) = engine.tick() {
                completion = Some(event);
            }
        }

        let state = engine.state();
        assert_eq!(state.phase, Phase::ShortBreak);
        assert_eq!(state.time_left_seconds, 300);
        assert_eq!(state.completed_sessions_count, 1);
        assert!(state.is_idle());
        assert_eq!(
            completion,
            Some(CompletionEvent {
                completed: Phase::Focus,
                next: Phase::ShortBreak,
                completed_sessions: 1,
                auto_started: false,
            })
        );
    }

    #[test]
    fn test_auto_start_breaks_keeps_running() {
        let mut engine = create_test_engine();
        engine.update_settings(SettingsUpdate {
            auto_start_breaks: Some(true),
            ..quiet_settings()
        });
        engine.start_timer();
        for _ in 0..60 {
            engine.tick();
        }

        assert_eq!(engine.state().phase, Phase::ShortBreak);
        assert!(engine.state().is_running());

        engine.tick();
        assert_eq!(engine.state().time_left_seconds, 299);
    }

    #[test]
    fn test_auto_start_focus_after_break() {
        let mut engine = create_test_engine();
        engine.update_settings(SettingsUpdate {
            short_break_minutes: Some(1),
            auto_start_focus: Some(true),
            ..SettingsUpdate::default()
        });
        engine.skip_phase();
        engine.start_timer();

        let event = run_to_completion(&mut engine).unwrap();

        assert_eq!(event.completed, Phase::ShortBreak);
        assert!(event.auto_started);
        assert_eq!(engine.state().phase, Phase::Focus);
        assert_eq!(engine.state().current_session_number, 2);
        assert!(engine.state().is_running());
    }

    #[test]
    fn test_cycle_reaches_long_break() {
        let mut engine = create_test_engine();
        let mut breaks = Vec::new();

        for _ in 0..4 {
            engine.skip_phase();
            breaks.push(engine.state().phase);
            engine.skip_phase();
            assert_eq!(engine.state().phase, Phase::Focus);
        }

        assert_eq!(
            breaks,
            vec![
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::ShortBreak,
                Phase::LongBreak
            ]
        );
        assert_eq!(engine.state().completed_sessions_count, 4);
        assert_eq!(engine.state().current_session_number, 5);
    }

    #[test]
    fn test_skip_twice() {
        let mut engine = create_test_engine();

        engine.skip_phase();
        assert_eq!(engine.state().phase, Phase::ShortBreak);
        assert_eq!(engine.state().time_left_seconds, 300);
        assert_eq!(engine.state().completed_sessions_count, 1);
        assert!(engine.state().is_idle());

        engine.skip_phase();
        assert_eq!(engine.state().phase, Phase::Focus);
        assert_eq!(engine.state().time_left_seconds, 1500);
        assert_eq!(engine.state().current_session_number, 2);
    }

    #[test]
    fn test_skip_never_auto_starts_or_records_stats() {
        let notifier = RecordingNotifier::new(true);
        let mut engine = Engine::load(MemoryStore::new(), notifier.clone());
        engine.update_settings(SettingsUpdate {
            auto_start_breaks: Some(true),
            ..SettingsUpdate::default()
        });
        engine.start_timer();

        engine.skip_phase();

        assert!(engine.state().is_idle());
        assert_eq!(engine.stats().total_sessions, 0);
        assert!(notifier.shown().is_empty());
    }

    #[test]
    fn test_session_counters_only_move_on_focus() {
        let mut engine = create_test_engine();
        engine.update_settings(SettingsUpdate {
            short_break_minutes: Some(1),
            ..quiet_settings()
        });

        engine.start_timer();
        run_to_completion(&mut engine).unwrap();
        assert_eq!(engine.state().completed_sessions_count, 1);
        assert_eq!(engine.state().current_session_number, 1);

        engine.start_timer();
        run_to_completion(&mut engine).unwrap();
        assert_eq!(engine.state().completed_sessions_count, 1);
        assert_eq!(engine.state().current_session_number, 2);
        assert_clock_invariant(&engine);
    }

    #[test]
    fn test_focus_completion_records_stats() {
        let mut engine = create_test_engine();
        engine.update_settings(quiet_settings());
        engine.start_timer();
        run_to_completion(&mut engine).unwrap();

        let stats = engine.stats();
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.total_focus_minutes, 1);
        assert_eq!(stats.today_sessions, 1);
        assert_eq!(stats.today_focus_minutes, 1);
        assert_eq!(stats.streak_days, 1);
        assert_eq!(stats.last_active_date, Some(today()));
    }

    #[test]
    fn test_break_completion_does_not_record_stats() {
        let mut engine = create_test_engine();
        engine.update_settings(SettingsUpdate {
            short_break_minutes: Some(1),
            ..SettingsUpdate::default()
        });
        engine.skip_phase();
        engine.start_timer();
        run_to_completion(&mut engine).unwrap();

        assert_eq!(engine.stats().total_sessions, 0);
    }

    #[test]
    fn test_completion_notifications() {
        let notifier = RecordingNotifier::new(true);
        let mut engine = Engine::load(MemoryStore::new(), notifier.clone());
        engine.update_settings(SettingsUpdate {
            short_break_minutes: Some(1),
            ..quiet_settings()
        });

        engine.start_timer();
        run_to_completion(&mut engine).unwrap();
        engine.start_timer();
        run_to_completion(&mut engine).unwrap();

        let shown = notifier.shown();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].title, "Focus Complete! 🎉");
        assert_eq!(shown[1].title, "Break Over! ⏰");
    }

    #[test]
    fn test_no_notification_without_permission() {
        let notifier = RecordingNotifier::new(false);
        let mut engine = Engine::load(MemoryStore::new(), notifier.clone());
        engine.update_settings(quiet_settings());
        engine.start_timer();
        run_to_completion(&mut engine).unwrap();

        assert!(!engine.notification_permission());
        assert!(notifier.shown().is_empty());
    }

    #[test]
    fn test_no_notification_when_disabled() {
        let notifier = RecordingNotifier::new(true);
        let mut engine = Engine::load(MemoryStore::new(), notifier.clone());
        engine.update_settings(SettingsUpdate {
            notifications_enabled: Some(false),
            ..quiet_settings()
        });
        engine.start_timer();
        run_to_completion(&mut engine).unwrap();

        assert!(notifier.shown().is_empty());
    }

    #[test]
    fn test_permission_requested_when_enabled() {
        let notifier = RecordingNotifier::new(true);
        let mut engine = Engine::load(MemoryStore::new(), notifier.clone());
        assert_eq!(notifier.request_count(), 1);

        engine.update_settings(quiet_settings());
        assert_eq!(notifier.request_count(), 1);

        engine.update_settings(SettingsUpdate {
            notifications_enabled: Some(false),
            ..SettingsUpdate::default()
        });
        engine.update_settings(SettingsUpdate {
            notifications_enabled: Some(true),
            ..SettingsUpdate::default()
        });
        assert_eq!(notifier.request_count(), 2);
    }

    #[test]
    fn test_update_settings_while_idle() {
        let mut engine = create_test_engine();
        engine.update_settings(SettingsUpdate {
            focus_minutes: Some(30),
            ..SettingsUpdate::default()
        });

        assert_eq!(engine.state().time_left_seconds, 1800);
        assert_eq!(engine.state().total_seconds, 1800);
    }

    #[test]
    fn test_update_settings_while_running() {
        let mut engine = create_test_engine();
        engine.start_timer();
        engine.tick();

        engine.update_settings(SettingsUpdate {
            focus_minutes: Some(30),
            ..SettingsUpdate::default()
        });

        assert_eq!(engine.state().total_seconds, 1800);
        assert_eq!(engine.state().time_left_seconds, 1499);
        assert!(engine.state().is_running());
    }

    #[test]
    fn test_update_settings_rejects_zero() {
        let mut engine = create_test_engine();
        let rejected = engine.update_settings(SettingsUpdate {
            focus_minutes: Some(0),
            short_break_minutes: Some(10),
            ..SettingsUpdate::default()
        });

        assert_eq!(rejected.len(), 1);
        assert_eq!(engine.settings().focus_minutes, 25);
        assert_eq!(engine.settings().short_break_minutes, 10);
        assert_clock_invariant(&engine);
    }

    #[test]
    fn test_reset_statistics() {
        let mut engine = create_test_engine();
        engine.update_settings(quiet_settings());
        engine.start_timer();
        run_to_completion(&mut engine).unwrap();
        assert_eq!(engine.stats().total_sessions, 1);

        engine.reset_statistics();

        assert_eq!(engine.stats(), &TimerStats::default());
        assert_eq!(engine.state().completed_sessions_count, 1);
    }

    #[test]
    fn test_reload_forces_idle() {
        let store = MemoryStore::new();
        let mut engine = Engine::load(store.clone(), RecordingNotifier::new(true));
        engine.skip_phase();
        engine.start_timer();
        engine.tick();
        let saved = engine.state().clone();
        assert!(saved.is_running());

        let reloaded = Engine::load(store, RecordingNotifier::new(true));

        assert!(reloaded.state().is_idle());
        assert_eq!(
            reloaded.state(),
            &TimerState {
                status: TimerStatus::Idle,
                ..saved
            }
        );
    }

    #[test]
    fn test_reload_restores_stats() {
        let store = MemoryStore::new();
        let mut engine = Engine::load(store.clone(), RecordingNotifier::new(true));
        engine.update_settings(quiet_settings());
        engine.start_timer();
        run_to_completion(&mut engine).unwrap();

        let reloaded = Engine::load(store, RecordingNotifier::new(true));
        assert_eq!(reloaded.stats().total_sessions, 1);
        assert_eq!(reloaded.settings().focus_minutes, 1);
    }

    #[test]
    fn test_settings_record_used_without_state() {
        let store = MemoryStore::new();
        save_record(
            &store,
            SETTINGS_KEY,
            &TimerSettings {
                focus_minutes: 50,
                ..TimerSettings::default()
            },
        );

        let engine = Engine::load(store, RecordingNotifier::new(true));
        assert_eq!(engine.state().time_left_seconds, 3000);
    }

    #[test]
    fn test_settings_record_survives_failed_state_write() {
        let store = MemoryStore::new();
        let mut engine = Engine::load(store.clone(), RecordingNotifier::new(true));
        engine.skip_phase();
        engine.skip_phase();
        drop(engine);

        let mut engine = Engine::load(
            StateWriteFailingStore(store.clone()),
            RecordingNotifier::new(true),
        );
        engine.update_settings(SettingsUpdate {
            focus_minutes: Some(50),
            ..SettingsUpdate::default()
        });
        drop(engine);

        let reloaded = Engine::load(store, RecordingNotifier::new(true));
        let state = reloaded.state();
        assert_eq!(state.settings.focus_minutes, 50);
        assert_eq!(state.current_session_number, 2);
        assert_eq!(state.completed_sessions_count, 1);
        assert_eq!(state.time_left_seconds, 3000);
        assert_eq!(state.total_seconds, 3000);
        assert_clock_invariant(&reloaded);
    }

    #[test]
    fn test_load_rolls_stale_stats_over() {
        let store = MemoryStore::new();
        let three_days_ago = today() - chrono::Days::new(3);
        save_record(
            &store,
            STATS_KEY,
            &TimerStats {
                total_focus_minutes: 100,
                total_sessions: 4,
                today_focus_minutes: 50,
                today_sessions: 2,
                streak_days: 5,
                last_active_date: Some(three_days_ago),
            },
        );

        let engine = Engine::load(store, RecordingNotifier::new(true));
        let stats = engine.stats();
        assert_eq!(stats.today_focus_minutes, 0);
        assert_eq!(stats.today_sessions, 0);
        assert_eq!(stats.streak_days, 0);
        assert_eq!(stats.total_focus_minutes, 100);
        assert_eq!(stats.total_sessions, 4);
        assert_eq!(stats.last_active_date, Some(three_days_ago));
    }

    #[test]
    fn test_malformed_state_falls_back_to_defaults() {
        let store = MemoryStore::new();
        store.save(STATE_KEY, "[1, 2, 3]").unwrap();
        store.save(STATS_KEY, "oops").unwrap();

        let engine = Engine::load(store, RecordingNotifier::new(true));
        assert_eq!(engine.state(), &TimerState::default());
        assert_eq!(engine.stats(), &TimerStats::default());
    }

    #[test]
    fn test_inconsistent_state_falls_back_to_defaults() {
        let store = MemoryStore::new();
        let mut state = TimerState::default();
        state.time_left_seconds = 9999;
        save_record(&store, STATE_KEY, &state);

        let engine = Engine::load(store, RecordingNotifier::new(true));
        assert_eq!(engine.state(), &TimerState::default());
    }

    #[test]
    fn test_failing_store_does_not_block_transitions() {
        let mut engine = Engine::load(FailingStore, RecordingNotifier::new(true));
        engine.update_settings(quiet_settings());
        engine.start_timer();
        let event = run_to_completion(&mut engine).unwrap();

        assert_eq!(event.next, Phase::ShortBreak);
        assert_eq!(engine.stats().total_sessions, 1);
    }

    #[test]
    fn test_every_transition_keeps_clock_invariant() {
        let mut engine = create_test_engine();
        engine.update_settings(SettingsUpdate {
            short_break_minutes: Some(1),
            long_break_minutes: Some(2),
            sessions_until_long_break: Some(2),
            auto_start_breaks: Some(true),
            auto_start_focus: Some(true),
            ..quiet_settings()
        });
        engine.start_timer();

        for i in 0..1000 {
            engine.tick();
            assert_clock_invariant(&engine);
            if i % 97 == 0 {
                engine.update_settings(SettingsUpdate {
                    focus_minutes: Some(1 + i % 3),
                    ..SettingsUpdate::default()
                });
                assert_clock_invariant(&engine);
            }
        }
        assert!(engine.state().completed_sessions_count > 0);
    }
}
