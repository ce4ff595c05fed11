//! Menu event handling.

use crate::menu::{
    ID_AUTO_BREAKS_TOGGLE, ID_AUTO_FOCUS_TOGGLE, ID_NOTIF_TOGGLE, ID_PAUSE, ID_QUIT, ID_RESET,
    ID_RESET_STATS, ID_SKIP, ID_SOUND_TOGGLE, ID_START, PREFIX_FOCUS, PREFIX_LONG, PREFIX_SHORT,
    PREFIX_THRESHOLD,
};
use muda::MenuEvent;
use pomotick::models::SettingsUpdate;
use pomotick::timer::TimerController;
use tracing::warn;

/// Result of handling a menu event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventResult {
    /// Event handled, nothing to redraw.
    Continue,
    /// User requested quit.
    Quit,
    /// State or settings changed, menu needs update.
    StateChanged,
}

/// What a menu item asks the timer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Start,
    Pause,
    Reset,
    Skip,
    SetFocusMinutes(u32),
    SetShortBreakMinutes(u32),
    SetLongBreakMinutes(u32),
    SetSessionsUntilLongBreak(u32),
    ToggleAutoStartBreaks,
    ToggleAutoStartFocus,
    ToggleSound,
    ToggleNotifications,
    ResetStatistics,
    Quit,
}

impl MenuAction {
    /// Maps a menu item ID to its action. Display-only items map to `None`.
    pub fn from_id(id: &str) -> Option<Self> {
        let action = match id {
            ID_START => Self::Start,
            ID_PAUSE => Self::Pause,
            ID_RESET => Self::Reset,
            ID_SKIP => Self::Skip,
            ID_AUTO_BREAKS_TOGGLE => Self::ToggleAutoStartBreaks,
            ID_AUTO_FOCUS_TOGGLE => Self::ToggleAutoStartFocus,
            ID_SOUND_TOGGLE => Self::ToggleSound,
            ID_NOTIF_TOGGLE => Self::ToggleNotifications,
            ID_RESET_STATS => Self::ResetStatistics,
            ID_QUIT => Self::Quit,
            _ => return parse_choice(id),
        };
        Some(action)
    }
}

fn parse_choice(id: &str) -> Option<MenuAction> {
    let choices: [(&str, fn(u32) -> MenuAction); 4] = [
        (PREFIX_FOCUS, MenuAction::SetFocusMinutes),
        (PREFIX_SHORT, MenuAction::SetShortBreakMinutes),
        (PREFIX_LONG, MenuAction::SetLongBreakMinutes),
        (PREFIX_THRESHOLD, MenuAction::SetSessionsUntilLongBreak),
    ];
    choices.into_iter().find_map(|(prefix, action)| {
        id.strip_prefix(prefix)
            .and_then(|value| value.parse().ok())
            .map(action)
    })
}

/// Handles a menu event and updates the timer accordingly.
pub fn handle_menu_event(controller: &mut TimerController, event: MenuEvent) -> EventResult {
    match MenuAction::from_id(event.id().as_ref()) {
        Some(action) => apply(controller, action),
        None => EventResult::Continue,
    }
}

/// Dispatches `action` as an intent on the timer.
pub fn apply(controller: &mut TimerController, action: MenuAction) -> EventResult {
    let settings = controller.settings();
    let update = match action {
        MenuAction::Start => {
            controller.start();
            return EventResult::StateChanged;
        }
        MenuAction::Pause => {
            controller.pause();
            return EventResult::StateChanged;
        }
        MenuAction::Reset => {
            controller.reset();
            return EventResult::StateChanged;
        }
        MenuAction::Skip => {
            controller.skip();
            return EventResult::StateChanged;
        }
        MenuAction::ResetStatistics => {
            controller.reset_statistics();
            return EventResult::StateChanged;
        }
        MenuAction::Quit => return EventResult::Quit,
        MenuAction::SetFocusMinutes(mins) => SettingsUpdate {
            focus_minutes: Some(mins),
            ..SettingsUpdate::default()
        },
        MenuAction::SetShortBreakMinutes(mins) => SettingsUpdate {
            short_break_minutes: Some(mins),
            ..SettingsUpdate::default()
        },
        MenuAction::SetLongBreakMinutes(mins) => SettingsUpdate {
            long_break_minutes: Some(mins),
            ..SettingsUpdate::default()
        },
        MenuAction::SetSessionsUntilLongBreak(count) => SettingsUpdate {
            sessions_until_long_break: Some(count),
            ..SettingsUpdate::default()
        },
        MenuAction::ToggleAutoStartBreaks => SettingsUpdate {
            auto_start_breaks: Some(!settings.auto_start_breaks),
            ..SettingsUpdate::default()
        },
        MenuAction::ToggleAutoStartFocus => SettingsUpdate {
            auto_start_focus: Some(!settings.auto_start_focus),
            ..SettingsUpdate::default()
        },
        MenuAction::ToggleSound => SettingsUpdate {
            sound_enabled: Some(!settings.sound_enabled),
            ..SettingsUpdate::default()
        },
        MenuAction::ToggleNotifications => SettingsUpdate {
            notifications_enabled: Some(!settings.notifications_enabled),
            ..SettingsUpdate::default()
        },
    };

    for error in controller.update_settings(update) {
        warn!(%error, "menu produced an invalid setting");
    }
    EventResult::StateChanged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomotick::engine::Engine;
    use pomotick::models::Phase;
    use pomotick::notifications::DesktopNotifier;
    use pomotick::persistence::MemoryStore;
    use std::sync::mpsc;

    fn create_controller() -> TimerController {
        let (tx, _rx) = mpsc::channel();
        let engine = Engine::load(MemoryStore::new(), DesktopNotifier::new());
        TimerController::new(engine, tx)
    }

    #[test]
    fn test_from_id_controls() {
        assert_eq!(MenuAction::from_id("start"), Some(MenuAction::Start));
        assert_eq!(MenuAction::from_id("skip"), Some(MenuAction::Skip));
        assert_eq!(MenuAction::from_id("quit"), Some(MenuAction::Quit));
        assert_eq!(MenuAction::from_id("status"), None);
    }

    #[test]
    fn test_from_id_choices() {
        assert_eq!(
            MenuAction::from_id("focus_45"),
            Some(MenuAction::SetFocusMinutes(45))
        );
        assert_eq!(
            MenuAction::from_id("short_10"),
            Some(MenuAction::SetShortBreakMinutes(10))
        );
        assert_eq!(
            MenuAction::from_id("long_20"),
            Some(MenuAction::SetLongBreakMinutes(20))
        );
        assert_eq!(
            MenuAction::from_id("thresh_3"),
            Some(MenuAction::SetSessionsUntilLongBreak(3))
        );
        assert_eq!(MenuAction::from_id("focus_abc"), None);
    }

    #[test]
    fn test_apply_duration_choice() {
        let mut controller = create_controller();
        let result = apply(&mut controller, MenuAction::SetFocusMinutes(45));

        assert_eq!(result, EventResult::StateChanged);
        let (state, _) = controller.snapshot();
        assert_eq!(state.settings.focus_minutes, 45);
        assert_eq!(state.time_left_seconds, 45 * 60);
    }

    #[test]
    fn test_apply_toggles_flip() {
        let mut controller = create_controller();
        apply(&mut controller, MenuAction::ToggleSound);
        apply(&mut controller, MenuAction::ToggleAutoStartBreaks);

        let settings = controller.settings();
        assert!(!settings.sound_enabled);
        assert!(settings.auto_start_breaks);

        apply(&mut controller, MenuAction::ToggleSound);
        assert!(controller.settings().sound_enabled);
    }

    #[test]
    fn test_apply_skip_and_quit() {
        let mut controller = create_controller();
        apply(&mut controller, MenuAction::Skip);
        assert_eq!(controller.snapshot().0.phase, Phase::ShortBreak);

        assert_eq!(apply(&mut controller, MenuAction::Quit), EventResult::Quit);
    }

    #[test]
    fn test_apply_start_pause() {
        let mut controller = create_controller();
        apply(&mut controller, MenuAction::Start);
        assert!(controller.snapshot().0.is_running());
        assert!(controller.is_ticking());

        apply(&mut controller, MenuAction::Pause);
        assert!(controller.snapshot().0.is_paused());
        assert!(!controller.is_ticking());
    }
}
