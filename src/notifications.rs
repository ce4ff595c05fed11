//! System notifications for phase completions.

use crate::models::{Phase, TimerSettings};
use notify_rust::Notification;
use std::thread;
use tracing::warn;

/// Best-effort notification dispatch.
pub trait Notifier: Send {
    /// Asks for permission to show notifications. A refusal or failure is `false`.
    fn request_permission(&mut self) -> bool;
    fn is_permission_granted(&self) -> bool;
    /// Shows a notification. Does nothing without permission.
    fn show(&self, title: &str, body: &str);
}

/// Notifier backed by the desktop notification server.
#[derive(Debug, Default)]
pub struct DesktopNotifier {
    granted: bool,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for DesktopNotifier {
    // Desktop notification servers have no permission prompt.
    fn request_permission(&mut self) -> bool {
        self.granted = true;
        self.granted
    }

    fn is_permission_granted(&self) -> bool {
        self.granted
    }

    /// Runs in a background thread to avoid blocking.
    fn show(&self, title: &str, body: &str) {
        if !self.granted {
            return;
        }

        let title = title.to_string();
        let body = body.to_string();
        thread::spawn(move || {
            if let Err(e) = Notification::new()
                .summary(&title)
                .body(&body)
                .sound_name("default")
                .show()
            {
                warn!(error = %e, "failed to show notification");
            }
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
}

/// Builds the notification copy for a finished phase.
pub fn completion_message(
    completed: Phase,
    next: Phase,
    settings: &TimerSettings,
) -> NotificationMessage {
    let (title, body) = match (completed, next) {
        (Phase::Focus, Phase::LongBreak) => (
            "Long Break Time! 🌴".to_string(),
            format!(
                "You've earned a {} minute break. Great job staying focused!",
                settings.long_break_minutes
            ),
        ),
        (Phase::Focus, _) => (
            "Focus Complete! 🎉".to_string(),
            "Nice work! Time for a break.".to_string(),
        ),
        (Phase::ShortBreak | Phase::LongBreak, _) => (
            "Break Over! ⏰".to_string(),
            "Ready to focus again?".to_string(),
        ),
    };
    NotificationMessage { title, body }
}

/// Notifier that records what it was asked to do.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordingNotifier {
    pub grant: bool,
    granted: bool,
    pub requests: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    pub shown: std::sync::Arc<std::sync::Mutex<Vec<NotificationMessage>>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn new(grant: bool) -> Self {
        Self {
            grant,
            granted: false,
            requests: Default::default(),
            shown: Default::default(),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn shown(&self) -> Vec<NotificationMessage> {
        self.shown.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn request_permission(&mut self) -> bool {
        self.requests
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.granted = self.grant;
        self.granted
    }

    fn is_permission_granted(&self) -> bool {
        self.granted
    }

    fn show(&self, title: &str, body: &str) {
        if self.granted {
            self.shown.lock().unwrap().push(NotificationMessage {
                title: title.to_string(),
                body: body.to_string(),
            });
        }
    }
}
