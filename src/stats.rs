//! Focus statistics: all-time totals, today's counters and the day streak.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerStats {
    pub total_focus_minutes: u32,
    pub total_sessions: u32,
    pub today_focus_minutes: u32,
    pub today_sessions: u32,
    /// Consecutive calendar days with at least one completed focus session.
    pub streak_days: u32,
    /// Date of the most recent completed focus session.
    pub last_active_date: Option<NaiveDate>,
}

impl TimerStats {
    /// Records one completed focus session of `minutes` on `today`.
    pub fn record_completed_focus_session(&mut self, minutes: u32, today: NaiveDate) {
        match self.last_active_date {
            Some(last) if last == today => {
                self.streak_days = self.streak_days.max(1);
            }
            Some(last) if last.succ_opt() == Some(today) => {
                self.reset_today();
                self.streak_days = self.streak_days.saturating_add(1);
            }
            _ => {
                self.reset_today();
                self.streak_days = 1;
            }
        }

        self.total_focus_minutes = self.total_focus_minutes.saturating_add(minutes);
        self.total_sessions = self.total_sessions.saturating_add(1);
        self.today_focus_minutes = self.today_focus_minutes.saturating_add(minutes);
        self.today_sessions = self.today_sessions.saturating_add(1);
        self.last_active_date = Some(today);
    }

    /// Brings the daily view up to date without recording anything.
    ///
    /// Today's counters drop to zero once the last active date is in the
    /// past; the streak drops to zero once a whole day has been missed.
    /// `last_active_date` is left alone so a later session still sees the
    /// real gap. Returns true if anything changed.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        let Some(last) = self.last_active_date else {
            return false;
        };

        let mut changed = false;
        if last != today && (self.today_focus_minutes != 0 || self.today_sessions != 0) {
            self.reset_today();
            changed = true;
        }

        let missed_a_day = today.pred_opt().is_some_and(|yesterday| last < yesterday);
        if missed_a_day && self.streak_days != 0 {
            self.streak_days = 0;
            changed = true;
        }

        changed
    }

    fn reset_today(&mut self) {
        self.today_focus_minutes = 0;
        self.today_sessions = 0;
    }
}
