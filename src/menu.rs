//! Menu building and updating for the tray dropdown.

use muda::accelerator::Accelerator;
use muda::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use pomotick::models::{TimerSettings, TimerState, TimerStatus};
use pomotick::stats::TimerStats;
use pomotick::timer::format_clock;
use std::collections::HashMap;
use thiserror::Error;

// Menu item IDs as constants
pub const ID_STATUS: &str = "status";
pub const ID_PROGRESS: &str = "progress";
pub const ID_TODAY: &str = "today";
pub const ID_TOTALS: &str = "totals";
pub const ID_START: &str = "start";
pub const ID_PAUSE: &str = "pause";
pub const ID_RESET: &str = "reset";
pub const ID_SKIP: &str = "skip";
pub const ID_SOUND_TOGGLE: &str = "sound_toggle";
pub const ID_NOTIF_TOGGLE: &str = "notif_toggle";
pub const ID_AUTO_BREAKS_TOGGLE: &str = "auto_breaks_toggle";
pub const ID_AUTO_FOCUS_TOGGLE: &str = "auto_focus_toggle";
pub const ID_RESET_STATS: &str = "reset_stats";
pub const ID_QUIT: &str = "quit";

pub const PREFIX_FOCUS: &str = "focus_";
pub const PREFIX_SHORT: &str = "short_";
pub const PREFIX_LONG: &str = "long_";
pub const PREFIX_THRESHOLD: &str = "thresh_";

const FOCUS_CHOICES: [u32; 7] = [15, 20, 25, 30, 45, 50, 60];
const SHORT_CHOICES: [u32; 4] = [3, 5, 10, 15];
const LONG_CHOICES: [u32; 4] = [10, 15, 20, 30];
const THRESHOLD_CHOICES: [u32; 5] = [2, 3, 4, 5, 6];

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Menu error: {0}")]
    Muda(#[from] muda::Error),
}

/// A submenu of mutually exclusive numeric choices.
pub struct ChoiceGroup {
    pub submenu: Submenu,
    pub checks: HashMap<u32, CheckMenuItem>,
}

impl ChoiceGroup {
    fn build(
        title: String,
        prefix: &str,
        choices: &[u32],
        unit: &str,
        current: u32,
    ) -> Result<Self, MenuError> {
        let submenu = Submenu::new(title, true);
        let mut checks = HashMap::new();
        for &value in choices {
            let item = CheckMenuItem::with_id(
                MenuId::new(format!("{}{}", prefix, value)),
                format!("{} {}", value, unit),
                true,
                value == current,
                None::<Accelerator>,
            );
            submenu.append(&item)?;
            checks.insert(value, item);
        }
        Ok(Self { submenu, checks })
    }

    fn select(&self, title: String, current: u32) {
        self.submenu.set_text(title);
        for (&value, check) in &self.checks {
            check.set_checked(value == current);
        }
    }
}

/// Holds references to menu items that need dynamic updates.
pub struct MenuItems {
    pub status: MenuItem,
    pub progress: MenuItem,
    pub today: MenuItem,
    pub totals: MenuItem,
    pub start: MenuItem,
    pub pause: MenuItem,
    pub reset: MenuItem,
    pub skip: MenuItem,
    pub focus: ChoiceGroup,
    pub short_break: ChoiceGroup,
    pub long_break: ChoiceGroup,
    pub threshold: ChoiceGroup,
    pub auto_breaks_toggle: CheckMenuItem,
    pub auto_focus_toggle: CheckMenuItem,
    pub sound_toggle: CheckMenuItem,
    pub notif_toggle: CheckMenuItem,
}

fn info_item(id: &str, text: String) -> MenuItem {
    MenuItem::with_id(MenuId::new(id), text, false, None::<Accelerator>)
}

fn toggle_item(id: &str, text: &str, checked: bool) -> CheckMenuItem {
    CheckMenuItem::with_id(MenuId::new(id), text, true, checked, None::<Accelerator>)
}

/// Builds the complete menu structure.
pub fn build_menu(state: &TimerState, stats: &TimerStats) -> Result<(Menu, MenuItems), MenuError> {
    let menu = Menu::new();
    let settings = &state.settings;

    let status = info_item(ID_STATUS, format_status(state));
    let progress = info_item(ID_PROGRESS, format_progress(state));
    menu.append(&status)?;
    menu.append(&progress)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let today = info_item(ID_TODAY, format_today(stats));
    let totals = info_item(ID_TOTALS, format_totals(stats));
    menu.append(&today)?;
    menu.append(&totals)?;

    menu.append(&PredefinedMenuItem::separator())?;

    // Control buttons
    let start = MenuItem::with_id(
        MenuId::new(ID_START),
        start_label(state),
        can_start(state),
        None::<Accelerator>,
    );
    let pause = MenuItem::with_id(
        MenuId::new(ID_PAUSE),
        "⏸  Pause",
        state.is_running(),
        None::<Accelerator>,
    );
    let reset = MenuItem::with_id(
        MenuId::new(ID_RESET),
        "⏹  Reset",
        can_reset(state),
        None::<Accelerator>,
    );
    let skip = MenuItem::with_id(MenuId::new(ID_SKIP), "⏭  Skip Phase", true, None::<Accelerator>);

    menu.append(&start)?;
    menu.append(&pause)?;
    menu.append(&reset)?;
    menu.append(&skip)?;

    menu.append(&PredefinedMenuItem::separator())?;

    // Settings submenu
    let settings_menu = Submenu::new("⚙  Settings", true);

    let focus = ChoiceGroup::build(
        focus_title(settings),
        PREFIX_FOCUS,
        &FOCUS_CHOICES,
        "min",
        settings.focus_minutes,
    )?;
    let short_break = ChoiceGroup::build(
        short_title(settings),
        PREFIX_SHORT,
        &SHORT_CHOICES,
        "min",
        settings.short_break_minutes,
    )?;
    let long_break = ChoiceGroup::build(
        long_title(settings),
        PREFIX_LONG,
        &LONG_CHOICES,
        "min",
        settings.long_break_minutes,
    )?;
    let threshold = ChoiceGroup::build(
        threshold_title(settings),
        PREFIX_THRESHOLD,
        &THRESHOLD_CHOICES,
        "sessions",
        settings.sessions_until_long_break,
    )?;
    settings_menu.append(&focus.submenu)?;
    settings_menu.append(&short_break.submenu)?;
    settings_menu.append(&long_break.submenu)?;
    settings_menu.append(&threshold.submenu)?;

    settings_menu.append(&PredefinedMenuItem::separator())?;

    let auto_breaks_toggle = toggle_item(
        ID_AUTO_BREAKS_TOGGLE,
        "Auto-start Breaks",
        settings.auto_start_breaks,
    );
    let auto_focus_toggle = toggle_item(
        ID_AUTO_FOCUS_TOGGLE,
        "Auto-start Focus",
        settings.auto_start_focus,
    );
    let sound_toggle = toggle_item(ID_SOUND_TOGGLE, "Sound Enabled", settings.sound_enabled);
    let notif_toggle = toggle_item(
        ID_NOTIF_TOGGLE,
        "Notifications Enabled",
        settings.notifications_enabled,
    );
    settings_menu.append(&auto_breaks_toggle)?;
    settings_menu.append(&auto_focus_toggle)?;
    settings_menu.append(&sound_toggle)?;
    settings_menu.append(&notif_toggle)?;

    settings_menu.append(&PredefinedMenuItem::separator())?;

    let reset_stats = MenuItem::with_id(
        MenuId::new(ID_RESET_STATS),
        "Reset Statistics",
        true,
        None::<Accelerator>,
    );
    settings_menu.append(&reset_stats)?;
    menu.append(&settings_menu)?;

    menu.append(&PredefinedMenuItem::separator())?;

    let quit = MenuItem::with_id(MenuId::new(ID_QUIT), "Quit Pomotick", true, None::<Accelerator>);
    menu.append(&quit)?;

    let items = MenuItems {
        status,
        progress,
        today,
        totals,
        start,
        pause,
        reset,
        skip,
        focus,
        short_break,
        long_break,
        threshold,
        auto_breaks_toggle,
        auto_focus_toggle,
        sound_toggle,
        notif_toggle,
    };

    Ok((menu, items))
}

/// Updates the menu items based on the current state.
pub fn update_menu_items(items: &MenuItems, state: &TimerState, stats: &TimerStats) {
    let settings = &state.settings;

    items.status.set_text(format_status(state));
    items.progress.set_text(format_progress(state));
    items.today.set_text(format_today(stats));
    items.totals.set_text(format_totals(stats));

    items.start.set_text(start_label(state));
    items.start.set_enabled(can_start(state));
    items.pause.set_enabled(state.is_running());
    items.reset.set_enabled(can_reset(state));

    items
        .focus
        .select(focus_title(settings), settings.focus_minutes);
    items
        .short_break
        .select(short_title(settings), settings.short_break_minutes);
    items
        .long_break
        .select(long_title(settings), settings.long_break_minutes);
    items
        .threshold
        .select(threshold_title(settings), settings.sessions_until_long_break);

    items
        .auto_breaks_toggle
        .set_checked(settings.auto_start_breaks);
    items.auto_focus_toggle.set_checked(settings.auto_start_focus);
    items.sound_toggle.set_checked(settings.sound_enabled);
    items.notif_toggle.set_checked(settings.notifications_enabled);
}

fn can_start(state: &TimerState) -> bool {
    state.is_idle() || state.is_paused()
}

fn can_reset(state: &TimerState) -> bool {
    !state.is_idle() || state.time_left_seconds != state.total_seconds
}

fn start_label(state: &TimerState) -> &'static str {
    if state.is_paused() {
        "▶  Resume"
    } else {
        "▶  Start"
    }
}

fn focus_title(settings: &TimerSettings) -> String {
    format!("Focus: {} min", settings.focus_minutes)
}

fn short_title(settings: &TimerSettings) -> String {
    format!("Short Break: {} min", settings.short_break_minutes)
}

fn long_title(settings: &TimerSettings) -> String {
    format!("Long Break: {} min", settings.long_break_minutes)
}

fn threshold_title(settings: &TimerSettings) -> String {
    format!(
        "Long Break After: {} sessions",
        settings.sessions_until_long_break
    )
}

/// Formats the status line for the menu.
pub fn format_status(state: &TimerState) -> String {
    let info = state.phase.info();
    let clock = format_clock(state.time_left_seconds);
    match state.status {
        TimerStatus::Running => format!("⏱  {} - {} remaining", info.label, clock),
        TimerStatus::Paused => format!("⏸  {} - {} (paused)", info.label, clock),
        TimerStatus::Idle | TimerStatus::Completed => format!(
            "{}  {} #{} - {} ready",
            info.emoji, info.label, state.current_session_number, clock
        ),
    }
}

/// Formats the progress bar for the menu.
pub fn format_progress(state: &TimerState) -> String {
    let pct = state.progress_percent().min(100);
    let filled = ((pct as f32 / 100.0) * 20.0).round() as usize;
    let empty = 20 - filled;
    format!("{}{}  {}%", "█".repeat(filled), "░".repeat(empty), pct)
}

/// Formats today's stats for the menu.
pub fn format_today(stats: &TimerStats) -> String {
    if stats.today_sessions == 0 {
        return "Today: —  0 (0 min)".to_string();
    }

    let tomatoes = "🍅".repeat(stats.today_sessions.min(10) as usize);
    let extra = if stats.today_sessions > 10 {
        format!("+{}", stats.today_sessions - 10)
    } else {
        String::new()
    };
    format!(
        "Today: {}{}  {} ({} min)",
        tomatoes, extra, stats.today_sessions, stats.today_focus_minutes
    )
}

/// Formats the all-time stats and streak for the menu.
pub fn format_totals(stats: &TimerStats) -> String {
    let streak = match stats.streak_days {
        0 => String::new(),
        1 => "  🔥 1 day".to_string(),
        days => format!("  🔥 {} days", days),
    };
    format!(
        "All time: {} sessions ({} min){}",
        stats.total_sessions, stats.total_focus_minutes, streak
    )
}
