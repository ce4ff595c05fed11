//! Pomotick - a menubar pomodoro timer.
//!
//! The tray menu dispatches intents into the timer engine; a background
//! ticker drives the countdown while a phase is running.

use std::sync::mpsc::{self, Receiver};

use muda::MenuEvent;
use tracing::{info, warn};
use tray_icon::{TrayIcon, TrayIconBuilder};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use pomotick::engine::{CompletionEvent, Engine};
use pomotick::logging;
use pomotick::notifications::DesktopNotifier;
use pomotick::persistence::Database;
use pomotick::timer::{self, TimerController, TimerMessage};

mod audio;
mod event;
mod menu;

use audio::AudioPlayer;
use event::EventResult;
use menu::MenuItems;

/// Application handler for the winit event loop.
struct Pomotick {
    controller: TimerController,
    tray: Option<TrayIcon>,
    menu_items: Option<MenuItems>,
    timer_rx: Receiver<TimerMessage>,
    audio: Option<AudioPlayer>,
}

impl Pomotick {
    fn new(controller: TimerController, tray: TrayIcon, timer_rx: Receiver<TimerMessage>) -> Self {
        // Audio is created on the main thread to avoid Send issues
        let audio = match AudioPlayer::new() {
            Ok(audio) => Some(audio),
            Err(e) => {
                warn!(error = %e, "audio unavailable, chimes disabled");
                None
            }
        };

        Self {
            controller,
            tray: Some(tray),
            menu_items: None,
            timer_rx,
            audio,
        }
    }

    fn set_menu_items(&mut self, items: MenuItems) {
        self.menu_items = Some(items);
    }

    fn update_menu(&self) {
        if let Some(ref items) = self.menu_items {
            let (state, stats) = self.controller.snapshot();
            menu::update_menu_items(items, &state, &stats);
        }
    }

    fn update_tray_title(&self, title: &str) {
        if let Some(ref tray) = self.tray {
            tray.set_title(Some(title));
        }
    }

    fn refresh(&self) {
        let (state, _) = self.controller.snapshot();
        self.update_tray_title(&timer::format_title(&state));
        self.update_menu();
    }

    fn handle_completion(&self, event: CompletionEvent) {
        if !self.controller.settings().sound_enabled {
            return;
        }
        if let Some(ref audio) = self.audio {
            audio.play_chime(event.completed);
        }
    }

    fn process_timer_messages(&mut self) {
        while let Ok(msg) = self.timer_rx.try_recv() {
            match msg {
                TimerMessage::StateChanged { title } => {
                    self.update_tray_title(&title);
                    self.update_menu();
                }
                TimerMessage::Completed(event) => {
                    self.handle_completion(event);
                }
            }
        }
    }

    fn process_menu_events(&mut self, event_loop: &ActiveEventLoop) {
        if let Ok(event) = MenuEvent::receiver().try_recv() {
            match event::handle_menu_event(&mut self.controller, event) {
                EventResult::Quit => {
                    self.controller.shutdown();
                    event_loop.exit();
                }
                EventResult::StateChanged => self.refresh(),
                EventResult::Continue => {}
            }
        }
    }
}

impl ApplicationHandler for Pomotick {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        // Nothing to do on resume for a tray-only app
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
        // No window events for a tray-only app
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Poll);

        self.process_timer_messages();
        self.process_menu_events(event_loop);
    }
}

fn open_engine() -> Result<Engine, Box<dyn std::error::Error>> {
    let db = match Database::new() {
        Ok(db) => db,
        Err(e) => {
            warn!(error = %e, "could not open database, using in-memory storage");
            Database::new_in_memory()?
        }
    };
    Ok(Engine::load(db, DesktopNotifier::new()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let engine = open_engine()?;
    let (tx, rx) = mpsc::channel();
    let controller = TimerController::new(engine, tx);
    let (state, stats) = controller.snapshot();
    info!(phase = ?state.phase, session = state.current_session_number, "starting pomotick");

    // Create event loop (required for tray on macOS)
    let event_loop = EventLoop::new()?;

    let (built_menu, menu_items) = menu::build_menu(&state, &stats)?;

    // No icon image, just use title text on macOS
    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(built_menu))
        .with_title(timer::format_title(&state))
        .with_tooltip("Pomotick - Pomodoro Timer")
        .build()?;

    let mut app = Pomotick::new(controller, tray, rx);
    app.set_menu_items(menu_items);

    event_loop.run_app(&mut app)?;

    Ok(())
}
