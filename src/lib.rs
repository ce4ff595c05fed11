//! Pomotick - a pomodoro timer engine.
//!
//! The [`engine::Engine`] is a self-contained state machine (focus, short
//! break, long break) with persisted state, settings and statistics. The
//! [`timer::TimerController`] drives it with a cancelable one-second tick.

pub mod engine;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod persistence;
pub mod stats;
pub mod timer;
