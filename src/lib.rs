//! Logs what happens on the desktop during a pomodoro session: keystrokes, clipboard copies and
//! active window changes. When the session ends the log is written to a timestamped file and
//! turned into a pre-filled link for an analysis service.
//!

pub mod cli;
pub mod collection;
pub mod events;
pub mod session;
pub mod utils;
pub mod window_api;
