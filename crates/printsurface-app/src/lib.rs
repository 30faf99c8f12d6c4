//! Print Surface Application
//!
//! The control surface around a mounted stage: toolbar actions, keyboard
//! shortcuts, host callbacks and configuration.

mod config;
mod controls;
mod error;
mod host;
mod report;
mod shortcuts;

pub use config::{AppConfig, load_snapshot, load_spec};
pub use controls::{ActionOutcome, ControlAction, ControlPanel, Editor, SideTab};
pub use error::AppError;
pub use host::{DirectoryHost, EditorHost};
pub use report::format_report;
pub use shortcuts::{Shortcut, ShortcutRegistry};
