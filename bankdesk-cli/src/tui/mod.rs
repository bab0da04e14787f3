//! Full-screen paginated user list (`bankdesk browse`)
//!
//! A thin view over [`bankdesk_core::ListController`]:
//! - `/` edits the search term; each keystroke is forwarded and the
//!   controller fetches once typing pauses
//! - `f` / `s` cycle the role and status filters, `+` / `-` the page size
//! - `←/→`, `Home/End` and typed page numbers navigate pages
//! - `a` toggles active/inactive, `d` deletes the selected user
//!
//! Logs go to a file while the view owns the terminal.

use std::path::PathBuf;

use bankdesk_core::DeskConfig;

pub mod app;
pub mod event;
pub mod terminal;
pub mod ui;

pub use terminal::run;

/// Log file used while the browse view is open
pub fn log_path() -> PathBuf {
    DeskConfig::config_dir().join("bankdesk.log")
}
