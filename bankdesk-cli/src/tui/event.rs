//! Key handling for the browse view

use std::time::Duration;

use bankdesk_core::query::next_filter;
use bankdesk_core::{AccountStatus, ALL_FILTER};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Mode};

/// Poll for events with timeout
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// What the run loop should ask of the list controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleResult {
    Continue,
    Quit,
    /// New raw search input
    Search(String),
    /// Role filter key ("All" clears)
    SetRole(String),
    /// Status filter key ("All" clears)
    SetStatus(String),
    GoToPage(u32),
    NextPage,
    PrevPage,
    SetPageSize(u32),
    /// Flip active/inactive for a user
    SetAccountStatus { id: i64, status: AccountStatus },
    Delete { id: i64 },
    Refresh,
}

/// Handle a key event
pub fn handle_key(app: &mut App, key: KeyEvent) -> HandleResult {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char('c') | KeyCode::Char('q') = key.code {
            return HandleResult::Quit;
        }
    }

    if app.show_help {
        app.show_help = false;
        return HandleResult::Continue;
    }

    match app.mode.clone() {
        Mode::Normal => handle_normal_mode(app, key),
        Mode::Search => handle_search_mode(app, key),
        Mode::ConfirmDelete { id, name } => handle_confirm_delete(app, key, id, &name),
    }
}

fn filter_key(next: Option<String>) -> String {
    next.unwrap_or_else(|| ALL_FILTER.to_string())
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) -> HandleResult {
    match key.code {
        KeyCode::Char('q') => HandleResult::Quit,
        KeyCode::Esc => {
            app.page_input.clear();
            app.clear_status();
            HandleResult::Continue
        }
        KeyCode::Char('?') => {
            app.show_help = true;
            HandleResult::Continue
        }

        // Rows
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            HandleResult::Continue
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_prev();
            HandleResult::Continue
        }

        // Pages
        KeyCode::Char('l') | KeyCode::Right | KeyCode::PageDown => HandleResult::NextPage,
        KeyCode::Char('h') | KeyCode::Left | KeyCode::PageUp => HandleResult::PrevPage,
        KeyCode::Home | KeyCode::Char('g') => HandleResult::GoToPage(1),
        KeyCode::End | KeyCode::Char('G') => HandleResult::GoToPage(app.list.total_pages()),
        KeyCode::Char(c) if c.is_ascii_digit() => {
            if app.page_input.len() < 6 {
                app.page_input.push(c);
            }
            HandleResult::Continue
        }
        KeyCode::Enter => match app.take_page_input() {
            Some(page) => HandleResult::GoToPage(page),
            None => HandleResult::Continue,
        },

        // Query
        KeyCode::Char('/') => {
            app.enter_search();
            HandleResult::Continue
        }
        KeyCode::Char('f') => HandleResult::SetRole(filter_key(next_filter(
            &app.settings.filter_keys,
            app.query().filter.as_deref(),
        ))),
        KeyCode::Char('s') => HandleResult::SetStatus(filter_key(next_filter(
            &app.settings.status_keys,
            app.query().status.as_deref(),
        ))),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            HandleResult::SetPageSize(app.settings.next_page_size(app.query().page_size))
        }
        KeyCode::Char('-') => {
            HandleResult::SetPageSize(app.settings.prev_page_size(app.query().page_size))
        }
        KeyCode::Char('r') => HandleResult::Refresh,

        // Row actions
        KeyCode::Char('a') => {
            if !app.can_manage() {
                app.set_status("Only admins and managers can change accounts");
                return HandleResult::Continue;
            }
            let Some(user) = app.selected_user() else {
                return HandleResult::Continue;
            };
            match user.account_status() {
                Some(current) => HandleResult::SetAccountStatus {
                    id: user.id,
                    status: current.toggled(),
                },
                None => {
                    let msg = format!("Unknown status '{}' for user {}", user.status, user.id);
                    app.set_status(msg);
                    HandleResult::Continue
                }
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if !app.can_manage() {
                app.set_status("Only admins and managers can delete accounts");
                return HandleResult::Continue;
            }
            if let Some(user) = app.selected_user() {
                app.mode = Mode::ConfirmDelete {
                    id: user.id,
                    name: user.name.clone(),
                };
            }
            HandleResult::Continue
        }

        _ => HandleResult::Continue,
    }
}

/// Every edit is forwarded; the controller collapses them into one fetch.
fn handle_search_mode(app: &mut App, key: KeyEvent) -> HandleResult {
    match key.code {
        KeyCode::Esc | KeyCode::Enter => {
            app.exit_mode();
            HandleResult::Continue
        }
        KeyCode::Backspace => {
            if app.search_input.pop().is_some() {
                HandleResult::Search(app.search_input.clone())
            } else {
                HandleResult::Continue
            }
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
            HandleResult::Search(app.search_input.clone())
        }
        _ => HandleResult::Continue,
    }
}

fn handle_confirm_delete(app: &mut App, key: KeyEvent, id: i64, name: &str) -> HandleResult {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.exit_mode();
            app.set_status(format!("Deleting {}...", name));
            HandleResult::Delete { id }
        }
        _ => {
            app.exit_mode();
            app.set_status("Delete cancelled");
            HandleResult::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankdesk_core::{ListSettings, SessionUser};

    fn press(app: &mut App, code: KeyCode) -> HandleResult {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app() -> App {
        App::new(ListSettings::default(), None)
    }

    #[test]
    fn typing_forwards_every_keystroke() {
        let mut app = app();
        assert_eq!(press(&mut app, KeyCode::Char('/')), HandleResult::Continue);
        assert_eq!(app.mode, Mode::Search);

        assert_eq!(press(&mut app, KeyCode::Char('d')), HandleResult::Search("d".into()));
        assert_eq!(press(&mut app, KeyCode::Char('o')), HandleResult::Search("do".into()));
        assert_eq!(press(&mut app, KeyCode::Backspace), HandleResult::Search("d".into()));

        assert_eq!(press(&mut app, KeyCode::Enter), HandleResult::Continue);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn filters_cycle_back_to_all() {
        let mut app = app();
        assert_eq!(press(&mut app, KeyCode::Char('f')), HandleResult::SetRole("user".into()));
        assert_eq!(press(&mut app, KeyCode::Char('s')), HandleResult::SetStatus("active".into()));
    }

    #[test]
    fn page_keys() {
        let mut app = app();
        assert_eq!(press(&mut app, KeyCode::Right), HandleResult::NextPage);
        assert_eq!(press(&mut app, KeyCode::Left), HandleResult::PrevPage);
        assert_eq!(press(&mut app, KeyCode::Home), HandleResult::GoToPage(1));
        // Nothing loaded yet, so there is one page
        assert_eq!(press(&mut app, KeyCode::End), HandleResult::GoToPage(1));

        assert_eq!(press(&mut app, KeyCode::Char('1')), HandleResult::Continue);
        assert_eq!(press(&mut app, KeyCode::Char('2')), HandleResult::Continue);
        assert_eq!(press(&mut app, KeyCode::Enter), HandleResult::GoToPage(12));
        assert_eq!(press(&mut app, KeyCode::Enter), HandleResult::Continue);
    }

    #[test]
    fn page_size_keys_cycle_allowed_sizes() {
        let mut app = app();
        assert_eq!(press(&mut app, KeyCode::Char('+')), HandleResult::SetPageSize(5));
        assert_eq!(press(&mut app, KeyCode::Char('-')), HandleResult::SetPageSize(5));
    }

    #[test]
    fn row_actions_need_a_manager() {
        let staff = SessionUser {
            id: 9,
            name: "Teller".into(),
            email: "teller@abcbank.com".into(),
            role: "staff".into(),
        };
        let mut app = App::new(ListSettings::default(), Some(staff));
        assert_eq!(press(&mut app, KeyCode::Char('d')), HandleResult::Continue);
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.status_message.is_some());
    }

    #[test]
    fn delete_waits_for_confirmation() {
        let mut app = app();
        app.mode = Mode::ConfirmDelete {
            id: 7,
            name: "Jane".into(),
        };
        assert_eq!(press(&mut app, KeyCode::Char('n')), HandleResult::Continue);
        assert_eq!(app.mode, Mode::Normal);

        app.mode = Mode::ConfirmDelete {
            id: 7,
            name: "Jane".into(),
        };
        assert_eq!(press(&mut app, KeyCode::Char('y')), HandleResult::Delete { id: 7 });
    }

    #[test]
    fn ctrl_c_quits_from_any_mode() {
        let mut app = app();
        app.mode = Mode::Search;
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(&mut app, key), HandleResult::Quit);
    }
}
