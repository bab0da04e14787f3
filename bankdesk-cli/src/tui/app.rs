//! Browse view state

use bankdesk_core::{ControllerState, ListQuery, ListSettings, SessionUser, UserRecord};

/// Input mode for the browse view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    /// Navigate rows and pages
    #[default]
    Normal,
    /// Search input active; each keystroke updates the search term
    Search,
    /// Waiting for y/n before deleting the user
    ConfirmDelete { id: i64, name: String },
}

/// Browse view state
///
/// The controller owns the query and the page; `list` is the last snapshot
/// taken from it and only read by the renderer.
#[derive(Debug)]
pub struct App {
    pub mode: Mode,
    pub settings: ListSettings,
    pub viewer: Option<SessionUser>,
    pub list: ControllerState<UserRecord>,
    /// Search input as typed
    pub search_input: String,
    /// Digits typed for a page jump
    pub page_input: String,
    pub selected_index: usize,
    pub status_message: Option<String>,
    pub show_help: bool,
}

impl App {
    pub fn new(settings: ListSettings, viewer: Option<SessionUser>) -> Self {
        let list = ControllerState::new(settings.initial_query());
        Self {
            mode: Mode::Normal,
            settings,
            viewer,
            list,
            search_input: String::new(),
            page_input: String::new(),
            selected_index: 0,
            status_message: None,
            show_help: false,
        }
    }

    pub fn query(&self) -> &ListQuery {
        self.list.query()
    }

    /// Adopt a fresh controller snapshot, keeping the selection on the page.
    pub fn sync(&mut self, list: ControllerState<UserRecord>) {
        self.list = list;
        let len = self.list.items().len();
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }

    pub fn selected_user(&self) -> Option<&UserRecord> {
        self.list.items().get(self.selected_index)
    }

    pub fn select_next(&mut self) {
        if self.selected_index + 1 < self.list.items().len() {
            self.selected_index += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    /// Whether the signed-in user may change other accounts.
    pub fn can_manage(&self) -> bool {
        // Without a cached user the server decides
        self.viewer.as_ref().map_or(true, SessionUser::can_manage_users)
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    pub fn enter_search(&mut self) {
        self.search_input = self.query().search.clone();
        self.mode = Mode::Search;
    }

    pub fn exit_mode(&mut self) {
        self.mode = Mode::Normal;
    }

    /// Parsed page-jump target, if any digits were typed.
    pub fn take_page_input(&mut self) -> Option<u32> {
        let target = self.page_input.parse().ok();
        self.page_input.clear();
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_stays_inside_the_page() {
        let mut app = App::new(ListSettings::default(), None);
        assert!(app.selected_user().is_none());

        app.selected_index = 4;
        app.sync(ControllerState::new(ListQuery::first_page(10)));
        assert_eq!(app.selected_index, 0);

        app.select_next();
        assert_eq!(app.selected_index, 0);
        app.select_prev();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn page_input_is_consumed() {
        let mut app = App::new(ListSettings::default(), None);
        app.page_input = "12".into();
        assert_eq!(app.take_page_input(), Some(12));
        assert_eq!(app.take_page_input(), None);
    }

    #[test]
    fn viewer_role_gates_management() {
        let staff = SessionUser {
            id: 3,
            name: "Teller".into(),
            email: "teller@abcbank.com".into(),
            role: "staff".into(),
        };
        assert!(!App::new(ListSettings::default(), Some(staff)).can_manage());
        assert!(App::new(ListSettings::default(), None).can_manage());
    }
}
