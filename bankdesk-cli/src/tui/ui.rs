//! UI rendering using ratatui

use bankdesk_core::{page_window, ListStatus, PageLink};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use super::app::{App, Mode};

/// Primary accent color
const ACCENT: Color = Color::Cyan;
/// Secondary color for less important elements
const SECONDARY: Color = Color::DarkGray;
/// Highlight color for selected items
const HIGHLIGHT: Color = Color::Yellow;
const SUCCESS: Color = Color::Green;
const DANGER: Color = Color::Red;
/// Dim text color
const DIM: Color = Color::Rgb(100, 100, 100);

const HELP_TEXT: &str = "\
j/k, ↑/↓     select row
←/→, h/l     previous / next page
Home/End     first / last page
<digits> ⏎   go to page
/            search name or email
f            cycle role filter
s            cycle status filter
+ / -        change page size
a            activate / deactivate selected user
d            delete selected user
r            reload
q            quit";

/// Render the entire UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query header
            Constraint::Min(5),    // Rows
            Constraint::Length(1), // Pagination bar
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_table(frame, app, chunks[1]);
    render_pagination(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    if let Mode::ConfirmDelete { name, .. } = &app.mode {
        render_confirm(frame, name);
    }
    if app.show_help {
        render_help_overlay(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let query = app.query();
    let searching = app.mode == Mode::Search;

    let search = if searching {
        format!("{}|", app.search_input)
    } else if query.search.is_empty() {
        "-".to_string()
    } else {
        query.search.clone()
    };

    let line = Line::from(vec![
        Span::styled("Search: ", Style::default().fg(SECONDARY)),
        Span::styled(
            search,
            if searching {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default().fg(Color::White)
            },
        ),
        Span::styled("   Role: ", Style::default().fg(SECONDARY)),
        Span::styled(query.filter_label().to_string(), Style::default().fg(HIGHLIGHT)),
        Span::styled("   Status: ", Style::default().fg(SECONDARY)),
        Span::styled(query.status_label().to_string(), Style::default().fg(HIGHLIGHT)),
        Span::styled("   Per page: ", Style::default().fg(SECONDARY)),
        Span::styled(query.page_size.to_string(), Style::default().fg(HIGHLIGHT)),
    ]);

    let title = match &app.viewer {
        Some(user) => format!(" Users · {} ({}) ", user.name, user.role),
        None => " Users ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(SECONDARY));

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    let items = app.list.items();
    if items.is_empty() {
        let placeholder = match app.list.status() {
            ListStatus::Idle | ListStatus::Loading => "  Loading...",
            ListStatus::Failed(_) => "  Could not load users",
            ListStatus::Loaded => "  No users found",
        };
        frame.render_widget(
            Paragraph::new(Span::styled(placeholder, Style::default().fg(DIM))).block(block),
            area,
        );
        return;
    }

    let header = Row::new(["ID", "Name", "Email", "Role", "Department", "Status", "Last login"])
        .style(Style::default().fg(SECONDARY).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = items
        .iter()
        .enumerate()
        .map(|(idx, user)| {
            let style = if idx == app.selected_index {
                Style::default()
                    .fg(Color::Black)
                    .bg(ACCENT)
                    .add_modifier(Modifier::BOLD)
            } else if user.is_active() {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(DIM)
            };
            Row::new([
                user.id.to_string(),
                user.name.clone(),
                user.email.clone(),
                user.role.clone(),
                user.department.clone(),
                user.status.clone(),
                user.last_login.clone(),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Percentage(20),
        Constraint::Percentage(28),
        Constraint::Length(8),
        Constraint::Percentage(14),
        Constraint::Length(9),
        Constraint::Min(10),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

/// Page buttons, item range and loading marker
fn pagination_line(app: &App) -> Line<'static> {
    let page = app.query().page;
    let total_pages = app.list.total_pages();
    let mut spans = Vec::new();

    let arrow = |enabled: bool, text: &'static str| {
        Span::styled(
            text,
            Style::default().fg(if enabled { Color::White } else { SECONDARY }),
        )
    };
    spans.push(arrow(page > 1, " ‹ "));
    for link in page_window(page, total_pages) {
        spans.push(match link {
            PageLink::Page(p) if p == page => Span::styled(
                format!(" {} ", p),
                Style::default()
                    .fg(Color::Black)
                    .bg(ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
            PageLink::Page(p) => Span::styled(format!(" {} ", p), Style::default().fg(Color::White)),
            PageLink::Ellipsis => Span::styled(" … ", Style::default().fg(DIM)),
        });
    }
    spans.push(arrow(page < total_pages, " › "));

    if let Some(range) = app.list.item_range() {
        spans.push(Span::styled(format!("  {}", range), Style::default().fg(DIM)));
    }
    if !app.page_input.is_empty() {
        spans.push(Span::styled(
            format!("  go to page {}⏎", app.page_input),
            Style::default().fg(HIGHLIGHT),
        ));
    }
    if app.list.status().is_loading() {
        spans.push(Span::styled("  loading…", Style::default().fg(HIGHLIGHT)));
    }

    Line::from(spans)
}

fn render_pagination(frame: &mut Frame, app: &App, area: Rect) {
    frame.render_widget(Paragraph::new(pagination_line(app)), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode_indicator = match app.mode {
        Mode::Normal => Span::styled(" NORMAL ", Style::default().bg(ACCENT).fg(Color::Black)),
        Mode::Search => {
            Span::styled(" SEARCH ", Style::default().bg(Color::Magenta).fg(Color::Black))
        }
        Mode::ConfirmDelete { .. } => {
            Span::styled(" CONFIRM ", Style::default().bg(DANGER).fg(Color::Black))
        }
    };

    let help_text = match app.mode {
        Mode::Normal => "j/k:row  ←/→:page  /:search  f/s:filter  +/-:size  a:toggle  d:delete  ?:help  q:quit",
        Mode::Search => "Type to search  Enter/Esc:done",
        Mode::ConfirmDelete { .. } => "y:delete  any other key:cancel",
    };

    let (status, color) = match (&app.status_message, app.list.last_error()) {
        (Some(msg), _) => (msg.clone(), HIGHLIGHT),
        (None, Some(err)) => (err.to_string(), DANGER),
        (None, None) => (String::new(), SUCCESS),
    };

    let line = Line::from(vec![
        mode_indicator,
        Span::raw(" "),
        Span::styled(help_text, Style::default().fg(DIM)),
        Span::raw(" "),
        Span::styled(status, Style::default().fg(color)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height);
    Rect {
        x: (area.width.saturating_sub(width)) / 2,
        y: (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

fn render_confirm(frame: &mut Frame, name: &str) {
    let popup_area = centered(frame.area(), 50, 5);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Delete user ")
        .title_style(Style::default().fg(DANGER).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DANGER));

    let paragraph = Paragraph::new(format!("Delete {}? This cannot be undone.\n\ny / n", name))
        .block(block)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, popup_area);
}

fn render_help_overlay(frame: &mut Frame) {
    let height = HELP_TEXT.lines().count() as u16 + 2;
    let popup_area = centered(frame.area(), 60, height);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Help (press any key to close) ")
        .title_style(Style::default().fg(SUCCESS).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(SUCCESS));

    let paragraph = Paragraph::new(HELP_TEXT)
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankdesk_core::ListSettings;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn first_frame_shows_loading() {
        let app = App::new(ListSettings::default(), None);
        let text = screen(&app);
        assert!(text.contains("Users"));
        assert!(text.contains("Loading..."));
        assert!(text.contains("Role: All"));
    }

    #[test]
    fn pagination_line_marks_disabled_arrows() {
        let app = App::new(ListSettings::default(), None);
        let line = pagination_line(&app);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, " ‹  1  › ");
    }

    #[test]
    fn delete_prompt_names_the_user() {
        let mut app = App::new(ListSettings::default(), None);
        app.mode = Mode::ConfirmDelete {
            id: 4,
            name: "Jane Doe".into(),
        };
        assert!(screen(&app).contains("Delete Jane Doe?"));
    }
}
