//! UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use maqam_core::ViewerState;

use super::app::{ActiveScreen, App, InputMode};

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App) {
    // Create vertical layout for status bar at the bottom
    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    match app.active_screen {
        ActiveScreen::Reader => draw_reader(frame, app, outer_chunks[0]),
        ActiveScreen::Bookmarks => draw_bookmarks(frame, app, outer_chunks[0]),
    }

    draw_status_bar(frame, app, outer_chunks[1]);

    // Modal overlays
    match app.input_mode {
        InputMode::Editor => draw_editor_modal(frame, app),
        InputMode::ConfirmDelete => draw_confirm_modal(frame, app),
        InputMode::Normal => {}
    }

    // Draw help overlay if visible
    if app.show_help {
        draw_help_overlay(frame);
    }
}

/// Draw the reader screen
fn draw_reader(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.viewer.page_count() {
        Some(total) => format!(" Reader {}/{} ", app.viewer.current_page(), total),
        None => " Reader ".to_string(),
    };

    let indicator = if app.current_page_bookmarked {
        Span::styled(" ● maqam ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(" ○ ", Style::default().add_modifier(Modifier::DIM))
    };

    let block = Block::default()
        .title(title)
        .title_top(Line::from(indicator).right_aligned())
        .borders(Borders::ALL);

    let content: Vec<Line> = match app.viewer.state() {
        ViewerState::Loading => vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "Loading document ...",
                Style::default().add_modifier(Modifier::BOLD),
            )]),
        ],
        ViewerState::Error(message) => vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                format!("Error: {}", message),
                Style::default().fg(Color::Red),
            )]),
        ],
        ViewerState::Ready => match app.current_page_text() {
            Some(text) if !text.trim().is_empty() => {
                text.lines().map(|l| Line::from(l.to_string())).collect()
            }
            _ => vec![
                Line::from(""),
                Line::from(vec![Span::styled(
                    "(no extractable text on this page)",
                    Style::default().add_modifier(Modifier::DIM),
                )]),
            ],
        },
        ViewerState::Unmounted => vec![],
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Draw the bookmarks screen
fn draw_bookmarks(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Maqam ({}) ", app.bookmarks.len());
    let block = Block::default().title(title).borders(Borders::ALL);

    if app.bookmarks.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "No bookmarks yet",
                Style::default().add_modifier(Modifier::DIM),
            )]),
        ])
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .bookmarks
        .iter()
        .map(|bookmark| {
            let header = Line::from(vec![Span::styled(
                format!("Page {}", bookmark.page_number),
                Style::default().add_modifier(Modifier::BOLD),
            )]);

            let details = if bookmark.details.is_empty() {
                "(no details)".to_string()
            } else {
                bookmark.details.lines().next().unwrap_or("").to_string()
            };
            let details_line = Line::from(vec![Span::styled(
                details,
                Style::default().add_modifier(Modifier::DIM),
            )]);

            let date_line = Line::from(vec![Span::styled(
                bookmark.created_at.format("%Y-%m-%d").to_string(),
                Style::default().add_modifier(Modifier::DIM),
            )]);

            let mut lines = vec![header, details_line, date_line];

            // Contextual actions for the disclosed item
            if app.disclosed == Some(bookmark.id) {
                lines.push(Line::from(vec![
                    Span::styled("  [d] delete", Style::default().fg(Color::Red)),
                    Span::raw("   "),
                    Span::styled("[e] edit", Style::default().add_modifier(Modifier::DIM)),
                ]));
            }

            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED),
    );

    let mut state = ListState::default();
    state.select(Some(app.bookmark_index));

    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let content = if let Some(msg) = &app.status_message {
        msg.clone()
    } else {
        match app.active_screen {
            ActiveScreen::Reader => {
                "←/→:page  m:maqam  b:bookmarks  ?:help  q:quit".to_string()
            }
            ActiveScreen::Bookmarks => {
                "j/k:move  Space:actions  Enter:open  r:reader  ?:help  q:quit".to_string()
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Draw the bookmark editor modal
fn draw_editor_modal(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect(frame.area(), 50, 8);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!(" Maqam: page {} ", app.editor_page))
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    let content = vec![
        Line::from(""),
        Line::from(app.editor_buffer.as_str()),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Enter: save   Esc: cancel",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup_area);

    // Position cursor at end of buffer
    let cursor_x = popup_area.x + 1 + app.editor_buffer.chars().count() as u16;
    let cursor_y = popup_area.y + 2;
    if cursor_x < popup_area.x + popup_area.width.saturating_sub(1) {
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

/// Draw the delete confirmation modal
fn draw_confirm_modal(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect(frame.area(), 44, 5);
    frame.render_widget(Clear, popup_area);

    let page = app
        .confirm_target
        .and_then(|id| app.bookmarks.iter().find(|b| b.id == id))
        .map(|b| b.page_number);

    let question = match page {
        Some(page) => format!("Delete maqam for page {}?", page),
        None => "Delete maqam?".to_string(),
    };

    let block = Block::default()
        .title(" Confirm ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let content = vec![
        Line::from(question),
        Line::from(""),
        Line::from(vec![Span::styled(
            "y: delete   n/Esc: cancel",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    frame.render_widget(Paragraph::new(content).block(block), popup_area);
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame) {
    let popup_area = centered_rect(frame.area(), 48, 18);
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Reader:"),
        Line::from("  ←/→, h/l    Previous/next page"),
        Line::from("  m           Save a maqam for this page"),
        Line::from("  b, Tab      Open bookmark list"),
        Line::from(""),
        Line::from("Bookmarks:"),
        Line::from("  j/k, ↑/↓    Move up/down"),
        Line::from("  Space       Show/hide item actions"),
        Line::from("  Enter       Open page / collapse actions"),
        Line::from("  d           Delete (when actions shown)"),
        Line::from("  r, Tab      Back to reader"),
        Line::from(""),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    frame.render_widget(Paragraph::new(help_text).block(block), popup_area);
}

/// Calculate a centered popup area
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    Rect::new(popup_x, popup_y, popup_width, popup_height)
}
