//! TUI rendering logic for the movie browser.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use super::state::{BrowserState, DetailTarget, View};
use crate::format;

/// Draws the current screen.
pub fn draw(frame: &mut Frame, state: &BrowserState) {
    match &state.view {
        View::Search => draw_search(frame, state),
        View::Detail(target) => draw_detail(frame, state, target),
    }
}

/// Draws the query input, result list, status line and key hints.
#[allow(clippy::indexing_slicing)]
fn draw_search(frame: &mut Frame, state: &BrowserState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // query
            Constraint::Min(5),    // results
            Constraint::Length(1), // status
            Constraint::Length(3), // footer
        ])
        .split(frame.area());

    let input = Paragraph::new(state.query.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title(" Search movies "));
    frame.render_widget(input, chunks[0]);

    draw_results(frame, chunks[1], state);
    draw_status(frame, chunks[2], state.search_status());
    draw_footer(
        frame,
        chunks[3],
        "Type to search  \u{2191}\u{2193}: move  Enter: details  Ctrl-R: refetch  Ctrl-L: reset  Esc: quit",
    );
}

/// Draws the result list.
fn draw_results(frame: &mut Frame, area: Rect, state: &BrowserState) {
    let items: Vec<ListItem> = state
        .movies()
        .iter()
        .enumerate()
        .map(|(i, movie)| {
            let (marker, style) = if i == state.cursor {
                (
                    "\u{25b8} ",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ("  ", Style::default())
            };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::styled(format::summary_line(movie), style),
            ]))
        })
        .collect();

    let title = if state.settled_query.trim().is_empty() {
        String::from(" Results ")
    } else {
        format!(" Results: {} ", state.settled_query.trim())
    };
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

/// Draws the detail page.
#[allow(clippy::indexing_slicing)]
fn draw_detail(frame: &mut Frame, state: &BrowserState, target: &DetailTarget) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // details + cast
            Constraint::Length(1), // status
            Constraint::Length(3), // footer
        ])
        .split(frame.area());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[0]);

    let lines: Vec<Line> = state.details.data.as_ref().map_or_else(
        || vec![Line::from(target.title.clone())],
        |details| {
            format::detail_fields(details)
                .into_iter()
                .map(|(label, value)| {
                    Line::from(vec![
                        Span::styled(
                            format!("{label}: "),
                            Style::default().fg(Color::DarkGray),
                        ),
                        Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
                    ])
                })
                .collect()
        },
    );
    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", target.title)),
        );
    frame.render_widget(details, panes[0]);

    let cast: Vec<ListItem> = state
        .credits
        .data
        .as_ref()
        .map(format::cast_lines)
        .unwrap_or_default()
        .into_iter()
        .map(ListItem::new)
        .collect();
    let cast = List::new(cast).block(Block::default().borders(Borders::ALL).title(" Cast "));
    frame.render_widget(cast, panes[1]);

    draw_status(frame, chunks[1], state.detail_status());
    let hints = if state.homepage().is_some() {
        "Esc: back  o: open homepage  r: refetch  Ctrl-L: reset  q: quit"
    } else {
        "Esc: back  r: refetch  Ctrl-L: reset  q: quit"
    };
    draw_footer(frame, chunks[2], hints);
}

/// Draws a one-line status message.
fn draw_status(frame: &mut Frame, area: Rect, status: Option<String>) {
    let style = if status.as_deref().is_some_and(|s| s.starts_with("Error")) {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    };
    let status = Paragraph::new(status.unwrap_or_default()).style(style);
    frame.render_widget(status, area);
}

/// Draws the footer with key hints.
fn draw_footer(frame: &mut Frame, area: Rect, hints: &str) {
    let footer = Paragraph::new(hints).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
