//! Layout utilities and common components

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

use crate::course::ProgressSummary;
use crate::theme::Theme;

/// Split the screen into header, body and footer
pub fn screen_chunks(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(2)])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}

/// Progress gauge for the current module
pub fn draw_progress(frame: &mut Frame, area: Rect, progress: ProgressSummary, theme: &Theme) {
    let color = if progress.is_complete() { theme.success } else { theme.accent_primary };
    let label = format!(
        "{}% · {} of {} completed",
        progress.percentage, progress.completed, progress.total
    );

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(" Progress ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        )
        .gauge_style(Style::default().fg(color).bg(theme.bg_secondary))
        .percent(progress.percentage.min(100) as u16)
        .label(label);

    frame.render_widget(gauge, area);
}

/// Footer with a message line and key hints
pub fn draw_footer(frame: &mut Frame, area: Rect, message: Option<&str>, hint: &str, theme: &Theme) {
    let lines = vec![
        Line::from(Span::styled(
            message.unwrap_or_default().to_string(),
            Style::default().fg(theme.info),
        )),
        Line::from(Span::styled(hint.to_string(), Style::default().fg(theme.fg_muted))),
    ];
    let footer = Paragraph::new(lines).style(Style::default().bg(theme.bg_primary));
    frame.render_widget(footer, area);
}

/// Centered message in place of the menu
pub fn draw_message(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let style = Style::default().fg(theme.fg_muted).bg(theme.bg_primary);
    let paragraph = Paragraph::new(message).style(style).alignment(Alignment::Center);
    frame.render_widget(paragraph, centered_line(area));
}

/// Failure view with the error and the retry key
pub fn draw_failure(frame: &mut Frame, area: Rect, message: &str, retryable: bool, theme: &Theme) {
    let mut lines = vec![
        Line::from(Span::styled(
            "Could not load this module",
            Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(theme.fg_secondary))),
        Line::from(""),
    ];
    let hint = if retryable { "Press r to try again" } else { "Press r to reload, q to quit" };
    lines.push(Line::from(Span::styled(hint, Style::default().fg(theme.warning))));

    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(theme.bg_primary))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// One-line rect at the vertical middle of `area`
fn centered_line(area: Rect) -> Rect {
    let y = area.y + area.height / 2;
    Rect { y, height: 1.min(area.height), ..area }
}
