//! Learning-modules menu

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::state::{AppState, MenuRow, section_key};
use crate::course::{Item, ProgressSnapshot, Section, is_item_completed, is_section_completed};
use crate::theme::Theme;

/// Status indicators
const STATUS_NOT_STARTED: &str = "○";
const STATUS_IN_PROGRESS: &str = "●";
const STATUS_COMPLETED: &str = "✓";

/// Icon for a section
fn section_status(section: &Section, snapshot: Option<&ProgressSnapshot>) -> &'static str {
    if is_section_completed(section, snapshot) {
        STATUS_COMPLETED
    } else if section.items.iter().any(|i| is_item_completed(i, Some(section), snapshot)) {
        STATUS_IN_PROGRESS
    } else {
        STATUS_NOT_STARTED
    }
}

/// Icon for an item
fn item_status(item: &Item, section: &Section, snapshot: Option<&ProgressSnapshot>) -> &'static str {
    if is_item_completed(item, Some(section), snapshot) {
        STATUS_COMPLETED
    } else {
        STATUS_NOT_STARTED
    }
}

/// Text of one menu row
fn row_text(state: &AppState, row: MenuRow) -> String {
    let sections = state.sections();
    let snapshot = state.snapshot.as_ref();

    match row {
        MenuRow::Section(si) => {
            let Some(section) = sections.get(si) else { return String::new() };
            let marker = if state.menu.is_expanded(&section_key(si, section)) { "▼" } else { "▶" };
            let mut text = format!(
                "{} {} {}",
                marker,
                section_status(section, snapshot),
                section.display_title()
            );
            if let Some(minutes) = section.total_minutes() {
                text.push_str(&format!(" · {minutes} min"));
            }
            if section.items.is_empty() {
                text.push_str(" (no items)");
            }
            text
        }
        MenuRow::Item(si, ii) => {
            let Some(section) = sections.get(si) else { return String::new() };
            let Some(item) = section.items.get(ii) else { return String::new() };
            let kind = item.effective_kind(Some(section)).map(|k| k.label()).unwrap_or("LESSON");
            format!(
                "    {} {} [{}]",
                item_status(item, section, snapshot),
                item.display_title(),
                kind.to_lowercase()
            )
        }
    }
}

/// Draw the menu
pub fn draw(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let title = state
        .module
        .as_ref()
        .map_or_else(|| " Modules ".to_string(), |m| format!(" {} ", m.display_title()));

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .style(Style::default().bg(theme.bg_primary));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Update visible height for scroll calculations
    state.menu.visible_height = inner.height as usize;
    state.menu.ensure_selection_visible();

    if state.sections().is_empty() {
        let msg = Paragraph::new("This module has no sections yet")
            .style(Style::default().fg(theme.fg_muted))
            .wrap(Wrap { trim: true });
        frame.render_widget(msg, inner);
        return;
    }

    let active = state.active_item_id.as_deref();
    let lines: Vec<Line> = state
        .rows()
        .into_iter()
        .enumerate()
        .skip(state.menu.scroll_offset)
        .take(inner.height as usize)
        .map(|(index, row)| {
            let style = if index == state.menu.selected_index {
                Style::default()
                    .fg(theme.bg_primary)
                    .bg(theme.accent_primary)
                    .add_modifier(Modifier::BOLD)
            } else {
                match row {
                    MenuRow::Section(_) => Style::default().fg(theme.fg_primary),
                    MenuRow::Item(si, ii) => {
                        let is_active = state
                            .sections()
                            .get(si)
                            .and_then(|s| s.items.get(ii))
                            .is_some_and(|i| i.id.is_some() && i.id.as_deref() == active);
                        if is_active {
                            Style::default().fg(theme.accent_secondary)
                        } else {
                            Style::default().fg(theme.fg_secondary)
                        }
                    }
                }
            };
            Line::from(Span::styled(row_text(state, row), style))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
