//! UI rendering components

pub mod layout;
pub mod menu;

use ratatui::{Frame, style::Style, widgets::Block};

use crate::app::state::{AppState, LoadState};
use crate::config::Config;

const KEY_HINT: &str = "j/k move · enter toggle/open · l/h expand/collapse · r reload · q quit";

/// Main draw function
pub fn draw(frame: &mut Frame, state: &mut AppState, config: &Config) {
    let theme = config.active_theme();
    let background = Block::default().style(Style::default().bg(theme.bg_primary));
    frame.render_widget(background, frame.area());

    let (header, body, footer) = layout::screen_chunks(frame.area());
    layout::draw_progress(frame, header, state.progress(), &theme);

    match state.load.clone() {
        LoadState::Loading => layout::draw_message(frame, body, "Loading module...", &theme),
        LoadState::Failed { message, retryable } => {
            layout::draw_failure(frame, body, &message, retryable, &theme);
        }
        LoadState::Ready => menu::draw(frame, body, state, &theme),
    }

    let message = state.status.clone().or_else(|| state.selected_link());
    layout::draw_footer(frame, footer, message.as_deref(), KEY_HINT, &theme);
}
