//! Application state and event handling

pub mod input;
pub mod navigator;
pub mod state;

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::config::{Config, CourseSummary, Session};
use crate::course::{ModuleLoader, ModuleView, calculate_course_progress};
use crate::ui;
use input::{Action, key_to_action};
use navigator::{LoadEvent, Navigator, Target};
use state::{AppState, LoadState};

/// The main application
pub struct App {
    /// Application configuration
    config: Config,

    /// Persisted session
    session: Session,

    /// Current application state
    state: AppState,

    /// Background loads
    navigator: Navigator,

    /// Terminal backend
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl App {
    /// Create a new application instance browsing one module
    pub fn new(
        config: Config,
        session: Session,
        loader: ModuleLoader,
        course_id: String,
        module_id: String,
        item_id: Option<String>,
    ) -> Result<Self> {
        let terminal = Self::setup_terminal()?;
        let state = AppState::new(course_id, module_id, item_id);

        Ok(Self { config, session, state, navigator: Navigator::new(loader), terminal })
    }

    /// Set up the terminal for TUI rendering
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore the terminal to its original state
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Run the application main loop
    pub async fn run(&mut self) -> Result<()> {
        // Set up panic hook to restore terminal
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        self.navigate();

        loop {
            self.terminal.draw(|frame| {
                ui::draw(frame, &mut self.state, &self.config);
            })?;

            while let Some(event) = self.navigator.try_next() {
                self.apply(event);
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        let action = key_to_action(key.code, key.modifiers, self.config.vim_mode);
                        if let Some(action) = action {
                            if self.handle_action(action) {
                                break;
                            }
                        }
                    }
                }
            }
        }

        self.navigator.cancel();
        self.restore_terminal()?;
        Ok(())
    }

    /// Start loading the current module
    fn navigate(&mut self) {
        self.state.start_loading();
        self.navigator.navigate(Target {
            course_id: self.state.course_id.clone(),
            module_id: self.state.module_id.clone(),
            student_id: self.session.student_id().map(String::from),
        });
    }

    /// Apply a finished load
    fn apply(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Loaded { view, .. } => {
                self.remember(&view);
                self.state.apply_view(view);
            }
            LoadEvent::Failed { error, .. } => {
                tracing::error!(module_id = %self.state.module_id, error = %error, "Module load failed");
                self.state.fail(error.to_string(), error.is_retryable());
            }
        }
    }

    /// Record the visit in the session cache
    fn remember(&mut self, view: &ModuleView) {
        if let Some(snapshot) = &view.snapshot {
            let percentage = snapshot
                .progress
                .unwrap_or_else(|| calculate_course_progress(snapshot))
                .percentage;
            self.session.remember_course(CourseSummary {
                id: self.state.course_id.clone(),
                title: snapshot.title.clone(),
                percentage,
            });
        }
        self.session.visit(self.state.course_id.clone(), self.state.module_id.clone());

        if let Err(e) = self.session.save() {
            tracing::warn!("Failed to save session: {:#}", e);
        }
    }

    /// Handle an action, returns true if should exit
    fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::Retry => self.navigate(),
            _ if self.state.load != LoadState::Ready => {}
            Action::Up => self.state.move_up(),
            Action::Down => self.state.move_down(),
            Action::Top => self.state.move_top(),
            Action::Bottom => self.state.move_bottom(),
            Action::Toggle => self.state.activate(),
            Action::Expand => self.state.expand_selected(),
            Action::Collapse => self.state.collapse_selected(),
        }
        false
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}
