//! Application state definitions

use std::collections::HashMap;

use crate::course::{
    Item, Module, ModuleView, ProgressSnapshot, ProgressSummary, Section,
    calculate_module_progress, lesson_link,
};

/// Progress of the current navigation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Loading,
    Ready,
    Failed {
        message: String,
        retryable: bool,
    },
}

/// One visible line of the learning-modules menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuRow {
    /// Section header by index into the module's sections
    Section(usize),
    /// Item by section and item index
    Item(usize, usize),
}

/// Key under which a section's expanded flag is stored
///
/// Sections without an id fall back to their position.
pub fn section_key(index: usize, section: &Section) -> String {
    section.id.clone().unwrap_or_else(|| format!("#{index}"))
}

/// Expand/collapse and selection state for the menu
#[derive(Debug, Clone, Default)]
pub struct MenuState {
    /// Expanded flag per section key
    expanded: HashMap<String, bool>,
    /// Selected row index
    pub selected_index: usize,
    /// Scroll offset for long menus
    pub scroll_offset: usize,
    /// Visible height in rows (updated on render)
    pub visible_height: usize,
}

impl MenuState {
    /// Track the sections of a freshly loaded module
    ///
    /// Sections seen for the first time start expanded. Flags for sections
    /// no longer present are dropped.
    pub fn sync(&mut self, sections: &[Section]) {
        let keys: Vec<String> =
            sections.iter().enumerate().map(|(i, s)| section_key(i, s)).collect();
        self.expanded.retain(|key, _| keys.contains(key));
        for key in keys {
            self.expanded.entry(key).or_insert(true);
        }
    }

    /// Whether a section is expanded; unknown sections count as expanded
    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.get(key).copied().unwrap_or(true)
    }

    /// Flip a section
    pub fn toggle(&mut self, key: &str) {
        let expanded = self.is_expanded(key);
        self.expanded.insert(key.to_string(), !expanded);
    }

    /// Set a section's flag
    pub fn set_expanded(&mut self, key: &str, expanded: bool) {
        self.expanded.insert(key.to_string(), expanded);
    }

    /// Expand the section holding the active item
    pub fn reveal(&mut self, sections: &[Section], active_item_id: &str) {
        let holder = sections
            .iter()
            .enumerate()
            .find(|(_, s)| s.items.iter().any(|i| i.id.as_deref() == Some(active_item_id)));
        if let Some((index, section)) = holder {
            self.set_expanded(&section_key(index, section), true);
        }
    }

    /// Rows currently visible: every section, plus items of expanded ones
    pub fn rows(&self, sections: &[Section]) -> Vec<MenuRow> {
        let mut rows = Vec::new();
        for (si, section) in sections.iter().enumerate() {
            rows.push(MenuRow::Section(si));
            if self.is_expanded(&section_key(si, section)) {
                rows.extend((0..section.items.len()).map(|ii| MenuRow::Item(si, ii)));
            }
        }
        rows
    }

    /// Ensure the selected row is visible by adjusting scroll offset
    pub fn ensure_selection_visible(&mut self) {
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        }
        let visible = self.visible_height.saturating_sub(2);
        if visible > 0 && self.selected_index >= self.scroll_offset + visible {
            self.scroll_offset = self.selected_index.saturating_sub(visible) + 1;
        }
    }

    /// Keep the selection inside `row_count` rows
    pub fn clamp(&mut self, row_count: usize) {
        self.selected_index = self.selected_index.min(row_count.saturating_sub(1));
        self.ensure_selection_visible();
    }
}

/// Full application state
#[derive(Debug, Default)]
pub struct AppState {
    /// Course being browsed
    pub course_id: String,

    /// Module being browsed
    pub module_id: String,

    /// Item the student is on, if any
    pub active_item_id: Option<String>,

    /// Current navigation's load state
    pub load: LoadState,

    /// Loaded module with sorted sections
    pub module: Option<Module>,

    /// Progress snapshot, when one could be fetched
    pub snapshot: Option<ProgressSnapshot>,

    /// Menu state
    pub menu: MenuState,

    /// Status line message
    pub status: Option<String>,
}

impl AppState {
    /// State for browsing a module
    pub fn new(
        course_id: impl Into<String>,
        module_id: impl Into<String>,
        active_item_id: Option<String>,
    ) -> Self {
        Self {
            course_id: course_id.into(),
            module_id: module_id.into(),
            active_item_id,
            ..Default::default()
        }
    }

    /// Sections of the loaded module
    pub fn sections(&self) -> &[Section] {
        self.module.as_ref().map(|m| m.sections.as_slice()).unwrap_or_default()
    }

    /// Install a loaded module
    pub fn apply_module(&mut self, module: Module, snapshot: Option<ProgressSnapshot>) {
        self.menu.sync(&module.sections);
        if let Some(active) = &self.active_item_id {
            self.menu.reveal(&module.sections, active);
        }
        self.module = Some(module);
        self.snapshot = snapshot;
        self.load = LoadState::Ready;

        let rows = self.rows().len();
        self.menu.clamp(rows);
    }

    /// Install a loaded view, flagging progress that could not be fetched
    pub fn apply_view(&mut self, view: ModuleView) {
        self.apply_module(view.module, view.snapshot);
        if let Some(error) = view.progress_error {
            self.status = Some(format!("Progress unavailable ({error}), press r to retry"));
        }
    }

    /// Mark the navigation as failed
    pub fn fail(&mut self, message: impl Into<String>, retryable: bool) {
        self.load = LoadState::Failed { message: message.into(), retryable };
    }

    /// Mark the navigation as in flight
    pub fn start_loading(&mut self) {
        self.load = LoadState::Loading;
        self.status = None;
    }

    /// Visible menu rows
    pub fn rows(&self) -> Vec<MenuRow> {
        self.menu.rows(self.sections())
    }

    /// Row under the cursor
    pub fn selected_row(&self) -> Option<MenuRow> {
        self.rows().get(self.menu.selected_index).copied()
    }

    /// Item under the cursor, with its section
    pub fn selected_item(&self) -> Option<(&Section, &Item)> {
        match self.selected_row()? {
            MenuRow::Item(si, ii) => {
                let section = self.sections().get(si)?;
                Some((section, section.items.get(ii)?))
            }
            MenuRow::Section(_) => None,
        }
    }

    /// Route of the item under the cursor
    pub fn selected_link(&self) -> Option<String> {
        let (section, item) = self.selected_item()?;
        Some(lesson_link(Some(&self.course_id), Some(&self.module_id), Some(section), item))
    }

    /// Progress through the current module
    pub fn progress(&self) -> ProgressSummary {
        self.snapshot
            .as_ref()
            .map(|s| calculate_module_progress(Some(&self.module_id), s))
            .unwrap_or_default()
    }

    /// Move the cursor up one row
    pub fn move_up(&mut self) {
        self.menu.selected_index = self.menu.selected_index.saturating_sub(1);
        self.menu.ensure_selection_visible();
    }

    /// Move the cursor down one row
    pub fn move_down(&mut self) {
        let rows = self.rows().len();
        if self.menu.selected_index + 1 < rows {
            self.menu.selected_index += 1;
        }
        self.menu.ensure_selection_visible();
    }

    /// Jump to the first row
    pub fn move_top(&mut self) {
        self.menu.selected_index = 0;
        self.menu.ensure_selection_visible();
    }

    /// Jump to the last row
    pub fn move_bottom(&mut self) {
        self.menu.selected_index = self.rows().len().saturating_sub(1);
        self.menu.ensure_selection_visible();
    }

    fn selected_section_key(&self) -> Option<(usize, String)> {
        let si = match self.selected_row()? {
            MenuRow::Section(si) | MenuRow::Item(si, _) => si,
        };
        self.sections().get(si).map(|s| (si, section_key(si, s)))
    }

    /// Toggle the section under the cursor, or open the item under it
    pub fn activate(&mut self) {
        match self.selected_row() {
            Some(MenuRow::Section(_)) => {
                if let Some((_, key)) = self.selected_section_key() {
                    self.menu.toggle(&key);
                }
            }
            Some(MenuRow::Item(..)) => {
                let opened = self
                    .selected_item()
                    .map(|(_, item)| item.id.clone())
                    .zip(self.selected_link());
                if let Some((id, link)) = opened {
                    self.active_item_id = id;
                    self.status = Some(link);
                }
            }
            None => {}
        }
        let rows = self.rows().len();
        self.menu.clamp(rows);
    }

    /// Expand the section under the cursor
    pub fn expand_selected(&mut self) {
        if let Some((_, key)) = self.selected_section_key() {
            self.menu.set_expanded(&key, true);
        }
    }

    /// Collapse the section under the cursor, moving onto its header
    pub fn collapse_selected(&mut self) {
        let Some((si, key)) = self.selected_section_key() else {
            return;
        };
        self.menu.set_expanded(&key, false);

        let header = self.rows().iter().position(|r| *r == MenuRow::Section(si));
        if let Some(index) = header {
            self.menu.selected_index = index;
        }
        self.menu.ensure_selection_visible();
    }
}
