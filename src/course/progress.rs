//! Progress snapshots, completion evaluation and aggregation

use serde::{Deserialize, Serialize};

use super::model::{
    ContentKind, Item, STATUS_COMPLETE, Section, lenient_bool, lenient_count, lenient_id,
    lenient_kind, lenient_list, lenient_minutes, lenient_object, lenient_text,
};

/// Status value progress components use to mark themselves done
pub const STATUS_COMPLETED: &str = "completed";

/// Completed/total counts with a rounded percentage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSummary {
    /// Rounded percentage (0-100)
    #[serde(default, deserialize_with = "lenient_count")]
    pub percentage: u32,
    /// Completed components
    #[serde(default, alias = "completedCount", deserialize_with = "lenient_count")]
    pub completed: u32,
    /// All components
    #[serde(default, alias = "totalCount", deserialize_with = "lenient_count")]
    pub total: u32,
}

impl ProgressSummary {
    /// Build a summary from counts
    pub fn from_counts(completed: u32, total: u32) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            (f64::from(completed) / f64::from(total) * 100.0).round() as u32
        };
        Self { percentage, completed, total }
    }

    /// Whether everything is done (and there was something to do)
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}

/// Per-student readout of one trackable component
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawComponent")]
pub struct ComponentProgress {
    /// Component (item) identifier
    pub id: Option<String>,
    /// Component type
    pub kind: Option<ContentKind>,
    pub status: Option<String>,
    pub is_completed: Option<bool>,
    /// Assignments
    pub is_submitted: Option<bool>,
    /// Quizzes
    pub is_passed: Option<bool>,
    /// Lessons
    pub is_viewed: Option<bool>,
    /// Lessons
    pub view_count: Option<u32>,
}

/// Per-student readout of one section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawSectionProgress")]
pub struct SectionProgress {
    pub id: Option<String>,
    pub title: Option<String>,
    pub kind: Option<ContentKind>,
    pub components: Vec<ComponentProgress>,
}

/// Per-student readout of one module
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawModuleProgress")]
pub struct ModuleProgress {
    pub id: Option<String>,
    pub title: Option<String>,
    pub sections: Vec<SectionProgress>,
}

/// A student's progress through a course, fetched once per module view
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawSnapshot")]
pub struct ProgressSnapshot {
    /// Course identifier
    pub course_id: Option<String>,
    /// Course title
    pub title: Option<String>,
    /// Modules in course order
    pub modules: Vec<ModuleProgress>,
    /// Course-level summary computed by the backend
    pub progress: Option<ProgressSummary>,
}

// Progress entries are subdocuments: `_id` is the entry's own id while
// `componentId`/`sectionId`/`moduleId` point at the tracked content, so the
// reference wins when both are present.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawComponent {
    #[serde(default, deserialize_with = "lenient_id")]
    component_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    item_id: Option<String>,
    #[serde(rename = "_id", default, deserialize_with = "lenient_id")]
    mongo_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_kind")]
    kind: Option<ContentKind>,
    #[serde(default, deserialize_with = "lenient_kind")]
    component_type: Option<ContentKind>,
    #[serde(default, deserialize_with = "lenient_text")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_completed: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_submitted: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_passed: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_viewed: Option<bool>,
    #[serde(default, deserialize_with = "lenient_minutes")]
    view_count: Option<u32>,
}

impl From<RawComponent> for ComponentProgress {
    fn from(raw: RawComponent) -> Self {
        Self {
            id: raw.component_id.or(raw.item_id).or(raw.mongo_id).or(raw.id),
            kind: raw.kind.or(raw.component_type),
            status: raw.status,
            is_completed: raw.is_completed,
            is_submitted: raw.is_submitted,
            is_passed: raw.is_passed,
            is_viewed: raw.is_viewed,
            view_count: raw.view_count,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSectionProgress {
    #[serde(default, deserialize_with = "lenient_id")]
    section_id: Option<String>,
    #[serde(rename = "_id", default, deserialize_with = "lenient_id")]
    mongo_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    title: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_kind")]
    kind: Option<ContentKind>,
    #[serde(default, deserialize_with = "lenient_list")]
    components: Vec<ComponentProgress>,
}

impl From<RawSectionProgress> for SectionProgress {
    fn from(raw: RawSectionProgress) -> Self {
        Self {
            id: raw.section_id.or(raw.mongo_id).or(raw.id),
            title: raw.title,
            kind: raw.kind,
            components: raw.components,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawModuleProgress {
    #[serde(default, deserialize_with = "lenient_id")]
    module_id: Option<String>,
    #[serde(rename = "_id", default, deserialize_with = "lenient_id")]
    mongo_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    sections: Vec<SectionProgress>,
}

impl From<RawModuleProgress> for ModuleProgress {
    fn from(raw: RawModuleProgress) -> Self {
        Self {
            id: raw.module_id.or(raw.mongo_id).or(raw.id),
            title: raw.title,
            sections: raw.sections,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnapshot {
    #[serde(default, deserialize_with = "lenient_id")]
    course_id: Option<String>,
    #[serde(rename = "_id", default, deserialize_with = "lenient_id")]
    mongo_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    modules: Vec<ModuleProgress>,
    #[serde(default, deserialize_with = "lenient_object")]
    progress: Option<ProgressSummary>,
}

impl From<RawSnapshot> for ProgressSnapshot {
    fn from(raw: RawSnapshot) -> Self {
        Self {
            course_id: raw.course_id.or(raw.mongo_id).or(raw.id),
            title: raw.title,
            modules: raw.modules,
            progress: raw.progress,
        }
    }
}

impl ProgressSnapshot {
    /// Find a module by id
    pub fn module(&self, module_id: &str) -> Option<&ModuleProgress> {
        self.modules.iter().find(|m| m.id.as_deref() == Some(module_id))
    }

    /// Find a section by id anywhere in the course
    pub fn section(&self, section_id: &str) -> Option<&SectionProgress> {
        self.modules
            .iter()
            .flat_map(|m| m.sections.iter())
            .find(|s| s.id.as_deref() == Some(section_id))
    }

    /// Find a component by id, with the section holding it
    pub fn component(&self, component_id: &str) -> Option<(&SectionProgress, &ComponentProgress)> {
        self.modules.iter().flat_map(|m| m.sections.iter()).find_map(|s| {
            s.components.iter().find(|c| c.id.as_deref() == Some(component_id)).map(|c| (s, c))
        })
    }
}

impl ComponentProgress {
    /// Whether this component counts as done
    ///
    /// The type-specific signal follows the component's own type, then the
    /// section's type. With no type at all every signal counts; unknown types
    /// are tracked like lessons.
    pub fn is_completed(&self, section_kind: Option<&ContentKind>) -> bool {
        if self.status.as_deref() == Some(STATUS_COMPLETED) || self.is_completed == Some(true) {
            return true;
        }

        let submitted = self.is_submitted == Some(true);
        let passed = self.is_passed == Some(true);
        let viewed = self.is_viewed == Some(true) || self.view_count.is_some_and(|n| n > 0);

        match self.kind.as_ref().or(section_kind) {
            None => submitted || passed || viewed,
            Some(ContentKind::Assignment) => submitted,
            Some(ContentKind::Quiz) => passed,
            Some(ContentKind::Exercise) => false,
            Some(_) => viewed,
        }
    }
}

impl SectionProgress {
    /// Completed and total component counts
    pub fn counts(&self) -> (u32, u32) {
        let completed =
            self.components.iter().filter(|c| c.is_completed(self.kind.as_ref())).count();
        (completed as u32, self.components.len() as u32)
    }
}

/// Whether a single component is done
pub fn is_component_completed(
    component: &ComponentProgress,
    section_kind: Option<&ContentKind>,
) -> bool {
    component.is_completed(section_kind)
}

/// Whether a section is done
///
/// The snapshot is authoritative when it tracks at least one component for
/// the section. Otherwise the section's own status decides, then its items'
/// statuses. Empty sections are never done.
pub fn is_section_completed(section: &Section, snapshot: Option<&ProgressSnapshot>) -> bool {
    let tracked = section
        .id
        .as_deref()
        .and_then(|id| snapshot.and_then(|s| s.section(id)))
        .filter(|entry| !entry.components.is_empty());

    if let Some(entry) = tracked {
        let kind = entry.kind.as_ref().or(section.kind.as_ref());
        return entry.components.iter().all(|c| c.is_completed(kind));
    }

    if section.status.as_deref() == Some(STATUS_COMPLETE) {
        return true;
    }

    !section.items.is_empty() && section.items.iter().all(Item::has_complete_status)
}

/// Whether an item is done
///
/// Uses the snapshot component with the same id when there is one, otherwise
/// the item's stored status.
pub fn is_item_completed(
    item: &Item,
    section: Option<&Section>,
    snapshot: Option<&ProgressSnapshot>,
) -> bool {
    let component =
        item.id.as_deref().and_then(|id| snapshot.and_then(|s| s.component(id)));

    match component {
        Some((entry, component)) => {
            let kind = item.effective_kind(section).or(entry.kind.as_ref());
            component.is_completed(kind)
        }
        None => {
            item.has_complete_status() || item.status.as_deref() == Some(STATUS_COMPLETED)
        }
    }
}

/// Progress through one module, or the whole course when no module is selected
pub fn calculate_module_progress(
    current_module_id: Option<&str>,
    snapshot: &ProgressSnapshot,
) -> ProgressSummary {
    let Some(module_id) = current_module_id else {
        return snapshot.progress.unwrap_or_default();
    };

    let Some(module) = snapshot.module(module_id) else {
        tracing::debug!(module_id, "Module missing from progress snapshot");
        return ProgressSummary::default();
    };

    let (completed, total) = module
        .sections
        .iter()
        .map(SectionProgress::counts)
        .fold((0, 0), |(c, t), (sc, st)| (c + sc, t + st));

    ProgressSummary::from_counts(completed, total)
}

/// Progress through every module of the course, computed from components
pub fn calculate_course_progress(snapshot: &ProgressSnapshot) -> ProgressSummary {
    let (completed, total) = snapshot
        .modules
        .iter()
        .flat_map(|m| m.sections.iter())
        .map(SectionProgress::counts)
        .fold((0, 0), |(c, t), (sc, st)| (c + sc, t + st));

    ProgressSummary::from_counts(completed, total)
}
