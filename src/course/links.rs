//! Canonical routes for course content

use super::model::{Item, Section};

/// Segment used when the course id is missing
pub const UNKNOWN_COURSE: &str = "unknown-course";
/// Segment used when the module id is missing
pub const UNKNOWN_MODULE: &str = "unknown-module";
/// Segment used when the section id is missing
pub const UNKNOWN_SECTION: &str = "unknown-section";
/// Segment used when the item id is missing
pub const UNKNOWN_ITEM: &str = "unknown-item";

/// Which page an item opens on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Assignment,
    Quiz,
    Exercise,
    Lesson,
}

impl LinkKind {
    /// Classify a type label
    ///
    /// Matching is by substring on the uppercased label, checked in the
    /// order assignment, quiz, exercise. Anything else opens as a lesson.
    pub fn from_label(label: &str) -> Self {
        let upper = label.to_uppercase();
        if upper.contains("ASSIGNMENT") {
            Self::Assignment
        } else if upper.contains("QUIZ") {
            Self::Quiz
        } else if upper.contains("EXERCISE") {
            Self::Exercise
        } else {
            Self::Lesson
        }
    }

    fn student_segment(self) -> Option<&'static str> {
        match self {
            Self::Assignment => Some("assignment"),
            Self::Quiz => Some("quiz"),
            Self::Exercise => Some("exercise"),
            Self::Lesson => None,
        }
    }
}

fn segment<'a>(id: Option<&'a str>, fallback: &'static str) -> &'a str {
    match id.map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => fallback,
    }
}

/// Route for an item, dispatched on its effective type
pub fn lesson_link(
    course_id: Option<&str>,
    module_id: Option<&str>,
    section: Option<&Section>,
    item: &Item,
) -> String {
    let kind = item
        .effective_kind(section)
        .map_or(LinkKind::Lesson, |k| LinkKind::from_label(k.label()));

    let course = segment(course_id, UNKNOWN_COURSE);
    let module = segment(module_id, UNKNOWN_MODULE);
    let section_id = segment(
        section.and_then(|s| s.id.as_deref()).or(item.section_id.as_deref()),
        UNKNOWN_SECTION,
    );
    let item_id = segment(item.id.as_deref(), UNKNOWN_ITEM);

    match kind.student_segment() {
        Some(page) => format!(
            "/student/course/{course}/module/{module}/{page}/{item_id}?section={section_id}"
        ),
        None => format!(
            "/learning/course/{course}/module/{module}/lesson/{item_id}?section={section_id}"
        ),
    }
}
