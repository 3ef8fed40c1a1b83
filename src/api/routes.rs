//! REST routes consumed from the LMS backend

use super::normalize::EntityKind;

/// Per-section item endpoints
///
/// Quizzes and exercises have several historical routes; the loader tries
/// them in the order given by its resolver chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemEndpoint {
    Lessons,
    Quizzes,
    QuizBySectionId,
    Exercises,
    ExercisesByService,
    ExercisesByQuery,
    SectionExercises,
    Assignments,
}

impl ItemEndpoint {
    /// Entity kind used when normalizing this endpoint's responses
    pub fn entity_kind(self) -> EntityKind {
        match self {
            Self::Lessons => EntityKind::Lesson,
            Self::Quizzes | Self::QuizBySectionId => EntityKind::Quiz,
            Self::Exercises
            | Self::ExercisesByService
            | Self::ExercisesByQuery
            | Self::SectionExercises => EntityKind::Exercise,
            Self::Assignments => EntityKind::Assignment,
        }
    }

    fn parts(self, section_id: &str) -> RouteParts<'_> {
        let (segments, query) = match self {
            Self::Lessons => (vec!["lessons", "section", section_id], None),
            Self::Quizzes => (vec!["quizzes", "section", section_id], None),
            Self::QuizBySectionId => (vec!["quiz", "section", section_id], None),
            Self::Exercises => (vec!["exercises", "section", section_id], None),
            Self::ExercisesByService => (vec!["exercises", "by-section", section_id], None),
            Self::ExercisesByQuery => (vec!["exercises"], Some(("sectionId", section_id))),
            Self::SectionExercises => (vec!["sections", section_id, "exercises"], None),
            Self::Assignments => (vec!["assignments", "section", section_id], None),
        };
        RouteParts { segments, query }
    }
}

/// Unencoded path segments and optional query pair of a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParts<'a> {
    pub segments: Vec<&'a str>,
    pub query: Option<(&'static str, &'a str)>,
}

/// A read request against the LMS API
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Course tree with the student's progress snapshot
    CourseProgress { course_id: String, student_id: String },
    /// A single module with its section references
    Module(String),
    /// A single section's details
    Section(String),
    /// Items of one section through a specific endpoint
    SectionItems { endpoint: ItemEndpoint, section_id: String },
    /// Every exercise, unfiltered
    AllExercises,
}

impl Route {
    /// Path segments and query, each still unencoded
    pub fn parts(&self) -> RouteParts<'_> {
        let segments = match self {
            Route::CourseProgress { course_id, student_id } => {
                vec!["courses", course_id.as_str(), "progress", student_id.as_str()]
            }
            Route::Module(id) => vec!["modules", id.as_str()],
            Route::Section(id) => vec!["sections", id.as_str()],
            Route::SectionItems { endpoint, section_id } => return endpoint.parts(section_id),
            Route::AllExercises => vec!["exercises"],
        };
        RouteParts { segments, query: None }
    }

    /// Readable path relative to the API base URL, used in logs and errors
    pub fn path(&self) -> String {
        let parts = self.parts();
        let mut path = format!("/{}", parts.segments.join("/"));
        if let Some((key, value)) = parts.query {
            path.push_str(&format!("?{}={}", key, value));
        }
        path
    }

    /// Shorthand for a section item route
    pub fn items(endpoint: ItemEndpoint, section_id: impl Into<String>) -> Self {
        Route::SectionItems { endpoint, section_id: section_id.into() }
    }
}
