//! Module loading
//!
//! Fetches a module, then every referenced section concurrently, then each
//! section's items through the route matching its type. Sections that fail
//! to load are dropped so one broken section never blanks the whole module.

use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::model::{ContentKind, Item, Module, Section};
use super::progress::ProgressSnapshot;
use super::resolve::ResolverChain;
use crate::api::{ApiError, CourseApi, EntityKind, ItemEndpoint, Route, normalize_as};

/// Errors that abort a module or course load
#[derive(Debug, Error)]
pub enum LoadError {
    /// Fetch failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Module response held no module
    #[error("Module {0} not found")]
    ModuleNotFound(String),

    /// Course response held no course
    #[error("Course {0} not found")]
    CourseNotFound(String),

    /// No student id in the session
    #[error("Not logged in. Run `scholar login <student-id>` first")]
    NotLoggedIn,
}

impl LoadError {
    /// Whether the navigation was abandoned
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoadError::Api(ApiError::Cancelled))
    }

    /// Whether offering a retry makes sense
    pub fn is_retryable(&self) -> bool {
        match self {
            LoadError::Api(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

/// Sort sections by type priority, keeping API order within a priority
pub fn sort_sections(sections: &mut [Section]) {
    sections.sort_by_key(Section::priority);
}

/// A module with the student's progress through its course
#[derive(Debug, Default)]
pub struct ModuleView {
    pub module: Module,
    /// Missing when logged out or when progress could not be fetched
    pub snapshot: Option<ProgressSnapshot>,
    /// Why progress could not be fetched; not set when logged out
    pub progress_error: Option<LoadError>,
}

/// Loads modules and progress snapshots through a [`CourseApi`]
#[derive(Clone)]
pub struct ModuleLoader {
    api: Arc<dyn CourseApi>,
}

impl ModuleLoader {
    /// Create a loader over an API implementation
    pub fn new(api: Arc<dyn CourseApi>) -> Self {
        Self { api }
    }

    /// Fetch a route unless the navigation is cancelled first
    async fn fetch(&self, route: Route, cancel: &CancellationToken) -> Result<Value, ApiError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            result = self.api.get(&route) => result,
        }
    }

    /// Load a module with its sections and items, sorted for display
    pub async fn load_module(
        &self,
        module_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Module, LoadError> {
        let response = self.fetch(Route::Module(module_id.to_string()), cancel).await?;

        let mut module = normalize_as::<Module>(&response, EntityKind::Module)
            .into_iter()
            .next()
            .ok_or_else(|| LoadError::ModuleNotFound(module_id.to_string()))?;

        if module.id.is_none() {
            module.id = Some(module_id.to_string());
        }

        let results =
            join_all(module.section_ids.iter().map(|id| self.load_section(id, cancel))).await;

        let mut sections = Vec::with_capacity(results.len());
        for result in results {
            if let Some(section) = result? {
                sections.push(section);
            }
        }

        if cancel.is_cancelled() {
            return Err(ApiError::Cancelled.into());
        }

        tracing::info!(
            module_id,
            loaded = sections.len(),
            referenced = module.section_ids.len(),
            "Module loaded"
        );

        sort_sections(&mut sections);
        module.sections = sections;
        Ok(module)
    }

    /// Load one section with its items
    ///
    /// Returns `Ok(None)` when the section cannot be loaded; only
    /// cancellation is an error.
    async fn load_section(
        &self,
        section_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Section>, ApiError> {
        let response = match self.fetch(Route::Section(section_id.to_string()), cancel).await {
            Ok(response) => response,
            Err(ApiError::Cancelled) => return Err(ApiError::Cancelled),
            Err(e) => {
                tracing::warn!(section_id, error = %e, "Dropping section that failed to load");
                return Ok(None);
            }
        };

        let Some(mut section) =
            normalize_as::<Section>(&response, EntityKind::Section).into_iter().next()
        else {
            tracing::warn!(section_id, "Dropping section with empty response");
            return Ok(None);
        };

        if section.id.is_none() {
            section.id = Some(section_id.to_string());
        }

        let mut items = self.fetch_items(&section, cancel).await?;
        for item in &mut items {
            if item.kind.is_none() {
                item.kind = section.kind.clone();
            }
            if item.section_id.is_none() {
                item.section_id = Some(section_id.to_string());
            }
        }
        section.items = items;

        Ok(Some(section))
    }

    /// Fetch a section's items through the route matching its type
    pub async fn fetch_items(
        &self,
        section: &Section,
        cancel: &CancellationToken,
    ) -> Result<Vec<Item>, ApiError> {
        let Some(section_id) = section.id.as_deref() else {
            return Ok(Vec::new());
        };

        match section.kind {
            Some(ContentKind::Quiz) => self.fetch_quiz_items(section_id, cancel).await,
            Some(ContentKind::Exercise) => self.fetch_exercise_items(section_id, cancel).await,
            Some(ContentKind::Assignment) => {
                self.fetch_or_empty(ItemEndpoint::Assignments, section_id, cancel).await
            }
            _ => self.fetch_or_empty(ItemEndpoint::Lessons, section_id, cancel).await,
        }
    }

    async fn fetch_from(
        &self,
        endpoint: ItemEndpoint,
        section_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Item>, ApiError> {
        let response = self.fetch(Route::items(endpoint, section_id), cancel).await?;
        Ok(normalize_as(&response, endpoint.entity_kind()))
    }

    async fn fetch_or_empty(
        &self,
        endpoint: ItemEndpoint,
        section_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Item>, ApiError> {
        match self.fetch_from(endpoint, section_id, cancel).await {
            Err(ApiError::Cancelled) => Err(ApiError::Cancelled),
            Err(e) => {
                tracing::warn!(section_id, error = %e, "Item fetch failed");
                Ok(Vec::new())
            }
            ok => ok,
        }
    }

    async fn fetch_quiz_items(
        &self,
        section_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Item>, ApiError> {
        let resolved = ResolverChain::new()
            .then("quizzes-by-section", move || {
                self.fetch_from(ItemEndpoint::Quizzes, section_id, cancel)
            })
            .then("quiz-by-section-id", move || {
                self.fetch_from(ItemEndpoint::QuizBySectionId, section_id, cancel)
            })
            .resolve()
            .await?;

        Ok(resolved.map(|r| r.values).unwrap_or_default())
    }

    /// Fetch a section's exercises, never returning an empty list
    ///
    /// Tries every known exercise route, then the full exercise list
    /// filtered by section. When all of them come up empty a single
    /// placeholder exercise is returned.
    pub async fn fetch_exercise_items(
        &self,
        section_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Item>, ApiError> {
        let resolved = ResolverChain::new()
            .then("exercises-by-section", move || {
                self.fetch_from(ItemEndpoint::Exercises, section_id, cancel)
            })
            .then("exercises-by-service", move || {
                self.fetch_from(ItemEndpoint::ExercisesByService, section_id, cancel)
            })
            .then("exercises-by-query", move || {
                self.fetch_from(ItemEndpoint::ExercisesByQuery, section_id, cancel)
            })
            .then("section-exercises", move || {
                self.fetch_from(ItemEndpoint::SectionExercises, section_id, cancel)
            })
            .then("all-exercises-filtered", move || self.fetch_all_exercises(section_id, cancel))
            .resolve()
            .await?;

        match resolved {
            Some(resolved) => Ok(resolved.values),
            None => {
                tracing::warn!(section_id, "No exercise route answered, using placeholder");
                Ok(vec![Item::placeholder_exercise(section_id)])
            }
        }
    }

    async fn fetch_all_exercises(
        &self,
        section_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Item>, ApiError> {
        let response = self.fetch(Route::AllExercises, cancel).await?;
        let exercises: Vec<Item> = normalize_as(&response, EntityKind::Exercise);
        Ok(exercises
            .into_iter()
            .filter(|item| item.section_id.as_deref() == Some(section_id))
            .collect())
    }

    /// Load a student's progress through a course
    pub async fn load_progress(
        &self,
        course_id: &str,
        student_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ProgressSnapshot, LoadError> {
        let student_id = student_id.ok_or(LoadError::NotLoggedIn)?;

        let route = Route::CourseProgress {
            course_id: course_id.to_string(),
            student_id: student_id.to_string(),
        };
        let response = self.fetch(route, cancel).await?;

        let mut snapshot = normalize_as::<ProgressSnapshot>(&response, EntityKind::Course)
            .into_iter()
            .next()
            .ok_or_else(|| LoadError::CourseNotFound(course_id.to_string()))?;

        if snapshot.course_id.is_none() {
            snapshot.course_id = Some(course_id.to_string());
        }
        Ok(snapshot)
    }

    /// Load a module and the course progress side by side
    ///
    /// Progress is optional for the view: a failed progress fetch is kept in
    /// [`ModuleView::progress_error`] and the module is still returned.
    pub async fn load_view(
        &self,
        course_id: &str,
        module_id: &str,
        student_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ModuleView, LoadError> {
        let (module, progress) = tokio::join!(
            self.load_module(module_id, cancel),
            self.load_progress(course_id, student_id, cancel),
        );
        let module = module?;

        let (snapshot, progress_error) = match progress {
            Ok(snapshot) => (Some(snapshot), None),
            Err(e) if e.is_cancelled() => return Err(e),
            Err(LoadError::NotLoggedIn) => (None, None),
            Err(e) => {
                tracing::warn!(course_id, error = %e, "Progress unavailable");
                (None, Some(e))
            }
        };

        Ok(ModuleView { module, snapshot, progress_error })
    }
}
