//! Session state persistence
//!
//! Holds the logged-in student and a few conveniences for resuming work:
//! cached course summaries and the last module visited. Nothing here is
//! authoritative; the backend is.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::Config;

/// Cached summary of a course the student has opened
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseSummary {
    /// Course identifier
    pub id: String,
    /// Course title, when known
    pub title: Option<String>,
    /// Last seen course-level percentage
    pub percentage: u32,
}

/// Course and module to reopen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub course_id: String,
    pub module_id: String,
}

/// All session state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Logged-in student
    pub student_id: Option<String>,
    /// Most recently opened courses first
    pub courses: Vec<CourseSummary>,
    /// Where the last browse left off
    pub last_visit: Option<Visit>,
}

impl Session {
    /// Load session from disk
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::session_path()?)
    }

    /// Load session from a specific file, empty if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read session from {:?}", path))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {:?}", path))
        } else {
            Ok(Self::default())
        }
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::session_path()?)
    }

    /// Save session to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize session")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write session to {:?}", path))?;

        Ok(())
    }

    /// Get the path to the session file
    fn session_path() -> Result<PathBuf> {
        Ok(Config::data_dir()?.join("session.json"))
    }

    /// Start a session for a student
    ///
    /// Switching students drops the previous student's cached state.
    pub fn login(&mut self, student_id: impl Into<String>) {
        let student_id = student_id.into();
        if self.student_id.as_deref() != Some(student_id.as_str()) {
            self.courses.clear();
            self.last_visit = None;
        }
        self.student_id = Some(student_id);
    }

    /// End the session and forget everything cached for it
    pub fn logout(&mut self) {
        *self = Self::default();
    }

    /// Current student, if logged in
    pub fn student_id(&self) -> Option<&str> {
        self.student_id.as_deref()
    }

    /// Record a course summary, moving it to the front
    pub fn remember_course(&mut self, summary: CourseSummary) {
        self.courses.retain(|c| c.id != summary.id);
        self.courses.insert(0, summary);
    }

    /// Record the module being browsed
    pub fn visit(&mut self, course_id: impl Into<String>, module_id: impl Into<String>) {
        self.last_visit =
            Some(Visit { course_id: course_id.into(), module_id: module_id.into() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn summary(id: &str, percentage: u32) -> CourseSummary {
        CourseSummary { id: id.into(), title: None, percentage }
    }

    #[test]
    fn session_default_is_logged_out() {
        let session = Session::default();
        assert!(session.student_id().is_none());
        assert!(session.courses.is_empty());
    }

    #[test]
    fn login_and_logout() {
        let mut session = Session::default();
        session.login("stu-1");
        session.remember_course(summary("c1", 10));
        session.visit("c1", "m1");
        assert_eq!(session.student_id(), Some("stu-1"));

        session.logout();
        assert!(session.student_id().is_none());
        assert!(session.courses.is_empty());
        assert!(session.last_visit.is_none());
    }

    #[test]
    fn switching_student_clears_cache() {
        let mut session = Session::default();
        session.login("stu-1");
        session.remember_course(summary("c1", 10));

        session.login("stu-1");
        assert_eq!(session.courses.len(), 1);

        session.login("stu-2");
        assert!(session.courses.is_empty());
    }

    #[test]
    fn remember_course_moves_to_front() {
        let mut session = Session::default();
        session.remember_course(summary("c1", 10));
        session.remember_course(summary("c2", 20));
        session.remember_course(summary("c1", 55));

        assert_eq!(session.courses, vec![summary("c1", 55), summary("c2", 20)]);
    }

    #[test]
    fn session_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = Session::default();
        session.login("stu-9");
        session.visit("c1", "m2");
        session.save_to(&path).unwrap();

        let loaded = Session::load_from(&path).unwrap();
        assert_eq!(loaded.student_id(), Some("stu-9"));
        assert_eq!(loaded.last_visit, Some(Visit { course_id: "c1".into(), module_id: "m2".into() }));
    }

    #[test]
    fn missing_file_is_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(session.student_id().is_none());
    }
}
