//! Scholar - course progress for LMS students, in the terminal
//!
//! Scholar loads a course module from an LMS REST API, normalizes its
//! inconsistent response envelopes, evaluates what the student has
//! completed and links every item to its page.

pub mod api;
pub mod app;
pub mod config;
pub mod course;
pub mod theme;
pub mod ui;

pub use api::{CourseApi, LmsClient};
pub use app::App;
pub use config::{Config, Session};
pub use theme::Theme;
