//! Course catalog and chunk retrieval
//!
//! The engine never sees this layer; tools query it through the
//! [`CourseStore`] trait and hand the backend plain text.

pub mod sqlite;

pub use sqlite::SqliteCatalog;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("No course found matching '{0}'")]
    CourseNotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A course with its lesson structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    pub link: Option<String>,
    pub instructor: Option<String>,
    pub lessons: Vec<Lesson>,
}

/// A single lesson within a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub number: u32,
    pub title: String,
    pub link: Option<String>,
}

/// A chunk of course content, addressable by course and lesson
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseChunk {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    pub chunk_index: usize,
}

/// One retrieval hit: the chunk text plus where it came from
#[derive(Debug, Clone)]
pub struct ChunkRef {
    pub course_title: String,
    pub lesson_number: Option<u32>,
}

/// Ordered retrieval results
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub metadata: Vec<ChunkRef>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Course structure as returned by the outline tool
#[derive(Debug, Clone)]
pub struct CourseOutline {
    pub title: String,
    pub link: Option<String>,
    pub lessons: Vec<Lesson>,
}

/// Retrieval interface the tools depend on.
///
/// Implementations retrieve by plain term matching in document order; result
/// scoring is deliberately absent.
pub trait CourseStore: Send + Sync {
    /// Search chunk content, optionally filtered by course and lesson.
    /// `course` is resolved fuzzily (case-insensitive substring).
    fn search(
        &self,
        query: &str,
        course: Option<&str>,
        lesson_number: Option<u32>,
    ) -> StoreResult<SearchResults>;

    /// Resolve a course name and return its outline
    fn outline(&self, course: &str) -> StoreResult<CourseOutline>;

    /// Link for a specific lesson, if the course records one
    fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String>;

    /// Add a course and its content chunks to the catalog
    fn add_course(&self, course: &Course, chunks: &[CourseChunk]) -> StoreResult<()>;

    /// Titles of all indexed courses
    fn course_titles(&self) -> StoreResult<Vec<String>>;

    /// Number of indexed courses
    fn course_count(&self) -> StoreResult<usize>;

    /// Whether a course with this exact title is already indexed
    fn contains_course(&self, title: &str) -> StoreResult<bool>;
}
