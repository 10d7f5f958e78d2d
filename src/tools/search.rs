//! Course content search tool

use super::{Source, Tool, ToolError};
use crate::store::{CourseStore, SearchResults, StoreError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Write;
use std::sync::{Arc, Mutex};

#[derive(Debug, Deserialize)]
struct SearchInput {
    query: String,
    course_name: Option<String>,
    lesson_number: Option<u32>,
}

/// Search course chunk content with optional course and lesson filters
pub struct SearchContentTool {
    store: Arc<dyn CourseStore>,
    last_sources: Mutex<Vec<Source>>,
}

impl SearchContentTool {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self {
            store,
            last_sources: Mutex::new(Vec::new()),
        }
    }

    fn empty_message(input: &SearchInput) -> String {
        let mut msg = String::from("No relevant content found");
        if let Some(course) = &input.course_name {
            let _ = write!(msg, " in course '{course}'");
        }
        if let Some(lesson) = input.lesson_number {
            let _ = write!(msg, " in lesson {lesson}");
        }
        msg.push('.');
        msg
    }

    /// Render hits with `[Course - Lesson N]` headers and record sources
    fn format_results(&self, results: &SearchResults) -> String {
        let mut sources = Vec::new();
        let mut formatted = Vec::new();

        for (document, meta) in results.documents.iter().zip(&results.metadata) {
            let course = if meta.course_title.is_empty() {
                "unknown"
            } else {
                meta.course_title.as_str()
            };

            let mut header = format!("[{course}");
            let mut source_text = course.to_string();
            if let Some(lesson) = meta.lesson_number {
                let _ = write!(header, " - Lesson {lesson}");
                let _ = write!(source_text, " - Lesson {lesson}");
            }
            header.push(']');

            let link = meta
                .lesson_number
                .and_then(|n| self.store.lesson_link(&meta.course_title, n));
            sources.push(Source {
                text: source_text,
                link,
            });

            formatted.push(format!("{header}\n{document}"));
        }

        *self.last_sources.lock().unwrap() = sources;
        formatted.join("\n\n")
    }
}

#[async_trait]
impl Tool for SearchContentTool {
    fn name(&self) -> &str {
        "search_course_content"
    }

    fn description(&self) -> String {
        "Search course materials with smart course name matching and lesson filtering".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to search for in the course content"
                },
                "course_name": {
                    "type": "string",
                    "description": "Course title (partial matches work, e.g. 'MCP')"
                },
                "lesson_number": {
                    "type": "integer",
                    "description": "Specific lesson number to search within"
                }
            },
            "required": ["query"]
        })
    }

    async fn run(&self, input: Value) -> Result<String, ToolError> {
        let input: SearchInput =
            serde_json::from_value(input).map_err(|e| ToolError::InvalidArguments {
                tool: self.name().to_string(),
                message: e.to_string(),
            })?;

        let results = match self.store.search(
            &input.query,
            input.course_name.as_deref(),
            input.lesson_number,
        ) {
            Ok(r) => r,
            // An unresolvable course name is an answerable outcome, not a
            // failure; the backend can relay it.
            Err(e @ StoreError::CourseNotFound(_)) => return Ok(e.to_string()),
            Err(e) => return Err(ToolError::Failed(e.to_string())),
        };

        if results.is_empty() {
            return Ok(Self::empty_message(&input));
        }

        Ok(self.format_results(&results))
    }

    fn last_sources(&self) -> Vec<Source> {
        self.last_sources.lock().unwrap().clone()
    }

    fn reset_sources(&self) {
        self.last_sources.lock().unwrap().clear();
    }
}
