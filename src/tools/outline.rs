//! Course outline tool

use super::{Source, Tool, ToolError};
use crate::store::{CourseStore, StoreError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Write;
use std::sync::{Arc, Mutex};

#[derive(Debug, Deserialize)]
struct OutlineInput {
    course_title: String,
}

/// Return a course's title, link, and numbered lesson list
pub struct CourseOutlineTool {
    store: Arc<dyn CourseStore>,
    last_sources: Mutex<Vec<Source>>,
}

impl CourseOutlineTool {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self {
            store,
            last_sources: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn name(&self) -> &str {
        "get_course_outline"
    }

    fn description(&self) -> String {
        "Get a course outline: title, link, and the complete lesson list".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "course_title": {
                    "type": "string",
                    "description": "Course title (partial matches work)"
                }
            },
            "required": ["course_title"]
        })
    }

    async fn run(&self, input: Value) -> Result<String, ToolError> {
        let input: OutlineInput =
            serde_json::from_value(input).map_err(|e| ToolError::InvalidArguments {
                tool: self.name().to_string(),
                message: e.to_string(),
            })?;

        let outline = match self.store.outline(&input.course_title) {
            Ok(o) => o,
            Err(e @ StoreError::CourseNotFound(_)) => return Ok(e.to_string()),
            Err(e) => return Err(ToolError::Failed(e.to_string())),
        };

        let mut out = format!("Course: {}", outline.title);
        if let Some(link) = &outline.link {
            let _ = write!(out, "\nLink: {link}");
        }
        let _ = write!(out, "\nLessons ({}):", outline.lessons.len());
        for lesson in &outline.lessons {
            let _ = write!(out, "\n{}. {}", lesson.number, lesson.title);
        }

        *self.last_sources.lock().unwrap() = vec![Source {
            text: outline.title.clone(),
            link: outline.link.clone(),
        }];

        Ok(out)
    }

    fn last_sources(&self) -> Vec<Source> {
        self.last_sources.lock().unwrap().clone()
    }

    fn reset_sources(&self) {
        self.last_sources.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{
        Course, CourseChunk, CourseOutline, Lesson, SearchResults, StoreError, StoreResult,
    };

    struct OutlineStore {
        outline: Option<CourseOutline>,
    }

    impl CourseStore for OutlineStore {
        fn search(
            &self,
            _query: &str,
            _course: Option<&str>,
            _lesson_number: Option<u32>,
        ) -> StoreResult<SearchResults> {
            Ok(SearchResults::default())
        }

        fn outline(&self, course: &str) -> StoreResult<CourseOutline> {
            self.outline
                .clone()
                .ok_or_else(|| StoreError::CourseNotFound(course.to_string()))
        }

        fn lesson_link(&self, _course_title: &str, _lesson_number: u32) -> Option<String> {
            None
        }

        fn add_course(&self, _course: &Course, _chunks: &[CourseChunk]) -> StoreResult<()> {
            Ok(())
        }

        fn course_titles(&self) -> StoreResult<Vec<String>> {
            Ok(Vec::new())
        }

        fn course_count(&self) -> StoreResult<usize> {
            Ok(0)
        }

        fn contains_course(&self, _title: &str) -> StoreResult<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn outline_lists_title_link_and_lessons() {
        let store = OutlineStore {
            outline: Some(CourseOutline {
                title: "MCP Course".to_string(),
                link: Some("https://example.com/mcp".to_string()),
                lessons: vec![
                    Lesson {
                        number: 0,
                        title: "Welcome".to_string(),
                        link: None,
                    },
                    Lesson {
                        number: 1,
                        title: "Servers".to_string(),
                        link: None,
                    },
                ],
            }),
        };
        let tool = CourseOutlineTool::new(Arc::new(store));

        let out = tool
            .run(json!({"course_title": "MCP"}))
            .await
            .unwrap();

        assert!(out.contains("Course: MCP Course"));
        assert!(out.contains("Link: https://example.com/mcp"));
        assert!(out.contains("Lessons (2):"));
        assert!(out.contains("0. Welcome"));
        assert!(out.contains("1. Servers"));

        let sources = tool.last_sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].text, "MCP Course");
        assert_eq!(sources[0].link.as_deref(), Some("https://example.com/mcp"));
    }

    #[tokio::test]
    async fn unknown_course_becomes_text() {
        let tool = CourseOutlineTool::new(Arc::new(OutlineStore { outline: None }));
        let out = tool.run(json!({"course_title": "Ghost"})).await.unwrap();
        assert_eq!(out, "No course found matching 'Ghost'");
    }

    #[tokio::test]
    async fn missing_course_title_is_invalid_arguments() {
        let tool = CourseOutlineTool::new(Arc::new(OutlineStore { outline: None }));
        let err = tool.run(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
