//! RAG system wiring
//!
//! Owns the catalog, tool registry, engine, and sessions, and exposes the
//! query surface the API handlers call.

use crate::engine::AnswerEngine;
use crate::ingest;
use crate::session::SessionManager;
use crate::store::CourseStore;
use crate::tools::{CourseOutlineTool, SearchContentTool, Source, ToolRegistry};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Catalog statistics for the analytics endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

pub struct RagSystem {
    store: Arc<dyn CourseStore>,
    engine: AnswerEngine,
    tools: ToolRegistry,
    pub sessions: SessionManager,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RagSystem {
    pub fn new(
        store: Arc<dyn CourseStore>,
        engine: AnswerEngine,
        sessions: SessionManager,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(SearchContentTool::new(store.clone())));
        tools.register(Arc::new(CourseOutlineTool::new(store.clone())));

        Self {
            store,
            engine,
            tools,
            sessions,
            chunk_size,
            chunk_overlap,
        }
    }

    /// Answer a user query, with session history when a session is given.
    /// Returns the answer plus the sources the tools consulted.
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> (String, Vec<Source>) {
        let prompt = format!("Answer this question about course materials: {query}");
        let history = session_id.and_then(|id| self.sessions.history(id));

        let answer = self
            .engine
            .answer(&prompt, history.as_deref(), Some(&self.tools))
            .await;

        let sources = self.tools.last_sources();
        self.tools.reset_sources();

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, query, &answer);
        }

        (answer, sources)
    }

    /// Index one course document. Returns the course and its chunk count.
    #[allow(dead_code)] // Single-document ingestion, used in tests
    pub fn add_course_document(
        &self,
        path: &Path,
    ) -> Result<(crate::store::Course, usize), String> {
        let (course, chunks) =
            ingest::parse_course_document(path, self.chunk_size, self.chunk_overlap)
                .map_err(|e| e.to_string())?;
        self.store
            .add_course(&course, &chunks)
            .map_err(|e| e.to_string())?;
        Ok((course, chunks.len()))
    }

    /// Index every course document in a folder, skipping already-indexed
    /// titles. A file that fails to parse logs and contributes nothing.
    pub fn add_course_folder(&self, folder: &Path) -> (usize, usize) {
        let mut total_courses = 0;
        let mut total_chunks = 0;

        let Ok(entries) = std::fs::read_dir(folder) else {
            tracing::warn!(path = %folder.display(), "course folder not readable, skipping ingestion");
            return (0, 0);
        };

        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| matches!(e.to_lowercase().as_str(), "txt" | "pdf" | "docx"))
            })
            .collect();
        paths.sort();

        for path in paths {
            match ingest::parse_course_document(&path, self.chunk_size, self.chunk_overlap) {
                Ok((course, chunks)) => {
                    match self.store.contains_course(&course.title) {
                        Ok(true) => {
                            tracing::debug!(course = %course.title, "already indexed, skipping");
                            continue;
                        }
                        Ok(false) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "catalog lookup failed");
                            continue;
                        }
                    }
                    match self.store.add_course(&course, &chunks) {
                        Ok(()) => {
                            tracing::info!(
                                course = %course.title,
                                chunks = chunks.len(),
                                "indexed course"
                            );
                            total_courses += 1;
                            total_chunks += chunks.len();
                        }
                        Err(e) => {
                            tracing::error!(course = %course.title, error = %e, "failed to index course");
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "failed to parse course document");
                }
            }
        }

        (total_courses, total_chunks)
    }

    pub fn analytics(&self) -> Result<CourseAnalytics, String> {
        Ok(CourseAnalytics {
            total_courses: self.store.course_count().map_err(|e| e.to_string())?,
            course_titles: self.store.course_titles().map_err(|e| e.to_string())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{text_reply, tool_reply, MockLlm};
    use crate::session::SessionManager;
    use crate::store::SqliteCatalog;
    use serde_json::json;

    fn rag_with_llm(llm: &Arc<MockLlm>) -> RagSystem {
        let store = Arc::new(SqliteCatalog::open_in_memory(5).unwrap());
        RagSystem::new(
            store,
            AnswerEngine::new(llm.clone()),
            SessionManager::new(2),
            800,
            100,
        )
    }

    fn rag_with_sample_course(llm: &Arc<MockLlm>) -> RagSystem {
        let rag = rag_with_llm(llm);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("course.txt");
        std::fs::write(
            &path,
            "Course Title: AI Fundamentals\n\
             Course Link: https://example.com/ai\n\
             Lesson 1: Basics\n\
             Lesson Link: https://example.com/ai/1\n\
             Machine learning is everywhere today.\n",
        )
        .unwrap();
        rag.add_course_document(&path).unwrap();
        rag
    }

    #[tokio::test]
    async fn query_wraps_prompt_and_offers_tools() {
        let llm = Arc::new(MockLlm::new());
        llm.queue_reply(text_reply("Paris."));
        let rag = rag_with_llm(&llm);

        let (answer, sources) = rag.query("What is the capital of France?", None).await;

        assert_eq!(answer, "Paris.");
        assert!(sources.is_empty());

        let requests = llm.recorded_requests();
        assert_eq!(requests.len(), 1);
        let user_text = match &requests[0].messages[0].content[0] {
            crate::llm::ContentBlock::Text { text } => text.clone(),
            other => panic!("expected text, got {other:?}"),
        };
        assert_eq!(
            user_text,
            "Answer this question about course materials: What is the capital of France?"
        );
        // Both tools are always on offer; the backend decides.
        let names: Vec<_> = requests[0].tools.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"search_course_content"));
        assert!(names.contains(&"get_course_outline"));
    }

    #[tokio::test]
    async fn query_collects_and_resets_sources() {
        let llm = Arc::new(MockLlm::new());
        llm.queue_reply(tool_reply(&[(
            "t1",
            "search_course_content",
            json!({"query": "machine learning"}),
        )]));
        llm.queue_reply(text_reply("ML is covered in lesson 1."));
        let rag = rag_with_sample_course(&llm);

        let (answer, sources) = rag.query("Where is ML covered?", None).await;

        assert_eq!(answer, "ML is covered in lesson 1.");
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].text, "AI Fundamentals - Lesson 1");
        assert_eq!(sources[0].link.as_deref(), Some("https://example.com/ai/1"));

        // Sources were reset after collection
        assert!(rag.tools.last_sources().is_empty());
    }

    #[tokio::test]
    async fn session_history_reaches_the_next_query() {
        let llm = Arc::new(MockLlm::new());
        llm.queue_reply(text_reply("first answer"));
        llm.queue_reply(text_reply("second answer"));
        let rag = rag_with_llm(&llm);

        let session = rag.sessions.create_session();
        rag.query("first question", Some(&session)).await;
        rag.query("second question", Some(&session)).await;

        let requests = llm.recorded_requests();
        assert!(!requests[0].system.contains("Previous conversation:"));
        assert!(requests[1].system.contains("Previous conversation:"));
        assert!(requests[1].system.contains("User: first question"));
        assert!(requests[1].system.contains("Assistant: first answer"));
    }

    #[tokio::test]
    async fn folder_ingestion_skips_existing_courses() {
        let llm = Arc::new(MockLlm::new());
        let rag = rag_with_llm(&llm);

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.txt"),
            "Course Title: Course A\nLesson 1: One\nSome content here.\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.md"), "not a course").unwrap();

        let (courses, chunks) = rag.add_course_folder(dir.path());
        assert_eq!(courses, 1);
        assert!(chunks >= 1);

        // Second pass: nothing new
        let (courses, chunks) = rag.add_course_folder(dir.path());
        assert_eq!(courses, 0);
        assert_eq!(chunks, 0);
    }

    #[tokio::test]
    async fn folder_ingestion_isolates_bad_files() {
        let llm = Arc::new(MockLlm::new());
        let rag = rag_with_llm(&llm);

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.txt"), "no headers at all").unwrap();
        std::fs::write(
            dir.path().join("good.txt"),
            "Course Title: Good Course\nLesson 1: One\nValid content.\n",
        )
        .unwrap();

        let (courses, _) = rag.add_course_folder(dir.path());
        assert_eq!(courses, 1);

        let analytics = rag.analytics().unwrap();
        assert_eq!(analytics.course_titles, vec!["Good Course"]);
    }

    #[tokio::test]
    async fn missing_folder_ingests_nothing() {
        let llm = Arc::new(MockLlm::new());
        let rag = rag_with_llm(&llm);
        let (courses, chunks) = rag.add_course_folder(Path::new("/nonexistent"));
        assert_eq!(courses, 0);
        assert_eq!(chunks, 0);
    }

    #[tokio::test]
    async fn analytics_reports_count_and_titles() {
        let llm = Arc::new(MockLlm::new());
        let rag = rag_with_sample_course(&llm);

        let analytics = rag.analytics().unwrap();
        assert_eq!(analytics.total_courses, 1);
        assert_eq!(analytics.course_titles, vec!["AI Fundamentals"]);
    }
}
