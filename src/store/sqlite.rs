//! SQLite-backed course catalog

use super::{
    ChunkRef, Course, CourseChunk, CourseOutline, CourseStore, Lesson, SearchResults, StoreError,
    StoreResult,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS courses (
    title TEXT PRIMARY KEY,
    link TEXT,
    instructor TEXT
);

CREATE TABLE IF NOT EXISTS lessons (
    course_title TEXT NOT NULL REFERENCES courses(title),
    number INTEGER NOT NULL,
    title TEXT NOT NULL,
    link TEXT,
    PRIMARY KEY (course_title, number)
);

CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    course_title TEXT NOT NULL,
    lesson_number INTEGER,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title);
";

/// Thread-safe catalog handle
#[derive(Clone)]
pub struct SqliteCatalog {
    conn: Arc<Mutex<Connection>>,
    max_results: usize,
}

impl SqliteCatalog {
    /// Open or create the catalog at the given path
    pub fn open<P: AsRef<Path>>(path: P, max_results: usize) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, max_results)
    }

    /// Open an in-memory catalog (for testing)
    pub fn open_in_memory(max_results: usize) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, max_results)
    }

    fn from_connection(conn: Connection, max_results: usize) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            max_results,
        })
    }

    /// Case-insensitive substring resolution of a course name to its
    /// canonical title. Exact matches win over partial ones.
    fn resolve_course(&self, conn: &Connection, name: &str) -> StoreResult<String> {
        let exact: Option<String> = conn
            .query_row(
                "SELECT title FROM courses WHERE lower(title) = lower(?1)",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(title) = exact {
            return Ok(title);
        }

        let pattern = format!("%{}%", name.to_lowercase());
        conn.query_row(
            "SELECT title FROM courses WHERE lower(title) LIKE ?1 ORDER BY title LIMIT 1",
            params![pattern],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| StoreError::CourseNotFound(name.to_string()))
    }
}

/// Lowercased alphanumeric terms of a free-text query
fn query_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl CourseStore for SqliteCatalog {
    fn search(
        &self,
        query: &str,
        course: Option<&str>,
        lesson_number: Option<u32>,
    ) -> StoreResult<SearchResults> {
        let conn = self.conn.lock().unwrap();

        let resolved = match course {
            Some(name) => Some(self.resolve_course(&conn, name)?),
            None => None,
        };

        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(SearchResults::default());
        }

        // Term matching in document order. Hits match ANY term; there is no
        // relevance scoring.
        let mut sql =
            String::from("SELECT content, course_title, lesson_number FROM chunks WHERE (");
        let mut args: Vec<String> = Vec::new();
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                sql.push_str(" OR ");
            }
            args.push(format!("%{term}%"));
            sql.push_str(&format!("lower(content) LIKE ?{}", args.len()));
        }
        sql.push(')');

        if let Some(title) = &resolved {
            args.push(title.clone());
            sql.push_str(&format!(" AND course_title = ?{}", args.len()));
        }
        if let Some(n) = lesson_number {
            args.push(n.to_string());
            sql.push_str(&format!(" AND lesson_number = ?{}", args.len()));
        }
        sql.push_str(&format!(" ORDER BY id LIMIT {}", self.max_results));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<u32>>(2)?,
            ))
        })?;

        let mut results = SearchResults::default();
        for row in rows {
            let (content, course_title, lesson) = row?;
            results.documents.push(content);
            results.metadata.push(ChunkRef {
                course_title,
                lesson_number: lesson,
            });
        }
        Ok(results)
    }

    fn outline(&self, course: &str) -> StoreResult<CourseOutline> {
        let conn = self.conn.lock().unwrap();
        let title = self.resolve_course(&conn, course)?;

        let link: Option<String> = conn.query_row(
            "SELECT link FROM courses WHERE title = ?1",
            params![title],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "SELECT number, title, link FROM lessons WHERE course_title = ?1 ORDER BY number",
        )?;
        let lessons = stmt
            .query_map(params![title], |row| {
                Ok(Lesson {
                    number: row.get(0)?,
                    title: row.get(1)?,
                    link: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CourseOutline {
            title,
            link,
            lessons,
        })
    }

    fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT link FROM lessons WHERE course_title = ?1 AND number = ?2",
            params![course_title, lesson_number],
            |row| row.get(0),
        )
        .optional()
        .ok()
        .flatten()
        .flatten()
    }

    fn add_course(&self, course: &Course, chunks: &[CourseChunk]) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT OR REPLACE INTO courses (title, link, instructor) VALUES (?1, ?2, ?3)",
            params![course.title, course.link, course.instructor],
        )?;
        tx.execute(
            "DELETE FROM lessons WHERE course_title = ?1",
            params![course.title],
        )?;
        tx.execute(
            "DELETE FROM chunks WHERE course_title = ?1",
            params![course.title],
        )?;

        for lesson in &course.lessons {
            tx.execute(
                "INSERT INTO lessons (course_title, number, title, link) VALUES (?1, ?2, ?3, ?4)",
                params![course.title, lesson.number, lesson.title, lesson.link],
            )?;
        }
        for chunk in chunks {
            tx.execute(
                "INSERT INTO chunks (course_title, lesson_number, chunk_index, content) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    chunk.course_title,
                    chunk.lesson_number,
                    chunk.chunk_index,
                    chunk.content
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn course_titles(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT title FROM courses ORDER BY title")?;
        let titles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(titles)
    }

    fn course_count(&self) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn contains_course(&self, title: &str) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM courses WHERE title = ?1",
            params![title],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
