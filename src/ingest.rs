//! Course document parsing and chunking
//!
//! Course transcripts are plain text with a header block followed by lesson
//! sections:
//!
//! ```text
//! Course Title: Example Course
//! Course Link: https://example.com/course
//! Course Instructor: Jane Doe
//!
//! Lesson 0: Introduction
//! Lesson Link: https://example.com/lesson0
//! Transcript text...
//! ```

use crate::store::{Course, CourseChunk, Lesson};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Document has no 'Course Title:' header")]
    MissingTitle,
}

/// Parse a course document into its course record and content chunks
pub fn parse_course_document(
    path: &Path,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<(Course, Vec<CourseChunk>), IngestError> {
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_course_text(&text, chunk_size, chunk_overlap)
}

/// Parse course text (see module docs for the format)
pub fn parse_course_text(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<(Course, Vec<CourseChunk>), IngestError> {
    let mut title = None;
    let mut course_link = None;
    let mut instructor = None;
    let mut lessons: Vec<Lesson> = Vec::new();

    // (lesson_number, accumulated text)
    let mut sections: Vec<(Option<u32>, String)> = vec![(None, String::new())];

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(value) = trimmed.strip_prefix("Course Title:") {
            title = Some(value.trim().to_string());
        } else if let Some(value) = trimmed.strip_prefix("Course Link:") {
            course_link = Some(value.trim().to_string());
        } else if let Some(value) = trimmed.strip_prefix("Course Instructor:") {
            instructor = Some(value.trim().to_string());
        } else if let Some((number, lesson_title)) = parse_lesson_marker(trimmed) {
            lessons.push(Lesson {
                number,
                title: lesson_title,
                link: None,
            });
            sections.push((Some(number), String::new()));
        } else if let Some(value) = trimmed.strip_prefix("Lesson Link:") {
            if let Some(lesson) = lessons.last_mut() {
                lesson.link = Some(value.trim().to_string());
            }
        } else {
            let section = sections.last_mut().expect("sections is never empty");
            if !trimmed.is_empty() {
                if !section.1.is_empty() {
                    section.1.push(' ');
                }
                section.1.push_str(trimmed);
            }
        }
    }

    let title = title.ok_or(IngestError::MissingTitle)?;

    let course = Course {
        title: title.clone(),
        link: course_link,
        instructor,
        lessons,
    };

    let mut chunks = Vec::new();
    for (lesson_number, content) in &sections {
        if content.is_empty() {
            continue;
        }
        for piece in chunk_text(content, chunk_size, chunk_overlap) {
            chunks.push(CourseChunk {
                content: piece,
                course_title: title.clone(),
                lesson_number: *lesson_number,
                chunk_index: chunks.len(),
            });
        }
    }

    Ok((course, chunks))
}

/// `Lesson N: Title` → `(N, Title)`
fn parse_lesson_marker(line: &str) -> Option<(u32, String)> {
    let rest = line.strip_prefix("Lesson ")?;
    let colon = rest.find(':')?;
    let number: u32 = rest[..colon].trim().parse().ok()?;
    let title = rest[colon + 1..].trim();
    if title.is_empty() {
        return None;
    }
    Some((number, title.to_string()))
}

/// Split text into sentences on `.`, `!`, `?` followed by whitespace
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if matches!(bytes[i], b'.' | b'!' | b'?')
            && bytes.get(i + 1).is_none_or(|b| b.is_ascii_whitespace())
        {
            let sentence = text[start..=i].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = i + 1;
        }
        i += 1;
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Pack sentences into chunks of at most `chunk_size` characters, carrying
/// up to `overlap` characters of trailing sentences into the next chunk.
/// A single sentence longer than `chunk_size` becomes its own chunk.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let sentences = split_sentences(text);
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for sentence in sentences {
        let added = sentence.len() + usize::from(!current.is_empty());
        if current_len + added > chunk_size && !current.is_empty() {
            chunks.push(current.join(" "));

            // Carry trailing sentences into the next chunk for continuity
            let mut carried: Vec<&str> = Vec::new();
            let mut carried_len = 0;
            for prev in current.iter().rev() {
                if carried_len + prev.len() > overlap {
                    break;
                }
                carried_len += prev.len() + 1;
                carried.insert(0, prev);
            }
            current = carried;
            current_len = carried_len.saturating_sub(1);
        }
        current_len += sentence.len() + usize::from(!current.is_empty());
        current.push(sentence);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}
