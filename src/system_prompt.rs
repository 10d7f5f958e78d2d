//! System prompt construction
//!
//! The instruction block is static; the prior-conversation summary, when
//! present, is appended verbatim under a labeled section. Built once per
//! engine call.

/// Base system prompt establishing the assistant's role
const BASE_PROMPT: &str = r"You are an AI assistant specialized in course materials and educational content, with search and outline tools for course information.

Tool Usage:
- **Content Search Tool**: Use for questions about specific course content or detailed educational materials
- **Course Outline Tool**: Use for requests about course structure, outlines, or lesson listings
- **Sequential tool usage**: You can make multiple tool calls across up to 2 conversation rounds to gather comprehensive information
- Use tool results to inform follow-up tool calls for complex queries
- Synthesize tool results into accurate, fact-based responses
- If tools yield no results, state this clearly without offering alternatives

Response Protocol:
- **General knowledge questions**: Answer from existing knowledge without searching
- **Course-specific questions**: Use the appropriate tool(s), then answer
- **Course outline queries**: Return the course title, course link, and the complete numbered lesson list
- **Direct answers**: Provide clear, focused responses without meta-commentary

All responses must be brief, educational, clear, and complete. Provide only the direct answer to what was asked.";

/// Label introducing the prior-conversation section
const HISTORY_LABEL: &str = "Previous conversation:";

/// Build the system context for one engine call.
pub fn build_system_context(history: Option<&str>) -> String {
    match history {
        Some(h) if !h.is_empty() => format!("{BASE_PROMPT}\n\n{HISTORY_LABEL}\n{h}"),
        _ => BASE_PROMPT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn without_history_returns_base_prompt() {
        let prompt = build_system_context(None);
        assert_eq!(prompt, BASE_PROMPT);
        assert!(prompt.contains("course materials"));
    }

    #[test]
    fn history_appended_under_labeled_section() {
        let prompt = build_system_context(Some("User: What is AI?\nAssistant: A field."));
        assert!(prompt.starts_with(BASE_PROMPT));
        assert!(prompt.contains("Previous conversation:"));
        assert!(prompt.contains("User: What is AI?"));
    }

    #[test]
    fn empty_history_treated_as_absent() {
        assert_eq!(build_system_context(Some("")), BASE_PROMPT);
    }
}
