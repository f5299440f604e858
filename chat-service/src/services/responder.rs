//! Keyword responder used when the hosted pipeline cannot answer.
//!
//! Matching is a plain substring test on the lowercased query, checked in a
//! fixed priority order. No tokenization or locale handling.

pub const NO_ANSWER: &str = "I'm sorry, I couldn't find a specific answer to your question. \
Try asking for a summary, the key findings, or the conclusions of the document.";

/// Canned answer for `query` about `document_name`.
pub fn respond(query: &str, document_name: &str) -> String {
    let query = query.to_lowercase();

    if query.contains("summary") || query.contains("summarize") {
        format!(
            "Here's a summary of {}: the document introduces its subject, walks through \
the supporting material, and closes with its main takeaways.",
            document_name
        )
    } else if query.contains("key finding") || query.contains("main point") {
        format!(
            "The key findings in {} are the central results the document reports, \
together with the evidence offered for each of them.",
            document_name
        )
    } else if query.contains("conclusion") {
        format!(
            "The conclusions of {} restate its main results and describe what they \
mean for the questions it set out to answer.",
            document_name
        )
    } else {
        NO_ANSWER.to_string()
    }
}
