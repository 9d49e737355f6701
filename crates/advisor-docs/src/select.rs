//! Keyword-based chunk selection.

/// Default number of chunks kept for the prompt.
pub const DEFAULT_MAX_CHUNKS: usize = 4;

/// Return the chunks that mention any word of `question`, in their original
/// order, keeping at most `limit` of them.
///
/// Matching is a case-insensitive literal substring test, so "lucro" also
/// matches "lucros". A blank question matches nothing.
pub fn select_relevant<'a, S: AsRef<str>>(
    question: &str,
    chunks: &'a [S],
    limit: usize,
) -> Vec<&'a str> {
    let question = question.to_lowercase();
    let keywords: Vec<&str> = question.split_whitespace().collect();
    if keywords.is_empty() {
        return Vec::new();
    }

    chunks
        .iter()
        .map(AsRef::as_ref)
        .filter(|chunk| {
            let haystack = chunk.to_lowercase();
            keywords.iter().any(|k| haystack.contains(k))
        })
        .take(limit)
        .collect()
}
