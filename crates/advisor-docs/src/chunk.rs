//! Greedy word-count chunking.

/// Default chunk cap, in words.
pub const DEFAULT_MAX_WORDS: usize = 800;

/// Split `text` on whitespace and pack the words greedily into chunks of at
/// most `max_words` words, each joined by single spaces.
///
/// Words are never split, so joining the chunks with spaces reproduces the
/// input's word sequence. Blank input yields no chunks. A cap of 0 is
/// treated as 1.
pub fn chunk_words(text: &str, max_words: usize) -> Vec<String> {
    let max_words = max_words.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::with_capacity(max_words.min(1024));

    for word in text.split_whitespace() {
        if current.len() + 1 > max_words {
            chunks.push(current.join(" "));
            current.clear();
        }
        current.push(word);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }
    chunks
}
