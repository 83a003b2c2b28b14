//! Splitting model replies into pieces a synthesis call accepts.

const SENTENCE_END: [char; 3] = ['.', '!', '?'];

/// Splits `text` into trimmed, non-empty chunks of at most `max_chars`
/// characters, preferring sentence boundaries.
///
/// While the remainder is too long, the cut is placed after the last `.`,
/// `!` or `?` inside the first `max_chars` characters; failing that, at the
/// last space in that window; failing that, exactly at `max_chars`.
/// Lengths are counted in `char`s, so a cut never splits a code point.
/// A `max_chars` of zero is treated as one.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text.trim();

    while rest.chars().count() > max_chars {
        // Byte offset just past the window of `max_chars` characters.
        let window_end = rest
            .char_indices()
            .nth(max_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let window = &rest[..window_end];

        let (head, tail) = if let Some(idx) = window.rfind(SENTENCE_END) {
            // Punctuation is ASCII, so idx + 1 is a char boundary.
            rest.split_at(idx + 1)
        } else if let Some(idx) = window.rfind(' ') {
            (&rest[..idx], &rest[idx + 1..])
        } else {
            rest.split_at(window_end)
        };

        let head = head.trim_end();
        if !head.is_empty() {
            chunks.push(head.to_string());
        }
        rest = tail.trim_start();
    }

    if !rest.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}
