//! Bounded-size text chunking.
//!
//! Greedy forward scan: take a window of at most `max_chars` characters,
//! cut at the last newline in the window, else the last space, else the
//! hard window boundary. The cursor advances to the cut point, so no text
//! is skipped and concatenating all chunks reproduces the input modulo
//! whitespace.

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Each chunk is trimmed; empty chunks are dropped. A cut point that does
/// not advance past the window start falls back to the hard boundary,
/// which guarantees forward progress even for text without any
/// whitespace.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let max = max_chars.max(1);

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < len {
        let end = (start + max).min(len);
        let window = &chars[start..end];

        let mut cut = window
            .iter()
            .rposition(|&c| c == '\n')
            .map(|i| start + i)
            .unwrap_or(start);
        if cut <= start {
            cut = window
                .iter()
                .rposition(|&c| c == ' ')
                .map(|i| start + i)
                .unwrap_or(start);
        }
        if cut <= start {
            cut = end;
        }

        let chunk: String = chars[start..cut].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        start = cut;
    }

    chunks
}
