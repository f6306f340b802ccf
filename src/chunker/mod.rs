//! Splits a document into overlapping, sentence-aligned chunks.

/// Sentence-ending punctuation the chunker prefers to break on.
const SENTENCE_ENDERS: [char; 3] = ['.', '。', '\n'];

/// Splits `text` into chunks of approximately `chunk_size` characters,
/// carrying `chunk_overlap` characters between consecutive chunks.
/// Prefers to break on a sentence boundary near the target size, never
/// splits inside a codepoint, and preserves chunk order.
pub fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let chunk_size = chunk_size.max(1);
    let overlap = chunk_overlap.min(chunk_size.saturating_sub(1));

    let indices: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let len = text.len();

    let mut chunks = Vec::new();
    let mut start_char = 0usize;

    while start_char < indices.len() {
        let start_byte = indices[start_char];
        let target_char = (start_char + chunk_size).min(indices.len());
        let target_byte = indices.get(target_char).copied().unwrap_or(len);

        let end_byte = if target_byte >= len {
            len
        } else {
            find_sentence_boundary(text, start_byte, target_byte).unwrap_or(target_byte)
        };

        let slice = &text[start_byte..end_byte];
        let trimmed = slice.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        if end_byte >= len {
            break;
        }

        let end_char = text[..end_byte].chars().count();
        let next_start_char = end_char.saturating_sub(overlap);
        if next_start_char <= start_char {
            start_char += 1;
        } else {
            start_char = next_start_char;
        }
    }

    chunks
}

/// Searches backward from `target_byte` (toward `start_byte`) for a
/// sentence-ending codepoint boundary to split on, so the cut lands on
/// a sentence edge rather than mid-sentence. Falls back to `None` if no
/// boundary is found in the searched window.
fn find_sentence_boundary(text: &str, start_byte: usize, target_byte: usize) -> Option<usize> {
    let window_start = start_byte + (target_byte - start_byte) / 2;
    let mut best: Option<usize> = None;

    for (i, ch) in text[window_start..target_byte].char_indices() {
        if SENTENCE_ENDERS.contains(&ch) {
            let boundary = window_start + i + ch.len_utf8();
            if text.is_char_boundary(boundary) {
                best = Some(boundary);
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("", 100, 10).is_empty());
    }

    #[test]
    fn preserves_order_and_covers_text() {
        let text = "Sentence one is here. Sentence two follows. Sentence three ends it.";
        let chunks = chunk_text(text, 30, 5);
        assert!(!chunks.is_empty());
        assert!(chunks.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn never_splits_inside_a_codepoint() {
        let text = "文档测试内容".repeat(50);
        let chunks = chunk_text(&text, 20, 4);
        for chunk in &chunks {
            assert!(std::str::from_utf8(chunk.as_bytes()).is_ok());
        }
    }

    #[test]
    fn small_document_is_a_single_chunk() {
        let text = "short text";
        let chunks = chunk_text(text, 512, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn chunk_count_scales_with_length() {
        let text = "word ".repeat(400);
        let chunks = chunk_text(&text, 400, 50);
        assert!(chunks.len() >= 3);
    }
}
