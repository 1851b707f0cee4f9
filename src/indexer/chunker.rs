/// Round a byte position up to the next char boundary.
fn ceil_char_boundary(text: &str, byte_pos: usize) -> usize {
    if byte_pos >= text.len() {
        return text.len();
    }
    let mut pos = byte_pos;
    while pos < text.len() && !text.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}

/// Round a byte position down to the previous char boundary.
fn floor_char_boundary(text: &str, byte_pos: usize) -> usize {
    if byte_pos >= text.len() {
        return text.len();
    }
    let mut pos = byte_pos;
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Split text into paragraphs at blank lines.
///
/// A blank line is empty or whitespace-only; consecutive blank lines count
/// as a single boundary. Paragraphs are trimmed and empty ones dropped.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush_paragraph(&mut current, &mut paragraphs);
        } else {
            current.push(line);
        }
    }
    flush_paragraph(&mut current, &mut paragraphs);

    paragraphs
}

fn flush_paragraph(lines: &mut Vec<&str>, out: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let paragraph = lines.join("\n");
    let trimmed = paragraph.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    lines.clear();
}

/// Paragraph chunks, with paragraphs longer than `max_chars` bytes split
/// further at natural break points. `None` keeps paragraphs whole.
pub fn chunk_paragraphs(text: &str, max_chars: Option<usize>) -> Vec<String> {
    let paragraphs = split_paragraphs(text);
    let max_chars = match max_chars {
        Some(n) if n > 0 => n,
        _ => return paragraphs,
    };

    paragraphs
        .into_iter()
        .flat_map(|p| split_long(&p, max_chars))
        .collect()
}

fn split_long(text: &str, max_chars: usize) -> Vec<String> {
    if text.len() <= max_chars {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = floor_char_boundary(text, (start + max_chars).min(text.len()));
        if end <= start {
            // max_chars is smaller than a single char; take the whole char
            end = ceil_char_boundary(text, start + 1);
        }

        let actual_end = if end < text.len() {
            find_break_point(text, start, end)
        } else {
            end
        };

        let piece = text[start..actual_end].trim();
        if !piece.is_empty() {
            pieces.push(piece.to_string());
        }
        start = actual_end;
    }

    pieces
}

fn find_break_point(text: &str, start: usize, max_end: usize) -> usize {
    let segment = &text[start..max_end];

    if let Some(pos) = segment.rfind('\n') {
        if pos > 0 {
            return start + pos + 1;
        }
    }
    for sentinel in ["。", "？", "！", ". ", "? ", "! "] {
        if let Some(pos) = segment.rfind(sentinel) {
            return start + pos + sentinel.len();
        }
    }
    if let Some(pos) = segment.rfind(' ') {
        if pos > 0 {
            return start + pos + 1;
        }
    }
    max_end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_runs_collapse() {
        assert_eq!(split_paragraphs("A\n\nB\n\n\nC"), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_paragraphs_are_trimmed() {
        let text = "  first paragraph  \n\n\t second one\t\n";
        assert_eq!(split_paragraphs(text), vec!["first paragraph", "second one"]);
    }

    #[test]
    fn test_whitespace_only_lines_are_boundaries() {
        assert_eq!(split_paragraphs("one\n   \ntwo"), vec!["one", "two"]);
    }

    #[test]
    fn test_crlf_line_endings() {
        assert_eq!(split_paragraphs("one\r\n\r\ntwo\r\nmore"), vec!["one", "two\nmore"]);
    }

    #[test]
    fn test_single_newline_stays_in_paragraph() {
        assert_eq!(split_paragraphs("line one\nline two"), vec!["line one\nline two"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(split_paragraphs("").is_empty());
        assert!(split_paragraphs("\n\n   \n\n").is_empty());
    }

    #[test]
    fn test_no_limit_matches_paragraph_split() {
        let text = "A\n\nB\n\n\nC";
        assert_eq!(chunk_paragraphs(text, None), split_paragraphs(text));
    }

    #[test]
    fn test_long_paragraph_split_at_sentences() {
        let text = "First sentence here. Second sentence here. Third sentence here.";
        let chunks = chunk_paragraphs(text, Some(25));
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.len() <= 25, "chunk too long: {:?}", chunk);
        }
        assert_eq!(chunks[0], "First sentence here.");
    }

    #[test]
    fn test_multibyte_text_respects_char_boundaries() {
        let text = "これはテスト文章です。日本語のマルチバイト文字を含むテキストを正しく分割できるか確認します。";
        let chunks = chunk_paragraphs(text, Some(40));
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_unbroken_word_is_hard_split() {
        let text = "x".repeat(25);
        let chunks = chunk_paragraphs(&text, Some(10));
        assert_eq!(chunks, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }
}
