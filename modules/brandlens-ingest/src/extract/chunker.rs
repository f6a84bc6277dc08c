/// Target chunk size in characters. Large enough to keep most transcripts
/// in one call, small enough to stay well inside the model context.
pub const CHUNK_TARGET: usize = 12_000;

/// Split text into chunks of roughly `target` characters, cutting at a
/// newline when possible, then at a space, never mid-word.
pub fn chunk_text(text: &str, target: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        if rest.len() <= target {
            chunks.push(rest.to_string());
            break;
        }

        let cut = floor_char_boundary(rest, target);
        let window = &rest[..cut];

        let at = match window.rfind('\n').or_else(|| window.rfind(' ')) {
            Some(i) if i > 0 => i,
            // One unbroken word longer than the target: extend to the next
            // whitespace rather than splitting inside it.
            _ => match rest[cut..].find(char::is_whitespace) {
                Some(j) => cut + j,
                None => rest.len(),
            },
        };

        chunks.push(rest[..at].trim().to_string());
        rest = rest[at..].trim_start();
    }

    chunks.retain(|c| !c.is_empty());
    chunks
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunk_text("hello world", 100);
        assert_eq!(chunks, vec!["hello world"]);
    }

    #[test]
    fn prefers_newline_over_space() {
        let text = "first line\nsecond line and more words here";
        let chunks = chunk_text(text, 20);
        assert_eq!(chunks[0], "first line");
        assert!(chunks[1].starts_with("second line"));
    }

    #[test]
    fn falls_back_to_space() {
        let text = "word1 word2 word3 word4 word5";
        let chunks = chunk_text(text, 13);
        for chunk in &chunks {
            // Every chunk holds whole words only.
            for word in chunk.split_whitespace() {
                assert!(word.starts_with("word"));
                assert_eq!(word.len(), 5);
            }
        }
        let rejoined = chunks.join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn never_splits_mid_word() {
        let text = "tiny supercalifragilisticexpialidocious tail";
        let chunks = chunk_text(text, 10);
        assert!(chunks.contains(&"supercalifragilisticexpialidocious".to_string()));
    }

    #[test]
    fn respects_utf8_boundaries() {
        let text = "émotion ".repeat(50);
        let chunks = chunk_text(&text, 21);
        for chunk in &chunks {
            for word in chunk.split_whitespace() {
                assert_eq!(word, "émotion");
            }
        }
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk_text("   ", 100).is_empty());
    }
}
