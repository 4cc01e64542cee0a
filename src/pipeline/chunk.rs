//! Word-bounded chunking.
//!
//! Sizes are counted in characters. Each word costs its length plus one for
//! the joining space, and a word is never split: a single word longer than
//! the budget becomes a chunk of its own.

use serde::Serialize;

/// One unit of work for a translation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// 0-indexed position; translations are joined in this order.
    pub index: usize,
    pub text: String,
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Text that already fits is returned untouched as a single chunk, with its
/// original whitespace. Otherwise words are re-joined by single spaces.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<Chunk> {
    if text.chars().count() <= max_chars {
        return vec![Chunk {
            index: 0,
            text: text.to_string(),
        }];
    }

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let cost = word.chars().count() + 1;
        if current_len + cost > max_chars && !current.is_empty() {
            chunks.push(Chunk {
                index: chunks.len(),
                text: current.join(" "),
            });
            current.clear();
            current_len = 0;
        }
        current.push(word);
        current_len += cost;
    }

    if !current.is_empty() {
        chunks.push(Chunk {
            index: chunks.len(),
            text: current.join(" "),
        });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let text = "  keep   my\nwhitespace ";
        let chunks = chunk_text(text, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
    }

    #[test]
    fn boundary_length_is_one_chunk() {
        assert_eq!(chunk_text("abcde", 5).len(), 1);
    }

    #[test]
    fn splits_on_word_cost() {
        // each word costs 4: "aaa "; two fit in 8, the third does not
        let chunks = chunk_text("aaa bbb ccc ddd eee", 8);
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["aaa bbb", "ccc ddd", "eee"]);
        assert!(chunks.iter().enumerate().all(|(i, c)| c.index == i));
    }

    #[test]
    fn long_word_is_never_split() {
        let chunks = chunk_text("a supercalifragilistic b", 5);
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn joining_reconstructs_words() {
        let text = "नमस्ते दुनिया यह एक लंबा वाक्य है जिसे कई हिस्सों में बांटा जाएगा";
        let max_word = text.split_whitespace().map(|w| w.chars().count()).max().unwrap();
        let chunks = chunk_text(text, max_word + 1);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.chars().count() <= max_word + 1 || !c.text.contains(' '));
        }
        let joined: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn sizes_count_characters_not_bytes() {
        // 6 Devanagari characters, 18 bytes
        let chunks = chunk_text("नमस्ते", 6);
        assert_eq!(chunks.len(), 1);
    }
}
