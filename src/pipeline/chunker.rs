use serde::{Deserialize, Serialize};

use super::types::{Chunk, Document};

/// Word-based chunking parameters. Overlap must stay below size;
/// config validation enforces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in words
    pub chunk_size: usize,
    /// Words shared between adjacent chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

/// Splits a document into overlapping word-boundary chunks.
///
/// A document shorter than one chunk yields exactly one chunk; an
/// empty document yields none. Chunking is deterministic: the same
/// input and parameters always produce the same sequence.
pub fn chunk_document(document: &Document, config: &ChunkingConfig) -> Vec<Chunk> {
    let words: Vec<&str> = document.content.split_whitespace().collect();
    let mut chunks = Vec::new();

    if words.is_empty() {
        return chunks;
    }

    let step = config.chunk_size.saturating_sub(config.chunk_overlap).max(1);
    let stem = file_stem(&document.name);

    let mut start = 0;
    let mut index = 0;
    while start < words.len() {
        let end = (start + config.chunk_size).min(words.len());
        let text = words[start..end].join(" ");

        chunks.push(Chunk {
            id: format!("{}_chunk_{}", stem, index),
            document: document.name.clone(),
            text,
            index,
        });

        if end == words.len() {
            break;
        }
        start += step;
        index += 1;
    }

    chunks
}

fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::DocFormat;
    use std::path::PathBuf;

    fn make_document(content: &str) -> Document {
        Document {
            name: "notes.txt".to_string(),
            path: PathBuf::from("notes.txt"),
            content: content.to_string(),
            format: DocFormat::Text,
        }
    }

    fn config(size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        }
    }

    #[test]
    fn short_document_yields_single_chunk() {
        let document = make_document("one two three");
        let chunks = chunk_document(&document, &config(10, 2));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "one two three");
        assert_eq!(chunks[0].id, "notes_chunk_0");
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let document = make_document("   \n\t ");
        assert!(chunk_document(&document, &config(10, 2)).is_empty());
    }

    #[test]
    fn adjacent_chunks_share_overlap_words() {
        let words: Vec<String> = (0..25).map(|i| format!("w{}", i)).collect();
        let document = make_document(&words.join(" "));
        let chunks = chunk_document(&document, &config(10, 3));

        assert!(chunks.len() >= 2);
        let first: Vec<&str> = chunks[0].text.split_whitespace().collect();
        let second: Vec<&str> = chunks[1].text.split_whitespace().collect();
        // Second chunk starts size - overlap = 7 words in.
        assert_eq!(second[0], first[7]);
        assert_eq!(&first[7..], &second[..3]);
    }

    #[test]
    fn chunking_is_deterministic() {
        let words: Vec<String> = (0..123).map(|i| format!("token{}", i)).collect();
        let document = make_document(&words.join(" "));

        let first = chunk_document(&document, &config(40, 10));
        let second = chunk_document(&document, &config(40, 10));

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.text, b.text);
            assert_eq!(a.index, b.index);
        }
    }

    #[test]
    fn chunks_cover_all_words_in_order() {
        let words: Vec<String> = (0..57).map(|i| format!("w{}", i)).collect();
        let document = make_document(&words.join(" "));
        let chunks = chunk_document(&document, &config(20, 5));

        let last = chunks.last().expect("at least one chunk");
        assert!(last.text.ends_with("w56"));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.document, "notes.txt");
        }
    }
}
