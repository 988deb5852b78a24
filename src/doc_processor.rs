use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Rough words-to-tokens ratio used for chunk sizing.
const TOKENS_PER_WORD: f64 = 1.3;

/// Parsed document content
pub struct ParsedDocument {
    pub content: String,
    pub file_type: String,
}

/// Parse a source document into plain text.
///
/// Files without an extension are treated as plain text.
pub fn parse_file(path: &Path) -> Result<ParsedDocument> {
    if !path.is_file() {
        return Err(Error::SourceNotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "" | "txt" => Ok(ParsedDocument {
            content: fs::read_to_string(path)?,
            file_type: "txt".into(),
        }),
        "md" | "markdown" => Ok(ParsedDocument {
            content: fs::read_to_string(path)?,
            file_type: "md".into(),
        }),
        "pdf" => {
            let bytes = fs::read(path)?;
            let content = pdf_extract::extract_text_from_mem(&bytes)
                .map_err(|e| Error::InvalidInput(format!("PDF parse error: {}", e)))?;
            Ok(ParsedDocument {
                content,
                file_type: "pdf".into(),
            })
        }
        _ => Err(Error::UnsupportedFile(ext)),
    }
}

/// Estimated token count of `text`: `ceil(words * 1.3)`.
pub fn estimate_tokens(text: &str) -> usize {
    words_to_tokens(text.split_whitespace().count())
}

/// Estimated token count of `words` words.
pub fn words_to_tokens(words: usize) -> usize {
    (words as f64 * TOKENS_PER_WORD).ceil() as usize
}

/// Split text into word-aligned chunks of at most `chunk_size` estimated tokens.
///
/// Each new chunk is seeded with the last `overlap` words of the previous one.
/// The carried-over words are capped one short of the previous chunk so every
/// chunk makes progress through the text. A single word larger than
/// `chunk_size` still becomes its own chunk.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_tokens = 0;

    for word in text.split_whitespace() {
        let word_tokens = estimate_tokens(word);

        if current_tokens + word_tokens > chunk_size && !current.is_empty() {
            chunks.push(current.join(" "));

            let keep = overlap.min(current.len() - 1);
            current = current.split_off(current.len() - keep);
            current_tokens = words_to_tokens(keep);
        }

        current.push(word);
        current_tokens += word_tokens;
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}
