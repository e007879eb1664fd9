//! Recursive character splitting of extracted text into retrieval chunks.
//!
//! Splits on the largest structural boundary first (paragraph breaks) and
//! recursively falls back to smaller boundaries (line, sentence, word,
//! character) only where a segment still exceeds the maximum chunk size.
//! Adjacent chunks carry a bounded overlap so context survives boundaries.

pub const CHUNK_SIZE: usize = 1000;
pub const CHUNK_OVERLAP: usize = 200;

/// Chunks whose trimmed length is at or below this are dropped as noise.
const MIN_CHUNK_CHARS: usize = 10;

const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Splits `text` into overlapping, size-bounded chunks. Deterministic: the
/// same input always yields the same chunk sequence.
///
/// Returns an empty vector when nothing survives the noise filter; the
/// caller decides whether that is an error.
pub fn chunk(text: &str) -> Vec<String> {
    split_text(text, &SEPARATORS)
        .into_iter()
        .filter(|c| c.trim().chars().count() > MIN_CHUNK_CHARS)
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_text(text: &str, separators: &[&str]) -> Vec<String> {
    let (index, separator) = separators
        .iter()
        .enumerate()
        .find(|(_, s)| s.is_empty() || text.contains(**s))
        .map(|(i, s)| (i, *s))
        .unwrap_or((separators.len() - 1, ""));
    let remaining = &separators[index + 1..];

    let splits: Vec<String> = if separator.is_empty() {
        text.chars().map(|c| c.to_string()).collect()
    } else {
        text.split(separator).map(|s| s.to_string()).collect()
    };

    let mut chunks = Vec::new();
    let mut good_splits: Vec<String> = Vec::new();

    for split in splits {
        if char_len(&split) < CHUNK_SIZE {
            good_splits.push(split);
        } else {
            if !good_splits.is_empty() {
                chunks.extend(merge_splits(&good_splits, separator));
                good_splits.clear();
            }
            if remaining.is_empty() {
                // Single unsplittable token larger than the chunk size.
                chunks.push(split);
            } else {
                chunks.extend(split_text(&split, remaining));
            }
        }
    }
    if !good_splits.is_empty() {
        chunks.extend(merge_splits(&good_splits, separator));
    }

    chunks
}

/// Greedily packs splits into chunks of at most `CHUNK_SIZE` characters,
/// carrying up to `CHUNK_OVERLAP` trailing characters into the next chunk.
fn merge_splits(splits: &[String], separator: &str) -> Vec<String> {
    let separator_len = char_len(separator);

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut total = 0usize;

    for split in splits {
        let len = char_len(split);
        let joined_len = if current.is_empty() { 0 } else { separator_len };

        if total + len + joined_len > CHUNK_SIZE && !current.is_empty() {
            if let Some(chunk) = join_splits(&current, separator) {
                chunks.push(chunk);
            }
            // Trim the front until the carried tail fits the overlap budget
            // and leaves room for the incoming split.
            while total > CHUNK_OVERLAP
                || (total + len + if current.is_empty() { 0 } else { separator_len } > CHUNK_SIZE
                    && total > 0)
            {
                let first_len = char_len(current[0]);
                total -= first_len + if current.len() > 1 { separator_len } else { 0 };
                current.remove(0);
            }
        }

        total += len + if current.is_empty() { 0 } else { separator_len };
        current.push(split);
    }

    if let Some(chunk) = join_splits(&current, separator) {
        chunks.push(chunk);
    }

    chunks
}

fn join_splits(splits: &[&str], separator: &str) -> Option<String> {
    let joined = splits.join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
