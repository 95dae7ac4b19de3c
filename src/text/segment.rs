//! Sentence-aware splitting of narration text into bounded segments.

use serde::{Deserialize, Serialize};

use crate::foundation::error::{NarrationError, NarrationResult};

/// Default upper bound on segment length, in characters.
pub const DEFAULT_MAX_SEGMENT_CHARS: usize = 300;

const TERMINATORS: [char; 4] = ['.', '!', '?', '…'];

/// One narration unit: synthesized as a single request and shown as a single caption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// 0-based position in the narration.
    pub index: usize,
    /// Non-empty segment text.
    pub text: String,
}

impl Segment {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split `text` into normalized sentences.
///
/// A sentence ends at a terminator (`.`, `!`, `?`, `…`); runs of terminators stay with the
/// sentence they close. Whitespace runs collapse to a single space, fragments without any
/// content are dropped, and a sentence lacking terminal punctuation gets a `.` appended.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if !TERMINATORS.contains(&c) {
            continue;
        }
        while let Some(&next) = chars.peek() {
            if !TERMINATORS.contains(&next) {
                break;
            }
            current.push(next);
            chars.next();
        }
        push_sentence(&mut out, &current);
        current.clear();
    }
    push_sentence(&mut out, &current);
    out
}

fn push_sentence(out: &mut Vec<String>, fragment: &str) {
    let has_content = fragment
        .chars()
        .any(|c| !c.is_whitespace() && !TERMINATORS.contains(&c));
    if !has_content {
        return;
    }

    let mut sentence = fragment.split_whitespace().collect::<Vec<_>>().join(" ");
    if !sentence.ends_with(TERMINATORS) {
        sentence.push('.');
    }
    out.push(sentence);
}

/// Normalized form of `text`: its sentences joined by single spaces.
///
/// Joining the output of [`segment`] with single spaces reproduces this string exactly.
pub fn normalize(text: &str) -> String {
    split_sentences(text).join(" ")
}

/// Group the sentences of `text` into segments of at most `max_segment_chars` characters.
///
/// Sentences are accumulated greedily while `len(current) + len(next) < max_segment_chars`;
/// the joining space therefore never pushes a segment past the limit. A single sentence longer
/// than the limit becomes its own segment. Fails with an input error when `text` holds no
/// sentences.
pub fn segment(text: &str, max_segment_chars: usize) -> NarrationResult<Vec<Segment>> {
    if max_segment_chars == 0 {
        return Err(NarrationError::input("max_segment_chars must be > 0"));
    }

    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return Err(NarrationError::input("empty text"));
    }

    let mut texts = Vec::<String>::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for sentence in sentences {
        let len = sentence.chars().count();
        if current.is_empty() {
            current = sentence;
            current_len = len;
        } else if current_len + len < max_segment_chars {
            current.push(' ');
            current.push_str(&sentence);
            current_len += 1 + len;
        } else {
            texts.push(std::mem::replace(&mut current, sentence));
            current_len = len;
        }
    }
    texts.push(current);

    Ok(texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| Segment { index, text })
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/text/segment.rs"]
mod tests;
