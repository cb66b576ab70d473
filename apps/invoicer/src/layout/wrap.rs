//! Greedy paragraph wrapping against a bounded column.
//!
//! Explicit line breaks are paragraph boundaries and survive as-is, so a blank
//! source line becomes an empty output line. Inside a paragraph words are
//! packed while the measured width of the whole candidate line stays within
//! the column. A word that cannot fit on a line of its own is hard-broken
//! character by character.

use crate::layout::font_metrics::TextMetrics;

/// Wraps `text` into lines no wider than `max_width` at `size` points.
///
/// An empty string yields no lines. Whitespace runs inside a paragraph
/// collapse to single spaces.
pub fn wrap_text(metrics: &dyn TextMetrics, text: &str, size: f32, max_width: f32) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let normalized = text.replace('\r', "");
    let mut lines: Vec<String> = Vec::new();

    for paragraph in normalized.split('\n') {
        let mut words = paragraph.split_whitespace().peekable();
        if words.peek().is_none() {
            lines.push(String::new());
            continue;
        }

        let mut line = String::new();
        for word in words {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };

            if metrics.width_of(&candidate, size) <= max_width {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if metrics.width_of(word, size) > max_width {
                lines.extend(break_long_word(metrics, word, size, max_width));
            } else {
                line = word.to_string();
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines
}

/// Splits a single overlong word into fragments that each fit `max_width`.
///
/// A lone character wider than the column is still emitted as its own
/// fragment; it cannot be broken further.
pub fn break_long_word(
    metrics: &dyn TextMetrics,
    word: &str,
    size: f32,
    max_width: f32,
) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut part = String::new();

    for ch in word.chars() {
        part.push(ch);
        if metrics.width_of(&part, size) <= max_width {
            continue;
        }
        part.pop();
        if !part.is_empty() {
            parts.push(std::mem::take(&mut part));
        }
        part.push(ch);
    }
    if !part.is_empty() {
        parts.push(part);
    }

    parts
}
