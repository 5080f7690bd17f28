//! Transcript clean-up applied to raw Whisper output.
//!
//! Whisper occasionally "hallucinates" long runs of one syllable on noisy or
//! near-silent input (e.g. `ๆๆๆๆๆ…`).  [`shape`] trims the text, cuts such
//! degenerate runs down to a short prefix, and discards fragments too short
//! to be speech.
//!
//! | # | Rule | Default |
//! |---|------|---------|
//! | 1 | Trim surrounding whitespace | — |
//! | 2 | distinct / total chars < ratio and longer than N → first N + `...` | 0.3, 50 |
//! | 3 | Fewer than M chars → `""` | 3 |
//!
//! Lengths are counted in Unicode scalar values, so Thai vowel and tone
//! marks count as characters.  `shape` is idempotent.

use std::collections::HashSet;

use crate::config::ShapingConfig;

const ELLIPSIS: &str = "...";

/// First codepoint of the assigned Thai block (ก).
const THAI_START: char = '\u{0E01}';
/// Last assigned Thai codepoint (๛).
const THAI_END: char = '\u{0E5B}';

/// Apply the shaping rules in `rules` to `text`.
///
/// ```
/// use thai_transcribe::config::ShapingConfig;
/// use thai_transcribe::shaping::shape;
///
/// let rules = ShapingConfig::default();
/// assert_eq!(shape("  สวัสดีครับ \n", &rules), "สวัสดีครับ");
/// assert_eq!(shape("อ", &rules), "");
/// assert_eq!(shape(&"ๆ".repeat(100), &rules).chars().count(), 53);
/// ```
pub fn shape(text: &str, rules: &ShapingConfig) -> String {
    let trimmed = text.trim();
    let total = trimmed.chars().count();

    let shaped = if is_degenerate(trimmed, rules.min_distinct_ratio) && total > rules.truncate_chars
    {
        log::debug!(
            "shaping: degenerate transcript ({} chars, {} distinct), truncating",
            total,
            distinct_chars(trimmed)
        );
        let mut cut: String = trimmed.chars().take(rules.truncate_chars).collect();
        cut.push_str(ELLIPSIS);
        cut
    } else {
        trimmed.to_string()
    };

    if shaped.chars().count() < rules.min_chars {
        if !shaped.is_empty() {
            log::debug!("shaping: discarding short transcript {shaped:?}");
        }
        return String::new();
    }

    if !contains_thai(&shaped) {
        log::warn!("shaping: transcript contains no Thai characters");
    }

    shaped
}

/// `true` when fewer than `min_ratio` of the characters in `text` are
/// distinct.  Empty text is never degenerate.
pub fn is_degenerate(text: &str, min_ratio: f32) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return false;
    }
    (distinct_chars(text) as f32) < min_ratio * total as f32
}

fn distinct_chars(text: &str) -> usize {
    text.chars().collect::<HashSet<_>>().len()
}

/// `true` if `text` has at least one character from the Thai block.
pub fn contains_thai(text: &str) -> bool {
    text.chars().any(|c| (THAI_START..=THAI_END).contains(&c))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
