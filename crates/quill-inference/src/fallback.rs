//! Local fallback text reduction, used when the external provider is
//! not in play.
//!
//! The reduction is naive: the first couple of sentences of each
//! paragraph, nothing clever. It exists so generation-backed features
//! keep working offline, not to compete with the provider.

use quill_core::defaults;

/// Naive local summarizer: keeps the first N sentences per paragraph.
pub struct BasicSummarizer {
    sentences_per_paragraph: usize,
}

impl Default for BasicSummarizer {
    fn default() -> Self {
        Self {
            sentences_per_paragraph: defaults::FALLBACK_SENTENCES_PER_PARAGRAPH,
        }
    }
}

impl BasicSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the number of sentences kept per paragraph.
    pub fn with_sentences_per_paragraph(mut self, n: usize) -> Self {
        self.sentences_per_paragraph = n.max(1);
        self
    }

    /// Reduce the text paragraph by paragraph.
    ///
    /// Results shorter than the minimum useful length degrade to a
    /// fixed insufficient-content sentence rather than an error.
    pub fn summarize(&self, text: &str) -> String {
        let mut summary_parts = Vec::new();

        for paragraph in text.split('\n') {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            summary_parts.push(first_sentences(paragraph, self.sentences_per_paragraph));
        }

        let summary = summary_parts.join("\n\n");
        if summary.len() > defaults::FALLBACK_MIN_SUMMARY_LEN {
            summary
        } else {
            defaults::FALLBACK_INSUFFICIENT_CONTENT.to_string()
        }
    }
}

/// The prefix of `paragraph` running through its `n`-th sentence end.
///
/// A sentence ends at `.`, `!`, or `?` followed by whitespace; a
/// terminator at the end of the paragraph closes the last sentence
/// implicitly, so fewer than `n` sentences yields the whole paragraph.
fn first_sentences(paragraph: &str, n: usize) -> &str {
    let mut seen = 0;
    let mut chars = paragraph.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        match chars.peek() {
            Some((_, next)) if next.is_whitespace() => {
                seen += 1;
                if seen == n {
                    return paragraph[..idx + c.len_utf8()].trim_end();
                }
            }
            _ => {}
        }
    }

    paragraph.trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_first_two_sentences_per_paragraph() {
        let text = "One. Two. Three. Four.\nAlpha! Beta? Gamma.";
        let summary = BasicSummarizer::new().summarize(text);
        assert_eq!(summary, "One. Two.\n\nAlpha! Beta?");
    }

    #[test]
    fn test_short_paragraph_kept_whole() {
        let text = "Just a single sentence without much going on.";
        let summary = BasicSummarizer::new().summarize(text);
        assert_eq!(summary, text);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let text = "First paragraph here.\n\n\nSecond paragraph here.";
        let summary = BasicSummarizer::new().summarize(text);
        assert_eq!(summary, "First paragraph here.\n\nSecond paragraph here.");
    }

    #[test]
    fn test_empty_input_degrades_to_insufficient_content() {
        let summary = BasicSummarizer::new().summarize("");
        assert_eq!(
            summary,
            quill_core::defaults::FALLBACK_INSUFFICIENT_CONTENT
        );

        let summary = BasicSummarizer::new().summarize("   \n \n");
        assert_eq!(
            summary,
            quill_core::defaults::FALLBACK_INSUFFICIENT_CONTENT
        );
    }

    #[test]
    fn test_decimal_points_do_not_split_sentences() {
        let text = "Pi is roughly 3.14159 in most contexts. It never ends. Truly never.";
        let summary = BasicSummarizer::new().summarize(text);
        assert_eq!(
            summary,
            "Pi is roughly 3.14159 in most contexts. It never ends."
        );
    }

    #[test]
    fn test_sentence_count_override() {
        let text = "Alpha one. Beta two. Gamma three. Delta four.";
        let summary = BasicSummarizer::new()
            .with_sentences_per_paragraph(3)
            .summarize(text);
        assert_eq!(summary, "Alpha one. Beta two. Gamma three.");
    }
}
