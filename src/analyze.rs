//! Sentence analysis: word-boundary tokens with byte offsets.

use std::fmt;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// A non-whitespace token and its byte range in the sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedToken {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// A tokenized sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedSentence {
    pub text: String,
    pub tokens: Vec<AnalyzedToken>,
}

/// Tokenize on unicode word boundaries, dropping whitespace segments.
pub fn analyze(sentence: &str) -> AnalyzedSentence {
    let tokens = sentence
        .split_word_bound_indices()
        .filter(|(_, segment)| !segment.trim().is_empty())
        .map(|(start, segment)| AnalyzedToken {
            text: segment.to_string(),
            start,
            end: start + segment.len(),
        })
        .collect();

    AnalyzedSentence {
        text: sentence.to_string(),
        tokens,
    }
}

/// Split text into sentences, returning each with its byte offset.
pub fn split_sentences(text: &str) -> Vec<(usize, &str)> {
    text.split_sentence_bound_indices()
        .filter(|(_, sentence)| !sentence.trim().is_empty())
        .collect()
}

// Two rows: token texts, then their byte offsets, aligned by display width.
//
// This  is  a  apple  .
// 0     5   8  10     15
impl fmt::Display for AnalyzedSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SPACE_PADDING: usize = 2;
        let mut text_row = String::new();
        let mut offset_row = String::new();

        for (idx, token) in self.tokens.iter().enumerate() {
            let offset = token.start.to_string();
            let width = token.text.width().max(offset.len());
            let padding = if idx + 1 < self.tokens.len() {
                SPACE_PADDING
            } else {
                0
            };

            text_row.push_str(&token.text);
            text_row.push_str(&" ".repeat(width - token.text.width() + padding));
            offset_row.push_str(&offset);
            offset_row.push_str(&" ".repeat(width - offset.len() + padding));
        }

        writeln!(f, "{}", text_row.trim_end())?;
        write!(f, "{}", offset_row.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_offsets() {
        let analyzed = analyze("This is a apple.");
        let texts: Vec<_> = analyzed.tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["This", "is", "a", "apple", "."]);
        assert_eq!(analyzed.tokens[3].start, 10);
        assert_eq!(analyzed.tokens[3].end, 15);
    }

    #[test]
    fn test_analyze_multibyte() {
        let analyzed = analyze("Ein Bär läuft.");
        assert_eq!(analyzed.tokens[1].text, "Bär");
        assert_eq!(&analyzed.text[analyzed.tokens[1].start..analyzed.tokens[1].end], "Bär");
        assert_eq!(analyzed.tokens[2].start, 9);
    }

    #[test]
    fn test_display_token_dump() {
        let analyzed = analyze("This is a apple.");
        insta::assert_snapshot!(analyzed.to_string(), @r###"
        This  is  a  apple  .
        0     5   8  10     15
        "###);
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("One here. Two there.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].0, 0);
        assert_eq!(sentences[1].0, 10);
        assert_eq!(sentences[1].1, "Two there.");
    }
}
