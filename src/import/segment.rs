// src/import/segment.rs

use regex::Regex;
use std::sync::LazyLock;

/// A numbered line opens a question block: optional leading whitespace,
/// digits, a literal period, optional whitespace, then the question text.
static QUESTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\.\s*(.*)").expect("question pattern is valid"));

/// One segmented question block: the question text plus the raw answer
/// lines accumulated until the next numbered line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBlock {
    pub text: String,
    pub answer_lines: Vec<String>,
}

/// Groups extracted lines into question blocks.
///
/// Explicit accumulator state machine: a matching line closes the open
/// block (if any) and opens a new one; any other line is appended to the
/// open block's answer lines. Lines before the first numbered line are
/// discarded. The final open block is flushed at end of input.
pub fn segment_lines(lines: &[String]) -> Vec<QuestionBlock> {
    let mut blocks: Vec<QuestionBlock> = Vec::new();
    let mut current: Option<QuestionBlock> = None;

    for line in lines {
        if let Some(caps) = QUESTION_RE.captures(line) {
            if let Some(block) = current.take() {
                blocks.push(block);
            }

            let number = &caps[1];
            let remainder = caps[2].trim();
            // A bare "12." keeps the original line verbatim as the text.
            let text = if remainder.is_empty() {
                line.clone()
            } else {
                format!("{}. {}", number, remainder)
            };

            current = Some(QuestionBlock {
                text,
                answer_lines: Vec::new(),
            });
        } else if let Some(block) = current.as_mut() {
            block.answer_lines.push(line.clone());
        }
    }

    if let Some(block) = current {
        blocks.push(block);
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn numbered_line_opens_block_and_collects_answers() {
        let blocks = segment_lines(&lines(&["1. What is Rust?", "a language", "a metal"]));

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "1. What is Rust?");
        assert_eq!(blocks[0].answer_lines, vec!["a language", "a metal"]);
    }

    #[test]
    fn next_numbered_line_closes_previous_block() {
        let blocks = segment_lines(&lines(&["1. First", "A", "2. Second", "B", "C"]));

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "1. First");
        assert_eq!(blocks[0].answer_lines, vec!["A"]);
        assert_eq!(blocks[1].text, "2. Second");
        assert_eq!(blocks[1].answer_lines, vec!["B", "C"]);
    }

    #[test]
    fn question_text_is_normalized_from_captures() {
        // Leading whitespace and extra spacing after the period collapse
        // into "<digits>. <text>".
        let blocks = segment_lines(&lines(&["  3.    Spaced out?", "yes"]));

        assert_eq!(blocks[0].text, "3. Spaced out?");
    }

    #[test]
    fn bare_number_falls_back_to_original_line() {
        let blocks = segment_lines(&lines(&["12.", "answer"]));

        assert_eq!(blocks[0].text, "12.");
        assert_eq!(blocks[0].answer_lines, vec!["answer"]);
    }

    #[test]
    fn lines_before_first_question_are_discarded() {
        let blocks = segment_lines(&lines(&["preamble", "title page", "1. Q", "A"]));

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].answer_lines, vec!["A"]);
    }

    #[test]
    fn trailing_block_is_flushed_at_end_of_input() {
        let blocks = segment_lines(&lines(&["1. Q", "A", "B"]));

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].answer_lines.len(), 2);
    }

    #[test]
    fn no_questions_yields_empty_output() {
        assert!(segment_lines(&lines(&["just", "text"])).is_empty());
        assert!(segment_lines(&[]).is_empty());
    }
}
