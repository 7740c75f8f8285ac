// src/import/mod.rs
//
// Word-document quiz import: line extraction, question-block segmentation,
// correct-marker parsing. Everything here is pure; the upload handler owns
// the database writes.

pub mod answer;
pub mod document;
pub mod docx;
pub mod segment;

use answer::ParsedAnswer;
use segment::QuestionBlock;

/// At most this many per-block problems are echoed back in the summary.
pub const MAX_REPORTED_PROBLEMS: usize = 5;

/// A fully parsed question ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuestion {
    pub text: String,
    pub answers: Vec<ParsedAnswer>,
}

/// Outcome of the pure parsing stage: questions to persist plus per-block
/// problems that were skipped without aborting the import.
#[derive(Debug, Default)]
pub struct ImportBatch {
    pub questions: Vec<ParsedQuestion>,
    pub problems: Vec<String>,
}

/// Turns segmented blocks into persistable questions.
///
/// A block with zero answer lines creates nothing and records a problem
/// message; answer lines whose text parses to empty are dropped silently.
pub fn build_batch(blocks: Vec<QuestionBlock>) -> ImportBatch {
    let mut batch = ImportBatch::default();

    for block in blocks {
        if block.answer_lines.is_empty() {
            batch
                .problems
                .push(format!("'{}' uchun javob topilmadi", block.text));
            continue;
        }

        let answers: Vec<ParsedAnswer> = block
            .answer_lines
            .iter()
            .filter_map(|line| answer::parse_answer_line(line))
            .collect();

        batch.questions.push(ParsedQuestion {
            text: block.text,
            answers,
        });
    }

    batch
}

/// Builds the user-facing import summary, appending up to
/// [`MAX_REPORTED_PROBLEMS`] problem messages.
pub fn import_summary(created: usize, quiz_type_name: &str, problems: &[String]) -> String {
    let mut message = format!(
        "{} ta savol '{}' turiga muvaffaqiyatli yuklandi.",
        created, quiz_type_name
    );

    for problem in problems.iter().take(MAX_REPORTED_PROBLEMS) {
        message.push('\n');
        message.push_str(problem);
    }

    message
}
