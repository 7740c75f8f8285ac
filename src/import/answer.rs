// src/import/answer.rs

/// One answer option parsed from a raw answer line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAnswer {
    pub text: String,
    pub is_correct: bool,
}

/// Parses the correct-marker out of a raw answer line.
///
/// An asterisk anywhere in the line marks the answer correct; every `*` is
/// removed from the text. This is intentionally permissive to match how
/// documents have been authored so far. Note: an answer whose legitimate
/// text contains a `*` is a false positive under this rule.
///
/// Returns `None` when nothing but whitespace and markers remain.
pub fn parse_answer_line(line: &str) -> Option<ParsedAnswer> {
    let (text, is_correct) = if line.contains('*') {
        (line.replace('*', ""), true)
    } else {
        (line.to_string(), false)
    };

    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(ParsedAnswer {
        text: text.to_string(),
        is_correct,
    })
}
