// src/import/document.rs

/// A structured document stripped down to what the importer needs: body
/// paragraphs and tables of rows of cells, both in document order.
#[derive(Debug, Default, Clone)]
pub struct ExtractedDocument {
    pub paragraphs: Vec<String>,
    /// table -> row -> cell text
    pub tables: Vec<Vec<Vec<String>>>,
}

impl ExtractedDocument {
    /// Flattens the document into trimmed, non-empty text lines.
    ///
    /// Order is all paragraphs first, then all table cells in
    /// table -> row -> cell order. Existing quiz documents were authored
    /// against exactly this ordering, so it must not change.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();

        for paragraph in &self.paragraphs {
            if let Some(line) = normalize_line(paragraph) {
                lines.push(line);
            }
        }

        for table in &self.tables {
            for row in table {
                for cell in row {
                    if let Some(line) = normalize_line(cell) {
                        lines.push(line);
                    }
                }
            }
        }

        lines
    }
}

/// Replaces non-breaking spaces with ordinary spaces and trims; empty
/// results are dropped by the caller.
fn normalize_line(raw: &str) -> Option<String> {
    let cleaned = raw.replace('\u{a0}', " ");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
