// src/import/docx.rs

use docx_rs::{DocumentChild, TableCellContent, TableChild, TableRowChild, read_docx};

use crate::error::AppError;
use crate::import::document::ExtractedDocument;

/// Reads uploaded `.docx` bytes into an [`ExtractedDocument`].
///
/// Body paragraphs and tables are collected separately so the extractor can
/// emit paragraphs before table cells. A cell's inner paragraphs are joined
/// with single spaces into one cell text.
pub fn read_document(bytes: &[u8]) -> Result<ExtractedDocument, AppError> {
    let docx = read_docx(bytes).map_err(|e| {
        tracing::warn!("Failed to parse uploaded docx: {:?}", e);
        AppError::BadRequest("Word faylni o'qib bo'lmadi.".to_string())
    })?;

    let mut doc = ExtractedDocument::default();

    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => {
                doc.paragraphs.push(p.raw_text());
            }
            DocumentChild::Table(t) => {
                let mut rows: Vec<Vec<String>> = Vec::new();
                for row_child in &t.rows {
                    let TableChild::TableRow(row) = row_child;
                    let mut cells: Vec<String> = Vec::new();
                    for cell_child in &row.cells {
                        let TableRowChild::TableCell(cell) = cell_child;
                        cells.push(cell_text(&cell.children));
                    }
                    rows.push(cells);
                }
                doc.tables.push(rows);
            }
            _ => {}
        }
    }

    Ok(doc)
}

fn cell_text(children: &[TableCellContent]) -> String {
    let mut parts: Vec<String> = Vec::new();
    for content in children {
        if let TableCellContent::Paragraph(p) = content {
            parts.push(p.raw_text());
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};
    use std::io::Cursor;

    fn paragraph(text: &str) -> Paragraph {
        Paragraph::new().add_run(Run::new().add_text(text))
    }

    fn pack(docx: Docx) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).expect("failed to pack docx");
        buf.into_inner()
    }

    #[test]
    fn reads_paragraphs_and_table_cells() {
        let table = Table::new(vec![TableRow::new(vec![
            TableCell::new().add_paragraph(paragraph("3. From a table?")),
            TableCell::new().add_paragraph(paragraph("*cell answer")),
        ])]);

        let bytes = pack(
            Docx::new()
                .add_paragraph(paragraph("1. From a paragraph?"))
                .add_paragraph(paragraph("*yes"))
                .add_table(table),
        );

        let doc = read_document(&bytes).unwrap();
        let lines = doc.lines();

        // Paragraphs first, then table cells.
        assert_eq!(
            lines,
            vec![
                "1. From a paragraph?",
                "*yes",
                "3. From a table?",
                "*cell answer"
            ]
        );
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = read_document(b"this is not a zip archive").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
