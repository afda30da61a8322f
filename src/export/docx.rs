//! Word (.docx) writer backed by `docx-rs`.

use std::io::Cursor;

use docx_rs::{AlignmentType, BreakType, Docx, Paragraph, Run, Table, TableCell, TableRow};

use super::document::{Block, RenderedDocument, TableBlock};
use super::{DocumentWriter, ExportError, ExportFormat};

/// Font sizes in half-points, as `docx-rs` expects them.
const TITLE_SIZE: usize = 40;
const HEADING_SIZE: usize = 32;
const SUBHEADING_SIZE: usize = 28;

/// Writes a simple white-table Word document.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxWriter;

impl DocumentWriter for DocxWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Docx
    }

    fn write(&self, document: &RenderedDocument) -> Result<Vec<u8>, ExportError> {
        let mut docx = Docx::new()
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text(&document.title).bold().size(TITLE_SIZE))
                    .align(AlignmentType::Center),
            )
            .add_paragraph(Paragraph::new().add_run(text_run(&document.subtitle)));

        for section in &document.sections {
            docx = docx.add_paragraph(heading(&section.heading, HEADING_SIZE));

            for block in &section.blocks {
                docx = match block {
                    Block::Paragraph(text) => {
                        docx.add_paragraph(Paragraph::new().add_run(text_run(text)))
                    }
                    Block::Bullet(text) => {
                        let line = format!("• {text}");
                        docx.add_paragraph(Paragraph::new().add_run(text_run(&line)))
                    }
                    Block::SubHeading(text) => docx.add_paragraph(heading(text, SUBHEADING_SIZE)),
                    // An empty paragraph keeps consecutive tables from merging.
                    Block::Table(table) => docx
                        .add_table(table_of(table))
                        .add_paragraph(Paragraph::new()),
                };
            }
        }

        let mut buffer = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buffer)
            .map_err(|e| ExportError::Docx(e.to_string()))?;
        Ok(buffer.into_inner())
    }
}

fn heading(text: &str, size: usize) -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text(text).bold().size(size))
        .align(AlignmentType::Left)
}

/// A run whose embedded newlines become line breaks.
fn text_run(text: &str) -> Run {
    let mut run = Run::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line.trim_end_matches('\r'));
    }
    run
}

fn cell(text: &str, bold: bool) -> TableCell {
    let run = if bold { text_run(text).bold() } else { text_run(text) };
    TableCell::new().add_paragraph(Paragraph::new().add_run(run))
}

fn table_of(table: &TableBlock) -> Table {
    let mut rows = Vec::with_capacity(table.rows.len() + 1);
    rows.push(TableRow::new(table.header.iter().map(|h| cell(h, true)).collect()));
    for row in &table.rows {
        rows.push(TableRow::new(row.iter().map(|v| cell(v, false)).collect()));
    }
    Table::new(rows)
}
