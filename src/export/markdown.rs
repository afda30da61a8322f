//! Markdown writer.

use super::document::{Block, RenderedDocument, TableBlock};
use super::{DocumentWriter, ExportError, ExportFormat};

/// Writes the report as GitHub-flavoured Markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownWriter;

impl MarkdownWriter {
    /// Render straight to a `String`; Markdown output cannot fail.
    ///
    /// Blocks are separated by one blank line, except that consecutive
    /// bullets form a single list.
    pub fn to_markdown(&self, document: &RenderedDocument) -> String {
        let mut chunks = vec![
            format!("# {}\n", document.title),
            format!("{}\n", document.subtitle),
        ];

        for section in &document.sections {
            chunks.push(format!("## {}\n", section.heading));

            let mut list = String::new();
            for block in &section.blocks {
                let chunk = match block {
                    Block::Bullet(text) => {
                        list.push_str("- ");
                        list.push_str(&text.replace('\n', " "));
                        list.push('\n');
                        continue;
                    }
                    Block::Paragraph(text) if text.is_empty() => None,
                    Block::Paragraph(text) => Some(format!("{text}\n")),
                    Block::SubHeading(text) => Some(format!("### {text}\n")),
                    Block::Table(table) => {
                        let mut out = String::new();
                        write_table(&mut out, table);
                        Some(out)
                    }
                };
                if !list.is_empty() {
                    chunks.push(std::mem::take(&mut list));
                }
                chunks.extend(chunk);
            }
            if !list.is_empty() {
                chunks.push(list);
            }
        }

        chunks.join("\n")
    }
}

impl DocumentWriter for MarkdownWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Markdown
    }

    fn write(&self, document: &RenderedDocument) -> Result<Vec<u8>, ExportError> {
        Ok(self.to_markdown(document).into_bytes())
    }
}

fn write_table(out: &mut String, table: &TableBlock) {
    write_row(out, &table.header);
    out.push('|');
    for _ in &table.header {
        out.push_str(" --- |");
    }
    out.push('\n');
    for row in &table.rows {
        write_row(out, row);
    }
}

fn write_row(out: &mut String, cells: &[String]) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(&escape_cell(cell));
        out.push_str(" |");
    }
    out.push('\n');
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}
