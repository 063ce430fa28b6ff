//! Table parser and table accessors.
//!
//! Table lines are collected into builders first: cell text can continue on
//! later lines, so cell content is only parsed once the table is closed.

use log::debug;
use std::collections::BTreeMap;

use crate::wikitext::document::Document;
use crate::wikitext::enums::NodeType;
use crate::wikitext::errors::{Result, WtError};
use crate::wikitext::node::{NodeId, NodeKind};
use crate::wikitext::parser::Parser;
use crate::wikitext::split::{find_top_level_char, is_balanced, parse_attrs, split_top_level_any};

#[derive(Debug)]
enum Part {
    Text(String),
    Node(NodeId),
}

#[derive(Debug)]
struct Cell {
    heading: bool,
    attrs: BTreeMap<String, String>,
    parts: Vec<Part>,
    line: usize,
}

impl Cell {
    fn new(heading: bool, source: &str, line: usize) -> Self {
        let (attrs, content) = split_cell(source);
        Self {
            heading,
            attrs,
            parts: vec![Part::Text(content.to_string())],
            line,
        }
    }

    /// Text of the last text part, when the cell ends in text.
    fn open_text(&mut self) -> Option<&mut String> {
        match self.parts.last_mut() {
            Some(Part::Text(text)) => Some(text),
            _ => None,
        }
    }

    fn push_line(&mut self, line: &str) {
        match self.open_text() {
            Some(text) => {
                text.push('\n');
                text.push_str(line);
            }
            None => self.parts.push(Part::Text(line.to_string())),
        }
    }
}

#[derive(Debug, Default)]
struct Row {
    attrs: BTreeMap<String, String>,
    cells: Vec<Cell>,
}

#[derive(Debug, Default)]
struct TableBuilder {
    attrs: BTreeMap<String, String>,
    caption: Option<Cell>,
    rows: Vec<Row>,
    in_caption: bool,
}

impl TableBuilder {
    fn row(&mut self) -> &mut Row {
        if self.rows.is_empty() {
            self.rows.push(Row::default());
        }
        let last = self.rows.len() - 1;
        &mut self.rows[last]
    }

    /// The cell (or caption) that continuation lines belong to.
    fn open_cell(&mut self) -> Option<&mut Cell> {
        if self.in_caption {
            return self.caption.as_mut();
        }
        self.rows.last_mut().and_then(|row| row.cells.last_mut())
    }
}

/// `attrs | content` splits on the first top-level single `|`.
fn split_cell(source: &str) -> (BTreeMap<String, String>, &str) {
    match find_top_level_char(source, b'|') {
        Some(i) => (parse_attrs(&source[..i]), &source[i + 1..]),
        None => (BTreeMap::new(), source),
    }
}

impl Parser<'_> {
    /// Parse a table; the scanner is on the `{|` line and is left on the `|}` line.
    pub(crate) fn table(&mut self) -> Result<NodeId> {
        let start_line = self.sc.line_no();
        let first = self.sc.skip_rest();
        let mut table = TableBuilder {
            attrs: parse_attrs(first.trim_start().trim_start_matches("{|")),
            ..Default::default()
        };

        loop {
            self.sc.next_line()?;
            if self.sc.eof() {
                return Err(WtError::parse_at(
                    "unterminated table: missing |}",
                    start_line,
                    first.as_str(),
                ));
            }
            let line_no = self.sc.line_no();
            let line = self.sc.rest().to_string();

            // a cell with an open {{ or [[ takes the line whatever it looks like
            if let Some(cell) = table.open_cell()
                && let Some(text) = cell.open_text()
                && !is_balanced(text)
            {
                text.push('\n');
                text.push_str(&line);
                self.sc.skip_rest();
                continue;
            }

            let trimmed = line.trim_start();
            if trimmed.starts_with("|}") {
                self.sc.skip_rest();
                break;
            }
            if trimmed.starts_with("{|") {
                let nested = self.table()?;
                if table.open_cell().is_none() {
                    table.row().cells.push(Cell::new(false, "", line_no));
                }
                if let Some(cell) = table.open_cell() {
                    cell.parts.push(Part::Node(nested));
                }
                continue;
            }

            self.sc.skip_rest();
            if let Some(rest) = trimmed.strip_prefix("|+") {
                table.caption = Some(Cell::new(false, rest, line_no));
                table.in_caption = true;
            } else if let Some(rest) = trimmed.strip_prefix("|-") {
                table.in_caption = false;
                table.rows.push(Row {
                    attrs: parse_attrs(rest.trim_start_matches('-')),
                    cells: Vec::new(),
                });
            } else if let Some(rest) = trimmed.strip_prefix('!') {
                table.in_caption = false;
                let row = table.row();
                for source in split_top_level_any(rest, &["!!", "||"]) {
                    row.cells.push(Cell::new(true, source, line_no));
                }
            } else if let Some(rest) = trimmed.strip_prefix('|') {
                table.in_caption = false;
                let row = table.row();
                for source in split_top_level_any(rest, &["||"]) {
                    row.cells.push(Cell::new(false, source, line_no));
                }
            } else {
                match table.open_cell() {
                    Some(cell) => cell.push_line(&line),
                    None => debug!("line {} outside any table cell dropped", line_no),
                }
            }
        }

        self.build_table(table)
    }

    fn build_table(&mut self, table: TableBuilder) -> Result<NodeId> {
        let mut children = Vec::with_capacity(table.rows.len() + 1);
        if let Some(caption) = table.caption {
            let content = self.cell_content(caption.parts, caption.line)?;
            let id = self.doc.create_with_attrs(NodeKind::TableCaption, caption.attrs);
            self.doc.append_all(id, content);
            children.push(id);
        }

        for row in table.rows {
            if row.cells.is_empty() {
                debug!("empty table row dropped");
                continue;
            }
            let mut cells = Vec::with_capacity(row.cells.len());
            for cell in row.cells {
                let content = self.cell_content(cell.parts, cell.line)?;
                let kind = if cell.heading {
                    NodeKind::TableHeading
                } else {
                    NodeKind::TableCell
                };
                let id = self.doc.create_with_attrs(kind, cell.attrs);
                self.doc.append_all(id, content);
                cells.push(id);
            }
            let id = self.doc.create_with_attrs(NodeKind::TableRow, row.attrs);
            self.doc.append_all(id, cells);
            children.push(id);
        }

        let id = self.doc.create_with_attrs(NodeKind::Table, table.attrs);
        self.doc.append_all(id, children);
        Ok(id)
    }

    fn cell_content(&mut self, parts: Vec<Part>, line: usize) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        for part in parts {
            match part {
                Part::Text(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        let nodes = self.fragment(text, line)?;
                        self.extend_inline(&mut out, nodes);
                    }
                }
                Part::Node(id) => out.push(id),
            }
        }
        Ok(out)
    }
}

impl Document {
    fn expect_table(&self, id: NodeId) -> Result<()> {
        if self.is(id, NodeType::Table) {
            Ok(())
        } else {
            Err(WtError::invalid_arg(format!(
                "{} is a {}, not a table",
                id,
                self.node_type(id)
            )))
        }
    }

    /// Rows of a table, caption excluded.
    pub fn table_rows(&self, table: NodeId) -> Result<Vec<NodeId>> {
        self.expect_table(table)?;
        Ok(self
            .children(table)
            .iter()
            .copied()
            .filter(|id| self.is(*id, NodeType::TableRow))
            .collect())
    }

    /// Heading cells of the first row that has any.
    pub fn table_headings(&self, table: NodeId) -> Result<Vec<NodeId>> {
        for row in self.table_rows(table)? {
            let headings: Vec<NodeId> = self
                .children(row)
                .iter()
                .copied()
                .filter(|id| self.is(*id, NodeType::TableHeading))
                .collect();
            if !headings.is_empty() {
                return Ok(headings);
            }
        }
        Ok(Vec::new())
    }

    /// Cell at `row`, `col` (both 0-based, heading cells included).
    pub fn table_cell(&self, table: NodeId, row: usize, col: usize) -> Result<NodeId> {
        let rows = self.table_rows(table)?;
        let row_id = *rows
            .get(row)
            .ok_or_else(|| WtError::index_oob(row, rows.len()))?;
        let cells = self.children(row_id);
        cells
            .get(col)
            .copied()
            .ok_or_else(|| WtError::index_oob(col, cells.len()))
    }

    pub fn table_caption(&self, table: NodeId) -> Result<Option<NodeId>> {
        self.expect_table(table)?;
        Ok(self
            .children(table)
            .iter()
            .copied()
            .find(|id| self.is(*id, NodeType::TableCaption)))
    }
}
