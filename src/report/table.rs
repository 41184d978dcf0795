use std::{cmp::max, fmt::Alignment, io::Write};

use rust_decimal::Decimal;

/// A plain text table. Rows may have fewer cells than the widest row.
#[derive(Debug, Default)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row)
    }

    pub fn add_separator(&mut self) {
        self.rows.push(Row::Separator)
    }
}

#[derive(Debug, PartialEq)]
pub enum Row {
    Row { cells: Vec<Cell> },
    Separator,
}

impl Row {
    pub fn new() -> Self {
        Row::Row { cells: Vec::new() }
    }

    pub fn with(mut self, cell: Cell) -> Self {
        if let Self::Row { cells } = &mut self {
            cells.push(cell)
        }
        self
    }
}

impl Default for Row {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, PartialEq)]
pub enum Cell {
    Empty,
    Decimal {
        value: Decimal,
    },
    Text {
        text: String,
        align: Alignment,
        indent: usize,
    },
}

impl Cell {
    pub fn left(text: impl Into<String>) -> Self {
        Cell::Text {
            text: text.into(),
            align: Alignment::Left,
            indent: 0,
        }
    }

    pub fn indented(text: impl Into<String>, indent: usize) -> Self {
        Cell::Text {
            text: text.into(),
            align: Alignment::Left,
            indent,
        }
    }

    pub fn decimal(value: Decimal) -> Self {
        Cell::Decimal { value }
    }
}

pub struct TextRenderer {
    pub table: Table,
    /// Decimal places for numbers, unchanged if `None`.
    pub round: Option<u32>,
}

impl TextRenderer {
    pub fn new(table: Table, round: Option<u32>) -> Self {
        TextRenderer { table, round }
    }

    pub fn render<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let widths = self.compute_widths();
        for row in &self.table.rows {
            match row {
                Row::Separator => {
                    let total = widths.iter().map(|w| w + 1).sum::<usize>();
                    writeln!(w, "{}", "-".repeat(total.saturating_sub(1)))?
                }
                Row::Row { cells } => self.render_row(w, &widths, cells)?,
            }
        }
        Ok(())
    }

    fn render_row<W: Write>(
        &self,
        w: &mut W,
        widths: &[usize],
        cells: &[Cell],
    ) -> std::io::Result<()> {
        let mut line = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            match cell {
                Cell::Empty => line.push_str(&" ".repeat(widths[i])),
                Cell::Decimal { .. } => {
                    line.push_str(&format!("{:>1$}", self.format_cell(cell), widths[i]))
                }
                Cell::Text {
                    text,
                    align,
                    indent,
                } => {
                    line.push_str(&" ".repeat(*indent));
                    let width = widths[i] - indent;
                    match align {
                        Alignment::Left => line.push_str(&format!("{:<1$}", text, width)),
                        Alignment::Right => line.push_str(&format!("{:>1$}", text, width)),
                        Alignment::Center => line.push_str(&format!("{:^1$}", text, width)),
                    }
                }
            }
        }
        writeln!(w, "{}", line.trim_end())
    }

    fn format_cell(&self, c: &Cell) -> String {
        match c {
            Cell::Empty => String::new(),
            Cell::Decimal { value } => match self.round {
                Some(dp) => format!("{:.1$}", value.round_dp(dp), dp as usize),
                None => value.normalize().to_string(),
            },
            Cell::Text { text, indent, .. } => format!("{}{}", " ".repeat(*indent), text),
        }
    }

    fn compute_widths(&self) -> Vec<usize> {
        let mut widths = Vec::new();
        for row in &self.table.rows {
            if let Row::Row { cells } = row {
                if cells.len() > widths.len() {
                    widths.resize(cells.len(), 0)
                }
                for (i, cell) in cells.iter().enumerate() {
                    widths[i] = max(widths[i], self.format_cell(cell).len())
                }
            }
        }
        widths
    }
}
