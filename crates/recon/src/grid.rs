use std::collections::BTreeMap;

use serde::Serialize;

/// Bounding rectangle of every stored cell, zero-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OccupiedRange {
    pub min_row: usize,
    pub max_row: usize,
    pub min_col: usize,
    pub max_col: usize,
}

impl OccupiedRange {
    fn single(row: usize, col: usize) -> Self {
        Self {
            min_row: row,
            max_row: row,
            min_col: col,
            max_col: col,
        }
    }

    fn include(&mut self, row: usize, col: usize) {
        self.min_row = self.min_row.min(row);
        self.max_row = self.max_row.max(row);
        self.min_col = self.min_col.min(col);
        self.max_col = self.max_col.max(col);
    }
}

/// Read-only view of a rectangular sheet, addressed by zero-based (row, col).
///
/// The engine never learns how the underlying document is encoded; file
/// adapters only have to produce something that implements this.
pub trait TabularSource {
    /// Raw cell text, or `None` when the cell is empty.
    fn cell(&self, row: usize, col: usize) -> Option<&str>;

    /// Occupied rectangle, or `None` for a sheet without any cells.
    fn occupied_range(&self) -> Option<OccupiedRange>;

    /// Trimmed cell text, empty string when absent.
    fn cell_text(&self, row: usize, col: usize) -> String {
        self.cell(row, col).map(|s| s.trim().to_string()).unwrap_or_default()
    }

    /// Values of the header row (first occupied row), indexed by absolute column.
    fn header_row(&self) -> Vec<String> {
        match self.occupied_range() {
            Some(range) => (0..=range.max_col)
                .map(|col| self.cell_text(range.min_row, col))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Sparse in-memory sheet. Cells are kept in row-major order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    cells: BTreeMap<(usize, usize), String>,
    range: Option<OccupiedRange>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from rows of text starting at A1. Empty strings are skipped.
    pub fn from_rows<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut grid = Self::new();
        for (row, cols) in rows.into_iter().enumerate() {
            for (col, value) in cols.into_iter().enumerate() {
                grid.set(row, col, value);
            }
        }
        grid
    }

    /// Store a cell value. Setting an empty string clears the cell.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            if self.cells.remove(&(row, col)).is_some() {
                self.recompute_range();
            }
            return;
        }
        self.cells.insert((row, col), value);
        match self.range.as_mut() {
            Some(range) => range.include(row, col),
            None => self.range = Some(OccupiedRange::single(row, col)),
        }
    }

    fn recompute_range(&mut self) {
        let mut keys = self.cells.keys();
        self.range = keys.next().map(|&(row, col)| {
            let mut range = OccupiedRange::single(row, col);
            for &(r, c) in keys {
                range.include(r, c);
            }
            range
        });
    }

    /// All stored cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &str)> {
        self.cells.iter().map(|(&(row, col), v)| (row, col, v.as_str()))
    }

    /// Stored cells of a single row, left to right.
    pub fn row_cells(&self, row: usize) -> impl Iterator<Item = (usize, &str)> {
        self.cells
            .range((row, 0)..=(row, usize::MAX))
            .map(|(&(_, col), v)| (col, v.as_str()))
    }

    /// Number of cells holding non-whitespace text.
    pub fn occupied_cell_count(&self) -> usize {
        self.cells.values().filter(|v| !v.trim().is_empty()).count()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl TabularSource for Grid {
    fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.cells.get(&(row, col)).map(String::as_str)
    }

    fn occupied_range(&self) -> Option<OccupiedRange> {
        self.range
    }
}

/// One (document, sheet) unit of the shipment corpus.
#[derive(Debug, Clone)]
pub struct ShipmentSheet {
    pub document: String,
    pub sheet: String,
    pub grid: Grid,
    /// Non-empty cell count; only used for hit ratios.
    pub occupied_cells: usize,
}

impl ShipmentSheet {
    pub fn new(document: impl Into<String>, sheet: impl Into<String>, grid: Grid) -> Self {
        let occupied_cells = grid.occupied_cell_count();
        Self {
            document: document.into(),
            sheet: sheet.into(),
            grid,
            occupied_cells,
        }
    }
}
