use crate::models::Table;

/// Columns of the histogram and boxplot grids
pub const GRID_COLUMNS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCell {
    /// Draw this ticker's column
    Chart(String),
    /// Leave the cell empty
    Blank,
}

/// Subplot layout, decided before anything is drawn.
///
/// Cells are stored row-major; `cells().len() == rows() * cols()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartGrid {
    rows: usize,
    cols: usize,
    cells: Vec<GridCell>,
}

impl ChartGrid {
    /// One cell per requested ticker in a [`GRID_COLUMNS`]-wide grid.
    ///
    /// Tickers missing from `data` and the padding after the last ticker are blank.
    pub fn for_tickers(data: &Table, tickers: &[String]) -> Self {
        let rows = tickers.len().div_ceil(GRID_COLUMNS).max(1);
        let mut cells: Vec<GridCell> = tickers
            .iter()
            .map(|ticker| {
                if data.has_column(ticker) {
                    GridCell::Chart(ticker.clone())
                } else {
                    GridCell::Blank
                }
            })
            .collect();
        cells.resize(rows * GRID_COLUMNS, GridCell::Blank);

        Self {
            rows,
            cols: GRID_COLUMNS,
            cells,
        }
    }

    /// One row per column of `data`, `cols` cells per row for the same column.
    pub fn per_column(data: &Table, cols: usize) -> Self {
        let cols = cols.max(1);
        let mut cells: Vec<GridCell> = data
            .columns()
            .iter()
            .flat_map(|name| std::iter::repeat(GridCell::Chart(name.clone())).take(cols))
            .collect();
        let rows = data.width().max(1);
        cells.resize(rows * cols, GridCell::Blank);

        Self { rows, cols, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&GridCell> {
        if col >= self.cols {
            return None;
        }
        self.cells.get(row * self.cols + col)
    }

    /// `(position, ticker)` of every cell that gets drawn
    pub fn charts(&self) -> impl Iterator<Item = (usize, &str)> {
        self.cells.iter().enumerate().filter_map(|(i, cell)| match cell {
            GridCell::Chart(ticker) => Some((i, ticker.as_str())),
            GridCell::Blank => None,
        })
    }

    pub fn blank_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell == GridCell::Blank)
            .count()
    }
}
