pub mod charts;
pub mod grid;
pub mod shapes;

pub use charts::*;
pub use grid::{ChartGrid, GridCell, GRID_COLUMNS};
pub use shapes::{histogram, BoxStats, HistogramBin, HISTOGRAM_BINS};
