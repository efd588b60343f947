use thiserror::Error;

/// Failures of the statistics helpers.
///
/// `NoValidTickers` is returned to the caller. The other variants describe a
/// single series and are stored per ticker in stationarity results instead
/// of aborting the whole table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("none of the {requested} provided tickers are found in the dataset")]
    NoValidTickers { requested: usize },

    #[error("series has no non-missing values")]
    EmptySeries,

    #[error("series needs at least {required} observations, found {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("series contains missing values")]
    MissingValues,

    #[error("series is constant")]
    ZeroVariance,

    #[error("period must be at least 2, got {period}")]
    InvalidPeriod { period: usize },

    #[error("regression is singular")]
    SingularRegression,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("column {column:?} has {found} values but the index has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column {0:?}")]
    DuplicateColumn(String),

    #[error("date {0} appears in more than one row")]
    DuplicateDate(chrono::NaiveDate),

    #[error("index must be strictly increasing, {0} is out of order")]
    UnsortedIndex(chrono::NaiveDate),

    #[error("CSV header must start with a date column")]
    MissingDateColumn,

    #[error("invalid date {value:?}: {source}")]
    InvalidDate {
        value: String,
        source: chrono::ParseError,
    },

    #[error("invalid number {value:?} in column {column:?}")]
    InvalidNumber { column: String, value: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("chart rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for ChartError
where
    E: std::error::Error + Send + Sync,
{
    fn from(error: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ChartError::Render(error.to_string())
    }
}
