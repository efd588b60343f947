//! SVG charts of date-indexed tables.
//!
//! Every function writes one file and returns only whether rendering worked.
//! Tickers that are not in the table and columns too short for the requested
//! computation are skipped with a warning, never reported as errors.

use crate::analysis::{
    acf, acf_confint, pacf, pacf_confint, seasonal_decompose, ACF_LAGS, DECOMPOSITION_PERIOD,
};
use crate::error::ChartError;
use crate::models::Table;
use crate::utils::{format_axis_date, log_chart, Logger};
use crate::visualisation::grid::{ChartGrid, GridCell};
use crate::visualisation::shapes::{finite_segments, histogram, value_range, BoxStats, HISTOGRAM_BINS};
use chrono::NaiveDate;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;
type Chart<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

pub const LINE_CHART_SIZE: (u32, u32) = (900, 600);
pub const GRID_CHART_SIZE: (u32, u32) = (900, 600);
pub const PANEL_CHART_SIZE: (u32, u32) = (1700, 1800);
pub const MOVING_AVERAGE_CHART_SIZE: (u32, u32) = (900, 2300);

const FONT: &str = "sans-serif";

// tab10
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];
const PRICE_COLOR: RGBColor = PALETTE[0];
const MA_COLOR: RGBColor = PALETTE[1];
const EMA_COLOR: RGBColor = PALETTE[2];
const BOX_FILL: RGBColor = RGBColor(173, 216, 230);

/// Title and axis labels of a line chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotLabels {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl PlotLabels {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
        }
    }
}

/// One line per ticker over the table's dates, with a legend.
pub fn tracking_plot(
    data: &Table,
    tickers: &[String],
    labels: &PlotLabels,
    path: impl AsRef<Path>,
) -> Result<(), ChartError> {
    let path = path.as_ref();
    prepare(path)?;
    let logger = Logger::new("CHARTS");

    for ticker in tickers.iter().filter(|t| !data.has_column(t)) {
        logger.warn(&format!("{} is not in the dataset, leaving it out of the plot", ticker));
    }
    let present = data.present_tickers(tickers);

    let root = SVGBackend::new(path, LINE_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let dates = data.index();
    let (y_min, y_max) = value_range(
        present
            .iter()
            .filter_map(|t| data.column(t))
            .flat_map(|values| values.iter().copied()),
    );

    let mut chart = ChartBuilder::on(&root)
        .caption(&labels.title, (FONT, 22))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range(dates.len()), y_min..y_max)?;

    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|x: &f64| axis_label(dates, *x))
        .x_desc(labels.x_label.as_str())
        .y_desc(labels.y_label.as_str())
        .draw()?;

    for (i, ticker) in present.iter().enumerate() {
        if let Some(values) = data.column(ticker) {
            let color = PALETTE[i % PALETTE.len()];
            draw_line(&mut chart, positions(values), color, 2, Some(ticker.clone()))?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    log_chart(&format!("Wrote line chart of {} tickers to {}", present.len(), path.display()));
    Ok(())
}

/// Histogram of each ticker's values in a 3-column grid.
pub fn plot_histograms(
    data: &Table,
    tickers: &[String],
    path: impl AsRef<Path>,
) -> Result<(), ChartError> {
    render_ticker_grid(data, tickers, path.as_ref(), "histogram", draw_histogram)
}

/// Boxplot of each ticker's values in a 3-column grid.
pub fn plot_boxplots(
    data: &Table,
    tickers: &[String],
    path: impl AsRef<Path>,
) -> Result<(), ChartError> {
    render_ticker_grid(data, tickers, path.as_ref(), "boxplot", draw_boxplot)
}

/// Trend, seasonal and residual panels for every column, period 30.
pub fn ts_decomposition(data: &Table, path: impl AsRef<Path>) -> Result<(), ChartError> {
    let path = path.as_ref();
    prepare(path)?;
    let logger = Logger::new("CHARTS");

    let grid = ChartGrid::per_column(data, 3);
    let root = SVGBackend::new(path, PANEL_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let body = root.titled("Seasonal Decomposition of Stock Prices", (FONT, 28))?;
    let areas = body.split_evenly((grid.rows(), grid.cols()));

    for row in 0..grid.rows() {
        let ticker = match grid.cell(row, 0) {
            Some(GridCell::Chart(ticker)) => ticker,
            _ => continue,
        };
        let (dates, values) = match data.dropna_column(ticker) {
            Some(column) => column,
            None => continue,
        };

        match seasonal_decompose(&values, DECOMPOSITION_PERIOD) {
            Ok(parts) => {
                let panels = [
                    ("Trend", &parts.trend),
                    ("Seasonal", &parts.seasonal),
                    ("Residuals", &parts.residual),
                ];
                for (col, (name, series)) in panels.into_iter().enumerate() {
                    let title = format!("{} - {}", ticker, name);
                    draw_panel(&areas[row * grid.cols() + col], &title, &dates, series)?;
                }
            }
            Err(e) => logger.warn(&format!("Skipping decomposition of {}: {}", ticker, e)),
        }
    }

    root.present()?;
    log_chart(&format!("Wrote decomposition of {} columns to {}", data.width(), path.display()));
    Ok(())
}

/// ACF and PACF over 25 lags with 95% bands, one row per column.
pub fn acf_pacf(data: &Table, path: impl AsRef<Path>) -> Result<(), ChartError> {
    let path = path.as_ref();
    prepare(path)?;
    let logger = Logger::new("CHARTS");

    let grid = ChartGrid::per_column(data, 2);
    let root = SVGBackend::new(path, PANEL_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let body = root.titled("ACF and PACF for Stock Returns", (FONT, 28))?;
    let areas = body.split_evenly((grid.rows(), grid.cols()));

    for row in 0..grid.rows() {
        let ticker = match grid.cell(row, 0) {
            Some(GridCell::Chart(ticker)) => ticker,
            _ => continue,
        };
        let values = match data.dropna_column(ticker) {
            Some((_, values)) => values,
            None => continue,
        };

        match acf(&values, ACF_LAGS) {
            Ok(correlations) => {
                let bands = acf_confint(&correlations, values.len());
                let title = format!("{} - Autocorrelation (ACF)", ticker);
                draw_correlogram(&areas[row * 2], &title, &correlations, &bands)?;
            }
            Err(e) => logger.warn(&format!("Skipping ACF of {}: {}", ticker, e)),
        }

        match pacf(&values, ACF_LAGS) {
            Ok(partials) => {
                let bands = pacf_confint(ACF_LAGS, values.len());
                let title = format!("{} - Partial Autocorrelation (PACF)", ticker);
                draw_correlogram(&areas[row * 2 + 1], &title, &partials, &bands)?;
            }
            Err(e) => logger.warn(&format!("Skipping PACF of {}: {}", ticker, e)),
        }
    }

    root.present()?;
    log_chart(&format!("Wrote ACF/PACF of {} columns to {}", data.width(), path.display()));
    Ok(())
}

/// Prices with their moving average and exponential moving average, one panel per column.
///
/// `ma` and `ema` are matched to `data` by column name and date.
pub fn moving_averages(
    data: &Table,
    ma: &Table,
    ema: &Table,
    path: impl AsRef<Path>,
) -> Result<(), ChartError> {
    let path = path.as_ref();
    prepare(path)?;
    let logger = Logger::new("CHARTS");

    let root = SVGBackend::new(path, MOVING_AVERAGE_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((data.width().max(1), 1));
    let dates = data.index();

    for (area, (ticker, prices)) in areas.iter().zip(data.iter_columns()) {
        let overlays: Vec<(&str, RGBColor, Vec<(f64, f64)>)> = [("MA", MA_COLOR, ma), ("EMA", EMA_COLOR, ema)]
            .into_iter()
            .filter_map(|(name, color, table)| match aligned_positions(dates, table, ticker) {
                Some(points) => Some((name, color, points)),
                None => {
                    logger.warn(&format!("No {} column for {}", name, ticker));
                    None
                }
            })
            .collect();

        let (y_min, y_max) = value_range(
            prices.iter().copied().chain(
                overlays
                    .iter()
                    .flat_map(|(_, _, points)| points.iter().map(|(_, y)| *y)),
            ),
        );

        let mut chart = ChartBuilder::on(area)
            .caption(format!("{} - Moving Averages", ticker), (FONT, 18))
            .margin(12)
            .x_label_area_size(30)
            .y_label_area_size(55)
            .build_cartesian_2d(x_range(dates.len()), y_min..y_max)?;
        chart
            .configure_mesh()
            .x_labels(8)
            .x_label_formatter(&|x: &f64| axis_label(dates, *x))
            .draw()?;

        draw_line(&mut chart, positions(prices), PRICE_COLOR, 1, Some(format!("{} - Prices", ticker)))?;
        for (name, color, points) in overlays {
            draw_line(&mut chart, points, color, 2, Some(format!("{} - {}", ticker, name)))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    log_chart(&format!("Wrote moving averages of {} columns to {}", data.width(), path.display()));
    Ok(())
}

fn render_ticker_grid<F>(
    data: &Table,
    tickers: &[String],
    path: &Path,
    kind: &str,
    draw: F,
) -> Result<(), ChartError>
where
    F: Fn(&Area<'_>, &str, &[f64]) -> Result<(), ChartError>,
{
    prepare(path)?;
    let logger = Logger::new("CHARTS");

    let grid = ChartGrid::for_tickers(data, tickers);
    for ticker in tickers.iter().filter(|t| !data.has_column(t)) {
        logger.warn(&format!("{} is not in the dataset, leaving its {} cell blank", ticker, kind));
    }

    let root = SVGBackend::new(path, GRID_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((grid.rows(), grid.cols()));

    for (position, ticker) in grid.charts() {
        if let Some(values) = data.column(ticker) {
            logger.debug(&format!("Drawing {} of {} at cell {}", kind, ticker, position));
            draw(&areas[position], ticker, values)?;
        }
    }

    root.present()?;
    log_chart(&format!(
        "Wrote {} grid ({}x{}, {} blank) to {}",
        kind,
        grid.rows(),
        grid.cols(),
        grid.blank_count(),
        path.display()
    ));
    Ok(())
}

fn draw_histogram(area: &Area<'_>, ticker: &str, values: &[f64]) -> Result<(), ChartError> {
    let bins = match histogram(values, HISTOGRAM_BINS) {
        Some(bins) => bins,
        None => {
            Logger::new("CHARTS").warn(&format!("{} has no values to plot", ticker));
            return Ok(());
        }
    };
    let x_min = bins[0].start;
    let x_max = bins[bins.len() - 1].end;
    let y_max = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64 * 1.1;

    let mut chart = ChartBuilder::on(area)
        .caption(format!("{} Returns", ticker), (FONT, 16))
        .margin(8)
        .x_label_area_size(35)
        .y_label_area_size(40)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(4)
        .y_labels(5)
        .x_label_formatter(&|x: &f64| format!("{:.3}", x))
        .x_desc("Return")
        .y_desc("Frequency")
        .draw()?;

    let fill = PALETTE[0].mix(0.7).filled();
    chart.draw_series(
        bins.iter()
            .map(|b| Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], fill)),
    )?;
    chart.draw_series(
        bins.iter()
            .map(|b| Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], BLACK.stroke_width(1))),
    )?;
    Ok(())
}

fn draw_boxplot(area: &Area<'_>, ticker: &str, values: &[f64]) -> Result<(), ChartError> {
    let stats = match BoxStats::from_values(values) {
        Some(stats) => stats,
        None => {
            Logger::new("CHARTS").warn(&format!("{} has no values to plot", ticker));
            return Ok(());
        }
    };
    let (low, high) = stats.extent();
    let (y_min, y_max) = value_range([low, high]);

    let mut chart = ChartBuilder::on(area)
        .caption(format!("{} Returns", ticker), (FONT, 16))
        .margin(8)
        .x_label_area_size(10)
        .y_label_area_size(50)
        .build_cartesian_2d(-1.0..1.0, y_min..y_max)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_labels(5)
        .y_desc("Return")
        .draw()?;

    let outline = BLACK.stroke_width(1);
    chart.draw_series(std::iter::once(Rectangle::new(
        [(-0.3, stats.q1), (0.3, stats.q3)],
        BOX_FILL.filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(-0.3, stats.q1), (0.3, stats.q3)],
        outline,
    )))?;
    chart.draw_series(vec![
        PathElement::new(vec![(-0.3, stats.median), (0.3, stats.median)], MA_COLOR.stroke_width(2)),
        PathElement::new(vec![(0.0, stats.q3), (0.0, stats.upper_whisker)], outline),
        PathElement::new(vec![(0.0, stats.q1), (0.0, stats.lower_whisker)], outline),
        PathElement::new(
            vec![(-0.15, stats.upper_whisker), (0.15, stats.upper_whisker)],
            outline,
        ),
        PathElement::new(
            vec![(-0.15, stats.lower_whisker), (0.15, stats.lower_whisker)],
            outline,
        ),
    ])?;
    chart.draw_series(
        stats
            .outliers
            .iter()
            .map(|v| Circle::new((0.0, *v), 3, outline)),
    )?;
    Ok(())
}

fn draw_panel(
    area: &Area<'_>,
    title: &str,
    dates: &[NaiveDate],
    values: &[f64],
) -> Result<(), ChartError> {
    let (y_min, y_max) = value_range(values.iter().copied());
    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 18))
        .margin(12)
        .x_label_area_size(30)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range(dates.len()), y_min..y_max)?;
    chart
        .configure_mesh()
        .x_labels(6)
        .x_label_formatter(&|x: &f64| axis_label(dates, *x))
        .draw()?;

    draw_line(&mut chart, positions(values), PRICE_COLOR, 1, None)
}

fn draw_correlogram(
    area: &Area<'_>,
    title: &str,
    values: &[f64],
    bands: &[f64],
) -> Result<(), ChartError> {
    let x_max = values.len() as f64 - 0.5;
    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 18))
        .margin(12)
        .x_label_area_size(30)
        .y_label_area_size(45)
        .build_cartesian_2d(-0.5..x_max, -1.1..1.1)?;
    chart
        .configure_mesh()
        .x_labels(6)
        .x_label_formatter(&|x: &f64| format!("{:.0}", x))
        .x_desc("Lag")
        .draw()?;

    // the band is centred on zero from lag 1 on
    let upper: Vec<(f64, f64)> = bands
        .iter()
        .enumerate()
        .skip(1)
        .map(|(lag, width)| (lag as f64, *width))
        .collect();
    let mut band = upper.clone();
    band.extend(upper.iter().rev().map(|(lag, width)| (*lag, -width)));
    if band.len() >= 3 {
        chart.draw_series(std::iter::once(Polygon::new(band, PRICE_COLOR.mix(0.15).filled())))?;
    }

    chart.draw_series(std::iter::once(PathElement::new(
        vec![(-0.5, 0.0), (x_max, 0.0)],
        BLACK.stroke_width(1),
    )))?;
    chart.draw_series(values.iter().enumerate().map(|(lag, v)| {
        PathElement::new(vec![(lag as f64, 0.0), (lag as f64, *v)], PRICE_COLOR.stroke_width(2))
    }))?;
    chart.draw_series(
        values
            .iter()
            .enumerate()
            .map(|(lag, v)| Circle::new((lag as f64, *v), 3, PRICE_COLOR.filled())),
    )?;
    Ok(())
}

// Missing values break the line instead of being bridged.
fn draw_line(
    chart: &mut Chart<'_, '_>,
    points: Vec<(f64, f64)>,
    color: RGBColor,
    width: u32,
    label: Option<String>,
) -> Result<(), ChartError> {
    let mut label = label;
    for segment in finite_segments(points) {
        let series = chart.draw_series(LineSeries::new(segment, color.stroke_width(width)))?;
        if let Some(text) = label.take() {
            series
                .label(text)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(width)));
        }
    }
    Ok(())
}

fn positions(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect()
}

/// Points of `table[ticker]` placed on the row positions of `dates`.
fn aligned_positions(dates: &[NaiveDate], table: &Table, ticker: &str) -> Option<Vec<(f64, f64)>> {
    let values = table.column(ticker)?;
    if table.index() == dates {
        return Some(positions(values));
    }
    Some(
        table
            .index()
            .iter()
            .zip(values)
            .filter_map(|(date, value)| {
                dates
                    .binary_search(date)
                    .ok()
                    .map(|position| (position as f64, *value))
            })
            .collect(),
    )
}

fn x_range(rows: usize) -> std::ops::Range<f64> {
    0.0..(rows.max(2) - 1) as f64
}

fn axis_label(dates: &[NaiveDate], x: f64) -> String {
    let position = x.round();
    if position < 0.0 || (x - position).abs() > 1e-6 {
        return String::new();
    }
    dates
        .get(position as usize)
        .map(|date| format_axis_date(*date))
        .unwrap_or_default()
}

fn prepare(path: &Path) -> Result<(), ChartError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
