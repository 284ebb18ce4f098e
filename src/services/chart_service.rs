//! Terminal chart for the monthly TON/RUB averages.
//!
//! Rows run from `CHART_HEIGHT` at the top down to 0. A sample sits on the
//! row equal to its bar height, everything under it is filled, and the three
//! characters between two columns are filled as well so neighbouring points
//! read as one connected area.

use rust_decimal::prelude::*;

use crate::models::{ChartInput, PriceSample, Trend};
use crate::utils::{fmt_change, fmt_money, fmt_percent, month_abbreviation, paint};

/// Number of rows above the baseline
pub const CHART_HEIGHT: u32 = 20;
/// Characters per sample column, point included
pub const COLUMN_WIDTH: usize = 4;
const LABEL_WIDTH: usize = 10;

const POINT: &str = "●";
const FILL: &str = "▒";
const BRIDGE_FULL: &str = "▒";
const BRIDGE_PARTIAL: &str = "░";
const EMPTY: &str = " ";

/// Value-to-row mapping shared by the grid labels and the bars
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartScale {
    pub min: Decimal,
    pub max: Decimal,
    /// `max - min`, or 1 when every price is equal
    pub range: Decimal,
}

impl ChartScale {
    pub fn from_prices<I>(prices: I) -> Option<Self>
    where
        I: IntoIterator<Item = Decimal>,
    {
        let mut iter = prices.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));

        let range = if max == min { Decimal::ONE } else { max - min };
        Some(Self { min, max, range })
    }

    /// Price printed next to `row`
    pub fn row_value(&self, row: u32) -> Decimal {
        self.min + self.range * Decimal::from(row) / Decimal::from(CHART_HEIGHT)
    }

    /// Row a price plots on. Truncates, so a price just under a row
    /// boundary lands on the row below.
    pub fn bar_height(&self, price: Decimal) -> u32 {
        let scaled = (price - self.min) * Decimal::from(CHART_HEIGHT) / self.range;
        scaled.floor().to_u32().unwrap_or(0).min(CHART_HEIGHT)
    }
}

/// Difference between two prices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceChange {
    pub absolute: Decimal,
    /// Relative to the earlier price; undefined when that price is zero
    pub percent: Option<Decimal>,
    pub trend: Trend,
}

impl PriceChange {
    pub fn between(previous: Decimal, current: Decimal) -> Self {
        let absolute = current - previous;
        Self {
            absolute,
            percent: (absolute * Decimal::ONE_HUNDRED).checked_div(previous),
            trend: Trend::between(previous, current),
        }
    }

    fn describe(&self) -> String {
        let text = format!(
            "{} {} RUB ({})",
            self.trend.arrow(),
            fmt_change(self.absolute),
            fmt_percent(self.percent)
        );
        paint(&text, Some(self.trend))
    }
}

/// Summary block under the legend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartStats {
    pub min: Decimal,
    pub max: Decimal,
    pub mean: Decimal,
    /// Real spread, zero for a flat series
    pub range: Decimal,
    pub total_change: PriceChange,
}

impl ChartStats {
    pub fn compute(input: &ChartInput) -> Self {
        let samples = input.samples();
        let first = samples[0].average_price;
        let last = samples[samples.len() - 1].average_price;

        let sum: Decimal = input.prices().sum();
        let mean = sum / Decimal::from(samples.len());

        let min = input.prices().fold(first, Decimal::min);
        let max = input.prices().fold(first, Decimal::max);

        Self {
            min,
            max,
            mean,
            range: max - min,
            total_change: PriceChange::between(first, last),
        }
    }
}

/// Trend of every sample against its predecessor; `None` for the first
pub fn sample_trends(samples: &[PriceSample]) -> Vec<Option<Trend>> {
    let mut trends = Vec::with_capacity(samples.len());
    trends.push(None);
    for pair in samples.windows(2) {
        trends.push(Some(Trend::between(pair[0].average_price, pair[1].average_price)));
    }
    trends.truncate(samples.len());
    trends
}

/// Full chart: title, grid, x-axis, legend and statistics
pub fn render_chart(input: &ChartInput) -> String {
    let samples = input.samples();
    // ChartInput is never empty
    let scale = match ChartScale::from_prices(input.prices()) {
        Some(scale) => scale,
        None => return String::new(),
    };
    let heights: Vec<u32> = samples.iter().map(|s| scale.bar_height(s.average_price)).collect();
    let trends = sample_trends(samples);

    let mut out = String::new();
    out.push_str(&format!("TON/RUB monthly average price, {}\n\n", input.year()));

    for row in (0..=CHART_HEIGHT).rev() {
        out.push_str(&render_row(row, &scale, &heights, &trends));
        out.push('\n');
    }

    out.push_str(&render_x_axis(samples));
    out.push('\n');
    out.push_str(&render_legend(samples));
    out.push('\n');
    out.push_str(&render_stats(&ChartStats::compute(input)));
    out
}

fn render_row(row: u32, scale: &ChartScale, heights: &[u32], trends: &[Option<Trend>]) -> String {
    let mut line = if row % 2 == 0 {
        format!("{:>width$} ┤", fmt_money(scale.row_value(row)), width = LABEL_WIDTH)
    } else {
        format!("{:>width$} │", "", width = LABEL_WIDTH)
    };

    for (i, &height) in heights.iter().enumerate() {
        let glyph = if height == row {
            POINT
        } else if row < height {
            FILL
        } else {
            EMPTY
        };
        line.push_str(&paint(glyph, trends[i]));

        let bridge = match heights.get(i + 1) {
            Some(&next) => {
                let covers_this = row <= height;
                let covers_next = row <= next;
                let fill = match (covers_this, covers_next) {
                    (true, true) => BRIDGE_FULL,
                    (true, false) | (false, true) => BRIDGE_PARTIAL,
                    (false, false) => EMPTY,
                };
                paint(&fill.repeat(COLUMN_WIDTH - 1), trends[i + 1])
            }
            None => EMPTY.repeat(COLUMN_WIDTH - 1),
        };
        line.push_str(&bridge);
    }

    line
}

fn render_x_axis(samples: &[PriceSample]) -> String {
    let mut out = format!("{:>width$} └{}\n", "", "─".repeat(COLUMN_WIDTH * samples.len()), width = LABEL_WIDTH);
    out.push_str(&" ".repeat(LABEL_WIDTH + 2));
    for sample in samples {
        out.push_str(&format!("{:<width$}", sample.month, width = COLUMN_WIDTH));
    }
    out.push('\n');
    out
}

fn render_legend(samples: &[PriceSample]) -> String {
    let mut out = String::from("Monthly averages:\n");
    let mut previous: Option<Decimal> = None;

    for sample in samples {
        let price = sample.average_price;
        let change = match previous {
            Some(prev) => PriceChange::between(prev, price).describe(),
            None => "(start of year)".to_string(),
        };
        out.push_str(&format!(
            "  {} {:>12} RUB  {}\n",
            month_abbreviation(sample.month),
            fmt_money(price),
            change
        ));
        previous = Some(price);
    }

    out
}

fn render_stats(stats: &ChartStats) -> String {
    format!(
        "Statistics:\n  Minimum:      {} RUB\n  Maximum:      {} RUB\n  Mean:         {} RUB\n  Range:        {} RUB\n  Total change: {}\n",
        fmt_money(stats.min),
        fmt_money(stats.max),
        fmt_money(stats.mean),
        fmt_money(stats.range),
        stats.total_change.describe()
    )
}
