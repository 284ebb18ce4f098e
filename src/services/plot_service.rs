use std::path::Path;

use plotters::prelude::*;
use rust_decimal::prelude::*;

use crate::models::ChartInput;
use crate::utils::{month_abbreviation, ChartError};

pub const DEFAULT_WIDTH: u32 = 1024;
pub const DEFAULT_HEIGHT: u32 = 576;

/// Price axis bounds with 10% padding; a flat series gets 1% of its price
fn y_bounds(prices: &[f64]) -> (f64, f64) {
    let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let price_range = (max_price - min_price).max(max_price.abs() * 0.01).max(1e-8);
    let padding = price_range * 0.1;
    ((min_price - padding).max(0.0), max_price + padding)
}

/// Write the monthly series as a PNG line chart
pub fn render_png(input: &ChartInput, path: &Path, width: u32, height: u32) -> Result<(), ChartError> {
    let points: Vec<(u32, f64)> = input
        .samples()
        .iter()
        .map(|s| (s.month, s.average_price.to_f64().unwrap_or(0.0)))
        .collect();
    let prices: Vec<f64> = points.iter().map(|&(_, p)| p).collect();
    let (y_min, y_max) = y_bounds(&prices);

    let backend = BitMapBackend::new(path, (width, height));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| ChartError::Drawing(format!("Failed to fill canvas: {}", e)))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            &format!("TON/RUB monthly average, {}", input.year()),
            ("sans-serif", 32.0).into_font(),
        )
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(1u32..12u32, y_min..y_max)
        .map_err(|e| ChartError::Drawing(format!("Failed to build chart: {}", e)))?;

    chart
        .configure_mesh()
        .x_labels(12)
        .x_label_formatter(&|m| month_abbreviation(*m).to_string())
        .y_desc("RUB per 1 TON")
        .x_desc("Month")
        .draw()
        .map_err(|e| ChartError::Drawing(format!("Failed to draw mesh: {}", e)))?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
        .map_err(|e| ChartError::Drawing(format!("Failed to draw line: {}", e)))?;

    chart
        .draw_series(points.iter().map(|&(m, p)| Circle::new((m, p), 4, BLUE.filled())))
        .map_err(|e| ChartError::Drawing(format!("Failed to draw point: {}", e)))?;

    root.present()
        .map_err(|e| ChartError::Drawing(format!("Failed to render chart: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceSample;
    use std::path::PathBuf;

    fn example() -> ChartInput {
        let samples = [(1, 100), (2, 150), (3, 150), (4, 90)]
            .iter()
            .map(|&(m, p)| PriceSample::new(m, Decimal::from(p)))
            .collect();
        ChartInput::new(2026, samples).unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        std::env::temp_dir().join(format!("tonrub-plot-{}-{}-{}", std::process::id(), name, nanos))
    }

    #[test]
    fn test_render_png_writes_image() {
        let dir = temp_dir("ok");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("chart.png");

        render_png(&example(), &path, 320, 240).unwrap();

        let size = std::fs::metadata(&path).unwrap().len();
        assert!(size > 0);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_render_png_into_missing_directory_is_drawing_error() {
        let path = temp_dir("missing").join("nested").join("chart.png");

        let err = render_png(&example(), &path, 320, 240).unwrap_err();
        assert!(matches!(err, ChartError::Drawing(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_y_bounds_pads_range() {
        let (lo, hi) = y_bounds(&[90.0, 150.0]);
        assert!((lo - 84.0).abs() < 1e-9);
        assert!((hi - 156.0).abs() < 1e-9);
    }

    #[test]
    fn test_y_bounds_flat_series() {
        let (lo, hi) = y_bounds(&[200.0]);
        assert!(lo < 200.0 && hi > 200.0);
        assert!((hi - lo - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_y_bounds_never_negative() {
        let (lo, _) = y_bounds(&[0.5, 100.0]);
        assert_eq!(lo, 0.0);
    }
}
