//! Chart input models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::ChartError;

/// A raw price observation from the API
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

/// Average price of one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSample {
    pub month: u32,
    pub average_price: Decimal,
}

impl PriceSample {
    pub fn new(month: u32, average_price: Decimal) -> Self {
        Self { month, average_price }
    }
}

/// Direction of a sample relative to its predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increase,
    Decrease,
    Neutral,
}

impl Trend {
    pub fn between(previous: Decimal, current: Decimal) -> Self {
        if current > previous {
            Trend::Increase
        } else if current < previous {
            Trend::Decrease
        } else {
            Trend::Neutral
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Increase => "↑",
            Trend::Decrease => "↓",
            Trend::Neutral => "→",
        }
    }
}

/// Monthly samples for one year, in calendar order.
///
/// Non-empty, at most 12 entries, months in 1..=12 and strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartInput {
    year: i32,
    samples: Vec<PriceSample>,
}

impl ChartInput {
    pub fn new(year: i32, samples: Vec<PriceSample>) -> Result<Self, ChartError> {
        if samples.is_empty() {
            return Err(ChartError::NoData);
        }
        if samples.len() > 12 {
            return Err(ChartError::TooManySamples(samples.len()));
        }

        let mut previous: Option<u32> = None;
        for sample in &samples {
            if !(1..=12).contains(&sample.month) {
                return Err(ChartError::InvalidMonth(sample.month));
            }
            if let Some(prev) = previous {
                if sample.month <= prev {
                    return Err(ChartError::OutOfOrder(sample.month, prev));
                }
            }
            previous = Some(sample.month);
        }

        Ok(Self { year, samples })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn prices(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.samples.iter().map(|s| s.average_price)
    }

    pub fn month_count(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(month: u32, price: i64) -> PriceSample {
        PriceSample::new(month, Decimal::from(price))
    }

    #[test]
    fn test_empty_input_is_no_data() {
        assert_eq!(ChartInput::new(2026, vec![]), Err(ChartError::NoData));
    }

    #[test]
    fn test_months_must_increase() {
        let result = ChartInput::new(2026, vec![sample(3, 10), sample(2, 11)]);
        assert_eq!(result, Err(ChartError::OutOfOrder(2, 3)));

        let dup = ChartInput::new(2026, vec![sample(3, 10), sample(3, 11)]);
        assert_eq!(dup, Err(ChartError::OutOfOrder(3, 3)));
    }

    #[test]
    fn test_month_range_checked() {
        assert_eq!(
            ChartInput::new(2026, vec![sample(13, 10)]),
            Err(ChartError::InvalidMonth(13))
        );
        assert_eq!(
            ChartInput::new(2026, vec![sample(0, 10)]),
            Err(ChartError::InvalidMonth(0))
        );
    }

    #[test]
    fn test_order_is_preserved() {
        let input = ChartInput::new(2026, vec![sample(1, 5), sample(4, 3), sample(9, 7)]).unwrap();
        let months: Vec<u32> = input.samples().iter().map(|s| s.month).collect();
        assert_eq!(months, vec![1, 4, 9]);
        assert_eq!(input.month_count(), 3);
        assert_eq!(input.year(), 2026);
    }

    #[test]
    fn test_trend_between() {
        let a = Decimal::from(100);
        let b = Decimal::from(150);
        assert_eq!(Trend::between(a, b), Trend::Increase);
        assert_eq!(Trend::between(b, a), Trend::Decrease);
        assert_eq!(Trend::between(a, a), Trend::Neutral);
        assert_eq!(Trend::Neutral.arrow(), "→");
    }
}
