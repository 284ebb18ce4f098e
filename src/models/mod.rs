//! Data models shared by commands and services
//!
//! Each model is either service input (samples, observations) or the
//! result a command formats for the terminal.

pub mod chart;
pub mod rate;

pub use chart::{ChartInput, PriceObservation, PriceSample, Trend};
pub use rate::{ConversionResult, Direction, QuoteOrigin, RateQuote};
