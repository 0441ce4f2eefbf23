//! Public types for the visualization module.

use std::str::FromStr;
use thiserror::Error;

/// Chart shapes supported for bucket sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// One bar per bucket (suits yearly and quarterly views).
    Bar,
    /// Connected line (suits weekly and daily views).
    Line,
    /// Filled area from zero (suits monthly views).
    Area,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown chart kind `{0}` (expected bar, line or area)")]
pub struct ParseChartKindError(pub String);

impl FromStr for ChartKind {
    type Err = ParseChartKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartKind::Bar),
            "line" => Ok(ChartKind::Line),
            "area" => Ok(ChartKind::Area),
            _ => Err(ParseChartKindError(s.to_string())),
        }
    }
}
