// tools/analysis.rs
use super::{parse_args, to_value};
use crate::error::ToolError;
use crate::tool::Tool;
use serde::{Deserialize, Serialize};

/// Summary statistics of a numeric series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

/// Step-to-step behaviour of a numeric series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patterns {
    pub differences: Vec<f64>,
    pub avg_difference: f64,
    pub is_increasing: bool,
    pub is_decreasing: bool,
}

pub fn analyze_data(data: &[f64]) -> Result<Statistics, ToolError> {
    if data.is_empty() {
        return Err(ToolError::failed("Cannot analyze empty data"));
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let sum: f64 = data.iter().sum();
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };
    let min = sorted[0];
    let max = sorted[n - 1];

    Ok(Statistics {
        count: n,
        sum,
        mean: sum / n as f64,
        median,
        min,
        max,
        range: max - min,
    })
}

pub fn find_patterns(data: &[f64]) -> Result<Patterns, ToolError> {
    if data.len() < 2 {
        return Err(ToolError::failed("Need at least 2 data points"));
    }

    let differences: Vec<f64> = data.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let avg_difference = differences.iter().sum::<f64>() / differences.len() as f64;

    Ok(Patterns {
        is_increasing: differences.iter().all(|d| *d >= 0.0),
        is_decreasing: differences.iter().all(|d| *d <= 0.0),
        differences,
        avg_difference,
    })
}

#[derive(Deserialize)]
struct DataArgs {
    data: Vec<f64>,
}

pub fn analyze_data_tool() -> Tool {
    Tool::new(
        "analyze_data",
        "Analyze numerical data for statistics",
        |args| {
            let params: DataArgs = parse_args(args)?;
            to_value(&analyze_data(&params.data)?)
        },
    )
    .with_parameter("data", "List[float]")
}

pub fn find_patterns_tool() -> Tool {
    Tool::new("find_patterns", "Find patterns in data", |args| {
        let params: DataArgs = parse_args(args)?;
        to_value(&find_patterns(&params.data)?)
    })
    .with_parameter("data", "List[float]")
}
