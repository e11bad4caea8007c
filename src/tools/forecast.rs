// tools/forecast.rs
use super::{parse_args, to_value};
use crate::error::ToolError;
use crate::tool::Tool;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Simulation {
    pub steps: u32,
    pub initial_value: f64,
    pub growth_rate: f64,
    pub final_value: f64,
    pub values: Vec<f64>,
    /// Growth from the initial to the final value, in percent.
    pub total_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub trend: &'static str,
    pub slope: f64,
    pub intercept: f64,
    pub next_3_predictions: Vec<f64>,
}

/// Longest series `simulate_process` produces.
pub const MAX_STEPS: u32 = 10_000;

/// Compounds `initial_value` by `growth_rate` for `steps` values, the first
/// being the initial value itself.
pub fn simulate_process(
    steps: u32,
    initial_value: f64,
    growth_rate: f64,
) -> Result<Simulation, ToolError> {
    if initial_value == 0.0 {
        return Err(ToolError::failed("initial_value must be non-zero"));
    }
    if steps > MAX_STEPS {
        return Err(ToolError::failed(format!(
            "steps must be at most {}, got {}",
            MAX_STEPS, steps
        )));
    }

    let mut values = vec![initial_value];
    for _ in 1..steps {
        let last = values[values.len() - 1];
        values.push(last * (1.0 + growth_rate));
    }
    let final_value = values[values.len() - 1];

    Ok(Simulation {
        steps,
        initial_value,
        growth_rate,
        final_value,
        total_growth: (final_value - initial_value) / initial_value * 100.0,
        values,
    })
}

/// Least-squares line through the points `(i, data[i])`, extrapolated three
/// steps ahead.
pub fn predict_trend(historical_data: &[f64]) -> Result<Trend, ToolError> {
    if historical_data.len() < 2 {
        return Err(ToolError::failed("Need at least 2 data points"));
    }

    let n = historical_data.len() as f64;
    let x_sum: f64 = (0..historical_data.len()).map(|i| i as f64).sum();
    let y_sum: f64 = historical_data.iter().sum();
    let xy_sum: f64 = historical_data
        .iter()
        .enumerate()
        .map(|(i, y)| i as f64 * y)
        .sum();
    let x2_sum: f64 = (0..historical_data.len()).map(|i| (i * i) as f64).sum();

    let slope = (n * xy_sum - x_sum * y_sum) / (n * x2_sum - x_sum * x_sum);
    let intercept = (y_sum - slope * x_sum) / n;
    let next_3_predictions = (1..=3)
        .map(|i| intercept + slope * (n + i as f64 - 1.0))
        .collect();

    Ok(Trend {
        trend: if slope > 0.0 { "upward" } else { "downward" },
        slope,
        intercept,
        next_3_predictions,
    })
}

#[derive(Deserialize)]
struct SimulationArgs {
    #[serde(default = "default_steps")]
    steps: u32,
    #[serde(default = "default_initial_value")]
    initial_value: f64,
    #[serde(default = "default_growth_rate")]
    growth_rate: f64,
}

fn default_steps() -> u32 {
    10
}

fn default_initial_value() -> f64 {
    1.0
}

fn default_growth_rate() -> f64 {
    0.1
}

#[derive(Deserialize)]
struct TrendArgs {
    historical_data: Vec<f64>,
}

pub fn simulate_process_tool() -> Tool {
    Tool::new(
        "simulate_process",
        "Simulate processes over time",
        |args| {
            let params: SimulationArgs = parse_args(args)?;
            to_value(&simulate_process(
                params.steps,
                params.initial_value,
                params.growth_rate,
            )?)
        },
    )
    .with_parameter("steps", "int")
    .with_parameter("initial_value", "float")
    .with_parameter("growth_rate", "float")
}

pub fn predict_trend_tool() -> Tool {
    Tool::new(
        "predict_trend",
        "Predict future trend from historical data",
        |args| {
            let params: TrendArgs = parse_args(args)?;
            to_value(&predict_trend(&params.historical_data)?)
        },
    )
    .with_parameter("historical_data", "List[float]")
}
