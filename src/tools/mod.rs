// tools/mod.rs
//! Stateless tools the built-in roles register.
//!
//! Every tool has a plain Rust function doing the work and a `*_tool()`
//! constructor wrapping it behind the [`Tool`](crate::tool::Tool) contract:
//! named JSON arguments in, JSON value out.

pub mod analysis;
pub mod forecast;
pub mod knowledge;
pub mod math;
pub mod planning;

use crate::error::ToolError;
use crate::tool::Args;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Reads a tool's arguments into its typed parameter struct.
pub(crate) fn parse_args<T: DeserializeOwned>(args: &Args) -> Result<T, ToolError> {
    Ok(serde_json::from_value(Value::Object(args.clone()))?)
}

pub(crate) fn to_value<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::failed(e.to_string()))
}

/// Descriptive entry of the tool catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub parameters: &'static [(&'static str, &'static str)],
}

/// Every tool shipped with the crate.
pub fn catalog() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "calculate_expression",
            category: "math",
            description: "Evaluate an arithmetic expression",
            parameters: &[("expression", "str")],
        },
        ToolSpec {
            name: "add_numbers",
            category: "math",
            description: "Add two numbers",
            parameters: &[("a", "float"), ("b", "float")],
        },
        ToolSpec {
            name: "multiply_numbers",
            category: "math",
            description: "Multiply two numbers",
            parameters: &[("a", "float"), ("b", "float")],
        },
        ToolSpec {
            name: "divide_numbers",
            category: "math",
            description: "Divide two numbers",
            parameters: &[("a", "float"), ("b", "float")],
        },
        ToolSpec {
            name: "calculate_average",
            category: "math",
            description: "Average of a list of numbers",
            parameters: &[("numbers", "List[float]")],
        },
        ToolSpec {
            name: "analyze_data",
            category: "analysis",
            description: "Analyze a list of numbers and return statistics",
            parameters: &[("data", "List[float]")],
        },
        ToolSpec {
            name: "find_patterns",
            category: "analysis",
            description: "Find patterns in a list of numbers",
            parameters: &[("data", "List[float]")],
        },
        ToolSpec {
            name: "predict_trend",
            category: "simulation",
            description: "Predict future trend from historical data",
            parameters: &[("historical_data", "List[float]")],
        },
        ToolSpec {
            name: "simulate_process",
            category: "simulation",
            description: "Simulate a compounding process over time",
            parameters: &[
                ("steps", "int"),
                ("initial_value", "float"),
                ("growth_rate", "float"),
            ],
        },
        ToolSpec {
            name: "break_down_task",
            category: "task_management",
            description: "Break down a complex task into subtasks",
            parameters: &[("task_description", "str"), ("num_subtasks", "int")],
        },
        ToolSpec {
            name: "prioritize_tasks",
            category: "task_management",
            description: "Prioritize a list of tasks",
            parameters: &[("tasks", "List[str]")],
        },
        ToolSpec {
            name: "search_knowledge_base",
            category: "information",
            description: "Search a knowledge base for information",
            parameters: &[("query", "str")],
        },
        ToolSpec {
            name: "extract_information",
            category: "information",
            description: "Count keyword occurrences in a text",
            parameters: &[("text", "str"), ("keywords", "List[str]")],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_names_are_unique() {
        let specs = catalog();
        let names: HashSet<&str> = specs.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), specs.len());
    }

    #[test]
    fn test_parse_args_reports_bad_input() {
        #[derive(serde::Deserialize)]
        struct Params {
            #[allow(dead_code)]
            data: Vec<f64>,
        }

        let mut args = Args::new();
        args.insert("data".to_string(), Value::from("nope"));
        let err = parse_args::<Params>(&args).err().unwrap();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
