// tool.rs
use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Named arguments handed to a tool.
pub type Args = Map<String, Value>;

type ToolFn = dyn Fn(&Args) -> Result<Value, ToolError> + Send + Sync;

/// A capability an agent can invoke by name.
#[derive(Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// Parameter name to a short type description, for reporting only.
    pub parameters: BTreeMap<String, String>,
    func: Arc<ToolFn>,
}

impl Tool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Args) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: BTreeMap::new(),
            func: Arc::new(func),
        }
    }

    pub fn with_parameter(mut self, name: &str, ty: &str) -> Self {
        self.parameters.insert(name.to_string(), ty.to_string());
        self
    }

    /// Runs the tool. Errors and panics both come back as an error outcome.
    pub fn execute(&self, args: &Args) -> ToolOutcome {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.func)(args))) {
            Ok(Ok(result)) => ToolOutcome::Success { result },
            Ok(Err(err)) => ToolOutcome::Error {
                error: err.to_string(),
            },
            Err(panic) => ToolOutcome::Error {
                error: panic_message(panic.as_ref()),
            },
        }
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("tool panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("tool panicked: {}", message)
    } else {
        "tool panicked".to_string()
    }
}

/// Wrapped result of a tool invocation.
///
/// Serializes as `{"status": "success", "result": ...}` or
/// `{"status": "error", "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolOutcome {
    Success { result: Value },
    Error { error: String },
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ToolOutcome::Error { error } => Some(error),
            ToolOutcome::Success { .. } => None,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Per-agent tool registry. Re-registering a name replaces the old tool.
#[derive(Debug, Clone, Default)]
pub struct Toolbox {
    tools: BTreeMap<String, Tool>,
}

impl Toolbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tool that was replaced, if any.
    pub fn insert(&mut self, tool: Tool) -> Option<Tool> {
        self.tools.insert(tool.name.clone(), tool)
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo() -> Tool {
        Tool::new("echo", "Returns its arguments", |args| Ok(Value::Object(args.clone())))
    }

    #[test]
    fn test_success_outcome() {
        let mut args = Args::new();
        args.insert("x".to_string(), json!(1));

        let outcome = echo().execute(&args);
        assert!(outcome.is_success());
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "status": "success", "result": { "x": 1 } })
        );
        assert_eq!(outcome.to_value(), serde_json::to_value(&outcome).unwrap());
    }

    #[test]
    fn test_error_outcome() {
        let tool = Tool::new("fail", "Always fails", |_| Err(ToolError::failed("boom")));
        let outcome = tool.execute(&Args::new());

        assert_eq!(outcome.error(), Some("boom"));
        assert_eq!(outcome.to_value()["status"], "error");
    }

    #[test]
    fn test_panic_is_contained() {
        let tool = Tool::new("panic", "Panics", |_| panic!("bad input"));
        let outcome = tool.execute(&Args::new());

        assert!(!outcome.is_success());
        assert!(outcome.error().unwrap().contains("bad input"));
    }

    #[test]
    fn test_toolbox_overwrite() {
        let mut toolbox = Toolbox::new();
        assert!(toolbox.insert(echo()).is_none());
        assert!(toolbox.insert(echo()).is_some());
        assert_eq!(toolbox.len(), 1);
        assert_eq!(toolbox.names(), vec!["echo".to_string()]);
    }
}
