// roles.rs
//! Built-in agent roles.
//!
//! Every role registers its tools and a single QUERY handler. The handler
//! reads the `type` field of the payload, runs the matching tool and answers
//! the sender with a RESPONSE carrying the wrapped tool result, or with an
//! ERROR when the payload is unusable or a tool fails.

use crate::agent::{Agent, Context};
use crate::error::Result;
use crate::message::{Message, MessageKind, Payload};
use crate::tool::{Args, ToolOutcome};
use crate::tools::{analysis, forecast, knowledge, math, planning};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

pub const ANALYZER: &str = "Analyzer";
pub const PLANNER: &str = "Planner";
pub const EXECUTOR: &str = "Executor";
pub const KNOWLEDGE: &str = "Knowledge";
pub const COORDINATOR: &str = "Coordinator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Analyzer,
    Planner,
    Executor,
    Knowledge,
    Coordinator,
}

impl Role {
    pub fn default_name(&self) -> &'static str {
        match self {
            Role::Analyzer => ANALYZER,
            Role::Planner => PLANNER,
            Role::Executor => EXECUTOR,
            Role::Knowledge => KNOWLEDGE,
            Role::Coordinator => COORDINATOR,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Analyzer => "Data Analysis and Pattern Detection",
            Role::Planner => "Task Planning and Prioritization",
            Role::Executor => "Task Execution and Calculation",
            Role::Knowledge => "Information Management",
            Role::Coordinator => "Inter-Agent Coordination",
        }
    }

    /// Builds an agent of this role under `name`.
    ///
    /// A coordinator built this way gets its own workflow table; use
    /// [`coordinator`] to keep a handle on it.
    pub fn build(&self, name: &str) -> Result<Agent> {
        match self {
            Role::Analyzer => analyzer(name),
            Role::Planner => planner(name),
            Role::Executor => executor(name),
            Role::Knowledge => knowledge(name, knowledge::KnowledgeBase::with_defaults()),
            Role::Coordinator => coordinator(name, Workflows::new()),
        }
    }
}

fn error_reply(message: &Message, error: impl Into<String>) -> Message {
    let error = error.into();
    let mut payload = Payload::new();
    payload.insert("error".to_string(), Value::String(error.clone()));
    message.reply(MessageKind::Error, error).with_payload(payload)
}

/// Reads a QUERY payload into `T`, filling in `default_type` when the payload
/// carries no `type`.
fn typed_query<T: DeserializeOwned>(
    message: &Message,
    default_type: &str,
    known: &[&str],
) -> std::result::Result<T, String> {
    let mut payload = message.payload().clone();
    let query_type = match payload.get("type") {
        None => default_type.to_string(),
        Some(Value::String(query_type)) => query_type.clone(),
        Some(other) => return Err(format!("Query type must be a string, got {}", other)),
    };
    if !known.contains(&query_type.as_str()) {
        return Err(format!("Unknown query type: {}", query_type));
    }
    payload.insert("type".to_string(), Value::String(query_type));

    serde_json::from_value(Value::Object(payload)).map_err(|e| format!("Malformed payload: {}", e))
}

fn args(value: Value) -> Args {
    match value {
        Value::Object(map) => map,
        _ => Args::new(),
    }
}

/// Runs one tool and turns the outcome into the reply to `message`.
fn tool_reply(ctx: &Context<'_>, message: &Message, tool: &str, args: &Args, done: &str) -> Message {
    match ctx.use_tool(tool, args) {
        Ok(ToolOutcome::Success { result }) => {
            let mut payload = Payload::new();
            payload.insert("status".to_string(), json!("success"));
            payload.insert("result".to_string(), result);
            message.reply(MessageKind::Response, done).with_payload(payload)
        }
        Ok(ToolOutcome::Error { error }) => error_reply(message, format!("{}: {}", tool, error)),
        Err(err) => error_reply(message, err.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum AnalysisType {
    Full,
    Statistics,
    Patterns,
    Trend,
}

#[derive(Deserialize)]
struct AnalysisQuery {
    #[serde(rename = "type")]
    analysis: AnalysisType,
    #[serde(default)]
    data: Vec<f64>,
}

pub fn analyzer(name: &str) -> Result<Agent> {
    let mut agent = Agent::new(name, Role::Analyzer.description());
    agent.register_tool(analysis::analyze_data_tool());
    agent.register_tool(analysis::find_patterns_tool());
    agent.register_tool(forecast::predict_trend_tool());

    agent.register_handler(MessageKind::Query, |ctx, message| {
        let query: AnalysisQuery = match typed_query(
            message,
            "full",
            &["full", "statistics", "patterns", "trend"],
        ) {
            Ok(query) => query,
            Err(error) => return Some(error_reply(message, error)),
        };

        let wanted = |kind: AnalysisType| query.analysis == AnalysisType::Full || query.analysis == kind;
        let mut steps = Vec::new();
        if wanted(AnalysisType::Statistics) {
            steps.push(("statistics", "analyze_data", json!({ "data": query.data })));
        }
        if wanted(AnalysisType::Patterns) {
            steps.push(("patterns", "find_patterns", json!({ "data": query.data })));
        }
        if wanted(AnalysisType::Trend) {
            steps.push(("trend", "predict_trend", json!({ "historical_data": query.data })));
        }

        let mut payload = Payload::new();
        let mut failures = Vec::new();
        for (key, tool, tool_args) in steps {
            let outcome = match ctx.use_tool(tool, &args(tool_args)) {
                Ok(outcome) => outcome,
                Err(err) => return Some(error_reply(message, err.to_string())),
            };
            if let Some(error) = outcome.error() {
                failures.push(format!("{}: {}", key, error));
            }
            payload.insert(key.to_string(), outcome.to_value());
        }

        if failures.is_empty() {
            Some(message.reply(MessageKind::Response, "Analysis complete").with_payload(payload))
        } else {
            let error = format!("Analysis error: {}", failures.join("; "));
            payload.insert("error".to_string(), Value::String(error.clone()));
            Some(message.reply(MessageKind::Error, error).with_payload(payload))
        }
    })?;

    Ok(agent)
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum PlanningQuery {
    Breakdown {
        task: String,
        num_subtasks: Option<usize>,
    },
    Prioritize {
        #[serde(default)]
        tasks: Vec<String>,
    },
}

pub fn planner(name: &str) -> Result<Agent> {
    let mut agent = Agent::new(name, Role::Planner.description());
    agent.register_tool(planning::break_down_task_tool());
    agent.register_tool(planning::prioritize_tasks_tool());

    agent.register_handler(MessageKind::Query, |ctx, message| {
        let query: PlanningQuery =
            match typed_query(message, "breakdown", &["breakdown", "prioritize"]) {
                Ok(query) => query,
                Err(error) => return Some(error_reply(message, error)),
            };

        let reply = match query {
            PlanningQuery::Breakdown { task, num_subtasks } => {
                let mut tool_args = args(json!({ "task_description": task }));
                if let Some(n) = num_subtasks {
                    tool_args.insert("num_subtasks".to_string(), json!(n));
                }
                tool_reply(ctx, message, "break_down_task", &tool_args, "Planning complete")
            }
            PlanningQuery::Prioritize { tasks } => tool_reply(
                ctx,
                message,
                "prioritize_tasks",
                &args(json!({ "tasks": tasks })),
                "Planning complete",
            ),
        };
        Some(reply)
    })?;

    Ok(agent)
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ExecutionQuery {
    Calculate {
        expression: String,
    },
    Simulate {
        steps: Option<u32>,
        initial_value: Option<f64>,
        growth_rate: Option<f64>,
    },
}

pub fn executor(name: &str) -> Result<Agent> {
    let mut agent = Agent::new(name, Role::Executor.description());
    agent.register_tool(math::calculate_expression_tool());
    agent.register_tool(forecast::simulate_process_tool());

    agent.register_handler(MessageKind::Query, |ctx, message| {
        let query: ExecutionQuery =
            match typed_query(message, "calculate", &["calculate", "simulate"]) {
                Ok(query) => query,
                Err(error) => return Some(error_reply(message, error)),
            };

        let reply = match query {
            ExecutionQuery::Calculate { expression } => tool_reply(
                ctx,
                message,
                "calculate_expression",
                &args(json!({ "expression": expression })),
                "Execution complete",
            ),
            ExecutionQuery::Simulate {
                steps,
                initial_value,
                growth_rate,
            } => {
                let mut tool_args = Args::new();
                if let Some(steps) = steps {
                    tool_args.insert("steps".to_string(), json!(steps));
                }
                if let Some(initial_value) = initial_value {
                    tool_args.insert("initial_value".to_string(), json!(initial_value));
                }
                if let Some(growth_rate) = growth_rate {
                    tool_args.insert("growth_rate".to_string(), json!(growth_rate));
                }
                tool_reply(ctx, message, "simulate_process", &tool_args, "Execution complete")
            }
        };
        Some(reply)
    })?;

    Ok(agent)
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum KnowledgeQuery {
    Search {
        query: String,
    },
    Extract {
        text: String,
        #[serde(default)]
        keywords: Vec<String>,
    },
}

pub fn knowledge(name: &str, base: knowledge::KnowledgeBase) -> Result<Agent> {
    let mut agent = Agent::new(name, Role::Knowledge.description());
    agent.register_tool(knowledge::search_knowledge_base_tool(Arc::new(base)));
    agent.register_tool(knowledge::extract_information_tool());

    agent.register_handler(MessageKind::Query, |ctx, message| {
        let query: KnowledgeQuery = match typed_query(message, "search", &["search", "extract"]) {
            Ok(query) => query,
            Err(error) => return Some(error_reply(message, error)),
        };

        let reply = match query {
            KnowledgeQuery::Search { query } => tool_reply(
                ctx,
                message,
                "search_knowledge_base",
                &args(json!({ "query": query })),
                "Query processed",
            ),
            KnowledgeQuery::Extract { text, keywords } => tool_reply(
                ctx,
                message,
                "extract_information",
                &args(json!({ "text": text, "keywords": keywords })),
                "Query processed",
            ),
        };
        Some(reply)
    })?;

    Ok(agent)
}

/// Kind of sub-task a coordinator can hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Analyze,
    Plan,
    Execute,
    Search,
}

impl TaskKind {
    /// Agent a task of this kind goes to unless the task names one.
    pub fn target(&self) -> &'static str {
        match self {
            TaskKind::Analyze => ANALYZER,
            TaskKind::Plan => PLANNER,
            TaskKind::Execute => EXECUTOR,
            TaskKind::Search => KNOWLEDGE,
        }
    }
}

/// One sub-task of a workflow. `payload` becomes the delegated query's
/// payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default)]
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delegation {
    pub agent: String,
    pub message_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    /// Tasks have been handed out; replies are not tracked.
    Coordinating,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workflow {
    pub id: String,
    pub tasks: Vec<TaskSpec>,
    pub status: WorkflowStatus,
    pub delegated: Vec<Delegation>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct WorkflowTable {
    workflows: BTreeMap<String, Workflow>,
    next_id: u64,
}

impl WorkflowTable {
    fn assign_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("workflow-{}", self.next_id);
            if !self.workflows.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Shared handle on a coordinator's workflow table.
#[derive(Debug, Clone, Default)]
pub struct Workflows {
    table: Arc<RwLock<WorkflowTable>>,
}

impl Workflows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the workflow registered under `id`.
    pub fn status(&self, id: &str) -> Option<Workflow> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.workflows.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.workflows.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Deserialize)]
struct CoordinationQuery {
    workflow_id: Option<String>,
    #[serde(default)]
    tasks: Vec<TaskSpec>,
}

/// Coordinator: fans a workflow's tasks out to the agents that handle them.
pub fn coordinator(name: &str, workflows: Workflows) -> Result<Agent> {
    let mut agent = Agent::new(name, Role::Coordinator.description());

    agent.register_handler(MessageKind::Query, move |ctx, message| {
        let query: CoordinationQuery =
            match serde_json::from_value(Value::Object(message.payload().clone())) {
                Ok(query) => query,
                Err(e) => return Some(error_reply(message, format!("Malformed workflow: {}", e))),
            };

        let mut table = workflows.table.write().unwrap_or_else(PoisonError::into_inner);
        let workflow_id = match query.workflow_id {
            Some(id) if table.workflows.contains_key(&id) => {
                warn!("{}: workflow {} already exists", ctx.name(), id);
                return Some(error_reply(message, format!("Workflow {} already exists", id)));
            }
            Some(id) => id,
            None => table.assign_id(),
        };

        let delegated = query
            .tasks
            .iter()
            .map(|task| {
                let target = task.agent.clone().unwrap_or_else(|| task.kind.target().to_string());
                let mut payload = task.payload.clone();
                payload.insert("workflow_id".to_string(), json!(workflow_id));
                let message_id = ctx.send(
                    target.clone(),
                    format!("Task for workflow {}", workflow_id),
                    MessageKind::Query,
                    payload,
                );
                Delegation {
                    agent: target,
                    message_id,
                }
            })
            .collect();

        info!(
            "{}: workflow {} started with {} task(s)",
            ctx.name(),
            workflow_id,
            query.tasks.len()
        );
        let task_count = query.tasks.len();
        table.workflows.insert(
            workflow_id.clone(),
            Workflow {
                id: workflow_id.clone(),
                tasks: query.tasks,
                status: WorkflowStatus::Coordinating,
                delegated,
                created_at: Utc::now(),
            },
        );

        let mut payload = Payload::new();
        payload.insert("workflow_id".to_string(), json!(workflow_id));
        payload.insert("task_count".to_string(), json!(task_count));
        Some(
            message
                .reply(MessageKind::Response, format!("Workflow {} initialized", workflow_id))
                .with_payload(payload),
        )
    })?;

    Ok(agent)
}
