// tools/planning.rs
use super::{parse_args, to_value};
use crate::tool::Tool;
use serde::{Deserialize, Serialize};

const PHASES: [&str; 6] = ["analyze", "prepare", "execute", "review", "finalize", "optimize"];

/// Keyword to urgency score; the first keyword found in a task wins.
const URGENCY: [(&str, u8); 7] = [
    ("urgent", 5),
    ("critical", 5),
    ("important", 4),
    ("high", 4),
    ("medium", 3),
    ("low", 2),
    ("minor", 1),
];

const DEFAULT_PRIORITY: u8 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subtask {
    pub id: usize,
    pub title: String,
    pub priority: f64,
    pub estimated_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub original_task: String,
    pub subtasks: Vec<Subtask>,
    pub total_subtasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTask {
    pub task: String,
    pub priority: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prioritized {
    pub total_tasks: usize,
    pub prioritized_tasks: Vec<ScoredTask>,
}

/// Splits a task into at most six phase subtasks, most urgent first.
pub fn break_down_task(task_description: &str, num_subtasks: usize) -> Breakdown {
    let excerpt: String = task_description.chars().take(30).collect();
    let subtasks: Vec<Subtask> = PHASES
        .iter()
        .take(num_subtasks)
        .enumerate()
        .map(|(i, phase)| Subtask {
            id: i + 1,
            title: format!("{} - Part of {}...", capitalize(phase), excerpt),
            priority: (num_subtasks - i) as f64 / num_subtasks as f64,
            estimated_time: format!("{} minutes", (i + 1) * 10),
        })
        .collect();

    Breakdown {
        original_task: task_description.to_string(),
        total_subtasks: subtasks.len(),
        subtasks,
    }
}

/// Scores tasks by urgency keywords and orders them by score, keeping the
/// input order among equal scores.
pub fn prioritize_tasks(tasks: &[String]) -> Prioritized {
    let mut scored: Vec<ScoredTask> = tasks
        .iter()
        .map(|task| ScoredTask {
            task: task.clone(),
            priority: urgency(task),
        })
        .collect();
    scored.sort_by(|a, b| b.priority.cmp(&a.priority));

    Prioritized {
        total_tasks: tasks.len(),
        prioritized_tasks: scored,
    }
}

fn urgency(task: &str) -> u8 {
    let lowered = task.to_lowercase();
    URGENCY
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, score)| (*score).max(DEFAULT_PRIORITY))
        .unwrap_or(DEFAULT_PRIORITY)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Deserialize)]
struct BreakdownArgs {
    task_description: String,
    #[serde(default = "default_subtasks")]
    num_subtasks: usize,
}

fn default_subtasks() -> usize {
    3
}

#[derive(Deserialize)]
struct PrioritizeArgs {
    tasks: Vec<String>,
}

pub fn break_down_task_tool() -> Tool {
    Tool::new(
        "break_down_task",
        "Break down complex tasks into subtasks",
        |args| {
            let params: BreakdownArgs = parse_args(args)?;
            to_value(&break_down_task(&params.task_description, params.num_subtasks))
        },
    )
    .with_parameter("task_description", "str")
    .with_parameter("num_subtasks", "int")
}

pub fn prioritize_tasks_tool() -> Tool {
    Tool::new(
        "prioritize_tasks",
        "Prioritize tasks by importance",
        |args| {
            let params: PrioritizeArgs = parse_args(args)?;
            to_value(&prioritize_tasks(&params.tasks))
        },
    )
    .with_parameter("tasks", "List[str]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::Args;

    #[test]
    fn test_breakdown() {
        let plan = break_down_task("Develop new feature", 3);
        assert_eq!(plan.total_subtasks, 3);
        assert_eq!(plan.subtasks[0].title, "Analyze - Part of Develop new feature...");
        assert_eq!(plan.subtasks[0].priority, 1.0);
        assert_eq!(plan.subtasks[2].estimated_time, "30 minutes");
    }

    #[test]
    fn test_breakdown_is_capped() {
        assert_eq!(break_down_task("x", 10).total_subtasks, 6);
        assert_eq!(break_down_task("x", 0).total_subtasks, 0);
    }

    #[test]
    fn test_breakdown_truncates_long_descriptions() {
        let long = "a".repeat(50);
        let plan = break_down_task(&long, 1);
        assert_eq!(plan.subtasks[0].title, format!("Analyze - Part of {}...", "a".repeat(30)));
    }

    #[test]
    fn test_prioritize() {
        let tasks: Vec<String> = ["tidy up", "Fix CRITICAL bug", "minor typo", "important review"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let result = prioritize_tasks(&tasks);

        let order: Vec<(&str, u8)> = result
            .prioritized_tasks
            .iter()
            .map(|t| (t.task.as_str(), t.priority))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Fix CRITICAL bug", 5),
                ("important review", 4),
                ("tidy up", 2),
                ("minor typo", 2),
            ]
        );
    }

    #[test]
    fn test_breakdown_requires_description() {
        let outcome = break_down_task_tool().execute(&Args::new());
        assert!(!outcome.is_success());
    }
}
