// logging.rs
//! Console rendering of routed traffic and run reports.
//!
//! Diagnostics go through the `log` macros; this module is for what the
//! binary shows the user.

use crate::agent::AgentInfo;
use crate::message::{Message, MessageKind};
use crate::router::RunReport;
use chrono::Local;
use colored::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn label(&self) -> ColoredString {
        match self {
            LogLevel::Debug => "DEBUG".blue(),
            LogLevel::Info => "INFO".green(),
            LogLevel::Warning => "WARN".yellow(),
            LogLevel::Error => "ERROR".red(),
        }
    }
}

/// Prints a timestamped line to stdout.
pub fn console(level: LogLevel, message: &str) {
    let timestamp = Local::now().format("%H:%M:%S").to_string();
    println!("{} [{}] {}", level.label(), timestamp, message);
}

pub fn kind_label(kind: MessageKind) -> ColoredString {
    let label = kind.as_str().to_uppercase();
    match kind {
        MessageKind::Request | MessageKind::Query => label.cyan(),
        MessageKind::Task => label.magenta(),
        MessageKind::Response | MessageKind::Result => label.green(),
        MessageKind::Error => label.red().bold(),
    }
}

/// One line per message: sender, receiver, kind and content.
pub fn format_message(message: &Message) -> String {
    format!(
        "{} -> {} {} {}",
        message.sender().bold(),
        message.receiver().bold(),
        kind_label(message.kind()),
        message.content()
    )
}

fn format_agent(info: &AgentInfo) -> String {
    let state = if info.active { "active".green() } else { "inactive".red() };
    format!(
        "  {} ({}) {} | tools: {} | messages: {} | executions: {}",
        info.name.bold(),
        info.role,
        state,
        info.tool_count,
        info.message_count,
        info.execution_count
    )
}

pub fn format_report(report: &RunReport) -> String {
    let mut lines = vec![
        "Run report".bold().underline().to_string(),
        format!("  iterations: {}", report.iterations),
        format!("  messages in history: {}", report.total_messages),
    ];
    lines.extend(report.agent_stats.iter().map(format_agent));
    lines.join("\n")
}

/// Prints every message in order.
pub fn print_traffic<'a>(messages: impl IntoIterator<Item = &'a Message>) {
    for message in messages {
        println!("{}", format_message(message));
    }
}

pub fn print_report(report: &RunReport) {
    println!("{}", format_report(report));
}
