// main.rs

use agentmesh::logging::{self, LogLevel};
use agentmesh::{Agent, Config, MessageKind, Payload, Workflows};
use color_eyre::eyre::eyre;
use serde_json::json;
use std::path::PathBuf;

/// Name of the console agent the demo workflow is sent from.
const CONSOLE: &str = "User";

fn demo_workflow() -> Payload {
    let payload = json!({
        "tasks": [
            {
                "type": "analyze",
                "payload": { "type": "full", "data": [10, 20, 15, 25, 30, 22, 28, 35, 32, 40] }
            },
            { "type": "plan", "payload": { "task": "Build ML model", "num_subtasks": 4 } },
            { "type": "execute", "payload": { "expression": "(2 + 3) * 4 ** 2" } },
            { "type": "search", "payload": { "query": "agent" } }
        ]
    });
    match payload {
        serde_json::Value::Object(map) => map,
        _ => Payload::new(),
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    cli_log::init_cli_log!();

    // Load configuration file, falling back to the built-in roster
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.json"));
    let config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        logging::console(
            LogLevel::Warning,
            &format!("{} not found, using the default roster", config_path.display()),
        );
        Config::default()
    };

    let workflows = Workflows::new();
    let mut router = config.build_router(&workflows)?;
    let coordinator = config
        .agents
        .iter()
        .find(|agent| agent.role == agentmesh::Role::Coordinator)
        .map(|agent| agent.name().to_string())
        .ok_or_else(|| eyre!("the roster has no coordinator"))?;
    router.register(Agent::new(CONSOLE, "Console"))?;

    logging::console(
        LogLevel::Info,
        &format!("Sending demo workflow to {}", coordinator),
    );
    router.send(
        CONSOLE,
        &coordinator,
        "Run demo workflow",
        MessageKind::Query,
        demo_workflow(),
    );

    let report = router.run(config.scheduler.max_iterations);

    logging::print_traffic(router.history().iter());
    println!();
    logging::print_report(&report);

    for id in workflows.ids() {
        if let Some(workflow) = workflows.status(&id) {
            logging::console(
                LogLevel::Info,
                &format!("Workflow {}: {} task(s) delegated", id, workflow.delegated.len()),
            );
        }
    }

    if config.debug {
        println!("{}", serde_json::to_string_pretty(&router.history_records())?);
    }

    Ok(())
}
