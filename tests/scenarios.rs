// tests/scenarios.rs
use agentmesh::roles::{self, ANALYZER, COORDINATOR, EXECUTOR, KNOWLEDGE, PLANNER};
use agentmesh::{Agent, Config, MessageKind, Payload, Retention, Router, Workflows};
use serde_json::{json, Value};

fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        _ => panic!("payload must be an object"),
    }
}

fn series() -> Payload {
    payload(json!({ "type": "full", "data": [10, 20, 15, 25, 30, 22, 28, 35, 32, 40] }))
}

#[test]
fn analyzer_answers_coordinator_query() {
    let mut router = Router::new();
    router.register(roles::analyzer(ANALYZER).unwrap()).unwrap();
    router
        .register(roles::coordinator(COORDINATOR, Workflows::new()).unwrap())
        .unwrap();

    let query_id = router
        .send(COORDINATOR, ANALYZER, "Analyze this series", MessageKind::Query, series())
        .unwrap();
    let report = router.run(5);
    assert!(report.iterations <= 5);

    let responses: Vec<_> = router
        .history()
        .iter()
        .filter(|m| m.kind() == MessageKind::Response)
        .collect();
    assert_eq!(responses.len(), 1);

    let response = responses[0];
    assert_eq!(response.sender(), ANALYZER);
    assert_eq!(response.receiver(), COORDINATOR);
    assert_eq!(response.causal_parent(), Some(query_id));
    let statistics = &response.payload()["statistics"]["result"];
    assert_eq!(statistics["mean"], 25.7);
    assert_eq!(statistics["count"], 10);
}

#[test]
fn message_to_unknown_agent_is_recorded_and_dropped() {
    let mut router = Router::new();
    router.register(roles::analyzer(ANALYZER).unwrap()).unwrap();
    router.send(ANALYZER, "Ghost", "Anyone there?", MessageKind::Query, Payload::new());

    let report = router.run(3);
    assert_eq!(report.iterations, 0);
    assert_eq!(router.history().len(), 1);
    assert_eq!(report.agent(ANALYZER).unwrap().execution_count, 0);
}

#[test]
fn response_waits_for_the_next_tick() {
    let mut router = Router::new();
    router
        .register(roles::coordinator(COORDINATOR, Workflows::new()).unwrap())
        .unwrap();
    router.register(roles::analyzer(ANALYZER).unwrap()).unwrap();
    router.send(COORDINATOR, ANALYZER, "", MessageKind::Query, series());

    let report = router.run(1);
    assert_eq!(report.iterations, 1);
    assert!(router
        .history()
        .iter()
        .any(|m| m.kind() == MessageKind::Response));
    assert_eq!(report.agent(COORDINATOR).unwrap().execution_count, 0);
    assert_eq!(router.agent(COORDINATOR).unwrap().mailbox_len(), 1);
}

#[test]
fn every_response_points_at_an_earlier_message() {
    let workflows = Workflows::new();
    let mut router = Config::default().build_router(&workflows).unwrap();
    router.register(Agent::new("User", "Console")).unwrap();
    router.send(
        "User",
        COORDINATOR,
        "Run workflow",
        MessageKind::Query,
        payload(json!({
            "tasks": [
                { "type": "analyze", "payload": { "data": [1, 2, 3] } },
                { "type": "execute", "payload": { "expression": "1/0" } }
            ]
        })),
    );
    router.run(10);

    let history: Vec<_> = router.history().iter().collect();
    for (position, message) in history.iter().enumerate() {
        if matches!(message.kind(), MessageKind::Response | MessageKind::Error) {
            let parent = message.causal_parent().unwrap();
            let parent_position = history.iter().position(|m| m.id() == parent).unwrap();
            assert!(parent_position < position);
            assert_eq!(history[parent_position].sender(), message.receiver());
        }
    }
    assert_eq!(
        history.iter().filter(|m| m.kind() == MessageKind::Error).count(),
        1
    );
}

#[test]
fn coordinator_delegates_a_workflow() {
    let workflows = Workflows::new();
    let mut router = Config::default().build_router(&workflows).unwrap();
    router.register(Agent::new("User", "Console")).unwrap();
    router.send(
        "User",
        COORDINATOR,
        "Run workflow",
        MessageKind::Query,
        payload(json!({
            "workflow_id": "quarterly",
            "tasks": [
                { "type": "analyze", "payload": { "type": "statistics", "data": [4, 8] } },
                { "type": "plan", "payload": { "type": "prioritize", "tasks": ["low", "urgent"] } },
                { "type": "execute", "payload": { "expression": "2 ** 3" } },
                { "type": "search", "payload": { "query": "workflow" } }
            ]
        })),
    );
    let report = router.run(10);
    assert!(report.iterations < 10);

    let workflow = workflows.status("quarterly").unwrap();
    let targets: Vec<&str> = workflow.delegated.iter().map(|d| d.agent.as_str()).collect();
    assert_eq!(targets, vec![ANALYZER, PLANNER, EXECUTOR, KNOWLEDGE]);

    // One answer per delegated task, all back at the coordinator.
    let coordinator = router.agent(COORDINATOR).unwrap();
    for delegation in &workflow.delegated {
        let answer = router
            .history()
            .iter()
            .find(|m| m.causal_parent() == Some(delegation.message_id))
            .unwrap();
        assert_eq!(answer.kind(), MessageKind::Response);
        assert_eq!(answer.receiver(), COORDINATOR);
    }
    // Memory holds the four delegations and the reply, plus the query and
    // the four answers it received.
    let sent = coordinator
        .memory()
        .iter()
        .filter(|m| m.sender() == COORDINATOR)
        .count();
    assert_eq!(sent, 5);
    assert_eq!(coordinator.memory().len(), 10);

    let user_reply = router
        .history()
        .iter()
        .find(|m| m.receiver() == "User")
        .unwrap();
    assert_eq!(user_reply.payload()["workflow_id"], "quarterly");
    assert_eq!(user_reply.payload()["task_count"], 4);
}

#[test]
fn windowed_history_keeps_the_latest_messages() {
    let mut router = Router::with_retention(Retention::Window(1));
    router.register(roles::analyzer(ANALYZER).unwrap()).unwrap();
    router
        .register(roles::coordinator(COORDINATOR, Workflows::new()).unwrap())
        .unwrap();
    router.send(COORDINATOR, ANALYZER, "", MessageKind::Query, series());
    let report = router.run(5);

    assert_eq!(report.total_messages, 1);
    assert_eq!(router.history().evicted(), 1);
    let kept: Vec<_> = router.history().iter().collect();
    assert_eq!(kept[0].kind(), MessageKind::Response);
}
