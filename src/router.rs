// router.rs
use crate::agent::{Agent, AgentInfo};
use crate::error::{Error, Result};
use crate::history::{History, Retention};
use crate::message::{Message, MessageKind, MessageRecord, Payload};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Outcome of a scheduler run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Ticks executed that had work; a quiescent start gives 0.
    pub iterations: usize,
    /// Messages currently held in the history.
    pub total_messages: usize,
    /// Per-agent snapshots, in registration order.
    pub agent_stats: Vec<AgentInfo>,
}

impl RunReport {
    pub fn agent(&self, name: &str) -> Option<&AgentInfo> {
        self.agent_stats.iter().find(|info| info.name == name)
    }
}

/// Owns the agent directory and the message history, and drives the
/// scheduler.
#[derive(Debug, Default)]
pub struct Router {
    agents: Vec<Agent>,
    index: HashMap<String, usize>,
    history: History,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Retention) -> Self {
        Self {
            history: History::with_retention(retention),
            ..Self::default()
        }
    }

    /// Adds an agent to the directory. Names are unique.
    pub fn register(&mut self, agent: Agent) -> Result<()> {
        if self.index.contains_key(&agent.name) {
            return Err(Error::DuplicateAgent(agent.name));
        }
        info!("Registered agent {} ({})", agent.name, agent.role);
        self.index.insert(agent.name.clone(), self.agents.len());
        self.agents.push(agent);
        Ok(())
    }

    /// Records the message in the history and delivers it if the receiver
    /// is registered. Unknown receivers are dropped without error.
    pub fn route(&mut self, message: Message) {
        let target = self.index.get(message.receiver()).copied();
        self.history.push(message.clone());

        match target {
            Some(index) => self.agents[index].receive(message),
            None => debug!(
                "Dropped {} message {} from {}: no agent named '{}'",
                message.kind(),
                message.id(),
                message.sender(),
                message.receiver()
            ),
        }
    }

    /// Sends a message on behalf of a registered agent.
    ///
    /// Returns `None`, recording nothing, if `from` is not registered.
    pub fn send(
        &mut self,
        from: &str,
        receiver: &str,
        content: impl Into<String>,
        kind: MessageKind,
        payload: Payload,
    ) -> Option<Uuid> {
        let index = *self.index.get(from)?;
        let message = self.agents[index].send(receiver, content, kind, payload);
        let id = message.id();
        self.route(message);
        Some(id)
    }

    /// Runs scheduler ticks until no agent has work or `max_iterations` ticks
    /// have run.
    pub fn run(&mut self, max_iterations: usize) -> RunReport {
        let mut iterations = 0;

        while iterations < max_iterations {
            if !self.tick() {
                debug!("Quiescent after {} tick(s)", iterations);
                break;
            }
            iterations += 1;
        }

        info!(
            "Run finished: {} tick(s), {} message(s) in history",
            iterations,
            self.history.len()
        );

        RunReport {
            iterations,
            total_messages: self.history.len(),
            agent_stats: self.agents_info(),
        }
    }

    /// One pass over the agents registered when the tick starts. Returns
    /// whether any agent had work.
    fn tick(&mut self) -> bool {
        let snapshot = self.agents.len();
        let mut had_work = false;

        for index in 0..snapshot {
            if !self.agents[index].has_pending() {
                continue;
            }
            had_work = true;

            let outgoing = self.agents[index].drain();
            debug!(
                "{} drained, {} message(s) out",
                self.agents[index].name,
                outgoing.len()
            );
            for message in outgoing {
                self.route(message);
            }
            self.agents[index].execution_count += 1;
        }

        had_work
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.index.get(name).map(|&index| &self.agents[index])
    }

    pub fn agent_mut(&mut self, name: &str) -> Option<&mut Agent> {
        self.index.get(name).map(|&index| &mut self.agents[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn agents_info(&self) -> Vec<AgentInfo> {
        self.agents.iter().map(Agent::info).collect()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_records(&self) -> Vec<MessageRecord> {
        self.history.iter().map(Message::record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_agent(name: &str) -> Agent {
        let mut agent = Agent::new(name, "Echo");
        agent
            .register_handler(MessageKind::Request, |_, message| {
                Some(message.reply(MessageKind::Response, message.content()))
            })
            .unwrap();
        agent
    }

    fn setup_router() -> Router {
        let mut router = Router::new();
        router.register(echo_agent("Alice")).unwrap();
        router.register(echo_agent("Bob")).unwrap();
        router
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut router = setup_router();
        let err = router.register(echo_agent("Alice")).unwrap_err();
        assert!(matches!(err, Error::DuplicateAgent(ref name) if name == "Alice"));
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_route_delivers_once() {
        let mut router = setup_router();
        let id = router
            .send("Alice", "Bob", "hi", MessageKind::Request, Payload::new())
            .unwrap();

        assert_eq!(router.history().len(), 1);
        let bob = router.agent("Bob").unwrap();
        assert_eq!(bob.mailbox_len(), 1);
        assert_eq!(bob.memory().iter().filter(|m| m.id() == id).count(), 1);
        let alice = router.agent("Alice").unwrap();
        assert_eq!(alice.memory().iter().filter(|m| m.id() == id).count(), 1);
    }

    #[test]
    fn test_unknown_receiver_is_recorded_not_delivered() {
        let mut router = setup_router();
        router.send("Alice", "Ghost", "boo", MessageKind::Query, Payload::new());

        assert_eq!(router.history().len(), 1);
        assert!(router.agents().all(|agent| agent.mailbox_len() == 0));
    }

    #[test]
    fn test_send_from_unregistered_agent() {
        let mut router = setup_router();
        assert!(router
            .send("Nobody", "Bob", "", MessageKind::Request, Payload::new())
            .is_none());
        assert!(router.history().is_empty());
    }

    #[test]
    fn test_quiescent_run() {
        let mut router = setup_router();
        let report = router.run(10);

        assert_eq!(report.iterations, 0);
        assert_eq!(report.total_messages, 0);
        assert_eq!(report.agent_stats.len(), 2);
    }

    #[test]
    fn test_round_trip_needs_two_ticks() {
        let mut router = setup_router();
        router.send("Alice", "Bob", "ping", MessageKind::Request, Payload::new());

        let report = router.run(1);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.total_messages, 2);
        assert_eq!(report.agent("Bob").unwrap().execution_count, 1);
        assert_eq!(report.agent("Alice").unwrap().execution_count, 0);
        assert_eq!(router.agent("Alice").unwrap().mailbox_len(), 1);

        // Responses have no handler, so draining them produces nothing.
        let report = router.run(5);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.agent("Alice").unwrap().execution_count, 1);
        assert_eq!(report.total_messages, 2);
    }

    #[test]
    fn test_iteration_cap_bounds_ping_pong() {
        let mut router = Router::new();
        for (name, peer) in [("Ping", "Pong"), ("Pong", "Ping")] {
            let mut agent = Agent::new(name, "Relay");
            agent
                .register_handler(MessageKind::Request, move |ctx, message| {
                    ctx.send(peer, message.content(), MessageKind::Request, Payload::new());
                    None
                })
                .unwrap();
            router.register(agent).unwrap();
        }
        router.send("Ping", "Pong", "ball", MessageKind::Request, Payload::new());

        let report = router.run(4);
        assert_eq!(report.iterations, 4);
        assert!(router.agents().any(Agent::has_pending));
    }

    #[test]
    fn test_history_precedes_delivery_and_keeps_parents_first() {
        let mut router = setup_router();
        router.send("Alice", "Bob", "one", MessageKind::Request, Payload::new());
        router.send("Alice", "Bob", "two", MessageKind::Request, Payload::new());
        router.run(10);

        let records = router.history_records();
        assert_eq!(records.len(), 4);
        for (position, record) in records.iter().enumerate() {
            if let Some(parent) = &record.parent_id {
                let parent_position = records.iter().position(|r| &r.id == parent).unwrap();
                assert!(parent_position < position);
            }
        }
        // per-sender FIFO
        let alice_sent: Vec<&str> = records
            .iter()
            .filter(|r| r.sender == "Alice")
            .map(|r| r.content.as_str())
            .collect();
        assert_eq!(alice_sent, vec!["one", "two"]);
    }

    #[test]
    fn test_execution_count_once_per_tick() {
        let mut router = setup_router();
        for i in 0..3 {
            router.send("Alice", "Bob", i.to_string(), MessageKind::Request, Payload::new());
        }
        router.run(1);
        assert_eq!(router.agent("Bob").unwrap().execution_count(), 1);
    }

    #[test]
    fn test_same_tick_delivery_to_later_agent() {
        // Bob is registered after Alice, so Alice's output reaches Bob's
        // mailbox before Bob's turn in the same tick.
        let mut router = Router::new();
        let mut alice = Agent::new("Alice", "");
        alice
            .register_handler(MessageKind::Task, |ctx, _| {
                ctx.send("Bob", "forward", MessageKind::Request, Payload::new());
                None
            })
            .unwrap();
        router.register(alice).unwrap();
        router.register(Agent::new("Bob", "")).unwrap();
        router.route(Message::new("Host", "Alice", MessageKind::Task, ""));

        let report = router.run(1);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.agent("Bob").unwrap().execution_count, 1);
    }

    #[test]
    fn test_windowed_history() {
        let mut router = Router::with_retention(Retention::Window(2));
        router.register(echo_agent("Alice")).unwrap();
        router.register(echo_agent("Bob")).unwrap();
        router.send("Alice", "Bob", "one", MessageKind::Request, Payload::new());
        router.send("Alice", "Bob", "two", MessageKind::Request, Payload::new());
        let report = router.run(10);

        assert_eq!(report.total_messages, 2);
        assert_eq!(router.history().total_routed(), 4);
    }
}
