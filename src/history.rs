// history.rs

use crate::message::Message;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// How much of the routed traffic the history keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy", content = "capacity")]
pub enum Retention {
    /// Keep every message ever routed.
    #[default]
    Unbounded,
    /// Keep only the most recent `n` messages, evicting the oldest first.
    Window(usize),
}

/// The global, ordered timeline of routed messages.
#[derive(Debug, Clone, Default)]
pub struct History {
    messages: VecDeque<Message>,
    retention: Retention,
    evicted: u64,
}

impl History {
    /// Creates an empty, unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty history with the given retention policy.
    pub fn with_retention(retention: Retention) -> Self {
        Self {
            retention,
            ..Self::default()
        }
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// Appends a message, evicting from the front if the window is full.
    ///
    /// A window of zero keeps nothing but still counts every message.
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);

        if let Retention::Window(capacity) = self.retention {
            while self.messages.len() > capacity {
                if let Some(old) = self.messages.pop_front() {
                    debug!("history: evicted message {}", old.id());
                    self.evicted += 1;
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages dropped by the retention policy so far.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Every message routed so far, retained or not.
    pub fn total_routed(&self) -> u64 {
        self.evicted + self.messages.len() as u64
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    /// Retrieves the messages exchanged between two agents, in either
    /// direction.
    ///
    /// # Arguments
    /// * `agent1` - The first agent in the conversation.
    /// * `agent2` - The second agent in the conversation.
    ///
    /// # Returns
    /// * The retained messages between the two agents, in routing order.
    pub fn between(&self, agent1: &str, agent2: &str) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| {
                (m.sender() == agent1 && m.receiver() == agent2)
                    || (m.sender() == agent2 && m.receiver() == agent1)
            })
            .collect()
    }

    /// Follows causal parents from `id` back to the root.
    ///
    /// # Returns
    /// * The chain ordered root first, ending with `id`. The chain stops early
    ///   at a parent that is no longer retained; it is empty if `id` itself
    ///   is unknown.
    pub fn thread(&self, id: Uuid) -> Vec<&Message> {
        let mut chain = Vec::new();
        let mut cursor = self.get(id);

        while let Some(message) = cursor {
            chain.push(message);
            cursor = message.causal_parent().and_then(|parent| self.get(parent));
        }

        chain.reverse();
        chain
    }
}
