// agent.rs
use crate::error::{Error, Result};
use crate::message::{Message, MessageKind, Payload};
use crate::tool::{Args, Tool, ToolOutcome, Toolbox};
use log::{debug, warn};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// Handler invoked for every drained message of one kind.
///
/// The returned message, if any, is the response to the drained message.
pub type Handler = Box<dyn FnMut(&mut Context<'_>, &Message) -> Option<Message> + Send>;

/// What a handler can reach while it runs: its agent's name and tools, and an
/// outbox for traffic other than the response itself.
pub struct Context<'a> {
    name: &'a str,
    tools: &'a Toolbox,
    outbox: Vec<Message>,
}

impl<'a> Context<'a> {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn use_tool(&self, tool: &str, args: &Args) -> Result<ToolOutcome> {
        invoke(self.name, self.tools, tool, args)
    }

    /// Queues a message from this agent. It is routed after the handler
    /// returns, ahead of the handler's response.
    pub fn send(
        &mut self,
        receiver: impl Into<String>,
        content: impl Into<String>,
        kind: MessageKind,
        payload: Payload,
    ) -> Uuid {
        let message = Message::new(self.name, receiver, kind, content).with_payload(payload);
        let id = message.id();
        self.outbox.push(message);
        id
    }
}

fn invoke(agent: &str, tools: &Toolbox, name: &str, args: &Args) -> Result<ToolOutcome> {
    let tool = tools.get(name).ok_or_else(|| Error::ToolNotFound {
        agent: agent.to_string(),
        tool: name.to_string(),
    })?;

    let outcome = tool.execute(args);
    if let Some(error) = outcome.error() {
        debug!("{}: tool '{}' failed: {}", agent, name, error);
    }
    Ok(outcome)
}

/// Read-only snapshot of an agent, as exposed to reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub role: String,
    pub tools: Vec<String>,
    pub tool_count: usize,
    pub message_count: usize,
    pub execution_count: u64,
    pub active: bool,
}

pub struct Agent {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    mailbox: VecDeque<Message>,
    memory: Vec<Message>,
    tools: Toolbox,
    handlers: HashMap<MessageKind, Handler>,
    active: bool,
    pub(crate) execution_count: u64,
}

impl Agent {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role: role.into(),
            mailbox: VecDeque::new(),
            memory: Vec::new(),
            tools: Toolbox::new(),
            handlers: HashMap::new(),
            active: true,
            execution_count: 0,
        }
    }

    pub fn register_tool(&mut self, tool: Tool) {
        let name = tool.name.clone();
        if self.tools.insert(tool).is_some() {
            warn!("{}: tool '{}' replaced", self.name, name);
        }
    }

    /// Installs the handler for one message kind. A kind can only be claimed
    /// once per agent.
    pub fn register_handler<F>(&mut self, kind: MessageKind, handler: F) -> Result<()>
    where
        F: FnMut(&mut Context<'_>, &Message) -> Option<Message> + Send + 'static,
    {
        if self.handlers.contains_key(&kind) {
            return Err(Error::DuplicateHandler {
                agent: self.name.clone(),
                kind: kind.to_string(),
            });
        }
        self.handlers.insert(kind, Box::new(handler));
        Ok(())
    }

    pub fn has_handler(&self, kind: MessageKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Invokes a registered tool. Tool failures come back as
    /// `ToolOutcome::Error`; only an unknown tool name is an `Err`.
    pub fn use_tool(&self, name: &str, args: &Args) -> Result<ToolOutcome> {
        invoke(&self.name, &self.tools, name, args)
    }

    /// Composes a message from this agent and records it in memory.
    ///
    /// The message is returned undelivered; hand it to `Router::route`, or use
    /// `Router::send` which does both.
    pub fn send(
        &mut self,
        receiver: impl Into<String>,
        content: impl Into<String>,
        kind: MessageKind,
        payload: Payload,
    ) -> Message {
        let message = Message::new(self.name.clone(), receiver, kind, content).with_payload(payload);
        self.memory.push(message.clone());
        message
    }

    pub fn receive(&mut self, message: Message) {
        self.memory.push(message.clone());
        self.mailbox.push_back(message);
    }

    /// Processes the messages queued at entry, in FIFO order, and returns the
    /// traffic they produced.
    pub fn drain(&mut self) -> Vec<Message> {
        let pending = self.mailbox.len();
        let mut outgoing = Vec::new();

        for _ in 0..pending {
            let Some(message) = self.mailbox.pop_front() else {
                break;
            };

            let mut ctx = Context {
                name: &self.name,
                tools: &self.tools,
                outbox: Vec::new(),
            };

            let response = match self.handlers.get_mut(&message.kind()) {
                Some(handler) => handler(&mut ctx, &message),
                None => match message.kind() {
                    MessageKind::Task => Some(process_task(&message)),
                    MessageKind::Query => Some(process_query(&message)),
                    _ => None,
                },
            };

            outgoing.append(&mut ctx.outbox);
            outgoing.extend(response);
        }

        self.memory.extend(outgoing.iter().cloned());
        outgoing
    }

    pub fn mailbox_len(&self) -> usize {
        self.mailbox.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.mailbox.is_empty()
    }

    pub fn memory(&self) -> &[Message] {
        &self.memory
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names()
    }

    pub fn execution_count(&self) -> u64 {
        self.execution_count
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn info(&self) -> AgentInfo {
        AgentInfo {
            id: self.id.to_string(),
            name: self.name.clone(),
            role: self.role.clone(),
            tools: self.tools.names(),
            tool_count: self.tools.len(),
            message_count: self.memory.len(),
            execution_count: self.execution_count,
            active: self.active,
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("mailbox", &self.mailbox.len())
            .field("memory", &self.memory.len())
            .field("tools", &self.tools.names())
            .field("active", &self.active)
            .field("execution_count", &self.execution_count)
            .finish()
    }
}

fn process_task(message: &Message) -> Message {
    message.reply(MessageKind::Result, "Task processed")
}

fn process_query(message: &Message) -> Message {
    message.reply(MessageKind::Response, "Query processed")
}
