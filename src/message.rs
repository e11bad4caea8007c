// message.rs
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Free-form structured body of a message. Keys are handler specific.
pub type Payload = Map<String, Value>;

/// The closed set of message kinds handlers are keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Request,
    Response,
    Task,
    Result,
    Error,
    Query,
}

impl MessageKind {
    pub const ALL: [MessageKind; 6] = [
        MessageKind::Request,
        MessageKind::Response,
        MessageKind::Task,
        MessageKind::Result,
        MessageKind::Error,
        MessageKind::Query,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Request => "request",
            MessageKind::Response => "response",
            MessageKind::Task => "task",
            MessageKind::Result => "result",
            MessageKind::Error => "error",
            MessageKind::Query => "query",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown message kind '{}'", s)))
    }
}

/// A message exchanged between agents.
///
/// Fields are private: once a message leaves its builder it is only read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    id: Uuid,
    sender: String,
    receiver: String,
    kind: MessageKind,
    content: String,
    payload: Payload,
    created_at: DateTime<Utc>,
    causal_parent: Option<Uuid>,
}

impl Message {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        kind: MessageKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: sender.into(),
            receiver: receiver.into(),
            kind,
            content: content.into(),
            payload: Payload::new(),
            created_at: Utc::now(),
            causal_parent: None,
        }
    }

    /// Builds a message whose kind is given as text, e.g. read from a config
    /// file or a command line.
    pub fn parse(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        kind: &str,
        content: impl Into<String>,
    ) -> Result<Self, Error> {
        let kind = kind.parse()?;
        Ok(Self::new(sender, receiver, kind, content))
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn in_reply_to(mut self, parent: &Message) -> Self {
        self.causal_parent = Some(parent.id);
        self
    }

    /// Answer addressed back to the sender of `self`, causally linked to it.
    pub fn reply(&self, kind: MessageKind, content: impl Into<String>) -> Message {
        Message::new(self.receiver.clone(), self.sender.clone(), kind, content).in_reply_to(self)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn causal_parent(&self) -> Option<Uuid> {
        self.causal_parent
    }

    /// Plain record used by reporting and export.
    pub fn record(&self) -> MessageRecord {
        MessageRecord {
            id: self.id.to_string(),
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            kind: self.kind,
            content: self.content.clone(),
            payload: self.payload.clone(),
            parent_id: self.causal_parent.map(|id| id.to_string()),
            timestamp: self.created_at.to_rfc3339(),
        }
    }
}

/// Flat, serializable view of a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub sender: String,
    pub receiver: String,
    pub kind: MessageKind,
    pub content: String,
    pub payload: Payload,
    pub parent_id: Option<String>,
    pub timestamp: String,
}
