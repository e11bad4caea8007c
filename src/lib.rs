// lib.rs
//! A small, deterministic multi-agent message router.
//!
//! Agents own a mailbox, a memory of what they sent and a toolbox. The
//! [`Router`] delivers messages by receiver name, records every routed message
//! in a [`History`] and drives agents in registration order, one tick at a
//! time, until no mailbox holds work or the iteration cap is hit.

pub mod agent;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod message;
pub mod roles;
pub mod router;
pub mod tool;
pub mod tools;

pub use agent::{Agent, AgentInfo, Context, Handler};
pub use config::Config;
pub use error::{Error, Result, ToolError};
pub use history::{History, Retention};
pub use message::{Message, MessageKind, MessageRecord, Payload};
pub use roles::{Role, Workflows};
pub use router::{Router, RunReport};
pub use tool::{Args, Tool, ToolOutcome, Toolbox};
