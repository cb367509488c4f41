//! Inbound message context and the statically registered command variants.
//!
//! Plugins turn message text into a [`Command`] during the trigger phase; the
//! router hands that value back to the same plugin for execution.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Group,
    Private,
}

/// Everything a handler needs to know about the message besides its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContext {
    pub message_type: MessageType,
    /// Chat group id; doubles as the FAQ namespace.
    pub namespace: String,
    pub user_id: String,
    pub message_id: i64,
    /// Unix seconds at which the message was sent.
    pub time: i64,
}

impl MessageContext {
    pub fn group(namespace: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Group,
            namespace: namespace.into(),
            user_id: user_id.into(),
            message_id: 0,
            time: crate::core::time::now_epoch(),
        }
    }

    pub fn is_group(&self) -> bool {
        self.message_type == MessageType::Group
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Ask { question: String },
    Maintain(FaqOp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowMode {
    /// Grouped by romanized initial (`faq show`, `faq show -1`).
    ByInitial,
    /// Grouped by tag (`faq show -2`).
    ByTag,
    Invalid,
}

/// One `faq <mode> ...` request, already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaqOp {
    Show(ShowMode),
    Add { question: String, answer: String },
    Edit { question: String, answer: String },
    Copy { src: String, dst: String },
    Delete { question: String },
    Append { question: String, text: String },
    Tag { question: String, tag: String },
    Rollback { question: String },
    History { question: String },
    /// Known mode with a malformed operand; carries the usage line to echo.
    Malformed { usage: &'static str },
    /// Mode keyword nobody recognizes.
    Unknown { mode: String },
}

/// Result of a delegated execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Handled; later plugins should not see the message.
    Handled,
    /// Not handled; dispatch may continue.
    Pass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub name: String,
    pub description: String,
    pub command_description: String,
    pub version: String,
    pub author: String,
}
