//! Session-scoped conversation log
//!
//! An append-only sequence of turns whose first entry is always the system
//! instruction. Nothing is ever edited or removed.

use crate::llm::LlmMessage;
use crate::system_prompt::SYSTEM_INSTRUCTION;
use serde::Serialize;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Model,
}

/// One role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Set on turns synthesized from a failed generation call
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self::new(Role::Model, content)
    }

    /// Model-role turn carrying a failure diagnostic
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::new(Role::Model, content)
        }
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            is_error: false,
        }
    }
}

/// Ordered turn log, seeded with the system instruction
#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(SYSTEM_INSTRUCTION)
    }
}

impl Conversation {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(system_instruction)],
        }
    }

    /// Add a turn at the end. Role alternation is not checked.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Every turn, seed included
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// Turns to display: everything after the seed
    pub fn visible(&self) -> &[Turn] {
        &self.all()[1..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn system_instruction(&self) -> &str {
        &self.turns[0].content
    }

    /// Turns resent to the model on the next call.
    ///
    /// Error turns stay visible but are never fed back as model output.
    pub fn context(&self) -> Vec<LlmMessage> {
        self.visible()
            .iter()
            .filter(|turn| !turn.is_error)
            .filter_map(|turn| match turn.role {
                Role::User => Some(LlmMessage::user(turn.content.clone())),
                Role::Model => Some(LlmMessage::model(turn.content.clone())),
                Role::System => None,
            })
            .collect()
    }
}
