//! Bounded per-owner conversation history
//!
//! The front end keeps a short rolling transcript per conversation so
//! follow-up questions carry context. Capacity is fixed: pushing to a full
//! buffer evicts the oldest turn. State is process-local; durability across
//! processes belongs to the persistent store, not here.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

/// Default number of retained turns per owner (~6 user/assistant exchanges)
pub const DEFAULT_CAPACITY: usize = 12;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

/// A single turn in a conversation
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Fixed-capacity ring buffers of turns, keyed by owner id
#[derive(Debug)]
pub struct ConversationHistory {
    capacity: usize,
    buffers: HashMap<String, VecDeque<Turn>>,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ConversationHistory {
    /// Create a history with the given per-owner capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buffers: HashMap::new(),
        }
    }

    /// Append a turn for an owner, evicting the oldest if the buffer is full
    pub fn push(&mut self, owner_id: &str, role: TurnRole, content: impl Into<String>) {
        let buffer = self
            .buffers
            .entry(owner_id.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));

        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(Turn::new(role, content));
    }

    /// Turns for an owner, oldest first
    pub fn turns(&self, owner_id: &str) -> Vec<&Turn> {
        self.buffers
            .get(owner_id)
            .map(|buffer| buffer.iter().collect())
            .unwrap_or_default()
    }

    /// Number of retained turns for an owner
    pub fn len(&self, owner_id: &str) -> usize {
        self.buffers.get(owner_id).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, owner_id: &str) -> bool {
        self.len(owner_id) == 0
    }

    /// Drop an owner's history entirely
    pub fn clear(&mut self, owner_id: &str) {
        self.buffers.remove(owner_id);
    }
}
