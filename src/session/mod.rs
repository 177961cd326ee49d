//! Session state: connection and ingestion flags, the current entity set and
//! the trigger generation counter.
//!
//! All transitions are synchronous. [`SessionState::can_query`] is the single
//! gate for whether a query may be submitted.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identifier of a graph node of interest (function, class, concept).
///
/// Opaque: only ever used as a lookup key for follow-up calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(String);

impl Entity {
    /// Create an entity from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The entity name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Entity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Entity {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One query cycle. Strictly increasing; results tagged with an older
/// generation than the current one are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    /// Generation before any query completed.
    pub const INITIAL: Generation = Generation(0);

    /// Raw counter value.
    pub fn value(&self) -> u64 {
        self.0
    }

    fn next(self) -> Generation {
        Generation(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Session state shared by query submission and result aggregation.
#[derive(Debug, Clone)]
pub struct SessionState {
    connected: bool,
    ingested: bool,
    entities: Vec<Entity>,
    generation: Generation,
}

impl SessionState {
    /// Fresh session: not connected, nothing ingested, generation zero.
    pub fn new() -> Self {
        Self {
            connected: false,
            ingested: false,
            entities: Vec::new(),
            generation: Generation::INITIAL,
        }
    }

    /// Whether the backend connection was acknowledged.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether a document or codebase was ingested.
    pub fn is_ingested(&self) -> bool {
        self.ingested
    }

    /// Querying is permitted only once connected and ingested.
    pub fn can_query(&self) -> bool {
        self.connected && self.ingested
    }

    /// Entities extracted from the latest successful query.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Most recently issued generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn mark_connected(&mut self) {
        self.connected = true;
    }

    pub fn mark_ingested(&mut self) {
        self.ingested = true;
    }

    /// Replace the entity set wholesale.
    pub fn set_entities(&mut self, entities: Vec<Entity>) {
        debug!(count = entities.len(), "Entity set replaced");
        self.entities = entities;
    }

    /// Issue a fresh generation, strictly greater than every previous one.
    pub fn next_generation(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }

    /// Drop the connection and ingestion flags after a disconnect.
    ///
    /// The generation counter keeps counting so late results from before the
    /// disconnect can never match a later cycle.
    pub fn reset_connection(&mut self) {
        self.connected = false;
        self.ingested = false;
        self.entities.clear();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_cannot_query() {
        let session = SessionState::new();
        assert!(!session.is_connected());
        assert!(!session.is_ingested());
        assert!(!session.can_query());
        assert!(session.entities().is_empty());
        assert_eq!(session.generation(), Generation::INITIAL);
    }

    #[test]
    fn test_can_query_requires_both_flags() {
        let mut session = SessionState::new();
        session.mark_connected();
        assert!(!session.can_query());
        session.mark_ingested();
        assert!(session.can_query());

        let mut session = SessionState::new();
        session.mark_ingested();
        assert!(!session.can_query());
    }

    #[test]
    fn test_next_generation_strictly_increases() {
        let mut session = SessionState::new();
        let mut previous = session.generation();
        for _ in 0..5 {
            let next = session.next_generation();
            assert!(next > previous);
            assert_eq!(session.generation(), next);
            previous = next;
        }
        assert_eq!(previous.value(), 5);
    }

    #[test]
    fn test_set_entities_replaces_wholesale() {
        let mut session = SessionState::new();
        session.set_entities(vec!["parseFile".into(), "Tokenizer".into()]);
        session.set_entities(vec!["Lexer".into()]);
        assert_eq!(session.entities(), &[Entity::new("Lexer")]);
    }

    #[test]
    fn test_reset_connection_keeps_generation() {
        let mut session = SessionState::new();
        session.mark_connected();
        session.mark_ingested();
        session.set_entities(vec!["X".into()]);
        let generation = session.next_generation();

        session.reset_connection();

        assert!(!session.can_query());
        assert!(session.entities().is_empty());
        assert_eq!(session.generation(), generation);
        assert!(session.next_generation() > generation);
    }

    #[test]
    fn test_generation_display() {
        let mut session = SessionState::new();
        assert_eq!(session.next_generation().to_string(), "g1");
    }

    #[test]
    fn test_entity_serializes_as_plain_string() {
        let entity = Entity::new("Tokenizer");
        assert_eq!(serde_json::to_string(&entity).unwrap(), "\"Tokenizer\"");
        let parsed: Entity = serde_json::from_str("\"parseFile\"").unwrap();
        assert_eq!(parsed.as_str(), "parseFile");
    }
}
