//! Per-section asynchronous lifecycle.
//!
//! # States
//!
//! - **Idle**: nothing requested yet
//! - **Loading**: a call for the current generation is in flight
//! - **Ready** / **Failed**: the call settled
//! - **Skipped**: settled without a network call (not enough entities)

use serde::{Deserialize, Serialize};

use crate::session::Generation;

/// Identifies a block of the results panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Graph node/relationship counts.
    Graph,
    /// Per-entity context lookups.
    Context,
    /// Multi-hop paths between entities.
    Paths,
    /// Retrieval reasoning carried by the answer itself.
    Reasoning,
    /// Code contexts carried by the answer itself.
    CodeContexts,
}

impl SectionKind {
    /// All sections in display order.
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Graph,
        SectionKind::Context,
        SectionKind::Paths,
        SectionKind::Reasoning,
        SectionKind::CodeContexts,
    ];

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Graph => "graph",
            SectionKind::Context => "context",
            SectionKind::Paths => "paths",
            SectionKind::Reasoning => "reasoning",
            SectionKind::CodeContexts => "contexts",
        }
    }

    /// Heading shown in the results panel.
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Graph => "Graph Overview",
            SectionKind::Context => "Entity Context",
            SectionKind::Paths => "Entity Paths",
            SectionKind::Reasoning => "Retrieval Reasoning",
            SectionKind::CodeContexts => "Code Contexts",
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "graph" => Ok(SectionKind::Graph),
            "context" => Ok(SectionKind::Context),
            "paths" => Ok(SectionKind::Paths),
            "reasoning" => Ok(SectionKind::Reasoning),
            "contexts" | "code" => Ok(SectionKind::CodeContexts),
            _ => Err(format!("Unknown section: {}", s)),
        }
    }
}

/// Lifecycle phase of one section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionPhase<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
    Skipped(String),
}

/// State of one aggregation section, tagged with the generation that
/// produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionState<T> {
    phase: SectionPhase<T>,
    generation: Option<Generation>,
}

impl<T> SectionState<T> {
    /// Section as created at mount: idle, no data.
    pub fn new() -> Self {
        Self {
            phase: SectionPhase::Idle,
            generation: None,
        }
    }

    pub fn phase(&self) -> &SectionPhase<T> {
        &self.phase
    }

    /// Generation the current phase belongs to.
    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, SectionPhase::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match &self.phase {
            SectionPhase::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            SectionPhase::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Terminal state reached without a network call.
    pub fn skipped_reason(&self) -> Option<&str> {
        match &self.phase {
            SectionPhase::Skipped(reason) => Some(reason),
            _ => None,
        }
    }

    /// Enter `Loading` for a new generation.
    pub fn begin(&mut self, generation: Generation) {
        self.phase = SectionPhase::Loading;
        self.generation = Some(generation);
    }

    /// Settle without making a call.
    pub fn skip(&mut self, generation: Generation, reason: impl Into<String>) {
        self.phase = SectionPhase::Skipped(reason.into());
        self.generation = Some(generation);
    }

    /// Record the outcome of the call for `generation`.
    ///
    /// Returns `false` (and changes nothing) unless the section is loading
    /// that exact generation.
    pub fn settle(&mut self, generation: Generation, outcome: Result<T, String>) -> bool {
        if !self.is_loading() || self.generation != Some(generation) {
            return false;
        }
        self.phase = match outcome {
            Ok(data) => SectionPhase::Ready(data),
            Err(message) => SectionPhase::Failed(message),
        };
        true
    }
}

impl<T> Default for SectionState<T> {
    fn default() -> Self {
        Self::new()
    }
}
