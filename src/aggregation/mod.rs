//! Result aggregation.
//!
//! Each completed query issues a new [`Generation`]. [`ResultAggregator::dispatch`]
//! fans out three independent sections for that generation:
//!
//! - graph overview: always requested, capped to `graph_limit` items
//! - entity context: one lookup per entity for the first `context_entity_cap`
//!   entities, joined in entity order; skipped when there are no entities
//! - entity paths: first `path_entity_cap` entities, bounded by `max_hops`;
//!   skipped below two entities
//!
//! Calls run in spawned tasks and report back as [`SectionUpdate`]s over a
//! channel. [`ResultAggregator::apply`] commits an update only if it belongs to
//! the current generation; anything older is dropped. Tasks are never
//! aborted: superseded results are filtered on arrival.

mod section;

pub use section::*;

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::backend::{Backend, EntityContext, GraphOverview, PathSet};
use crate::config::AggregationConfig;
use crate::error::BackendResult;
use crate::session::{Entity, Generation};

/// Terminal message for the paths section below two entities.
pub const NOT_ENOUGH_ENTITIES: &str = "need at least 2 entities";
/// Terminal message for the context section with no entities.
pub const NO_ENTITIES: &str = "no entities to look up";

/// Outcome of one entity-context lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry {
    pub entity: Entity,
    pub outcome: Result<EntityContext, String>,
}

impl ContextEntry {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Settled result for one section.
#[derive(Debug, Clone)]
pub enum SectionPayload {
    Graph(Result<GraphOverview, String>),
    Context(Result<Vec<ContextEntry>, String>),
    Paths(Result<PathSet, String>),
}

/// A section result tagged with the generation that requested it.
#[derive(Debug, Clone)]
pub struct SectionUpdate {
    pub generation: Generation,
    pub payload: SectionPayload,
}

impl SectionUpdate {
    pub fn kind(&self) -> SectionKind {
        match self.payload {
            SectionPayload::Graph(_) => SectionKind::Graph,
            SectionPayload::Context(_) => SectionKind::Context,
            SectionPayload::Paths(_) => SectionKind::Paths,
        }
    }
}

/// What `apply` did with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Committed to the section.
    Applied(SectionKind),
    /// Superseded generation (or duplicate); ignored.
    Stale(SectionKind),
}

/// Which calls a dispatch issued.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchSummary {
    pub graph_requested: bool,
    pub context_lookups: Vec<Entity>,
    pub path_entities: Option<Vec<Entity>>,
}

impl DispatchSummary {
    /// Number of network calls started.
    pub fn call_count(&self) -> usize {
        usize::from(self.graph_requested)
            + self.context_lookups.len()
            + usize::from(self.path_entities.is_some())
    }
}

/// Owns the three aggregation sections and the generation they track.
pub struct ResultAggregator {
    backend: Arc<dyn Backend>,
    limits: AggregationConfig,
    generation: Option<Generation>,
    graph: SectionState<GraphOverview>,
    context: SectionState<Vec<ContextEntry>>,
    paths: SectionState<PathSet>,
}

impl ResultAggregator {
    pub fn new(backend: Arc<dyn Backend>, limits: AggregationConfig) -> Self {
        Self {
            backend,
            limits,
            generation: None,
            graph: SectionState::new(),
            context: SectionState::new(),
            paths: SectionState::new(),
        }
    }

    /// Generation the sections currently track.
    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    pub fn graph(&self) -> &SectionState<GraphOverview> {
        &self.graph
    }

    pub fn context(&self) -> &SectionState<Vec<ContextEntry>> {
        &self.context
    }

    pub fn paths(&self) -> &SectionState<PathSet> {
        &self.paths
    }

    /// Whether any section is still waiting on the backend.
    pub fn is_loading(&self) -> bool {
        self.graph.is_loading() || self.context.is_loading() || self.paths.is_loading()
    }

    /// Start the fan-out for `generation`.
    ///
    /// Generations that are not newer than the current one are ignored:
    /// replaying a cycle is not supported.
    pub fn dispatch<E>(
        &mut self,
        generation: Generation,
        entities: &[Entity],
        updates: &UnboundedSender<E>,
    ) -> DispatchSummary
    where
        E: From<SectionUpdate> + Send + 'static,
    {
        if self.generation.is_some_and(|current| generation <= current) {
            warn!(
                generation = %generation,
                current = ?self.generation,
                "Ignoring dispatch for a generation that is not newer"
            );
            return DispatchSummary::default();
        }
        self.generation = Some(generation);

        let mut summary = DispatchSummary {
            graph_requested: true,
            ..DispatchSummary::default()
        };

        self.graph.begin(generation);
        self.spawn_graph(generation, updates.clone());

        if entities.is_empty() {
            self.context.skip(generation, NO_ENTITIES);
        } else {
            let targets: Vec<Entity> = entities
                .iter()
                .take(self.limits.context_entity_cap)
                .cloned()
                .collect();
            summary.context_lookups = targets.clone();
            self.context.begin(generation);
            self.spawn_context(generation, targets, updates.clone());
        }

        if entities.len() < 2 {
            self.paths.skip(generation, NOT_ENOUGH_ENTITIES);
        } else {
            let targets: Vec<Entity> = entities
                .iter()
                .take(self.limits.path_entity_cap)
                .cloned()
                .collect();
            summary.path_entities = Some(targets.clone());
            self.paths.begin(generation);
            self.spawn_paths(generation, targets, updates.clone());
        }

        info!(
            generation = %generation,
            entities = entities.len(),
            calls = summary.call_count(),
            "Aggregation dispatched"
        );
        summary
    }

    /// Commit an update if it belongs to the current generation.
    pub fn apply(&mut self, update: SectionUpdate) -> ApplyOutcome {
        let kind = update.kind();
        if self.generation != Some(update.generation) {
            debug!(
                section = %kind,
                generation = %update.generation,
                current = ?self.generation,
                "Discarding stale section result"
            );
            return ApplyOutcome::Stale(kind);
        }

        let generation = update.generation;
        let applied = match update.payload {
            SectionPayload::Graph(outcome) => self.graph.settle(generation, outcome),
            SectionPayload::Context(outcome) => self.context.settle(generation, outcome),
            SectionPayload::Paths(outcome) => self.paths.settle(generation, outcome),
        };

        if applied {
            ApplyOutcome::Applied(kind)
        } else {
            debug!(section = %kind, generation = %generation, "Section already settled");
            ApplyOutcome::Stale(kind)
        }
    }

    fn spawn_graph<E>(&self, generation: Generation, updates: UnboundedSender<E>)
    where
        E: From<SectionUpdate> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let limit = self.limits.graph_limit;
        let timeout_ms = self.limits.section_timeout_ms;

        tokio::spawn(async move {
            let outcome = with_deadline(timeout_ms, backend.graph_overview(limit)).await;
            log_outcome(SectionKind::Graph, generation, &outcome);
            send(
                &updates,
                SectionUpdate {
                    generation,
                    payload: SectionPayload::Graph(outcome),
                },
            );
        });
    }

    fn spawn_context<E>(
        &self,
        generation: Generation,
        targets: Vec<Entity>,
        updates: UnboundedSender<E>,
    ) where
        E: From<SectionUpdate> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let timeout_ms = self.limits.section_timeout_ms;

        tokio::spawn(async move {
            let lookups = targets.into_iter().map(|entity| {
                let backend = Arc::clone(&backend);
                async move {
                    let outcome =
                        with_deadline(timeout_ms, backend.entity_context(&entity)).await;
                    if let Err(message) = &outcome {
                        warn!(
                            entity = %entity,
                            generation = %generation,
                            error = %message,
                            "Entity context lookup failed"
                        );
                    }
                    ContextEntry { entity, outcome }
                }
            });

            // join_all yields results in entity order, not completion order
            let entries = join_all(lookups).await;
            let outcome = if entries.iter().any(ContextEntry::is_ok) {
                Ok(entries)
            } else {
                Err(entries
                    .iter()
                    .filter_map(|entry| {
                        entry
                            .outcome
                            .as_ref()
                            .err()
                            .map(|message| format!("{}: {}", entry.entity, message))
                    })
                    .collect::<Vec<_>>()
                    .join("; "))
            };

            log_outcome(SectionKind::Context, generation, &outcome);
            send(
                &updates,
                SectionUpdate {
                    generation,
                    payload: SectionPayload::Context(outcome),
                },
            );
        });
    }

    fn spawn_paths<E>(
        &self,
        generation: Generation,
        targets: Vec<Entity>,
        updates: UnboundedSender<E>,
    ) where
        E: From<SectionUpdate> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let max_hops = self.limits.max_hops;
        let timeout_ms = self.limits.section_timeout_ms;

        tokio::spawn(async move {
            let outcome = with_deadline(timeout_ms, backend.find_paths(&targets, max_hops)).await;
            log_outcome(SectionKind::Paths, generation, &outcome);
            send(
                &updates,
                SectionUpdate {
                    generation,
                    payload: SectionPayload::Paths(outcome),
                },
            );
        });
    }
}

/// Run a backend call under the section deadline, flattening the error to
/// the text shown in the section.
async fn with_deadline<T, F>(timeout_ms: u64, call: F) -> Result<T, String>
where
    F: Future<Output = BackendResult<T>>,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.user_message()),
        Err(_) => Err(format!("timed out after {} ms", timeout_ms)),
    }
}

fn log_outcome<T>(section: SectionKind, generation: Generation, outcome: &Result<T, String>) {
    match outcome {
        Ok(_) => debug!(section = %section, generation = %generation, "Section resolved"),
        Err(message) => warn!(
            section = %section,
            generation = %generation,
            error = %message,
            "Section failed"
        ),
    }
}

fn send<E: From<SectionUpdate>>(updates: &UnboundedSender<E>, update: SectionUpdate) {
    if updates.send(update.into()).is_err() {
        debug!("Update receiver dropped; discarding section result");
    }
}
