//! Results panel: one collapsible block per section.
//!
//! Expand/collapse is a local flag per [`SectionKind`], independent of the
//! data lifecycle. Rendering only reads section state; it never fetches.

use std::collections::BTreeMap;

use crate::aggregation::{ContextEntry, ResultAggregator, SectionKind, SectionPhase, SectionState};
use crate::backend::{
    Acknowledgement, CodeContext, EmbeddingStats, GraphOverview, IngestReport, PathSet,
    QueryAnswer, ReasoningData, TypeCount,
};

/// Retrieval steps shown in the reasoning block.
const MAX_STEPS: usize = 5;
/// Characters of code shown per context.
const MAX_SNIPPET_CHARS: usize = 500;
/// Node or relationship types listed in the graph overview.
const MAX_TYPES: usize = 8;

/// Store-level statistics reported by connect and ingestion.
///
/// Shown under the graph overview, before and after any query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub total_nodes: Option<u64>,
    pub total_relationships: Option<u64>,
    pub node_types: Vec<TypeCount>,
    pub relationship_types: Vec<TypeCount>,
    pub embeddings: Option<EmbeddingStats>,
}

impl StoreStats {
    /// Totals from a connect acknowledgement, if it carried any.
    pub fn record_connect(&mut self, ack: &Acknowledgement) {
        self.total_nodes = ack.total_nodes.or(self.total_nodes);
        self.total_relationships = ack.total_relationships.or(self.total_relationships);
    }

    /// Ingestion figures take precedence over the connect totals.
    pub fn record_ingest(&mut self, report: &IngestReport) {
        self.total_nodes = report.total_nodes.or(self.total_nodes);
        self.total_relationships = report.total_relationships.or(self.total_relationships);
        self.node_types = report.node_types.clone();
        self.relationship_types = report.relationship_types.clone();
        self.embeddings = report.embeddings.clone();
    }

    pub fn is_empty(&self) -> bool {
        self.total_nodes.is_none()
            && self.total_relationships.is_none()
            && self.node_types.is_empty()
            && self.relationship_types.is_empty()
            && self.embeddings.is_none()
    }

    fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.total_nodes.is_some() || self.total_relationships.is_some() {
            lines.push(format!(
                "Store: {} nodes, {} relationships",
                self.total_nodes.unwrap_or(0),
                self.total_relationships.unwrap_or(0)
            ));
        }
        if !self.node_types.is_empty() {
            lines.push(format!("Node types: {}", type_list(&self.node_types)));
        }
        if !self.relationship_types.is_empty() {
            lines.push(format!(
                "Relationship types: {}",
                type_list(&self.relationship_types)
            ));
        }
        if let Some(embeddings) = &self.embeddings {
            lines.push(format!(
                "Embeddings: {}  Est. cost: ${:.4}",
                embeddings.total_embeddings_generated, embeddings.estimated_cost_usd
            ));
        }
        lines
    }
}

fn type_list(types: &[TypeCount]) -> String {
    types
        .iter()
        .take(MAX_TYPES)
        .map(|t| format!("{}: {}", t.label, t.count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A rendered section.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: SectionKind,
    pub expanded: bool,
    pub loading: bool,
    pub lines: Vec<String>,
}

impl Block {
    /// Header plus, when expanded, the indented body.
    pub fn render(&self) -> Vec<String> {
        let marker = if self.expanded { "[-]" } else { "[+]" };
        let mut header = format!("{} {}", marker, self.kind.title());
        if self.loading {
            header.push_str(" (loading...)");
        }

        let mut out = vec![header];
        if self.expanded {
            out.extend(self.lines.iter().map(|line| format!("    {}", line)));
        }
        out
    }
}

/// Collapsible results panel
#[derive(Debug, Clone)]
pub struct ResultsPanel {
    expanded: BTreeMap<SectionKind, bool>,
}

impl ResultsPanel {
    /// Every section starts expanded.
    pub fn new() -> Self {
        Self {
            expanded: SectionKind::ALL.iter().map(|kind| (*kind, true)).collect(),
        }
    }

    pub fn is_expanded(&self, kind: SectionKind) -> bool {
        self.expanded.get(&kind).copied().unwrap_or(true)
    }

    /// Flip a section's flag and return the new value.
    pub fn toggle(&mut self, kind: SectionKind) -> bool {
        let flag = self.expanded.entry(kind).or_insert(true);
        *flag = !*flag;
        *flag
    }

    /// Blocks for the current state, in display order.
    ///
    /// Answer-derived blocks only appear when the latest answer carries them.
    pub fn blocks(
        &self,
        aggregator: &ResultAggregator,
        answer: Option<&QueryAnswer>,
        stats: &StoreStats,
    ) -> Vec<Block> {
        let mut graph = self.section_block(SectionKind::Graph, aggregator.graph(), graph_lines);
        if !stats.is_empty() {
            if matches!(aggregator.graph().phase(), SectionPhase::Idle) {
                graph.lines.clear();
            }
            graph.lines.extend(stats.lines());
        }

        let mut blocks = vec![
            graph,
            self.section_block(
                SectionKind::Context,
                aggregator.context(),
                |entries: &Vec<ContextEntry>| context_lines(entries),
            ),
            self.section_block(SectionKind::Paths, aggregator.paths(), path_lines),
        ];

        if let Some(reasoning) = answer.and_then(|a| a.reasoning.as_ref()) {
            blocks.push(self.static_block(SectionKind::Reasoning, reasoning_lines(reasoning)));
        }
        if let Some(contexts) = answer.map(|a| &a.contexts).filter(|c| !c.is_empty()) {
            blocks.push(self.static_block(SectionKind::CodeContexts, code_context_lines(contexts)));
        }
        blocks
    }

    /// Whole panel as text.
    pub fn render(
        &self,
        aggregator: &ResultAggregator,
        answer: Option<&QueryAnswer>,
        stats: &StoreStats,
    ) -> String {
        if aggregator.generation().is_none() && answer.is_none() && stats.is_empty() {
            return "Results will appear here".to_string();
        }

        let mut lines: Vec<String> = self
            .blocks(aggregator, answer, stats)
            .iter()
            .flat_map(Block::render)
            .collect();

        if let Some(answer) = answer {
            if answer.reasoning.is_none() && answer.contexts.is_empty() {
                if let Some(status) = &answer.status {
                    lines.push(format!("Query completed: {}", status));
                }
            }
        }
        lines.join("\n")
    }

    fn section_block<T>(
        &self,
        kind: SectionKind,
        section: &SectionState<T>,
        describe: impl Fn(&T) -> Vec<String>,
    ) -> Block {
        let lines = match section.phase() {
            SectionPhase::Idle => vec!["Waiting for a query".to_string()],
            SectionPhase::Loading => vec!["Loading...".to_string()],
            SectionPhase::Ready(data) => describe(data),
            SectionPhase::Failed(message) => vec![format!("Error: {}", message)],
            SectionPhase::Skipped(reason) => vec![reason.clone()],
        };

        Block {
            kind,
            expanded: self.is_expanded(kind),
            loading: section.is_loading(),
            lines,
        }
    }

    fn static_block(&self, kind: SectionKind, lines: Vec<String>) -> Block {
        Block {
            kind,
            expanded: self.is_expanded(kind),
            loading: false,
            lines,
        }
    }
}

impl Default for ResultsPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn graph_lines(overview: &GraphOverview) -> Vec<String> {
    vec![format!(
        "Nodes: {}  Relationships: {}",
        overview.nodes, overview.relationships
    )]
}

fn context_lines(entries: &[ContextEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| match &entry.outcome {
            Ok(context) => format!("{}: {}", entry.entity, context.summary()),
            Err(message) => format!("{}: error: {}", entry.entity, message),
        })
        .collect()
}

fn path_lines(set: &PathSet) -> Vec<String> {
    if set.paths.is_empty() {
        return vec!["No paths found".to_string()];
    }
    set.paths
        .iter()
        .map(|path| {
            path.iter()
                .map(|node| node.label())
                .collect::<Vec<_>>()
                .join(" -> ")
        })
        .collect()
}

fn reasoning_lines(reasoning: &ReasoningData) -> Vec<String> {
    let summary = &reasoning.summary;
    let mut lines = vec![format!(
        "{} contexts, {} relationships",
        summary.total_contexts, summary.total_relationships
    )];

    if !summary.by_method.is_empty() {
        let methods: Vec<String> = summary
            .by_method
            .iter()
            .map(|(method, count)| format!("{}: {}", method, count))
            .collect();
        lines.push(format!("Methods: {}", methods.join(", ")));
    }

    for step in reasoning.retrieval_steps.iter().take(MAX_STEPS) {
        lines.push(format!("* {} ({})", step.context_name, step.context_type));
        lines.push(format!("  {} • {}", step.file_path, step.line_range));
        lines.push(format!(
            "  Score: {:.2} • {}",
            step.relevance_score, step.retrieval_method
        ));
        if !step.explanation.is_empty() {
            lines.push(format!("  \"{}\"", step.explanation));
        }
    }
    lines
}

fn code_context_lines(contexts: &[CodeContext]) -> Vec<String> {
    let mut lines = Vec::new();
    for ctx in contexts {
        lines.push(format!(
            "{} ({}) {} ({}-{})",
            ctx.name, ctx.kind, ctx.file_path, ctx.line_start, ctx.line_end
        ));

        let mut snippet: String = ctx.content.chars().take(MAX_SNIPPET_CHARS).collect();
        if ctx.content.chars().count() > MAX_SNIPPET_CHARS {
            snippet.push_str("...");
        }
        lines.extend(snippet.lines().map(|line| format!("  | {}", line)));
    }
    lines
}
