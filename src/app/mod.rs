//! Explorer application: owns all client state and drives it from a single
//! event loop.
//!
//! Network calls run in spawned tasks that never touch state. They report back
//! as [`AppEvent`]s over one channel, and only the loop applies them. No locks
//! are needed; stale aggregation results are filtered by generation.

mod commands;

pub use commands::*;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::aggregation::{ApplyOutcome, ResultAggregator, SectionKind, SectionUpdate};
use crate::backend::{Acknowledgement, Backend, IngestReport, QueryAnswer};
use crate::config::Config;
use crate::conversation::ConversationLog;
use crate::error::{AppResult, BackendResult, SubmitRejection};
use crate::presentation::{ResultsPanel, StoreStats};
use crate::query::QuerySubmission;
use crate::session::SessionState;

/// Completion of a background call
#[derive(Debug)]
pub enum AppEvent {
    Connected(BackendResult<Acknowledgement>),
    Ingested(BackendResult<IngestReport>),
    Disconnected(BackendResult<Acknowledgement>),
    QueryCompleted(BackendResult<QueryAnswer>),
    Section(SectionUpdate),
}

impl From<SectionUpdate> for AppEvent {
    fn from(update: SectionUpdate) -> Self {
        AppEvent::Section(update)
    }
}

/// Output of one command
#[derive(Debug, Default)]
pub struct Reply {
    pub lines: Vec<String>,
    pub quit: bool,
}

impl Reply {
    fn say(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            quit: false,
        }
    }

    fn lines(lines: Vec<String>) -> Self {
        Self { lines, quit: false }
    }
}

/// Background calls currently in flight, excluding queries and aggregation.
#[derive(Debug, Default)]
struct Pending {
    connect: bool,
    ingest: bool,
    disconnect: bool,
}

enum Step {
    /// Bytes read into the line buffer; zero at end of input.
    Input(usize),
    Event(AppEvent),
}

/// The exploration client
pub struct ExplorerApp {
    config: Config,
    backend: Arc<dyn Backend>,
    session: SessionState,
    conversation: ConversationLog,
    submission: QuerySubmission,
    aggregator: ResultAggregator,
    panel: ResultsPanel,
    last_answer: Option<QueryAnswer>,
    store_stats: StoreStats,
    pending: Pending,
    events_tx: UnboundedSender<AppEvent>,
    events_rx: UnboundedReceiver<AppEvent>,
}

impl ExplorerApp {
    /// Create the app with every section idle.
    pub fn new(config: Config, backend: Arc<dyn Backend>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let aggregator = ResultAggregator::new(Arc::clone(&backend), config.aggregation.clone());
        let submission = QuerySubmission::new(config.chat.expand_depth);

        Self {
            config,
            backend,
            session: SessionState::new(),
            conversation: ConversationLog::new(),
            submission,
            aggregator,
            panel: ResultsPanel::new(),
            last_answer: None,
            store_stats: StoreStats::default(),
            pending: Pending::default(),
            events_tx,
            events_rx,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn conversation(&self) -> &ConversationLog {
        &self.conversation
    }

    pub fn aggregator(&self) -> &ResultAggregator {
        &self.aggregator
    }

    pub fn panel(&self) -> &ResultsPanel {
        &self.panel
    }

    pub fn last_answer(&self) -> Option<&QueryAnswer> {
        self.last_answer.as_ref()
    }

    /// Totals and type counts from connect and ingestion.
    pub fn store_stats(&self) -> &StoreStats {
        &self.store_stats
    }

    /// Nothing in flight: no background call, no query, no loading section.
    pub fn is_idle(&self) -> bool {
        !(self.pending.connect
            || self.pending.ingest
            || self.pending.disconnect
            || self.submission.is_busy()
            || self.aggregator.is_loading())
    }

    /// Header line: readiness plus query and entity counters.
    pub fn status_line(&self) -> String {
        let state = if self.session.can_query() {
            "Ready"
        } else {
            "Not Connected"
        };
        format!(
            "{} | queries: {} | entities: {} | profile: {}",
            state,
            self.session.generation().value(),
            self.session.entities().len(),
            self.config.backend.profile
        )
    }

    /// Current results panel as text.
    pub fn render_results(&self) -> String {
        self.panel
            .render(&self.aggregator, self.last_answer.as_ref(), &self.store_stats)
    }

    /// Start connecting to the graph store.
    pub fn connect(&mut self, db_name: Option<String>) -> String {
        if self.session.is_connected() {
            return "Already connected".to_string();
        }
        if self.pending.connect {
            return "Connection already in progress".to_string();
        }
        self.pending.connect = true;

        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.connect(db_name).await;
            report(&events, AppEvent::Connected(result));
        });
        "Connecting...".to_string()
    }

    /// Start ingesting a document or codebase.
    pub fn ingest(&mut self, path: PathBuf) -> String {
        if !self.session.is_connected() {
            return "Connect before ingesting".to_string();
        }
        if self.pending.ingest {
            return "Ingestion already in progress".to_string();
        }
        self.pending.ingest = true;

        let message = format!("Ingesting {}...", path.display());
        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.ingest(&path).await;
            report(&events, AppEvent::Ingested(result));
        });
        message
    }

    /// Start disconnecting.
    pub fn disconnect(&mut self) -> String {
        if !self.session.is_connected() {
            return "Not connected".to_string();
        }
        if self.pending.disconnect {
            return "Disconnect already in progress".to_string();
        }
        self.pending.disconnect = true;

        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.disconnect().await;
            report(&events, AppEvent::Disconnected(result));
        });
        "Disconnecting...".to_string()
    }

    /// Submit a query. The user turn is logged before the call is spawned.
    pub fn submit(&mut self, text: &str) -> Result<(), SubmitRejection> {
        let question = self
            .submission
            .begin(text, &self.session, &mut self.conversation)?;

        let backend = Arc::clone(&self.backend);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = backend.ask(&question).await;
            report(&events, AppEvent::QueryCompleted(result));
        });
        Ok(())
    }

    /// Flip a section's expand flag.
    pub fn toggle(&mut self, kind: SectionKind) -> bool {
        self.panel.toggle(kind)
    }

    /// Wait for the next background completion.
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.events_rx.recv().await
    }

    /// Process events until nothing is in flight; returns what was printed.
    pub async fn settle(&mut self) -> Vec<String> {
        let mut output = Vec::new();
        while !self.is_idle() {
            match self.events_rx.recv().await {
                Some(event) => output.extend(self.handle_event(event)),
                None => break,
            }
        }
        output
    }

    /// Apply a completed background call to the owned state.
    pub fn handle_event(&mut self, event: AppEvent) -> Vec<String> {
        match event {
            AppEvent::Connected(result) => {
                self.pending.connect = false;
                match result {
                    Ok(ack) => {
                        self.session.mark_connected();
                        self.store_stats.record_connect(&ack);
                        info!(detail = %ack.describe(), "Connected");
                        vec![format!("Connected: {}", ack.describe())]
                    }
                    Err(e) => {
                        error!(error = %e, "Connect failed");
                        vec![format!("Connection failed: {}", e.user_message())]
                    }
                }
            }
            AppEvent::Ingested(result) => {
                self.pending.ingest = false;
                match result {
                    Ok(report) if !self.session.is_connected() => {
                        warn!(detail = %report.message, "Ingestion finished after disconnect");
                        vec!["Ignoring ingestion result: no longer connected".to_string()]
                    }
                    Ok(report) => {
                        self.session.mark_ingested();
                        self.store_stats.record_ingest(&report);
                        info!(
                            files_analyzed = ?report.files_analyzed,
                            total_nodes = ?report.total_nodes,
                            "Ingestion complete"
                        );
                        vec![format!("Ingested: {}", report.message), self.status_line()]
                    }
                    Err(e) => {
                        error!(error = %e, "Ingestion failed");
                        vec![format!("Ingestion failed: {}", e.user_message())]
                    }
                }
            }
            AppEvent::Disconnected(result) => {
                self.pending.disconnect = false;
                match result {
                    Ok(ack) => {
                        self.session.reset_connection();
                        self.store_stats = StoreStats::default();
                        info!("Disconnected");
                        vec![format!("Disconnected: {}", ack.describe())]
                    }
                    Err(e) => {
                        warn!(error = %e, "Disconnect failed");
                        vec![format!("Disconnect failed: {}", e.user_message())]
                    }
                }
            }
            AppEvent::QueryCompleted(result) => {
                let answer = result.as_ref().ok().cloned();
                let generation =
                    self.submission
                        .complete(result, &mut self.session, &mut self.conversation);

                let mut lines = self
                    .conversation
                    .last()
                    .map(|turn| turn.render())
                    .unwrap_or_default();

                if let Some(generation) = generation {
                    self.last_answer = answer;
                    let summary = self.aggregator.dispatch(
                        generation,
                        self.session.entities(),
                        &self.events_tx,
                    );
                    lines.push(format!(
                        "Gathering evidence for {} entities ({} calls)",
                        self.session.entities().len(),
                        summary.call_count()
                    ));
                }
                lines
            }
            AppEvent::Section(update) => match self.aggregator.apply(update) {
                ApplyOutcome::Applied(kind) => self
                    .panel
                    .blocks(&self.aggregator, self.last_answer.as_ref(), &self.store_stats)
                    .into_iter()
                    .find(|block| block.kind == kind)
                    .map(|block| block.render())
                    .unwrap_or_default(),
                ApplyOutcome::Stale(_) => Vec::new(),
            },
        }
    }

    /// Execute one parsed command.
    pub fn execute(&mut self, command: Command) -> Reply {
        match command {
            Command::Connect(db_name) => Reply::say(self.connect(db_name)),
            Command::Upload(path) => Reply::say(self.ingest(path)),
            Command::Disconnect => Reply::say(self.disconnect()),
            Command::Toggle(kind) => {
                let expanded = self.toggle(kind);
                let state = if expanded { "expanded" } else { "collapsed" };
                Reply::say(format!("{} {}", kind.title(), state))
            }
            Command::Results => Reply::say(self.render_results()),
            Command::History => Reply::lines(
                self.conversation
                    .turns()
                    .iter()
                    .flat_map(|turn| turn.render())
                    .collect(),
            ),
            Command::Status => Reply::say(self.status_line()),
            Command::File(hint) => {
                let message = match &hint {
                    Some(hint) => match hint.line {
                        Some(line) => format!("Queries will reference {}:{}", hint.path, line),
                        None => format!("Queries will reference {}", hint.path),
                    },
                    None => "File hint cleared".to_string(),
                };
                self.submission.set_file_hint(hint);
                Reply::say(message)
            }
            Command::Help => Reply::say(HELP),
            Command::Quit => Reply {
                lines: Vec::new(),
                quit: true,
            },
            Command::Query(text) => match self.submit(&text) {
                Ok(()) => Reply::say("Thinking..."),
                Err(SubmitRejection::EmptyQuery) => Reply::default(),
                Err(rejection) => Reply::say(rejection.to_string()),
            },
        }
    }

    /// Read commands from `input` and print to `output` until `/quit`.
    ///
    /// On end of input the loop keeps applying results until nothing is in
    /// flight, then returns.
    pub async fn run<R, W>(&mut self, mut input: R, mut output: W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // read_until keeps partial bytes in `buf` if the event branch wins
        let mut buf = Vec::new();
        let mut input_open = true;

        write_lines(&mut output, &[self.status_line(), "Type /help for commands".to_string()])
            .await?;

        loop {
            if !input_open && self.is_idle() {
                break;
            }

            let step = tokio::select! {
                read = input.read_until(b'\n', &mut buf), if input_open => Step::Input(read?),
                Some(event) = self.events_rx.recv() => Step::Event(event),
            };

            match step {
                Step::Input(read) => {
                    if read == 0 {
                        input_open = false;
                    }
                    let raw = std::mem::take(&mut buf);
                    let reply = match std::str::from_utf8(&raw) {
                        Ok(line) if line.trim().is_empty() => continue,
                        Ok(line) => match Command::parse(line) {
                            Ok(command) => self.execute(command),
                            Err(message) => Reply::say(message),
                        },
                        Err(e) => {
                            warn!(error = %e, "Discarding input line");
                            Reply::say("Ignoring input line: not valid UTF-8")
                        }
                    };
                    write_lines(&mut output, &reply.lines).await?;
                    if reply.quit {
                        break;
                    }
                }
                Step::Event(event) => {
                    let printed = self.handle_event(event);
                    write_lines(&mut output, &printed).await?;
                }
            }
        }

        info!("Explorer session finished");
        Ok(())
    }
}

/// Hand a background result to the event loop.
fn report(events: &UnboundedSender<AppEvent>, event: AppEvent) {
    if events.send(event).is_err() {
        debug!("Event receiver dropped; discarding background result");
    }
}

async fn write_lines<W: AsyncWrite + Unpin>(output: &mut W, lines: &[String]) -> AppResult<()> {
    for line in lines {
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }
    output.flush().await?;
    Ok(())
}
