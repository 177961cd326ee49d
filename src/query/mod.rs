//! Query submission.
//!
//! Submitting is split in two so the event loop never blocks:
//! [`QuerySubmission::begin`] validates, appends the user turn and marks the
//! submitter busy; the caller performs the single network call and hands the
//! outcome to [`QuerySubmission::complete`]. A second submit while busy is
//! rejected, not queued.

use tracing::{error, info, warn};

use crate::backend::{QueryAnswer, Question};
use crate::conversation::{ConversationLog, Turn};
use crate::error::{BackendResult, SubmitRejection};
use crate::session::{Generation, SessionState};

/// Code location attached to code-profile queries
#[derive(Debug, Clone, PartialEq)]
pub struct FileHint {
    pub path: String,
    pub line: Option<u32>,
}

/// Query submission state
#[derive(Debug, Clone)]
pub struct QuerySubmission {
    busy: bool,
    expand_depth: u32,
    file_hint: Option<FileHint>,
}

impl QuerySubmission {
    pub fn new(expand_depth: u32) -> Self {
        Self {
            busy: false,
            expand_depth,
            file_hint: None,
        }
    }

    /// Whether a query is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn file_hint(&self) -> Option<&FileHint> {
        self.file_hint.as_ref()
    }

    /// Attach (or clear with `None`) a file/line hint for later queries.
    pub fn set_file_hint(&mut self, hint: Option<FileHint>) {
        self.file_hint = hint;
    }

    /// Validate and start a submission.
    ///
    /// On success the user turn is already in `log` and the returned
    /// [`Question`] must be sent exactly once.
    pub fn begin(
        &mut self,
        text: &str,
        session: &SessionState,
        log: &mut ConversationLog,
    ) -> Result<Question, SubmitRejection> {
        if !session.can_query() {
            return Err(SubmitRejection::NotReady);
        }
        let query = text.trim();
        if query.is_empty() {
            return Err(SubmitRejection::EmptyQuery);
        }
        if self.busy {
            warn!("Query rejected: previous query still in flight");
            return Err(SubmitRejection::Busy);
        }

        self.busy = true;
        log.push(Turn::user(query));

        let mut question = Question::new(query, self.expand_depth);
        if let Some(hint) = &self.file_hint {
            question.current_file = Some(hint.path.clone());
            question.current_line = hint.line;
        }
        Ok(question)
    }

    /// Apply the outcome of the query call.
    ///
    /// Success replaces the entity set and returns the new generation.
    /// Failure leaves session state untouched so prior results stay visible.
    pub fn complete(
        &mut self,
        result: BackendResult<QueryAnswer>,
        session: &mut SessionState,
        log: &mut ConversationLog,
    ) -> Option<Generation> {
        self.busy = false;

        match result {
            Ok(answer) => {
                log.push(Turn::assistant(&answer));
                let entity_count = answer.entities.len();
                session.set_entities(answer.entities);
                let generation = session.next_generation();
                info!(
                    generation = %generation,
                    entities = entity_count,
                    "Query answered"
                );
                Some(generation)
            }
            Err(e) => {
                error!(error = %e, "Query failed");
                log.push(Turn::error(e.user_message()));
                None
            }
        }
    }
}
