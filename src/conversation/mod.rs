//! Conversation log of user and assistant turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::{CodeContext, QueryAnswer, ReasoningData};

/// Number of code contexts listed under an assistant turn.
const CONTEXT_PREVIEW: usize = 3;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One exchange entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub contexts: Vec<CodeContext>,
    #[serde(default)]
    pub reasoning: Option<ReasoningData>,
    pub is_error: bool,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            contexts: Vec::new(),
            reasoning: None,
            is_error: false,
            created_at: Utc::now(),
        }
    }

    /// A user question
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    /// An assistant answer carrying whatever evidence came with it
    pub fn assistant(answer: &QueryAnswer) -> Self {
        let mut turn = Self::new(Role::Assistant, answer.answer.clone());
        turn.contexts = answer.contexts.clone();
        turn.reasoning = answer.reasoning.clone();
        turn
    }

    /// An assistant turn reporting a failed query
    pub fn error(message: impl std::fmt::Display) -> Self {
        let mut turn = Self::new(Role::Assistant, format!("Error: {}", message));
        turn.is_error = true;
        turn
    }

    /// Render the turn as terminal lines.
    pub fn render(&self) -> Vec<String> {
        let speaker = match self.role {
            Role::User => "You",
            Role::Assistant => "AI",
        };

        let mut lines: Vec<String> = Vec::new();
        let mut content = self.content.lines();
        lines.push(format!("{:>3} > {}", speaker, content.next().unwrap_or_default()));
        lines.extend(content.map(|line| format!("      {}", line)));

        if !self.contexts.is_empty() {
            lines.push("      Code contexts:".to_string());
            for ctx in self.contexts.iter().take(CONTEXT_PREVIEW) {
                lines.push(format!("        {} ({})", ctx.name, ctx.kind));
            }
        }
        lines
    }
}

/// Append-only conversation history
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CodeContext;

    fn context(name: &str) -> CodeContext {
        CodeContext {
            name: name.to_string(),
            kind: "function".to_string(),
            file_path: "src/lib.rs".to_string(),
            line_start: 1,
            line_end: 2,
            content: String::new(),
            relevance_score: 0.5,
        }
    }

    #[test]
    fn test_user_turn() {
        let turn = Turn::user("What calls Tokenizer?");
        assert_eq!(turn.role, Role::User);
        assert!(!turn.is_error);
        assert_eq!(turn.render(), vec!["You > What calls Tokenizer?"]);
    }

    #[test]
    fn test_error_turn() {
        let turn = Turn::error("Internal Server Error");
        assert_eq!(turn.role, Role::Assistant);
        assert!(turn.is_error);
        assert_eq!(turn.content, "Error: Internal Server Error");
    }

    #[test]
    fn test_assistant_turn_lists_first_three_contexts() {
        let answer = QueryAnswer {
            answer: "line one\nline two".to_string(),
            contexts: vec![context("a"), context("b"), context("c"), context("d")],
            ..QueryAnswer::default()
        };
        let lines = Turn::assistant(&answer).render();
        assert_eq!(
            lines,
            vec![
                " AI > line one",
                "      line two",
                "      Code contexts:",
                "        a (function)",
                "        b (function)",
                "        c (function)",
            ]
        );
    }

    #[test]
    fn test_log_appends_in_order() {
        let mut log = ConversationLog::new();
        assert!(log.is_empty());
        log.push(Turn::user("q"));
        log.push(Turn::error("boom"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.turns()[0].role, Role::User);
        assert!(log.last().map(|t| t.is_error).unwrap_or(false));
    }

    #[test]
    fn test_turn_ids_are_unique() {
        assert_ne!(Turn::user("a").id, Turn::user("a").id);
    }
}
