//! Slash commands typed at the prompt.
//!
//! Any line that does not start with `/` is a query.

use std::path::PathBuf;

use crate::aggregation::SectionKind;
use crate::query::FileHint;

/// One line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `/connect [db_name]`
    Connect(Option<String>),
    /// `/upload <path>`
    Upload(PathBuf),
    /// `/disconnect`
    Disconnect,
    /// `/toggle <section>`
    Toggle(SectionKind),
    /// `/results`
    Results,
    /// `/history`
    History,
    /// `/status`
    Status,
    /// `/file [path [line]]`, no argument clears the hint
    File(Option<FileHint>),
    /// `/help`
    Help,
    /// `/quit` or `/exit`
    Quit,
    /// Free text
    Query(String),
}

impl Command {
    /// Parse a line of input.
    pub fn parse(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Ok(Command::Query(trimmed.to_string()));
        };

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };

        match name.to_lowercase().as_str() {
            "connect" => Ok(Command::Connect(
                Some(args.to_string()).filter(|db| !db.is_empty()),
            )),
            "upload" | "ingest" | "load" => {
                if args.is_empty() {
                    return Err("Missing argument: /upload <path>".to_string());
                }
                Ok(Command::Upload(PathBuf::from(args)))
            }
            "disconnect" => Ok(Command::Disconnect),
            "toggle" => {
                if args.is_empty() {
                    return Err(
                        "Missing argument: /toggle <graph|context|paths|reasoning|contexts>"
                            .to_string(),
                    );
                }
                args.parse::<SectionKind>().map(Command::Toggle)
            }
            "results" => Ok(Command::Results),
            "history" => Ok(Command::History),
            "status" => Ok(Command::Status),
            "file" => parse_file_hint(args).map(Command::File),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("Unknown command: /{}. Type /help", other)),
        }
    }
}

fn parse_file_hint(args: &str) -> Result<Option<FileHint>, String> {
    if args.is_empty() {
        return Ok(None);
    }

    // A trailing number is the line; everything before it is the path
    if let Some((path, line)) = args.rsplit_once(char::is_whitespace) {
        if let Ok(line) = line.parse::<u32>() {
            return Ok(Some(FileHint {
                path: path.trim().to_string(),
                line: Some(line),
            }));
        }
    }
    Ok(Some(FileHint {
        path: args.to_string(),
        line: None,
    }))
}

/// Text printed by `/help`
pub const HELP: &str = "\
Commands:
  /connect [db]        connect to the graph store
  /upload <path>       ingest a document (chat) or codebase (code)
  /disconnect          drop the connection
  /toggle <section>    expand/collapse graph, context, paths, reasoning or contexts
  /results             show the results panel
  /history             show the conversation
  /status              show connection status and counters
  /file [path [line]]  attach a file/line hint to code queries (no args clears)
  /quit                exit
Anything else is sent as a query.";
