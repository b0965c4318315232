//! Command dispatch
//!
//! Producers submit lookup (`w`) and list (`wl`) commands through a
//! `CommandSender`. A single `CommandDispatcher` loop drains one bounded
//! queue and runs each command to completion before taking the next, so
//! output appears in submission order and never interleaves. Producers
//! block once the queue is full.

use std::io::Write;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::formatter::Formatter;
use crate::services::LookupService;

/// Pending commands before producers block
pub const COMMAND_QUEUE_CAPACITY: usize = 10;

/// List size used when the count argument is not a number
pub const DEFAULT_LIST_SIZE: u32 = 5;

pub const FLAG_LOOKUP: &str = "w";
pub const FLAG_LIST: &str = "wl";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Lookup,
    List,
}

impl CommandKind {
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            FLAG_LOOKUP => Some(Self::Lookup),
            FLAG_LIST => Some(Self::List),
            _ => None,
        }
    }

    pub fn flag(self) -> &'static str {
        match self {
            Self::Lookup => FLAG_LOOKUP,
            Self::List => FLAG_LIST,
        }
    }
}

/// A command and its raw string argument (a word, or a count as text)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub argument: String,
}

impl Command {
    pub fn lookup(word: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::Lookup,
            argument: word.into(),
        }
    }

    pub fn list(count: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::List,
            argument: count.into(),
        }
    }

    /// Parse one line of interactive input
    ///
    /// `w <word>` and a bare `<word>` look up; `wl [n]` lists.
    /// Blank lines yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match CommandKind::from_flag(head) {
            Some(kind) => Some(Self {
                kind,
                argument: rest.to_string(),
            }),
            None => Some(Self::lookup(line)),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown command flag: {0}")]
    UnknownFlag(String),

    #[error("Command dispatcher has stopped")]
    Closed,
}

/// Producer side of the command queue
#[derive(Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<Command>,
}

impl CommandSender {
    /// Queue a command, waiting while the queue is full
    pub async fn send(&self, command: Command) -> Result<(), DispatchError> {
        self.tx.send(command).await.map_err(|_| DispatchError::Closed)
    }

    /// Queue a command addressed by its flag name (`w` or `wl`)
    pub async fn send_flag(&self, flag: &str, argument: impl Into<String>) -> Result<(), DispatchError> {
        let kind = CommandKind::from_flag(flag)
            .ok_or_else(|| DispatchError::UnknownFlag(flag.to_string()))?;
        self.send(Command {
            kind,
            argument: argument.into(),
        })
        .await
    }

    pub async fn lookup(&self, word: impl Into<String>) -> Result<(), DispatchError> {
        self.send(Command::lookup(word)).await
    }

    pub async fn list(&self, count: impl Into<String>) -> Result<(), DispatchError> {
        self.send(Command::list(count)).await
    }
}

/// Single consumer of the command queue
pub struct CommandDispatcher<W> {
    rx: mpsc::Receiver<Command>,
    lookup: LookupService,
    formatter: Formatter,
    writer: W,
}

impl<W: Write + Send + 'static> CommandDispatcher<W> {
    pub fn new(lookup: LookupService, formatter: Formatter, writer: W) -> (CommandSender, Self) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let dispatcher = Self {
            rx,
            lookup,
            formatter,
            writer,
        };
        (CommandSender { tx }, dispatcher)
    }

    /// Execute commands until every sender is dropped, then hand back the writer
    pub async fn run(mut self) -> W {
        info!("Command dispatcher started");

        while let Some(command) = self.rx.recv().await {
            debug!(flag = command.kind.flag(), argument = %command.argument, "Executing command");

            let written = match command.kind {
                CommandKind::Lookup => self.handle_lookup(&command.argument).await,
                CommandKind::List => self.handle_list(&command.argument).await,
            };

            if let Err(e) = written.and_then(|_| self.writer.flush()) {
                error!(error = %e, "Failed to write command output");
            }
        }

        info!("Command queue closed, dispatcher stopping");
        self.writer
    }

    async fn handle_lookup(&mut self, word: &str) -> std::io::Result<()> {
        let word = word.trim();
        if word.is_empty() {
            return Ok(());
        }

        match self.lookup.query_word(word).await {
            Ok(record) => self.formatter.render_word(&record, &mut self.writer),
            Err(e) => {
                warn!(word = %word, error = %e, "Lookup failed");
                writeln!(self.writer, "No translation found for \"{}\"", word)
            }
        }
    }

    async fn handle_list(&mut self, argument: &str) -> std::io::Result<()> {
        let count = parse_list_count(argument);

        match self.lookup.list_words(count).await {
            Ok(records) => self.formatter.render_list(&records, &mut self.writer),
            Err(e) => {
                error!(count, error = %e, "Failed to load word list");
                Ok(())
            }
        }
    }
}

/// Count argument of a list command; anything non-numeric means the default
pub fn parse_list_count(argument: &str) -> u32 {
    argument.trim().parse().unwrap_or(DEFAULT_LIST_SIZE)
}
