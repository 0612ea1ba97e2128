//! Shell command parsing
//!
//! Lines starting with `/` are commands; anything else is a message.

use session_conductor::{MessageOrdinal, Rating, SessionId, SurfaceEvent};

/// Help text printed by `/help`
pub const HELP: &str = "\
Commands:
  /sessions                 list sessions
  /open <id>                open a session
  /new                      start a new chat
  /delete <id>              delete a session
  /older                    load older messages
  /rate <n> good|bad        rate assistant message n
  /retry                    retry the last failed operation
  /refresh                  refresh the session list
  /quit                     exit
Anything else is sent as a message.";

/// A parsed input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the session list
    Sessions,
    /// Open a session
    Open(SessionId),
    /// Start a new chat
    New,
    /// Delete a session
    Delete(SessionId),
    /// Load older history
    Older,
    /// Rate a message
    Rate(MessageOrdinal, Rating),
    /// Retry the last failure
    Retry,
    /// Refresh the session list
    Refresh,
    /// Print help
    Help,
    /// Exit
    Quit,
    /// Send a message
    Send(String),
    /// Blank line
    Nothing,
}

impl Command {
    /// The conductor intent for this command, if it has one
    pub fn into_event(self) -> Option<SurfaceEvent> {
        match self {
            Self::Open(session_id) => Some(SurfaceEvent::SelectSession { session_id }),
            Self::New => Some(SurfaceEvent::NewChat),
            Self::Delete(session_id) => Some(SurfaceEvent::DeleteSession { session_id }),
            Self::Older => Some(SurfaceEvent::LoadOlder),
            Self::Rate(ordinal, rating) => Some(SurfaceEvent::Rate { ordinal, rating }),
            Self::Retry => Some(SurfaceEvent::Retry),
            Self::Refresh => Some(SurfaceEvent::RefreshSessions),
            Self::Send(text) => Some(SurfaceEvent::SendMessage { text }),
            Self::Sessions | Self::Help | Self::Quit | Self::Nothing => None,
        }
    }
}

/// Parse one input line
pub fn parse(line: &str) -> Result<Command, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Command::Nothing);
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Command::Send(line.trim_end().to_string()));
    };

    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    match (name, args.as_slice()) {
        ("sessions" | "ls", []) => Ok(Command::Sessions),
        ("open", [id]) => Ok(Command::Open(SessionId::new(*id))),
        ("new", []) => Ok(Command::New),
        ("delete" | "rm", [id]) => Ok(Command::Delete(SessionId::new(*id))),
        ("older", []) => Ok(Command::Older),
        ("rate", [ordinal, rating]) => {
            let ordinal = ordinal
                .parse::<u64>()
                .map_err(|_| format!("not a message number: {ordinal}"))?;
            let rating = rating.parse::<Rating>()?;
            Ok(Command::Rate(MessageOrdinal(ordinal), rating))
        }
        ("retry", []) => Ok(Command::Retry),
        ("refresh", []) => Ok(Command::Refresh),
        ("help" | "?", []) => Ok(Command::Help),
        ("quit" | "exit" | "q", []) => Ok(Command::Quit),
        _ => Err(format!("unknown command: /{rest} (try /help)")),
    }
}
