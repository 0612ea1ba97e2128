//! Line rendering for conductor messages
//!
//! The shell only appends to the terminal, so the renderer remembers which
//! messages it has already printed and emits the difference for each
//! snapshot.

use std::collections::BTreeSet;

use session_conductor::{
    ConductorMessage, ConductorStatus, MessageOrdinal, MessageRole, MessageView, NotifyLevel,
    Rating, SessionId, SessionSummary, ViewSnapshot,
};

/// Turns conductor messages into output lines
#[derive(Debug, Default)]
pub struct Renderer {
    active: Option<SessionId>,
    shown: BTreeSet<MessageOrdinal>,
    headed: bool,
    status: ConductorStatus,
    error: Option<String>,
}

impl Renderer {
    /// Create a renderer that has printed nothing yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print for one message
    pub fn render(&mut self, msg: &ConductorMessage) -> Vec<String> {
        match msg {
            ConductorMessage::StateChanged { snapshot } => self.render_snapshot(snapshot),
            ConductorMessage::Notify { level, message, .. } => {
                vec![format!("[{}] {message}", level_tag(*level))]
            }
        }
    }

    fn render_snapshot(&mut self, snapshot: &ViewSnapshot) -> Vec<String> {
        let mut lines = Vec::new();

        let present: BTreeSet<MessageOrdinal> =
            snapshot.messages.iter().map(|m| m.ordinal).collect();
        // A detached chat gaining its id keeps the same transcript
        let left_session =
            self.active.is_some() && self.active.as_ref() != snapshot.active_session_id.as_ref();
        if left_session || !self.shown.is_subset(&present) {
            self.shown.clear();
            self.headed = false;
        }
        self.active.clone_from(&snapshot.active_session_id);
        // Wait for the first page before titling a switched session
        if !self.headed && !snapshot.messages.is_empty() {
            lines.push(header(snapshot));
            self.headed = true;
        }

        let first_shown = self.shown.first().copied();
        let mut older = 0usize;
        for message in &snapshot.messages {
            if self.shown.contains(&message.ordinal) {
                continue;
            }
            if first_shown.is_some_and(|first| message.ordinal < first) {
                older += 1;
            } else {
                lines.push(message_line(message));
            }
            self.shown.insert(message.ordinal);
        }
        if older > 0 {
            lines.push(format!("  ({older} older messages loaded above)"));
        }

        if snapshot.status != self.status
            && !matches!(snapshot.status, ConductorStatus::Idle | ConductorStatus::Error)
        {
            lines.push(format!("  {}", snapshot.status.description()));
        }
        self.status = snapshot.status;

        if snapshot.error != self.error {
            if let Some(error) = &snapshot.error {
                let hint = if snapshot.can_retry { " (/retry)" } else { "" };
                lines.push(format!("! {error}{hint}"));
            }
            self.error.clone_from(&snapshot.error);
        }

        lines
    }
}

/// Lines listing the sessions, marking the active one
pub fn session_lines(sessions: &[SessionSummary], active: Option<&SessionId>) -> Vec<String> {
    if sessions.is_empty() {
        return vec!["  (no sessions)".to_string()];
    }
    sessions
        .iter()
        .map(|s| {
            let marker = if Some(&s.id) == active { '*' } else { ' ' };
            match s.last_active_at {
                Some(at) => format!(
                    "{marker} {}  {}  ({})",
                    s.id,
                    s.title,
                    at.format("%Y-%m-%d %H:%M")
                ),
                None => format!("{marker} {}  {}", s.id, s.title),
            }
        })
        .collect()
}

fn header(snapshot: &ViewSnapshot) -> String {
    let title = snapshot
        .active_session_id
        .as_ref()
        .and_then(|id| snapshot.sessions.iter().find(|s| &s.id == id))
        .map_or("new chat", |s| s.title.as_str());
    let more = if snapshot.has_more_history {
        "  (/older for history)"
    } else {
        ""
    };
    format!("--- {title} ---{more}")
}

fn message_line(message: &MessageView) -> String {
    let who = match message.role {
        MessageRole::User => "you",
        MessageRole::Assistant => "bot",
    };
    let rating = match message.rating {
        Some(Rating::Good) => " [+]",
        Some(Rating::Bad) => " [-]",
        None => "",
    };
    format!("{:>4} {who}: {}{rating}", message.ordinal.0, message.text)
}

fn level_tag(level: NotifyLevel) -> &'static str {
    match level {
        NotifyLevel::Info => "info",
        NotifyLevel::Warning => "warn",
        NotifyLevel::Error => "error",
        NotifyLevel::Success => "ok",
    }
}
