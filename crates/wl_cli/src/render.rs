//! Live rendering of a conversation to the terminal.

use std::io::{self, Write};

use crossterm::style::Stylize as _;
use wl_chat::{Notification, Severity, Update};
use wl_conversation::{Citation, SealReason};

const USER_LABEL: &str = "you> ";
const ASSISTANT_LABEL: &str = "assistant> ";

/// Writes updates as they arrive: answer text to `out`, notifications to
/// `err`.
pub(crate) struct Renderer<O, E> {
    out: O,
    err: E,
    color: bool,
}

impl<O: Write, E: Write> Renderer<O, E> {
    pub(crate) fn new(out: O, err: E, color: bool) -> Self {
        Self { out, err, color }
    }

    pub(crate) fn greeting(&mut self, text: &str) -> io::Result<()> {
        let label = self.assistant_label();
        writeln!(self.out, "{label}{text}\n")?;
        self.out.flush()
    }

    pub(crate) fn prompt(&mut self) -> io::Result<()> {
        let label = if self.color {
            USER_LABEL.bold().green().to_string()
        } else {
            USER_LABEL.to_owned()
        };

        write!(self.out, "{label}")?;
        self.out.flush()
    }

    pub(crate) fn render(&mut self, update: &Update) -> io::Result<()> {
        match update {
            Update::TurnSubmitted { .. } => return Ok(()),
            Update::TurnOpened { .. } => {
                let label = self.assistant_label();
                write!(self.out, "{label}")?;
            }
            Update::TurnUpdated { delta, .. } => write!(self.out, "{delta}")?,
            Update::TurnSealed {
                reason, citations, ..
            } => self.sealed(*reason, citations)?,
            Update::Notification(notification) => return self.notify(notification),
        }

        self.out.flush()
    }

    /// Print a message that is not part of the conversation.
    pub(crate) fn info(&mut self, message: &str) -> io::Result<()> {
        let message = if self.color {
            message.dim().to_string()
        } else {
            message.to_owned()
        };

        writeln!(self.err, "{message}")?;
        self.err.flush()
    }

    fn sealed(&mut self, reason: SealReason, citations: &[Citation]) -> io::Result<()> {
        writeln!(self.out)?;

        if reason.is_partial() {
            let marker = format!("[{reason}]");
            let marker = if self.color {
                marker.as_str().yellow().to_string()
            } else {
                marker
            };

            writeln!(self.out, "{marker}")?;
        }

        if !citations.is_empty() {
            let heading = if self.color {
                "Sources:".bold().to_string()
            } else {
                "Sources:".to_owned()
            };

            writeln!(self.out, "\n{heading}")?;
            for citation in citations {
                writeln!(self.out, "  {}", format_citation(citation))?;
            }
        }

        writeln!(self.out)
    }

    fn notify(&mut self, notification: &Notification) -> io::Result<()> {
        let Notification {
            severity,
            title,
            description,
        } = notification;

        let title = match (self.color, severity) {
            (false, _) => title.clone(),
            (true, Severity::Error) => title.as_str().bold().red().to_string(),
            (true, Severity::Info) => title.as_str().bold().to_string(),
        };

        writeln!(self.err, "{title}: {description}")?;
        self.err.flush()
    }

    fn assistant_label(&self) -> String {
        if self.color {
            ASSISTANT_LABEL.bold().cyan().to_string()
        } else {
            ASSISTANT_LABEL.to_owned()
        }
    }
}

/// `[87%] fees.pdf: Monthly fee is $5.`
pub(crate) fn format_citation(citation: &Citation) -> String {
    let mut line = format!("[{}%] {}", citation.relevance_percent(), citation.source);
    let excerpt = citation.excerpt.trim();
    if !excerpt.is_empty() {
        line.push_str(": ");
        line.push_str(excerpt);
    }

    line
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
