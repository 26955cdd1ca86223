use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::{RequestError, RequestResult};

use super::{Message, MessageHandle, StatusSink};

/// Plain-text rendering of a message for terminals and logs.
#[must_use]
pub fn format_message(message: &Message) -> String {
    let mut out = String::new();
    if let Some(content) = &message.content {
        let _ = writeln!(out, "{content}");
    }
    if let Some(embed) = &message.embed {
        let _ = writeln!(out, "── {} ──", embed.title);
        if let Some(description) = &embed.description {
            let _ = writeln!(out, "{description}");
        }
        for field in &embed.fields {
            let _ = writeln!(out, "{}: {}", field.name, field.value);
        }
        if let Some(thumbnail) = &embed.thumbnail {
            let _ = writeln!(out, "Poster: {thumbnail}");
        }
    }
    if !message.actions.is_empty() {
        let labels: Vec<&str> = message.actions.iter().map(|a| a.label()).collect();
        let _ = writeln!(out, "[{}]", labels.join("] ["));
    }
    out
}

/// Sink that prints every send and edit to stdout.
///
/// Once closed, edits fail the way an expired chat message would.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl ConsoleSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl StatusSink for ConsoleSink {
    async fn send(&self, message: Message) -> RequestResult<MessageHandle> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RequestError::Render("console closed".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        print!("{}", format_message(&message));
        Ok(MessageHandle(format!("console-{id}")))
    }

    async fn edit(&self, handle: &MessageHandle, message: Message) -> RequestResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RequestError::Render(format!("{handle} can no longer be edited")));
        }
        print!("{}", format_message(&message));
        Ok(())
    }
}
