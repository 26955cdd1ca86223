//! Presentation layer: the message model, option builders and the sinks
//! that deliver messages to a transport.
//!
//! Nothing in here holds selection state. Builders take plain data from the
//! core services and return values a transport can draw.

pub mod console;
pub mod embed;
pub mod options;

pub use console::ConsoleSink;
pub use embed::{progress_bar, status_embed, stopped_message, tracking_message};
pub use options::{SelectOption, candidate_options, season_options, tier_options};

use serde::Serialize;

use crate::error::RequestResult;

/// Opaque handle to a message a sink has sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MessageHandle(pub String);

impl std::fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
}

impl Embed {
    #[must_use]
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            color,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn field(mut self, name: &str, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.to_string(),
            value: value.into(),
            inline,
        });
        self
    }

    #[must_use]
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// Buttons attached to a tracking message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    RefreshNow,
    StopTracking,
}

impl Action {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::RefreshNow => "Refresh now",
            Self::StopTracking => "Stop tracking",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    pub actions: Vec<Action>,
}

impl Message {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embed = Some(embed);
        self
    }

    #[must_use]
    pub fn with_actions(mut self, actions: &[Action]) -> Self {
        self.actions = actions.to_vec();
        self
    }
}

/// Where status messages go. An `edit` failure means the message can no
/// longer be updated (the transport timed it out or it was deleted).
#[async_trait::async_trait]
pub trait StatusSink: Send + Sync {
    async fn send(&self, message: Message) -> RequestResult<MessageHandle>;

    async fn edit(&self, handle: &MessageHandle, message: Message) -> RequestResult<()>;
}

/// Cuts `text` to at most `max` characters.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
