use serde::{Deserialize, Serialize};

/// A message as delivered by any chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Channel (or chat) the message was posted in.
    pub channel_id: String,
    pub author_id: String,
    /// Set by the transport when the bot itself authored the message.
    #[serde(default)]
    pub from_self: bool,
    pub text: String,
}

impl InboundMessage {
    pub fn new(
        channel_id: impl Into<String>,
        author_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            author_id: author_id.into(),
            from_self: false,
            text: text.into(),
        }
    }
}

/// Text to send back to the channel the message came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyPayload {
    pub text: String,
}

impl ReplyPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
