use threadsage_common::types::InboundMessage;

/// Decide whether an inbound message is ours to answer.
///
/// Returns `Ok(())` when the message should be handled, or `Err(reason)` when
/// it should be silently dropped.
pub fn check_scope(channel_id: &str, msg: &InboundMessage) -> Result<(), Filtered> {
    if msg.from_self {
        return Err(Filtered::SelfAuthored);
    }
    if msg.channel_id != channel_id {
        return Err(Filtered::WrongChannel);
    }
    if msg.text.trim().is_empty() {
        return Err(Filtered::Empty);
    }
    Ok(())
}

/// Reason an inbound message was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filtered {
    SelfAuthored,
    WrongChannel,
    Empty,
}

impl std::fmt::Display for Filtered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfAuthored => write!(f, "message authored by the bot"),
            Self::WrongChannel => write!(f, "message from another channel"),
            Self::Empty => write!(f, "message has no text"),
        }
    }
}

/// Whether `text` is the control command, ignoring case and surrounding
/// whitespace.
pub fn is_command(text: &str, command: &str) -> bool {
    text.trim().eq_ignore_ascii_case(command.trim())
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    const CHANNEL: &str = "1375597403750797493";

    #[test]
    fn configured_channel_is_accepted() {
        let msg = InboundMessage::new(CHANNEL, "u1", "how do I start?");
        assert_eq!(check_scope(CHANNEL, &msg), Ok(()));
    }

    #[test]
    fn other_channels_are_ignored() {
        let msg = InboundMessage::new("42", "u1", "hello");
        assert_eq!(check_scope(CHANNEL, &msg), Err(Filtered::WrongChannel));
    }

    #[test]
    fn own_messages_are_ignored_first() {
        let mut msg = InboundMessage::new("42", "bot", "an answer");
        msg.from_self = true;
        assert_eq!(check_scope(CHANNEL, &msg), Err(Filtered::SelfAuthored));
    }

    #[rstest]
    #[case("")]
    #[case("   \n\t")]
    fn blank_messages_are_ignored(#[case] text: &str) {
        let msg = InboundMessage::new(CHANNEL, "u1", text);
        assert_eq!(check_scope(CHANNEL, &msg), Err(Filtered::Empty));
    }

    #[rstest]
    #[case("/show_context", true)]
    #[case("  /SHOW_CONTEXT \n", true)]
    #[case("/Show_Context", true)]
    #[case("/show_context please", false)]
    #[case("show_context", false)]
    fn command_matching(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_command(text, "/show_context"), expected);
    }
}
