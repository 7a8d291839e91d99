use std::fmt;

/// Lark chat id (`oc_...`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub String);

/// Lark message id (`om_...`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a message arrived in a one-to-one or a multi-party conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Direct,
    Group,
}

impl ChannelKind {
    /// Map Lark's `chat_type` field. Anything other than `p2p` is a group chat.
    pub fn from_chat_type(chat_type: &str) -> Self {
        if chat_type == "p2p" {
            ChannelKind::Direct
        } else {
            ChannelKind::Group
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Direct => "direct",
            ChannelKind::Group => "group",
        }
    }
}
