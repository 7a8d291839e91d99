use crate::domain::{ChannelKind, ChatId, MessageId};

/// Content type of a plain text message.
pub const TEXT_CONTENT_TYPE: &str = "text";

/// A message received from the platform.
///
/// Built by the event source per received message; never persisted.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub channel_id: ChatId,
    pub message_id: MessageId,
    pub channel_kind: ChannelKind,
    /// Platform message type (`text`, `image`, `post`, ...).
    pub content_type: String,
    /// Raw `content` JSON string as delivered by the platform.
    pub raw_payload: String,
}

/// How a reply reaches the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryMode {
    SendToChannel(ChatId),
    ReplyToMessage(MessageId),
}

impl DeliveryMode {
    /// Direct chats get a new message; group chats get a threaded reply.
    pub fn for_message(msg: &InboundMessage) -> Self {
        match msg.channel_kind {
            ChannelKind::Direct => DeliveryMode::SendToChannel(msg.channel_id.clone()),
            ChannelKind::Group => DeliveryMode::ReplyToMessage(msg.message_id.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundReply {
    pub text: String,
    pub delivery_mode: DeliveryMode,
}
