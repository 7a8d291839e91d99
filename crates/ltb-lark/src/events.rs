//! Webhook callback decoding (event subscription, schema 2.0).

use serde::Deserialize;

use ltb_core::{
    domain::{ChannelKind, ChatId, MessageId},
    errors::Error,
    messaging::types::InboundMessage,
    Result,
};

pub const MESSAGE_RECEIVE_EVENT: &str = "im.message.receive_v1";
const URL_VERIFICATION: &str = "url_verification";

#[derive(Deserialize)]
struct RawCallback {
    #[serde(rename = "type")]
    kind: Option<String>,
    challenge: Option<String>,
    token: Option<String>,
    encrypt: Option<String>,
    header: Option<EventHeader>,
    event: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct EventHeader {
    event_id: String,
    event_type: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct MessageReceiveEvent {
    message: ReceivedMessage,
}

#[derive(Deserialize)]
struct ReceivedMessage {
    message_id: String,
    chat_id: String,
    chat_type: String,
    message_type: String,
    #[serde(default)]
    content: String,
}

/// A decoded webhook callback.
#[derive(Debug)]
pub enum Callback {
    /// Endpoint ownership check; the challenge must be echoed back.
    UrlVerification {
        challenge: String,
        token: Option<String>,
    },
    Message {
        event_id: String,
        token: Option<String>,
        message: InboundMessage,
    },
    /// A well-formed event we do not act on.
    Ignored {
        event_type: String,
        token: Option<String>,
    },
}

impl Callback {
    pub fn token(&self) -> Option<&str> {
        match self {
            Callback::UrlVerification { token, .. }
            | Callback::Message { token, .. }
            | Callback::Ignored { token, .. } => token.as_deref(),
        }
    }

    /// Check the callback's verification token against the configured one.
    /// With no configured token every callback is accepted.
    pub fn is_authentic(&self, expected: Option<&str>) -> bool {
        match expected {
            None => true,
            Some(expected) => self.token() == Some(expected),
        }
    }
}

pub fn decode(body: &[u8]) -> Result<Callback> {
    let raw: RawCallback = serde_json::from_slice(body)?;

    if raw.encrypt.is_some() {
        return Err(Error::Config(
            "encrypted callbacks are not supported; clear the app's Encrypt Key".to_string(),
        ));
    }

    if raw.kind.as_deref() == Some(URL_VERIFICATION) {
        let challenge = raw
            .challenge
            .ok_or_else(|| Error::External("url_verification without challenge".to_string()))?;
        return Ok(Callback::UrlVerification {
            challenge,
            token: raw.token,
        });
    }

    let header = raw
        .header
        .ok_or_else(|| Error::External("unsupported callback schema (no header)".to_string()))?;

    if header.event_type != MESSAGE_RECEIVE_EVENT {
        return Ok(Callback::Ignored {
            event_type: header.event_type,
            token: header.token,
        });
    }

    let event = raw
        .event
        .ok_or_else(|| Error::External("message event without body".to_string()))?;
    let event: MessageReceiveEvent = serde_json::from_value(event)?;
    let m = event.message;

    Ok(Callback::Message {
        event_id: header.event_id,
        token: header.token,
        message: InboundMessage {
            channel_id: ChatId(m.chat_id),
            message_id: MessageId(m.message_id),
            channel_kind: ChannelKind::from_chat_type(&m.chat_type),
            content_type: m.message_type,
            raw_payload: m.content,
        },
    })
}
