//! Per-event pipeline: decode → parse → orchestrate → format → deliver.

use std::sync::Arc;

use serde::Deserialize;

use crate::{
    command::{self, ParsedCommand},
    context::CallContext,
    domain::MessageId,
    formatting::format_outcome,
    messaging::{
        port::MessageDelivery,
        types::{DeliveryMode, InboundMessage, OutboundReply, TEXT_CONTENT_TYPE},
    },
    orchestrator::TaskOrchestrator,
    task::port::TaskBackend,
    Result,
};

#[derive(Deserialize)]
struct TextEnvelope {
    #[serde(default)]
    text: String,
}

/// Extract the text of a message, or `None` if it is not a text envelope.
///
/// A JSON object without a `text` field reads as empty text (and so gets the
/// help prompt); a `text` that is not a string is malformed.
pub fn decode_text_content(content_type: &str, raw_payload: &str) -> Option<String> {
    if content_type != TEXT_CONTENT_TYPE {
        return None;
    }
    serde_json::from_str::<TextEnvelope>(raw_payload)
        .ok()
        .map(|env| env.text)
}

pub fn interpret(msg: &InboundMessage) -> ParsedCommand {
    match decode_text_content(&msg.content_type, &msg.raw_payload) {
        Some(text) => command::parse(&text),
        None => ParsedCommand::MalformedContent,
    }
}

/// Routes inbound messages to a reply. Holds no per-event state.
#[derive(Clone)]
pub struct MessageRouter {
    orchestrator: TaskOrchestrator,
    delivery: Arc<dyn MessageDelivery>,
}

impl MessageRouter {
    pub fn new(backend: Arc<dyn TaskBackend>, delivery: Arc<dyn MessageDelivery>) -> Self {
        Self::with_orchestrator(TaskOrchestrator::new(backend), delivery)
    }

    pub fn with_orchestrator(
        orchestrator: TaskOrchestrator,
        delivery: Arc<dyn MessageDelivery>,
    ) -> Self {
        Self {
            orchestrator,
            delivery,
        }
    }

    /// Build the reply for one message. Fails only if `ctx` is cancelled.
    pub async fn handle(&self, msg: &InboundMessage, ctx: &CallContext) -> Result<OutboundReply> {
        let cmd = interpret(msg);
        if cmd == ParsedCommand::MalformedContent {
            tracing::info!(
                message_id = %msg.message_id,
                content_type = %msg.content_type,
                "content is not a text envelope"
            );
        }

        let outcome = self
            .orchestrator
            .create_from_command(cmd, &msg.message_id, ctx)
            .await?;

        Ok(OutboundReply {
            text: format_outcome(&outcome),
            delivery_mode: DeliveryMode::for_message(msg),
        })
    }

    /// Hand the reply to `source` to the delivery port. No retry, no fallback path.
    pub async fn deliver(
        &self,
        source: &MessageId,
        reply: &OutboundReply,
        ctx: &CallContext,
    ) -> Result<()> {
        let res = match &reply.delivery_mode {
            DeliveryMode::SendToChannel(chat_id) => {
                ctx.guard(self.delivery.send_to_channel(chat_id, &reply.text))
                    .await
            }
            DeliveryMode::ReplyToMessage(message_id) => {
                ctx.guard(self.delivery.reply_to_message(message_id, &reply.text))
                    .await
            }
        };

        if let Err(e) = &res {
            tracing::error!(
                message_id = %source,
                mode = ?reply.delivery_mode,
                "deliver reply failed: {e}"
            );
        }
        res
    }

    /// Full handling of one inbound event.
    pub async fn dispatch(&self, msg: &InboundMessage, ctx: &CallContext) -> Result<OutboundReply> {
        tracing::info!(
            message_id = %msg.message_id,
            channel = msg.channel_kind.as_str(),
            "message received"
        );
        let reply = self.handle(msg, ctx).await?;
        self.deliver(&msg.message_id, &reply, ctx).await?;
        Ok(reply)
    }
}
