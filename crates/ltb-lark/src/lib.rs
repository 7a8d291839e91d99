//! Lark (Feishu) adapter.
//!
//! Implements the `ltb-core` ports over the Lark Open Platform: task creation,
//! message delivery, and the webhook event source.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

pub mod client;
pub mod events;
pub mod server;
pub mod task;

#[cfg(test)]
mod testing;

pub use client::LarkClient;
pub use task::LarkTaskBackend;

use ltb_core::{
    domain::{ChatId, MessageId},
    formatting::text_content,
    messaging::{port::MessageDelivery, types::TEXT_CONTENT_TYPE},
    Result,
};

const MESSAGES_PATH: &str = "/open-apis/im/v1/messages";

#[derive(Serialize)]
struct CreateMessageBody<'a> {
    receive_id: &'a str,
    msg_type: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ReplyMessageBody<'a> {
    msg_type: &'a str,
    content: String,
}

/// `MessageDelivery` over the Lark IM v1 API.
#[derive(Clone)]
pub struct LarkMessenger {
    client: Arc<LarkClient>,
}

impl LarkMessenger {
    pub fn new(client: Arc<LarkClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageDelivery for LarkMessenger {
    async fn send_to_channel(&self, chat_id: &ChatId, text: &str) -> Result<()> {
        let body = CreateMessageBody {
            receive_id: &chat_id.0,
            msg_type: TEXT_CONTENT_TYPE,
            content: text_content(text),
        };
        self.client
            .post::<_, serde_json::Value>(MESSAGES_PATH, &[("receive_id_type", "chat_id")], &body)
            .await?;
        Ok(())
    }

    async fn reply_to_message(&self, message_id: &MessageId, text: &str) -> Result<()> {
        let body = ReplyMessageBody {
            msg_type: TEXT_CONTENT_TYPE,
            content: text_content(text),
        };
        // The id comes from the callback body, so it must stay one path segment.
        let url = self
            .client
            .api_url(MESSAGES_PATH, &[message_id.0.as_str(), "reply"])?;
        self.client
            .post_url::<_, serde_json::Value>(url, &[], &body)
            .await?;
        Ok(())
    }
}
