use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId},
    Result,
};

/// Outbound delivery port.
///
/// Implementations return `Err` both for transport failures and for platform
/// answers that report a non-success status.
#[async_trait]
pub trait MessageDelivery: Send + Sync {
    async fn send_to_channel(&self, chat_id: &ChatId, text: &str) -> Result<()>;
    async fn reply_to_message(&self, message_id: &MessageId, text: &str) -> Result<()>;
}
