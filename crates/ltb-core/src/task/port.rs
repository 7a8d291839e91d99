use async_trait::async_trait;

use crate::Result;

use super::types::{TaskDraft, TaskReceipt};

/// Remote task-tracking backend.
///
/// `Err(Error::Rejected { .. })` means the backend answered with a failure;
/// any other error is treated as a transport failure by the orchestrator.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn create_task(&self, draft: &TaskDraft) -> Result<TaskReceipt>;
}
