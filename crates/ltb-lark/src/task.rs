use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use ltb_core::{
    task::{
        port::TaskBackend,
        types::{TaskDraft, TaskReceipt},
    },
    Result,
};

use crate::client::LarkClient;

const CREATE_TASK_PATH: &str = "/open-apis/task/v2/tasks";

/// Pick the task guid out of a create answer. `data` is read loosely: once the
/// platform said `code == 0` the task exists, whatever else `data` holds.
fn task_guid(data: Option<&Value>) -> Option<String> {
    data?
        .pointer("/task/guid")?
        .as_str()
        .map(str::to_string)
}

/// `TaskBackend` over the Lark Task v2 API.
#[derive(Clone)]
pub struct LarkTaskBackend {
    client: Arc<LarkClient>,
}

impl LarkTaskBackend {
    pub fn new(client: Arc<LarkClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskBackend for LarkTaskBackend {
    async fn create_task(&self, draft: &TaskDraft) -> Result<TaskReceipt> {
        let resp = self
            .client
            .post::<_, Value>(CREATE_TASK_PATH, &[], draft)
            .await?;

        Ok(TaskReceipt {
            task_id: task_guid(resp.data.as_ref()),
            log_id: resp.log_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn guid_is_read_from_task() {
        let data = json!({ "task": { "guid": "g-1", "summary": "x" } });
        assert_eq!(task_guid(Some(&data)).as_deref(), Some("g-1"));
    }

    #[test]
    fn unexpected_data_shape_still_yields_receipt() {
        assert_eq!(task_guid(None), None);
        assert_eq!(task_guid(Some(&json!([1, 2]))), None);
        assert_eq!(task_guid(Some(&json!({ "task": "g-1" }))), None);
        assert_eq!(task_guid(Some(&json!({ "task": { "guid": 7 } }))), None);
    }
}
