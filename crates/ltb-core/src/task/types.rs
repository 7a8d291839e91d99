use serde::{Deserialize, Serialize};

/// Payload for a single create-task call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub summary: String,
    pub description: String,
    pub due: TaskDue,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDue {
    /// RFC3339 timestamp with an explicit offset.
    pub time: String,
}

/// What the backend hands back on success.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskReceipt {
    pub task_id: Option<String>,
    pub log_id: Option<String>,
}
