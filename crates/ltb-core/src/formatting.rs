//! Bilingual reply text for task outcomes.

use crate::orchestrator::{RejectReason, TaskOutcome};

pub const PARSE_ERROR_TEXT: &str =
    "解析消息失败，请发送文本消息\nparse message failed, please send text message";

const SUCCESS_MARK: &str = "✅";
const FAILURE_MARK: &str = "❌";

/// Render an outcome as the text sent back to the user.
pub fn format_outcome(outcome: &TaskOutcome) -> String {
    match outcome {
        TaskOutcome::Created { title } => {
            format!("{SUCCESS_MARK} 任务创建成功 / Task created successfully\n任务: {title}")
        }
        TaskOutcome::Rejected {
            reason: RejectReason::EmptyTitle,
        } => format!("{FAILURE_MARK} 任务标题不能为空 / Task title cannot be empty"),
        TaskOutcome::Rejected { reason } => {
            format!("{FAILURE_MARK} 创建任务失败 / Failed to create task: {reason}")
        }
        TaskOutcome::HelpPrompt { echoed_text } => format!(
            "收到消息: {echoed_text}\n\n\
             💡 提示: 发送 \"创建任务: [任务标题]\" 来创建任务\n\
             Tip: Send \"create task: [task title]\" to create a task"
        ),
        TaskOutcome::ParseError => PARSE_ERROR_TEXT.to_string(),
    }
}

/// Lark text messages carry their body as a JSON-encoded `{"text": ...}` string.
pub fn text_content(text: &str) -> String {
    serde_json::json!({ "text": text }).to_string()
}
