//! Turns a parsed command into a task outcome.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Local, SecondsFormat};

use crate::{
    command::ParsedCommand,
    context::CallContext,
    domain::MessageId,
    errors::Error,
    task::{
        port::TaskBackend,
        types::{TaskDraft, TaskDue},
    },
    Result,
};

/// How far in the future a new task is due.
pub const TASK_DUE_HOURS: i64 = 24;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    Created { title: String },
    Rejected { reason: RejectReason },
    HelpPrompt { echoed_text: String },
    ParseError,
}

/// Why a task was not created.
///
/// The variants only matter for logs; every one of them renders as the same
/// kind of failure reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    EmptyTitle,
    Backend {
        code: i64,
        message: String,
        log_id: Option<String>,
    },
    Transport {
        description: String,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptyTitle => f.write_str("title empty"),
            RejectReason::Backend { message, .. } => f.write_str(message),
            RejectReason::Transport { description } => f.write_str(description),
        }
    }
}

pub type Clock = fn() -> DateTime<FixedOffset>;

fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

pub fn task_description(source_message_id: &MessageId) -> String {
    format!("来自消息的任务 / Task from message\n消息ID / Message ID: {source_message_id}")
}

pub fn due_time(now: DateTime<FixedOffset>) -> String {
    (now + ChronoDuration::hours(TASK_DUE_HOURS)).to_rfc3339_opts(SecondsFormat::Secs, false)
}

#[derive(Clone)]
pub struct TaskOrchestrator {
    backend: Arc<dyn TaskBackend>,
    clock: Clock,
}

impl TaskOrchestrator {
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        Self {
            backend,
            clock: local_now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Resolve a command. Makes at most one backend call and never retries.
    ///
    /// Only cancellation of `ctx` is returned as an error; every other failure
    /// becomes `TaskOutcome::Rejected`.
    pub async fn create_from_command(
        &self,
        cmd: ParsedCommand,
        source_message_id: &MessageId,
        ctx: &CallContext,
    ) -> Result<TaskOutcome> {
        let title = match cmd {
            ParsedCommand::Unknown { original_text } => {
                return Ok(TaskOutcome::HelpPrompt {
                    echoed_text: original_text,
                })
            }
            ParsedCommand::MalformedContent => return Ok(TaskOutcome::ParseError),
            ParsedCommand::CreateTask { title } => title,
        };

        if title.is_empty() {
            return Ok(TaskOutcome::Rejected {
                reason: RejectReason::EmptyTitle,
            });
        }

        let draft = TaskDraft {
            summary: title.clone(),
            description: task_description(source_message_id),
            due: TaskDue {
                time: due_time((self.clock)()),
            },
        };

        match ctx.guard(self.backend.create_task(&draft)).await {
            Ok(receipt) => {
                tracing::info!(
                    message_id = %source_message_id,
                    task_id = receipt.task_id.as_deref().unwrap_or("-"),
                    "task created"
                );
                Ok(TaskOutcome::Created { title })
            }
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(Error::Rejected { code, msg, log_id }) => {
                tracing::warn!(
                    message_id = %source_message_id,
                    code,
                    log_id = log_id.as_deref().unwrap_or("-"),
                    "create task failed: {msg}"
                );
                Ok(TaskOutcome::Rejected {
                    reason: RejectReason::Backend {
                        code,
                        message: msg,
                        log_id,
                    },
                })
            }
            Err(e) => {
                tracing::warn!(message_id = %source_message_id, "create task error: {e}");
                Ok(TaskOutcome::Rejected {
                    reason: RejectReason::Transport {
                        description: e.to_string(),
                    },
                })
            }
        }
    }
}
