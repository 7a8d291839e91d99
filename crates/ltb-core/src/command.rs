//! Bilingual command recognition.

/// Chinese marker, matched case-sensitively.
pub const CREATE_TASK_MARKER_ZH: &str = "创建任务:";
/// English marker, matched case-insensitively.
pub const CREATE_TASK_MARKER_EN: &str = "create task:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedCommand {
    CreateTask { title: String },
    Unknown { original_text: String },
    MalformedContent,
}

/// Find the English marker in the lower-cased text and return the byte offset in
/// `raw_text` just past it.
///
/// Lowering goes char by char so every lowered byte maps back to the end of the
/// original char it came from.
fn english_marker_end(raw_text: &str) -> Option<usize> {
    let mut lowered = String::with_capacity(raw_text.len());
    let mut source_end = Vec::with_capacity(raw_text.len());
    for (start, c) in raw_text.char_indices() {
        let end = start + c.len_utf8();
        for lc in c.to_lowercase() {
            lowered.push(lc);
            source_end.resize(lowered.len(), end);
        }
    }

    let at = lowered.find(CREATE_TASK_MARKER_EN)?;
    Some(source_end[at + CREATE_TASK_MARKER_EN.len() - 1])
}

/// Interpret raw message text.
///
/// The Chinese marker is checked first and wins when both are present. An empty
/// title is still a `CreateTask`; emptiness is rejected by the orchestrator.
pub fn parse(raw_text: &str) -> ParsedCommand {
    if let Some((_, rest)) = raw_text.split_once(CREATE_TASK_MARKER_ZH) {
        return ParsedCommand::CreateTask {
            title: rest.trim().to_string(),
        };
    }

    // Slice the original text so the title keeps its casing.
    if let Some(end) = english_marker_end(raw_text) {
        return ParsedCommand::CreateTask {
            title: raw_text[end..].trim().to_string(),
        };
    }

    ParsedCommand::Unknown {
        original_text: raw_text.to_string(),
    }
}
