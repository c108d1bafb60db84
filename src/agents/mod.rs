//! Agent 层：结构化（生产力工具）与自由对话两个 Agent，及共享的响应归并逻辑

pub mod freeform;
pub mod prompts;
pub mod structured;

pub use freeform::FreeformAgent;
pub use prompts::PromptLibrary;
pub use structured::StructuredAgent;

use crate::core::ConversationState;
use crate::llm::{ModelMessage, ModelResponse};

/// 将模型响应归并进对话状态（两个 Agent 共用；未绑定工具时消息序列退化为纯文本）。
///
/// 扫描规则：带工具调用的助手消息覆盖 pending_tool_calls（最后一条胜出）；
/// 工具结果写入 tool_output（最后一条胜出）；带内容的助手消息设定助手文本（最后一条胜出）。
/// 本轮文本 = 工具输出 + 换行 + 助手文本（两者都有时），否则取存在的那个，都没有则为空串。
pub(crate) fn apply_model_response(state: &mut ConversationState, response: ModelResponse) {
    match response {
        ModelResponse::Text(text) => {
            state.assistant_text = Some(text.trim().to_string());
        }
        ModelResponse::Messages(messages) => {
            let mut assistant = String::new();
            let mut tool_output = String::new();
            for msg in messages {
                match msg {
                    ModelMessage::Assistant {
                        content,
                        tool_calls,
                    } => {
                        if !tool_calls.is_empty() {
                            state.pending_tool_calls = Some(tool_calls);
                        }
                        if !content.is_empty() {
                            assistant = content;
                        }
                    }
                    ModelMessage::ToolResult { content } => {
                        tool_output = content;
                    }
                }
            }
            if !tool_output.is_empty() {
                state.tool_output = Some(tool_output.clone());
            }
            let combined = match (tool_output.is_empty(), assistant.is_empty()) {
                (false, false) => format!("{tool_output}\n{assistant}"),
                (false, true) => tool_output,
                (true, false) => assistant,
                (true, true) => String::new(),
            };
            state.assistant_text = Some(combined);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolCallRequest;

    #[test]
    fn test_plain_text_response() {
        let mut state = ConversationState::new("t");
        apply_model_response(&mut state, ModelResponse::Text("  hello  ".to_string()));
        assert_eq!(state.assistant_text.as_deref(), Some("hello"));
        assert!(state.pending_tool_calls.is_none());
    }

    #[test]
    fn test_last_tool_call_message_wins() {
        let mut state = ConversationState::new("t");
        let call = |tool: &str| ToolCallRequest {
            tool: tool.to_string(),
            args: serde_json::json!({}),
        };
        apply_model_response(
            &mut state,
            ModelResponse::Messages(vec![
                ModelMessage::Assistant {
                    content: String::new(),
                    tool_calls: vec![call("list_tasks")],
                },
                ModelMessage::ToolResult {
                    content: "No tasks yet.".to_string(),
                },
                ModelMessage::Assistant {
                    content: String::new(),
                    tool_calls: vec![call("create_task")],
                },
                ModelMessage::ToolResult {
                    content: "✅ Task created: x (id=1)".to_string(),
                },
                ModelMessage::Assistant {
                    content: "Created it for you.".to_string(),
                    tool_calls: Vec::new(),
                },
            ]),
        );
        let calls = state.pending_tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].tool, "create_task");
        assert_eq!(state.tool_output.as_deref(), Some("✅ Task created: x (id=1)"));
        assert_eq!(
            state.assistant_text.as_deref(),
            Some("✅ Task created: x (id=1)\nCreated it for you.")
        );
    }

    #[test]
    fn test_tool_output_only() {
        let mut state = ConversationState::new("t");
        apply_model_response(
            &mut state,
            ModelResponse::Messages(vec![ModelMessage::ToolResult {
                content: "only output".to_string(),
            }]),
        );
        assert_eq!(state.assistant_text.as_deref(), Some("only output"));
    }
}
