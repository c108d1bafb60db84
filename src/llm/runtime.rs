//! 模型运行时：LLM 补全 + 工具循环
//!
//! ModelRuntime 是 Agent 面向的不透明能力：给定 system prompt 与最新用户消息，
//! 可选绑定工具集，返回纯文本或消息序列。ToolLoopRuntime 为生产实现：
//! 调用 LLM，解析输出中的 JSON Tool Call，执行工具并将 Observation 回灌，
//! 直到模型给出最终回复或达到最大步数。

use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::{LlmClient, Message, ModelMessage, ModelResponse, ToolCallRequest};
use crate::tools::ToolExecutor;

/// 解析 LLM 单次输出的结果
#[derive(Debug)]
pub enum ParsedOutput {
    /// 直接回复用户
    Reply(String),
    /// 需要执行工具
    ToolCall(ToolCallRequest),
}

/// 解析 LLM 输出：若含有效 JSON 且 tool 非空则为 ToolCall，否则整体视为回复文本
pub fn parse_model_output(output: &str) -> ParsedOutput {
    let trimmed = output.trim();

    // 提取 JSON 块（```json ... ``` 或首个 {...}）
    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or_else(|| rest.trim())
    } else if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        &trimmed[start..=end]
    } else {
        return ParsedOutput::Reply(trimmed.to_string());
    };

    match serde_json::from_str::<ToolCallRequest>(json_str) {
        Ok(call) if !call.tool.is_empty() => ParsedOutput::ToolCall(call),
        // 含大括号的普通文本（或缺 tool 字段的 JSON）按回复处理
        _ => ParsedOutput::Reply(trimmed.to_string()),
    }
}

/// 模型能力接口：invoke(prompt, user_msg, tools?) -> 文本或消息序列；失败以 Err 字符串返回
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    async fn invoke(
        &self,
        system_prompt: &str,
        user_msg: &str,
        tools: Option<&ToolExecutor>,
    ) -> Result<ModelResponse, String>;
}

/// 生产实现：LLM + 工具循环
pub struct ToolLoopRuntime {
    llm: Arc<dyn LlmClient>,
    /// 单轮内最大工具步数，防止死循环
    max_tool_steps: usize,
}

impl ToolLoopRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, max_tool_steps: usize) -> Self {
        Self { llm, max_tool_steps }
    }
}

#[async_trait]
impl ModelRuntime for ToolLoopRuntime {
    async fn invoke(
        &self,
        system_prompt: &str,
        user_msg: &str,
        tools: Option<&ToolExecutor>,
    ) -> Result<ModelResponse, String> {
        let mut messages = vec![Message::system(system_prompt), Message::user(user_msg)];
        let mut current = self.llm.complete(&messages).await?;

        // 未绑定工具时工具处理为 no-op：首次补全即为最终文本
        let Some(executor) = tools else {
            return Ok(ModelResponse::Text(current.trim().to_string()));
        };

        let mut seq: Vec<ModelMessage> = Vec::new();
        for _step in 0..self.max_tool_steps {
            match parse_model_output(&current) {
                ParsedOutput::Reply(text) => {
                    if seq.is_empty() {
                        return Ok(ModelResponse::Text(text));
                    }
                    seq.push(ModelMessage::Assistant {
                        content: text,
                        tool_calls: Vec::new(),
                    });
                    return Ok(ModelResponse::Messages(seq));
                }
                ParsedOutput::ToolCall(call) => {
                    tracing::debug!(tool = %call.tool, "model requested tool call");
                    seq.push(ModelMessage::Assistant {
                        content: String::new(),
                        tool_calls: vec![call.clone()],
                    });

                    // 工具领域错误已在工具内部转为字符串负载；此处仅剩未知工具名 / 超时
                    let observation = match executor.execute(&call.tool, call.args.clone()).await {
                        Ok(output) => output,
                        Err(e) => format!("⚠️ {e}"),
                    };
                    seq.push(ModelMessage::ToolResult {
                        content: observation.clone(),
                    });

                    messages.push(Message::assistant(current.clone()));
                    messages.push(Message::user(format!(
                        "Observation: {observation}\nRespond to the user based on this result. \
                         Do not call another tool unless more work is required."
                    )));
                    current = self.llm.complete(&messages).await?;
                }
            }
        }

        // 步数耗尽：以当前输出收尾
        seq.push(ModelMessage::Assistant {
            content: current.trim().to_string(),
            tool_calls: Vec::new(),
        });
        Ok(ModelResponse::Messages(seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text() {
        match parse_model_output("Sure, let's plan your week.") {
            ParsedOutput::Reply(text) => assert!(text.contains("plan your week")),
            other => panic!("expected reply, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_tool_call() {
        let raw = r#"{"tool": "list_tasks", "args": {}}"#;
        match parse_model_output(raw) {
            ParsedOutput::ToolCall(call) => assert_eq!(call.tool, "list_tasks"),
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_fenced_tool_call() {
        let raw = "Here you go:\n```json\n{\"tool\": \"create_task\", \"args\": {\"title\": \"x\"}}\n```";
        match parse_model_output(raw) {
            ParsedOutput::ToolCall(call) => assert_eq!(call.tool, "create_task"),
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn test_braces_without_tool_field_is_reply() {
        match parse_model_output("JSON looks like {\"key\": \"value\"} in general.") {
            ParsedOutput::Reply(_) => {}
            other => panic!("expected reply, got {other:?}"),
        }
    }
}
