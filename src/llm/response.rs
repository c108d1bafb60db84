//! 模型响应的标签联合
//!
//! 模型能力的返回值只有两种形态：纯文本，或带工具调用 / 工具结果的消息序列。
//! Agent 层对 ModelResponse 做穷尽匹配完成本轮的结果归并。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 模型请求执行的一次工具调用（简化 JSON：{"tool": "create_plan", "args": {...}}）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool: String,
    #[serde(default)]
    pub args: Value,
}

/// 工具循环中产生的一条消息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ModelMessage {
    /// 助手消息：可携带文本内容和 / 或工具调用请求
    Assistant {
        content: String,
        tool_calls: Vec<ToolCallRequest>,
    },
    /// 某次工具执行的结果
    ToolResult { content: String },
}

/// 模型响应：纯文本或消息序列
#[derive(Clone, Debug)]
pub enum ModelResponse {
    Text(String),
    Messages(Vec<ModelMessage>),
}
