//! 对话状态：单线程（thread）内跨轮次携带的全部数据
//!
//! ConversationState 在每轮开始时从检查点恢复（或新建），按值在各阶段之间传递，
//! 结束时写回检查点。turns 为只追加的转录，Finalize 后裁剪到最近 MAX_TURNS 条。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::ToolCallRequest;

/// Finalize 后保留的最大转录条数（最旧的先丢弃）
pub const MAX_TURNS: usize = 40;

/// 转录中一条消息的角色
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    /// 渲染到 prompt 中的标签（"User" / "Assistant"）
    pub fn label(&self) -> &'static str {
        match self {
            TurnRole::User => "User",
            TurnRole::Assistant => "Assistant",
        }
    }
}

/// 转录中的一条消息，追加后不可变
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// 粗粒度路由：结构化（生产力工具）或自由对话
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Structured,
    Freeform,
}

/// 细粒度意图，仅在 Route::Structured 下有意义，驱动 prompt 片段选择
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Planning,
    Scheduling,
    Tasks,
    Tracking,
}

impl Intent {
    /// 分类器 JSON 输出中的意图标签
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "planning" => Some(Intent::Planning),
            "scheduling" => Some(Intent::Scheduling),
            "tasks" => Some(Intent::Tasks),
            "tracking" => Some(Intent::Tracking),
            _ => None,
        }
    }
}

/// 单个对话线程的完整状态
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConversationState {
    /// 线程标识，创建后不再改变
    pub thread_id: String,
    /// 转录：最旧在前
    pub turns: Vec<Turn>,
    /// 本轮待处理的用户消息；Entry 阶段消费后清空，每轮恰好消费一次
    pub pending_user_message: Option<String>,
    /// 分类器输出的路由；None 表示直接进入 Finalize
    pub route: Option<Route>,
    pub intent: Option<Intent>,
    /// 本轮 Agent 阶段产出的助手文本（工具输出与模型文本合并后的结果）
    pub assistant_text: Option<String>,
    /// 结构化 Agent 本轮捕获的工具调用请求（序列中最后一条带调用的消息胜出）
    pub pending_tool_calls: Option<Vec<ToolCallRequest>>,
    /// 工具执行产生的文本输出
    pub tool_output: Option<String>,
    pub tool_error: Option<String>,
    pub model_error: Option<String>,
    /// 本轮最终回复，仅由 Finalize 设置，Finalize 之后保证非空
    pub reply: Option<String>,
}

impl ConversationState {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            ..Default::default()
        }
    }

    /// 超过 MAX_TURNS 时丢弃最旧的条目，保留最近部分
    pub fn trim_turns(&mut self) {
        if self.turns.len() > MAX_TURNS {
            let drop = self.turns.len() - MAX_TURNS;
            self.turns.drain(..drop);
        }
    }

    /// 渲染全部转录为 "Role: content" 行，供 prompt 拼接
    pub fn render_history(&self) -> String {
        render_turns(&self.turns)
    }

    /// 分离出最新的用户消息与其之前的历史（Agent 阶段：历史进 prompt，最新消息单独传入模型）
    pub fn split_newest_user_turn(&self) -> (&[Turn], &str) {
        match self.turns.split_last() {
            Some((last, rest)) if last.role == TurnRole::User => (rest, last.content.as_str()),
            _ => (self.turns.as_slice(), ""),
        }
    }
}

/// 渲染一组 Turn 为 "Role: content" 行
pub fn render_turns(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role.label(), t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_keeps_most_recent() {
        let mut state = ConversationState::new("t");
        for i in 0..50 {
            state.turns.push(Turn::user(format!("msg {i}")));
        }
        state.trim_turns();
        assert_eq!(state.turns.len(), MAX_TURNS);
        assert_eq!(state.turns.first().unwrap().content, "msg 10");
        assert_eq!(state.turns.last().unwrap().content, "msg 49");
    }

    #[test]
    fn test_split_newest_user_turn() {
        let mut state = ConversationState::new("t");
        state.turns.push(Turn::user("hello"));
        state.turns.push(Turn::assistant("hi there"));
        state.turns.push(Turn::user("plan my week"));

        let (history, newest) = state.split_newest_user_turn();
        assert_eq!(history.len(), 2);
        assert_eq!(newest, "plan my week");
    }

    #[test]
    fn test_render_history_labels() {
        let mut state = ConversationState::new("t");
        state.turns.push(Turn::user("a"));
        state.turns.push(Turn::assistant("b"));
        assert_eq!(state.render_history(), "User: a\nAssistant: b");
    }
}
