//! Agent 派发器：固定拓扑的显式状态机
//!
//! Entry → Classify → {Structured | Freeform | 直达} → Finalize → Done。
//! Classify 之后的转移是 route 的纯函数，不受其他状态影响。Finalize 总会到达，
//! 且总产出恰好一条非空回复。状态按值在各阶段之间传递，每轮开始从检查点恢复、
//! 结束时写回。

use std::sync::Arc;

use crate::agents::{FreeformAgent, StructuredAgent};
use crate::core::classifier::IntentClassifier;
use crate::core::{AgentError, ConversationState, Route, Turn, TurnRole};
use crate::memory::CheckpointStore;

/// 状态机阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Entry,
    Classify,
    Structured,
    Freeform,
    Finalize,
    Done,
}

impl Stage {
    /// Classify 之后的转移：route 的纯函数。无路由时直达 Finalize。
    pub fn after_classify(route: Option<Route>) -> Stage {
        match route {
            Some(Route::Structured) => Stage::Structured,
            Some(Route::Freeform) => Stage::Freeform,
            None => Stage::Finalize,
        }
    }
}

/// 派发器：持有分类器、两个 Agent 与检查点存储
pub struct Dispatcher {
    classifier: IntentClassifier,
    structured: StructuredAgent,
    freeform: FreeformAgent,
    checkpoints: Arc<dyn CheckpointStore>,
}

impl Dispatcher {
    pub fn new(
        classifier: IntentClassifier,
        structured: StructuredAgent,
        freeform: FreeformAgent,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            classifier,
            structured,
            freeform,
            checkpoints,
        }
    }

    /// 处理一条入站消息：恢复状态、跑状态机到 Done、写回检查点、返回最终回复。
    /// 同一 thread_id 的并发调用不做协调，由调用方保证按线程串行。
    pub async fn handle_message(
        &self,
        thread_id: &str,
        user_msg: &str,
    ) -> Result<String, AgentError> {
        let mut state = self
            .checkpoints
            .load(thread_id)?
            .unwrap_or_else(|| ConversationState::new(thread_id));
        state.pending_user_message = Some(user_msg.to_string());

        let mut stage = Stage::Entry;
        while stage != Stage::Done {
            (stage, state) = self.step(stage, state).await?;
        }

        self.checkpoints.save(thread_id, &state)?;
        state
            .reply
            .clone()
            .ok_or_else(|| AgentError::InvalidState("finalize produced no reply".to_string()))
    }

    /// 执行一个阶段，返回下一阶段与更新后的状态
    async fn step(
        &self,
        stage: Stage,
        mut state: ConversationState,
    ) -> Result<(Stage, ConversationState), AgentError> {
        match stage {
            Stage::Entry => {
                // 入站消息恰好吸收一次；重入视为编程错误
                let msg = state.pending_user_message.take().ok_or_else(|| {
                    AgentError::InvalidState(
                        "pending user message already consumed".to_string(),
                    )
                })?;
                state.turns.push(Turn::user(msg));
                Ok((Stage::Classify, state))
            }
            Stage::Classify => {
                let newest = state
                    .turns
                    .iter()
                    .rev()
                    .find(|t| t.role == TurnRole::User)
                    .map(|t| t.content.clone())
                    .unwrap_or_default();
                let (route, intent) = self.classifier.classify(&state.turns, &newest).await;
                state.route = route;
                state.intent = intent;
                Ok((Stage::after_classify(route), state))
            }
            Stage::Structured => {
                let state = self.structured.run(state).await;
                Ok((Stage::Finalize, state))
            }
            Stage::Freeform => {
                let state = self.freeform.run(state).await;
                Ok((Stage::Finalize, state))
            }
            Stage::Finalize => {
                finalize(&mut state);
                Ok((Stage::Done, state))
            }
            Stage::Done => Ok((Stage::Done, state)),
        }
    }
}

/// Finalize：将本轮的任意中间结果归并为恰好一条用户可见回复。
///
/// 优先级：Agent 产出的助手文本原样使用；否则有工具 / 模型错误时合成道歉并清除错误字段；
/// 否则合成澄清请求。随后追加助手 Turn、裁剪转录、清空本轮瞬态字段。
pub fn finalize(state: &mut ConversationState) {
    let reply = match state.assistant_text.take().filter(|t| !t.is_empty()) {
        Some(text) => text,
        None => {
            let err = state
                .tool_error
                .take()
                .or_else(|| state.model_error.take());
            match err {
                Some(err) => {
                    format!("⚠️ I ran into an issue: {err} — would you like me to try again?")
                }
                None => "I'm sorry, I didn't quite get that. \
                         Could you clarify or add more details?"
                    .to_string(),
            }
        }
    };

    state.turns.push(Turn::assistant(reply.clone()));
    state.trim_turns();
    state.pending_tool_calls = None;
    state.tool_output = None;
    state.reply = Some(reply);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_after_classify_is_pure_in_route() {
        assert_eq!(
            Stage::after_classify(Some(Route::Structured)),
            Stage::Structured
        );
        assert_eq!(Stage::after_classify(Some(Route::Freeform)), Stage::Freeform);
        assert_eq!(Stage::after_classify(None), Stage::Finalize);
    }

    #[test]
    fn test_finalize_uses_agent_text_verbatim() {
        let mut state = ConversationState::new("t");
        state.turns.push(Turn::user("hi"));
        state.assistant_text = Some("Here is your plan.".to_string());
        finalize(&mut state);
        assert_eq!(state.reply.as_deref(), Some("Here is your plan."));
        assert_eq!(state.turns.last().unwrap().role, TurnRole::Assistant);
    }

    #[test]
    fn test_finalize_apologizes_on_model_error() {
        let mut state = ConversationState::new("t");
        state.model_error = Some("connection refused".to_string());
        finalize(&mut state);
        let reply = state.reply.unwrap();
        assert!(reply.contains("issue"));
        assert!(reply.contains("connection refused"));
        assert!(state.model_error.is_none());
    }

    #[test]
    fn test_finalize_clarifies_when_nothing_produced() {
        let mut state = ConversationState::new("t");
        state.assistant_text = Some(String::new());
        finalize(&mut state);
        let reply = state.reply.unwrap();
        assert!(reply.contains("clarify"));
    }

    #[test]
    fn test_finalize_clears_transient_fields() {
        let mut state = ConversationState::new("t");
        state.assistant_text = Some("ok".to_string());
        state.tool_output = Some("tool said".to_string());
        state.pending_tool_calls = Some(Vec::new());
        finalize(&mut state);
        assert!(state.pending_tool_calls.is_none());
        assert!(state.tool_output.is_none());
        assert!(state.assistant_text.is_none());
    }
}
