//! 结构化 Agent：意图驱动的 prompt + 生产力工具集
//!
//! 组装意图相关的 system prompt（含工具 schema），绑定生产力工具调用模型，
//! 将响应（文本和 / 或工具调用）归并进状态。模型调用异常捕获为 model_error，
//! 由 Finalize 的道歉分支接管。

use std::sync::Arc;

use crate::agents::{apply_model_response, PromptLibrary};
use crate::core::{render_turns, ConversationState};
use crate::llm::ModelRuntime;
use crate::tools::{tool_call_schema_json, ToolExecutor};

pub struct StructuredAgent {
    runtime: Arc<dyn ModelRuntime>,
    tools: Arc<ToolExecutor>,
    prompts: Arc<PromptLibrary>,
}

impl StructuredAgent {
    pub fn new(
        runtime: Arc<dyn ModelRuntime>,
        tools: Arc<ToolExecutor>,
        prompts: Arc<PromptLibrary>,
    ) -> Self {
        Self {
            runtime,
            tools,
            prompts,
        }
    }

    /// 跑一次结构化轮：状态按值进出
    pub async fn run(&self, mut state: ConversationState) -> ConversationState {
        let (history, newest) = state.split_newest_user_turn();
        let system = self.prompts.build_structured_prompt(history, state.intent);
        let history_str = render_turns(history);
        let user_msg = newest.to_string();

        let prompt = format!(
            "{system}\n\nAvailable tools:\n{}\n\nTool call format:\n{}\n\nConversation:\n{history_str}",
            self.tools.schema_json(),
            tool_call_schema_json(),
        );

        match self
            .runtime
            .invoke(&prompt, &user_msg, Some(self.tools.as_ref()))
            .await
        {
            Ok(response) => apply_model_response(&mut state, response),
            Err(e) => {
                tracing::warn!(error = %e, "structured agent model invocation failed");
                state.model_error = Some(e);
            }
        }
        state
    }
}
