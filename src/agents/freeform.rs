//! 自由对话 Agent：反思 / 陪伴式回复，不绑定任何工具

use std::sync::Arc;

use crate::agents::{apply_model_response, PromptLibrary};
use crate::core::{render_turns, ConversationState};
use crate::llm::ModelRuntime;

pub struct FreeformAgent {
    runtime: Arc<dyn ModelRuntime>,
    prompts: Arc<PromptLibrary>,
}

impl FreeformAgent {
    pub fn new(runtime: Arc<dyn ModelRuntime>, prompts: Arc<PromptLibrary>) -> Self {
        Self { runtime, prompts }
    }

    /// 跑一次自由对话轮：状态按值进出；工具处理在未绑定工具时为 no-op
    pub async fn run(&self, mut state: ConversationState) -> ConversationState {
        let (history, newest) = state.split_newest_user_turn();
        let system = self.prompts.freeform_prompt();
        let history_str = render_turns(history);
        let user_msg = newest.to_string();

        let prompt = format!("{system}\n\nConversation:\n{history_str}");

        match self.runtime.invoke(&prompt, &user_msg, None).await {
            Ok(response) => apply_model_response(&mut state, response),
            Err(e) => {
                tracing::warn!(error = %e, "freeform agent model invocation failed");
                state.model_error = Some(e);
            }
        }
        state
    }
}
