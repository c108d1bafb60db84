//! LLM 层：客户端抽象、响应联合与工具循环运行时

pub mod mock;
pub mod openai;
pub mod response;
pub mod runtime;
pub mod traits;

pub use mock::{MockLlmClient, ScriptedLlmClient};
pub use openai::{OpenAiClient, TokenUsage};
pub use response::{ModelMessage, ModelResponse, ToolCallRequest};
pub use runtime::{parse_model_output, ModelRuntime, ParsedOutput, ToolLoopRuntime};
pub use traits::{LlmClient, Message, Role};

use std::sync::Arc;

use crate::config::AppConfig;

/// 按配置创建 LLM 客户端：provider 为 mock 时返回 MockLlmClient，其余走 OpenAI 兼容端点
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    match cfg.llm.provider.as_str() {
        "mock" => Arc::new(MockLlmClient),
        _ => Arc::new(OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            &cfg.llm.model,
            None,
        )),
    }
}
