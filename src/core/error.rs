//! Agent 错误类型
//!
//! 错误策略：分类失败静默降级为自由对话路由、模型错误在 Finalize 转为道歉回复、
//! 工具内部错误以字符串负载回流（不向上抛出）、存储层未找到 / 锁超时几乎原样透出给用户。

use thiserror::Error;

/// 一次对话轮处理过程中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 模型调用失败（网络 / Provider），由 Finalize 的道歉分支吸收
    #[error("LLM error: {0}")]
    LlmError(String),

    /// 工具执行失败（未知工具名等；工具自身的领域错误不会走到这里，而是以字符串负载返回）
    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    /// 状态机被以非法状态重入（如 pending_user_message 已消费后再次进入 Entry）
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 检查点读写失败
    #[error("Checkpoint error: {0}")]
    CheckpointError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}
