//! FocusFlow - 对话式生产力助手
//!
//! 模块划分：
//! - **agents**: 结构化（生产力工具）与自由对话两个 Agent 及 prompt 组装
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 对话状态、意图分类器、状态机派发器
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）及工具循环运行时
//! - **memory**: 按线程的对话检查点（SQLite 持久 / 内存降级）
//! - **store**: 计划 / 任务的 JSON 文件存储（文件锁 + Schema 校验）
//! - **tools**: 生产力工具集（计划 / 任务 / 日程）与执行器

pub mod agents;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod store;
pub mod tools;
