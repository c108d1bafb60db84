//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `FOCUSFLOW__*` 覆盖
//! （双下划线表示嵌套，如 `FOCUSFLOW__LLM__PROVIDER=mock`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub runtime: RuntimeSection,
    #[serde(default)]
    pub store: StoreSection,
}

/// [app] 段：应用名、数据目录、默认会话线程
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// plans.json / tasks.json / focus.db 所在目录，未设置时用 ./data
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// CLI 使用的固定线程 id
    #[serde(default = "default_thread_id")]
    pub default_thread: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            data_dir: default_data_dir(),
            default_thread: default_thread_id(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_thread_id() -> String {
    "focusflow-local-user".to_string()
}

/// [llm] 段：后端选择；provider 为 mock 时不访问网络
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：openai（任意 OpenAI 兼容端点，含本地 Ollama /v1）或 mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "qwen2.5:3b".to_string()
}

/// [runtime] 段：工具循环限制
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    /// 单轮内最大工具步数
    #[serde(default = "default_max_tool_steps")]
    pub max_tool_steps: usize,
    /// 单次工具调用超时（秒）
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            max_tool_steps: default_max_tool_steps(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_max_tool_steps() -> usize {
    5
}

fn default_tool_timeout_secs() -> u64 {
    30
}

/// [store] 段：文件锁与查重阈值
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// 建议性文件锁的最长等待（秒）
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
    /// find_similar_plans 的默认相似度阈值
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            lock_timeout_secs: default_lock_timeout_secs(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

fn default_lock_timeout_secs() -> u64 {
    10
}

fn default_similarity_threshold() -> f64 {
    0.8
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            llm: LlmSection::default(),
            runtime: RuntimeSection::default(),
            store: StoreSection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 FOCUSFLOW__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 FOCUSFLOW__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{name}.toml");
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("FOCUSFLOW")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
