//! FocusFlow - 对话式生产力助手
//!
//! 入口：初始化日志、装配存储 / 工具 / LLM / Agent / 派发器，并运行 CLI 读入循环。

use std::io::{BufRead, Write as _};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use focusflow::agents::{FreeformAgent, PromptLibrary, StructuredAgent};
use focusflow::config::{load_config, AppConfig};
use focusflow::core::{Dispatcher, IntentClassifier};
use focusflow::llm::{create_llm_from_config, ToolLoopRuntime};
use focusflow::memory::open_checkpoint_store;
use focusflow::store::PlannerStore;
use focusflow::tools::{productivity_tools, ToolExecutor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    focusflow::observability::init();

    let cfg = load_config(None).unwrap_or_else(|_| AppConfig::default());

    let store = Arc::new(
        PlannerStore::open(
            &cfg.app.data_dir,
            Duration::from_secs(cfg.store.lock_timeout_secs),
        )
        .context("Failed to open planner store")?,
    );
    let executor = Arc::new(ToolExecutor::new(
        productivity_tools(store),
        cfg.runtime.tool_timeout_secs,
    ));

    let llm = create_llm_from_config(&cfg);
    let runtime = Arc::new(ToolLoopRuntime::new(llm.clone(), cfg.runtime.max_tool_steps));
    let prompts = Arc::new(PromptLibrary::new());

    let dispatcher = Dispatcher::new(
        IntentClassifier::new(llm),
        StructuredAgent::new(runtime.clone(), executor, prompts.clone()),
        FreeformAgent::new(runtime, prompts),
        open_checkpoint_store(cfg.app.data_dir.join("focus.db")),
    );

    let thread_id = cfg.app.default_thread.clone();
    println!("🧠 FocusFlow CLI\nType /exit to quit.\n");

    let stdin = std::io::stdin();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;
        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let user_msg = line?.trim().to_string();
        if user_msg.is_empty() {
            continue;
        }
        if user_msg.eq_ignore_ascii_case("/exit") {
            println!("Goodbye! 👋");
            break;
        }

        match dispatcher.handle_message(&thread_id, &user_msg).await {
            Ok(reply) => println!("AI: {reply}"),
            Err(e) => {
                tracing::error!(error = %e, "turn failed");
                println!("AI: [error] {e}");
            }
        }
    }

    Ok(())
}
