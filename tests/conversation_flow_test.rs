//! 对话流集成测试
//!
//! 用脚本化 LLM 驱动完整派发流程：Entry → Classify → Agent → Finalize，
//! 覆盖转录不变量、降级路径与工具调用轮。

use std::sync::Arc;
use std::time::Duration;

use focusflow::agents::{FreeformAgent, PromptLibrary, StructuredAgent};
use focusflow::core::{Dispatcher, IntentClassifier, TurnRole, MAX_TURNS};
use focusflow::llm::{ScriptedLlmClient, ToolLoopRuntime};
use focusflow::memory::{CheckpointStore, MemoryCheckpointStore};
use focusflow::store::PlannerStore;
use focusflow::tools::{productivity_tools, ToolExecutor};

struct Fixture {
    dispatcher: Dispatcher,
    checkpoints: Arc<MemoryCheckpointStore>,
    store: Arc<PlannerStore>,
    _dir: tempfile::TempDir,
}

fn fixture(replies: Vec<Result<String, String>>) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(PlannerStore::open(dir.path(), Duration::from_secs(2)).unwrap());
    let executor = Arc::new(ToolExecutor::new(productivity_tools(store.clone()), 10));

    let llm = Arc::new(ScriptedLlmClient::new(replies));
    let runtime = Arc::new(ToolLoopRuntime::new(llm.clone(), 5));
    let prompts = Arc::new(PromptLibrary::new());
    let checkpoints = Arc::new(MemoryCheckpointStore::new());

    let dispatcher = Dispatcher::new(
        IntentClassifier::new(llm),
        StructuredAgent::new(runtime.clone(), executor, prompts.clone()),
        FreeformAgent::new(runtime, prompts),
        checkpoints.clone(),
    );

    Fixture {
        dispatcher,
        checkpoints,
        store,
        _dir: dir,
    }
}

fn ok(replies: &[&str]) -> Vec<Result<String, String>> {
    replies.iter().map(|r| Ok(r.to_string())).collect()
}

#[tokio::test]
async fn test_freeform_turn_yields_reply_and_two_turns() {
    let fx = fixture(ok(&[
        r#"{"agent": "other", "intent": null}"#,
        "Sounds like a big day. What stood out?",
    ]));

    let reply = fx
        .dispatcher
        .handle_message("t1", "I had a long day today.")
        .await
        .unwrap();
    assert_eq!(reply, "Sounds like a big day. What stood out?");

    let state = fx.checkpoints.load("t1").unwrap().unwrap();
    assert_eq!(state.turns.len(), 2);
    assert_eq!(state.turns[0].role, TurnRole::User);
    assert_eq!(state.turns[1].role, TurnRole::Assistant);
    assert!(state.pending_user_message.is_none());
}

#[tokio::test]
async fn test_transcript_bounded_after_many_turns() {
    // 分类器与 Agent 都收到同一条非 JSON 文本：路由降级为 freeform，文本即回复
    let fx = fixture(ok(&["hello there"]));

    for i in 0..25 {
        let reply = fx
            .dispatcher
            .handle_message("t1", &format!("message {i}"))
            .await
            .unwrap();
        assert!(!reply.is_empty());

        let state = fx.checkpoints.load("t1").unwrap().unwrap();
        let expected = usize::min(2 * (i + 1), MAX_TURNS);
        assert_eq!(state.turns.len(), expected);
    }
}

#[tokio::test]
async fn test_structured_turn_runs_tool_and_persists_plan() {
    let fx = fixture(ok(&[
        r#"{"agent": "productivity", "intent": "planning"}"#,
        r#"{"tool": "create_plan", "args": {"goal": "Launch blog", "deadline": "2025-06-01", "priority": "high", "milestones": ["Pick niche", "Write articles"]}}"#,
        "Your plan is ready, shall we add some tasks?",
    ]));

    let reply = fx
        .dispatcher
        .handle_message("t1", "I want to launch a blog by June.")
        .await
        .unwrap();

    // 回复 = 工具输出 + 换行 + 助手文本
    assert!(reply.contains("✅ Plan created: Launch blog"));
    assert!(reply.contains("Your plan is ready"));

    let plans = fx.store.list_plans().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].milestones.len(), 2);
    assert!(plans[0].tasks.is_empty());
    assert_eq!(plans[0].progress, 0);

    let state = fx.checkpoints.load("t1").unwrap().unwrap();
    assert!(state.pending_tool_calls.is_none());
    assert!(state.tool_output.is_none());
    assert_eq!(state.turns.len(), 2);
}

#[tokio::test]
async fn test_unknown_tool_yields_clarification_not_crash() {
    let fx = fixture(ok(&[
        r#"{"agent": "productivity", "intent": "tasks"}"#,
        r#"{"tool": "flying_unicorn", "args": {}}"#,
        "I don't have that tool. Could you clarify what you'd like me to do?",
    ]));

    let reply = fx
        .dispatcher
        .handle_message("t1", "Use the flying unicorn tool please.")
        .await
        .unwrap();
    assert!(reply.contains("clarify") || reply.contains("issue") || reply.contains("didn't understand"));
}

#[tokio::test]
async fn test_agent_model_error_becomes_apology() {
    let fx = fixture(vec![
        Ok(r#"{"agent": "other", "intent": null}"#.to_string()),
        Err("connection reset".to_string()),
    ]);

    let reply = fx
        .dispatcher
        .handle_message("t1", "hi")
        .await
        .unwrap();
    assert!(reply.contains("issue"));
    assert!(reply.contains("connection reset"));

    // 错误字段已在 Finalize 清除
    let state = fx.checkpoints.load("t1").unwrap().unwrap();
    assert!(state.model_error.is_none());
    assert_eq!(state.turns.len(), 2);
}

#[tokio::test]
async fn test_classifier_transport_failure_goes_straight_to_finalize() {
    let fx = fixture(vec![Err("boom".to_string())]);

    let reply = fx.dispatcher.handle_message("t1", "hi").await.unwrap();
    assert!(reply.contains("clarify"));

    let state = fx.checkpoints.load("t1").unwrap().unwrap();
    assert!(state.route.is_none());
    assert_eq!(state.turns.len(), 2);
}

#[tokio::test]
async fn test_state_resumes_across_invocations() {
    let fx = fixture(ok(&["just chatting"]));

    fx.dispatcher.handle_message("t1", "first").await.unwrap();
    fx.dispatcher.handle_message("t1", "second").await.unwrap();

    let state = fx.checkpoints.load("t1").unwrap().unwrap();
    assert_eq!(state.turns.len(), 4);
    assert_eq!(state.turns[0].content, "first");
    assert_eq!(state.turns[2].content, "second");

    // 线程互不影响
    fx.dispatcher.handle_message("t2", "other thread").await.unwrap();
    assert_eq!(fx.checkpoints.load("t1").unwrap().unwrap().turns.len(), 4);
    assert_eq!(fx.checkpoints.load("t2").unwrap().unwrap().turns.len(), 2);
}
