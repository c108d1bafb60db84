//! 意图分类器
//!
//! 将最新用户消息分类为粗路由（structured / freeform）与细意图
//! （planning / scheduling / tasks / tracking）。要求模型输出单行 JSON；
//! 对任何畸形输出静默降级为 freeform，绝不向上抛解析异常。

use std::sync::Arc;

use crate::core::{render_turns, Intent, Route, Turn};
use crate::llm::{LlmClient, Message};

const CLASSIFIER_PROMPT: &str = r#"You are a router that classifies the latest user intent.

Read the following conversation and return a JSON object with:

- "agent": either "productivity" or "other"
- "intent": one of "planning", "scheduling", "tasks", "tracking" — or null if agent is "other"

Respond ONLY with valid JSON. No explanations.

Output example:
{"agent": "productivity", "intent": "planning"}

---

Examples:

User: I want to launch a blog.
Assistant: When do you want to launch it?
User: Before summer.
Assistant: Got it! Let's plan steps.
User: What's next?
→ {"agent": "productivity", "intent": "planning"}

User: I've been feeling really grateful lately.
Assistant: That's beautiful to hear.
User: Just wanted to share!
→ {"agent": "other", "intent": null}

Now classify the following:

"#;

/// 对模型原始输出做完全校验；对畸形输入是全函数，任何不合法形态都落到 (Freeform, None)
pub fn validate_output(raw: &str) -> (Route, Option<Intent>) {
    let trimmed = raw.trim();

    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return (Route::Freeform, None);
    }

    let data: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return (Route::Freeform, None),
    };

    match data.get("agent").and_then(|v| v.as_str()) {
        Some("productivity") => {
            match data
                .get("intent")
                .and_then(|v| v.as_str())
                .and_then(Intent::from_label)
            {
                Some(intent) => (Route::Structured, Some(intent)),
                // productivity 但 intent 非法 → 整体降级
                None => (Route::Freeform, None),
            }
        }
        Some("other") => (Route::Freeform, None),
        _ => (Route::Freeform, None),
    }
}

/// 分类器：持有注入的 LLM 客户端
pub struct IntentClassifier {
    llm: Arc<dyn LlmClient>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// 分类最新消息。历史与显式的最新消息一并进入 prompt；
    /// 若最后一条转录内容已等于最新消息则不重复追加（去重）。
    /// 模型传输层失败时返回 (None, None)：无路由，派发器直接进入 Finalize。
    pub async fn classify(
        &self,
        turns: &[Turn],
        user_msg: &str,
    ) -> (Option<Route>, Option<Intent>) {
        let history = match turns.last() {
            Some(last) if last.content == user_msg => render_turns(turns),
            _ => {
                let mut rendered = render_turns(turns);
                if !rendered.is_empty() {
                    rendered.push('\n');
                }
                rendered.push_str(&format!("User: {user_msg}"));
                rendered
            }
        };
        let prompt = format!("{CLASSIFIER_PROMPT}{history}\nUser: {user_msg}\n→\n");

        let raw = match self.llm.complete(&[Message::user(prompt)]).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "classifier LLM call failed, no route");
                return (None, None);
            }
        };

        let (route, intent) = validate_output(&raw);
        tracing::debug!(?route, ?intent, "classified turn");
        (Some(route), intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;

    #[test]
    fn test_not_brace_wrapped_degrades() {
        assert_eq!(
            validate_output("I think this is about planning."),
            (Route::Freeform, None)
        );
        assert_eq!(validate_output(""), (Route::Freeform, None));
        assert_eq!(
            validate_output("{\"agent\": \"productivity\""),
            (Route::Freeform, None)
        );
    }

    #[test]
    fn test_unparseable_json_degrades() {
        assert_eq!(validate_output("{not json at all}"), (Route::Freeform, None));
    }

    #[test]
    fn test_bad_agent_degrades() {
        assert_eq!(
            validate_output(r#"{"agent": "wizard", "intent": "planning"}"#),
            (Route::Freeform, None)
        );
        assert_eq!(validate_output(r#"{"intent": "planning"}"#), (Route::Freeform, None));
    }

    #[test]
    fn test_productivity_with_bad_intent_degrades() {
        assert_eq!(
            validate_output(r#"{"agent": "productivity", "intent": "flying"}"#),
            (Route::Freeform, None)
        );
        assert_eq!(
            validate_output(r#"{"agent": "productivity", "intent": null}"#),
            (Route::Freeform, None)
        );
    }

    #[test]
    fn test_valid_outputs_pass_verbatim() {
        assert_eq!(
            validate_output(r#"{"agent": "productivity", "intent": "planning"}"#),
            (Route::Structured, Some(Intent::Planning))
        );
        assert_eq!(
            validate_output("  {\"agent\": \"productivity\", \"intent\": \"tracking\"}  "),
            (Route::Structured, Some(Intent::Tracking))
        );
        assert_eq!(
            validate_output(r#"{"agent": "other", "intent": null}"#),
            (Route::Freeform, None)
        );
    }

    #[tokio::test]
    async fn test_classify_never_raises_on_junk() {
        let llm = Arc::new(ScriptedLlmClient::with_replies(&[
            "sure! here's my classification",
        ]));
        let classifier = IntentClassifier::new(llm);
        let (route, intent) = classifier.classify(&[], "hello").await;
        assert_eq!(route, Some(Route::Freeform));
        assert_eq!(intent, None);
    }

    #[tokio::test]
    async fn test_classify_transport_failure_yields_no_route() {
        let llm = Arc::new(ScriptedLlmClient::new(vec![Err("boom".to_string())]));
        let classifier = IntentClassifier::new(llm);
        let (route, intent) = classifier.classify(&[], "hello").await;
        assert_eq!(route, None);
        assert_eq!(intent, None);
    }
}
